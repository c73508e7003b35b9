use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use tsify_next::Tsify;

// ============================================================================
// IDs - Using slotmap for generational indices
// ============================================================================

new_key_type! {
    pub struct PlanetId;
    pub struct AgentId;
}

/// Trait for converting SlotMap keys to u64 for the snapshot/WASM boundary
pub trait KeyToU64 {
    fn to_u64(self) -> u64;
}

impl KeyToU64 for PlanetId {
    fn to_u64(self) -> u64 {
        self.0.as_ffi()
    }
}

impl KeyToU64 for AgentId {
    fn to_u64(self) -> u64 {
        self.0.as_ffi()
    }
}

// ============================================================================
// Age and tenure bounds
// ============================================================================

/// Oldest age a cohort can hold. The demography vector spans 0..=MAX_AGE.
pub const MAX_AGE: usize = 100;

/// Youngest age at which a person may be hired.
pub const MIN_EMPLOYABLE_AGE: usize = 14;

/// Age at which the retirement trigger considers a worker eligible.
pub const RETIREMENT_AGE: f64 = 67.0;

/// Highest tenure bucket; workers accumulate there (cap bucket).
pub const MAX_TENURE_YEARS: usize = MAX_AGE - MIN_EMPLOYABLE_AGE;

/// Length of the departing/retiring notice pipelines, in months.
pub const NOTICE_PERIOD_MONTHS: usize = 12;

// ============================================================================
// Education - The vertical axis of both demography books
// ============================================================================

/// Attained/pursued education level, ordered low to high. Iteration order is
/// load-bearing: the worker cascade and the hiring controller walk `ALL` in
/// this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum EducationLevel {
    None,
    Primary,
    Secondary,
    Tertiary,
    Quaternary,
}

impl EducationLevel {
    pub const COUNT: usize = 5;

    pub const ALL: [EducationLevel; Self::COUNT] = [
        EducationLevel::None,
        EducationLevel::Primary,
        EducationLevel::Secondary,
        EducationLevel::Tertiary,
        EducationLevel::Quaternary,
    ];

    pub fn index(self) -> usize {
        match self {
            EducationLevel::None => 0,
            EducationLevel::Primary => 1,
            EducationLevel::Secondary => 2,
            EducationLevel::Tertiary => 3,
            EducationLevel::Quaternary => 4,
        }
    }

    pub fn from_index(index: usize) -> EducationLevel {
        Self::ALL[index]
    }

    /// The level reached by graduating from this one. Quaternary caps.
    pub fn next_level(self) -> EducationLevel {
        match self {
            EducationLevel::None => EducationLevel::Primary,
            EducationLevel::Primary => EducationLevel::Secondary,
            EducationLevel::Secondary => EducationLevel::Tertiary,
            EducationLevel::Tertiary => EducationLevel::Quaternary,
            EducationLevel::Quaternary => EducationLevel::Quaternary,
        }
    }
}

/// Convenience alias for per-education-level tables.
pub type PerEducation<T> = [T; EducationLevel::COUNT];

// ============================================================================
// Occupation - What a person does with their time
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum Occupation {
    Unoccupied,
    Company,
    Government,
    Education,
    UnableToWork,
}

impl Occupation {
    pub const COUNT: usize = 5;

    pub const ALL: [Occupation; Self::COUNT] = [
        Occupation::Unoccupied,
        Occupation::Company,
        Occupation::Government,
        Occupation::Education,
        Occupation::UnableToWork,
    ];

    pub fn index(self) -> usize {
        match self {
            Occupation::Unoccupied => 0,
            Occupation::Company => 1,
            Occupation::Government => 2,
            Occupation::Education => 3,
            Occupation::UnableToWork => 4,
        }
    }

    /// True for the two occupations mirrored in the workforce book.
    pub fn is_employed(self) -> bool {
        matches!(self, Occupation::Company | Occupation::Government)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn education_order_is_low_to_high() {
        for pair in EducationLevel::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert_eq!(EducationLevel::None.index(), 0);
        assert_eq!(EducationLevel::Quaternary.index(), EducationLevel::COUNT - 1);
    }

    #[test]
    fn next_level_caps_at_quaternary() {
        assert_eq!(EducationLevel::None.next_level(), EducationLevel::Primary);
        assert_eq!(
            EducationLevel::Quaternary.next_level(),
            EducationLevel::Quaternary
        );
    }

    #[test]
    fn tenure_span_covers_working_life() {
        assert_eq!(MAX_TENURE_YEARS, 86);
    }
}
