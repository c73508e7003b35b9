//! Population demography: age cohorts partitioned by education and
//! occupation.
//!
//! This is the authoritative book for every person on a planet. The workforce
//! book (tenure cohorts per agent) mirrors the Company and Government
//! occupations; all cross-book movement goes through explicit operations so
//! the two representations never drift.

mod education;
mod tick;

pub use education::{EDUCATION_STAGES, EducationStage, population_advance_year_tick};
pub use tick::{
    FOOD_DEMAND_HEADROOM, MAX_MORTALITY_PER_TICK, OccupationLosses, PopulationTickOutcome,
    population_tick, starvation_mortality_factor,
};

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::stats::largest_remainder;
use crate::types::{EducationLevel, MAX_AGE, MIN_EMPLOYABLE_AGE, Occupation};

// === COHORT ===

/// One age-year of a planet's population, partitioned by education level and
/// occupation. The cohort total is by construction the sum over all cells, so
/// the occupation-partition invariant cannot be violated silently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct Cohort {
    counts: [[u64; Occupation::COUNT]; EducationLevel::COUNT],
}

impl Cohort {
    pub fn get(&self, education: EducationLevel, occupation: Occupation) -> u64 {
        self.counts[education.index()][occupation.index()]
    }

    pub fn set(&mut self, education: EducationLevel, occupation: Occupation, count: u64) {
        self.counts[education.index()][occupation.index()] = count;
    }

    pub fn add(&mut self, education: EducationLevel, occupation: Occupation, count: u64) {
        self.counts[education.index()][occupation.index()] += count;
    }

    /// Remove up to `count` people from a cell; returns the number removed.
    pub fn remove(&mut self, education: EducationLevel, occupation: Occupation, count: u64) -> u64 {
        let cell = &mut self.counts[education.index()][occupation.index()];
        let removed = (*cell).min(count);
        *cell -= removed;
        removed
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }

    pub fn total_for_education(&self, education: EducationLevel) -> u64 {
        self.counts[education.index()].iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Cells in the fixed (education, occupation) iteration order.
    pub fn cells(&self) -> impl Iterator<Item = (EducationLevel, Occupation, u64)> + '_ {
        EducationLevel::ALL.into_iter().flat_map(move |edu| {
            Occupation::ALL
                .into_iter()
                .map(move |occ| (edu, occ, self.get(edu, occ)))
        })
    }
}

/// Build a cohort of exactly `total` people whose (education, occupation)
/// distribution follows `like`, using Hamilton apportionment with the cell
/// index as tie-breaker. Used to redistribute survivors after mortality.
pub fn distribute_like(total: u64, like: &Cohort) -> Cohort {
    let weights: Vec<u64> = like.cells().map(|(_, _, n)| n).collect();
    let shares = largest_remainder(total, &weights);
    let mut cohort = Cohort::default();
    for ((edu, occ, _), share) in like.cells().zip(shares) {
        cohort.set(edu, occ, share);
    }
    cohort
}

// === POPULATION ===

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct Population {
    /// Indexed by age in years, 0..=MAX_AGE.
    pub demography: Vec<Cohort>,
    pub starvation_level: f64,
}

impl Population {
    pub fn empty() -> Self {
        Self {
            demography: vec![Cohort::default(); MAX_AGE + 1],
            starvation_level: 0.0,
        }
    }

    pub fn total(&self) -> u64 {
        self.demography.iter().map(Cohort::total).sum()
    }

    pub fn count(&self, age: usize, education: EducationLevel, occupation: Occupation) -> u64 {
        self.demography[age].get(education, occupation)
    }

    /// Total across employable ages for one (education, occupation) cell.
    pub fn employable_total(&self, education: EducationLevel, occupation: Occupation) -> u64 {
        self.demography[MIN_EMPLOYABLE_AGE..]
            .iter()
            .map(|c| c.get(education, occupation))
            .sum()
    }

    /// The hiring pool: unoccupied people of working age at this level.
    pub fn unoccupied_employable(&self, education: EducationLevel) -> u64 {
        self.employable_total(education, Occupation::Unoccupied)
    }

    /// Half of everyone in the fertile age span.
    pub fn fertile_women(&self) -> f64 {
        let fertile: u64 = self.demography[tick::FERTILE_AGE_START..=tick::FERTILE_AGE_END]
            .iter()
            .map(Cohort::total)
            .sum();
        0.5 * fertile as f64
    }

    /// Move up to `count` people of one education level from one occupation
    /// to another, spread across employable ages proportionally to where the
    /// source occupation actually lives. Returns the number moved.
    pub fn shift_occupation(
        &mut self,
        education: EducationLevel,
        from: Occupation,
        to: Occupation,
        count: u64,
    ) -> u64 {
        let weights: Vec<u64> = self.demography[MIN_EMPLOYABLE_AGE..]
            .iter()
            .map(|c| c.get(education, from))
            .collect();
        let available: u64 = weights.iter().sum();
        let moving = count.min(available);
        let shares = largest_remainder(moving, &weights);
        for (offset, share) in shares.into_iter().enumerate() {
            if share == 0 {
                continue;
            }
            let cohort = &mut self.demography[MIN_EMPLOYABLE_AGE + offset];
            let removed = cohort.remove(education, from, share);
            cohort.add(education, to, removed);
        }
        moving
    }
}

// === INITIAL POPULATION ===

/// Relative weight of each age in the initial pyramid.
fn age_weight(age: usize) -> u64 {
    match age {
        0..=14 => 12,
        15..=64 => 10,
        65..=79 => 7,
        _ => 3,
    }
}

/// Fixed (education, occupation, weight) layout per age band. Children sit in
/// Education at the age-appropriate level; adults start Unoccupied across an
/// education mix (Company/Government fill only through hiring); a share of
/// the elderly is UnableToWork.
fn band_layout(age: usize) -> &'static [(EducationLevel, Occupation, u64)] {
    use EducationLevel::*;
    use Occupation::*;
    match age {
        0..=5 => &[(None, Education, 1)],
        6..=9 => &[(Primary, Education, 1)],
        10..=17 => &[(Secondary, Education, 85), (Primary, Unoccupied, 15)],
        18..=22 => &[
            (Tertiary, Education, 30),
            (Secondary, Unoccupied, 40),
            (Primary, Unoccupied, 20),
            (None, Unoccupied, 10),
        ],
        23..=27 => &[
            (Quaternary, Education, 10),
            (Tertiary, Unoccupied, 25),
            (Secondary, Unoccupied, 40),
            (Primary, Unoccupied, 20),
            (None, Unoccupied, 5),
        ],
        28..=66 => &[
            (None, Unoccupied, 10),
            (Primary, Unoccupied, 20),
            (Secondary, Unoccupied, 45),
            (Tertiary, Unoccupied, 20),
            (Quaternary, Unoccupied, 5),
        ],
        _ => &[
            (None, Unoccupied, 12),
            (Primary, Unoccupied, 20),
            (Secondary, Unoccupied, 32),
            (Tertiary, Unoccupied, 12),
            (Quaternary, Unoccupied, 4),
            (None, UnableToWork, 4),
            (Primary, UnableToWork, 5),
            (Secondary, UnableToWork, 8),
            (Tertiary, UnableToWork, 2),
            (Quaternary, UnableToWork, 1),
        ],
    }
}

/// Deterministically spread `total` people over ages 0..=MAX_AGE and, within
/// each age, over the fixed band layout. Every split uses Hamilton
/// apportionment, so the same total always yields the same population.
pub fn create_population(total: u64) -> Population {
    let age_weights: Vec<u64> = (0..=MAX_AGE).map(age_weight).collect();
    let per_age = largest_remainder(total, &age_weights);

    let mut population = Population::empty();
    for (age, count) in per_age.into_iter().enumerate() {
        if count == 0 {
            continue;
        }
        let layout = band_layout(age);
        let weights: Vec<u64> = layout.iter().map(|&(_, _, w)| w).collect();
        let shares = largest_remainder(count, &weights);
        for (&(edu, occ, _), share) in layout.iter().zip(shares) {
            population.demography[age].add(edu, occ, share);
        }
    }
    population
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distribute_like_preserves_total() {
        let mut like = Cohort::default();
        like.set(EducationLevel::None, Occupation::Unoccupied, 30);
        like.set(EducationLevel::Primary, Occupation::Company, 50);
        like.set(EducationLevel::Secondary, Occupation::Education, 20);

        for n in [0u64, 1, 7, 99, 100, 250] {
            let out = distribute_like(n, &like);
            assert_eq!(out.total(), n, "total mismatch for n={n}");
        }
    }

    #[test]
    fn distribute_like_tracks_shares() {
        let mut like = Cohort::default();
        like.set(EducationLevel::None, Occupation::Unoccupied, 75);
        like.set(EducationLevel::Primary, Occupation::Company, 25);

        let out = distribute_like(40, &like);
        assert_eq!(out.get(EducationLevel::None, Occupation::Unoccupied), 30);
        assert_eq!(out.get(EducationLevel::Primary, Occupation::Company), 10);
    }

    #[test]
    fn distribute_like_empty_source_yields_empty() {
        let out = distribute_like(10, &Cohort::default());
        assert!(out.is_empty());
    }

    #[test]
    fn create_population_is_exact_and_deterministic() {
        let a = create_population(12_345);
        let b = create_population(12_345);
        assert_eq!(a.total(), 12_345);
        assert_eq!(a.demography, b.demography);
    }

    #[test]
    fn create_population_children_are_in_education() {
        let pop = create_population(100_000);
        for age in 0..6 {
            let cohort = &pop.demography[age];
            assert_eq!(
                cohort.get(EducationLevel::None, Occupation::Education),
                cohort.total(),
                "age {age} should be entirely pre-primary"
            );
        }
        // Nobody starts employed: Company/Government fill only through hiring.
        for edu in EducationLevel::ALL {
            assert_eq!(pop.employable_total(edu, Occupation::Company), 0);
            assert_eq!(pop.employable_total(edu, Occupation::Government), 0);
        }
    }

    #[test]
    fn shift_occupation_moves_proportionally() {
        let mut pop = Population::empty();
        pop.demography[20].add(EducationLevel::Primary, Occupation::Company, 30);
        pop.demography[40].add(EducationLevel::Primary, Occupation::Company, 10);

        let moved = pop.shift_occupation(
            EducationLevel::Primary,
            Occupation::Company,
            Occupation::Unoccupied,
            20,
        );
        assert_eq!(moved, 20);
        assert_eq!(pop.count(20, EducationLevel::Primary, Occupation::Company), 15);
        assert_eq!(pop.count(40, EducationLevel::Primary, Occupation::Company), 5);
        assert_eq!(
            pop.unoccupied_employable(EducationLevel::Primary),
            20
        );
    }

    #[test]
    fn shift_occupation_caps_at_available() {
        let mut pop = Population::empty();
        pop.demography[20].add(EducationLevel::None, Occupation::Company, 5);
        let moved = pop.shift_occupation(
            EducationLevel::None,
            Occupation::Company,
            Occupation::Unoccupied,
            50,
        );
        assert_eq!(moved, 5);
    }
}
