//! Workforce demography: tenure cohorts per agent per planet.
//!
//! This book mirrors the Company/Government occupations of the population
//! book. Each (tenure year, education) cohort tracks active headcount, three
//! notice-period pipelines, and the Gaussian age moments that drive
//! retirement and the mortality estimator. Every movement here has a
//! counterpart operation on the population book.

mod hiring;
mod lifecycle;

pub use hiring::{
    ACCEPTABLE_IDLE_FRACTION, DEPARTING_EFFICIENCY, LAYOFF_PROTECTED_YEARS, fire_workers,
    hire_from_population, labor_market_tick, update_allocated_workers,
};
pub use lifecycle::{
    apply_population_deaths_to_workforce, labor_market_month_tick, labor_market_year_tick,
    retirement_annual_fraction, workforce_mortality_tick,
};

use serde::{Deserialize, Serialize};

use crate::stats::AgeMoments;
use crate::types::{EducationLevel, MAX_TENURE_YEARS, NOTICE_PERIOD_MONTHS, PerEducation};

// === COHORT LEVEL ===

/// One (tenure year, education) cell of the workforce book.
///
/// Pipeline slot 0 leaves at the next month boundary; new entries land in the
/// last slot. `departing_fired` is a subset marker of `departing`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortLevel {
    pub active: u64,
    pub departing: [u64; NOTICE_PERIOD_MONTHS],
    pub departing_fired: [u64; NOTICE_PERIOD_MONTHS],
    pub retiring: [u64; NOTICE_PERIOD_MONTHS],
    pub age_moments: AgeMoments,
}

impl Default for CohortLevel {
    fn default() -> Self {
        Self {
            active: 0,
            departing: [0; NOTICE_PERIOD_MONTHS],
            departing_fired: [0; NOTICE_PERIOD_MONTHS],
            retiring: [0; NOTICE_PERIOD_MONTHS],
            age_moments: AgeMoments::default(),
        }
    }
}

impl CohortLevel {
    pub fn departing_total(&self) -> u64 {
        self.departing.iter().sum()
    }

    pub fn fired_total(&self) -> u64 {
        self.departing_fired.iter().sum()
    }

    pub fn retiring_total(&self) -> u64 {
        self.retiring.iter().sum()
    }

    /// Departing workers who resigned rather than being laid off.
    pub fn voluntary_departing_total(&self) -> u64 {
        self.departing_total() - self.fired_total()
    }

    /// Active plus everyone still serving out a notice period.
    pub fn booked_total(&self) -> u64 {
        self.active + self.departing_total() + self.retiring_total()
    }

    /// Remove up to `count` active workers; moments reset to the default when
    /// the cohort empties. Returns the number removed.
    pub fn remove_active(&mut self, count: u64) -> u64 {
        let removed = self.active.min(count);
        self.active -= removed;
        if self.active == 0 {
            self.age_moments = AgeMoments::default();
        }
        removed
    }

    /// Merge a freshly hired batch into the cohort via the parallel-axis
    /// formula.
    pub fn add_hires(&mut self, count: u64, batch: AgeMoments) {
        if count == 0 {
            return;
        }
        self.age_moments = if self.active == 0 {
            batch
        } else {
            AgeMoments::combine(self.active, self.age_moments, count, batch)
        };
        self.active += count;
    }
}

// === TENURE COHORT ===

/// All education levels at one tenure year.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TenureCohort {
    levels: [CohortLevel; EducationLevel::COUNT],
}

impl TenureCohort {
    pub fn level(&self, education: EducationLevel) -> &CohortLevel {
        &self.levels[education.index()]
    }

    pub fn level_mut(&mut self, education: EducationLevel) -> &mut CohortLevel {
        &mut self.levels[education.index()]
    }
}

// === WORKFORCE DEMOGRAPHY ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkforceDemography {
    /// Indexed by tenure year, 0..=MAX_TENURE_YEARS. The last bucket caps.
    pub cohorts: Vec<TenureCohort>,
    /// Active headcount recorded at the most recent month boundary.
    pub active_at_month_start: PerEducation<u64>,
}

impl WorkforceDemography {
    pub fn new() -> Self {
        Self {
            cohorts: vec![TenureCohort::default(); MAX_TENURE_YEARS + 1],
            active_at_month_start: [0; EducationLevel::COUNT],
        }
    }

    pub fn active_total(&self, education: EducationLevel) -> u64 {
        self.cohorts.iter().map(|c| c.level(education).active).sum()
    }

    pub fn departing_total(&self, education: EducationLevel) -> u64 {
        self.cohorts
            .iter()
            .map(|c| c.level(education).departing_total())
            .sum()
    }

    pub fn fired_total(&self, education: EducationLevel) -> u64 {
        self.cohorts
            .iter()
            .map(|c| c.level(education).fired_total())
            .sum()
    }

    pub fn retiring_total(&self, education: EducationLevel) -> u64 {
        self.cohorts
            .iter()
            .map(|c| c.level(education).retiring_total())
            .sum()
    }

    /// Everything this agent's book accounts for at one education level.
    pub fn booked_total(&self, education: EducationLevel) -> u64 {
        self.cohorts
            .iter()
            .map(|c| c.level(education).booked_total())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        EducationLevel::ALL
            .into_iter()
            .all(|edu| self.booked_total(edu) == 0)
    }
}

impl Default for WorkforceDemography {
    fn default() -> Self {
        Self::new()
    }
}
