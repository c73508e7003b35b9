//! Simulation time configuration.
//!
//! A tick is the smallest unit of simulated time. Months and years are
//! derived: `ticks_per_year = ticks_per_month * months_per_year`, never set
//! independently. Every annual rate in the engine is converted with
//! [`SimClock::per_tick_rate`], so shrinking the tick counts for tests does
//! not change long-run behavior.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimClock {
    ticks_per_month: u64,
    months_per_year: u64,
}

impl SimClock {
    pub const DEFAULT_TICKS_PER_MONTH: u64 = 30;
    pub const DEFAULT_MONTHS_PER_YEAR: u64 = 12;

    pub fn new(ticks_per_month: u64, months_per_year: u64) -> Result<Self, ConfigError> {
        if ticks_per_month == 0 || months_per_year == 0 {
            return Err(ConfigError::ZeroTimeUnit);
        }
        Ok(Self {
            ticks_per_month,
            months_per_year,
        })
    }

    pub fn ticks_per_month(&self) -> u64 {
        self.ticks_per_month
    }

    pub fn months_per_year(&self) -> u64 {
        self.months_per_year
    }

    pub fn ticks_per_year(&self) -> u64 {
        self.ticks_per_month * self.months_per_year
    }

    pub fn is_month_boundary(&self, tick: u64) -> bool {
        tick > 0 && tick % self.ticks_per_month == 0
    }

    pub fn is_year_boundary(&self, tick: u64) -> bool {
        tick > 0 && tick % self.ticks_per_year() == 0
    }

    /// Convert an annual probability into its per-tick equivalent:
    /// `1 - (1 - annual)^(1/ticks_per_year)`.
    pub fn per_tick_rate(&self, annual: f64) -> f64 {
        let annual = annual.clamp(0.0, 1.0);
        1.0 - (1.0 - annual).powf(1.0 / self.ticks_per_year() as f64)
    }

    /// Convert an annual probability into its per-month equivalent.
    pub fn per_month_rate(&self, annual: f64) -> f64 {
        let annual = annual.clamp(0.0, 1.0);
        1.0 - (1.0 - annual).powf(1.0 / self.months_per_year as f64)
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self {
            ticks_per_month: Self::DEFAULT_TICKS_PER_MONTH,
            months_per_year: Self::DEFAULT_MONTHS_PER_YEAR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_year_length() {
        let clock = SimClock::default();
        assert_eq!(clock.ticks_per_year(), 360);

        let small = SimClock::new(5, 4).unwrap();
        assert_eq!(small.ticks_per_year(), 20);
    }

    #[test]
    fn boundaries_skip_tick_zero() {
        let clock = SimClock::default();
        assert!(!clock.is_month_boundary(0));
        assert!(!clock.is_year_boundary(0));
        assert!(clock.is_month_boundary(30));
        assert!(!clock.is_month_boundary(31));
        assert!(clock.is_year_boundary(360));
        // Every year boundary is a month boundary.
        assert!(clock.is_month_boundary(360));
        assert!(!clock.is_year_boundary(30));
    }

    #[test]
    fn per_tick_rate_compounds_back_to_annual() {
        let clock = SimClock::default();
        let annual = 0.3;
        let tick = clock.per_tick_rate(annual);
        let compounded = 1.0 - (1.0 - tick).powi(clock.ticks_per_year() as i32);
        assert!((compounded - annual).abs() < 1e-9);
    }

    #[test]
    fn zero_units_rejected() {
        assert!(SimClock::new(0, 12).is_err());
        assert!(SimClock::new(30, 0).is_err());
    }
}
