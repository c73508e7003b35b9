//! Scenario parameters.
//!
//! Policy rates that are meaningful to vary between scenarios and tests live
//! here with their canonical defaults; structural constants (education
//! tables, productivity curves, pipeline lengths) stay with their engines.
//! Zeroing every rate makes `advance_tick` a no-op on population and
//! workforce counts.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::MAX_AGE;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimParams {
    /// Fraction of each active tenure cohort that resigns per tick.
    pub voluntary_quit_rate_per_tick: f64,
    /// Children per woman over a full fertile span. Tuned constant, not
    /// derived.
    pub lifetime_fertility: f64,
    /// Annual mortality probability, indexed by age 0..=MAX_AGE.
    pub mortality: Vec<f64>,
    /// Annual base disability probability, indexed by age 0..=MAX_AGE
    /// (before pollution and disaster additions).
    pub disability: Vec<f64>,
}

impl SimParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_rate(
            "voluntary_quit_rate_per_tick",
            self.voluntary_quit_rate_per_tick,
        )?;
        if self.lifetime_fertility < 0.0 {
            return Err(ConfigError::NegativeQuantity {
                name: "lifetime_fertility",
                value: self.lifetime_fertility,
            });
        }
        check_table("mortality", &self.mortality)?;
        check_table("disability", &self.disability)?;
        Ok(())
    }

    /// All rates zeroed; useful for isolating a single mechanism in tests.
    pub fn inert() -> Self {
        Self {
            voluntary_quit_rate_per_tick: 0.0,
            lifetime_fertility: 0.0,
            mortality: vec![0.0; MAX_AGE + 1],
            disability: vec![0.0; MAX_AGE + 1],
        }
    }
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            voluntary_quit_rate_per_tick: 1e-4,
            lifetime_fertility: 2.66,
            mortality: canonical_mortality_table(),
            disability: canonical_disability_table(),
        }
    }
}

fn check_rate(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::RateOutOfRange { name, value });
    }
    Ok(())
}

fn check_table(name: &'static str, table: &[f64]) -> Result<(), ConfigError> {
    if table.len() != MAX_AGE + 1 {
        return Err(ConfigError::TableLength {
            name,
            expected: MAX_AGE + 1,
            got: table.len(),
        });
    }
    for &rate in table {
        check_rate(name, rate)?;
    }
    Ok(())
}

/// Piecewise annual mortality by age: elevated infancy, a low plateau through
/// childhood, then the usual senescent climb. Age MAX_AGE is terminal.
pub fn canonical_mortality_table() -> Vec<f64> {
    (0..=MAX_AGE)
        .map(|age| match age {
            0 => 0.004,
            1..=4 => 0.0008,
            5..=14 => 0.0002,
            15..=29 => 0.0008,
            30..=44 => 0.0015,
            45..=59 => 0.005,
            60..=69 => 0.015,
            70..=79 => 0.045,
            80..=89 => 0.12,
            90..=99 => 0.28,
            _ => 1.0,
        })
        .collect()
}

/// Annual base disability probability by age band.
pub fn canonical_disability_table() -> Vec<f64> {
    (0..=MAX_AGE)
        .map(|age| match age {
            0..=39 => 0.001,
            40..=54 => 0.003,
            55..=64 => 0.008,
            _ => 0.02,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        SimParams::default().validate().unwrap();
        SimParams::inert().validate().unwrap();
    }

    #[test]
    fn mortality_is_terminal_at_max_age() {
        let table = canonical_mortality_table();
        assert_eq!(table.len(), MAX_AGE + 1);
        assert_eq!(table[MAX_AGE], 1.0);
        assert!(table[30] < table[70]);
    }

    #[test]
    fn out_of_range_rate_rejected() {
        let mut params = SimParams::default();
        params.voluntary_quit_rate_per_tick = 1.5;
        assert!(params.validate().is_err());
    }

    #[test]
    fn truncated_table_rejected() {
        let mut params = SimParams::default();
        params.disability.pop();
        assert!(params.validate().is_err());
    }
}
