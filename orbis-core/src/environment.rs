//! Planetary environment: pollution, its decay, and renewable regeneration.

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::planet::Planet;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct PollutionLevels {
    pub air: f64,
    pub water: f64,
    pub soil: f64,
}

impl PollutionLevels {
    pub fn new(air: f64, water: f64, soil: f64) -> Self {
        Self { air, water, soil }
    }

    pub fn total(&self) -> f64 {
        self.air + self.water + self.soil
    }
}

/// Per-axis decay: a flat amount plus a fraction of the current level, both
/// removed each tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct AxisRates {
    pub constant: f64,
    pub percentage: f64,
}

impl AxisRates {
    pub fn new(constant: f64, percentage: f64) -> Self {
        Self {
            constant,
            percentage,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct RegenerationRates {
    pub air: AxisRates,
    pub water: AxisRates,
    pub soil: AxisRates,
}

/// Ambient hazard rates maintained by out-of-core event logic; the engine
/// only reads them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct NaturalDisasters {
    /// Additional annual mortality probability.
    pub mortality_rate: f64,
    /// Additional annual disability probability.
    pub disability_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct Environment {
    pub pollution: PollutionLevels,
    pub regeneration_rates: RegenerationRates,
    pub natural_disasters: NaturalDisasters,
}

impl Environment {
    /// Saturation point of the pollution health index: at this summed level
    /// the health effects reach half their maxima.
    pub const POLLUTION_HALF_SATURATION: f64 = 1000.0;

    const MAX_POLLUTION_MORTALITY: f64 = 0.05;
    const MAX_POLLUTION_DISABILITY: f64 = 0.02;

    /// Summed pollution mapped into [0, 1) with diminishing marginal harm.
    pub fn pollution_index(&self) -> f64 {
        let p = self.pollution.total().max(0.0);
        p / (p + Self::POLLUTION_HALF_SATURATION)
    }

    /// Additional annual mortality probability from pollution.
    pub fn pollution_mortality_rate(&self) -> f64 {
        self.pollution_index() * Self::MAX_POLLUTION_MORTALITY
    }

    /// Additional annual disability probability from pollution.
    pub fn pollution_disability_rate(&self) -> f64 {
        self.pollution_index() * Self::MAX_POLLUTION_DISABILITY
    }

    /// Fraction by which heavy pollution suppresses fertility, in [0, 1).
    pub fn fertility_reduction(&self) -> f64 {
        self.pollution_index()
    }

    /// One tick of pollution decay on every axis, floored at zero.
    pub fn decay_pollution(&mut self) {
        let rates = self.regeneration_rates;
        self.pollution.air = decay_axis(self.pollution.air, rates.air);
        self.pollution.water = decay_axis(self.pollution.water, rates.water);
        self.pollution.soil = decay_axis(self.pollution.soil, rates.soil);
    }
}

fn decay_axis(level: f64, rates: AxisRates) -> f64 {
    (level - rates.constant - level * rates.percentage).max(0.0)
}

/// One environment tick for a planet: pollution decay, then renewable claim
/// regeneration. No cross-planet interaction; idempotent when all rates are
/// zero.
pub fn environment_tick(planet: &mut Planet) {
    planet.environment.decay_pollution();
    for claims in planet.resources.values_mut() {
        for claim in claims.iter_mut() {
            claim.regenerate();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decay_subtracts_constant_and_fraction() {
        let mut env = Environment {
            pollution: PollutionLevels::new(100.0, 50.0, 10.0),
            regeneration_rates: RegenerationRates {
                air: AxisRates::new(1.0, 0.1),
                water: AxisRates::new(2.0, 0.0),
                soil: AxisRates::new(0.0, 0.5),
            },
            natural_disasters: NaturalDisasters::default(),
        };
        env.decay_pollution();
        assert_eq!(env.pollution.air, 100.0 - 1.0 - 10.0);
        assert_eq!(env.pollution.water, 48.0);
        assert_eq!(env.pollution.soil, 5.0);
    }

    #[test]
    fn decay_never_goes_negative() {
        let mut env = Environment {
            pollution: PollutionLevels::new(0.5, 0.0, 0.0),
            regeneration_rates: RegenerationRates {
                air: AxisRates::new(1.0, 0.0),
                ..Default::default()
            },
            natural_disasters: NaturalDisasters::default(),
        };
        env.decay_pollution();
        assert_eq!(env.pollution.air, 0.0);
        env.decay_pollution();
        assert_eq!(env.pollution.air, 0.0);
    }

    #[test]
    fn decay_is_idempotent_at_zero_rates() {
        let mut env = Environment {
            pollution: PollutionLevels::new(3.0, 2.0, 1.0),
            ..Default::default()
        };
        env.decay_pollution();
        assert_eq!(env.pollution, PollutionLevels::new(3.0, 2.0, 1.0));
    }

    #[test]
    fn pollution_index_saturates() {
        let mut env = Environment::default();
        assert_eq!(env.pollution_index(), 0.0);
        env.pollution.air = Environment::POLLUTION_HALF_SATURATION;
        assert!((env.pollution_index() - 0.5).abs() < 1e-12);
        env.pollution.air = 1e12;
        assert!(env.pollution_index() < 1.0);
    }
}
