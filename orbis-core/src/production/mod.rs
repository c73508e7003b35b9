//! Production facilities and their per-tick results.

mod tick;

pub use tick::{
    OVERQUALIFIED_EFFICIENCY_BONUS, age_productivity_multiplier, experience_multiplier,
    production_tick,
};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::environment::PollutionLevels;
use crate::error::ConfigError;
use crate::types::{EducationLevel, PerEducation};

/// One input or output line of a facility, per unit of scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct FacilityIo {
    pub resource: String,
    pub quantity: f64,
}

/// A production site owned by an agent on a planet. `scale` multiplies
/// worker requirements, IO quantities and pollution alike.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionFacility {
    pub name: String,
    pub scale: f64,
    pub worker_requirement: PerEducation<u64>,
    pub needs: Vec<FacilityIo>,
    pub produces: Vec<FacilityIo>,
    pub pollution_per_tick: PollutionLevels,
    /// Introspection for the last completed production tick.
    pub last_tick_results: Option<LastTickResults>,
}

impl ProductionFacility {
    pub fn new(name: impl Into<String>, scale: f64) -> Result<Self, ConfigError> {
        if scale < 0.0 {
            return Err(ConfigError::NegativeScale(scale));
        }
        Ok(Self {
            name: name.into(),
            scale,
            worker_requirement: [0; EducationLevel::COUNT],
            needs: Vec::new(),
            produces: Vec::new(),
            pollution_per_tick: PollutionLevels::default(),
            last_tick_results: None,
        })
    }

    pub fn with_workers(mut self, education: EducationLevel, count: u64) -> Self {
        self.worker_requirement[education.index()] = count;
        self
    }

    pub fn with_need(mut self, resource: impl Into<String>, quantity: f64) -> Self {
        self.needs.push(FacilityIo {
            resource: resource.into(),
            quantity,
        });
        self
    }

    pub fn with_output(mut self, resource: impl Into<String>, quantity: f64) -> Self {
        self.produces.push(FacilityIo {
            resource: resource.into(),
            quantity,
        });
        self
    }

    pub fn with_pollution(mut self, pollution: PollutionLevels) -> Self {
        self.pollution_per_tick = pollution;
        self
    }

    /// Rounded overall efficiency of the last tick, 0 when none has run.
    pub fn last_tick_efficiency_in_percent(&self) -> u32 {
        self.last_tick_results
            .as_ref()
            .map_or(0, |r| r.efficiency_percent)
    }

    /// Last tick's overqualified staffing, summed per job level.
    pub fn last_tick_overqualified_workers(&self) -> PerEducation<u64> {
        let mut totals = [0; EducationLevel::COUNT];
        if let Some(results) = &self.last_tick_results {
            for (job, row) in results.overqualified_workers.iter().enumerate() {
                totals[job] = row.iter().sum();
            }
        }
        totals
    }
}

/// Full efficiency breakdown of one facility for one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct LastTickResults {
    pub overall_efficiency: f64,
    pub worker_efficiency: PerEducation<f64>,
    pub worker_efficiency_overall: f64,
    pub resource_efficiency: BTreeMap<String, f64>,
    /// Rows are the job's education level, columns the worker's.
    pub overqualified_workers: [PerEducation<u64>; EducationLevel::COUNT],
    pub efficiency_percent: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_assembles_facility() {
        let facility = ProductionFacility::new("Steel Mill", 2.0)
            .unwrap()
            .with_workers(EducationLevel::Secondary, 5)
            .with_need("Iron Ore", 3.0)
            .with_output("Steel", 1.0);
        assert_eq!(facility.worker_requirement[EducationLevel::Secondary.index()], 5);
        assert_eq!(facility.needs.len(), 1);
        assert_eq!(facility.last_tick_efficiency_in_percent(), 0);
    }

    #[test]
    fn negative_scale_rejected() {
        assert!(ProductionFacility::new("Bad", -1.0).is_err());
    }
}
