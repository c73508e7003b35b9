//! Economic agents and their per-planet asset bundles.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::production::ProductionFacility;
use crate::storage::{StorageFacility, StorageLoad};
use crate::types::{AgentId, EducationLevel, PerEducation, PlanetId};
use crate::workforce::WorkforceDemography;

/// A company or government participating in a planet's economy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub associated_planet: Option<PlanetId>,
    pub wealth: f64,
    pub assets: BTreeMap<PlanetId, AgentAssets>,
}

impl Agent {
    pub fn new(id: AgentId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            associated_planet: None,
            wealth: 0.0,
            assets: BTreeMap::new(),
        }
    }
}

/// Everything an agent operates on one planet. `unused_workers` and
/// `overqualified` are written by the production tick and read by the next
/// tick's hiring controller; they are the only feedback bridge between the
/// two components.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentAssets {
    pub production_facilities: Vec<ProductionFacility>,
    pub storage: StorageFacility,
    pub allocated_workers: PerEducation<u64>,
    pub workforce: WorkforceDemography,
    pub unused_workers: Option<PerEducation<u64>>,
    pub unused_worker_fraction: f64,
    /// Rows are the job's education level, columns the worker's.
    pub overqualified: [PerEducation<u64>; EducationLevel::COUNT],
}

impl AgentAssets {
    pub fn new(storage_capacity: StorageLoad, storage_scale: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            production_facilities: Vec::new(),
            storage: StorageFacility::new(storage_capacity, storage_scale)?,
            allocated_workers: [0; EducationLevel::COUNT],
            workforce: WorkforceDemography::new(),
            unused_workers: None,
            unused_worker_fraction: 0.0,
            overqualified: [[0; EducationLevel::COUNT]; EducationLevel::COUNT],
        })
    }
}
