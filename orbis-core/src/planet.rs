//! Planets: the stage every other component plays on.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::environment::Environment;
use crate::population::Population;
use crate::resources::ResourceClaim;
use crate::types::{AgentId, PlanetId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Built-up planetary stock maintained by out-of-core development logic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct Infrastructure {
    pub housing: f64,
    pub transportation: f64,
    pub energy: f64,
}

/// The government is an ordinary agent referenced by id; cyclic references
/// are resolved through the world's lookup tables, never by back-pointers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Planet {
    pub id: PlanetId,
    pub name: String,
    pub position: Position,
    pub population: Population,
    pub government: AgentId,
    pub resources: BTreeMap<String, Vec<ResourceClaim>>,
    pub environment: Environment,
    pub infrastructure: Infrastructure,
}

impl Planet {
    pub fn new(
        id: PlanetId,
        name: impl Into<String>,
        position: Position,
        government: AgentId,
        population: Population,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            position,
            population,
            government,
            resources: BTreeMap::new(),
            environment: Environment::default(),
            infrastructure: Infrastructure::default(),
        }
    }
}
