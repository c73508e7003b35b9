//! Serializable world snapshots for the persistence adapter and the WASM
//! host.
//!
//! Cyclic references are collapsed: agents appearing inside planet or claim
//! data shrink to `{id, name}`, and the host resolves them through the agent
//! list. Aggregate totals are left to the persistence layer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::environment::Environment;
use crate::planet::{Infrastructure, Position};
use crate::population::Population;
use crate::production::{FacilityIo, LastTickResults};
use crate::storage::StorageLoad;
use crate::types::{AgentId, EducationLevel, KeyToU64, PerEducation};
use crate::world::World;

/// An agent reference collapsed for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct AgentRef {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct ClaimSnapshot {
    pub id: u32,
    pub resource: String,
    pub quantity: f64,
    pub regeneration_rate: f64,
    pub maximum_capacity: f64,
    pub claim: Option<AgentRef>,
    pub tenant: Option<AgentRef>,
    pub tenant_cost: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct PlanetSnapshot {
    pub id: u64,
    pub name: String,
    pub position: Position,
    pub population: Population,
    pub environment: Environment,
    pub infrastructure: Infrastructure,
    pub government: AgentRef,
    pub resources: BTreeMap<String, Vec<ClaimSnapshot>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct StorageSnapshot {
    pub capacity: StorageLoad,
    pub current: StorageLoad,
    pub scale: f64,
    pub contents: Vec<StorageContentSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct StorageContentSnapshot {
    pub resource: String,
    pub quantity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct FacilitySnapshot {
    pub name: String,
    pub scale: f64,
    pub worker_requirement: PerEducation<u64>,
    pub needs: Vec<FacilityIo>,
    pub produces: Vec<FacilityIo>,
    pub last_tick_results: Option<LastTickResults>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct AssetsSnapshot {
    pub planet: u64,
    pub allocated_workers: PerEducation<u64>,
    pub active_workers: PerEducation<u64>,
    pub unused_workers: Option<PerEducation<u64>>,
    pub unused_worker_fraction: f64,
    pub facilities: Vec<FacilitySnapshot>,
    pub storage: StorageSnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct AgentSnapshot {
    pub id: u64,
    pub name: String,
    pub associated_planet: Option<u64>,
    pub wealth: f64,
    pub assets: Vec<AssetsSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct StateSnapshot {
    pub tick: u64,
    pub planets: Vec<PlanetSnapshot>,
    pub agents: Vec<AgentSnapshot>,
}

impl StateSnapshot {
    /// Capture the current world state as an immutable, serializable value.
    pub fn capture(world: &World) -> Self {
        let agent_ref = |id: AgentId| AgentRef {
            id: id.to_u64(),
            name: world
                .agents
                .get(id)
                .map_or_else(String::new, |a| a.name.clone()),
        };

        let planets = world
            .planets
            .values()
            .map(|planet| PlanetSnapshot {
                id: planet.id.to_u64(),
                name: planet.name.clone(),
                position: planet.position,
                population: planet.population.clone(),
                environment: planet.environment.clone(),
                infrastructure: planet.infrastructure,
                government: agent_ref(planet.government),
                resources: planet
                    .resources
                    .iter()
                    .map(|(name, claims)| {
                        let claims = claims
                            .iter()
                            .map(|c| ClaimSnapshot {
                                id: c.id,
                                resource: c.resource.clone(),
                                quantity: c.quantity,
                                regeneration_rate: c.regeneration_rate,
                                maximum_capacity: c.maximum_capacity,
                                claim: c.claim.map(agent_ref),
                                tenant: c.tenant.map(agent_ref),
                                tenant_cost: c.tenant_cost,
                            })
                            .collect();
                        (name.clone(), claims)
                    })
                    .collect(),
            })
            .collect();

        let agents = world
            .agents
            .values()
            .map(|agent| AgentSnapshot {
                id: agent.id.to_u64(),
                name: agent.name.clone(),
                associated_planet: agent.associated_planet.map(KeyToU64::to_u64),
                wealth: agent.wealth,
                assets: agent
                    .assets
                    .iter()
                    .map(|(planet_id, assets)| {
                        let mut active_workers = [0u64; EducationLevel::COUNT];
                        for edu in EducationLevel::ALL {
                            active_workers[edu.index()] = assets.workforce.active_total(edu);
                        }
                        AssetsSnapshot {
                            planet: planet_id.to_u64(),
                            allocated_workers: assets.allocated_workers,
                            active_workers,
                            unused_workers: assets.unused_workers,
                            unused_worker_fraction: assets.unused_worker_fraction,
                            facilities: assets
                                .production_facilities
                                .iter()
                                .map(|f| FacilitySnapshot {
                                    name: f.name.clone(),
                                    scale: f.scale,
                                    worker_requirement: f.worker_requirement,
                                    needs: f.needs.clone(),
                                    produces: f.produces.clone(),
                                    last_tick_results: f.last_tick_results.clone(),
                                })
                                .collect(),
                            storage: StorageSnapshot {
                                capacity: assets.storage.capacity,
                                current: assets.storage.current,
                                scale: assets.storage.scale,
                                contents: assets
                                    .storage
                                    .by_resource
                                    .iter()
                                    .map(|(name, entry)| StorageContentSnapshot {
                                        resource: name.clone(),
                                        quantity: entry.quantity,
                                    })
                                    .collect(),
                            },
                        }
                    })
                    .collect(),
            })
            .collect();

        StateSnapshot {
            tick: world.tick,
            planets,
            agents,
        }
    }
}

#[cfg(target_arch = "wasm32")]
impl StateSnapshot {
    /// Hand the snapshot across the WASM boundary.
    pub fn to_js(&self) -> Result<wasm_bindgen::JsValue, serde_wasm_bindgen::Error> {
        serde_wasm_bindgen::to_value(self)
    }
}
