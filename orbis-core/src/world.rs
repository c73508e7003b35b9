//! World state container and the tick scheduler.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::agents::{Agent, AgentAssets};
use crate::clock::SimClock;
use crate::environment;
use crate::error::{ConfigError, SimError};
use crate::invariants;
use crate::params::SimParams;
use crate::planet::{Planet, Position};
use crate::population::{
    self, FOOD_DEMAND_HEADROOM, OccupationLosses, Population,
};
use crate::production::{self, ProductionFacility};
use crate::resources::{FOOD_RESOURCE, Resource, ResourceClaim};
use crate::storage::StorageLoad;
use crate::types::{AgentId, EducationLevel, MAX_AGE, Occupation, PlanetId};
use crate::workforce;

/// Complete state of the planetary economy simulation.
///
/// The engine is a single-threaded deterministic state machine: `advance_tick`
/// is the only mutator, iteration follows declaration order everywhere, and
/// external collaborators only ever see snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    pub tick: u64,
    pub clock: SimClock,
    pub params: SimParams,
    pub planets: SlotMap<PlanetId, Planet>,
    pub agents: SlotMap<AgentId, Agent>,
    /// Resource catalog, keyed by name.
    pub resources: BTreeMap<String, Resource>,
    debug_checks: bool,
    next_claim_id: u32,
}

impl World {
    pub fn new() -> Self {
        Self {
            tick: 0,
            clock: SimClock::default(),
            params: SimParams::default(),
            planets: SlotMap::with_key(),
            agents: SlotMap::with_key(),
            resources: BTreeMap::new(),
            debug_checks: cfg!(debug_assertions),
            next_claim_id: 0,
        }
    }

    pub fn with_clock(mut self, clock: SimClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_params(mut self, params: SimParams) -> Result<Self, ConfigError> {
        params.validate()?;
        self.params = params;
        Ok(self)
    }

    /// Toggle the between-stage invariant suite.
    pub fn set_debug_checks(&mut self, enabled: bool) {
        self.debug_checks = enabled;
    }

    // === Construction ===

    pub fn register_resource(&mut self, resource: Resource) -> Result<(), ConfigError> {
        if self.resources.contains_key(&resource.name) {
            return Err(ConfigError::DuplicateResource(resource.name));
        }
        self.resources.insert(resource.name.clone(), resource);
        Ok(())
    }

    pub fn add_agent(&mut self, name: impl Into<String>) -> AgentId {
        let name = name.into();
        self.agents.insert_with_key(|id| Agent::new(id, name))
    }

    pub fn add_planet(
        &mut self,
        name: impl Into<String>,
        position: Position,
        government: AgentId,
        population: Population,
    ) -> Result<PlanetId, ConfigError> {
        if !self.agents.contains_key(government) {
            return Err(ConfigError::UnknownAgent);
        }
        let name = name.into();
        let id = self
            .planets
            .insert_with_key(|id| Planet::new(id, name, position, government, population));
        if let Some(agent) = self.agents.get_mut(government)
            && agent.associated_planet.is_none()
        {
            agent.associated_planet = Some(id);
        }
        Ok(id)
    }

    /// Create a claim on a planet for a registered resource; returns its id.
    pub fn add_claim(
        &mut self,
        planet: PlanetId,
        resource: &str,
        quantity: f64,
        regeneration_rate: f64,
        maximum_capacity: f64,
    ) -> Result<u32, ConfigError> {
        if !self.resources.contains_key(resource) {
            return Err(ConfigError::UnknownResource(resource.to_string()));
        }
        let planet = self
            .planets
            .get_mut(planet)
            .ok_or(ConfigError::UnknownPlanet)?;
        let id = self.next_claim_id;
        let claim = ResourceClaim::new(id, resource, quantity, regeneration_rate, maximum_capacity)?;
        self.next_claim_id += 1;
        planet.resources.entry(resource.to_string()).or_default().push(claim);
        Ok(id)
    }

    pub fn claim_mut(
        &mut self,
        planet: PlanetId,
        resource: &str,
        claim_id: u32,
    ) -> Option<&mut ResourceClaim> {
        self.planets
            .get_mut(planet)?
            .resources
            .get_mut(resource)?
            .iter_mut()
            .find(|c| c.id == claim_id)
    }

    /// Create the agent's asset bundle on a planet if it does not exist yet.
    pub fn ensure_assets(
        &mut self,
        agent: AgentId,
        planet: PlanetId,
        storage_capacity: StorageLoad,
        storage_scale: f64,
    ) -> Result<(), ConfigError> {
        if !self.planets.contains_key(planet) {
            return Err(ConfigError::UnknownPlanet);
        }
        let agent = self.agents.get_mut(agent).ok_or(ConfigError::UnknownAgent)?;
        if !agent.assets.contains_key(&planet) {
            agent
                .assets
                .insert(planet, AgentAssets::new(storage_capacity, storage_scale)?);
        }
        Ok(())
    }

    /// Attach a facility to an agent's existing assets on a planet.
    pub fn add_facility(
        &mut self,
        agent: AgentId,
        planet: PlanetId,
        facility: ProductionFacility,
    ) -> Result<(), ConfigError> {
        let agent = self.agents.get_mut(agent).ok_or(ConfigError::UnknownAgent)?;
        let assets = agent
            .assets
            .get_mut(&planet)
            .ok_or(ConfigError::MissingAssets)?;
        assets.production_facilities.push(facility);
        Ok(())
    }

    pub fn agent_assets(&self, agent: AgentId, planet: PlanetId) -> Option<&AgentAssets> {
        self.agents.get(agent)?.assets.get(&planet)
    }

    pub fn agent_assets_mut(
        &mut self,
        agent: AgentId,
        planet: PlanetId,
    ) -> Option<&mut AgentAssets> {
        self.agents.get_mut(agent)?.assets.get_mut(&planet)
    }

    // === Scheduling ===

    /// Host convenience: increment the tick counter, then advance.
    pub fn run_tick(&mut self) -> Result<(), SimError> {
        self.tick += 1;
        self.advance_tick()
    }

    /// Advance the world by the already-incremented tick. Sub-systems run in
    /// a fixed order; with debug checks enabled the invariant suite runs
    /// between stages and aborts the tick on violation.
    pub fn advance_tick(&mut self) -> Result<(), SimError> {
        self.check("tick start")?;
        self.environment_phase();
        self.check("environment")?;
        self.hiring_target_phase();
        self.check("hiring targets")?;
        self.labor_market_phase();
        self.check("labor market")?;
        self.population_phase();
        self.check("population")?;
        self.production_phase();
        self.check("production")?;

        if self.clock.is_month_boundary(self.tick) {
            self.month_phase();
            self.check("month boundary")?;
        }
        if self.clock.is_year_boundary(self.tick) {
            self.year_phase();
            self.check("year boundary")?;
        }
        Ok(())
    }

    fn check(&self, stage: &'static str) -> Result<(), SimError> {
        if self.debug_checks {
            invariants::check_world(self, stage)?;
        }
        Ok(())
    }

    fn occupation_for(&self, agent: AgentId, planet: PlanetId) -> Occupation {
        if self.planets[planet].government == agent {
            Occupation::Government
        } else {
            Occupation::Company
        }
    }

    // === Phases ===

    fn environment_phase(&mut self) {
        for planet in self.planets.values_mut() {
            environment::environment_tick(planet);
        }
    }

    fn hiring_target_phase(&mut self) {
        let agent_ids: Vec<AgentId> = self.agents.keys().collect();
        let planet_ids: Vec<PlanetId> = self.planets.keys().collect();
        for agent_id in agent_ids {
            for &planet_id in &planet_ids {
                let Some(planet) = self.planets.get(planet_id) else {
                    continue;
                };
                let Some(assets) = self
                    .agents
                    .get_mut(agent_id)
                    .and_then(|a| a.assets.get_mut(&planet_id))
                else {
                    continue;
                };
                workforce::update_allocated_workers(assets, &planet.population);
            }
        }
    }

    fn labor_market_phase(&mut self) {
        let agent_ids: Vec<AgentId> = self.agents.keys().collect();
        let planet_ids: Vec<PlanetId> = self.planets.keys().collect();
        for agent_id in agent_ids {
            for &planet_id in &planet_ids {
                let occupation = self.occupation_for(agent_id, planet_id);
                let Some(planet) = self.planets.get_mut(planet_id) else {
                    continue;
                };
                let Some(assets) = self
                    .agents
                    .get_mut(agent_id)
                    .and_then(|a| a.assets.get_mut(&planet_id))
                else {
                    continue;
                };
                workforce::labor_market_tick(
                    self.tick,
                    assets,
                    &mut planet.population,
                    occupation,
                    self.params.voluntary_quit_rate_per_tick,
                );
            }
        }
    }

    fn population_phase(&mut self) {
        let planet_ids: Vec<PlanetId> = self.planets.keys().collect();
        for planet_id in planet_ids {
            let (demand, government) = {
                let planet = &self.planets[planet_id];
                let demand =
                    planet.population.total() as f64 / self.clock.ticks_per_year() as f64;
                (demand, planet.government)
            };

            // The granary request deliberately overshoots demand; the remove
            // caps at real inventory. Missing storage means zero supply.
            let consumed = match self
                .agents
                .get_mut(government)
                .and_then(|a| a.assets.get_mut(&planet_id))
            {
                Some(assets) => {
                    let stored = assets.storage.stored(FOOD_RESOURCE);
                    let requested = (FOOD_DEMAND_HEADROOM * demand).max(stored);
                    assets.storage.remove(FOOD_RESOURCE, requested)
                }
                Option::None => 0.0,
            };
            let nutritional_factor = if demand > 0.0 { consumed / demand } else { 1.0 };

            let planet = &mut self.planets[planet_id];
            let Planet {
                population,
                environment,
                ..
            } = planet;
            let outcome = population::population_tick(
                population,
                environment,
                nutritional_factor,
                &self.clock,
                &self.params,
            );

            #[cfg(feature = "instrument")]
            tracing::info!(
                target: "population",
                tick = self.tick,
                planet = self.planets[planet_id].name.as_str(),
                total = self.planets[planet_id].population.total(),
                starvation = self.planets[planet_id].population.starvation_level,
                nutritional_factor = outcome.nutritional_factor,
                deaths = outcome.deaths,
                births = outcome.births,
                disabled = outcome.disabled,
            );

            workforce::apply_population_deaths_to_workforce(
                &mut self.agents,
                planet_id,
                government,
                &outcome.workforce_losses,
            );
        }
    }

    fn production_phase(&mut self) {
        let agent_ids: Vec<AgentId> = self.agents.keys().collect();
        let planet_ids: Vec<PlanetId> = self.planets.keys().collect();
        for agent_id in agent_ids {
            for &planet_id in &planet_ids {
                let Some(planet) = self.planets.get_mut(planet_id) else {
                    continue;
                };
                let Some(assets) = self
                    .agents
                    .get_mut(agent_id)
                    .and_then(|a| a.assets.get_mut(&planet_id))
                else {
                    continue;
                };
                production::production_tick(self.tick, assets, planet, agent_id, &self.resources);
            }
        }
    }

    fn month_phase(&mut self) {
        let agent_ids: Vec<AgentId> = self.agents.keys().collect();
        let planet_ids: Vec<PlanetId> = self.planets.keys().collect();
        for agent_id in agent_ids {
            for &planet_id in &planet_ids {
                let occupation = self.occupation_for(agent_id, planet_id);
                let Some(planet) = self.planets.get_mut(planet_id) else {
                    continue;
                };
                let Some(assets) = self
                    .agents
                    .get_mut(agent_id)
                    .and_then(|a| a.assets.get_mut(&planet_id))
                else {
                    continue;
                };
                workforce::labor_market_month_tick(
                    self.tick,
                    &mut assets.workforce,
                    &mut planet.population,
                    occupation,
                    &self.clock,
                );
            }
        }
    }

    fn year_phase(&mut self) {
        let planet_ids: Vec<PlanetId> = self.planets.keys().collect();
        for planet_id in planet_ids {
            let government = self.planets[planet_id].government;

            // People aging out of the terminal cohort leave the population
            // book entirely; mirror any employed ones onto the workforce
            // books before they vanish so the two never drift.
            let terminal_losses = {
                let cohort = &self.planets[planet_id].population.demography[MAX_AGE];
                let mut losses = OccupationLosses::default();
                for edu in EducationLevel::ALL {
                    losses.company[edu.index()] = cohort.get(edu, Occupation::Company);
                    losses.government[edu.index()] = cohort.get(edu, Occupation::Government);
                }
                losses
            };
            workforce::apply_population_deaths_to_workforce(
                &mut self.agents,
                planet_id,
                government,
                &terminal_losses,
            );

            population::population_advance_year_tick(&mut self.planets[planet_id].population);
        }

        for agent in self.agents.values_mut() {
            for assets in agent.assets.values_mut() {
                workforce::labor_market_year_tick(&mut assets.workforce);
            }
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
