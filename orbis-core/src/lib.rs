//! Planetary economy simulation engine
//!
//! This crate is the authoritative core of an interactive planetary economy
//! simulator: a single-writer, tick-driven state machine advancing planets,
//! populations and economic agents in discrete steps. All modelling is
//! aggregate and deterministic - cohorts instead of individuals, closed-form
//! Gaussian approximations instead of random draws.
//!
//! ## The two demography books
//!
//! Every planet keeps a **population book**: age cohorts partitioned by
//! education level and occupation. Every agent keeps a **workforce book**
//! per planet: tenure cohorts partitioned by education, with notice-period
//! pipelines and analytic age moments. Hires, layoffs, quits, deaths,
//! disabilities and retirements are mirrored across both books the same
//! tick, so the books never drift.
//!
//! ## The tick
//!
//! `World::advance_tick` runs a fixed pipeline: environment decay and
//! renewable regeneration, feedback hiring targets, the labor market,
//! population dynamics (with death reconciliation onto the workforce books),
//! and production. Month boundaries advance the notice pipelines and trigger
//! proportional retirement; year boundaries age both books. In debug mode
//! the consistency suite runs between stages.
//!
//! ## Module structure
//!
//! - `types`        Ids, education/occupation axes, engine constants
//! - `clock`        Tick/month/year configuration and rate conversion
//! - `stats`        Gaussian solvers and Hamilton apportionment
//! - `params`       Scenario policy rates with canonical defaults
//! - `resources`    Resource catalog and the claim/tenant model
//! - `storage`      Mass/volume-capped storage buckets
//! - `environment`  Pollution decay and regeneration
//! - `population`   The population book and its dynamics
//! - `workforce`    The workforce book: hiring, lifecycle, reconciliation
//! - `production`   Facilities, two-pass worker allocation, efficiency
//! - `agents`       Agents and per-planet asset bundles
//! - `planet`       Planet state
//! - `world`        State container and tick scheduler
//! - `invariants`   Cross-representation consistency checks
//! - `snapshot`     Serializable state for persistence and the WASM host

pub mod agents;
pub mod clock;
pub mod environment;
pub mod error;
#[cfg(feature = "instrument")]
pub use instrument;
pub mod invariants;
pub mod params;
pub mod planet;
pub mod population;
pub mod production;
pub mod resources;
pub mod snapshot;
pub mod stats;
pub mod storage;
pub mod types;
pub mod workforce;
pub mod world;

// Re-export commonly used types at the crate root

// Core types
pub use types::{
    AgentId, EducationLevel, KeyToU64, MAX_AGE, MAX_TENURE_YEARS, MIN_EMPLOYABLE_AGE,
    NOTICE_PERIOD_MONTHS, Occupation, PerEducation, PlanetId, RETIREMENT_AGE,
};

// Time
pub use clock::SimClock;

// Statistics
pub use stats::{AgeMoments, largest_remainder, normal_cdf, normal_pdf};

// Parameters & errors
pub use error::{ConfigError, SimError};
pub use params::SimParams;

// Resources & storage
pub use resources::{
    FOOD_RESOURCE, Resource, ResourceClaim, ResourceKind, ResourcePhase,
    extract_from_claimed_resource, query_claimed_resource,
};
pub use storage::{StorageFacility, StorageLoad};

// Environment
pub use environment::{
    AxisRates, Environment, NaturalDisasters, PollutionLevels, RegenerationRates, environment_tick,
};

// Population
pub use population::{
    Cohort, OccupationLosses, Population, create_population, distribute_like,
    population_advance_year_tick, population_tick,
};

// Workforce
pub use workforce::{
    ACCEPTABLE_IDLE_FRACTION, CohortLevel, DEPARTING_EFFICIENCY, LAYOFF_PROTECTED_YEARS,
    TenureCohort, WorkforceDemography, apply_population_deaths_to_workforce, fire_workers,
    hire_from_population, labor_market_month_tick, labor_market_tick, labor_market_year_tick,
    retirement_annual_fraction, update_allocated_workers, workforce_mortality_tick,
};

// Production
pub use production::{
    FacilityIo, LastTickResults, OVERQUALIFIED_EFFICIENCY_BONUS, ProductionFacility,
    age_productivity_multiplier, experience_multiplier, production_tick,
};

// World
pub use agents::{Agent, AgentAssets};
pub use planet::{Infrastructure, Planet, Position};
pub use world::World;

// Invariants & snapshots
pub use invariants::{ConsistencyViolation, check_world};
pub use snapshot::{AgentRef, StateSnapshot};

#[cfg(target_arch = "wasm32")]
mod wasm_init {
    use wasm_bindgen::prelude::*;

    #[wasm_bindgen(start)]
    pub fn start() {
        console_error_panic_hook::set_once();
    }
}
