//! Cross-representation consistency checks.
//!
//! With debug checks enabled the scheduler runs this suite between tick
//! stages and aborts the tick on the first violation. The occupation
//! partition (I2 in the contract) is structural here: a cohort's total is
//! defined as the sum over its cells, so it cannot drift and is not checked.

use thiserror::Error;

use crate::types::{EducationLevel, KeyToU64, MAX_AGE, Occupation};
use crate::world::World;

#[derive(Debug, Clone, Error)]
pub enum ConsistencyViolation {
    #[error(
        "[{stage}] workforce exceeds population on {planet} at {education:?}: \
         workforce={workforce_total}, population={population_total}"
    )]
    WorkforceExceedsPopulation {
        stage: &'static str,
        planet: String,
        education: EducationLevel,
        workforce_total: u64,
        population_total: u64,
    },
    #[error(
        "[{stage}] storage parity broken for agent {agent} on planet {planet}: \
         current=({current_volume}, {current_mass}) contents=({content_volume}, {content_mass})"
    )]
    StorageParity {
        stage: &'static str,
        agent: String,
        planet: u64,
        current_volume: f64,
        current_mass: f64,
        content_volume: f64,
        content_mass: f64,
    },
    #[error(
        "[{stage}] claim {claim_id} of {resource:?} on {planet} out of bounds: \
         quantity={quantity}, maximum={maximum}"
    )]
    ClaimBounds {
        stage: &'static str,
        planet: String,
        resource: String,
        claim_id: u32,
        quantity: f64,
        maximum: f64,
    },
    #[error(
        "[{stage}] age moments insane for agent {agent} (tenure {tenure}, {education:?}): \
         mean={mean}, variance={variance}"
    )]
    MomentsInsane {
        stage: &'static str,
        agent: String,
        tenure: usize,
        education: EducationLevel,
        mean: f64,
        variance: f64,
    },
}

const EPSILON: f64 = 1e-9;

/// Evaluate the full invariant suite against the current world state.
pub fn check_world(world: &World, stage: &'static str) -> Result<(), ConsistencyViolation> {
    check_workforce_bounds(world, stage)?;
    check_storage_parity(world, stage)?;
    check_claim_bounds(world, stage)?;
    check_moments(world, stage)?;
    Ok(())
}

/// I1: per (planet, education), the booked workforce across agents never
/// exceeds the employed population of working age.
fn check_workforce_bounds(world: &World, stage: &'static str) -> Result<(), ConsistencyViolation> {
    for (planet_id, planet) in &world.planets {
        for education in EducationLevel::ALL {
            let workforce_total: u64 = world
                .agents
                .values()
                .filter_map(|agent| agent.assets.get(&planet_id))
                .map(|assets| assets.workforce.booked_total(education))
                .sum();
            let population_total = planet
                .population
                .employable_total(education, Occupation::Company)
                + planet
                    .population
                    .employable_total(education, Occupation::Government);
            if workforce_total > population_total {
                return Err(ConsistencyViolation::WorkforceExceedsPopulation {
                    stage,
                    planet: planet.name.clone(),
                    education,
                    workforce_total,
                    population_total,
                });
            }
        }
    }
    Ok(())
}

/// I3: storage running totals equal the sum over entries, exactly.
fn check_storage_parity(world: &World, stage: &'static str) -> Result<(), ConsistencyViolation> {
    for agent in world.agents.values() {
        for (planet_id, assets) in &agent.assets {
            let content = assets.storage.content_load();
            let current = assets.storage.current;
            if current.volume != content.volume || current.mass != content.mass {
                return Err(ConsistencyViolation::StorageParity {
                    stage,
                    agent: agent.name.clone(),
                    planet: planet_id.to_u64(),
                    current_volume: current.volume,
                    current_mass: current.mass,
                    content_volume: content.volume,
                    content_mass: content.mass,
                });
            }
        }
    }
    Ok(())
}

/// I4: claim quantities stay within [0, maximum_capacity].
fn check_claim_bounds(world: &World, stage: &'static str) -> Result<(), ConsistencyViolation> {
    for planet in world.planets.values() {
        for (resource, claims) in &planet.resources {
            for claim in claims {
                if claim.quantity < -EPSILON || claim.quantity > claim.maximum_capacity + EPSILON {
                    return Err(ConsistencyViolation::ClaimBounds {
                        stage,
                        planet: planet.name.clone(),
                        resource: resource.clone(),
                        claim_id: claim.id,
                        quantity: claim.quantity,
                        maximum: claim.maximum_capacity,
                    });
                }
            }
        }
    }
    Ok(())
}

/// I5: cohort age moments stay sane.
fn check_moments(world: &World, stage: &'static str) -> Result<(), ConsistencyViolation> {
    for agent in world.agents.values() {
        for assets in agent.assets.values() {
            for (tenure, cohort) in assets.workforce.cohorts.iter().enumerate() {
                for education in EducationLevel::ALL {
                    let moments = cohort.level(education).age_moments;
                    if moments.variance < 0.0
                        || moments.mean < 0.0
                        || moments.mean > MAX_AGE as f64
                    {
                        return Err(ConsistencyViolation::MomentsInsane {
                            stage,
                            agent: agent.name.clone(),
                            tenure,
                            education,
                            mean: moments.mean,
                            variance: moments.variance,
                        });
                    }
                }
            }
        }
    }
    Ok(())
}
