//! The production tick: worker allocation, efficiency, IO and feedback.

use std::collections::BTreeMap;

use crate::agents::AgentAssets;
use crate::planet::Planet;
use crate::resources::{Resource, extract_from_claimed_resource};
use crate::types::{AgentId, EducationLevel, PerEducation};
use crate::workforce::{DEPARTING_EFFICIENCY, WorkforceDemography};

use super::LastTickResults;

/// Output factor of a worker staffed below their education level via the
/// cascade.
pub const OVERQUALIFIED_EFFICIENCY_BONUS: f64 = 1.25;

// === PRODUCTIVITY CURVES ===

/// Piecewise age curve: 0.8 through adolescence, rising to 1.0 by 30, flat
/// through 50, easing to 0.85 by 65, then decaying to a 0.7 floor.
pub fn age_productivity_multiplier(age: f64) -> f64 {
    if age <= 18.0 {
        0.8
    } else if age <= 30.0 {
        0.8 + 0.2 * (age - 18.0) / 12.0
    } else if age <= 50.0 {
        1.0
    } else if age <= 65.0 {
        1.0 - 0.15 * (age - 50.0) / 15.0
    } else {
        (0.85 - 0.01 * (age - 65.0)).max(0.7)
    }
}

/// Experience ramp: 1.0 for a fresh hire, linear to 1.5 at ten tenure years,
/// capped there.
pub fn experience_multiplier(tenure_years: f64) -> f64 {
    (1.0 + 0.05 * tenure_years).min(1.5)
}

/// Count-weighted age and tenure productivity per education level. Levels
/// with no active workers fall back to 1.0.
fn productivity_by_education(
    workforce: &WorkforceDemography,
) -> (PerEducation<f64>, PerEducation<f64>) {
    let mut age_prod = [1.0; EducationLevel::COUNT];
    let mut tenure_prod = [1.0; EducationLevel::COUNT];

    for edu in EducationLevel::ALL {
        let mut heads = 0u64;
        let mut age_sum = 0.0;
        let mut experience_sum = 0.0;
        for (tenure, cohort) in workforce.cohorts.iter().enumerate() {
            let level = cohort.level(edu);
            if level.active == 0 {
                continue;
            }
            heads += level.active;
            age_sum += level.active as f64 * level.age_moments.mean;
            experience_sum += level.active as f64 * experience_multiplier(tenure as f64);
        }
        if heads > 0 {
            age_prod[edu.index()] = age_productivity_multiplier(age_sum / heads as f64);
            tenure_prod[edu.index()] = experience_sum / heads as f64;
        }
    }
    (age_prod, tenure_prod)
}

// === PRODUCTION TICK ===

/// Run every facility of one agent on one planet: allocate workers in two
/// passes (exact match, then the upward cascade), gate on resource
/// availability, emit outputs and pollution, and record the unused-worker
/// and overqualified feedback the next tick's hiring controller reads.
#[cfg_attr(not(feature = "instrument"), allow(unused_variables))]
pub fn production_tick(
    tick: u64,
    assets: &mut AgentAssets,
    planet: &mut Planet,
    agent: AgentId,
    catalog: &BTreeMap<String, Resource>,
) {
    let AgentAssets {
        production_facilities,
        storage,
        workforce,
        unused_workers,
        unused_worker_fraction,
        overqualified,
        ..
    } = assets;

    // The tick's worker pool: actives plus departing workers at reduced
    // output, counted in bodies.
    let mut pool = [0u64; EducationLevel::COUNT];
    for edu in EducationLevel::ALL {
        pool[edu.index()] = workforce.active_total(edu)
            + (workforce.departing_total(edu) as f64 * DEPARTING_EFFICIENCY).floor() as u64;
    }
    let hired_total: u64 = pool.iter().sum();

    let (age_prod, tenure_prod) = productivity_by_education(workforce);
    let mut overqualified_totals = [[0u64; EducationLevel::COUNT]; EducationLevel::COUNT];

    for facility in production_facilities.iter_mut() {
        let scale = facility.scale;

        // Worker allocation.
        let mut worker_efficiency = [1.0; EducationLevel::COUNT];
        let mut worker_overall = 1.0f64;
        let mut facility_overqualified = [[0u64; EducationLevel::COUNT]; EducationLevel::COUNT];

        for job in EducationLevel::ALL {
            let target = facility.worker_requirement[job.index()] as f64 * scale;
            if target <= 0.0 {
                continue;
            }

            // Pass 1: exact-match workers at their own productivity.
            let combined = age_prod[job.index()] * tenure_prod[job.index()];
            let bodies_needed = (target / combined).ceil() as u64;
            let taken = bodies_needed.min(pool[job.index()]);
            pool[job.index()] -= taken;
            let mut filled = taken as f64 * combined;

            // Pass 2: cascade upward through higher education levels.
            for candidate in (job.index() + 1)..EducationLevel::COUNT {
                let gap = target - filled;
                if gap <= 0.0 {
                    break;
                }
                let candidate_combined = age_prod[candidate]
                    * tenure_prod[candidate]
                    * OVERQUALIFIED_EFFICIENCY_BONUS;
                let bodies_needed = (gap / candidate_combined).ceil() as u64;
                let taken = bodies_needed.min(pool[candidate]);
                if taken == 0 {
                    continue;
                }
                pool[candidate] -= taken;
                filled += taken as f64 * candidate_combined;
                facility_overqualified[job.index()][candidate] += taken;
            }

            let slot_efficiency = (filled / target).min(1.0);
            worker_efficiency[job.index()] = slot_efficiency;
            worker_overall = worker_overall.min(slot_efficiency);
        }

        // Resource availability.
        let mut resource_efficiency = BTreeMap::new();
        let mut overall = worker_overall;
        for need in &facility.needs {
            let required = need.quantity * scale;
            if required <= 0.0 {
                continue;
            }
            let land_bound = catalog
                .get(&need.resource)
                .is_some_and(Resource::is_land_bound);
            let available = if land_bound {
                planet
                    .resources
                    .get(&need.resource)
                    .map_or(0.0, |claims| {
                        crate::resources::query_claimed_resource(claims, agent)
                    })
            } else {
                storage.stored(&need.resource)
            };
            let efficiency = (available / required).min(1.0);
            resource_efficiency.insert(need.resource.clone(), efficiency);
            overall = overall.min(efficiency);
        }

        for (job, row) in facility_overqualified.iter().enumerate() {
            for (worker, &n) in row.iter().enumerate() {
                overqualified_totals[job][worker] += n;
            }
        }

        facility.last_tick_results = Some(LastTickResults {
            overall_efficiency: overall,
            worker_efficiency,
            worker_efficiency_overall: worker_overall,
            resource_efficiency,
            overqualified_workers: facility_overqualified,
            efficiency_percent: (overall * 100.0).round() as u32,
        });

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "production",
            tick = tick,
            facility = facility.name.as_str(),
            overall_efficiency = overall,
            worker_efficiency = worker_overall,
        );

        if overall <= 0.0 {
            continue;
        }

        // Pollution scales with realized output.
        let pollution = &mut planet.environment.pollution;
        pollution.air += facility.pollution_per_tick.air * scale * overall;
        pollution.water += facility.pollution_per_tick.water * scale * overall;
        pollution.soil += facility.pollution_per_tick.soil * scale * overall;

        // Outputs into storage, capped by its headroom.
        for output in &facility.produces {
            let quantity = (output.quantity * scale * overall).floor();
            if quantity <= 0.0 {
                continue;
            }
            let Some(resource) = catalog.get(&output.resource) else {
                #[cfg(feature = "instrument")]
                tracing::warn!(
                    target: "production_io",
                    tick = tick,
                    facility = facility.name.as_str(),
                    resource = output.resource.as_str(),
                    "produced resource is not registered",
                );
                continue;
            };
            let stored = storage.put(resource, quantity);

            #[cfg(feature = "instrument")]
            if stored + 1e-9 < quantity {
                tracing::warn!(
                    target: "production_io",
                    tick = tick,
                    facility = facility.name.as_str(),
                    resource = output.resource.as_str(),
                    produced = quantity,
                    stored = stored,
                    "storage capacity truncated production output",
                );
            }
            let _ = stored;
        }

        // Inputs from claims (land-bound) or storage. Efficiency was clamped
        // to availability upstream, so a shortfall can only arise from a
        // capacity tie; log it and continue.
        for need in &facility.needs {
            let amount = (need.quantity * scale * overall).ceil();
            if amount <= 0.0 {
                continue;
            }
            let land_bound = catalog
                .get(&need.resource)
                .is_some_and(Resource::is_land_bound);
            let obtained = if land_bound {
                planet
                    .resources
                    .get_mut(&need.resource)
                    .map_or(0.0, |claims| {
                        extract_from_claimed_resource(claims, agent, amount)
                    })
            } else {
                storage.remove(&need.resource, amount)
            };

            #[cfg(feature = "instrument")]
            if obtained + 1e-9 < amount {
                tracing::warn!(
                    target: "production_io",
                    tick = tick,
                    facility = facility.name.as_str(),
                    resource = need.resource.as_str(),
                    expected = amount,
                    obtained = obtained,
                    "consumption fell short of the expected amount",
                );
            }
            let _ = obtained;
        }
    }

    // Feedback for the next tick's hiring controller.
    let unused_total: u64 = pool.iter().sum();
    *unused_workers = Some(pool);
    *unused_worker_fraction = if hired_total > 0 {
        unused_total as f64 / hired_total as f64
    } else {
        0.0
    };
    *overqualified = overqualified_totals;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_curve_matches_breakpoints() {
        assert_eq!(age_productivity_multiplier(10.0), 0.8);
        assert_eq!(age_productivity_multiplier(18.0), 0.8);
        assert!((age_productivity_multiplier(24.0) - 0.9).abs() < 1e-12);
        assert_eq!(age_productivity_multiplier(30.0), 1.0);
        assert_eq!(age_productivity_multiplier(50.0), 1.0);
        assert!((age_productivity_multiplier(57.5) - 0.925).abs() < 1e-12);
        assert!((age_productivity_multiplier(65.0) - 0.85).abs() < 1e-12);
        assert_eq!(age_productivity_multiplier(90.0), 0.7);
    }

    #[test]
    fn experience_ramp_caps_at_ten_years() {
        assert_eq!(experience_multiplier(0.0), 1.0);
        assert!((experience_multiplier(5.0) - 1.25).abs() < 1e-12);
        assert_eq!(experience_multiplier(10.0), 1.5);
        assert_eq!(experience_multiplier(40.0), 1.5);
    }
}
