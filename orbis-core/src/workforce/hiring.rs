//! Hiring targets and the per-tick labor market.
//!
//! The target controller is a feedback loop: production records how many
//! hired workers it could not use (and which education levels it had to
//! staff with overqualified people), and the next tick's targets steer
//! toward the level that was actually consumed.

use crate::agents::AgentAssets;
use crate::population::Population;
use crate::stats::{AgeMoments, largest_remainder};
use crate::types::{
    EducationLevel, MIN_EMPLOYABLE_AGE, MAX_TENURE_YEARS, NOTICE_PERIOD_MONTHS, Occupation,
    PerEducation,
};

use super::WorkforceDemography;

/// Hiring targets carry this fraction of slack above observed consumption.
pub const ACCEPTABLE_IDLE_FRACTION: f64 = 0.05;

/// Output fraction a worker delivers while serving out a notice period.
pub const DEPARTING_EFFICIENCY: f64 = 0.5;

/// Tenure years shielded from layoffs (years 0..=LAYOFF_PROTECTED_YEARS).
pub const LAYOFF_PROTECTED_YEARS: usize = 1;

// === TARGET CONTROLLER ===

/// Recompute `allocated_workers` for one agent on one planet from the
/// previous tick's feedback, then cascade unfillable demand upward through
/// the education levels.
pub fn update_allocated_workers(assets: &mut AgentAssets, population: &Population) {
    let buffer = 1.0 + ACCEPTABLE_IDLE_FRACTION;

    let target: PerEducation<u64> = match assets.unused_workers {
        Option::None => bootstrap_targets(assets, buffer),
        Some(unused) => feedback_targets(assets, &unused, buffer),
    };

    // Cascade: demand that cannot be met from workers already hired plus the
    // planet's unoccupied pool at this level spills into the next higher
    // level; the top level parks whatever is left.
    let mut allocated = [0u64; EducationLevel::COUNT];
    let mut overflow = 0u64;
    for edu in EducationLevel::ALL {
        let want = target[edu.index()] + overflow;
        if edu == EducationLevel::Quaternary {
            allocated[edu.index()] = want;
            overflow = 0;
        } else {
            let reachable =
                assets.workforce.active_total(edu) + population.unoccupied_employable(edu);
            let granted = want.min(reachable);
            allocated[edu.index()] = granted;
            overflow = want - granted;
        }
    }
    assets.allocated_workers = allocated;
}

/// First tick: no feedback yet, staff straight to facility requirements.
fn bootstrap_targets(assets: &AgentAssets, buffer: f64) -> PerEducation<u64> {
    let mut target = [0u64; EducationLevel::COUNT];
    for edu in EducationLevel::ALL {
        let requirement: f64 = assets
            .production_facilities
            .iter()
            .map(|f| f.worker_requirement[edu.index()] as f64 * f.scale)
            .sum();
        target[edu.index()] = (requirement * buffer).ceil() as u64;
    }
    target
}

fn feedback_targets(
    assets: &AgentAssets,
    unused: &PerEducation<u64>,
    buffer: f64,
) -> PerEducation<u64> {
    let workforce = &assets.workforce;

    // What production actually consumed last tick, per level.
    let mut consumed = [0i64; EducationLevel::COUNT];
    for edu in EducationLevel::ALL {
        let voluntary: u64 = workforce
            .cohorts
            .iter()
            .map(|c| c.level(edu).voluntary_departing_total())
            .sum();
        let pool = workforce.active_total(edu) as i64
            + (voluntary as f64 * DEPARTING_EFFICIENCY).floor() as i64
            - workforce.retiring_total(edu) as i64;
        consumed[edu.index()] = pool - unused[edu.index()] as i64;
    }

    // Overqualified workers consumed a slot below their level; shift the
    // demand to the level that was actually short.
    for job in 0..EducationLevel::COUNT {
        for worker in 0..EducationLevel::COUNT {
            let n = assets.overqualified[job][worker] as i64;
            if n != 0 {
                consumed[worker] -= n;
                consumed[job] += n;
            }
        }
    }

    let mut target = [0u64; EducationLevel::COUNT];
    for edu in EducationLevel::ALL {
        let facility_floor: u64 = assets
            .production_facilities
            .iter()
            .map(|f| (f.worker_requirement[edu.index()] as f64 * f.scale).ceil() as u64)
            .sum();
        let c = consumed[edu.index()];
        target[edu.index()] = if c > 0 {
            (c as f64 * buffer).ceil() as u64
        } else if facility_floor > 0 {
            (facility_floor as f64 * buffer).ceil() as u64
        } else {
            0
        };
    }
    target
}

// === PER-TICK LABOR MARKET ===

/// Voluntary quits, then hires or layoffs toward the allocated target, for
/// every education level in order.
#[cfg_attr(not(feature = "instrument"), allow(unused_variables))]
pub fn labor_market_tick(
    tick: u64,
    assets: &mut AgentAssets,
    population: &mut Population,
    occupation: Occupation,
    quit_rate: f64,
) {
    for edu in EducationLevel::ALL {
        if quit_rate > 0.0 {
            for cohort in assets.workforce.cohorts.iter_mut() {
                let level = cohort.level_mut(edu);
                let quitters = (level.active as f64 * quit_rate).floor() as u64;
                if quitters == 0 {
                    continue;
                }
                level.remove_active(quitters);
                level.departing[NOTICE_PERIOD_MONTHS - 1] += quitters;

                #[cfg(feature = "instrument")]
                tracing::info!(
                    target: "labor",
                    tick = tick,
                    event = "quit",
                    education = ?edu,
                    count = quitters,
                );
            }
        }

        let target = assets.allocated_workers[edu.index()];
        let active = assets.workforce.active_total(edu);
        if target > active {
            let hired = hire_from_population(
                &mut assets.workforce,
                population,
                edu,
                target - active,
                occupation,
            );

            #[cfg(feature = "instrument")]
            if hired > 0 {
                tracing::info!(
                    target: "labor",
                    tick = tick,
                    event = "hire",
                    education = ?edu,
                    count = hired,
                );
            }
            let _ = hired;
        } else if active > target {
            let fired = fire_workers(&mut assets.workforce, edu, active - target);

            #[cfg(feature = "instrument")]
            if fired > 0 {
                tracing::info!(
                    target: "labor",
                    tick = tick,
                    event = "fire",
                    education = ?edu,
                    count = fired,
                );
            }
            let _ = fired;
        }
    }
}

/// Pull up to `count` unoccupied people of one education level out of the
/// population, spread across employable ages proportionally, and merge them
/// into tenure cohort 0 with the batch's exact age moments. Returns the
/// number hired.
pub fn hire_from_population(
    workforce: &mut WorkforceDemography,
    population: &mut Population,
    education: EducationLevel,
    count: u64,
    occupation: Occupation,
) -> u64 {
    let weights: Vec<u64> = population.demography[MIN_EMPLOYABLE_AGE..]
        .iter()
        .map(|c| c.get(education, Occupation::Unoccupied))
        .collect();
    let available: u64 = weights.iter().sum();
    let hired = count.min(available);
    if hired == 0 {
        return 0;
    }

    let shares = largest_remainder(hired, &weights);

    // Sample mean and population variance of the hired ages.
    let mut weighted_age: u64 = 0;
    for (offset, &share) in shares.iter().enumerate() {
        weighted_age += share * (MIN_EMPLOYABLE_AGE + offset) as u64;
    }
    let mean = weighted_age as f64 / hired as f64;
    let mut variance = 0.0;
    for (offset, &share) in shares.iter().enumerate() {
        if share > 0 {
            let age = (MIN_EMPLOYABLE_AGE + offset) as f64;
            variance += share as f64 * (age - mean) * (age - mean);
        }
    }
    variance /= hired as f64;

    for (offset, share) in shares.into_iter().enumerate() {
        if share == 0 {
            continue;
        }
        let cohort = &mut population.demography[MIN_EMPLOYABLE_AGE + offset];
        let removed = cohort.remove(education, Occupation::Unoccupied, share);
        cohort.add(education, occupation, removed);
    }

    workforce.cohorts[0]
        .level_mut(education)
        .add_hires(hired, AgeMoments::new(mean, variance));
    hired
}

/// Lay off up to `count` workers, walking tenure years from the lowest
/// unprotected one upward. Fired workers enter both the departing pipeline
/// and its fired-subset marker. Returns the number laid off.
pub fn fire_workers(
    workforce: &mut WorkforceDemography,
    education: EducationLevel,
    count: u64,
) -> u64 {
    let mut remaining = count;
    for tenure in (LAYOFF_PROTECTED_YEARS + 1)..=MAX_TENURE_YEARS {
        if remaining == 0 {
            break;
        }
        let level = workforce.cohorts[tenure].level_mut(education);
        let take = level.remove_active(remaining);
        if take > 0 {
            level.departing[NOTICE_PERIOD_MONTHS - 1] += take;
            level.departing_fired[NOTICE_PERIOD_MONTHS - 1] += take;
            remaining -= take;
        }
    }
    count - remaining
}
