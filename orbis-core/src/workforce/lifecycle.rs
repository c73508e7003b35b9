//! Monthly and yearly workforce lifecycle: retirement, notice pipelines,
//! tenure aging, and the death reconciliation that keeps the two demography
//! books in lockstep.

use slotmap::SlotMap;

use crate::agents::Agent;
use crate::clock::SimClock;
use crate::params::SimParams;
use crate::population::{OccupationLosses, Population, starvation_mortality_factor};
use crate::stats::{AgeMoments, GAUSS_HERMITE_3, largest_remainder, normal_cdf};
use crate::types::{
    AgentId, EducationLevel, MAX_AGE, MAX_TENURE_YEARS, NOTICE_PERIOD_MONTHS, Occupation,
    PlanetId, RETIREMENT_AGE,
};

use super::{CohortLevel, WorkforceDemography};

// === MONTHLY TICK ===

/// Annual retirement fraction for a cohort with the given moments. Degenerate
/// cohorts (no spread, or a single worker) retire all-or-nothing on the age
/// threshold; otherwise the Gaussian tail above the retirement age retires.
pub fn retirement_annual_fraction(moments: AgeMoments, active: u64) -> f64 {
    if moments.variance < 1.0 || active <= 1 {
        if moments.mean >= RETIREMENT_AGE { 1.0 } else { 0.0 }
    } else {
        1.0 - normal_cdf((RETIREMENT_AGE - moments.mean) / moments.sigma())
    }
}

/// Month boundary: proportional retirement, pipeline advancement, and the
/// month-start activity snapshot. `occupation` is the population-book
/// occupation this agent's workers hold.
#[cfg_attr(not(feature = "instrument"), allow(unused_variables))]
pub fn labor_market_month_tick(
    tick: u64,
    workforce: &mut WorkforceDemography,
    population: &mut Population,
    occupation: Occupation,
    clock: &SimClock,
) {
    // 1. Retirement trigger. The annual fraction is spread over the year so
    // a cohort crossing the threshold drains month by month instead of in
    // one spike.
    for cohort in workforce.cohorts.iter_mut() {
        for edu in EducationLevel::ALL {
            let level = cohort.level_mut(edu);
            if level.active == 0 {
                continue;
            }
            let annual = retirement_annual_fraction(level.age_moments, level.active);
            if annual <= 0.0 {
                continue;
            }
            let monthly = clock.per_month_rate(annual);
            let retiring = ((level.active as f64 * monthly).round() as u64).min(level.active);
            if retiring == 0 {
                continue;
            }
            level.active -= retiring;
            level.retiring[NOTICE_PERIOD_MONTHS - 1] += retiring;

            if level.active == 0 {
                level.age_moments = AgeMoments::default();
            } else if level.age_moments.variance >= 1.0 {
                // The retirees were the upper tail; the remainder follows the
                // truncated normal below the threshold.
                level.age_moments = level.age_moments.retain_below(RETIREMENT_AGE);
            }

            #[cfg(feature = "instrument")]
            tracing::info!(
                target: "retirement",
                tick = tick,
                education = ?edu,
                count = retiring,
                annual_fraction = annual,
                remaining = level.active,
            );
        }
    }

    // 2. Pipeline advancement: slot 0 leaves the books, everything shifts.
    for cohort in workforce.cohorts.iter_mut() {
        for edu in EducationLevel::ALL {
            let level = cohort.level_mut(edu);
            let departing_now = level.departing[0];
            let retiring_now = level.retiring[0];

            if departing_now > 0 {
                let moved =
                    population.shift_occupation(edu, occupation, Occupation::Unoccupied, departing_now);

                #[cfg(feature = "instrument")]
                if moved < departing_now {
                    tracing::warn!(
                        target: "pipeline",
                        tick = tick,
                        education = ?edu,
                        expected = departing_now,
                        moved = moved,
                        "population book short while releasing departing workers",
                    );
                }
                let _ = moved;
            }
            if retiring_now > 0 {
                population.shift_occupation(edu, occupation, Occupation::UnableToWork, retiring_now);
            }

            shift_pipeline(&mut level.departing);
            shift_pipeline(&mut level.departing_fired);
            shift_pipeline(&mut level.retiring);
        }
    }

    // 3. Month-start snapshot for delta reporting.
    for edu in EducationLevel::ALL {
        workforce.active_at_month_start[edu.index()] = workforce.active_total(edu);
    }
}

fn shift_pipeline(pipeline: &mut [u64; NOTICE_PERIOD_MONTHS]) {
    pipeline.rotate_left(1);
    pipeline[NOTICE_PERIOD_MONTHS - 1] = 0;
}

// === YEARLY TICK ===

/// Advance every tenure bucket by one year, high to low, merging age moments
/// with both means aged one year. The top bucket accumulates.
pub fn labor_market_year_tick(workforce: &mut WorkforceDemography) {
    for tenure in (1..=MAX_TENURE_YEARS).rev() {
        let (lower, upper) = workforce.cohorts.split_at_mut(tenure);
        let src = &mut lower[tenure - 1];
        let dst = &mut upper[0];

        for edu in EducationLevel::ALL {
            let src_level = src.level_mut(edu);
            let dst_level = dst.level_mut(edu);

            match (dst_level.active, src_level.active) {
                (0, 0) => {}
                (_, 0) => dst_level.age_moments = dst_level.age_moments.aged(1.0),
                (0, _) => dst_level.age_moments = src_level.age_moments.aged(1.0),
                (n1, n2) => {
                    dst_level.age_moments = AgeMoments::combine(
                        n1,
                        dst_level.age_moments.aged(1.0),
                        n2,
                        src_level.age_moments.aged(1.0),
                    )
                }
            }
            dst_level.active += src_level.active;
            src_level.active = 0;
            src_level.age_moments = AgeMoments::default();

            for slot in 0..NOTICE_PERIOD_MONTHS {
                dst_level.departing[slot] += src_level.departing[slot];
                dst_level.departing_fired[slot] += src_level.departing_fired[slot];
                dst_level.retiring[slot] += src_level.retiring[slot];
                src_level.departing[slot] = 0;
                src_level.departing_fired[slot] = 0;
                src_level.retiring[slot] = 0;
            }
        }
    }
}

// === MORTALITY ===

/// Gauss-Hermite estimate of per-tick workforce deaths, per cohort. Retained
/// as a cross-check against the authoritative reconciliation below; the
/// scheduler does not call it.
pub fn workforce_mortality_tick(
    workforce: &mut WorkforceDemography,
    clock: &SimClock,
    params: &SimParams,
    extra_annual: f64,
    starvation: f64,
) -> u64 {
    let factor = starvation_mortality_factor(starvation);
    let mut deaths = 0;

    for cohort in workforce.cohorts.iter_mut() {
        for edu in EducationLevel::ALL {
            let level = cohort.level_mut(edu);
            if level.active == 0 {
                continue;
            }
            let moments = level.age_moments;
            let sigma = moments.sigma();

            let mut annual = 0.0;
            for (offset, weight) in GAUSS_HERMITE_3 {
                let age = (moments.mean + offset * sigma)
                    .round()
                    .clamp(0.0, MAX_AGE as f64) as usize;
                annual += weight * (params.mortality[age] * factor + extra_annual).min(1.0);
            }

            let per_tick = clock.per_tick_rate(annual.min(1.0));
            let dying = (level.active as f64 * per_tick).floor() as u64;
            deaths += level.remove_active(dying);
        }
    }
    deaths
}

// === RECONCILIATION ===

/// Mirror the population book's exact Company/Government losses onto the
/// workforce books. Losses are apportioned across the agents holding workers
/// of that occupation, then across tenure cohorts, by Hamilton shares over
/// booked headcount. This is the only path that removes workers for deaths
/// inside `advance_tick`.
pub fn apply_population_deaths_to_workforce(
    agents: &mut SlotMap<AgentId, Agent>,
    planet: PlanetId,
    government: AgentId,
    losses: &OccupationLosses,
) {
    if losses.is_empty() {
        return;
    }
    let agent_ids: Vec<AgentId> = agents.keys().collect();

    let books = [
        (Occupation::Company, &losses.company),
        (Occupation::Government, &losses.government),
    ];
    for (occupation, per_edu) in books {
        for edu in EducationLevel::ALL {
            let loss = per_edu[edu.index()];
            if loss == 0 {
                continue;
            }

            let eligible: Vec<AgentId> = agent_ids
                .iter()
                .copied()
                .filter(|&id| {
                    if occupation == Occupation::Government {
                        id == government
                    } else {
                        id != government
                    }
                })
                .filter(|&id| {
                    agents[id]
                        .assets
                        .get(&planet)
                        .is_some_and(|a| a.workforce.booked_total(edu) > 0)
                })
                .collect();

            let weights: Vec<u64> = eligible
                .iter()
                .map(|&id| agents[id].assets[&planet].workforce.booked_total(edu))
                .collect();
            let capacity: u64 = weights.iter().sum();
            let applicable = loss.min(capacity);

            #[cfg(feature = "instrument")]
            if applicable < loss {
                tracing::warn!(
                    target: "reconcile",
                    education = ?edu,
                    occupation = ?occupation,
                    unmatched = loss - applicable,
                    "population losses exceed booked workforce",
                );
            }
            if applicable == 0 {
                continue;
            }

            let shares = largest_remainder(applicable, &weights);
            for (&id, share) in eligible.iter().zip(shares) {
                if share == 0 {
                    continue;
                }
                let Some(assets) = agents[id].assets.get_mut(&planet) else {
                    continue;
                };
                remove_losses(&mut assets.workforce, edu, share);
            }
        }
    }
}

fn remove_losses(workforce: &mut WorkforceDemography, education: EducationLevel, count: u64) {
    let cohort_weights: Vec<u64> = workforce
        .cohorts
        .iter()
        .map(|c| c.level(education).booked_total())
        .collect();
    let shares = largest_remainder(count, &cohort_weights);
    for (cohort, share) in workforce.cohorts.iter_mut().zip(shares) {
        if share > 0 {
            remove_booked(cohort.level_mut(education), share);
        }
    }
}

/// Remove losses from one cohort cell: active first, then the departing
/// pipeline (oldest slot first, keeping the fired marker a subset), then the
/// retiring pipeline.
fn remove_booked(level: &mut CohortLevel, count: u64) -> u64 {
    let mut remaining = count;
    remaining -= level.remove_active(remaining);

    for slot in 0..NOTICE_PERIOD_MONTHS {
        if remaining == 0 {
            break;
        }
        let take = level.departing[slot].min(remaining);
        level.departing[slot] -= take;
        level.departing_fired[slot] = level.departing_fired[slot].min(level.departing[slot]);
        remaining -= take;
    }
    for slot in 0..NOTICE_PERIOD_MONTHS {
        if remaining == 0 {
            break;
        }
        let take = level.retiring[slot].min(remaining);
        level.retiring[slot] -= take;
        remaining -= take;
    }
    count - remaining
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staffed(tenure: usize, edu: EducationLevel, active: u64, moments: AgeMoments) -> WorkforceDemography {
        let mut wf = WorkforceDemography::new();
        let level = wf.cohorts[tenure].level_mut(edu);
        level.active = active;
        level.age_moments = moments;
        wf
    }

    #[test]
    fn retirement_fraction_threshold_for_degenerate_cohorts() {
        assert_eq!(retirement_annual_fraction(AgeMoments::new(66.9, 0.5), 100), 0.0);
        assert_eq!(retirement_annual_fraction(AgeMoments::new(67.0, 0.5), 100), 1.0);
        // Single worker always degenerates to the threshold rule.
        assert_eq!(retirement_annual_fraction(AgeMoments::new(70.0, 100.0), 1), 1.0);
    }

    #[test]
    fn retirement_fraction_is_gaussian_tail() {
        let f = retirement_annual_fraction(AgeMoments::new(67.0, 25.0), 1000);
        assert!((f - 0.5).abs() < 1e-6);
    }

    #[test]
    fn monthly_retirement_spreads_the_annual_fraction() {
        let mut wf = staffed(5, EducationLevel::None, 100_000, AgeMoments::new(67.0, 25.0));
        let mut pop = Population::empty();
        pop.demography[67].add(EducationLevel::None, Occupation::Company, 100_000);
        let clock = SimClock::default();

        labor_market_month_tick(30, &mut wf, &mut pop, Occupation::Company, &clock);

        let expected = (100_000.0 * (1.0 - 0.5f64.powf(1.0 / 12.0))).round() as u64;
        let level = wf.cohorts[5].level(EducationLevel::None);
        assert_eq!(level.retiring_total(), expected);
        assert_eq!(level.active, 100_000 - expected);
        // The survivors are the truncated lower part: younger, tighter.
        assert!(level.age_moments.mean < 67.0);
        assert!(level.age_moments.variance < 25.0);
    }

    #[test]
    fn pipelines_shift_and_release_at_slot_zero() {
        let mut wf = WorkforceDemography::new();
        let level = wf.cohorts[3].level_mut(EducationLevel::Primary);
        level.departing[0] = 7;
        level.departing_fired[0] = 2;
        level.departing[4] = 5;
        level.retiring[0] = 3;

        let mut pop = Population::empty();
        pop.demography[40].add(EducationLevel::Primary, Occupation::Company, 100);

        let clock = SimClock::default();
        labor_market_month_tick(30, &mut wf, &mut pop, Occupation::Company, &clock);

        // 7 departing returned to Unoccupied, 3 retirees to UnableToWork.
        assert_eq!(
            pop.count(40, EducationLevel::Primary, Occupation::Unoccupied),
            7
        );
        assert_eq!(
            pop.count(40, EducationLevel::Primary, Occupation::UnableToWork),
            3
        );
        assert_eq!(
            pop.count(40, EducationLevel::Primary, Occupation::Company),
            90
        );

        let level = wf.cohorts[3].level(EducationLevel::Primary);
        assert_eq!(level.departing[3], 5);
        assert_eq!(level.departing[NOTICE_PERIOD_MONTHS - 1], 0);
        assert_eq!(level.departing_total(), 5);
        assert_eq!(level.fired_total(), 0);
        assert_eq!(level.retiring_total(), 0);
    }

    #[test]
    fn year_tick_shifts_tenure_and_ages_moments() {
        let mut wf = WorkforceDemography::new();
        wf.cohorts[0]
            .level_mut(EducationLevel::None)
            .add_hires(10, AgeMoments::new(25.0, 4.0));
        wf.cohorts[1]
            .level_mut(EducationLevel::None)
            .add_hires(10, AgeMoments::new(35.0, 4.0));

        labor_market_year_tick(&mut wf);

        assert_eq!(wf.cohorts[0].level(EducationLevel::None).active, 0);
        assert_eq!(wf.cohorts[1].level(EducationLevel::None).active, 10);
        assert_eq!(wf.cohorts[2].level(EducationLevel::None).active, 10);
        // Means aged one year, variances carried.
        assert!((wf.cohorts[1].level(EducationLevel::None).age_moments.mean - 26.0).abs() < 1e-12);
        assert!((wf.cohorts[2].level(EducationLevel::None).age_moments.mean - 36.0).abs() < 1e-12);
        // Emptied source resets.
        assert_eq!(
            wf.cohorts[0].level(EducationLevel::None).age_moments,
            AgeMoments::default()
        );
    }

    #[test]
    fn year_tick_merges_into_cap_bucket() {
        let mut wf = WorkforceDemography::new();
        wf.cohorts[MAX_TENURE_YEARS]
            .level_mut(EducationLevel::None)
            .add_hires(5, AgeMoments::new(60.0, 1.0));
        wf.cohorts[MAX_TENURE_YEARS - 1]
            .level_mut(EducationLevel::None)
            .add_hires(5, AgeMoments::new(58.0, 1.0));

        labor_market_year_tick(&mut wf);

        let cap = wf.cohorts[MAX_TENURE_YEARS].level(EducationLevel::None);
        assert_eq!(cap.active, 10);
        assert!((cap.age_moments.mean - 60.0).abs() < 1e-12);
    }

    #[test]
    fn mortality_estimator_floors_small_cohorts_to_zero() {
        let mut wf = staffed(0, EducationLevel::None, 100, AgeMoments::new(30.0, 25.0));
        let deaths = workforce_mortality_tick(
            &mut wf,
            &SimClock::default(),
            &SimParams::default(),
            0.0,
            0.0,
        );
        // Annual ~0.0015 -> per-tick ~4e-6 -> floor(100 * 4e-6) = 0.
        assert_eq!(deaths, 0);
        assert_eq!(wf.active_total(EducationLevel::None), 100);
    }

    #[test]
    fn mortality_estimator_kills_aged_cohorts() {
        let mut wf = staffed(10, EducationLevel::None, 1_000_000, AgeMoments::new(85.0, 25.0));
        let deaths = workforce_mortality_tick(
            &mut wf,
            &SimClock::default(),
            &SimParams::default(),
            0.0,
            0.0,
        );
        assert!(deaths > 0);
        assert_eq!(wf.active_total(EducationLevel::None), 1_000_000 - deaths);
    }

    #[test]
    fn remove_booked_drains_active_then_pipelines() {
        let mut level = CohortLevel::default();
        level.active = 3;
        level.departing[0] = 2;
        level.departing_fired[0] = 2;
        level.retiring[5] = 4;

        assert_eq!(remove_booked(&mut level, 7), 7);
        assert_eq!(level.active, 0);
        assert_eq!(level.departing[0], 0);
        assert_eq!(level.departing_fired[0], 0);
        assert_eq!(level.retiring[5], 2);
    }
}
