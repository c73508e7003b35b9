//! Per-tick population dynamics: starvation, mortality, disability, births.

use serde::{Deserialize, Serialize};

use crate::clock::SimClock;
use crate::environment::Environment;
use crate::params::SimParams;
use crate::types::{EducationLevel, MAX_AGE, Occupation, PerEducation};

use super::{Cohort, Population, distribute_like};

/// The engine asks the granary for this multiple of demand; the storage
/// remove still caps at real inventory, so any existing stock is consumed.
pub const FOOD_DEMAND_HEADROOM: f64 = 1.2;

/// Hard cap on the per-tick death rate of a cohort.
pub const MAX_MORTALITY_PER_TICK: f64 = 0.95;

pub(super) const FERTILE_AGE_START: usize = 18;
pub(super) const FERTILE_AGE_END: usize = 45;

/// Company/Government headcount removed from the population book this tick
/// (deaths and disabilities), awaiting mirroring onto the workforce book.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupationLosses {
    pub company: PerEducation<u64>,
    pub government: PerEducation<u64>,
}

impl OccupationLosses {
    pub fn is_empty(&self) -> bool {
        self.company.iter().chain(self.government.iter()).all(|&n| n == 0)
    }

    fn record(&mut self, education: EducationLevel, occupation: Occupation, count: u64) {
        match occupation {
            Occupation::Company => self.company[education.index()] += count,
            Occupation::Government => self.government[education.index()] += count,
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopulationTickOutcome {
    pub nutritional_factor: f64,
    pub deaths: u64,
    pub disabled: u64,
    pub births: u64,
    pub workforce_losses: OccupationLosses,
}

/// Starvation multiplies baseline mortality by up to 100x, with a sixth-power
/// onset so mild shortfalls are nearly harmless.
pub fn starvation_mortality_factor(starvation: f64) -> f64 {
    1.0 + starvation.clamp(0.0, 1.0).powi(6) * 99.0
}

/// One population tick. `nutritional_factor` is consumed food over demand,
/// already resolved against the government granary by the caller.
pub fn population_tick(
    population: &mut Population,
    environment: &Environment,
    nutritional_factor: f64,
    clock: &SimClock,
    params: &SimParams,
) -> PopulationTickOutcome {
    let mut outcome = PopulationTickOutcome {
        nutritional_factor,
        ..Default::default()
    };

    // Demographic stats are taken before this tick's attrition.
    let fertile_women = population.fertile_women();

    update_starvation(population, nutritional_factor, clock);
    apply_mortality(population, environment, clock, params, &mut outcome);
    apply_disability(population, environment, clock, params, &mut outcome);
    outcome.births = apply_births(population, environment, fertile_women, clock, params);

    outcome
}

/// Starvation rises with the nutritional shortfall and recedes once demand is
/// fully met, both on a per-month scale.
fn update_starvation(population: &mut Population, nutritional_factor: f64, clock: &SimClock) {
    let step = 1.0 / clock.ticks_per_month() as f64;
    let shortfall = (1.0 - nutritional_factor.min(1.0)).max(0.0);
    let level = population.starvation_level;
    population.starvation_level = if shortfall > 0.0 {
        (level + shortfall * step).min(1.0)
    } else {
        (level - (nutritional_factor * step).min(level)).max(0.0)
    };
}

fn apply_mortality(
    population: &mut Population,
    environment: &Environment,
    clock: &SimClock,
    params: &SimParams,
    outcome: &mut PopulationTickOutcome,
) {
    let starvation_factor = starvation_mortality_factor(population.starvation_level);
    let pollution_rate = environment.pollution_mortality_rate();
    let disaster_rate = environment.natural_disasters.mortality_rate;

    for age in (0..=MAX_AGE).rev() {
        let cohort = &population.demography[age];
        let total = cohort.total();
        if total == 0 {
            continue;
        }

        let annual =
            (params.mortality[age] * starvation_factor + pollution_rate + disaster_rate).min(1.0);
        let per_tick = clock.per_tick_rate(annual).min(MAX_MORTALITY_PER_TICK);
        let survivors = (total as f64 * (1.0 - per_tick)).floor() as u64;
        if survivors == total {
            continue;
        }

        let after = distribute_like(survivors, cohort);
        record_losses(cohort, &after, outcome);
        outcome.deaths += total - survivors;
        population.demography[age] = after;
    }
}

fn record_losses(before: &Cohort, after: &Cohort, outcome: &mut PopulationTickOutcome) {
    for (edu, occ, was) in before.cells() {
        if !occ.is_employed() {
            continue;
        }
        let now = after.get(edu, occ);
        if was > now {
            outcome.workforce_losses.record(edu, occ, was - now);
        }
    }
}

/// Disability can strike anyone who is not already unable to work; disabled
/// Company/Government workers are recorded for workforce mirroring alongside
/// deaths.
fn apply_disability(
    population: &mut Population,
    environment: &Environment,
    clock: &SimClock,
    params: &SimParams,
    outcome: &mut PopulationTickOutcome,
) {
    const SUSCEPTIBLE: [Occupation; 4] = [
        Occupation::Company,
        Occupation::Government,
        Occupation::Education,
        Occupation::Unoccupied,
    ];

    let pollution_rate = environment.pollution_disability_rate();
    let disaster_rate = environment.natural_disasters.disability_rate;

    for age in 0..=MAX_AGE {
        let annual = (params.disability[age] + pollution_rate + disaster_rate).min(1.0);
        let per_tick = clock.per_tick_rate(annual);
        if per_tick <= 0.0 {
            continue;
        }
        for occupation in SUSCEPTIBLE {
            for education in EducationLevel::ALL {
                let count = population.demography[age].get(education, occupation);
                let moving = (count as f64 * per_tick).floor() as u64;
                if moving == 0 {
                    continue;
                }
                let cohort = &mut population.demography[age];
                cohort.remove(education, occupation, moving);
                cohort.add(education, Occupation::UnableToWork, moving);
                outcome.disabled += moving;
                outcome.workforce_losses.record(education, occupation, moving);
            }
        }
    }
}

/// Newborns enter the age-0 cohort as (None, Education).
fn apply_births(
    population: &mut Population,
    environment: &Environment,
    fertile_women: f64,
    clock: &SimClock,
    params: &SimParams,
) -> u64 {
    let fertile_span = (FERTILE_AGE_END - FERTILE_AGE_START + 1) as f64;
    let adjusted = params.lifetime_fertility
        * (1.0 - 0.5 * population.starvation_level)
        * (1.0 - 0.5 * environment.fertility_reduction());
    let births_per_year = (adjusted * fertile_women / fertile_span).floor();
    let births = (births_per_year / clock.ticks_per_year() as f64).floor() as u64;
    if births > 0 {
        population.demography[0].add(EducationLevel::None, Occupation::Education, births);
    }
    births
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::population::create_population;

    fn quiet_environment() -> Environment {
        Environment::default()
    }

    #[test]
    fn starvation_rises_without_food_and_clamps() {
        let mut pop = Population::empty();
        let clock = SimClock::default();
        for _ in 0..100 {
            update_starvation(&mut pop, 0.0, &clock);
        }
        assert_eq!(pop.starvation_level, 1.0);
    }

    #[test]
    fn starvation_recovers_with_surplus() {
        let mut pop = Population::empty();
        pop.starvation_level = 0.5;
        let clock = SimClock::default();
        update_starvation(&mut pop, 1.2, &clock);
        assert!((pop.starvation_level - (0.5 - 1.2 / 30.0)).abs() < 1e-12);
        for _ in 0..30 {
            update_starvation(&mut pop, 1.2, &clock);
        }
        assert_eq!(pop.starvation_level, 0.0);
    }

    #[test]
    fn inert_params_mean_no_deaths_no_births() {
        let mut pop = create_population(10_000);
        let before = pop.total();
        let outcome = population_tick(
            &mut pop,
            &quiet_environment(),
            1.0,
            &SimClock::default(),
            &SimParams::inert(),
        );
        assert_eq!(outcome.deaths, 0);
        assert_eq!(outcome.births, 0);
        assert_eq!(outcome.disabled, 0);
        assert_eq!(pop.total(), before);
    }

    #[test]
    fn mortality_is_recorded_for_employed_cells() {
        let mut pop = Population::empty();
        pop.demography[80].add(EducationLevel::Primary, Occupation::Company, 1000);

        let mut params = SimParams::inert();
        params.mortality[80] = 1.0;

        let outcome = population_tick(
            &mut pop,
            &quiet_environment(),
            1.0,
            &SimClock::default(),
            &params,
        );
        assert!(outcome.deaths > 0);
        assert_eq!(
            outcome.workforce_losses.company[EducationLevel::Primary.index()],
            outcome.deaths
        );
    }

    #[test]
    fn terminal_age_is_wiped_quickly() {
        let mut pop = Population::empty();
        pop.demography[MAX_AGE].add(EducationLevel::None, Occupation::Unoccupied, 100);

        let clock = SimClock::default();
        let params = SimParams::default();
        let env = quiet_environment();
        // Annual rate 1.0 caps the per-tick rate at 0.95: 100 -> 5 -> 0.
        population_tick(&mut pop, &env, 1.0, &clock, &params);
        assert_eq!(pop.demography[MAX_AGE].total(), 5);
        population_tick(&mut pop, &env, 1.0, &clock, &params);
        assert_eq!(pop.demography[MAX_AGE].total(), 0);
    }

    #[test]
    fn births_land_in_age_zero_education() {
        let mut pop = Population::empty();
        // 40_000 people aged 50 are past the fertile span: no births.
        pop.demography[50].add(EducationLevel::Secondary, Occupation::Unoccupied, 40_000);
        let mut params = SimParams::inert();
        params.lifetime_fertility = 2.66;

        let clock = SimClock::default();
        let env = quiet_environment();
        let outcome = population_tick(&mut pop, &env, 1.0, &clock, &params);
        assert_eq!(outcome.births, 0);

        // The same crowd inside the fertile span produces newborns.
        let mut pop = Population::empty();
        pop.demography[25].add(EducationLevel::Secondary, Occupation::Unoccupied, 40_000);
        let outcome = population_tick(&mut pop, &env, 1.0, &clock, &params);
        // 0.5 * 40_000 women * 2.66 / 28 = 1900 births/yr -> floor(1900/360) = 5.
        assert_eq!(outcome.births, 5);
        assert_eq!(
            pop.count(0, EducationLevel::None, Occupation::Education),
            5
        );
    }

    #[test]
    fn disability_moves_into_unable_to_work() {
        let mut pop = Population::empty();
        pop.demography[70].add(EducationLevel::None, Occupation::Unoccupied, 100_000);

        let mut params = SimParams::inert();
        params.disability[70] = 0.5;

        let outcome = population_tick(
            &mut pop,
            &quiet_environment(),
            1.0,
            &SimClock::default(),
            &params,
        );
        assert!(outcome.disabled > 0);
        assert_eq!(
            pop.count(70, EducationLevel::None, Occupation::UnableToWork),
            outcome.disabled
        );
        // Unoccupied disabilities are not workforce losses.
        assert!(outcome.workforce_losses.is_empty());
    }
}
