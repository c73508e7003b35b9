//! Year-boundary demography: aging and education progression.

use crate::types::{EducationLevel, MAX_AGE, Occupation, PerEducation};

use super::{Cohort, Population};

/// Children younger than this cannot leave education, even as dropouts.
const SCHOOL_LEAVING_MIN_AGE: usize = 6;

/// Per-level education policy. Students at or past `graduation_age` graduate
/// with `graduation_probability` (younger ones with `pre_age_probability`);
/// graduates continue to the next level with `transition_probability`, the
/// rest leave school at the level they just reached. Non-graduates drop out
/// with `dropout_probability`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EducationStage {
    pub graduation_age: usize,
    pub graduation_probability: f64,
    pub pre_age_probability: f64,
    pub dropout_probability: f64,
    pub transition_probability: f64,
}

/// Fixed policy constants shipped with the engine, indexed by the level being
/// studied. The None row is the entry step: graduating from it means starting
/// primary school.
pub const EDUCATION_STAGES: PerEducation<EducationStage> = [
    EducationStage {
        graduation_age: 6,
        graduation_probability: 1.0,
        pre_age_probability: 0.0,
        dropout_probability: 0.0,
        transition_probability: 1.0,
    },
    EducationStage {
        graduation_age: 9,
        graduation_probability: 0.9,
        pre_age_probability: 0.1,
        dropout_probability: 0.01,
        transition_probability: 0.95,
    },
    EducationStage {
        graduation_age: 17,
        graduation_probability: 0.75,
        pre_age_probability: 0.1,
        dropout_probability: 0.02,
        transition_probability: 0.4,
    },
    EducationStage {
        graduation_age: 22,
        graduation_probability: 0.5,
        pre_age_probability: 0.15,
        dropout_probability: 0.06,
        transition_probability: 0.3,
    },
    EducationStage {
        graduation_age: 27,
        graduation_probability: 0.1,
        pre_age_probability: 0.1,
        dropout_probability: 0.1,
        transition_probability: 0.0,
    },
];

fn graduation_probability(age: usize, education: EducationLevel) -> f64 {
    let stage = EDUCATION_STAGES[education.index()];
    if age >= stage.graduation_age {
        stage.graduation_probability
    } else {
        stage.pre_age_probability
    }
}

/// Advance the whole demography one year. Everyone ages one bucket (age
/// MAX_AGE is terminal and falls off); people in Education additionally move
/// through the graduation/dropout pipeline.
pub fn population_advance_year_tick(population: &mut Population) {
    let mut next = vec![Cohort::default(); MAX_AGE + 1];

    for age in 0..MAX_AGE {
        let cohort = &population.demography[age];
        if cohort.is_empty() {
            continue;
        }
        let target = &mut next[age + 1];
        for (education, occupation, count) in cohort.cells() {
            if count == 0 {
                continue;
            }
            if occupation == Occupation::Education {
                advance_students(age, education, count, target);
            } else {
                target.add(education, occupation, count);
            }
        }
    }

    population.demography = next;
}

fn advance_students(age: usize, education: EducationLevel, count: u64, target: &mut Cohort) {
    let stage = EDUCATION_STAGES[education.index()];

    let graduates = (count as f64 * graduation_probability(age, education)).floor() as u64;
    let stayers = count - graduates;

    let advanced = education.next_level();
    let transiting = (graduates as f64 * stage.transition_probability).floor() as u64;
    target.add(advanced, Occupation::Education, transiting);
    target.add(advanced, Occupation::Unoccupied, graduates - transiting);

    let dropouts = if age < SCHOOL_LEAVING_MIN_AGE {
        0
    } else {
        ((stayers as f64 * stage.dropout_probability).ceil() as u64).min(stayers)
    };
    target.add(education, Occupation::Unoccupied, dropouts);
    target.add(education, Occupation::Education, stayers - dropouts);
}
