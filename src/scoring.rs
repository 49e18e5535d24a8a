use crate::models::{BonusScore, ExerciseScore, GdScore, StudentWeekRecord};

pub fn gd_total(gd: &GdScore) -> i32 {
    6 * gd.fa + 6 * gd.fb + 4 * gd.fc + 4 * gd.fd
}

pub fn bonus_total(bonus: &BonusScore) -> i32 {
    2 * bonus.attempt + 2 * bonus.good + 2 * bonus.follow_up
}

pub fn exercise_total(exercise: &ExerciseScore) -> i32 {
    exercise_weight(exercise.submitted, 10)
        + exercise_weight(exercise.tests_pass, 50)
        + exercise_weight(exercise.good_doc, 20)
        + exercise_weight(exercise.good_structure, 20)
}

fn exercise_weight(flag: bool, points: i32) -> i32 {
    if flag {
        points
    } else {
        0
    }
}

/// Recomputes a record's total from its sub-scores, ignoring the cached `total`.
pub fn total(record: &StudentWeekRecord) -> i32 {
    gd_total(&record.gd_score)
        + bonus_total(&record.bonus_score)
        + exercise_total(&record.exercise_score)
}
