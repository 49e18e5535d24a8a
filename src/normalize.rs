use thiserror::Error;

use crate::edit::{MAX_SUB_SCORE, MIN_SUB_SCORE};
use crate::models::{
    ApiStudentEntry, BonusScore, ExerciseScore, GdScore, StudentWeekRecord, TaAssignment,
    UNASSIGNED_TA,
};
use crate::scoring;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("entry at position {position} has no name")]
    MissingName { position: usize },
    #[error("entry at position {position} has {field} = {value}, outside 0..=5")]
    ScoreOutOfRange {
        position: usize,
        field: &'static str,
        value: i32,
    },
}

/// Absent or null scores read as zero; anything outside the gradable range
/// rejects the entry.
fn sub_score(
    value: Option<i32>,
    field: &'static str,
    position: usize,
) -> Result<i32, NormalizeError> {
    let value = value.unwrap_or(0);
    if (MIN_SUB_SCORE..=MAX_SUB_SCORE).contains(&value) {
        Ok(value)
    } else {
        Err(NormalizeError::ScoreOutOfRange {
            position,
            field,
            value,
        })
    }
}

fn is_yes(value: Option<&str>) -> bool {
    value == Some("yes")
}

fn yes_no(flag: bool) -> String {
    let value = if flag { "yes" } else { "no" };
    value.to_string()
}

fn ta_from_wire(ta: Option<&str>) -> TaAssignment {
    match ta {
        Some(name) if !name.is_empty() && name != UNASSIGNED_TA => {
            TaAssignment::Assigned(name.to_string())
        }
        _ => TaAssignment::Unassigned,
    }
}

pub fn from_wire(
    entry: &ApiStudentEntry,
    week: u32,
    position: usize,
) -> Result<StudentWeekRecord, NormalizeError> {
    let name = entry
        .name
        .clone()
        .filter(|name| !name.trim().is_empty())
        .ok_or(NormalizeError::MissingName { position })?;

    let mut record = StudentWeekRecord {
        id: position + 1,
        name,
        email: entry.mail.clone(),
        group: entry.group_id.clone(),
        ta: ta_from_wire(entry.ta.as_deref()),
        attendance: is_yes(entry.attendance.as_deref()),
        gd_score: GdScore {
            fa: sub_score(entry.fa, "fa", position)?,
            fb: sub_score(entry.fb, "fb", position)?,
            fc: sub_score(entry.fc, "fc", position)?,
            fd: sub_score(entry.fd, "fd", position)?,
        },
        bonus_score: BonusScore {
            attempt: sub_score(entry.bonus_attempt, "bonus_attempt", position)?,
            good: sub_score(entry.bonus_answer_quality, "bonus_answer_quality", position)?,
            follow_up: sub_score(entry.bonus_follow_up, "bonus_follow_up", position)?,
        },
        exercise_score: ExerciseScore {
            submitted: is_yes(entry.exercise_submitted.as_deref()),
            tests_pass: is_yes(entry.exercise_test_passing.as_deref()),
            good_doc: is_yes(entry.exercise_good_documentation.as_deref()),
            good_structure: is_yes(entry.exercise_good_structure.as_deref()),
        },
        week,
        total: 0,
    };
    record.total = scoring::total(&record);
    Ok(record)
}

/// Normalizes a whole week response. One malformed entry fails the roster.
pub fn roster_from_wire(
    entries: &[ApiStudentEntry],
    week: u32,
) -> Result<Vec<StudentWeekRecord>, NormalizeError> {
    entries
        .iter()
        .enumerate()
        .map(|(position, entry)| from_wire(entry, week, position))
        .collect()
}

/// Unassigned TAs go back as the placeholder label, the way the service
/// stores them.
pub fn to_wire(record: &StudentWeekRecord, week: u32) -> ApiStudentEntry {
    ApiStudentEntry {
        name: Some(record.name.clone()),
        mail: record.email.clone(),
        group_id: record.group.clone(),
        ta: Some(record.ta.label().to_string()),
        attendance: Some(yes_no(record.attendance)),
        fa: Some(record.gd_score.fa),
        fb: Some(record.gd_score.fb),
        fc: Some(record.gd_score.fc),
        fd: Some(record.gd_score.fd),
        bonus_attempt: Some(record.bonus_score.attempt),
        bonus_answer_quality: Some(record.bonus_score.good),
        bonus_follow_up: Some(record.bonus_score.follow_up),
        exercise_submitted: Some(yes_no(record.exercise_score.submitted)),
        exercise_test_passing: Some(yes_no(record.exercise_score.tests_pass)),
        exercise_good_documentation: Some(yes_no(record.exercise_score.good_doc)),
        exercise_good_structure: Some(yes_no(record.exercise_score.good_structure)),
        week,
        total: Some(scoring::total(record)),
    }
}
