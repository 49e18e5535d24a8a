use std::str::FromStr;

use thiserror::Error;
use tracing::debug;

use crate::models::StudentWeekRecord;
use crate::store::ViewStore;

pub const MIN_SUB_SCORE: i32 = 0;
pub const MAX_SUB_SCORE: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GdField {
    Fa,
    Fb,
    Fc,
    Fd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BonusField {
    Attempt,
    Good,
    FollowUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExerciseField {
    Submitted,
    TestsPass,
    GoodDoc,
    GoodStructure,
}

impl ExerciseField {
    /// Submission and test results come from the autograder.
    pub fn is_server_derived(self) -> bool {
        matches!(self, ExerciseField::Submitted | ExerciseField::TestsPass)
    }
}

/// Any single editable cell of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Attendance,
    Gd(GdField),
    Bonus(BonusField),
    Exercise(ExerciseField),
}

impl FromStr for Field {
    type Err = EditError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let field = match value.trim().to_lowercase().as_str() {
            "attendance" => Field::Attendance,
            "fa" | "communication" => Field::Gd(GdField::Fa),
            "fb" | "depth" => Field::Gd(GdField::Fb),
            "fc" | "fluency" => Field::Gd(GdField::Fc),
            "fd" | "engagement" => Field::Gd(GdField::Fd),
            "attempt" => Field::Bonus(BonusField::Attempt),
            "good" => Field::Bonus(BonusField::Good),
            "follow_up" | "followup" => Field::Bonus(BonusField::FollowUp),
            "submitted" => Field::Exercise(ExerciseField::Submitted),
            "tests" | "tests_pass" => Field::Exercise(ExerciseField::TestsPass),
            "doc" | "good_doc" => Field::Exercise(ExerciseField::GoodDoc),
            "structure" | "good_structure" => Field::Exercise(ExerciseField::GoodStructure),
            other => {
                return Err(EditError::UnknownField {
                    field: other.to_string(),
                })
            }
        };
        Ok(field)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("edit mode is not active")]
    NotEditing,
    #[error("scores are locked in week {week}")]
    ScoresLocked { week: u32 },
    #[error("{field:?} is reported by the autograder and cannot be edited")]
    ServerDerived { field: ExerciseField },
    #[error("no student with id {id} in the current roster")]
    UnknownRecord { id: usize },
    #[error("unknown field `{field}`")]
    UnknownField { field: String },
    #[error("invalid edit `{input}`: expected ID:FIELD=VALUE")]
    Malformed { input: String },
}

/// Parses an operator-entered sub-score from its leading integer, so `4abc`
/// reads as 4 and `3.5` as 3. Blank or non-numeric input counts as zero;
/// anything else is clamped to the selectable range.
pub fn parse_sub_score(raw: &str) -> i32 {
    let trimmed = raw.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let magnitude = match digits[..end].parse::<i64>() {
        Ok(value) => value,
        Err(_) if end > 0 => i64::MAX,
        Err(_) => 0,
    };
    let value = if negative { -magnitude } else { magnitude };
    value.clamp(i64::from(MIN_SUB_SCORE), i64::from(MAX_SUB_SCORE)) as i32
}

pub fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "yes" | "y" | "true" | "1" | "x" | "on"
    )
}

fn ensure_editing(store: &ViewStore) -> Result<(), EditError> {
    if store.is_editing() {
        Ok(())
    } else {
        Err(EditError::NotEditing)
    }
}

fn ensure_scores_editable(store: &ViewStore) -> Result<(), EditError> {
    ensure_editing(store)?;
    if store.can_edit_scores() {
        Ok(())
    } else {
        Err(EditError::ScoresLocked { week: store.week() })
    }
}

/// Replaces the roster with a copy where only row `id` went through `change`.
fn apply<F>(store: &mut ViewStore, id: usize, change: F) -> Result<(), EditError>
where
    F: Fn(&mut StudentWeekRecord),
{
    if !store.roster().iter().any(|record| record.id == id) {
        return Err(EditError::UnknownRecord { id });
    }
    let next = store
        .roster()
        .iter()
        .map(|record| {
            let mut copy = record.clone();
            if copy.id == id {
                change(&mut copy);
            }
            copy
        })
        .collect();
    store.replace_roster(next);
    debug!(id, "applied edit");
    Ok(())
}

pub fn set_attendance(store: &mut ViewStore, id: usize, present: bool) -> Result<(), EditError> {
    ensure_editing(store)?;
    apply(store, id, |record| record.attendance = present)
}

pub fn toggle_attendance(store: &mut ViewStore, id: usize) -> Result<(), EditError> {
    ensure_editing(store)?;
    apply(store, id, |record| record.attendance = !record.attendance)
}

pub fn set_gd(store: &mut ViewStore, id: usize, field: GdField, raw: &str) -> Result<(), EditError> {
    ensure_scores_editable(store)?;
    let value = parse_sub_score(raw);
    apply(store, id, |record| {
        let gd = &mut record.gd_score;
        match field {
            GdField::Fa => gd.fa = value,
            GdField::Fb => gd.fb = value,
            GdField::Fc => gd.fc = value,
            GdField::Fd => gd.fd = value,
        }
    })
}

pub fn set_bonus(
    store: &mut ViewStore,
    id: usize,
    field: BonusField,
    raw: &str,
) -> Result<(), EditError> {
    ensure_scores_editable(store)?;
    let value = parse_sub_score(raw);
    apply(store, id, |record| {
        let bonus = &mut record.bonus_score;
        match field {
            BonusField::Attempt => bonus.attempt = value,
            BonusField::Good => bonus.good = value,
            BonusField::FollowUp => bonus.follow_up = value,
        }
    })
}

pub fn set_exercise(
    store: &mut ViewStore,
    id: usize,
    field: ExerciseField,
    value: bool,
) -> Result<(), EditError> {
    if field.is_server_derived() {
        return Err(EditError::ServerDerived { field });
    }
    ensure_scores_editable(store)?;
    apply(store, id, |record| match field {
        ExerciseField::GoodDoc => record.exercise_score.good_doc = value,
        ExerciseField::GoodStructure => record.exercise_score.good_structure = value,
        ExerciseField::Submitted | ExerciseField::TestsPass => {}
    })
}

pub fn toggle_exercise(
    store: &mut ViewStore,
    id: usize,
    field: ExerciseField,
) -> Result<(), EditError> {
    let current = store
        .roster()
        .iter()
        .find(|record| record.id == id)
        .map(|record| match field {
            ExerciseField::Submitted => record.exercise_score.submitted,
            ExerciseField::TestsPass => record.exercise_score.tests_pass,
            ExerciseField::GoodDoc => record.exercise_score.good_doc,
            ExerciseField::GoodStructure => record.exercise_score.good_structure,
        })
        .unwrap_or(false);
    set_exercise(store, id, field, !current)
}

/// A single `ID:FIELD=VALUE` instruction from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditInstruction {
    pub id: usize,
    pub field: Field,
    pub value: String,
}

impl FromStr for EditInstruction {
    type Err = EditError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let malformed = || EditError::Malformed {
            input: input.to_string(),
        };
        let (id, rest) = input.split_once(':').ok_or_else(malformed)?;
        let (field, value) = rest.split_once('=').ok_or_else(malformed)?;
        let id = id.trim().parse::<usize>().map_err(|_| malformed())?;
        Ok(Self {
            id,
            field: field.parse()?,
            value: value.to_string(),
        })
    }
}

impl EditInstruction {
    pub fn apply(&self, store: &mut ViewStore) -> Result<(), EditError> {
        let toggle = self.value.trim().eq_ignore_ascii_case("toggle");
        match self.field {
            Field::Attendance if toggle => toggle_attendance(store, self.id),
            Field::Attendance => set_attendance(store, self.id, parse_flag(&self.value)),
            Field::Gd(field) => set_gd(store, self.id, field, &self.value),
            Field::Bonus(field) => set_bonus(store, self.id, field, &self.value),
            Field::Exercise(field) if toggle => toggle_exercise(store, self.id, field),
            Field::Exercise(field) => set_exercise(store, self.id, field, parse_flag(&self.value)),
        }
    }
}
