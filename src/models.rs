use serde::{Deserialize, Serialize};

/// Label shown for a student with no assigned TA.
pub const UNASSIGNED_TA: &str = "N/A";

pub const GROUP_LABELS: [&str; 4] = ["Group 1", "Group 2", "Group 3", "Group 4"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GdScore {
    pub fa: i32,
    pub fb: i32,
    pub fc: i32,
    pub fd: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BonusScore {
    pub attempt: i32,
    pub good: i32,
    pub follow_up: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExerciseScore {
    pub submitted: bool,
    pub tests_pass: bool,
    pub good_doc: bool,
    pub good_structure: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaAssignment {
    Assigned(String),
    Unassigned,
}

impl TaAssignment {
    pub fn label(&self) -> &str {
        match self {
            TaAssignment::Assigned(name) => name,
            TaAssignment::Unassigned => UNASSIGNED_TA,
        }
    }
}

/// One student's grading row for a single week.
///
/// `id` is positional within the loaded roster and is reassigned on every
/// fetch; it does not identify the student across weeks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentWeekRecord {
    pub id: usize,
    pub name: String,
    pub email: Option<String>,
    pub group: Option<String>,
    pub ta: TaAssignment,
    pub attendance: bool,
    pub gd_score: GdScore,
    pub bonus_score: BonusScore,
    pub exercise_score: ExerciseScore,
    pub week: u32,
    pub total: i32,
}

impl StudentWeekRecord {
    pub fn initials(&self) -> String {
        let mut words = self.name.split_whitespace();
        let mut out = String::new();
        if let Some(first) = words.next().and_then(|w| w.chars().next()) {
            out.push(first);
        }
        if let Some(second) = words.next().and_then(|w| w.chars().next()) {
            out.push(second);
        }
        out
    }
}

/// Student-week entry as exchanged with the grading service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiStudentEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ta: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attendance: Option<String>,
    #[serde(default)]
    pub fa: Option<i32>,
    #[serde(default)]
    pub fb: Option<i32>,
    #[serde(default)]
    pub fc: Option<i32>,
    #[serde(default)]
    pub fd: Option<i32>,
    #[serde(default)]
    pub bonus_attempt: Option<i32>,
    #[serde(default)]
    pub bonus_answer_quality: Option<i32>,
    #[serde(default)]
    pub bonus_follow_up: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_submitted: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_test_passing: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_good_documentation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_good_structure: Option<String>,
    #[serde(default)]
    pub week: u32,
    #[serde(default)]
    pub total: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyAttendance {
    pub week: u32,
    pub attended: i64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StudentCount {
    pub total_students: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub gmail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initials_use_first_two_words() {
        let record = StudentWeekRecord {
            id: 1,
            name: "Bob Lee".to_string(),
            email: None,
            group: None,
            ta: TaAssignment::Unassigned,
            attendance: false,
            gd_score: GdScore::default(),
            bonus_score: BonusScore::default(),
            exercise_score: ExerciseScore::default(),
            week: 1,
            total: 0,
        };
        assert_eq!(record.initials(), "BL");

        let single = StudentWeekRecord {
            name: "Satoshi".to_string(),
            ..record
        };
        assert_eq!(single.initials(), "S");
    }

    #[test]
    fn wire_entry_tolerates_missing_optionals() {
        let entry: ApiStudentEntry =
            serde_json::from_str(r#"{"name":"Avery Lee","group_id":"Group 2","week":3}"#)
                .expect("entry parses");
        assert_eq!(entry.name.as_deref(), Some("Avery Lee"));
        assert_eq!(entry.fa, None);
        assert_eq!(entry.ta, None);
        assert_eq!(entry.week, 3);
    }

    #[test]
    fn unassigned_ta_has_placeholder_label() {
        assert_eq!(TaAssignment::Unassigned.label(), UNASSIGNED_TA);
        assert_eq!(TaAssignment::Assigned("Ravi".into()).label(), "Ravi");
    }
}
