use std::io::Write;
use std::path::Path;

use anyhow::Context;
use serde::Serialize;

use crate::models::StudentWeekRecord;
use crate::scoring;

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    id: usize,
    name: &'a str,
    email: &'a str,
    group: &'a str,
    ta: &'a str,
    attendance: &'static str,
    fa: i32,
    fb: i32,
    fc: i32,
    fd: i32,
    bonus_attempt: i32,
    bonus_good: i32,
    bonus_follow_up: i32,
    exercise_submitted: &'static str,
    exercise_tests_pass: &'static str,
    exercise_good_doc: &'static str,
    exercise_good_structure: &'static str,
    week: u32,
    total: i32,
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

impl<'a> From<&'a StudentWeekRecord> for ExportRow<'a> {
    fn from(record: &'a StudentWeekRecord) -> Self {
        Self {
            id: record.id,
            name: &record.name,
            email: record.email.as_deref().unwrap_or(""),
            group: record.group.as_deref().unwrap_or(""),
            ta: record.ta.label(),
            attendance: yes_no(record.attendance),
            fa: record.gd_score.fa,
            fb: record.gd_score.fb,
            fc: record.gd_score.fc,
            fd: record.gd_score.fd,
            bonus_attempt: record.bonus_score.attempt,
            bonus_good: record.bonus_score.good,
            bonus_follow_up: record.bonus_score.follow_up,
            exercise_submitted: yes_no(record.exercise_score.submitted),
            exercise_tests_pass: yes_no(record.exercise_score.tests_pass),
            exercise_good_doc: yes_no(record.exercise_score.good_doc),
            exercise_good_structure: yes_no(record.exercise_score.good_structure),
            week: record.week,
            total: scoring::total(record),
        }
    }
}

pub fn write_rows<W: Write>(writer: W, rows: &[&StudentWeekRecord]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for record in rows {
        writer.serialize(ExportRow::from(*record))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn export_csv(path: &Path, rows: &[&StudentWeekRecord]) -> anyhow::Result<usize> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    write_rows(file, rows)?;
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BonusScore, ExerciseScore, GdScore, TaAssignment};

    #[test]
    fn rows_are_written_with_header_and_recomputed_total() {
        let record = StudentWeekRecord {
            id: 1,
            name: "Bob Lee".to_string(),
            email: None,
            group: Some("Group 3".to_string()),
            ta: TaAssignment::Unassigned,
            attendance: true,
            gd_score: GdScore { fa: 5, fb: 5, fc: 5, fd: 5 },
            bonus_score: BonusScore::default(),
            exercise_score: ExerciseScore { good_doc: true, ..ExerciseScore::default() },
            week: 4,
            total: 0,
        };

        let mut buffer = Vec::new();
        write_rows(&mut buffer, &[&record]).expect("csv written");
        let text = String::from_utf8(buffer).expect("utf8");
        let mut lines = text.lines();

        assert!(lines.next().expect("header").starts_with("id,name,email,group,ta,attendance"));
        assert_eq!(
            lines.next(),
            Some("1,Bob Lee,,Group 3,N/A,yes,5,5,5,5,0,0,0,no,no,yes,no,4,120")
        );
        assert_eq!(lines.next(), None);
    }
}
