use std::collections::HashMap;
use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::models::StudentWeekRecord;
use crate::pipeline::{self, FilterCriteria, SortKey};
use crate::scoring;
use crate::store::ViewStore;

#[derive(Debug, Clone, PartialEq)]
pub struct TaSummary {
    pub ta: String,
    pub students: usize,
    pub attended: usize,
    pub avg_total: f64,
}

pub fn summarize_by_ta(roster: &[StudentWeekRecord]) -> Vec<TaSummary> {
    let mut map: HashMap<String, (usize, usize, i32)> = HashMap::new();

    for record in roster {
        let entry = map.entry(record.ta.label().to_string()).or_insert((0, 0, 0));
        entry.0 += 1;
        if record.attendance {
            entry.1 += 1;
        }
        entry.2 += scoring::total(record);
    }

    let mut summaries: Vec<TaSummary> = map
        .into_iter()
        .map(|(ta, (students, attended, total))| TaSummary {
            ta,
            students,
            attended,
            avg_total: if students == 0 {
                0.0
            } else {
                total as f64 / students as f64
            },
        })
        .collect();

    summaries.sort_by(|a, b| b.students.cmp(&a.students).then_with(|| a.ta.cmp(&b.ta)));
    summaries
}

fn mark(flag: bool) -> &'static str {
    if flag {
        "x"
    } else {
        "-"
    }
}

fn score_cell(value: i32) -> String {
    if value == 0 {
        "-".to_string()
    } else {
        value.to_string()
    }
}

/// Text rendition of the admin table for the store's current week.
pub fn render_dashboard(store: &ViewStore, criteria: &FilterCriteria) -> String {
    let week = store.week();
    let rows = pipeline::derive_view(store.roster(), criteria);
    let scoring_visible = week != 0;

    let mut output = String::new();
    let participants = store
        .total_participants()
        .map(|count| count.to_string())
        .unwrap_or_default();

    let _ = writeln!(output, "Week {week}");
    let _ = writeln!(
        output,
        "Total Participants: {}  Attendees: {}  Absentees: {}",
        participants,
        store.attended_for_week(week),
        store.absent_for_week(week)
    );
    let _ = writeln!(
        output,
        "Filters: search={:?} group={} ta={} (groups: {}; TAs: {})",
        criteria.search,
        criteria.group,
        criteria.ta,
        pipeline::group_options().join(", "),
        pipeline::ta_options(store.roster()).join(", ")
    );
    let _ = writeln!(output);

    let mut header = format!(
        "{:>3}  {:<4} {:<24} {:<28}",
        "#",
        "",
        format!("Name{}", criteria.sort.indicator(SortKey::Name)),
        "Github"
    );
    if scoring_visible {
        let _ = write!(header, " {:<8}", "Group");
    }
    let _ = write!(header, " {:<10} {:<4}", "TA", "Att");
    if scoring_visible {
        let _ = write!(
            header,
            " {:<11} {:<9} {:<11} {:>5}",
            "GD a/b/c/d", "Bonus", "Ex s/t/st/d", "Total"
        );
    }
    let _ = writeln!(output, "{header}");

    for record in &rows {
        let mut line = format!(
            "{:>3}  {:<4} {:<24} {:<28}",
            record.id,
            record.initials(),
            record.name,
            record.email.as_deref().unwrap_or("")
        );
        if scoring_visible {
            let _ = write!(line, " {:<8}", record.group.as_deref().unwrap_or(""));
        }
        let _ = write!(line, " {:<10} {:<4}", record.ta.label(), mark(record.attendance));
        if scoring_visible {
            let gd = &record.gd_score;
            let bonus = &record.bonus_score;
            let exercise = &record.exercise_score;
            let _ = write!(
                line,
                " {:<11} {:<9} {:<11} {:>5}",
                format!(
                    "{}/{}/{}/{}",
                    score_cell(gd.fa),
                    score_cell(gd.fb),
                    score_cell(gd.fc),
                    score_cell(gd.fd)
                ),
                format!(
                    "{}/{}/{}",
                    score_cell(bonus.attempt),
                    score_cell(bonus.good),
                    score_cell(bonus.follow_up)
                ),
                format!(
                    "{}/{}/{}/{}",
                    mark(exercise.submitted),
                    mark(exercise.tests_pass),
                    mark(exercise.good_structure),
                    mark(exercise.good_doc)
                ),
                store.displayed_total(record)
            );
        }
        let _ = writeln!(output, "{line}");
    }

    let _ = writeln!(output);
    match pipeline::pagination_summary(rows.len()) {
        Some(summary) => {
            let _ = writeln!(output, "{summary}");
        }
        None => {
            let _ = writeln!(output, "{}", pipeline::empty_message(criteria));
        }
    }

    output
}

pub fn build_report(store: &ViewStore, generated_at: DateTime<Utc>) -> String {
    let week = store.week();
    let roster = store.roster();
    let summaries = summarize_by_ta(roster);

    let mut output = String::new();
    let _ = writeln!(output, "# Cohort Weekly Grading Report");
    let _ = writeln!(
        output,
        "Week {} (generated {})",
        week,
        generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Attendance");
    let _ = writeln!(
        output,
        "- Participants: {}",
        store
            .total_participants()
            .map(|count| count.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    );
    let _ = writeln!(output, "- Attendees: {}", store.attended_for_week(week));
    let _ = writeln!(output, "- Absentees: {}", store.absent_for_week(week));
    for entry in store.weekly_attendance() {
        let _ = writeln!(output, "- Week {} attended: {}", entry.week, entry.attended);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## By TA");
    if summaries.is_empty() {
        let _ = writeln!(output, "No students recorded for this week.");
    } else {
        for summary in &summaries {
            let _ = writeln!(
                output,
                "- {}: {} students, {} present (avg total {:.1})",
                summary.ta, summary.students, summary.attended, summary.avg_total
            );
        }
    }

    if week != 0 {
        let mut ranked: Vec<&StudentWeekRecord> = roster.iter().collect();
        ranked.sort_by(|a, b| scoring::total(b).cmp(&scoring::total(a)));
        let _ = writeln!(output);
        let _ = writeln!(output, "## Highest Totals");
        if ranked.is_empty() {
            let _ = writeln!(output, "No scores recorded for this week.");
        } else {
            for record in ranked.iter().take(10) {
                let _ = writeln!(
                    output,
                    "- {} ({}, {}) total {}",
                    record.name,
                    record.group.as_deref().unwrap_or("no group"),
                    record.ta.label(),
                    scoring::total(record)
                );
            }
        }
    }

    let absent: Vec<&StudentWeekRecord> = roster.iter().filter(|r| !r.attendance).collect();
    let _ = writeln!(output);
    let _ = writeln!(output, "## Absent");
    if absent.is_empty() {
        let _ = writeln!(output, "Everyone attended.");
    } else {
        for record in absent {
            let _ = writeln!(output, "- {}", record.name);
        }
    }

    output
}
