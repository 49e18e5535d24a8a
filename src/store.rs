use tracing::debug;

use crate::models::{StudentWeekRecord, WeeklyAttendance};
use crate::scoring;

/// Identifies one in-flight week fetch. A response is only committed when its
/// ticket still matches the store's latest request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub week: u32,
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Applied,
    Stale,
}

/// Owns the live roster and everything shown around it.
#[derive(Debug, Default)]
pub struct ViewStore {
    roster: Vec<StudentWeekRecord>,
    week: u32,
    editing: bool,
    total_participants: Option<i64>,
    weekly_attendance: Vec<WeeklyAttendance>,
    generation: u64,
}

impl ViewStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn roster(&self) -> &[StudentWeekRecord] {
        &self.roster
    }

    pub fn week(&self) -> u32 {
        self.week
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    /// Score columns are only editable outside the registration week.
    pub fn can_edit_scores(&self) -> bool {
        self.editing && self.week != 0
    }

    pub fn begin_edit(&mut self) {
        self.editing = true;
    }

    /// Switches to `week` and hands out the ticket its fetch must present.
    /// Changing week drops edit mode along with any unsaved edits.
    pub fn begin_week(&mut self, week: u32) -> FetchTicket {
        if self.editing && self.week != week {
            debug!(from = self.week, to = week, "leaving edit mode on week switch");
            self.editing = false;
        }
        self.week = week;
        self.generation += 1;
        FetchTicket {
            week,
            generation: self.generation,
        }
    }

    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        ticket.generation == self.generation && ticket.week == self.week
    }

    pub fn commit_roster(
        &mut self,
        ticket: FetchTicket,
        roster: Vec<StudentWeekRecord>,
    ) -> CommitOutcome {
        if !self.is_current(ticket) {
            debug!(week = ticket.week, current = self.week, "discarding stale roster");
            return CommitOutcome::Stale;
        }
        self.roster = roster;
        CommitOutcome::Applied
    }

    pub fn clear_roster(&mut self, ticket: FetchTicket) -> CommitOutcome {
        self.commit_roster(ticket, Vec::new())
    }

    pub(crate) fn replace_roster(&mut self, roster: Vec<StudentWeekRecord>) {
        self.roster = roster;
    }

    /// Leaves edit mode after the server accepted the roster, refreshing the
    /// cached totals from what was sent.
    pub fn finish_save(&mut self) {
        self.roster = self
            .roster
            .iter()
            .map(|record| StudentWeekRecord {
                total: scoring::total(record),
                ..record.clone()
            })
            .collect();
        self.editing = false;
    }

    /// The total to show for a row: live while editing, cached otherwise.
    pub fn displayed_total(&self, record: &StudentWeekRecord) -> i32 {
        if self.editing {
            scoring::total(record)
        } else {
            record.total
        }
    }

    pub fn total_participants(&self) -> Option<i64> {
        self.total_participants
    }

    pub fn set_total_participants(&mut self, count: i64) {
        self.total_participants = Some(count);
    }

    pub fn weekly_attendance(&self) -> &[WeeklyAttendance] {
        &self.weekly_attendance
    }

    pub fn set_weekly_attendance(&mut self, summary: Vec<WeeklyAttendance>) {
        self.weekly_attendance = summary;
    }

    pub fn attended_for_week(&self, week: u32) -> i64 {
        self.weekly_attendance
            .iter()
            .find(|entry| entry.week == week)
            .map(|entry| entry.attended)
            .unwrap_or(0)
    }

    pub fn absent_for_week(&self, week: u32) -> i64 {
        self.total_participants.unwrap_or(0) - self.attended_for_week(week)
    }
}
