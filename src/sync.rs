use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{HttpResponse, Transport};
use crate::models::{ApiStudentEntry, LoginRequest, StudentCount, StudentWeekRecord, WeeklyAttendance};
use crate::normalize;
use crate::store::{CommitOutcome, FetchTicket, ViewStore};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("network failure: {0}")]
    Transport(String),
    #[error("Server error: {status} - {detail}")]
    Rejected { status: u16, detail: String },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("save requested outside edit mode")]
    NotEditing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Fetching { week: u32 },
    Ready,
    FetchFailed(String),
    Saving { week: u32 },
    SaveFailed(String),
}

fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .and_then(|message| message.as_str())
        .map(str::to_string)
}

/// Prefers the server's `message` field, falling back to the raw body.
fn error_detail(body: &str) -> String {
    server_message(body).unwrap_or_else(|| body.to_string())
}

fn check(response: HttpResponse) -> Result<HttpResponse, SyncError> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(SyncError::Rejected {
            status: response.status,
            detail: error_detail(&response.body),
        })
    }
}

fn parse<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, SyncError> {
    serde_json::from_str(&response.body).map_err(|err| SyncError::Malformed(err.to_string()))
}

pub struct SyncController<T> {
    transport: T,
    state: SyncState,
}

impl<T: Transport> SyncController<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            state: SyncState::Idle,
        }
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    fn transition(&mut self, state: SyncState) {
        debug!(from = ?self.state, to = ?state, "sync state");
        self.state = state;
    }

    async fn get(&self, path: &str) -> Result<HttpResponse, SyncError> {
        let response = self
            .transport
            .get(path)
            .await
            .map_err(|err| SyncError::Transport(err.0))?;
        check(response)
    }

    /// Fetches and normalizes one week without touching any store.
    pub async fn load_week(&self, week: u32) -> Result<Vec<StudentWeekRecord>, SyncError> {
        let response = self.get(&format!("/weekly_data/{week}")).await?;
        let entries: Vec<ApiStudentEntry> = parse(&response)?;
        normalize::roster_from_wire(&entries, week)
            .map_err(|err| SyncError::Malformed(err.to_string()))
    }

    /// Switches the store to `week` and hands out the ticket the matching
    /// response must present to [`Self::apply_week`].
    pub fn begin_fetch(&mut self, store: &mut ViewStore, week: u32) -> FetchTicket {
        let ticket = store.begin_week(week);
        self.transition(SyncState::Fetching { week });
        ticket
    }

    /// Commits a week response. A superseded response, success or failure,
    /// changes neither the roster nor the sync state and reports `Stale`.
    /// A current failure leaves the store with an empty roster.
    pub fn apply_week(
        &mut self,
        store: &mut ViewStore,
        ticket: FetchTicket,
        result: Result<Vec<StudentWeekRecord>, SyncError>,
    ) -> Result<CommitOutcome, SyncError> {
        let week = ticket.week;
        match result {
            Ok(roster) => {
                let count = roster.len();
                let outcome = store.commit_roster(ticket, roster);
                if outcome == CommitOutcome::Applied {
                    info!(week, students = count, "roster loaded");
                    self.transition(SyncState::Ready);
                }
                Ok(outcome)
            }
            Err(err) => {
                if store.clear_roster(ticket) == CommitOutcome::Stale {
                    debug!(week, error = %err, "ignoring failure of superseded fetch");
                    return Ok(CommitOutcome::Stale);
                }
                warn!(week, error = %err, "failed to fetch weekly data");
                self.transition(SyncState::FetchFailed(err.to_string()));
                Err(err)
            }
        }
    }

    /// Switches the store to `week` and loads its roster. A failed fetch
    /// leaves the store with an empty roster.
    pub async fn fetch_week(&mut self, store: &mut ViewStore, week: u32) -> Result<(), SyncError> {
        let ticket = self.begin_fetch(store, week);
        let result = self.load_week(week).await;
        self.apply_week(store, ticket, result).map(|_| ())
    }

    /// Non-fatal: a failure keeps whatever count the store already had.
    pub async fn fetch_participant_count(&mut self, store: &mut ViewStore) {
        let result = match self.get("/students/count").await {
            Ok(response) => parse::<StudentCount>(&response),
            Err(err) => Err(err),
        };
        match result {
            Ok(count) => store.set_total_participants(count.total_students),
            Err(err) => warn!(error = %err, "failed to fetch participant count"),
        }
    }

    /// Non-fatal, same policy as the participant count.
    pub async fn fetch_weekly_attendance(&mut self, store: &mut ViewStore) {
        let result = match self.get("/attendance/weekly_counts").await {
            Ok(response) => parse::<Vec<WeeklyAttendance>>(&response),
            Err(err) => Err(err),
        };
        match result {
            Ok(summary) => store.set_weekly_attendance(summary),
            Err(err) => warn!(error = %err, "failed to fetch weekly attendance"),
        }
    }

    /// Posts the whole roster for the current week. The store keeps its edits
    /// either way; only success leaves edit mode.
    pub async fn save(&mut self, store: &mut ViewStore) -> Result<(), SyncError> {
        if !store.is_editing() {
            return Err(SyncError::NotEditing);
        }
        let week = store.week();
        let payload: Vec<ApiStudentEntry> = store
            .roster()
            .iter()
            .map(|record| normalize::to_wire(record, week))
            .collect();
        let body =
            serde_json::to_value(&payload).map_err(|err| SyncError::Malformed(err.to_string()))?;

        self.transition(SyncState::Saving { week });
        debug!(week, rows = payload.len(), "saving roster");

        let result = match self
            .transport
            .post_json(&format!("/weekly_data/{week}"), &body)
            .await
        {
            Ok(response) => check(response).map(|_| ()),
            Err(err) => Err(SyncError::Transport(err.0)),
        };

        match result {
            Ok(()) => {
                store.finish_save();
                info!(week, rows = payload.len(), "roster saved");
                self.transition(SyncState::Ready);
                Ok(())
            }
            Err(err) => {
                warn!(week, error = %err, "save failed");
                self.transition(SyncState::SaveFailed(err.to_string()));
                Err(err)
            }
        }
    }

    /// `POST /login`. Any non-2xx answer is an access denial.
    pub async fn login(&self, gmail: &str) -> Result<(), SyncError> {
        let body = serde_json::to_value(LoginRequest {
            gmail: gmail.to_string(),
        })
        .map_err(|err| SyncError::Malformed(err.to_string()))?;
        let response = self
            .transport
            .post_json("/login", &body)
            .await
            .map_err(|err| SyncError::Transport(err.0))?;
        if response.is_success() {
            return Ok(());
        }
        let detail =
            server_message(&response.body).unwrap_or_else(|| "Access denied".to_string());
        Err(SyncError::Rejected {
            status: response.status,
            detail,
        })
    }
}
