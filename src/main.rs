use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

mod api;
mod edit;
mod export;
mod models;
mod normalize;
mod pipeline;
mod report;
mod scoring;
mod store;
mod sync;

use api::{HttpTransport, Transport};
use edit::EditInstruction;
use pipeline::{FilterCriteria, SortKey};
use store::ViewStore;
use sync::{SyncController, SyncError};

#[derive(Parser)]
#[command(name = "cohort-gradebook")]
#[command(about = "Weekly cohort grading admin for attendance and scores", long_about = None)]
struct Cli {
    /// Base URL of the grading service
    #[arg(
        long,
        global = true,
        env = "GRADEBOOK_API_URL",
        default_value = "http://localhost:8080"
    )]
    api_url: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct FilterArgs {
    /// Case-insensitive name substring
    #[arg(long, default_value = "")]
    search: String,
    #[arg(long, default_value = pipeline::ALL_GROUPS)]
    group: String,
    #[arg(long, default_value = pipeline::ALL_TAS)]
    ta: String,
    #[arg(long, value_enum)]
    sort: Option<SortKey>,
    #[arg(long, requires = "sort")]
    descending: bool,
    /// Ignore search, group and TA filters but keep the sort
    #[arg(long)]
    clear_filters: bool,
}

impl FilterArgs {
    fn criteria(&self) -> FilterCriteria {
        let mut criteria = FilterCriteria {
            search: self.search.clone(),
            group: self.group.clone(),
            ta: self.ta.clone(),
            ..FilterCriteria::default()
        };
        if let Some(key) = self.sort {
            criteria.sort.request(key);
            if self.descending {
                criteria.sort.request(key);
            }
        }
        if self.clear_filters {
            criteria.clear_filters();
        }
        criteria
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Check that an address is allowed into the admin view
    Login {
        #[arg(long)]
        gmail: String,
    },
    /// Show the grading table for a week
    Show {
        #[arg(long, default_value_t = 0)]
        week: u32,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Edit cells and save the whole week back
    Grade {
        #[arg(long)]
        week: u32,
        /// Edit as ID:FIELD=VALUE, e.g. 3:fa=4, 3:attendance=yes or 3:doc=toggle
        #[arg(long = "set", required = true)]
        edits: Vec<EditInstruction>,
    },
    /// Export the filtered table as CSV
    Export {
        #[arg(long)]
        week: u32,
        #[arg(long, default_value = "grades.csv")]
        out: PathBuf,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Generate a markdown report
    Report {
        #[arg(long)]
        week: u32,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

/// Loads the header counts and the week roster the way the dashboard does on
/// open. Only the roster fetch can fail the command.
async fn load_dashboard(
    sync: &mut SyncController<HttpTransport>,
    store: &mut ViewStore,
    week: u32,
) -> anyhow::Result<()> {
    sync.fetch_participant_count(store).await;
    sync.fetch_weekly_attendance(store).await;
    sync.fetch_week(store, week)
        .await
        .with_context(|| format!("failed to load week {week}"))
}

/// A denial surfaces the server's message as the command error so the process
/// exits non-zero after the runtime has shut down.
async fn check_access<T: Transport>(sync: &SyncController<T>, gmail: &str) -> anyhow::Result<()> {
    match sync.login(gmail).await {
        Ok(()) => Ok(()),
        Err(SyncError::Rejected { detail, .. }) => bail!("{detail}"),
        Err(err) => Err(err).context("login failed"),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let transport = HttpTransport::new(&cli.api_url).context("failed to build HTTP client")?;
    let mut sync = SyncController::new(transport);
    let mut store = ViewStore::new();

    match cli.command {
        Commands::Login { gmail } => {
            check_access(&sync, &gmail).await?;
            println!("Access granted.");
        }
        Commands::Show { week, filters } => {
            if let Err(err) = load_dashboard(&mut sync, &mut store, week).await {
                debug!(state = ?sync.state(), "dashboard load failed");
                eprintln!("{err:#}");
            }
            print!("{}", report::render_dashboard(&store, &filters.criteria()));
        }
        Commands::Grade { week, edits } => {
            load_dashboard(&mut sync, &mut store, week).await?;
            store.begin_edit();

            let mut applied = 0usize;
            for instruction in &edits {
                match instruction.apply(&mut store) {
                    Ok(()) => applied += 1,
                    Err(err) => println!("Skipped {}:{:?}: {err}", instruction.id, instruction.field),
                }
            }

            sync.save(&mut store)
                .await
                .with_context(|| format!("failed to save week {week}"))?;
            println!(
                "Saved week {week}: {applied} of {} edits applied across {} students.",
                edits.len(),
                store.roster().len()
            );
            print!("{}", report::render_dashboard(&store, &FilterCriteria::default()));
        }
        Commands::Export {
            week,
            out,
            filters,
        } => {
            load_dashboard(&mut sync, &mut store, week).await?;
            let rows = pipeline::derive_view(store.roster(), &filters.criteria());
            let written = export::export_csv(&out, &rows)?;
            println!("Exported {written} rows to {}.", out.display());
        }
        Commands::Report { week, out } => {
            load_dashboard(&mut sync, &mut store, week).await?;
            let report = report::build_report(&store, chrono::Utc::now());
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::ScriptedTransport;

    fn show_criteria(args: &[&str]) -> FilterCriteria {
        let cli = Cli::try_parse_from(args).expect("arguments parse");
        match cli.command {
            Commands::Show { filters, .. } => filters.criteria(),
            _ => panic!("expected show"),
        }
    }

    #[test]
    fn filter_flags_build_criteria() {
        let criteria = show_criteria(&[
            "cohort-gradebook",
            "show",
            "--week",
            "2",
            "--group",
            "Group 3",
            "--sort",
            "name",
            "--descending",
        ]);
        assert_eq!(criteria.group, "Group 3");
        assert_eq!(criteria.ta, pipeline::ALL_TAS);
        assert_eq!(criteria.sort.key, Some(SortKey::Name));
        assert_eq!(criteria.sort.direction, pipeline::SortDirection::Descending);
    }

    #[test]
    fn clear_filters_flag_keeps_sort() {
        let criteria = show_criteria(&[
            "cohort-gradebook",
            "show",
            "--search",
            "lee",
            "--ta",
            "Ravi",
            "--sort",
            "name",
            "--clear-filters",
        ]);
        assert!(!criteria.has_active_filter());
        assert_eq!(criteria.sort.key, Some(SortKey::Name));
    }

    #[tokio::test]
    async fn login_denial_is_returned_as_error() {
        let transport = ScriptedTransport::default()
            .reply(401, r#"{"message":"Unknown TA"}"#)
            .fail("connection refused")
            .reply(200, "{}");
        let sync = SyncController::new(transport);

        let denied = check_access(&sync, "someone@gmail.com").await.unwrap_err();
        assert_eq!(denied.to_string(), "Unknown TA");
        let offline = check_access(&sync, "someone@gmail.com").await.unwrap_err();
        assert_eq!(format!("{offline:#}"), "login failed: network failure: connection refused");
        check_access(&sync, "ta@gmail.com").await.expect("access granted");
    }
}
