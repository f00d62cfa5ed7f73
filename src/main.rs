//! # WTM - Wedding Timeline Management CLI
//!
//! A command-line coordinator for wedding-party outfit timelines: tasks with
//! prerequisite links, phase-by-phase progress, a heuristic critical-path
//! estimate, milestone generation keyed on the wedding date, and reminder
//! dispatch for assigned party members.
//!
//! ## Quick Start
//!
//! ```bash
//! # Create a wedding store
//! wtm wedding new "Smith Jones" --date 2025-12-01
//!
//! # Seed the standard milestone schedule as tasks
//! wtm milestones --create
//!
//! # Add a task that can only start after task 1 completes
//! wtm add "Order groomsmen suits" --category orders --phase orders --after 1
//!
//! # Complete a task; dependents with all prerequisites met become ready
//! wtm complete 1
//!
//! # Progress and risk reporting
//! wtm timeline
//! wtm critical-path
//! ```
//!
//! Data is stored locally in `~/.wtm/` with each wedding as a separate JSON
//! file. Logging is controlled with `WTM_LOG` (env-filter syntax); an
//! external analysis command can be wired in with `WTM_ANALYSIS_CMD`.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub mod analyze;
pub mod cli;
pub mod cmd;
pub mod critical_path;
pub mod db;
pub mod error;
pub mod fields;
pub mod milestones;
pub mod notify;
pub mod propagate;
pub mod task;
pub mod timeline;
pub mod wedding;

use cli::Cli;
use cmd::*;
use db::Database;
use notify::LogNotifier;
use wedding::{get_most_recent_wedding, Wedding};

fn init_tracing() {
    let filter = EnvFilter::try_from_env("WTM_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Determine the data directory.
    let data_dir = if let Some(db_path) = cli.db.as_ref() {
        db_path
            .parent()
            .unwrap_or_else(|| std::path::Path::new("."))
            .to_path_buf()
    } else {
        let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
        let dir = PathBuf::from(home).join(".wtm");
        std::fs::create_dir_all(&dir)?;
        dir
    };

    match cli.command {
        // Commands that don't need an open store.
        Commands::Completions { shell } => {
            cmd_completions(shell);
            Ok(())
        }
        Commands::Wedding { action } => cmd_wedding(&data_dir, action),

        // Everything else works against one store: --db wins, otherwise the
        // most recently modified wedding, otherwise a fresh default.
        command => {
            let db_path = match cli.db {
                Some(path) => path,
                None => match get_most_recent_wedding(&data_dir)? {
                    Some(wedding) => wedding.file_path,
                    None => {
                        let default = Wedding::new("Default", &data_dir);
                        default.create_if_not_exists(None)?;
                        default.file_path
                    }
                },
            };

            let mut db = Database::load(&db_path);
            let notifier = LogNotifier;

            match command {
                Commands::Completions { .. } | Commands::Wedding { .. } => {
                    unreachable!("handled above")
                }

                Commands::Add {
                    name,
                    desc,
                    category,
                    phase,
                    priority,
                    due,
                    start,
                    hours,
                    prereqs,
                    triggers,
                    member,
                } => cmd_add(
                    &mut db, &db_path, name, desc, category, phase, priority, due, start,
                    hours, prereqs, triggers, member,
                ),

                Commands::List {
                    all,
                    status,
                    phase,
                    category,
                    priority,
                    due,
                    sort,
                    limit,
                } => {
                    cmd_list(&db, all, status, phase, category, priority, due, sort, limit);
                    Ok(())
                }

                Commands::View { id } => cmd_view(&db, id),

                Commands::Update {
                    id,
                    name,
                    desc,
                    category,
                    phase,
                    priority,
                    due,
                    clear_due,
                    hours,
                    prereqs,
                    clear_prereqs,
                    member,
                    clear_member,
                } => cmd_update(
                    &mut db, &db_path, id, name, desc, category, phase, priority, due,
                    clear_due, hours, prereqs, clear_prereqs, member, clear_member,
                ),

                Commands::Start { id } => cmd_start(&mut db, &db_path, id),
                Commands::Complete { id } => cmd_complete(&mut db, &db_path, id, &notifier),
                Commands::Hold { id } => cmd_hold(&mut db, &db_path, id),
                Commands::Resume { id } => cmd_resume(&mut db, &db_path, id),

                Commands::Timeline { json } => cmd_timeline(&db, json),
                Commands::CriticalPath { json } => cmd_critical_path(&db, json),
                Commands::Milestones { date, create } => {
                    cmd_milestones(&mut db, &db_path, date, create)
                }
                Commands::Remind { days } => cmd_remind(&mut db, &db_path, days, &notifier),
                Commands::Analyze { json } => cmd_analyze(&db, json),

                Commands::Member { action } => cmd_member(&mut db, &db_path, action),

                Commands::Backup => cmd_backup(&db_path),
            }
        }
    }
}

fn main() -> ExitCode {
    init_tracing();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
