//! Database operations and utility functions for the wedding task store.
//!
//! This module provides the `Database` struct backing one wedding (tasks,
//! party members and the wedding date), along with date parsing, formatting
//! and table-printing helpers shared by the command layer.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Error;
use crate::fields::*;
use crate::task::{Member, Task};

/// In-memory store for one wedding. A whole-database save is the unit of
/// persistence, so a completion event that touches the task, its unblocked
/// dependents and a member record lands in one atomic write.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Database {
    pub wedding_date: Option<NaiveDate>,
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub members: Vec<Member>,
}

impl Database {
    /// Load database from JSON file, creating a new empty database if the
    /// file doesn't exist or cannot be parsed.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Database::default();
        }
        let mut buf = String::new();
        match File::open(path).and_then(|mut f| f.read_to_string(&mut buf)) {
            Ok(_) => match serde_json::from_str(&buf) {
                Ok(db) => db,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "error parsing store, starting fresh");
                    Database::default()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "error reading store, starting fresh");
                Database::default()
            }
        }
    }

    /// Save database to JSON file using atomic write (temp file + rename).
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let tmp = path.with_extension("json.tmp");
        let data = serde_json::to_string_pretty(self)?;
        let mut f = File::create(&tmp)?;
        f.write_all(data.as_bytes())?;
        f.flush()?;
        fs::rename(tmp, path)?;
        Ok(())
    }

    /// Generate the next available task ID.
    pub fn next_task_id(&self) -> u64 {
        self.tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1
    }

    /// Generate the next available member ID.
    pub fn next_member_id(&self) -> u64 {
        self.members.iter().map(|m| m.id).max().unwrap_or(0) + 1
    }

    /// Get a task by ID.
    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Get a mutable reference to a task by ID.
    pub fn get_mut(&mut self, id: u64) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    /// Get a member by ID.
    pub fn get_member(&self, id: u64) -> Option<&Member> {
        self.members.iter().find(|m| m.id == id)
    }

    /// Get a mutable reference to a member by ID.
    pub fn get_member_mut(&mut self, id: u64) -> Option<&mut Member> {
        self.members.iter_mut().find(|m| m.id == id)
    }
}

/// Parse human-readable due date input.
///
/// Supports:
/// - "today", "tomorrow"
/// - "in 3d", "in 2w"
/// - "YYYY-MM-DD" format
pub fn parse_due_input(s: &str) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();
    let today = Local::now().date_naive();

    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        if let Some(nd) = rest.strip_suffix('d') {
            if let Ok(days) = nd.trim().parse::<i64>() {
                return Some(today + Duration::days(days));
            }
        }
        if let Some(nw) = rest.strip_suffix('w') {
            if let Ok(weeks) = nw.trim().parse::<i64>() {
                return Some(today + Duration::weeks(weeks));
            }
        }
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

/// Calculate the start and end dates of the current ISO week (Monday to Sunday).
pub fn start_end_of_this_week(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    use chrono::Datelike;
    let weekday = today.weekday().num_days_from_monday() as i64;
    let start = today - Duration::days(weekday);
    let end = start + Duration::days(6);
    (start, end)
}

/// Format a due date relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_due_relative(due: Option<NaiveDate>, today: NaiveDate) -> String {
    match due {
        None => "-".into(),
        Some(d) => {
            let delta = d - today;
            if delta.num_days() == 0 {
                "today".into()
            } else if delta.num_days() == 1 {
                "tomorrow".into()
            } else if delta.num_days() > 1 {
                format!("in {}d", delta.num_days())
            } else {
                format!("{}d late", -delta.num_days())
            }
        }
    }
}

/// Format a category for display.
pub fn format_category(c: Category) -> &'static str {
    match c {
        Category::Measurements => "Measurements",
        Category::Selection => "Selection",
        Category::Orders => "Orders",
        Category::Fitting => "Fitting",
        Category::Payment => "Payment",
        Category::Coordination => "Coordination",
    }
}

/// Format a phase for display.
pub fn format_phase(p: Phase) -> &'static str {
    match p {
        Phase::Setup => "Setup",
        Phase::Planning => "Planning",
        Phase::Measurements => "Measurements",
        Phase::Selection => "Selection",
        Phase::Approval => "Approval",
        Phase::Orders => "Orders",
        Phase::Production => "Production",
        Phase::Execution => "Execution",
        Phase::Completion => "Completion",
    }
}

/// Format a priority for display.
pub fn format_priority(p: Priority) -> &'static str {
    match p {
        Priority::Critical => "Critical",
        Priority::High => "High",
        Priority::Medium => "Medium",
        Priority::Low => "Low",
    }
}

/// Format a task status for display.
pub fn format_status(s: Status) -> &'static str {
    match s {
        Status::Blocked => "Blocked",
        Status::Pending => "Pending",
        Status::InProgress => "InProgress",
        Status::OnHold => "OnHold",
        Status::Completed => "Completed",
    }
}

/// Print tasks in a formatted table.
pub fn print_table(tasks: &[&Task], db: &Database) {
    println!(
        "{:<5} {:<13} {:<11} {:<9} {:<10} {:<14} {}",
        "ID", "Phase", "Status", "Pri", "Due", "Member", "Name"
    );
    let today = Local::now().date_naive();
    for t in tasks {
        let due = format_due_relative(t.due, today);
        let member = t
            .assigned_member_id
            .and_then(|id| db.get_member(id))
            .map(|m| m.name.clone())
            .unwrap_or_else(|| "-".into());
        println!(
            "{:<5} {:<13} {:<11} {:<9} {:<10} {:<14} {}",
            t.id,
            format_phase(t.phase),
            format_status(t.status),
            format_priority(t.priority),
            due,
            truncate(&member, 14),
            t.name,
        );
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

/// Resolve a task identifier (either ID or name) to a task ID.
/// Returns an error if the name has multiple matches and suggests using ID instead.
pub fn resolve_task_identifier(identifier: &str, db: &Database) -> Result<u64, Error> {
    if let Ok(id) = identifier.parse::<u64>() {
        return if db.get(id).is_some() {
            Ok(id)
        } else {
            Err(Error::TaskNotFound(id))
        };
    }

    let matches: Vec<&Task> = db
        .tasks
        .iter()
        .filter(|task| task.name.to_lowercase() == identifier.to_lowercase())
        .collect();

    match matches.len() {
        0 => Err(Error::Validation(format!(
            "no task found with name '{identifier}'"
        ))),
        1 => Ok(matches[0].id),
        _ => {
            let mut msg = format!("multiple tasks found with name '{identifier}':\n");
            for task in matches {
                msg.push_str(&format!("  ID {}: {}\n", task.id, task.name));
            }
            msg.push_str("please use the specific ID instead");
            Err(Error::Validation(msg))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn task(id: u64, name: &str) -> Task {
        let now = Utc::now().timestamp();
        Task {
            id,
            name: name.into(),
            description: None,
            category: Category::Coordination,
            phase: Phase::Planning,
            priority: Priority::Medium,
            status: Status::Pending,
            due: None,
            start_date: None,
            estimated_duration_hours: None,
            prerequisite_task_ids: vec![],
            triggers_task_ids: vec![],
            assigned_member_id: None,
            completion_percentage: 0,
            reminder_sent: false,
            started_at_utc: None,
            completed_at_utc: None,
            created_at_utc: now,
            updated_at_utc: now,
        }
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("smith_wedding.json");

        let mut db = Database::default();
        db.wedding_date = NaiveDate::from_ymd_opt(2025, 12, 1);
        db.tasks.push(task(1, "Collect measurements"));
        db.save(&path).unwrap();

        let loaded = Database::load(&path);
        assert_eq!(loaded.wedding_date, NaiveDate::from_ymd_opt(2025, 12, 1));
        assert_eq!(loaded.tasks.len(), 1);
        assert_eq!(loaded.tasks[0].name, "Collect measurements");
    }

    #[test]
    fn load_missing_file_yields_empty_db() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::load(&dir.path().join("nope.json"));
        assert!(db.tasks.is_empty());
        assert!(db.wedding_date.is_none());
    }

    #[test]
    fn legacy_field_names_are_accepted() {
        let json = r#"{
            "wedding_date": "2025-12-01",
            "tasks": [{
                "id": 1,
                "name": "Place orders",
                "description": null,
                "category": "orders",
                "phase": "orders",
                "priority": "critical",
                "status": "in_progress",
                "due": null,
                "start_date": null,
                "estimated_duration_hours": 4.0,
                "dependent_task_ids": [7],
                "triggers_tasks": [9],
                "assigned_member_id": null,
                "started_at_utc": null,
                "completed_at_utc": null,
                "created_at_utc": 0,
                "updated_at_utc": 0
            }]
        }"#;
        let db: Database = serde_json::from_str(json).unwrap();
        assert_eq!(db.tasks[0].prerequisite_task_ids, vec![7]);
        assert_eq!(db.tasks[0].triggers_task_ids, vec![9]);
        assert_eq!(db.tasks[0].status, Status::InProgress);
    }

    #[test]
    fn next_ids_increment_from_max() {
        let mut db = Database::default();
        assert_eq!(db.next_task_id(), 1);
        db.tasks.push(task(41, "x"));
        assert_eq!(db.next_task_id(), 42);
        assert_eq!(db.next_member_id(), 1);
    }

    #[test]
    fn resolve_identifier_by_id_and_name() {
        let mut db = Database::default();
        db.tasks.push(task(3, "First fitting"));
        assert_eq!(resolve_task_identifier("3", &db).unwrap(), 3);
        assert_eq!(resolve_task_identifier("first fitting", &db).unwrap(), 3);
        assert!(resolve_task_identifier("9", &db).is_err());
        assert!(resolve_task_identifier("ghost", &db).is_err());
    }
}
