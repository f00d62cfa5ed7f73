//! Task, member and milestone data structures.
//!
//! This module defines the core `Task` struct that represents a single unit of
//! wedding-coordination work with its dependency, timing and assignment metadata,
//! plus the party `Member` record and the generated `Milestone` value.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::fields::*;

/// A unit of wedding-coordination work.
///
/// Tasks carry prerequisite links (`prerequisite_task_ids`) that must all be
/// completed before the task is eligible to start, and optional reverse
/// pointers (`triggers_task_ids`) used only for bottleneck reporting. The
/// legacy store called the prerequisite field `dependent_task_ids` despite it
/// holding prerequisites; the serde alias keeps old files readable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub category: Category,
    pub phase: Phase,
    pub priority: Priority,
    pub status: Status,
    pub due: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub estimated_duration_hours: Option<f64>,
    #[serde(default, alias = "dependent_task_ids")]
    pub prerequisite_task_ids: Vec<u64>,
    #[serde(default, alias = "triggers_tasks")]
    pub triggers_task_ids: Vec<u64>,
    pub assigned_member_id: Option<u64>,
    #[serde(default)]
    pub completion_percentage: u8,
    #[serde(default)]
    pub reminder_sent: bool,
    pub started_at_utc: Option<i64>,
    pub completed_at_utc: Option<i64>,
    pub created_at_utc: i64,
    pub updated_at_utc: i64,
}

impl Task {
    /// True when the task is past its due date and not completed.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status != Status::Completed && self.due.is_some_and(|d| d < today)
    }

    /// Days past the due date. Zero or negative means not overdue.
    pub fn days_overdue(&self, today: NaiveDate) -> i64 {
        self.due.map_or(0, |d| (today - d).num_days())
    }
}

/// A wedding-party member. Attribute bag consumed for display plus the
/// best-effort status sync when an assigned task completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: u64,
    pub name: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
    pub created_at_utc: i64,
}

/// A fixed planning checkpoint derived from the wedding date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Milestone {
    pub offset_days: i64,
    pub name: &'static str,
    pub description: &'static str,
    pub due: NaiveDate,
    pub priority: Priority,
    pub estimated_duration_hours: f64,
    pub category: Category,
    pub phase: Phase,
}
