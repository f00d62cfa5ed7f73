//! Enumerations and field types for wedding timeline tasks.
//!
//! This module defines the structured data types used to categorise and organise tasks,
//! including categories, phases, priorities and status values, plus the list-filtering
//! helpers the CLI exposes.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Work-type tags for tasks. Grouping/reporting only, with one exception:
/// the category drives the member-status sync side effect on completion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    #[serde(alias = "Measurements")]
    Measurements,
    #[serde(alias = "Selection")]
    Selection,
    #[serde(alias = "Orders")]
    Orders,
    #[serde(alias = "Fitting")]
    Fitting,
    #[serde(alias = "Payment")]
    Payment,
    #[serde(alias = "Coordination")]
    Coordination,
}

/// Coarse grouping label for the timeline view. The order here is the fixed
/// display order of the nine phase buckets; no scheduling invariant is
/// enforced across phases.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    Setup,
    Planning,
    Measurements,
    Selection,
    Approval,
    Orders,
    Production,
    Execution,
    Completion,
}

impl Phase {
    /// All phases in display order.
    pub const ALL: [Phase; 9] = [
        Phase::Setup,
        Phase::Planning,
        Phase::Measurements,
        Phase::Selection,
        Phase::Approval,
        Phase::Orders,
        Phase::Production,
        Phase::Execution,
        Phase::Completion,
    ];
}

/// Priority classification. Affects display and whether a task is included
/// in the critical-path filter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

/// Task lifecycle status.
///
/// `Blocked` is distinct from `Pending`: a blocked task has at least one
/// prerequisite that is not yet completed, while pending means ready to
/// start. Dependency propagation flips `Blocked` to `Pending`, never the
/// other way. Aliases accept the legacy snake_case spellings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Blocked,
    Pending,
    #[serde(alias = "in_progress")]
    InProgress,
    #[serde(alias = "on_hold")]
    OnHold,
    Completed,
}

/// Available sorting options for task lists.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortKey {
    Due,
    Priority,
    Phase,
    Id,
}

/// Filtering options for tasks based on due dates.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DueFilter {
    Today,
    ThisWeek,
    Overdue,
    None,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_accepts_legacy_snake_case() {
        let s: Status = serde_json::from_str("\"in_progress\"").unwrap();
        assert_eq!(s, Status::InProgress);
        let s: Status = serde_json::from_str("\"on_hold\"").unwrap();
        assert_eq!(s, Status::OnHold);
    }

    #[test]
    fn status_round_trips_kebab_case() {
        let json = serde_json::to_string(&Status::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
        let s: Status = serde_json::from_str(&json).unwrap();
        assert_eq!(s, Status::InProgress);
    }

    #[test]
    fn phase_order_is_stable() {
        assert_eq!(Phase::ALL.len(), 9);
        assert_eq!(Phase::ALL[0], Phase::Setup);
        assert_eq!(Phase::ALL[8], Phase::Completion);
    }
}
