//! Critical-path estimate.
//!
//! This reproduces the documented heuristic, not critical-path-method: the
//! eligible set is filtered by priority/category, hours are summed with a
//! default of 8 for a missing estimate, and the completion date is the latest
//! due date in the set rather than a computed earliest finish. Bottleneck and
//! risk scans run over the whole task set.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::fields::{Category, Priority, Status};
use crate::task::Task;

const DEFAULT_DURATION_HOURS: f64 = 8.0;
const URGENT_WINDOW_DAYS: i64 = 3;

/// A task whose completion unblocks others and which is itself stalled.
#[derive(Debug, Clone, Serialize)]
pub struct Bottleneck {
    pub task_id: u64,
    pub task_name: String,
    pub triggers: Vec<u64>,
    pub on_hold: bool,
    pub overdue: bool,
}

/// A schedule risk attached to a single task.
#[derive(Debug, Clone, Serialize)]
pub struct RiskFactor {
    pub task_id: u64,
    pub task_name: String,
    #[serde(flatten)]
    pub kind: RiskKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RiskKind {
    Overdue { days_overdue: i64 },
    Urgent { days_until_due: i64 },
}

#[derive(Debug, Serialize)]
pub struct CriticalPathReport {
    pub task_count: usize,
    pub estimated_total_hours: f64,
    pub estimated_completion_date: Option<NaiveDate>,
    pub bottlenecks: Vec<Bottleneck>,
    pub risk_factors: Vec<RiskFactor>,
}

/// True when the task participates in the hour-sum estimate.
fn on_critical_path(task: &Task) -> bool {
    task.priority == Priority::Critical
        || matches!(task.category, Category::Measurements | Category::Orders)
}

pub fn estimate_critical_path(tasks: &[Task], today: NaiveDate) -> CriticalPathReport {
    let path: Vec<&Task> = tasks.iter().filter(|t| on_critical_path(t)).collect();

    let estimated_total_hours = path
        .iter()
        .map(|t| t.estimated_duration_hours.unwrap_or(DEFAULT_DURATION_HOURS))
        .sum();

    let estimated_completion_date = path.iter().filter_map(|t| t.due).max();

    let bottlenecks = tasks
        .iter()
        .filter(|t| {
            !t.triggers_task_ids.is_empty()
                && (t.is_overdue(today) || t.status == Status::OnHold)
        })
        .map(|t| Bottleneck {
            task_id: t.id,
            task_name: t.name.clone(),
            triggers: t.triggers_task_ids.clone(),
            on_hold: t.status == Status::OnHold,
            overdue: t.is_overdue(today),
        })
        .collect();

    let mut risk_factors = Vec::new();
    for t in tasks {
        if t.status == Status::Completed {
            continue;
        }
        let Some(due) = t.due else { continue };
        if due < today {
            risk_factors.push(RiskFactor {
                task_id: t.id,
                task_name: t.name.clone(),
                kind: RiskKind::Overdue {
                    days_overdue: (today - due).num_days(),
                },
            });
        } else if t.status == Status::Pending && due - today <= Duration::days(URGENT_WINDOW_DAYS)
        {
            risk_factors.push(RiskFactor {
                task_id: t.id,
                task_name: t.name.clone(),
                kind: RiskKind::Urgent {
                    days_until_due: (due - today).num_days(),
                },
            });
        }
    }

    CriticalPathReport {
        task_count: path.len(),
        estimated_total_hours,
        estimated_completion_date,
        bottlenecks,
        risk_factors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Phase;

    fn task(id: u64, category: Category, priority: Priority) -> Task {
        Task {
            id,
            name: format!("task {id}"),
            description: None,
            category,
            phase: Phase::Planning,
            priority,
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
            created_at_utc: 0,
            updated_at_utc: 0,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 15).unwrap()
    }

    #[test]
    fn hour_sum_defaults_missing_estimates_to_eight() {
        let mut tasks = vec![
            task(1, Category::Measurements, Priority::Medium),
            task(2, Category::Orders, Priority::Medium),
            task(3, Category::Measurements, Priority::Medium),
            task(4, Category::Orders, Priority::Medium),
        ];
        tasks[0].estimated_duration_hours = Some(10.0);
        tasks[1].estimated_duration_hours = Some(8.0);
        tasks[2].estimated_duration_hours = None;
        tasks[3].estimated_duration_hours = Some(12.0);

        let report = estimate_critical_path(&tasks, today());
        assert_eq!(report.task_count, 4);
        assert!((report.estimated_total_hours - 38.0).abs() < f64::EPSILON);
    }

    #[test]
    fn filter_takes_critical_priority_or_key_categories() {
        let tasks = vec![
            task(1, Category::Fitting, Priority::Critical),
            task(2, Category::Fitting, Priority::Low),
            task(3, Category::Orders, Priority::Low),
        ];
        let report = estimate_critical_path(&tasks, today());
        assert_eq!(report.task_count, 2);
    }

    #[test]
    fn completion_date_is_latest_due_on_the_path() {
        let mut tasks = vec![
            task(1, Category::Orders, Priority::Medium),
            task(2, Category::Measurements, Priority::Medium),
            task(3, Category::Fitting, Priority::Low),
        ];
        tasks[0].due = NaiveDate::from_ymd_opt(2025, 10, 1);
        tasks[1].due = NaiveDate::from_ymd_opt(2025, 11, 1);
        // Off-path task due later must not win.
        tasks[2].due = NaiveDate::from_ymd_opt(2025, 12, 1);

        let report = estimate_critical_path(&tasks, today());
        assert_eq!(
            report.estimated_completion_date,
            NaiveDate::from_ymd_opt(2025, 11, 1)
        );
    }

    #[test]
    fn overdue_pending_task_is_a_risk_with_day_count() {
        let mut t = task(1, Category::Fitting, Priority::Low);
        t.due = NaiveDate::from_ymd_opt(2025, 9, 10);
        let report = estimate_critical_path(&[t], today());
        assert_eq!(report.risk_factors.len(), 1);
        assert_eq!(
            report.risk_factors[0].kind,
            RiskKind::Overdue { days_overdue: 5 }
        );

        let json = serde_json::to_value(&report.risk_factors[0]).unwrap();
        assert_eq!(json["type"], "overdue");
        assert_eq!(json["days_overdue"], 5);
    }

    #[test]
    fn pending_task_due_soon_is_urgent() {
        let mut t = task(1, Category::Fitting, Priority::Low);
        t.due = NaiveDate::from_ymd_opt(2025, 9, 17);
        let report = estimate_critical_path(&[t], today());
        assert_eq!(
            report.risk_factors[0].kind,
            RiskKind::Urgent { days_until_due: 2 }
        );

        // In progress due soon is not flagged urgent.
        let mut t = task(2, Category::Fitting, Priority::Low);
        t.due = NaiveDate::from_ymd_opt(2025, 9, 17);
        t.status = Status::InProgress;
        let report = estimate_critical_path(&[t], today());
        assert!(report.risk_factors.is_empty());
    }

    #[test]
    fn bottleneck_requires_triggers_and_a_stall() {
        let mut stalled = task(1, Category::Fitting, Priority::Low);
        stalled.triggers_task_ids = vec![5, 6];
        stalled.status = Status::OnHold;

        let mut healthy = task(2, Category::Fitting, Priority::Low);
        healthy.triggers_task_ids = vec![7];

        let mut overdue_no_triggers = task(3, Category::Fitting, Priority::Low);
        overdue_no_triggers.due = NaiveDate::from_ymd_opt(2025, 9, 1);

        let report =
            estimate_critical_path(&[stalled, healthy, overdue_no_triggers], today());
        assert_eq!(report.bottlenecks.len(), 1);
        assert_eq!(report.bottlenecks[0].task_id, 1);
        assert!(report.bottlenecks[0].on_hold);
    }
}
