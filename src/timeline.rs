//! Timeline view: phase buckets and progress aggregation.
//!
//! Pure projections over the task set. Safe to recompute on every call and
//! idempotent for the same input; nothing here mutates the store.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::fields::{Phase, Priority, Status};
use crate::task::Task;

/// Per-phase progress bucket.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseSummary {
    pub phase: Phase,
    pub total: usize,
    pub completed: usize,
    /// Rounded percentage in [0, 100]; 0 when the bucket is empty.
    pub progress: u8,
}

/// Snapshot of a wedding's timeline state.
#[derive(Debug, Serialize)]
pub struct TimelineView {
    pub phases: Vec<PhaseSummary>,
    pub overall_progress: u8,
    pub critical_tasks: Vec<u64>,
    pub overdue_tasks: Vec<u64>,
    pub upcoming_tasks: Vec<u64>,
}

/// Rounded completion percentage, guarding the empty-bucket case.
fn progress_pct(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((100.0 * completed as f64 / total as f64).round()) as u8
}

/// Group tasks into the nine fixed phase buckets and materialize the
/// cross-cutting critical/overdue/upcoming views.
pub fn build_timeline_view(tasks: &[Task], today: NaiveDate) -> TimelineView {
    let phases = Phase::ALL
        .iter()
        .map(|&phase| {
            let in_phase: Vec<&Task> = tasks.iter().filter(|t| t.phase == phase).collect();
            let completed = in_phase
                .iter()
                .filter(|t| t.status == Status::Completed)
                .count();
            PhaseSummary {
                phase,
                total: in_phase.len(),
                completed,
                progress: progress_pct(completed, in_phase.len()),
            }
        })
        .collect();

    let completed_total = tasks
        .iter()
        .filter(|t| t.status == Status::Completed)
        .count();

    let horizon = today + Duration::days(7);

    let critical_tasks = tasks
        .iter()
        .filter(|t| t.priority == Priority::Critical && t.status != Status::Completed)
        .map(|t| t.id)
        .collect();

    let overdue_tasks = tasks
        .iter()
        .filter(|t| t.is_overdue(today))
        .map(|t| t.id)
        .collect();

    let upcoming_tasks = tasks
        .iter()
        .filter(|t| {
            t.status != Status::Completed
                && t.due.is_some_and(|d| d >= today && d <= horizon)
        })
        .map(|t| t.id)
        .collect();

    TimelineView {
        phases,
        overall_progress: progress_pct(completed_total, tasks.len()),
        critical_tasks,
        overdue_tasks,
        upcoming_tasks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Category;

    fn task(id: u64, phase: Phase, status: Status) -> Task {
        Task {
            id,
            name: format!("task {id}"),
            description: None,
            category: Category::Coordination,
            phase,
            priority: Priority::Medium,
            status,
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
    fn empty_task_set_has_zero_progress_everywhere() {
        let view = build_timeline_view(&[], today());
        assert_eq!(view.phases.len(), 9);
        assert!(view.phases.iter().all(|p| p.progress == 0 && p.total == 0));
        assert_eq!(view.overall_progress, 0);
    }

    #[test]
    fn phase_progress_is_rounded_ratio() {
        let tasks = vec![
            task(1, Phase::Measurements, Status::Completed),
            task(2, Phase::Measurements, Status::Completed),
            task(3, Phase::Measurements, Status::Pending),
            task(4, Phase::Orders, Status::Pending),
        ];
        let view = build_timeline_view(&tasks, today());
        let measurements = view
            .phases
            .iter()
            .find(|p| p.phase == Phase::Measurements)
            .unwrap();
        // 2 of 3 -> 66.67 rounds to 67.
        assert_eq!(measurements.progress, 67);
        let orders = view.phases.iter().find(|p| p.phase == Phase::Orders).unwrap();
        assert_eq!(orders.progress, 0);
        assert_eq!(view.overall_progress, 50);
        assert!(view.phases.iter().all(|p| p.progress <= 100));
    }

    #[test]
    fn cross_cutting_views_exclude_completed() {
        let mut overdue = task(1, Phase::Orders, Status::Pending);
        overdue.due = NaiveDate::from_ymd_opt(2025, 9, 10);
        let mut done_overdue = task(2, Phase::Orders, Status::Completed);
        done_overdue.due = NaiveDate::from_ymd_opt(2025, 9, 10);
        let mut soon = task(3, Phase::Production, Status::Pending);
        soon.due = NaiveDate::from_ymd_opt(2025, 9, 20);
        let mut far = task(4, Phase::Production, Status::Pending);
        far.due = NaiveDate::from_ymd_opt(2025, 10, 20);
        let mut critical = task(5, Phase::Setup, Status::InProgress);
        critical.priority = Priority::Critical;

        let tasks = vec![overdue, done_overdue, soon, far, critical];
        let view = build_timeline_view(&tasks, today());

        assert_eq!(view.overdue_tasks, vec![1]);
        assert_eq!(view.upcoming_tasks, vec![3]);
        assert_eq!(view.critical_tasks, vec![5]);
    }

    #[test]
    fn due_today_and_on_horizon_count_as_upcoming() {
        let mut a = task(1, Phase::Planning, Status::Pending);
        a.due = Some(today());
        let mut b = task(2, Phase::Planning, Status::Pending);
        b.due = Some(today() + Duration::days(7));
        let view = build_timeline_view(&[a, b], today());
        assert_eq!(view.upcoming_tasks, vec![1, 2]);
        assert!(view.overdue_tasks.is_empty());
    }
}
