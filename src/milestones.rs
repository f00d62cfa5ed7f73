//! Milestone generation.
//!
//! A fixed day-offset table keyed on the wedding date. Pure: same date in,
//! same milestones out. The CLI can also materialize the schedule as tasks
//! in the store, which is how the legacy generator seeded a fresh wedding.

use chrono::{Duration, NaiveDate, Utc};

use crate::db::Database;
use crate::fields::{Category, Phase, Priority, Status};
use crate::task::{Milestone, Task};

struct MilestoneSpec {
    offset_days: i64,
    name: &'static str,
    description: &'static str,
    priority: Priority,
    estimated_duration_hours: f64,
    category: Category,
    phase: Phase,
}

/// One row per checkpoint, ordered from furthest out to the day before.
const MILESTONE_TABLE: [MilestoneSpec; 7] = [
    MilestoneSpec {
        offset_days: 90,
        name: "Collect party measurements",
        description: "Gather measurements from every wedding-party member",
        priority: Priority::Critical,
        estimated_duration_hours: 6.0,
        category: Category::Measurements,
        phase: Phase::Measurements,
    },
    MilestoneSpec {
        offset_days: 60,
        name: "Finalize outfit selections",
        description: "Lock in outfit styles, colors and accessories",
        priority: Priority::High,
        estimated_duration_hours: 4.0,
        category: Category::Selection,
        phase: Phase::Selection,
    },
    MilestoneSpec {
        offset_days: 45,
        name: "Place outfit orders",
        description: "Submit all orders to suppliers with confirmed sizing",
        priority: Priority::Critical,
        estimated_duration_hours: 3.0,
        category: Category::Orders,
        phase: Phase::Orders,
    },
    MilestoneSpec {
        offset_days: 30,
        name: "Confirm production status",
        description: "Check in with suppliers on production and shipping",
        priority: Priority::Medium,
        estimated_duration_hours: 2.0,
        category: Category::Coordination,
        phase: Phase::Production,
    },
    MilestoneSpec {
        offset_days: 14,
        name: "First fitting session",
        description: "Schedule and run first fittings for the party",
        priority: Priority::High,
        estimated_duration_hours: 5.0,
        category: Category::Fitting,
        phase: Phase::Execution,
    },
    MilestoneSpec {
        offset_days: 7,
        name: "Final fitting and alterations",
        description: "Final fittings, with alterations turned around same week",
        priority: Priority::Critical,
        estimated_duration_hours: 4.0,
        category: Category::Fitting,
        phase: Phase::Execution,
    },
    MilestoneSpec {
        offset_days: 1,
        name: "Final confirmation and pickup",
        description: "Confirm every outfit is ready and distributed",
        priority: Priority::Critical,
        estimated_duration_hours: 2.0,
        category: Category::Coordination,
        phase: Phase::Completion,
    },
];

/// Generate the fixed milestone schedule for a wedding date.
pub fn generate_milestones(wedding_date: NaiveDate) -> Vec<Milestone> {
    MILESTONE_TABLE
        .iter()
        .map(|spec| Milestone {
            offset_days: spec.offset_days,
            name: spec.name,
            description: spec.description,
            due: wedding_date - Duration::days(spec.offset_days),
            priority: spec.priority,
            estimated_duration_hours: spec.estimated_duration_hours,
            category: spec.category,
            phase: spec.phase,
        })
        .collect()
}

/// Batch-create the milestone schedule as tasks in the store.
/// Returns the IDs of the created tasks.
pub fn create_milestone_tasks(db: &mut Database, wedding_date: NaiveDate) -> Vec<u64> {
    let now_utc = Utc::now().timestamp();
    let mut created = Vec::new();
    for m in generate_milestones(wedding_date) {
        let id = db.next_task_id();
        db.tasks.push(Task {
            id,
            name: m.name.to_string(),
            description: Some(m.description.to_string()),
            category: m.category,
            phase: m.phase,
            priority: m.priority,
            status: Status::Pending,
            due: Some(m.due),
            start_date: None,
            estimated_duration_hours: Some(m.estimated_duration_hours),
            prerequisite_task_ids: vec![],
            triggers_task_ids: vec![],
            assigned_member_id: None,
            completion_percentage: 0,
            reminder_sent: false,
            started_at_utc: None,
            completed_at_utc: None,
            created_at_utc: now_utc,
            updated_at_utc: now_utc,
        });
        created.push(id);
    }
    created
}
