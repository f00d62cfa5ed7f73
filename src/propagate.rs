//! Status transitions and dependency propagation.
//!
//! Prerequisite links live on the dependent task (`prerequisite_task_ids`);
//! completing a task never walks the optional `triggers_task_ids` reverse
//! pointers. Propagation runs as a fixed-point pass over the whole task set:
//! any blocked task whose prerequisites are all completed flips to pending,
//! and the pass repeats until nothing changes. A prerequisite ID that does
//! not exist in the store counts as unsatisfied, so a task with a dangling
//! link stays blocked rather than starting on a vacuous truth.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::db::Database;
use crate::error::Error;
use crate::fields::{Category, Status};
use crate::task::Task;

/// What a completion event changed, for reporting and notification.
#[derive(Debug)]
pub struct CompletionOutcome {
    pub completed: u64,
    pub unblocked: Vec<u64>,
    pub member_synced: Option<u64>,
}

/// True when every prerequisite of `task` exists and is completed.
pub fn prerequisites_satisfied(task: &Task, db: &Database) -> bool {
    task.prerequisite_task_ids.iter().all(|&pid| {
        db.get(pid)
            .is_some_and(|p| p.status == Status::Completed)
    })
}

/// Status a task should carry given its prerequisite list: `Blocked` while
/// any prerequisite is incomplete or missing, `Pending` otherwise.
pub fn derived_status(prereq_ids: &[u64], db: &Database) -> Status {
    let satisfied = prereq_ids.iter().all(|&pid| {
        db.get(pid)
            .is_some_and(|p| p.status == Status::Completed)
    });
    if satisfied {
        Status::Pending
    } else {
        Status::Blocked
    }
}

/// Check whether pointing `task_id` at `new_prereqs` would close a cycle in
/// the prerequisite graph. Returns the offending prerequisite ID if so.
pub fn find_cycle(db: &Database, task_id: u64, new_prereqs: &[u64]) -> Option<u64> {
    for &pid in new_prereqs {
        if pid == task_id {
            return Some(pid);
        }
        let mut seen = HashSet::new();
        if reaches(db, pid, task_id, &mut seen) {
            return Some(pid);
        }
    }
    None
}

/// Follow prerequisite edges from `from`, looking for `target`.
fn reaches(db: &Database, from: u64, target: u64, seen: &mut HashSet<u64>) -> bool {
    if !seen.insert(from) {
        return false;
    }
    let Some(task) = db.get(from) else {
        return false;
    };
    for &pid in &task.prerequisite_task_ids {
        if pid == target || reaches(db, pid, target, seen) {
            return true;
        }
    }
    false
}

/// Run blocked-to-pending propagation to a fixed point over the whole task
/// set. Returns the IDs of newly unblocked tasks in store order.
pub fn propagate(db: &mut Database, now_utc: i64) -> Vec<u64> {
    let mut unblocked = Vec::new();
    loop {
        let ready: Vec<u64> = db
            .tasks
            .iter()
            .filter(|t| t.status == Status::Blocked && prerequisites_satisfied(t, db))
            .map(|t| t.id)
            .collect();
        if ready.is_empty() {
            break;
        }
        for id in ready {
            if let Some(t) = db.get_mut(id) {
                t.status = Status::Pending;
                t.updated_at_utc = now_utc;
                debug!(task = id, "prerequisites satisfied, task ready");
                unblocked.push(id);
            }
        }
    }
    unblocked
}

/// Mark a task completed and re-evaluate the rest of the store.
///
/// Sets `completed_at_utc` and `completion_percentage = 100`, syncs the
/// assigned member's status from the task category (best effort), then runs
/// propagation. Completing an already-completed task is rejected.
pub fn complete_task(
    db: &mut Database,
    id: u64,
    now_utc: i64,
) -> Result<CompletionOutcome, Error> {
    let task = db.get(id).ok_or(Error::TaskNotFound(id))?;
    if task.status == Status::Completed {
        return Err(Error::InvalidTransition {
            id,
            reason: "task is already completed".into(),
        });
    }
    let category = task.category;
    let member_id = task.assigned_member_id;

    {
        // Checked above, still present.
        let Some(t) = db.get_mut(id) else {
            return Err(Error::TaskNotFound(id));
        };
        t.status = Status::Completed;
        t.completion_percentage = 100;
        t.completed_at_utc = Some(now_utc);
        t.updated_at_utc = now_utc;
    }

    let member_synced = sync_member_status(db, member_id, category);
    let unblocked = propagate(db, now_utc);

    Ok(CompletionOutcome {
        completed: id,
        unblocked,
        member_synced,
    })
}

/// Member status string implied by completing a task of the given category.
pub fn member_status_for(category: Category) -> Option<&'static str> {
    match category {
        Category::Measurements => Some("measurements_completed"),
        Category::Selection => Some("outfit_selected"),
        Category::Fitting => Some("fitting_completed"),
        Category::Orders => Some("order_placed"),
        Category::Payment => Some("payment_received"),
        Category::Coordination => None,
    }
}

/// Best-effort sync of the assigned member's status. A missing member record
/// is logged for manual reconciliation, never fatal.
fn sync_member_status(
    db: &mut Database,
    member_id: Option<u64>,
    category: Category,
) -> Option<u64> {
    let member_id = member_id?;
    let status = member_status_for(category)?;
    match db.get_member_mut(member_id) {
        Some(member) => {
            member.status = Some(status.to_string());
            Some(member_id)
        }
        None => {
            warn!(member = member_id, status, "assigned member not found, status not synced");
            None
        }
    }
}

/// Transition a task to in-progress. `started_at_utc` is set only on the
/// first start; re-starting an in-progress task leaves it untouched.
pub fn start_task(db: &mut Database, id: u64, now_utc: i64) -> Result<(), Error> {
    let task = db.get(id).ok_or(Error::TaskNotFound(id))?;
    match task.status {
        Status::Pending | Status::InProgress => {}
        Status::Blocked => {
            let unmet: Vec<String> = task
                .prerequisite_task_ids
                .iter()
                .filter(|&&pid| {
                    !db.get(pid)
                        .is_some_and(|p| p.status == Status::Completed)
                })
                .map(|pid| pid.to_string())
                .collect();
            return Err(Error::InvalidTransition {
                id,
                reason: format!("blocked on incomplete prerequisites: {}", unmet.join(", ")),
            });
        }
        Status::OnHold => {
            return Err(Error::InvalidTransition {
                id,
                reason: "task is on hold, resume it first".into(),
            });
        }
        Status::Completed => {
            return Err(Error::InvalidTransition {
                id,
                reason: "task is already completed".into(),
            });
        }
    }
    let Some(t) = db.get_mut(id) else {
        return Err(Error::TaskNotFound(id));
    };
    t.status = Status::InProgress;
    if t.started_at_utc.is_none() {
        t.started_at_utc = Some(now_utc);
    }
    t.updated_at_utc = now_utc;
    Ok(())
}

/// Put a task on hold.
pub fn hold_task(db: &mut Database, id: u64, now_utc: i64) -> Result<(), Error> {
    let task = db.get(id).ok_or(Error::TaskNotFound(id))?;
    if task.status == Status::Completed {
        return Err(Error::InvalidTransition {
            id,
            reason: "task is already completed".into(),
        });
    }
    let Some(t) = db.get_mut(id) else {
        return Err(Error::TaskNotFound(id));
    };
    t.status = Status::OnHold;
    t.updated_at_utc = now_utc;
    Ok(())
}

/// Resume a task from hold. The resulting status is re-derived from the
/// current prerequisite state rather than restored blindly.
pub fn resume_task(db: &mut Database, id: u64, now_utc: i64) -> Result<(), Error> {
    let task = db.get(id).ok_or(Error::TaskNotFound(id))?;
    if task.status != Status::OnHold {
        return Err(Error::InvalidTransition {
            id,
            reason: "task is not on hold".into(),
        });
    }
    let prereqs = task.prerequisite_task_ids.clone();
    let next = derived_status(&prereqs, db);
    let Some(t) = db.get_mut(id) else {
        return Err(Error::TaskNotFound(id));
    };
    t.status = next;
    t.updated_at_utc = now_utc;
    Ok(())
}
