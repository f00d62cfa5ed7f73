//! Command implementations for the CLI interface.
//!
//! This module contains all the command handlers that implement the various
//! subcommands, from task CRUD and status transitions to the timeline view,
//! critical-path report, milestone generation and reminder dispatch.

use clap::Subcommand;
use clap_complete::{generate, Shell};

use std::env;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use chrono::{Duration, Local, NaiveDate, TimeZone, Utc};

use crate::analyze::{coordination_analysis, CommandProvider, Unavailable};
use crate::critical_path::{estimate_critical_path, RiskKind};
use crate::db::*;
use crate::error::Error;
use crate::fields::*;
use crate::milestones::{create_milestone_tasks, generate_milestones};
use crate::notify::{dispatch_fire_and_forget, Notifier};
use crate::propagate::{
    complete_task, derived_status, find_cycle, hold_task, resume_task, start_task,
};
use crate::task::{Member, Task};
use crate::timeline::build_timeline_view;
use crate::wedding::{create_wedding, discover_weddings};

#[derive(Subcommand)]
pub enum Commands {
    /// Add a new task.
    Add {
        /// Short name for the task.
        name: String,
        /// Optional longer description.
        #[arg(long)]
        desc: Option<String>,
        /// Category: measurements | selection | orders | fitting | payment | coordination.
        #[arg(long, value_enum, default_value_t = Category::Coordination)]
        category: Category,
        /// Phase bucket for the timeline view.
        #[arg(long, value_enum, default_value_t = Phase::Planning)]
        phase: Phase,
        /// Priority: critical | high | medium | low.
        #[arg(long, value_enum, default_value_t = Priority::Medium)]
        priority: Priority,
        /// Due date: YYYY-MM-DD, "today", "tomorrow", or "in Nd".
        #[arg(long)]
        due: Option<String>,
        /// Planned start date (YYYY-MM-DD).
        #[arg(long)]
        start: Option<String>,
        /// Estimated duration in hours.
        #[arg(long)]
        hours: Option<f64>,
        /// Prerequisite task (ID or name) that must complete first. May be repeated.
        #[arg(long = "after")]
        prereqs: Vec<String>,
        /// Task ID this task unblocks, for bottleneck reporting. May be repeated.
        #[arg(long = "triggers")]
        triggers: Vec<u64>,
        /// Assigned party member ID.
        #[arg(long)]
        member: Option<u64>,
    },

    /// List tasks with optional filters.
    List {
        /// Include completed tasks.
        #[arg(long)]
        all: bool,
        /// Filter by status.
        #[arg(long, value_enum)]
        status: Option<Status>,
        /// Filter by phase.
        #[arg(long, value_enum)]
        phase: Option<Phase>,
        /// Filter by category.
        #[arg(long, value_enum)]
        category: Option<Category>,
        /// Filter by priority.
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        /// Due filter: today | this-week | overdue | none.
        #[arg(long, value_enum)]
        due: Option<DueFilter>,
        /// Sort key.
        #[arg(long, value_enum, default_value_t = SortKey::Due)]
        sort: SortKey,
        /// Limit number of rows printed.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// View a single task by ID or name.
    View {
        /// Task ID or name to view.
        id: String,
    },

    /// Update an existing task's fields.
    Update {
        /// Task ID or name to update.
        id: String,
        /// New name.
        #[arg(long)]
        name: Option<String>,
        /// New description.
        #[arg(long)]
        desc: Option<String>,
        /// New category.
        #[arg(long, value_enum)]
        category: Option<Category>,
        /// New phase.
        #[arg(long, value_enum)]
        phase: Option<Phase>,
        /// New priority.
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        /// New due date.
        #[arg(long)]
        due: Option<String>,
        /// Clear the due date.
        #[arg(long)]
        clear_due: bool,
        /// New estimated duration in hours.
        #[arg(long)]
        hours: Option<f64>,
        /// Replace the prerequisite list (ID or name). May be repeated.
        #[arg(long = "after")]
        prereqs: Vec<String>,
        /// Clear all prerequisites.
        #[arg(long)]
        clear_prereqs: bool,
        /// New assigned member ID.
        #[arg(long)]
        member: Option<u64>,
        /// Clear the member assignment.
        #[arg(long)]
        clear_member: bool,
    },

    /// Mark a task in progress.
    Start {
        /// Task ID or name.
        id: String,
    },

    /// Complete a task and re-evaluate blocked tasks.
    Complete {
        /// Task ID or name.
        id: String,
    },

    /// Put a task on hold.
    Hold {
        /// Task ID or name.
        id: String,
    },

    /// Resume a task from hold.
    Resume {
        /// Task ID or name.
        id: String,
    },

    /// Show the phase-by-phase timeline view.
    Timeline {
        /// Emit JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Show the critical-path estimate.
    CriticalPath {
        /// Emit JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Generate the milestone schedule from the wedding date.
    Milestones {
        /// Wedding date (YYYY-MM-DD). Defaults to the stored wedding date.
        #[arg(long)]
        date: Option<String>,
        /// Create the milestones as tasks in the store.
        #[arg(long)]
        create: bool,
    },

    /// Send due-date reminders to assigned members.
    Remind {
        /// Reminder window in days.
        #[arg(long, default_value_t = 7)]
        days: i64,
    },

    /// Coordination analysis (model-backed with deterministic fallback).
    Analyze {
        /// Emit JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Manage wedding-party members.
    Member {
        #[command(subcommand)]
        action: MemberAction,
    },

    /// Manage weddings.
    Wedding {
        #[command(subcommand)]
        action: WeddingAction,
    },

    /// Create a timestamped backup of the active store.
    Backup,

    /// Generate shell completions.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum MemberAction {
    /// Add a party member.
    Add {
        name: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        role: Option<String>,
    },
    /// List party members.
    List,
}

#[derive(Subcommand)]
pub enum WeddingAction {
    /// Create a new wedding store.
    New {
        name: String,
        /// Wedding date (YYYY-MM-DD).
        #[arg(long)]
        date: Option<String>,
    },
    /// List known weddings.
    List,
}

fn parse_date_arg(s: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{s}', expected YYYY-MM-DD"))
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_add(
    db: &mut Database,
    db_path: &Path,
    name: String,
    desc: Option<String>,
    category: Category,
    phase: Phase,
    priority: Priority,
    due: Option<String>,
    start: Option<String>,
    hours: Option<f64>,
    prereqs: Vec<String>,
    triggers: Vec<u64>,
    member: Option<u64>,
) -> anyhow::Result<()> {
    let id = db.next_task_id();

    let mut prereq_ids = Vec::new();
    for p in &prereqs {
        let pid = resolve_task_identifier(p, db).context("resolving prerequisite")?;
        if !prereq_ids.contains(&pid) {
            prereq_ids.push(pid);
        }
    }
    if let Some(offender) = find_cycle(db, id, &prereq_ids) {
        return Err(Error::CycleDetected(offender).into());
    }

    if let Some(mid) = member {
        if db.get_member(mid).is_none() {
            return Err(Error::MemberNotFound(mid).into());
        }
    }

    for &tid in &triggers {
        if db.get(tid).is_none() {
            return Err(Error::TaskNotFound(tid).into());
        }
    }

    let due = match due.as_deref() {
        Some(s) => Some(
            parse_due_input(s).with_context(|| format!("could not parse due date '{s}'"))?,
        ),
        None => None,
    };
    let start_date = match start.as_deref() {
        Some(s) => Some(parse_date_arg(s)?),
        None => None,
    };

    let status = derived_status(&prereq_ids, db);
    let now_utc = Utc::now().timestamp();
    let task = Task {
        id,
        name,
        description: desc,
        category,
        phase,
        priority,
        status,
        due,
        start_date,
        estimated_duration_hours: hours,
        prerequisite_task_ids: prereq_ids,
        triggers_task_ids: triggers,
        assigned_member_id: member,
        completion_percentage: 0,
        reminder_sent: false,
        started_at_utc: None,
        completed_at_utc: None,
        created_at_utc: now_utc,
        updated_at_utc: now_utc,
    };
    db.tasks.push(task);
    db.save(db_path)?;
    println!("Added task {} ({})", id, format_status(status));
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_list(
    db: &Database,
    all: bool,
    status: Option<Status>,
    phase: Option<Phase>,
    category: Option<Category>,
    priority: Option<Priority>,
    due: Option<DueFilter>,
    sort: SortKey,
    limit: Option<usize>,
) {
    let today = Local::now().date_naive();
    let (week_start, week_end) = start_end_of_this_week(today);

    let mut filtered: Vec<&Task> = db
        .tasks
        .iter()
        .filter(|t| {
            if !all && t.status == Status::Completed {
                return false;
            }
            if let Some(s) = status {
                if t.status != s {
                    return false;
                }
            }
            if let Some(p) = phase {
                if t.phase != p {
                    return false;
                }
            }
            if let Some(c) = category {
                if t.category != c {
                    return false;
                }
            }
            if let Some(pr) = priority {
                if t.priority != pr {
                    return false;
                }
            }
            if let Some(df) = due {
                match df {
                    DueFilter::Today => {
                        if t.due != Some(today) {
                            return false;
                        }
                    }
                    DueFilter::ThisWeek => {
                        if let Some(d) = t.due {
                            if d < week_start || d > week_end {
                                return false;
                            }
                        } else {
                            return false;
                        }
                    }
                    DueFilter::Overdue => {
                        if let Some(d) = t.due {
                            if d >= today {
                                return false;
                            }
                        } else {
                            return false;
                        }
                    }
                    DueFilter::None => {
                        if t.due.is_some() {
                            return false;
                        }
                    }
                }
            }
            true
        })
        .collect();

    match sort {
        SortKey::Due => filtered.sort_by_key(|t| (t.due.unwrap_or(NaiveDate::MAX), t.id)),
        SortKey::Priority => {
            filtered.sort_by_key(|t| (t.priority as u8, t.id));
        }
        SortKey::Phase => {
            filtered.sort_by_key(|t| (t.phase as u8, t.id));
        }
        SortKey::Id => filtered.sort_by_key(|t| t.id),
    }

    if let Some(n) = limit {
        filtered.truncate(n);
    }

    print_table(&filtered, db);
}

/// View detailed information about a specific task.
pub fn cmd_view(db: &Database, id: String) -> anyhow::Result<()> {
    let task_id = resolve_task_identifier(&id, db)?;
    let Some(task) = db.get(task_id).cloned() else {
        bail!("task {task_id} not found");
    };
    let today = Local::now().date_naive();
    println!("ID:           {}", task.id);
    println!("Name:         {}", task.name);
    println!("Category:     {}", format_category(task.category));
    println!("Phase:        {}", format_phase(task.phase));
    println!("Status:       {}", format_status(task.status));
    println!("Priority:     {}", format_priority(task.priority));
    println!(
        "Due:          {}",
        match task.due {
            Some(d) => format!("{d} ({})", format_due_relative(Some(d), today)),
            None => "-".into(),
        }
    );
    println!(
        "Start:        {}",
        task.start_date.map(|d| d.to_string()).unwrap_or_else(|| "-".into())
    );
    println!(
        "Estimate:     {}",
        task.estimated_duration_hours
            .map(|h| format!("{h}h"))
            .unwrap_or_else(|| "-".into())
    );
    println!("Progress:     {}%", task.completion_percentage);
    println!(
        "Member:       {}",
        task.assigned_member_id
            .and_then(|mid| db.get_member(mid))
            .map(|m| format!("{} (#{})", m.name, m.id))
            .unwrap_or_else(|| "-".into())
    );
    if task.prerequisite_task_ids.is_empty() {
        println!("After:        -");
    } else {
        println!("After:");
        for pid in &task.prerequisite_task_ids {
            match db.get(*pid) {
                Some(p) => println!("  {} {} [{}]", p.id, p.name, format_status(p.status)),
                None => println!("  {pid} (missing, treated as incomplete)"),
            }
        }
    }
    if !task.triggers_task_ids.is_empty() {
        println!(
            "Triggers:     {}",
            task.triggers_task_ids
                .iter()
                .map(|i| i.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    println!(
        "Created UTC:  {}",
        Utc.timestamp_opt(task.created_at_utc, 0)
            .single()
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "-".into())
    );
    println!(
        "Updated UTC:  {}",
        Utc.timestamp_opt(task.updated_at_utc, 0)
            .single()
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "-".into())
    );
    println!(
        "Description:\n{}",
        task.description.unwrap_or_else(|| "-".into())
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_update(
    db: &mut Database,
    db_path: &Path,
    id: String,
    name: Option<String>,
    desc: Option<String>,
    category: Option<Category>,
    phase: Option<Phase>,
    priority: Option<Priority>,
    due: Option<String>,
    clear_due: bool,
    hours: Option<f64>,
    prereqs: Vec<String>,
    clear_prereqs: bool,
    member: Option<u64>,
    clear_member: bool,
) -> anyhow::Result<()> {
    let task_id = resolve_task_identifier(&id, db)?;

    let new_prereqs = if clear_prereqs {
        Some(Vec::new())
    } else if !prereqs.is_empty() {
        let mut ids = Vec::new();
        for p in &prereqs {
            let pid = resolve_task_identifier(p, db).context("resolving prerequisite")?;
            if pid == task_id {
                bail!("task cannot be its own prerequisite");
            }
            if !ids.contains(&pid) {
                ids.push(pid);
            }
        }
        if let Some(offender) = find_cycle(db, task_id, &ids) {
            return Err(Error::CycleDetected(offender).into());
        }
        Some(ids)
    } else {
        None
    };

    let parsed_due = match due.as_deref() {
        Some(s) => Some(
            parse_due_input(s).with_context(|| format!("could not parse due date '{s}'"))?,
        ),
        None => None,
    };

    if let Some(mid) = member {
        if db.get_member(mid).is_none() {
            return Err(Error::MemberNotFound(mid).into());
        }
    }

    // Re-derive blocked/pending after a prerequisite change, but only for
    // tasks that are not mid-flight.
    let rederived = new_prereqs.as_ref().map(|ids| derived_status(ids, db));

    let Some(t) = db.get_mut(task_id) else {
        bail!("task {task_id} not found");
    };
    if let Some(n) = name {
        t.name = n;
    }
    if let Some(d) = desc {
        t.description = Some(d);
    }
    if let Some(c) = category {
        t.category = c;
    }
    if let Some(p) = phase {
        t.phase = p;
    }
    if let Some(p) = priority {
        t.priority = p;
    }
    if clear_due {
        t.due = None;
    } else if let Some(d) = parsed_due {
        t.due = Some(d);
    }
    if let Some(h) = hours {
        t.estimated_duration_hours = Some(h);
    }
    if let Some(ids) = new_prereqs {
        t.prerequisite_task_ids = ids;
        if let Some(status) = rederived {
            if matches!(t.status, Status::Blocked | Status::Pending) {
                t.status = status;
            }
        }
    }
    if clear_member {
        t.assigned_member_id = None;
    } else if let Some(mid) = member {
        t.assigned_member_id = Some(mid);
    }
    t.updated_at_utc = Utc::now().timestamp();

    db.save(db_path)?;
    println!("Updated {task_id}");
    Ok(())
}

/// Transition a task to in-progress.
pub fn cmd_start(db: &mut Database, db_path: &Path, id: String) -> anyhow::Result<()> {
    let task_id = resolve_task_identifier(&id, db)?;
    start_task(db, task_id, Utc::now().timestamp())?;
    db.save(db_path)?;
    println!("Started {task_id}");
    Ok(())
}

/// Complete a task, sync the member record and unblock dependents.
pub fn cmd_complete(
    db: &mut Database,
    db_path: &Path,
    id: String,
    notifier: &dyn Notifier,
) -> anyhow::Result<()> {
    let task_id = resolve_task_identifier(&id, db)?;
    let outcome = complete_task(db, task_id, Utc::now().timestamp())?;
    db.save(db_path)?;

    println!("Completed {}", outcome.completed);
    for id in &outcome.unblocked {
        let Some(t) = db.get(*id) else { continue };
        println!("  unblocked {} ({})", t.id, t.name);
        if let Some(m) = t.assigned_member_id.and_then(|mid| db.get_member(mid)) {
            if let Some(email) = m.email.as_deref() {
                dispatch_fire_and_forget(
                    notifier,
                    email,
                    &format!("Task ready: {}", t.name),
                    &format!(
                        "All prerequisites for '{}' are complete. It is ready to start.",
                        t.name
                    ),
                );
            }
        }
    }
    if let Some(mid) = outcome.member_synced {
        if let Some(m) = db.get_member(mid) {
            println!(
                "  member {} status -> {}",
                m.name,
                m.status.as_deref().unwrap_or("-")
            );
        }
    }
    Ok(())
}

/// Put a task on hold.
pub fn cmd_hold(db: &mut Database, db_path: &Path, id: String) -> anyhow::Result<()> {
    let task_id = resolve_task_identifier(&id, db)?;
    hold_task(db, task_id, Utc::now().timestamp())?;
    db.save(db_path)?;
    println!("On hold: {task_id}");
    Ok(())
}

/// Resume a task from hold.
pub fn cmd_resume(db: &mut Database, db_path: &Path, id: String) -> anyhow::Result<()> {
    let task_id = resolve_task_identifier(&id, db)?;
    resume_task(db, task_id, Utc::now().timestamp())?;
    db.save(db_path)?;
    let status = db.get(task_id).map(|t| format_status(t.status)).unwrap_or("-");
    println!("Resumed {task_id} ({status})");
    Ok(())
}

/// Print the phase-by-phase timeline view.
pub fn cmd_timeline(db: &Database, json: bool) -> anyhow::Result<()> {
    let today = Local::now().date_naive();
    let view = build_timeline_view(&db.tasks, today);

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("{:<14} {:>5} {:>9} {:>9}", "Phase", "Tasks", "Done", "Progress");
    for p in &view.phases {
        println!(
            "{:<14} {:>5} {:>9} {:>8}%",
            format_phase(p.phase),
            p.total,
            p.completed,
            p.progress
        );
    }
    println!("\nOverall progress: {}%", view.overall_progress);

    let name_of = |id: &u64| {
        db.get(*id)
            .map(|t| format!("{} ({})", t.id, t.name))
            .unwrap_or_else(|| id.to_string())
    };
    if !view.critical_tasks.is_empty() {
        println!("\nOpen critical tasks:");
        for id in &view.critical_tasks {
            println!("  {}", name_of(id));
        }
    }
    if !view.overdue_tasks.is_empty() {
        println!("\nOverdue:");
        for id in &view.overdue_tasks {
            println!("  {}", name_of(id));
        }
    }
    if !view.upcoming_tasks.is_empty() {
        println!("\nDue within 7 days:");
        for id in &view.upcoming_tasks {
            println!("  {}", name_of(id));
        }
    }
    Ok(())
}

/// Print the critical-path estimate.
pub fn cmd_critical_path(db: &Database, json: bool) -> anyhow::Result<()> {
    let today = Local::now().date_naive();
    let report = estimate_critical_path(&db.tasks, today);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Critical-path tasks:   {}", report.task_count);
    println!("Estimated total work:  {}h", report.estimated_total_hours);
    println!(
        "Estimated completion:  {}",
        report
            .estimated_completion_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".into())
    );
    if !report.bottlenecks.is_empty() {
        println!("\nBottlenecks:");
        for b in &report.bottlenecks {
            let state = if b.on_hold { "on hold" } else { "overdue" };
            println!(
                "  {} ({}): {}, blocks {} task(s)",
                b.task_id,
                b.task_name,
                state,
                b.triggers.len()
            );
        }
    }
    if !report.risk_factors.is_empty() {
        println!("\nRisk factors:");
        for r in &report.risk_factors {
            match r.kind {
                RiskKind::Overdue { days_overdue } => {
                    println!("  {} ({}): {} days overdue", r.task_id, r.task_name, days_overdue);
                }
                RiskKind::Urgent { days_until_due } => {
                    println!(
                        "  {} ({}): due in {} day(s), not started",
                        r.task_id, r.task_name, days_until_due
                    );
                }
            }
        }
    }
    Ok(())
}

/// Print or materialize the milestone schedule.
pub fn cmd_milestones(
    db: &mut Database,
    db_path: &Path,
    date: Option<String>,
    create: bool,
) -> anyhow::Result<()> {
    let wedding_date = match date.as_deref() {
        Some(s) => parse_date_arg(s)?,
        None => db
            .wedding_date
            .context("no wedding date stored; pass --date YYYY-MM-DD")?,
    };

    let milestones = generate_milestones(wedding_date);
    println!("{:<12} {:<7} {:<10} {}", "Due", "Days", "Priority", "Milestone");
    for m in &milestones {
        println!(
            "{:<12} {:<7} {:<10} {}",
            m.due.to_string(),
            format!("-{}d", m.offset_days),
            format_priority(m.priority),
            m.name
        );
    }

    if create {
        let created = create_milestone_tasks(db, wedding_date);
        db.save(db_path)?;
        println!("\nCreated {} milestone tasks.", created.len());
    }
    Ok(())
}

/// Dispatch reminders for tasks due within the window.
pub fn cmd_remind(
    db: &mut Database,
    db_path: &Path,
    days: i64,
    notifier: &dyn Notifier,
) -> anyhow::Result<()> {
    let today = Local::now().date_naive();
    let horizon = today + Duration::days(days);

    // Bounded window: overdue tasks are the risk report's job, not a
    // reminder's.
    let due_soon: Vec<u64> = db
        .tasks
        .iter()
        .filter(|t| {
            t.status != Status::Completed
                && !t.reminder_sent
                && t.due.is_some_and(|d| d >= today && d <= horizon)
        })
        .map(|t| t.id)
        .collect();

    let mut sent = 0usize;
    for id in due_soon {
        let Some(t) = db.get(id) else { continue };
        let Some(m) = t.assigned_member_id.and_then(|mid| db.get_member(mid)) else {
            continue;
        };
        let Some(email) = m.email.clone() else { continue };
        let subject = format!("Reminder: {}", t.name);
        let body = format!(
            "'{}' is due {}.",
            t.name,
            format_due_relative(t.due, today)
        );
        if dispatch_fire_and_forget(notifier, &email, &subject, &body) {
            if let Some(t) = db.get_mut(id) {
                t.reminder_sent = true;
                t.updated_at_utc = Utc::now().timestamp();
            }
            sent += 1;
        }
    }

    db.save(db_path)?;
    println!("Sent {sent} reminder(s).");
    Ok(())
}

/// Coordination analysis with the fallback contract.
pub fn cmd_analyze(db: &Database, json: bool) -> anyhow::Result<()> {
    let today = Local::now().date_naive();
    let analysis = match env::var("WTM_ANALYSIS_CMD") {
        Ok(command) if !command.trim().is_empty() => {
            let provider = CommandProvider { command };
            coordination_analysis(&provider, &db.tasks, today)
        }
        _ => coordination_analysis(&Unavailable, &db.tasks, today),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    let source = match analysis.source {
        crate::analyze::Source::Model => "model",
        crate::analyze::Source::Fallback => "fallback",
    };
    println!("Analysis ({source}): {}", analysis.summary);
    for line in &analysis.attention {
        println!("  - {line}");
    }
    Ok(())
}

/// Handle member management commands.
pub fn cmd_member(db: &mut Database, db_path: &Path, action: MemberAction) -> anyhow::Result<()> {
    match action {
        MemberAction::Add { name, email, role } => {
            let id = db.next_member_id();
            db.members.push(Member {
                id,
                name,
                email,
                role,
                status: None,
                created_at_utc: Utc::now().timestamp(),
            });
            db.save(db_path)?;
            println!("Added member {id}");
        }
        MemberAction::List => {
            println!("{:<5} {:<18} {:<24} {:<14} {}", "ID", "Name", "Email", "Role", "Status");
            for m in &db.members {
                println!(
                    "{:<5} {:<18} {:<24} {:<14} {}",
                    m.id,
                    truncate(&m.name, 18),
                    m.email.as_deref().unwrap_or("-"),
                    m.role.as_deref().unwrap_or("-"),
                    m.status.as_deref().unwrap_or("-"),
                );
            }
        }
    }
    Ok(())
}

/// Handle wedding management commands.
pub fn cmd_wedding(data_dir: &Path, action: WeddingAction) -> anyhow::Result<()> {
    match action {
        WeddingAction::New { name, date } => {
            let wedding_date = match date.as_deref() {
                Some(s) => Some(parse_date_arg(s)?),
                None => None,
            };
            let wedding = create_wedding(&name, data_dir, wedding_date)?;
            println!(
                "Created wedding '{}' at {}",
                wedding.display_name,
                wedding.file_path.display()
            );
        }
        WeddingAction::List => {
            let weddings = discover_weddings(data_dir)?;
            if weddings.is_empty() {
                println!("No weddings found.");
                return Ok(());
            }
            for w in weddings {
                let db = w.load_database();
                println!(
                    "{:<24} date: {:<12} tasks: {}",
                    w.display_name,
                    db.wedding_date
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| "-".into()),
                    db.tasks.len()
                );
            }
        }
    }
    Ok(())
}

/// Create a timestamped copy of the database file next to it.
pub fn cmd_backup(db_path: &Path) -> anyhow::Result<()> {
    if !db_path.exists() {
        bail!("no store at {}", db_path.display());
    }
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let file_stem = db_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("wedding");
    let backup_path = db_path.with_file_name(format!("{file_stem}_backup_{stamp}.json"));
    fs::copy(db_path, &backup_path)?;
    println!("Backup created: {}", backup_path.display());
    Ok(())
}

/// Generate shell completions for the CLI.
pub fn cmd_completions(shell: Shell) {
    use crate::cli::Cli;
    use clap::CommandFactory;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Recording {
        sent: RefCell<Vec<String>>,
        fail: bool,
    }

    impl Notifier for Recording {
        fn send(&self, recipient: &str, _subject: &str, _body: &str) -> Result<(), Error> {
            if self.fail {
                return Err(Error::Provider("smtp unavailable".into()));
            }
            self.sent.borrow_mut().push(recipient.to_string());
            Ok(())
        }
    }

    fn recording() -> Recording {
        Recording {
            sent: RefCell::new(vec![]),
            fail: false,
        }
    }

    fn member(id: u64, email: &str) -> Member {
        Member {
            id,
            name: format!("member {id}"),
            email: Some(email.to_string()),
            role: None,
            status: None,
            created_at_utc: 0,
        }
    }

    fn task_due(id: u64, due: Option<NaiveDate>, member_id: u64) -> Task {
        Task {
            id,
            name: format!("task {id}"),
            description: None,
            category: Category::Coordination,
            phase: Phase::Planning,
            priority: Priority::Medium,
            status: Status::Pending,
            due,
            start_date: None,
            estimated_duration_hours: None,
            prerequisite_task_ids: vec![],
            triggers_task_ids: vec![],
            assigned_member_id: Some(member_id),
            completion_percentage: 0,
            reminder_sent: false,
            started_at_utc: None,
            completed_at_utc: None,
            created_at_utc: 0,
            updated_at_utc: 0,
        }
    }

    #[test]
    fn remind_window_is_bounded_both_ways() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("w_wedding.json");
        let today = Local::now().date_naive();

        let mut db = Database::default();
        db.members.push(member(1, "a@example.com"));
        // Overdue, in-window and beyond-horizon tasks.
        db.tasks.push(task_due(1, Some(today - Duration::days(30)), 1));
        db.tasks.push(task_due(2, Some(today + Duration::days(1)), 1));
        db.tasks.push(task_due(3, Some(today + Duration::days(20)), 1));

        let notifier = recording();
        cmd_remind(&mut db, &path, 7, &notifier).unwrap();

        assert_eq!(notifier.sent.borrow().len(), 1);
        assert!(!db.get(1).unwrap().reminder_sent);
        assert!(db.get(2).unwrap().reminder_sent);
        assert!(!db.get(3).unwrap().reminder_sent);
    }

    #[test]
    fn remind_does_not_resend() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("w_wedding.json");
        let today = Local::now().date_naive();

        let mut db = Database::default();
        db.members.push(member(1, "a@example.com"));
        db.tasks.push(task_due(1, Some(today + Duration::days(2)), 1));

        let notifier = recording();
        cmd_remind(&mut db, &path, 7, &notifier).unwrap();
        cmd_remind(&mut db, &path, 7, &notifier).unwrap();

        assert_eq!(notifier.sent.borrow().len(), 1);
    }

    #[test]
    fn remind_keeps_flag_clear_on_dispatch_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("w_wedding.json");
        let today = Local::now().date_naive();

        let mut db = Database::default();
        db.members.push(member(1, "a@example.com"));
        db.tasks.push(task_due(1, Some(today + Duration::days(2)), 1));

        let notifier = Recording {
            sent: RefCell::new(vec![]),
            fail: true,
        };
        cmd_remind(&mut db, &path, 7, &notifier).unwrap();
        assert!(!db.get(1).unwrap().reminder_sent);
    }

    #[test]
    fn add_rejects_dangling_trigger_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("w_wedding.json");

        let mut db = Database::default();
        db.tasks.push(task_due(1, None, 0));
        db.tasks[0].assigned_member_id = None;

        let err = cmd_add(
            &mut db,
            &path,
            "x".into(),
            None,
            Category::Coordination,
            Phase::Planning,
            Priority::Medium,
            None,
            None,
            None,
            vec![],
            vec![99],
            None,
        )
        .unwrap_err();
        assert!(err.to_string().contains("99"), "unexpected error: {err}");

        // A trigger pointing at an existing task is accepted.
        cmd_add(
            &mut db,
            &path,
            "y".into(),
            None,
            Category::Coordination,
            Phase::Planning,
            Priority::Medium,
            None,
            None,
            None,
            vec![],
            vec![1],
            None,
        )
        .unwrap();
        assert_eq!(db.tasks.len(), 2);
    }
}
