//! Coordination analysis with a deterministic fallback.
//!
//! The analysis text ordinarily comes from an external completion provider.
//! Provider failure or an unparseable payload must never surface to the user:
//! the result type carries a `source` tag and the fallback is computed from
//! the structured task data, so callers always get a usable analysis.

use std::io::Write;
use std::process::{Command, Stdio};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};

use crate::db::format_status;
use crate::error::Error;
use crate::task::Task;
use crate::timeline::build_timeline_view;

/// Where an analysis came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Source {
    Model,
    Fallback,
}

#[derive(Debug, Serialize)]
pub struct CoordinationAnalysis {
    pub source: Source,
    pub summary: String,
    pub attention: Vec<String>,
}

/// Opaque completion seam over the external model.
pub trait AnalysisProvider {
    fn complete(&self, prompt: &str) -> Result<serde_json::Value, Error>;
}

/// Provider used when no model is configured; always unavailable.
pub struct Unavailable;

impl AnalysisProvider for Unavailable {
    fn complete(&self, _prompt: &str) -> Result<serde_json::Value, Error> {
        Err(Error::Provider("no analysis provider configured".into()))
    }
}

/// Runs an external command, prompt on stdin, JSON object on stdout.
/// Configured via the `WTM_ANALYSIS_CMD` environment variable.
pub struct CommandProvider {
    pub command: String,
}

impl AnalysisProvider for CommandProvider {
    fn complete(&self, prompt: &str) -> Result<serde_json::Value, Error> {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::Provider(e.to_string()))?;
        if let Some(stdin) = child.stdin.as_mut() {
            stdin
                .write_all(prompt.as_bytes())
                .map_err(|e| Error::Provider(e.to_string()))?;
        }
        let output = child
            .wait_with_output()
            .map_err(|e| Error::Provider(e.to_string()))?;
        if !output.status.success() {
            return Err(Error::Provider(format!(
                "analysis command exited with {}",
                output.status
            )));
        }
        serde_json::from_slice(&output.stdout).map_err(|e| Error::Provider(e.to_string()))
    }
}

/// Produce a coordination analysis, degrading to the deterministic fallback
/// on any provider or parse failure.
pub fn coordination_analysis(
    provider: &dyn AnalysisProvider,
    tasks: &[Task],
    today: NaiveDate,
) -> CoordinationAnalysis {
    let prompt = build_prompt(tasks, today);
    match provider.complete(&prompt) {
        Ok(value) => match parse_model_analysis(&value) {
            Some(analysis) => analysis,
            None => {
                warn!("model payload missing expected fields, using fallback");
                fallback_analysis(tasks, today)
            }
        },
        Err(e) => {
            debug!(error = %e, "analysis provider unavailable, using fallback");
            fallback_analysis(tasks, today)
        }
    }
}

fn build_prompt(tasks: &[Task], today: NaiveDate) -> String {
    let mut prompt = String::from(
        "Summarize the coordination state of this wedding task list. \
         Respond with a JSON object {\"summary\": string, \"attention\": [string]}.\n",
    );
    for t in tasks {
        prompt.push_str(&format!(
            "- [{}] {} (due {}, {} days overdue)\n",
            format_status(t.status),
            t.name,
            t.due.map_or_else(|| "-".into(), |d| d.to_string()),
            t.days_overdue(today).max(0),
        ));
    }
    prompt
}

fn parse_model_analysis(value: &serde_json::Value) -> Option<CoordinationAnalysis> {
    let summary = value.get("summary")?.as_str()?.to_string();
    let attention = value
        .get("attention")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|i| i.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();
    Some(CoordinationAnalysis {
        source: Source::Model,
        summary,
        attention,
    })
}

/// Static-shaped fallback computed from the timeline view.
fn fallback_analysis(tasks: &[Task], today: NaiveDate) -> CoordinationAnalysis {
    let view = build_timeline_view(tasks, today);
    let done = tasks
        .iter()
        .filter(|t| t.completed_at_utc.is_some())
        .count();
    let summary = format!(
        "{} of {} tasks complete ({}% overall)",
        done,
        tasks.len(),
        view.overall_progress
    );

    let mut attention = Vec::new();
    for id in &view.overdue_tasks {
        if let Some(t) = tasks.iter().find(|t| t.id == *id) {
            attention.push(format!(
                "'{}' is {} days overdue",
                t.name,
                t.days_overdue(today)
            ));
        }
    }
    for id in &view.critical_tasks {
        if let Some(t) = tasks.iter().find(|t| t.id == *id) {
            if !view.overdue_tasks.contains(id) {
                attention.push(format!("critical task '{}' is not yet complete", t.name));
            }
        }
    }

    CoordinationAnalysis {
        source: Source::Fallback,
        summary,
        attention,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{Category, Phase, Priority, Status};

    struct Fixed(serde_json::Value);

    impl AnalysisProvider for Fixed {
        fn complete(&self, _prompt: &str) -> Result<serde_json::Value, Error> {
            Ok(self.0.clone())
        }
    }

    fn task(id: u64, status: Status) -> Task {
        Task {
            id,
            name: format!("task {id}"),
            description: None,
            category: Category::Coordination,
            phase: Phase::Planning,
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
            completed_at_utc: if status == Status::Completed { Some(1) } else { None },
            created_at_utc: 0,
            updated_at_utc: 0,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 15).unwrap()
    }

    #[test]
    fn provider_failure_uses_fallback() {
        let tasks = vec![task(1, Status::Completed), task(2, Status::Pending)];
        let analysis = coordination_analysis(&Unavailable, &tasks, today());
        assert_eq!(analysis.source, Source::Fallback);
        assert_eq!(analysis.summary, "1 of 2 tasks complete (50% overall)");
    }

    #[test]
    fn well_formed_model_payload_is_used() {
        let provider = Fixed(serde_json::json!({
            "summary": "on track",
            "attention": ["follow up with supplier"]
        }));
        let analysis = coordination_analysis(&provider, &[task(1, Status::Pending)], today());
        assert_eq!(analysis.source, Source::Model);
        assert_eq!(analysis.summary, "on track");
        assert_eq!(analysis.attention, vec!["follow up with supplier"]);
    }

    #[test]
    fn malformed_model_payload_falls_back() {
        let provider = Fixed(serde_json::json!({"wrong": "shape"}));
        let analysis = coordination_analysis(&provider, &[task(1, Status::Pending)], today());
        assert_eq!(analysis.source, Source::Fallback);
    }

    #[test]
    fn fallback_flags_overdue_and_critical_tasks() {
        let mut overdue = task(1, Status::Pending);
        overdue.due = NaiveDate::from_ymd_opt(2025, 9, 10);
        let mut critical = task(2, Status::InProgress);
        critical.priority = Priority::Critical;

        let analysis = coordination_analysis(&Unavailable, &[overdue, critical], today());
        assert_eq!(analysis.attention.len(), 2);
        assert!(analysis.attention[0].contains("5 days overdue"));
        assert!(analysis.attention[1].contains("critical task"));
    }
}
