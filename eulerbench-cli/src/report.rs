//! Report Data Structures

use crate::attempt::AttemptRecord;
use crate::config::IsolationMode;
use crate::solver::ProblemSolver;
use chrono::{DateTime, Utc};
use eulerbench_core::Answer;
use serde::Serialize;

/// Version of the JSON report layout
pub const SCHEMA_VERSION: u32 = 1;

/// Complete run report
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub meta: ReportMeta,
    pub problems: Vec<ProblemReport>,
    pub summary: ReportSummary,
}

/// Report metadata
#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub schema_version: u32,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub config: ReportConfig,
}

/// Run settings captured in report metadata
#[derive(Debug, Clone, Serialize)]
pub struct ReportConfig {
    pub check: bool,
    pub strict: bool,
    /// Base per-method timeout; 0 when disabled
    pub timeout_ms: f64,
    pub preload: bool,
    pub isolation: IsolationMode,
}

/// Outcome of one problem
#[derive(Debug, Clone, Serialize)]
pub struct ProblemReport {
    pub id: u32,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<Answer>,
    /// Present only when answers were checked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best: Option<String>,
    pub timeout_ext_ms: f64,
    pub total_ms: f64,
    pub attempts: Vec<AttemptRecord>,
}

impl ProblemReport {
    /// Snapshot of a solved problem
    pub fn from_solver(solver: &ProblemSolver, check: bool, strict: bool) -> Self {
        Self {
            id: solver.id,
            title: solver.title.clone(),
            answer: solver.answer,
            correct: check.then(|| solver.is_correct(strict)),
            best: solver.find_best_method(check).map(str::to_string),
            timeout_ext_ms: solver.timeout_ext_ms,
            total_ms: solver.total_elapsed_ms(),
            attempts: solver.attempts().cloned().collect(),
        }
    }
}

/// Run totals
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportSummary {
    pub problems: usize,
    pub methods: usize,
    /// Problems judged correct; only meaningful when answers were checked
    pub solved: usize,
    pub timed_out: usize,
    pub recycled_workers: usize,
    pub elapsed_secs: f64,
    pub interrupted: bool,
}

impl RunReport {
    /// Empty report stamped with the current time
    pub fn new(config: ReportConfig) -> Self {
        Self {
            meta: ReportMeta {
                schema_version: SCHEMA_VERSION,
                version: env!("CARGO_PKG_VERSION").to_string(),
                timestamp: Utc::now(),
                config,
            },
            problems: Vec::new(),
            summary: ReportSummary::default(),
        }
    }

    /// Append a problem and update the totals
    pub fn push(&mut self, problem: ProblemReport) {
        self.summary.problems += 1;
        self.summary.methods += problem.attempts.len();
        self.summary.timed_out += problem.attempts.iter().filter(|a| a.is_timed_out()).count();
        if problem.correct == Some(true) {
            self.summary.solved += 1;
        }
        self.problems.push(problem);
    }
}

/// Serialize a report as pretty-printed JSON
pub fn generate_json_report(report: &RunReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}
