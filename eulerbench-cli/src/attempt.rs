//! Work items and attempt records
//!
//! A [`WorkItem`] is one registered method of one problem. Running it through
//! the engine yields an [`AttemptRecord`].

use eulerbench_core::{Answer, MethodFn};
use eulerbench_ipc::JobSpec;
use serde::Serialize;

/// One executable method of a problem
#[derive(Debug, Clone)]
pub struct WorkItem {
    /// Owning problem id
    pub problem_id: u32,
    /// Method key: `""` for `solve`, `<suffix>` for `solve_<suffix>`
    pub key: String,
    /// Function name as registered
    pub name: String,
    /// Method documentation
    pub note: String,
    /// Source file the method was registered from
    pub source: String,
    /// Source line of the method
    pub line: u32,
    /// Wrapped method
    pub runner: MethodFn,
}

impl WorkItem {
    /// Work item with empty documentation and an unknown location
    pub fn new(problem_id: u32, key: impl Into<String>, runner: MethodFn) -> Self {
        let key = key.into();
        let name = if key.is_empty() {
            "solve".to_string()
        } else {
            format!("solve_{key}")
        };
        Self {
            problem_id,
            key,
            name,
            note: String::new(),
            source: String::new(),
            line: 0,
            runner,
        }
    }

    /// Attach documentation
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    /// Display title: first line of the note, else the function name
    pub fn title(&self) -> &str {
        self.note
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or(&self.name)
    }

    /// Identity of this method inside a worker process
    pub fn job_spec(&self) -> JobSpec {
        JobSpec {
            source: self.source.clone(),
            method: self.name.clone(),
        }
    }
}

/// Terminal state of one attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum AttemptState {
    /// The method returned an answer
    Completed(Answer),
    /// The method returned nothing, failed, or its worker died
    CompletedNoValue,
    /// The deadline elapsed first
    TimedOut,
}

/// Timed outcome of one execution of a [`WorkItem`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptRecord {
    /// Method key of the work item
    pub key: String,
    /// Terminal state
    #[serde(flatten)]
    pub state: AttemptState,
    /// Wall-clock milliseconds from submission to result, or to abandonment
    pub elapsed_ms: f64,
    /// Failure text when the method panicked, returned an error, or crashed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl AttemptRecord {
    /// Record for `key` in `state`
    pub fn new(key: impl Into<String>, state: AttemptState, elapsed_ms: f64) -> Self {
        Self {
            key: key.into(),
            state,
            elapsed_ms: elapsed_ms.max(0.0),
            failure: None,
        }
    }

    /// Attach a failure message
    pub fn with_failure(mut self, failure: impl Into<String>) -> Self {
        self.failure = Some(failure.into());
        self
    }

    /// Whether the deadline elapsed
    pub fn is_timed_out(&self) -> bool {
        matches!(self.state, AttemptState::TimedOut)
    }

    /// Produced answer; never inspected for timed-out attempts
    pub fn value(&self) -> Option<Answer> {
        match self.state {
            AttemptState::Completed(v) => Some(v),
            AttemptState::CompletedNoValue | AttemptState::TimedOut => None,
        }
    }
}
