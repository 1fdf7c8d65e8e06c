//! Solution Aggregator
//!
//! A [`ProblemSolver`] owns the competing methods of one problem, drives them
//! through the [`ExecutionEngine`] and answers correctness and ranking
//! questions from the latest attempt of each method. Verdicts are computed
//! from the current records on every call.

use crate::attempt::{AttemptRecord, WorkItem};
use crate::engine::{EngineError, ExecutionEngine, ProblemBinding};
use eulerbench_core::{Answer, DataLoaderFn};
use std::collections::HashMap;
use thiserror::Error;

/// A problem definition that cannot be used
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("{name}: file name must look like p<number>.rs")]
    Naming { name: String },

    #[error("{name}: no #[eulerbench::problem] metadata registered")]
    MissingProblem { name: String },

    #[error("{name}: problem metadata registered more than once")]
    DuplicateProblem { name: String },

    #[error("{name}: documentation needs a title line followed by a description")]
    InvalidDocument { name: String },

    #[error("{name}: method `{key}` already exists")]
    DuplicateMethod { name: String, key: String },

    #[error("{name}: data loader registered more than once")]
    DuplicateData { name: String },
}

/// Methods, attempts and verdicts of one problem
#[derive(Debug, Clone)]
pub struct ProblemSolver {
    /// Problem id
    pub id: u32,
    /// First line of the problem documentation
    pub title: String,
    /// Remaining documentation
    pub content: String,
    /// Expected answer, if known
    pub answer: Option<Answer>,
    /// Extra milliseconds added to every method's timeout
    pub timeout_ext_ms: f64,
    /// Source file of the problem
    pub source: String,
    /// Data loader of the problem
    pub data: Option<DataLoaderFn>,
    methods: Vec<WorkItem>,
    attempts: HashMap<String, AttemptRecord>,
}

impl ProblemSolver {
    /// Solver for problem `id` without methods
    pub fn new(id: u32, source: impl Into<String>) -> Self {
        Self {
            id,
            title: String::new(),
            content: String::new(),
            answer: None,
            timeout_ext_ms: 0.0,
            source: source.into(),
            data: None,
            methods: Vec::new(),
            attempts: HashMap::new(),
        }
    }

    /// Set title and content from documentation text.
    ///
    /// The first non-blank line is the title; at least one more line must follow.
    pub fn set_document(&mut self, doc: &str) -> Result<(), DefinitionError> {
        let mut lines = doc.trim().lines();
        let title = lines.next().map(str::trim).unwrap_or_default();
        let rest: Vec<&str> = lines.collect();
        if title.is_empty() || rest.is_empty() {
            return Err(DefinitionError::InvalidDocument {
                name: self.source.clone(),
            });
        }
        self.title = title.to_string();
        self.content = rest.join("\n").trim().to_string();
        Ok(())
    }

    /// Register a method; keys must be unique
    pub fn add_method(&mut self, item: WorkItem) -> Result<(), DefinitionError> {
        if self.methods.iter().any(|m| m.key == item.key) {
            return Err(DefinitionError::DuplicateMethod {
                name: self.source.clone(),
                key: item.key,
            });
        }
        self.methods.push(item);
        Ok(())
    }

    /// Methods in registration order
    pub fn methods(&self) -> &[WorkItem] {
        &self.methods
    }

    /// Latest attempt of method `key`
    pub fn attempt(&self, key: &str) -> Option<&AttemptRecord> {
        self.attempts.get(key)
    }

    /// Latest attempts in registration order
    pub fn attempts(&self) -> impl Iterator<Item = &AttemptRecord> {
        self.methods.iter().filter_map(move |m| self.attempts.get(&m.key))
    }

    /// Store `record` as the latest attempt of its method
    pub fn record_attempt(&mut self, record: AttemptRecord) {
        self.attempts.insert(record.key.clone(), record);
    }

    /// Sum of the latest attempts' elapsed times
    pub fn total_elapsed_ms(&self) -> f64 {
        self.attempts().map(|a| a.elapsed_ms).sum()
    }

    /// Run every method matching `method_filter` (all when `None`).
    pub fn solve(
        &mut self,
        method_filter: Option<&str>,
        timeout_ms: f64,
        preload: bool,
        engine: &mut ExecutionEngine,
    ) -> Result<(), EngineError> {
        self.solve_with(method_filter, timeout_ms, preload, engine, |_| {})
    }

    /// [`ProblemSolver::solve`], calling `on_start` before each submission
    pub fn solve_with<F>(
        &mut self,
        method_filter: Option<&str>,
        timeout_ms: f64,
        preload: bool,
        engine: &mut ExecutionEngine,
        mut on_start: F,
    ) -> Result<(), EngineError>
    where
        F: FnMut(&WorkItem),
    {
        let selected: Vec<usize> = self
            .methods
            .iter()
            .enumerate()
            .filter(|(_, m)| method_filter.is_none_or(|key| m.key == key))
            .map(|(i, _)| i)
            .collect();
        if selected.is_empty() {
            if let Some(key) = method_filter {
                tracing::warn!(problem = self.id, "no method `{key}`");
            }
            return Ok(());
        }

        let deadline_ms = if timeout_ms > 0.0 {
            timeout_ms + self.timeout_ext_ms
        } else {
            0.0
        };

        let mut scope = engine.scope(ProblemBinding {
            source: self.source.clone(),
            loader: self.data,
            preload,
        })?;
        for index in selected {
            let item = &self.methods[index];
            on_start(item);
            let record = scope.run(item, deadline_ms)?;
            self.attempts.insert(item.key.clone(), record);
        }
        Ok(())
    }

    fn matches_answer(&self, value: Answer) -> bool {
        self.answer.is_none_or(|a| a == value)
    }

    /// Values of attempts that finished with a value, in registration order
    fn completed(&self) -> impl Iterator<Item = (&AttemptRecord, Answer)> {
        self.attempts()
            .filter(|a| !a.is_timed_out())
            .filter_map(|a| a.value().map(|v| (a, v)))
    }

    /// Correctness verdict.
    ///
    /// Loose: some completed value matches the expected answer (any value when
    /// none is known). Strict: every completed value matches. Timed-out
    /// attempts count for neither.
    pub fn is_correct(&self, strict: bool) -> bool {
        if strict {
            self.completed().all(|(_, v)| self.matches_answer(v))
        } else {
            self.completed().any(|(_, v)| self.matches_answer(v))
        }
    }

    /// Key of the fastest completed method, restricted to correct ones when
    /// `require_correct` is set. Equal times go to the earlier-registered method.
    pub fn find_best_method(&self, require_correct: bool) -> Option<&str> {
        let mut best: Option<&AttemptRecord> = None;
        for (attempt, value) in self.completed() {
            if require_correct && !self.matches_answer(value) {
                continue;
            }
            if best.is_none_or(|b| attempt.elapsed_ms < b.elapsed_ms) {
                best = Some(attempt);
            }
        }
        best.map(|a| a.key.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attempt::AttemptState;
    use crate::interrupt::Interrupt;
    use eulerbench_core::{DataHandle, MethodResult};
    use std::sync::atomic::AtomicBool;

    fn zero(_: &DataHandle) -> MethodResult {
        Ok(Some(0))
    }

    fn expected(_: &DataHandle) -> MethodResult {
        Ok(Some(233168))
    }

    fn wrong(_: &DataHandle) -> MethodResult {
        Ok(Some(233169))
    }

    fn solver(answer: Option<Answer>, keys: &[&str]) -> ProblemSolver {
        let mut solver = ProblemSolver::new(1, "problems/p0001.rs");
        solver.answer = answer;
        for key in keys {
            solver.add_method(WorkItem::new(1, *key, zero)).unwrap();
        }
        solver
    }

    fn completed(key: &str, value: Answer, elapsed_ms: f64) -> AttemptRecord {
        AttemptRecord::new(key, AttemptState::Completed(value), elapsed_ms)
    }

    fn engine() -> ExecutionEngine {
        let flag: &'static AtomicBool = Box::leak(Box::new(AtomicBool::new(false)));
        ExecutionEngine::with_threads(Interrupt::from_flag(flag)).unwrap()
    }

    #[test]
    fn test_document_needs_title_and_content() {
        let mut s = solver(None, &[]);
        s.set_document("\n  Multiples of 3 or 5\n\n  Find the sum below 1000.\n")
            .unwrap();
        assert_eq!(s.title, "Multiples of 3 or 5");
        assert_eq!(s.content, "Find the sum below 1000.");

        assert!(matches!(
            s.set_document("Only a title"),
            Err(DefinitionError::InvalidDocument { .. })
        ));
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let mut s = solver(None, &["", "formula"]);
        let err = s.add_method(WorkItem::new(1, "formula", zero)).unwrap_err();
        assert!(matches!(err, DefinitionError::DuplicateMethod { ref key, .. } if key == "formula"));
        assert_eq!(s.methods().len(), 2);
    }

    #[test]
    fn test_loose_and_strict() {
        let mut s = solver(Some(233168), &["a", "b"]);
        s.record_attempt(completed("a", 233168, 10.0));
        s.record_attempt(completed("b", 1, 5.0));

        assert!(s.is_correct(false));
        assert!(!s.is_correct(true));
        assert_eq!(s.find_best_method(true), Some("a"));
        assert_eq!(s.find_best_method(false), Some("b"));
    }

    #[test]
    fn test_without_expected_answer_any_value_counts() {
        let mut s = solver(None, &["a", "b"]);
        s.record_attempt(completed("a", 42, 3.0));
        s.record_attempt(completed("b", -7, 2.0));
        assert!(s.is_correct(false));
        assert!(s.is_correct(true));
        assert_eq!(s.find_best_method(true), Some("b"));
    }

    #[test]
    fn test_timeouts_are_neither_pass_nor_fail() {
        let mut s = solver(Some(5), &["", "slow"]);
        s.record_attempt(AttemptRecord::new("", AttemptState::TimedOut, 50.0));
        assert!(!s.is_correct(false));
        assert!(s.is_correct(true));
        assert_eq!(s.find_best_method(false), None);

        s.record_attempt(completed("slow", 5, 40.0));
        assert!(s.is_correct(false));
        assert!(s.is_correct(true));
        assert_eq!(s.find_best_method(true), Some("slow"));
    }

    #[test]
    fn test_no_value_is_ignored() {
        let mut s = solver(Some(5), &["", "empty"]);
        s.record_attempt(AttemptRecord::new("empty", AttemptState::CompletedNoValue, 1.0));
        assert!(!s.is_correct(false));
        assert!(s.is_correct(true));
        s.record_attempt(completed("", 5, 2.0));
        assert_eq!(s.find_best_method(false), Some(""));
    }

    #[test]
    fn test_tie_goes_to_first_registered() {
        let mut s = solver(Some(9), &["first", "second"]);
        // Record in reverse to make sure registration order, not insertion, decides
        s.record_attempt(completed("second", 9, 4.0));
        s.record_attempt(completed("first", 9, 4.0));
        assert_eq!(s.find_best_method(true), Some("first"));
    }

    #[test]
    fn test_solve_is_idempotent() {
        let mut engine = engine();
        let mut s = ProblemSolver::new(1, "problems/p0001.rs");
        s.answer = Some(233168);
        s.add_method(WorkItem::new(1, "", expected)).unwrap();
        s.add_method(WorkItem::new(1, "off_by_one", wrong)).unwrap();

        s.solve(None, 1000.0, true, &mut engine).unwrap();
        s.solve(None, 1000.0, true, &mut engine).unwrap();

        assert_eq!(s.methods().len(), 2);
        assert_eq!(s.attempts().count(), 2);
        assert!(s.is_correct(false));
        assert!(!s.is_correct(true));
        assert_eq!(s.find_best_method(true), Some(""));
    }

    #[test]
    fn test_method_filter_leaves_others_absent() {
        let mut engine = engine();
        let mut s = ProblemSolver::new(1, "problems/p0001.rs");
        s.add_method(WorkItem::new(1, "", expected)).unwrap();
        s.add_method(WorkItem::new(1, "off_by_one", wrong)).unwrap();

        let mut started = Vec::new();
        s.solve_with(Some("off_by_one"), 0.0, true, &mut engine, |item| {
            started.push(item.key.clone())
        })
        .unwrap();

        assert_eq!(started, vec!["off_by_one".to_string()]);
        assert!(s.attempt("").is_none());
        assert_eq!(
            s.attempt("off_by_one").map(|a| a.state),
            Some(AttemptState::Completed(233169))
        );
    }
}
