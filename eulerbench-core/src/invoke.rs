//! Method Invocation
//!
//! Runs one solution method with panic catching and timing. Shared by the
//! out-of-process worker loop and the in-process thread worker.

use crate::{Answer, DataHandle, DataLoaderFn, MethodFn};
use eulerbench_ipc::{DataStatus, FailureKind, WorkerMessage};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Instant;

/// What a single method call produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodOutcome {
    /// Returned an answer
    Value(Answer),
    /// Returned normally without a value
    NoValue,
    /// Panicked or returned an error
    Failed {
        /// True when the method panicked
        panicked: bool,
        /// Panic payload or error text
        message: String,
    },
}

/// Outcome plus the time spent inside the method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Result of the call
    pub outcome: MethodOutcome,
    /// Nanoseconds spent inside the call
    pub compute_nanos: u64,
}

impl Invocation {
    /// Encode as the reply sent back to the supervisor
    pub fn into_message(self) -> WorkerMessage {
        match self.outcome {
            MethodOutcome::Value(v) => WorkerMessage::Completed {
                value: Some(v),
                compute_nanos: self.compute_nanos,
            },
            MethodOutcome::NoValue => WorkerMessage::Completed {
                value: None,
                compute_nanos: self.compute_nanos,
            },
            MethodOutcome::Failed { panicked, message } => WorkerMessage::Failure {
                kind: if panicked {
                    FailureKind::Panic
                } else {
                    FailureKind::Error
                },
                message,
            },
        }
    }
}

/// Call `runner` with `data`, catching panics
pub fn invoke_method(runner: MethodFn, data: &DataHandle) -> Invocation {
    let start = Instant::now();
    let result = catch_unwind(AssertUnwindSafe(|| runner(data)));
    let compute_nanos = start.elapsed().as_nanos() as u64;

    let outcome = match result {
        Ok(Ok(Some(value))) => MethodOutcome::Value(value),
        Ok(Ok(None)) => MethodOutcome::NoValue,
        Ok(Err(message)) => MethodOutcome::Failed {
            panicked: false,
            message,
        },
        Err(panic) => {
            let message = if let Some(s) = panic.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            MethodOutcome::Failed {
                panicked: true,
                message,
            }
        }
    };

    Invocation {
        outcome,
        compute_nanos,
    }
}

/// Data attached to a worker for the problem currently being solved
#[derive(Debug, Default)]
pub struct WorkerState {
    data: DataHandle,
    preload: bool,
}

impl WorkerState {
    /// Empty state, no problem attached
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a problem's data loader, loading it now when `preload` is set
    pub fn begin_problem(&mut self, loader: Option<DataLoaderFn>, preload: bool) -> DataStatus {
        self.data = DataHandle::new(loader);
        self.preload = preload;

        if !self.data.has_loader() {
            return DataStatus::Absent;
        }
        if !preload {
            return DataStatus::Deferred;
        }
        match self.data.preload() {
            Ok(_) => DataStatus::Preloaded,
            Err(e) => DataStatus::Unavailable {
                message: e.to_string(),
            },
        }
    }

    /// Drop the attached data
    pub fn end_problem(&mut self) {
        self.data = DataHandle::none();
        self.preload = false;
    }

    /// Run one method against the attached data.
    ///
    /// Without preloading the cache is cleared first so loading is part of
    /// the measured call.
    pub fn run(&self, runner: MethodFn) -> Invocation {
        if !self.preload {
            self.data.reset();
        }
        invoke_method(runner, &self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DataError, Dataset, IntoAnswer, MethodResult, into_dataset};

    fn answer_42(_: &DataHandle) -> MethodResult {
        42u32.into_answer()
    }

    fn nothing(_: &DataHandle) -> MethodResult {
        ().into_answer()
    }

    fn explode(_: &DataHandle) -> MethodResult {
        panic!("division by zero in sieve")
    }

    fn refuse(_: &DataHandle) -> MethodResult {
        Err::<u64, _>("not implemented").into_answer()
    }

    fn word_count(data: &DataHandle) -> MethodResult {
        let words = data.load::<Vec<&'static str>>().map_err(|e| e.to_string())?;
        words.len().into_answer()
    }

    fn words() -> Result<Dataset, DataError> {
        into_dataset(Ok::<_, String>(vec!["ALONSO", "MARY", "COLIN"]))
    }

    fn broken() -> Result<Dataset, DataError> {
        into_dataset(Err::<Vec<&'static str>, _>("truncated file"))
    }

    #[test]
    fn test_outcomes() {
        let data = DataHandle::none();
        assert_eq!(
            invoke_method(answer_42, &data).outcome,
            MethodOutcome::Value(42)
        );
        assert_eq!(invoke_method(nothing, &data).outcome, MethodOutcome::NoValue);
        assert_eq!(
            invoke_method(refuse, &data).outcome,
            MethodOutcome::Failed {
                panicked: false,
                message: "not implemented".to_string()
            }
        );
    }

    #[test]
    fn test_panic_is_caught() {
        let data = DataHandle::none();
        let invocation = invoke_method(explode, &data);
        match invocation.outcome {
            MethodOutcome::Failed { panicked, message } => {
                assert!(panicked);
                assert!(message.contains("division by zero"));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn test_failure_message_kind() {
        let data = DataHandle::none();
        match invoke_method(explode, &data).into_message() {
            WorkerMessage::Failure { kind, .. } => assert_eq!(kind, FailureKind::Panic),
            other => panic!("unexpected message {other:?}"),
        }
        match invoke_method(nothing, &data).into_message() {
            WorkerMessage::Completed { value, .. } => assert_eq!(value, None),
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn test_problem_data_lifecycle() {
        let mut state = WorkerState::new();
        assert_eq!(state.begin_problem(None, true), DataStatus::Absent);
        assert_eq!(state.begin_problem(Some(words), true), DataStatus::Preloaded);
        assert_eq!(state.run(word_count).outcome, MethodOutcome::Value(3));

        assert_eq!(state.begin_problem(Some(words), false), DataStatus::Deferred);
        assert_eq!(state.run(word_count).outcome, MethodOutcome::Value(3));

        state.end_problem();
        assert!(matches!(
            state.run(word_count).outcome,
            MethodOutcome::Failed { panicked: false, .. }
        ));
    }

    #[test]
    fn test_failed_preload_is_reported() {
        let mut state = WorkerState::new();
        match state.begin_problem(Some(broken), true) {
            DataStatus::Unavailable { message } => assert!(message.contains("truncated file")),
            other => panic!("unexpected status {other:?}"),
        }
    }
}
