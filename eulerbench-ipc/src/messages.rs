//! IPC Message Types
//!
//! All messages are serialized with rkyv and validated on receipt.

use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};

/// Identity of one registered solution method inside the harness binary.
///
/// Both processes run the same executable, so the source file recorded at
/// registration time plus the method's function name locate the same entry
/// in the worker's registry.
#[derive(Debug, Clone, PartialEq, Eq, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub struct JobSpec {
    /// Source file the method was registered from (`file!()`)
    pub source: String,
    /// Function name of the method (`solve`, `solve_<suffix>`)
    pub method: String,
}

/// Worker capabilities advertised during handshake
#[derive(Debug, Clone, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub struct WorkerCapabilities {
    /// Protocol version for compatibility
    pub protocol_version: u32,
    /// Operating system process id of the worker
    pub pid: u32,
}

impl Default for WorkerCapabilities {
    fn default() -> Self {
        Self {
            protocol_version: crate::PROTOCOL_VERSION,
            pid: std::process::id(),
        }
    }
}

/// State of a problem's data set after `BeginProblem`
#[derive(Debug, Clone, PartialEq, Eq, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub enum DataStatus {
    /// The problem has no registered data loader
    Absent,
    /// Data was loaded ahead of the first method
    Preloaded,
    /// Data will be loaded lazily inside each timed method call
    Deferred,
    /// Preloading failed; methods fall back to lazy loading
    Unavailable {
        /// Loader error message
        message: String,
    },
}

/// Categories of method failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub enum FailureKind {
    /// Rust panic (caught)
    Panic,
    /// The method returned an error value
    Error,
    /// No method with the requested identity is registered in the worker
    NotFound,
}

/// Messages sent from Worker to Supervisor
#[derive(Debug, Clone, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub enum WorkerMessage {
    /// Initial handshake with worker capabilities
    Hello(WorkerCapabilities),

    /// Reply to [`SupervisorCommand::Ping`]
    Pong,

    /// Reply to [`SupervisorCommand::BeginProblem`]
    ProblemReady(DataStatus),

    /// Reply to [`SupervisorCommand::EndProblem`]
    ProblemReleased,

    /// Method returned normally
    Completed {
        /// Produced answer, `None` when the method produced no value
        value: Option<i64>,
        /// Time spent inside the method, as seen by the worker
        compute_nanos: u64,
    },

    /// Method failed
    Failure {
        /// Error category
        kind: FailureKind,
        /// Human-readable error message
        message: String,
    },
}

/// Commands sent from Supervisor to Worker
#[derive(Debug, Clone, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub enum SupervisorCommand {
    /// Run one solution method
    Run(JobSpec),

    /// Attach the data set of the problem registered in `source`
    BeginProblem {
        /// Source file of the problem
        source: String,
        /// Load the data now instead of inside each method call
        preload: bool,
    },

    /// Drop the attached data set
    EndProblem,

    /// No-op round trip, used to warm a fresh worker
    Ping,

    /// Exit the worker loop
    Shutdown,
}
