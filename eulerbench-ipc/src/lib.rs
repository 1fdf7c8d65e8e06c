#![warn(missing_docs)]
//! eulerbench IPC Protocol
//!
//! Wire protocol between the supervisor (the harness driving a run) and the
//! single worker process that executes solution methods on its behalf.
//!
//! Messages are rkyv archives carried in length-prefixed frames over a pipe
//! pair. Every command except [`SupervisorCommand::Shutdown`] is answered by
//! exactly one [`WorkerMessage`], so the supervisor can treat each exchange as
//! a blocking request with a deadline.

mod framing;
mod messages;

pub use framing::{FrameError, FrameReader, FrameWriter, MAX_FRAME_SIZE, read_frame, write_frame};
pub use messages::{
    DataStatus, FailureKind, JobSpec, SupervisorCommand, WorkerCapabilities, WorkerMessage,
};

/// Protocol version for compatibility checking
pub const PROTOCOL_VERSION: u32 = 1;

/// Environment variable carrying the inherited `<read_fd>,<write_fd>` pair
pub const IPC_FD_ENV: &str = "EULER_IPC_FD";

/// Hidden command-line switch that puts a harness binary into worker mode
pub const WORKER_FLAG: &str = "--euler-worker";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_flag_is_long_option() {
        assert!(WORKER_FLAG.starts_with("--"));
        assert!(!WORKER_FLAG.contains('='));
    }
}
