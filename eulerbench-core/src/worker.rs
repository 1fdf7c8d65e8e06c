//! Worker Process Entry Point
//!
//! The worker side of the supervisor-worker split. The harness binary is
//! re-executed with `--euler-worker`; the child resolves methods in its own
//! copy of the registry and answers one command at a time.
//!
//! On Unix the supervisor passes a pipe pair on fd 3/4 (announced via
//! `EULER_IPC_FD`). Without it the worker falls back to stdin/stdout.

use crate::{WorkerState, find_data, find_method};
use eulerbench_ipc::{
    FailureKind, FrameError, FrameReader, FrameWriter, IPC_FD_ENV, JobSpec, SupervisorCommand,
    WorkerCapabilities, WorkerMessage,
};

#[cfg(unix)]
use std::os::unix::io::FromRawFd;

/// Ignore SIGINT in this process.
///
/// A Ctrl+C in the terminal reaches the whole process group; the supervisor
/// decides what to do with it and kills the worker itself.
#[cfg(unix)]
pub fn ignore_interrupts() {
    unsafe {
        libc::signal(libc::SIGINT, libc::SIG_IGN);
    }
}

/// No-op on non-Unix.
#[cfg(not(unix))]
pub fn ignore_interrupts() {}

/// IPC transport: either inherited fd pair or stdin/stdout fallback.
enum IpcTransport {
    #[cfg(unix)]
    Fds {
        read_fd: i32,
        write_fd: i32,
    },
    Stdio,
}

fn detect_transport() -> IpcTransport {
    #[cfg(unix)]
    if let Ok(val) = std::env::var(IPC_FD_ENV) {
        if let Some((r, w)) = val.split_once(',') {
            if let (Ok(read_fd), Ok(write_fd)) = (r.parse::<i32>(), w.parse::<i32>()) {
                return IpcTransport::Fds { read_fd, write_fd };
            }
        }
        eprintln!(
            "eulerbench: warning: invalid {IPC_FD_ENV}={val:?} (expected <read_fd>,<write_fd>), falling back to stdio"
        );
    }
    IpcTransport::Stdio
}

/// Worker main loop
pub struct WorkerMain {
    reader: FrameReader<Box<dyn std::io::Read>>,
    writer: FrameWriter<Box<dyn std::io::Write>>,
    state: WorkerState,
}

impl WorkerMain {
    /// Create a worker on the transport announced by the supervisor
    pub fn new() -> Self {
        let (reader, writer): (Box<dyn std::io::Read>, Box<dyn std::io::Write>) =
            match detect_transport() {
                #[cfg(unix)]
                IpcTransport::Fds { read_fd, write_fd } => unsafe {
                    (
                        Box::new(std::fs::File::from_raw_fd(read_fd)),
                        Box::new(std::fs::File::from_raw_fd(write_fd)),
                    )
                },
                IpcTransport::Stdio => (Box::new(std::io::stdin()), Box::new(std::io::stdout())),
            };
        Self {
            reader: FrameReader::new(reader),
            writer: FrameWriter::new(writer),
            state: WorkerState::new(),
        }
    }

    /// Serve commands until `Shutdown` or until the supervisor hangs up
    pub fn run(&mut self) -> Result<(), FrameError> {
        ignore_interrupts();

        self.writer
            .write(&WorkerMessage::Hello(WorkerCapabilities::default()))?;

        loop {
            let command: SupervisorCommand = match self.reader.read() {
                Ok(command) => command,
                Err(FrameError::EndOfStream) => break,
                Err(e) => return Err(e),
            };

            let reply = match command {
                SupervisorCommand::Run(job) => self.run_method(&job),
                SupervisorCommand::BeginProblem { source, preload } => {
                    let loader = find_data(&source).map(|d| d.loader);
                    WorkerMessage::ProblemReady(self.state.begin_problem(loader, preload))
                }
                SupervisorCommand::EndProblem => {
                    self.state.end_problem();
                    WorkerMessage::ProblemReleased
                }
                SupervisorCommand::Ping => WorkerMessage::Pong,
                SupervisorCommand::Shutdown => break,
            };
            self.writer.write(&reply)?;
        }

        Ok(())
    }

    fn run_method(&self, job: &JobSpec) -> WorkerMessage {
        match find_method(&job.source, &job.method) {
            Some(method) => self.state.run(method.runner_fn).into_message(),
            None => WorkerMessage::Failure {
                kind: FailureKind::NotFound,
                message: format!("method not found: {}::{}", job.source, job.method),
            },
        }
    }
}

impl Default for WorkerMain {
    fn default() -> Self {
        Self::new()
    }
}
