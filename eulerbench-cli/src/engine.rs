//! Execution Engine
//!
//! Runs one work item at a time on a single persistent worker and enforces
//! the per-method deadline. A method that misses its deadline is never
//! interrupted in place: the whole worker is thrown away and a fresh one is
//! spawned and warmed up before the next submission.
//!
//! The worker sits behind [`WorkerContext`]. [`ProcessWorker`] re-executes the
//! current binary in worker mode and talks rkyv frames over a pipe pair on
//! fd 3/4; recycling it kills the child. [`ThreadWorker`] runs methods on a
//! dedicated thread; recycling detaches it, so a runaway method keeps its core
//! busy but can no longer reach the engine.

use crate::attempt::{AttemptRecord, AttemptState, WorkItem};
use crate::interrupt::Interrupt;
use eulerbench_core::{DataLoaderFn, Invocation, MethodFn, MethodOutcome, WorkerState};
use eulerbench_ipc::{
    DataStatus, FailureKind, FrameError, FrameReader, FrameWriter, IPC_FD_ENV, PROTOCOL_VERSION,
    SupervisorCommand, WORKER_FLAG, WorkerMessage,
};
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};
use thiserror::Error;

#[cfg(unix)]
use std::os::unix::io::{FromRawFd, RawFd};
#[cfg(unix)]
use std::os::unix::process::CommandExt;
#[cfg(unix)]
use std::process::{Child, Command, Stdio};

/// Longest single wait; bounds how late an interrupt or deadline is noticed
const WAIT_SLICE: Duration = Duration::from_millis(100);
/// Bound on the warm-up round trip of a fresh worker
const WARMUP_TIMEOUT: Duration = Duration::from_secs(10);
/// Bound on attaching or releasing problem data
const CONTROL_TIMEOUT: Duration = Duration::from_secs(30);

/// Failures of a single worker exchange
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("deadline elapsed")]
    Timeout,

    #[error("interrupted by operator")]
    Aborted,

    #[error("worker crashed: {0}")]
    Crashed(String),

    #[error("IPC error: {0}")]
    Ipc(String),

    #[error("failed to spawn worker: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("worker protocol error: expected {expected}, got {got}")]
    Protocol { expected: String, got: String },
}

impl From<FrameError> for WorkerError {
    fn from(e: FrameError) -> Self {
        match e {
            FrameError::EndOfStream => {
                WorkerError::Crashed("worker closed connection unexpectedly".to_string())
            }
            other => WorkerError::Ipc(other.to_string()),
        }
    }
}

/// Failures that end a run
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("run interrupted by operator")]
    Aborted,

    #[error("cannot start a worker: {0}")]
    Spawn(WorkerError),
}

/// What the worker is asked to do
#[derive(Debug, Clone, Copy)]
pub enum Request<'a> {
    /// Run a method
    Run(&'a WorkItem),
    /// Attach a problem's data
    BeginProblem(&'a ProblemBinding),
    /// Drop the attached data
    EndProblem,
    /// No-op round trip
    Ping,
}

/// What the worker answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Method finished (normally or not)
    Finished(Invocation),
    /// Problem data attached
    ProblemReady(DataStatus),
    /// Problem data dropped
    ProblemReleased,
    /// Answer to a ping
    Pong,
}

/// Data a problem attaches to the worker for the duration of its pass
#[derive(Debug, Clone)]
pub struct ProblemBinding {
    /// Source file the problem was registered from
    pub source: String,
    /// Data loader registered in that file
    pub loader: Option<DataLoaderFn>,
    /// Load before the first method instead of inside each call
    pub preload: bool,
}

/// A replaceable execution context for one method at a time
pub trait WorkerContext {
    /// Short identity for logs (pid or thread ordinal)
    fn id(&self) -> u32;

    /// Hand a request to the worker without waiting for its answer
    fn send(&mut self, request: Request<'_>) -> Result<(), WorkerError>;

    /// Wait at most `slice` for the answer to the last request
    fn poll(&mut self, slice: Duration) -> Result<Option<Reply>, WorkerError>;

    /// Stop the worker now, whatever it is doing
    fn terminate(&mut self);
}

/// Creates worker contexts
pub trait WorkerFactory {
    /// Spawn worker number `ordinal`
    fn spawn(&self, ordinal: usize) -> Result<Box<dyn WorkerContext>, WorkerError>;
}

// ============================================================================
// Thread worker
// ============================================================================

enum ThreadCommand {
    Run(MethodFn),
    BeginProblem {
        loader: Option<DataLoaderFn>,
        preload: bool,
    },
    EndProblem,
    Ping,
    Shutdown,
}

/// Worker running methods on a dedicated thread of this process
pub struct ThreadWorker {
    ordinal: u32,
    commands: mpsc::Sender<ThreadCommand>,
    replies: mpsc::Receiver<Reply>,
}

impl ThreadWorker {
    /// Start the worker thread
    pub fn spawn(ordinal: usize) -> Result<Self, WorkerError> {
        let (command_tx, command_rx) = mpsc::channel::<ThreadCommand>();
        let (reply_tx, reply_rx) = mpsc::channel::<Reply>();

        std::thread::Builder::new()
            .name(format!("euler-worker-{ordinal}"))
            .spawn(move || {
                let mut state = WorkerState::new();
                while let Ok(command) = command_rx.recv() {
                    let reply = match command {
                        ThreadCommand::Run(runner) => Reply::Finished(state.run(runner)),
                        ThreadCommand::BeginProblem { loader, preload } => {
                            Reply::ProblemReady(state.begin_problem(loader, preload))
                        }
                        ThreadCommand::EndProblem => {
                            state.end_problem();
                            Reply::ProblemReleased
                        }
                        ThreadCommand::Ping => Reply::Pong,
                        ThreadCommand::Shutdown => break,
                    };
                    if reply_tx.send(reply).is_err() {
                        break;
                    }
                }
            })?;

        Ok(Self {
            ordinal: ordinal as u32,
            commands: command_tx,
            replies: reply_rx,
        })
    }
}

impl WorkerContext for ThreadWorker {
    fn id(&self) -> u32 {
        self.ordinal
    }

    fn send(&mut self, request: Request<'_>) -> Result<(), WorkerError> {
        let command = match request {
            Request::Run(item) => ThreadCommand::Run(item.runner),
            Request::BeginProblem(binding) => ThreadCommand::BeginProblem {
                loader: binding.loader,
                preload: binding.preload,
            },
            Request::EndProblem => ThreadCommand::EndProblem,
            Request::Ping => ThreadCommand::Ping,
        };
        self.commands
            .send(command)
            .map_err(|_| WorkerError::Crashed("worker thread has exited".to_string()))
    }

    fn poll(&mut self, slice: Duration) -> Result<Option<Reply>, WorkerError> {
        match self.replies.recv_timeout(slice) {
            Ok(reply) => Ok(Some(reply)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(WorkerError::Crashed(
                "worker thread has exited".to_string(),
            )),
        }
    }

    fn terminate(&mut self) {
        // A busy thread cannot be stopped; it exits once its reply has nowhere to go.
        let _ = self.commands.send(ThreadCommand::Shutdown);
    }
}

impl Drop for ThreadWorker {
    fn drop(&mut self) {
        let _ = self.commands.send(ThreadCommand::Shutdown);
    }
}

/// Factory for [`ThreadWorker`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadWorkerFactory;

impl WorkerFactory for ThreadWorkerFactory {
    fn spawn(&self, ordinal: usize) -> Result<Box<dyn WorkerContext>, WorkerError> {
        Ok(Box::new(ThreadWorker::spawn(ordinal)?))
    }
}

// ============================================================================
// Process worker
// ============================================================================

/// Result of polling for data
#[cfg(unix)]
#[derive(Debug)]
enum PollResult {
    DataAvailable,
    Timeout,
    PipeClosed,
    Error(std::io::Error),
}

/// Wait for data to be available on a file descriptor with timeout
#[cfg(unix)]
fn wait_for_data(fd: RawFd, timeout: Duration) -> PollResult {
    let mut pollfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };

    let timeout_ms = timeout.as_millis().min(i32::MAX as u128) as i32;
    let result = unsafe { libc::poll(&mut pollfd, 1, timeout_ms) };

    if result < 0 {
        let err = std::io::Error::last_os_error();
        if err.kind() == std::io::ErrorKind::Interrupted {
            // SIGINT landed during poll; the caller checks the interrupt flag.
            PollResult::Timeout
        } else {
            PollResult::Error(err)
        }
    } else if result == 0 {
        PollResult::Timeout
    } else if pollfd.revents & libc::POLLIN != 0 {
        PollResult::DataAvailable
    } else if pollfd.revents & (libc::POLLERR | libc::POLLHUP | libc::POLLNVAL) != 0 {
        PollResult::PipeClosed
    } else {
        PollResult::Timeout
    }
}

/// Lowest fd a pipe end may occupy; 3 and 4 are the worker's IPC targets.
#[cfg(unix)]
const PIPE_FD_FLOOR: RawFd = 10;

/// Create a close-on-exec pipe pair above [`PIPE_FD_FLOOR`], returning
/// (read_fd, write_fd).
#[cfg(unix)]
fn create_pipe() -> Result<(RawFd, RawFd), std::io::Error> {
    let mut fds = [0 as RawFd; 2];
    let ret = unsafe { libc::pipe(fds.as_mut_ptr()) };
    if ret != 0 {
        return Err(std::io::Error::last_os_error());
    }
    let read = match lift_fd(fds[0]) {
        Ok(fd) => fd,
        Err(e) => {
            close_fd(fds[1]);
            return Err(e);
        }
    };
    match lift_fd(fds[1]) {
        Ok(write) => Ok((read, write)),
        Err(e) => {
            close_fd(read);
            Err(e)
        }
    }
}

/// Move `fd` to the lowest free descriptor at or above [`PIPE_FD_FLOOR`]
/// with close-on-exec set; the original is closed either way.
#[cfg(unix)]
fn lift_fd(fd: RawFd) -> Result<RawFd, std::io::Error> {
    let lifted = unsafe { libc::fcntl(fd, libc::F_DUPFD_CLOEXEC, PIPE_FD_FLOOR) };
    if lifted < 0 {
        let err = std::io::Error::last_os_error();
        close_fd(fd);
        return Err(err);
    }
    close_fd(fd);
    Ok(lifted)
}

#[cfg(unix)]
fn close_fd(fd: RawFd) {
    unsafe {
        libc::close(fd);
    }
}

/// Worker running methods in a re-executed copy of the harness binary
#[cfg(unix)]
pub struct ProcessWorker {
    child: Child,
    reader: FrameReader<std::fs::File>,
    writer: FrameWriter<std::fs::File>,
    msg_read_fd: RawFd,
}

#[cfg(unix)]
impl ProcessWorker {
    /// Spawn `binary --euler-worker` with the command pipe on fd 3 and the
    /// message pipe on fd 4, then wait for its handshake.
    pub fn spawn(binary: &Path) -> Result<Self, WorkerError> {
        // cmd pipe: supervisor writes, worker reads fd 3
        let (cmd_read, cmd_write) = create_pipe()?;
        // msg pipe: worker writes fd 4, supervisor reads
        let (msg_read, msg_write) = match create_pipe() {
            Ok(fds) => fds,
            Err(e) => {
                close_fd(cmd_read);
                close_fd(cmd_write);
                return Err(WorkerError::Spawn(e));
            }
        };

        let mut command = Command::new(binary);
        command
            .arg(WORKER_FLAG)
            .env(IPC_FD_ENV, "3,4")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit());

        // All four ends sit above fd 4, so neither dup2 can clobber another end.
        unsafe {
            command.pre_exec(move || {
                if cmd_read != 3 {
                    libc::dup2(cmd_read, 3);
                    libc::close(cmd_read);
                }
                let flags = libc::fcntl(3, libc::F_GETFD);
                libc::fcntl(3, libc::F_SETFD, flags & !libc::FD_CLOEXEC);

                if msg_write != 4 {
                    libc::dup2(msg_write, 4);
                    libc::close(msg_write);
                }
                let flags = libc::fcntl(4, libc::F_GETFD);
                libc::fcntl(4, libc::F_SETFD, flags & !libc::FD_CLOEXEC);

                libc::close(cmd_write);
                libc::close(msg_read);
                Ok(())
            });
        }

        let child = match command.spawn() {
            Ok(c) => c,
            Err(e) => {
                close_fd(cmd_read);
                close_fd(cmd_write);
                close_fd(msg_read);
                close_fd(msg_write);
                return Err(WorkerError::Spawn(e));
            }
        };

        close_fd(cmd_read);
        close_fd(msg_write);

        let writer_file = unsafe { std::fs::File::from_raw_fd(cmd_write) };
        let reader_file = unsafe { std::fs::File::from_raw_fd(msg_read) };

        let mut worker = Self {
            child,
            reader: FrameReader::new(reader_file),
            writer: FrameWriter::new(writer_file),
            msg_read_fd: msg_read,
        };
        worker.wait_for_hello()?;
        Ok(worker)
    }

    fn wait_for_hello(&mut self) -> Result<(), WorkerError> {
        let start = Instant::now();
        let msg = loop {
            if let Some(msg) = self.poll_message(WAIT_SLICE)? {
                break msg;
            }
            if start.elapsed() >= WARMUP_TIMEOUT {
                return Err(WorkerError::Timeout);
            }
        };

        match msg {
            WorkerMessage::Hello(caps) if caps.protocol_version == PROTOCOL_VERSION => Ok(()),
            WorkerMessage::Hello(caps) => Err(WorkerError::Protocol {
                expected: format!("protocol version {PROTOCOL_VERSION}"),
                got: format!("protocol version {}", caps.protocol_version),
            }),
            other => Err(WorkerError::Protocol {
                expected: "Hello".to_string(),
                got: format!("{other:?}"),
            }),
        }
    }

    fn poll_message(&mut self, slice: Duration) -> Result<Option<WorkerMessage>, WorkerError> {
        if !self.reader.has_buffered_data() {
            match wait_for_data(self.msg_read_fd, slice) {
                PollResult::DataAvailable => {}
                PollResult::Timeout => {
                    if !self.is_alive() {
                        return Err(WorkerError::Crashed(
                            "worker process exited unexpectedly".to_string(),
                        ));
                    }
                    return Ok(None);
                }
                PollResult::PipeClosed => {
                    return Err(WorkerError::Crashed(
                        "worker pipe closed unexpectedly".to_string(),
                    ));
                }
                PollResult::Error(e) => {
                    return Err(WorkerError::Crashed(format!("pipe error: {e}")));
                }
            }
        }
        Ok(Some(self.reader.read::<WorkerMessage>()?))
    }

    fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }
}

#[cfg(unix)]
impl WorkerContext for ProcessWorker {
    fn id(&self) -> u32 {
        self.child.id()
    }

    fn send(&mut self, request: Request<'_>) -> Result<(), WorkerError> {
        let command = match request {
            Request::Run(item) => SupervisorCommand::Run(item.job_spec()),
            Request::BeginProblem(binding) => SupervisorCommand::BeginProblem {
                source: binding.source.clone(),
                preload: binding.preload,
            },
            Request::EndProblem => SupervisorCommand::EndProblem,
            Request::Ping => SupervisorCommand::Ping,
        };
        self.writer.write(&command)?;
        Ok(())
    }

    fn poll(&mut self, slice: Duration) -> Result<Option<Reply>, WorkerError> {
        let Some(msg) = self.poll_message(slice)? else {
            return Ok(None);
        };
        let reply = match msg {
            WorkerMessage::Completed {
                value,
                compute_nanos,
            } => Reply::Finished(Invocation {
                outcome: match value {
                    Some(v) => MethodOutcome::Value(v),
                    None => MethodOutcome::NoValue,
                },
                compute_nanos,
            }),
            WorkerMessage::Failure { kind, message } => Reply::Finished(Invocation {
                outcome: MethodOutcome::Failed {
                    panicked: kind == FailureKind::Panic,
                    message,
                },
                compute_nanos: 0,
            }),
            WorkerMessage::ProblemReady(status) => Reply::ProblemReady(status),
            WorkerMessage::ProblemReleased => Reply::ProblemReleased,
            WorkerMessage::Pong => Reply::Pong,
            WorkerMessage::Hello(_) => {
                return Err(WorkerError::Protocol {
                    expected: "a reply".to_string(),
                    got: "Hello".to_string(),
                });
            }
        };
        Ok(Some(reply))
    }

    fn terminate(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[cfg(unix)]
impl Drop for ProcessWorker {
    fn drop(&mut self) {
        if self.is_alive() {
            let _ = self.writer.write(&SupervisorCommand::Shutdown);
            let grace = Instant::now() + Duration::from_millis(50);
            while self.is_alive() && Instant::now() < grace {
                std::thread::sleep(Duration::from_millis(5));
            }
            if self.is_alive() {
                let _ = self.child.kill();
            }
            let _ = self.child.wait();
        }
    }
}

/// Factory for [`ProcessWorker`]s
#[derive(Debug, Clone)]
pub struct ProcessWorkerFactory {
    binary: PathBuf,
}

impl ProcessWorkerFactory {
    /// Workers re-executing the running binary
    pub fn current() -> Result<Self, WorkerError> {
        Ok(Self {
            binary: std::env::current_exe()?,
        })
    }

    /// Workers running a specific binary
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl WorkerFactory for ProcessWorkerFactory {
    #[cfg(unix)]
    fn spawn(&self, _ordinal: usize) -> Result<Box<dyn WorkerContext>, WorkerError> {
        Ok(Box::new(ProcessWorker::spawn(&self.binary)?))
    }

    #[cfg(not(unix))]
    fn spawn(&self, ordinal: usize) -> Result<Box<dyn WorkerContext>, WorkerError> {
        tracing::warn!(
            binary = %self.binary.display(),
            "process isolation is unavailable on this platform, using a worker thread"
        );
        ThreadWorkerFactory.spawn(ordinal)
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Owner of the single worker; serializes every submission through it
pub struct ExecutionEngine {
    factory: Box<dyn WorkerFactory>,
    worker: Option<Box<dyn WorkerContext>>,
    interrupt: Interrupt,
    binding: Option<ProblemBinding>,
    spawned: usize,
    aborted: bool,
}

impl ExecutionEngine {
    /// Create an engine and warm up its first worker
    pub fn new(factory: Box<dyn WorkerFactory>, interrupt: Interrupt) -> Result<Self, EngineError> {
        let mut engine = Self {
            factory,
            worker: None,
            interrupt,
            binding: None,
            spawned: 0,
            aborted: false,
        };
        engine.spawn_fresh()?;
        Ok(engine)
    }

    /// Engine backed by worker threads
    pub fn with_threads(interrupt: Interrupt) -> Result<Self, EngineError> {
        Self::new(Box::new(ThreadWorkerFactory), interrupt)
    }

    /// Engine backed by worker processes running the current binary
    pub fn with_processes(interrupt: Interrupt) -> Result<Self, EngineError> {
        let factory = ProcessWorkerFactory::current().map_err(EngineError::Spawn)?;
        Self::new(Box::new(factory), interrupt)
    }

    /// Number of times the worker has been replaced
    pub fn recycles(&self) -> usize {
        self.spawned.saturating_sub(1)
    }

    /// Run `item`, abandoning it after `deadline_ms` (0 = no deadline)
    pub fn run(&mut self, item: &WorkItem, deadline_ms: f64) -> Result<AttemptRecord, EngineError> {
        if self.aborted || self.interrupt.is_set() {
            return Err(self.abort());
        }
        if self.worker.is_none() {
            self.recycle()?;
        }

        let deadline = if deadline_ms > 0.0 {
            Duration::try_from_secs_f64(deadline_ms / 1000.0).ok()
        } else {
            None
        };

        tracing::debug!(
            problem = item.problem_id,
            method = %item.name,
            deadline_ms,
            "submitting"
        );
        let start = Instant::now();
        let result = self.exchange(Request::Run(item), deadline);
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        match result {
            Ok(Reply::Finished(invocation)) => Ok(match invocation.outcome {
                MethodOutcome::Value(v) => {
                    AttemptRecord::new(&item.key, AttemptState::Completed(v), elapsed_ms)
                }
                MethodOutcome::NoValue => {
                    AttemptRecord::new(&item.key, AttemptState::CompletedNoValue, elapsed_ms)
                }
                MethodOutcome::Failed { panicked, message } => {
                    tracing::warn!(
                        problem = item.problem_id,
                        method = %item.name,
                        panicked,
                        "method failed: {message}"
                    );
                    AttemptRecord::new(&item.key, AttemptState::CompletedNoValue, elapsed_ms)
                        .with_failure(message)
                }
            }),
            Ok(other) => {
                self.recycle()?;
                Ok(
                    AttemptRecord::new(&item.key, AttemptState::CompletedNoValue, elapsed_ms)
                        .with_failure(format!("unexpected worker reply {other:?}")),
                )
            }
            Err(WorkerError::Timeout) => {
                tracing::debug!(
                    problem = item.problem_id,
                    method = %item.name,
                    elapsed_ms,
                    "deadline elapsed, recycling worker"
                );
                self.recycle()?;
                Ok(AttemptRecord::new(
                    &item.key,
                    AttemptState::TimedOut,
                    elapsed_ms,
                ))
            }
            Err(WorkerError::Aborted) => Err(self.abort()),
            Err(e) => {
                tracing::warn!(
                    problem = item.problem_id,
                    method = %item.name,
                    "worker lost during method: {e}"
                );
                self.recycle()?;
                Ok(
                    AttemptRecord::new(&item.key, AttemptState::CompletedNoValue, elapsed_ms)
                        .with_failure(e.to_string()),
                )
            }
        }
    }

    /// Attach a problem's data and return a guard that releases it on drop
    pub fn scope(&mut self, binding: ProblemBinding) -> Result<ProblemScope<'_>, EngineError> {
        let status = self.begin_problem(binding)?;
        Ok(ProblemScope {
            engine: self,
            status,
        })
    }

    /// Attach a problem's data to the worker, re-attached after every recycle
    pub fn begin_problem(&mut self, binding: ProblemBinding) -> Result<DataStatus, EngineError> {
        if self.aborted || self.interrupt.is_set() {
            return Err(self.abort());
        }
        self.binding = Some(binding);
        if self.worker.is_none() {
            self.spawn_fresh()?;
        }
        self.attach_current()
    }

    /// Release the attached problem data
    pub fn end_problem(&mut self) -> Result<(), EngineError> {
        if self.binding.take().is_none() || self.worker.is_none() || self.aborted {
            return Ok(());
        }
        match self.exchange(Request::EndProblem, Some(CONTROL_TIMEOUT)) {
            Ok(Reply::ProblemReleased) => Ok(()),
            Ok(other) => {
                tracing::warn!("unexpected reply to data release: {other:?}");
                self.spawn_fresh()
            }
            Err(WorkerError::Aborted) => Err(self.abort()),
            Err(e) => {
                tracing::warn!("failed to release problem data: {e}");
                self.spawn_fresh()
            }
        }
    }

    /// Replace the worker with a fresh, warmed-up one carrying the current problem
    pub fn recycle(&mut self) -> Result<(), EngineError> {
        self.spawn_fresh()?;
        self.attach_current().map(|_| ())
    }

    fn spawn_fresh(&mut self) -> Result<(), EngineError> {
        if let Some(mut old) = self.worker.take() {
            tracing::debug!(worker = old.id(), "terminating worker");
            old.terminate();
        }

        let ordinal = self.spawned;
        self.spawned += 1;
        let worker = self.factory.spawn(ordinal).map_err(EngineError::Spawn)?;
        tracing::debug!(worker = worker.id(), ordinal, "spawned worker");
        self.worker = Some(worker);

        // Warm-up round trip so start-up latency is not charged to a method.
        match self.exchange(Request::Ping, Some(WARMUP_TIMEOUT)) {
            Ok(Reply::Pong) => Ok(()),
            Ok(other) => Err(EngineError::Spawn(WorkerError::Protocol {
                expected: "Pong".to_string(),
                got: format!("{other:?}"),
            })),
            Err(WorkerError::Aborted) => Err(self.abort()),
            Err(e) => Err(EngineError::Spawn(e)),
        }
    }

    fn attach_current(&mut self) -> Result<DataStatus, EngineError> {
        let Some(binding) = self.binding.clone() else {
            return Ok(DataStatus::Absent);
        };
        match self.exchange(Request::BeginProblem(&binding), Some(CONTROL_TIMEOUT)) {
            Ok(Reply::ProblemReady(status)) => {
                if let DataStatus::Unavailable { message } = &status {
                    tracing::warn!(source = %binding.source, "problem data unavailable: {message}");
                }
                Ok(status)
            }
            Ok(other) => {
                let message = format!("unexpected reply to data attach: {other:?}");
                tracing::warn!(source = %binding.source, "{message}");
                self.spawn_fresh()?;
                Ok(DataStatus::Unavailable { message })
            }
            Err(WorkerError::Aborted) => Err(self.abort()),
            Err(e) => {
                tracing::warn!(source = %binding.source, "failed to attach problem data: {e}");
                self.spawn_fresh()?;
                Ok(DataStatus::Unavailable {
                    message: e.to_string(),
                })
            }
        }
    }

    /// Send `request` and wait for its reply in slices, honouring the
    /// deadline and the interrupt flag.
    fn exchange(
        &mut self,
        request: Request<'_>,
        deadline: Option<Duration>,
    ) -> Result<Reply, WorkerError> {
        let worker = self
            .worker
            .as_mut()
            .ok_or_else(|| WorkerError::Crashed("no worker".to_string()))?;

        let start = Instant::now();
        worker.send(request)?;
        loop {
            if self.interrupt.is_set() {
                return Err(WorkerError::Aborted);
            }
            let slice = match deadline {
                Some(limit) => {
                    let remaining = limit.saturating_sub(start.elapsed());
                    if remaining.is_zero() {
                        return Err(WorkerError::Timeout);
                    }
                    remaining.min(WAIT_SLICE)
                }
                None => WAIT_SLICE,
            };
            if let Some(reply) = worker.poll(slice)? {
                return Ok(reply);
            }
        }
    }

    fn abort(&mut self) -> EngineError {
        if !self.aborted {
            tracing::debug!("aborting run, releasing worker");
            self.aborted = true;
        }
        if let Some(mut worker) = self.worker.take() {
            worker.terminate();
        }
        self.binding = None;
        EngineError::Aborted
    }
}

impl Drop for ExecutionEngine {
    fn drop(&mut self) {
        // Dropping the context shuts it down (process: Shutdown, then kill).
        self.worker.take();
    }
}

/// Attached problem data; released when dropped
pub struct ProblemScope<'e> {
    engine: &'e mut ExecutionEngine,
    status: DataStatus,
}

impl ProblemScope<'_> {
    /// Data state reported when the problem was attached
    pub fn data_status(&self) -> &DataStatus {
        &self.status
    }
}

impl Deref for ProblemScope<'_> {
    type Target = ExecutionEngine;

    fn deref(&self) -> &ExecutionEngine {
        self.engine
    }
}

impl DerefMut for ProblemScope<'_> {
    fn deref_mut(&mut self) -> &mut ExecutionEngine {
        self.engine
    }
}

impl Drop for ProblemScope<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.engine.end_problem() {
            tracing::debug!("problem release skipped: {e}");
        }
    }
}
