//! System utilities for deadlines, cancellation and subprocess execution.
//!
//! Every external program fjrd runs (`git`, `defaults`, `pgrep`, `killall`)
//! goes through [`run_program`], which honors a shared [`Deadline`]: the
//! child is killed as soon as the deadline expires or the user hits Ctrl-C.

use std::fmt;
use std::io::{BufRead, BufReader, Read};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use wait_timeout::ChildExt;

use crate::{Error, Result};

/// How often a running child is checked against the deadline.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// An overall time limit plus a cancellation flag, shared by clones.
#[derive(Debug, Clone, Default)]
pub struct Deadline {
    expires_at: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

impl Deadline {
    /// A deadline that never expires (it can still be cancelled).
    pub fn none() -> Self {
        Self::default()
    }

    /// A deadline expiring `timeout` from now.
    ///
    /// A timeout too large to represent as an instant never expires.
    pub fn after(timeout: Duration) -> Self {
        Self {
            expires_at: Instant::now().checked_add(timeout),
            cancelled: Arc::default(),
        }
    }

    /// A fresh deadline expiring `timeout` from now that shares this one's
    /// cancellation flag, so an installed Ctrl-C handler still reaches it.
    pub fn renewed(&self, timeout: Duration) -> Self {
        Self {
            expires_at: Instant::now().checked_add(timeout),
            cancelled: Arc::clone(&self.cancelled),
        }
    }

    /// Cancel this deadline and every clone of it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Time left, or `None` when there is no time limit.
    pub fn remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// Fails with [`Error::Cancelled`] or [`Error::DeadlineExceeded`] once
    /// either condition holds.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }
        match self.remaining() {
            Some(left) if left.is_zero() => Err(Error::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Clamp a per-operation timeout to the time left.
    pub fn cap(&self, limit: Duration) -> Duration {
        match self.remaining() {
            Some(left) => left.min(limit),
            None => limit,
        }
    }

    /// Cancel this deadline when the process receives Ctrl-C.
    ///
    /// Can be installed once per process.
    pub fn cancel_on_interrupt(&self) -> Result<()> {
        let flag = Arc::clone(&self.cancelled);
        ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
            .map_err(|e| Error::Other(format!("Failed to install Ctrl-C handler: {}", e)))
    }
}

/// A failed external program: spawn failure or non-zero exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionError {
    pub program: String,
    pub args: Vec<String>,
    pub detail: String,
}

impl ExecutionError {
    pub fn new(command: &Command, detail: impl Into<String>) -> Self {
        Self {
            program: command.get_program().to_string_lossy().into_owned(),
            args: command
                .get_args()
                .map(|a| a.to_string_lossy().into_owned())
                .collect(),
            detail: detail.into(),
        }
    }

    /// Build the error for a program that ran but exited unsuccessfully.
    pub fn from_output(command: &Command, output: &ProgramOutput) -> Self {
        let stderr = output.stderr.trim();
        let detail = if stderr.is_empty() {
            output.status.to_string()
        } else {
            format!("{}: {}", output.status, stderr)
        };
        Self::new(command, detail)
    }

    /// The command line as it would be typed in a shell.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "execution error for command '{}': {}",
            self.command_line(),
            self.detail
        )
    }
}

impl std::error::Error for ExecutionError {}

/// Captured result of a finished program.
#[derive(Debug)]
pub struct ProgramOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ProgramOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// Run `command` to completion, capturing stdout and stderr.
///
/// A non-zero exit is returned as a normal [`ProgramOutput`]; callers decide
/// whether it is an error. The child is killed when `deadline` expires or is
/// cancelled, and the corresponding error is returned.
pub fn run_program(command: &mut Command, deadline: &Deadline) -> Result<ProgramOutput> {
    deadline.check()?;

    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| ExecutionError::new(command, format!("failed to start: {}", e)))?;

    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let status = loop {
        if let Some(status) = child.wait_timeout(deadline.cap(POLL_INTERVAL))? {
            break status;
        }
        if let Err(err) = deadline.check() {
            tracing::debug!(
                program = %command.get_program().to_string_lossy(),
                error = %err,
                "Killing child process"
            );
            let _ = child.kill();
            let _ = child.wait();
            return Err(err);
        }
    };

    Ok(ProgramOutput {
        status,
        stdout: stdout.map(collect).unwrap_or_default(),
        stderr: stderr.map(collect).unwrap_or_default(),
    })
}

/// Read one line from `reader`, giving up as soon as `deadline` is cancelled.
///
/// Returns `None` at end of input. Only cancellation interrupts the wait;
/// the time limit does not apply to waiting on a person. The read happens on
/// a helper thread, which is left blocked if the wait is abandoned.
pub fn read_line_cancellable<R>(reader: R, deadline: &Deadline) -> Result<Option<String>>
where
    R: Read + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut line = String::new();
        let result = match BufReader::new(reader).read_line(&mut line) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(line)),
            Err(err) => Err(err),
        };
        let _ = tx.send(result);
    });

    loop {
        if deadline.is_cancelled() {
            return Err(Error::Cancelled);
        }
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(result) => return Ok(result?),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => return Ok(None),
        }
    }
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn collect(handle: thread::JoinHandle<String>) -> String {
    handle.join().unwrap_or_default()
}
