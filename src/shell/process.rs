//! Handles to running invocations.
//!
//! [`LiveInvocation`] pairs an optional [`ProcessHandle`] with the
//! [`PendingOutcome`] future. The handle is available as soon as the child
//! is spawned; the outcome resolves once the child has exited and every
//! capture has drained.

use super::outcome::Outcome;
use crate::error::{Result, ShellError};
use futures::future::{self, BoxFuture, FutureExt};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tokio::process::{ChildStderr, ChildStdin, ChildStdout};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Signals that can be relayed to a running child.
///
/// On Windows every signal terminates the process forcefully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// `SIGINT`, as sent by Ctrl-C.
    Interrupt,
    /// `SIGTERM`, a polite request to exit.
    Terminate,
    /// `SIGKILL`, cannot be caught.
    Kill,
    /// `SIGHUP`, the controlling terminal went away.
    Hangup,
    /// `SIGQUIT`, exit with a core dump.
    Quit,
}

impl Signal {
    /// Conventional POSIX name.
    pub fn name(self) -> &'static str {
        match self {
            Signal::Interrupt => "SIGINT",
            Signal::Terminate => "SIGTERM",
            Signal::Kill => "SIGKILL",
            Signal::Hangup => "SIGHUP",
            Signal::Quit => "SIGQUIT",
        }
    }

    #[cfg(unix)]
    pub(crate) fn as_raw(self) -> libc::c_int {
        match self {
            Signal::Interrupt => libc::SIGINT,
            Signal::Terminate => libc::SIGTERM,
            Signal::Kill => libc::SIGKILL,
            Signal::Hangup => libc::SIGHUP,
            Signal::Quit => libc::SIGQUIT,
        }
    }
}

/// Name of a raw signal number as reported by the OS.
#[cfg(unix)]
pub(crate) fn signal_name(raw: libc::c_int) -> String {
    SIGNAL_NAMES
        .iter()
        .find(|(number, _)| *number == raw)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| format!("SIG{raw}"))
}

/// Inverse of [`signal_name`].
#[cfg(unix)]
pub fn signal_number(name: &str) -> Option<i32> {
    if let Some((number, _)) = SIGNAL_NAMES.iter().find(|(_, known)| *known == name) {
        return Some(*number);
    }
    name.strip_prefix("SIG")?.parse().ok()
}

#[cfg(unix)]
const SIGNAL_NAMES: &[(libc::c_int, &str)] = &[
    (libc::SIGHUP, "SIGHUP"),
    (libc::SIGINT, "SIGINT"),
    (libc::SIGQUIT, "SIGQUIT"),
    (libc::SIGILL, "SIGILL"),
    (libc::SIGTRAP, "SIGTRAP"),
    (libc::SIGABRT, "SIGABRT"),
    (libc::SIGBUS, "SIGBUS"),
    (libc::SIGFPE, "SIGFPE"),
    (libc::SIGKILL, "SIGKILL"),
    (libc::SIGUSR1, "SIGUSR1"),
    (libc::SIGSEGV, "SIGSEGV"),
    (libc::SIGUSR2, "SIGUSR2"),
    (libc::SIGPIPE, "SIGPIPE"),
    (libc::SIGALRM, "SIGALRM"),
    (libc::SIGTERM, "SIGTERM"),
];

/// Pipes created by an explicit `stdio` override.
#[derive(Debug, Default)]
pub(crate) struct StdioPipes {
    pub stdin: Option<ChildStdin>,
    pub stdout: Option<ChildStdout>,
    pub stderr: Option<ChildStderr>,
}

/// Control over a spawned child.
///
/// Signals are relayed through the task that owns the child, so they are
/// never delivered to a reaped (and possibly reused) process id.
#[derive(Debug, Clone)]
pub struct ProcessHandle {
    pid: u32,
    signals: mpsc::UnboundedSender<Signal>,
    pipes: Arc<Mutex<StdioPipes>>,
}

impl ProcessHandle {
    pub(crate) fn new(
        pid: u32,
        signals: mpsc::UnboundedSender<Signal>,
        pipes: Arc<Mutex<StdioPipes>>,
    ) -> Self {
        Self {
            pid,
            signals,
            pipes,
        }
    }

    /// OS process id.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Relay a signal to the child.
    ///
    /// Fails with [`ShellError::NotRunning`] once the child has been reaped.
    pub fn signal(&self, signal: Signal) -> Result<()> {
        self.signals
            .send(signal)
            .map_err(|_| ShellError::NotRunning { pid: self.pid })
    }

    /// Forcefully terminate the child.
    pub fn kill(&self) -> Result<()> {
        self.signal(Signal::Kill)
    }

    /// Take the stdin pipe created by a `stdio` override.
    pub fn take_stdin(&self) -> Option<ChildStdin> {
        self.pipes.lock().ok()?.stdin.take()
    }

    /// Take the stdout pipe created by a `stdio` override.
    pub fn take_stdout(&self) -> Option<ChildStdout> {
        self.pipes.lock().ok()?.stdout.take()
    }

    /// Take the stderr pipe created by a `stdio` override.
    pub fn take_stderr(&self) -> Option<ChildStderr> {
        self.pipes.lock().ok()?.stderr.take()
    }
}

/// Future resolving to the outcome of an invocation.
///
/// Resolves to `Ok(None)` when an echo predicate cancelled the invocation.
/// The invocation runs whether or not this future is polled.
pub struct PendingOutcome {
    inner: BoxFuture<'static, Result<Option<Outcome>>>,
}

impl PendingOutcome {
    pub(crate) fn ready(result: Result<Option<Outcome>>) -> Self {
        Self {
            inner: future::ready(result).boxed(),
        }
    }

    pub(crate) fn running(task: JoinHandle<Result<Outcome>>) -> Self {
        let inner = async move {
            match task.await {
                Ok(result) => result.map(Some),
                Err(e) => Err(ShellError::Other(anyhow::anyhow!(
                    "invocation task failed: {e}"
                ))),
            }
        }
        .boxed();
        Self { inner }
    }
}

impl Future for PendingOutcome {
    type Output = Result<Option<Outcome>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.poll_unpin(cx)
    }
}

impl std::fmt::Debug for PendingOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingOutcome").finish_non_exhaustive()
    }
}

/// A spawned (or vetoed) invocation.
#[derive(Debug)]
pub struct LiveInvocation {
    /// The running child; `None` if the invocation never spawned.
    pub process: Option<ProcessHandle>,

    /// The eventual outcome.
    pub outcome: PendingOutcome,
}

impl LiveInvocation {
    /// An invocation cancelled by its echo predicate.
    pub(crate) fn aborted() -> Self {
        Self {
            process: None,
            outcome: PendingOutcome::ready(Ok(None)),
        }
    }

    /// An invocation that failed before a process existed.
    pub(crate) fn failed(err: ShellError) -> Self {
        Self {
            process: None,
            outcome: PendingOutcome::ready(Err(err)),
        }
    }

    /// Process id of the child, if one was spawned.
    pub fn pid(&self) -> Option<u32> {
        self.process.as_ref().map(ProcessHandle::pid)
    }
}
