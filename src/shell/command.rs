//! Process invocation: spawn, wire stdio, capture, resolve.
//!
//! [`invoke`] starts the child and returns immediately. A supervisor task
//! owns the child from then on: it relays signals from the
//! [`ProcessHandle`], waits for exit, and joins the capture tasks before
//! resolving the outcome.

use super::capture::capture;
use super::outcome::{is_success, Captured, Outcome};
use super::platform::CommandLine;
use super::process::{LiveInvocation, PendingOutcome, ProcessHandle, Signal, StdioPipes};
use crate::config::options::Resolved;
use crate::config::{ChildEnv, Echo, Options, StdioMode};
use crate::error::{Result, ShellError, StreamName};
use std::io::ErrorKind;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Stdio wiring decided for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Wiring {
    pub stdin: StdioMode,
    pub stdout: StdioMode,
    pub stderr: StdioMode,
    /// False when an explicit `stdio` override bypasses capture and input.
    pub managed: bool,
}

impl Wiring {
    pub(crate) fn for_options(resolved: &Resolved) -> Self {
        if let Some([stdin, stdout, stderr]) = resolved.stdio {
            return Self {
                stdin,
                stdout,
                stderr,
                managed: false,
            };
        }
        let pipe_if = |wanted: bool| {
            if wanted {
                StdioMode::Pipe
            } else {
                StdioMode::Inherit
            }
        };
        Self {
            stdin: pipe_if(resolved.input.is_some()),
            stdout: pipe_if(resolved.capture_output.is_enabled()),
            stderr: pipe_if(resolved.capture_error.is_enabled()),
            managed: true,
        }
    }
}

fn stdio(mode: StdioMode) -> Stdio {
    match mode {
        StdioMode::Inherit => Stdio::inherit(),
        StdioMode::Pipe => Stdio::piped(),
        StdioMode::Ignore => Stdio::null(),
    }
}

/// Start `command` and return a handle to it.
///
/// Must be called from within a Tokio runtime. Spawn failures do not
/// return early: they surface as a failed outcome on a handle without a
/// process.
pub fn invoke(command: CommandLine, options: &Options) -> LiveInvocation {
    let resolved = options.resolve();

    match &resolved.echo {
        Echo::Custom(predicate) => {
            if !predicate(command.program.as_str(), command.args.as_slice()) {
                debug!("Echo predicate cancelled: {}", command);
                return LiveInvocation::aborted();
            }
        }
        Echo::Enabled => println!("{command}"),
        Echo::Disabled => {}
    }

    let wiring = Wiring::for_options(&resolved);
    let mut cmd = build_command(&command, &resolved, &wiring);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(source) => {
            debug!("Failed to spawn {}: {}", command.program, source);
            return LiveInvocation::failed(ShellError::Spawn {
                program: command.program,
                source,
            });
        }
    };
    let pid = child.id().unwrap_or_default();
    debug!(pid, "Spawned: {}", command);

    let mut input = None;
    let mut captures = Captures::default();
    let mut pipes = StdioPipes::default();

    if wiring.managed {
        if let (Some(content), Some(stdin)) = (resolved.input.clone(), child.stdin.take()) {
            input = Some(tokio::spawn(write_input(stdin, content, pid)));
        }
        if let Some(stdout) = child.stdout.take() {
            let mode = resolved.capture_output.clone();
            let normalize = resolved.normalize.clone();
            captures.stdout = Some(tokio::spawn(async move {
                capture(stdout, StreamName::Stdout, &mode, &normalize).await
            }));
        }
        if let Some(stderr) = child.stderr.take() {
            let mode = resolved.capture_error.clone();
            let normalize = resolved.normalize.clone();
            captures.stderr = Some(tokio::spawn(async move {
                capture(stderr, StreamName::Stderr, &mode, &normalize).await
            }));
        }
    } else {
        pipes = StdioPipes {
            stdin: child.stdin.take(),
            stdout: child.stdout.take(),
            stderr: child.stderr.take(),
        };
    }

    let pipes = Arc::new(Mutex::new(pipes));
    let (signal_tx, signal_rx) = mpsc::unbounded_channel();
    let supervisor = Supervisor {
        child,
        pid,
        signals: signal_rx,
        input,
        captures,
        ignore_error: resolved.ignore_error,
        pipes: Arc::clone(&pipes),
    };

    LiveInvocation {
        process: Some(ProcessHandle::new(pid, signal_tx, pipes)),
        outcome: PendingOutcome::running(tokio::spawn(supervisor.run())),
    }
}

fn build_command(command: &CommandLine, resolved: &Resolved, wiring: &Wiring) -> Command {
    let mut cmd = Command::new(&command.program);
    add_args(&mut cmd, command);

    if let Some(cwd) = &resolved.cwd {
        cmd.current_dir(cwd);
    }

    match &resolved.env {
        Some(ChildEnv::Extend(vars)) => {
            cmd.envs(vars);
        }
        Some(ChildEnv::Replace(vars)) => {
            cmd.env_clear().envs(vars);
        }
        None => {}
    }

    cmd.stdin(stdio(wiring.stdin))
        .stdout(stdio(wiring.stdout))
        .stderr(stdio(wiring.stderr));

    apply_platform_options(&mut cmd, resolved);
    cmd
}

#[cfg(windows)]
fn add_args(cmd: &mut Command, command: &CommandLine) {
    if command.verbatim_args {
        for arg in &command.args {
            cmd.raw_arg(arg);
        }
    } else {
        cmd.args(&command.args);
    }
}

#[cfg(not(windows))]
fn add_args(cmd: &mut Command, command: &CommandLine) {
    cmd.args(&command.args);
}

#[cfg(unix)]
fn apply_platform_options(cmd: &mut Command, resolved: &Resolved) {
    if let Some(uid) = resolved.uid {
        cmd.uid(uid);
    }
    if let Some(gid) = resolved.gid {
        cmd.gid(gid);
    }
    if let Some(arg0) = &resolved.arg0 {
        cmd.arg0(arg0);
    }
    if resolved.detached {
        cmd.process_group(0);
    }
}

#[cfg(windows)]
fn apply_platform_options(cmd: &mut Command, resolved: &Resolved) {
    const DETACHED_PROCESS: u32 = 0x0000_0008;
    if resolved.detached {
        cmd.creation_flags(DETACHED_PROCESS);
    }
    if resolved.uid.is_some() || resolved.gid.is_some() || resolved.arg0.is_some() {
        warn!("uid, gid and arg0 are not supported on Windows; ignoring");
    }
}

#[cfg(not(any(unix, windows)))]
fn apply_platform_options(_cmd: &mut Command, _resolved: &Resolved) {}

async fn write_input(mut stdin: ChildStdin, content: Vec<u8>, pid: u32) {
    let written: std::io::Result<()> = async {
        stdin.write_all(&content).await?;
        stdin.shutdown().await
    }
    .await;
    drop(stdin);

    match written {
        Ok(()) => debug!(pid, bytes = content.len(), "input written"),
        Err(e) if e.kind() == ErrorKind::BrokenPipe => {
            debug!(pid, "child closed stdin before reading all input");
        }
        Err(e) => warn!(pid, "Failed to write input: {}", e),
    }
}

#[derive(Default)]
struct Captures {
    stdout: Option<JoinHandle<Result<Captured>>>,
    stderr: Option<JoinHandle<Result<Captured>>>,
}

impl Captures {
    fn abort(&self) {
        for task in [&self.stdout, &self.stderr].into_iter().flatten() {
            task.abort();
        }
    }

    /// Wait for both captures; completion order between them is irrelevant.
    async fn join(self) -> Result<(Option<Captured>, Option<Captured>)> {
        tokio::try_join!(
            finish(self.stdout, StreamName::Stdout),
            finish(self.stderr, StreamName::Stderr)
        )
    }
}

async fn finish(
    task: Option<JoinHandle<Result<Captured>>>,
    stream: StreamName,
) -> Result<Option<Captured>> {
    let Some(task) = task else {
        return Ok(None);
    };
    match task.await {
        Ok(result) => result.map(Some),
        Err(e) => Err(ShellError::Transform {
            stream,
            source: anyhow::anyhow!("capture task failed: {e}"),
        }),
    }
}

struct Supervisor {
    child: Child,
    pid: u32,
    signals: mpsc::UnboundedReceiver<Signal>,
    input: Option<JoinHandle<()>>,
    captures: Captures,
    ignore_error: bool,
    /// Keeps unread override pipes open until the child exits.
    pipes: Arc<Mutex<StdioPipes>>,
}

impl Supervisor {
    async fn run(mut self) -> Result<Outcome> {
        let waited = loop {
            tokio::select! {
                status = self.child.wait() => break status,
                Some(signal) = self.signals.recv() => deliver(&mut self.child, self.pid, signal),
            }
        };
        // Reaped: later signal requests must fail with NotRunning.
        drop(self.signals);
        drop(self.pipes);
        let pid = self.pid;

        let status = match waited {
            Ok(status) => status,
            Err(source) => {
                self.captures.abort();
                return Err(ShellError::Wait { pid, source });
            }
        };

        let (code, signal) = exit_parts(&status);
        debug!(pid, ?code, ?signal, "process exited");

        if !self.ignore_error && !is_success(code, signal.as_deref()) {
            self.captures.abort();
            if let Some(input) = &self.input {
                input.abort();
            }
            return Err(ShellError::ExitFailure { pid, code, signal });
        }

        if let Some(input) = self.input {
            // write_input logs its own failures
            let _ = input.await;
        }

        let (stdout, stderr) = self.captures.join().await?;
        Ok(Outcome {
            code,
            signal,
            stdout,
            stderr,
        })
    }
}

fn deliver(child: &mut Child, pid: u32, signal: Signal) {
    debug!(pid, signal = signal.name(), "relaying signal");

    #[cfg(unix)]
    {
        if signal != Signal::Kill {
            // SAFETY: kill(2) takes plain integers. The child has not been
            // reaped yet (we own its Child), so `pid` still refers to it.
            let rc = unsafe { libc::kill(pid as libc::pid_t, signal.as_raw()) };
            if rc != 0 {
                warn!(
                    pid,
                    "Failed to send {}: {}",
                    signal.name(),
                    std::io::Error::last_os_error()
                );
            }
            return;
        }
    }

    if let Err(e) = child.start_kill() {
        warn!(pid, "Failed to kill process: {}", e);
    }
}

#[cfg(unix)]
fn exit_parts(status: &ExitStatus) -> (Option<i32>, Option<String>) {
    use std::os::unix::process::ExitStatusExt;
    (status.code(), status.signal().map(super::process::signal_name))
}

#[cfg(not(unix))]
fn exit_parts(status: &ExitStatus) -> (Option<i32>, Option<String>) {
    (status.code(), None)
}
