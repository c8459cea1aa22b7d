//! Invocation options and their merge rules.
//!
//! Every field of [`Options`] is optional. An unset field inherits from the
//! base it is merged onto, so the same type serves as the root defaults of
//! a context, as the overrides of a derived context, and as the per-call
//! overrides of a single invocation.
//!
//! # Merge Rules
//!
//! - A field set in the overlay replaces the base field entirely
//! - An unset overlay field keeps the base field
//! - Maps (`env`, `raw_env`) are replaced, not merged

use super::env::{resolve_child_env, ChildEnv, EnvSpec, EnvValue};
use crate::shell::Captured;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Predicate called with the program and its arguments before spawning.
pub type EchoFn = Arc<dyn Fn(&str, &[String]) -> bool + Send + Sync>;

/// Transform called once with the complete bytes of a captured stream.
pub type TransformFn = Arc<dyn Fn(Vec<u8>) -> anyhow::Result<Captured> + Send + Sync>;

/// Replacement for the default line-ending normalization.
pub type NormalizeFn = Arc<dyn Fn(String) -> String + Send + Sync>;

/// Whether and how a command is announced before it runs.
#[derive(Clone)]
pub enum Echo {
    /// Run silently.
    Disabled,
    /// Print the program and its arguments to stdout.
    Enabled,
    /// Ask a predicate; returning `false` cancels the invocation.
    Custom(EchoFn),
}

impl Echo {
    /// Wrap a predicate.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&str, &[String]) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }
}

impl From<bool> for Echo {
    fn from(enabled: bool) -> Self {
        if enabled {
            Self::Enabled
        } else {
            Self::Disabled
        }
    }
}

impl fmt::Debug for Echo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => write!(f, "Disabled"),
            Self::Enabled => write!(f, "Enabled"),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Whether and how an output stream is captured.
#[derive(Clone)]
pub enum Capture {
    /// Leave the stream attached to the parent's.
    Disabled,
    /// Capture as (normalized) text.
    Enabled,
    /// Capture the raw bytes and hand them to a transform.
    Custom(TransformFn),
}

impl Capture {
    /// Wrap a transform.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(Vec<u8>) -> anyhow::Result<Captured> + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    /// Capture the raw bytes without decoding them.
    pub fn bytes() -> Self {
        Self::custom(|buf| Ok(Captured::Bytes(buf)))
    }

    /// Parse the stream as a JSON document.
    pub fn json() -> Self {
        Self::custom(|buf| Ok(Captured::Json(serde_json::from_slice(&buf)?)))
    }

    /// Returns `true` unless this is [`Capture::Disabled`].
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

impl From<bool> for Capture {
    fn from(enabled: bool) -> Self {
        if enabled {
            Self::Enabled
        } else {
            Self::Disabled
        }
    }
}

impl fmt::Debug for Capture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => write!(f, "Disabled"),
            Self::Enabled => write!(f, "Enabled"),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Post-processing of captured text.
#[derive(Clone)]
pub enum Normalize {
    /// Keep the decoded text as is.
    Disabled,
    /// Map CRLF and lone CR to LF.
    Enabled,
    /// Replace normalization with a custom function.
    Custom(NormalizeFn),
}

impl Normalize {
    /// Wrap a normalization function.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(String) -> String + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    /// Apply this normalization to decoded text.
    pub fn apply(&self, text: String) -> String {
        match self {
            Self::Disabled => text,
            Self::Enabled => text.replace("\r\n", "\n").replace('\r', "\n"),
            Self::Custom(f) => f(text),
        }
    }
}

impl From<bool> for Normalize {
    fn from(enabled: bool) -> Self {
        if enabled {
            Self::Enabled
        } else {
            Self::Disabled
        }
    }
}

impl fmt::Debug for Normalize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => write!(f, "Disabled"),
            Self::Enabled => write!(f, "Enabled"),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Wiring of one standard stream slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StdioMode {
    /// Share the parent's stream.
    Inherit,
    /// Create a pipe readable/writable from the [`ProcessHandle`](crate::shell::ProcessHandle).
    Pipe,
    /// Connect to the null device.
    Ignore,
}

/// Options for one invocation, or defaults for a context.
///
/// # Example
///
/// ```
/// use pshell::config::Options;
///
/// let base = Options::defaults();
/// let call = Options::new().with_capture_output(true).with_ignore_error(true);
/// let merged = base.merge(&call);
///
/// assert_eq!(merged.ignore_error, Some(true));
/// assert!(merged.capture_output.unwrap().is_enabled());
/// // inherited from the defaults
/// assert!(matches!(merged.echo_command, Some(pshell::config::Echo::Enabled)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Announce or veto the command before spawning.
    pub echo_command: Option<Echo>,
    /// Resolve successfully even when the process fails.
    pub ignore_error: Option<bool>,
    /// Shell executable for shell-routed commands.
    pub shell_name: Option<String>,
    /// Switches placed before the command string.
    pub shell_switch: Option<Vec<String>>,
    /// Bytes written to the child's stdin. Empty means no input.
    pub input_content: Option<Vec<u8>>,
    /// Capture stdout.
    pub capture_output: Option<Capture>,
    /// Capture stderr.
    pub capture_error: Option<Capture>,
    /// Line-ending normalization of captured text.
    pub normalize_text: Option<Normalize>,
    /// Explicit wiring for stdin, stdout and stderr. Disables capture and input.
    pub stdio: Option<[StdioMode; 3]>,
    /// Variables layered onto the inherited environment.
    pub env: Option<EnvSpec>,
    /// Variables replacing the inherited environment.
    pub raw_env: Option<EnvSpec>,
    /// Working directory.
    pub cwd: Option<PathBuf>,
    /// User id of the child (POSIX only).
    pub uid: Option<u32>,
    /// Group id of the child (POSIX only).
    pub gid: Option<u32>,
    /// Run the child in its own process group / without a console.
    pub detached: Option<bool>,
    /// Override of `argv[0]` (POSIX only).
    pub arg0: Option<String>,
}

impl Options {
    /// Options with every field unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// The documented root defaults.
    ///
    /// Echo on, errors not ignored, no shell override, no input, no capture,
    /// text normalization on.
    pub fn defaults() -> Self {
        Self {
            echo_command: Some(Echo::Enabled),
            ignore_error: Some(false),
            capture_output: Some(Capture::Disabled),
            capture_error: Some(Capture::Disabled),
            normalize_text: Some(Normalize::Enabled),
            ..Self::default()
        }
    }

    /// Shallow merge: fields set in `overrides` win, the rest come from `self`.
    pub fn merge(&self, overrides: &Options) -> Options {
        fn pick<T: Clone>(base: &Option<T>, over: &Option<T>) -> Option<T> {
            over.as_ref().or(base.as_ref()).cloned()
        }

        Options {
            echo_command: pick(&self.echo_command, &overrides.echo_command),
            ignore_error: pick(&self.ignore_error, &overrides.ignore_error),
            shell_name: pick(&self.shell_name, &overrides.shell_name),
            shell_switch: pick(&self.shell_switch, &overrides.shell_switch),
            input_content: pick(&self.input_content, &overrides.input_content),
            capture_output: pick(&self.capture_output, &overrides.capture_output),
            capture_error: pick(&self.capture_error, &overrides.capture_error),
            normalize_text: pick(&self.normalize_text, &overrides.normalize_text),
            stdio: pick(&self.stdio, &overrides.stdio),
            env: pick(&self.env, &overrides.env),
            raw_env: pick(&self.raw_env, &overrides.raw_env),
            cwd: pick(&self.cwd, &overrides.cwd),
            uid: pick(&self.uid, &overrides.uid),
            gid: pick(&self.gid, &overrides.gid),
            detached: pick(&self.detached, &overrides.detached),
            arg0: pick(&self.arg0, &overrides.arg0),
        }
    }

    pub fn with_echo_command(mut self, echo: impl Into<Echo>) -> Self {
        self.echo_command = Some(echo.into());
        self
    }

    pub fn with_ignore_error(mut self, ignore: bool) -> Self {
        self.ignore_error = Some(ignore);
        self
    }

    pub fn with_shell_name(mut self, name: impl Into<String>) -> Self {
        self.shell_name = Some(name.into());
        self
    }

    pub fn with_shell_switch<I, S>(mut self, switches: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.shell_switch = Some(switches.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_input(mut self, content: impl Into<Vec<u8>>) -> Self {
        self.input_content = Some(content.into());
        self
    }

    pub fn with_capture_output(mut self, capture: impl Into<Capture>) -> Self {
        self.capture_output = Some(capture.into());
        self
    }

    pub fn with_capture_error(mut self, capture: impl Into<Capture>) -> Self {
        self.capture_error = Some(capture.into());
        self
    }

    pub fn with_normalize_text(mut self, normalize: impl Into<Normalize>) -> Self {
        self.normalize_text = Some(normalize.into());
        self
    }

    pub fn with_stdio(mut self, stdin: StdioMode, stdout: StdioMode, stderr: StdioMode) -> Self {
        self.stdio = Some([stdin, stdout, stderr]);
        self
    }

    /// Add one variable to `env`, keeping variables already set on `self`.
    pub fn with_env_var(mut self, key: impl Into<String>, value: impl Into<EnvValue>) -> Self {
        self.env
            .get_or_insert_with(EnvSpec::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_env(mut self, env: EnvSpec) -> Self {
        self.env = Some(env);
        self
    }

    pub fn with_raw_env(mut self, env: EnvSpec) -> Self {
        self.raw_env = Some(env);
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_uid(mut self, uid: u32) -> Self {
        self.uid = Some(uid);
        self
    }

    pub fn with_gid(mut self, gid: u32) -> Self {
        self.gid = Some(gid);
        self
    }

    pub fn with_detached(mut self, detached: bool) -> Self {
        self.detached = Some(detached);
        self
    }

    pub fn with_arg0(mut self, arg0: impl Into<String>) -> Self {
        self.arg0 = Some(arg0.into());
        self
    }

    /// Fill unset fields with root defaults and decide the child environment.
    pub(crate) fn resolve(&self) -> Resolved {
        let defaults = Options::defaults().merge(self);
        Resolved {
            echo: defaults.echo_command.unwrap_or(Echo::Enabled),
            ignore_error: defaults.ignore_error.unwrap_or(false),
            input: defaults.input_content.filter(|content| !content.is_empty()),
            capture_output: defaults.capture_output.unwrap_or(Capture::Disabled),
            capture_error: defaults.capture_error.unwrap_or(Capture::Disabled),
            normalize: defaults.normalize_text.unwrap_or(Normalize::Enabled),
            stdio: defaults.stdio,
            env: resolve_child_env(defaults.env.as_ref(), defaults.raw_env.as_ref()),
            cwd: defaults.cwd,
            uid: defaults.uid,
            gid: defaults.gid,
            detached: defaults.detached.unwrap_or(false),
            arg0: defaults.arg0,
        }
    }
}

/// Fully populated options, as consumed by the invoker.
#[derive(Debug, Clone)]
pub(crate) struct Resolved {
    pub echo: Echo,
    pub ignore_error: bool,
    pub input: Option<Vec<u8>>,
    pub capture_output: Capture,
    pub capture_error: Capture,
    pub normalize: Normalize,
    pub stdio: Option<[StdioMode; 3]>,
    pub env: Option<ChildEnv>,
    pub cwd: Option<PathBuf>,
    pub uid: Option<u32>,
    pub gid: Option<u32>,
    pub detached: bool,
    pub arg0: Option<String>,
}
