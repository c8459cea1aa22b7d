//! Error types for pshell operations.
//!
//! This module defines [`ShellError`], the error every invocation future
//! fails with, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Each failure of an invocation maps to exactly one [`FailureKind`]
//! - `ignore_error` only suppresses [`FailureKind::Exit`]
//! - Capture transforms return `anyhow::Result`, wrapped in
//!   [`ShellError::Transform`]

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which output stream of a child process an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamName {
    Stdout,
    Stderr,
}

impl fmt::Display for StreamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => write!(f, "stdout"),
            Self::Stderr => write!(f, "stderr"),
        }
    }
}

/// Broad classification of a [`ShellError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The process primitive could not be used (spawn or wait failed).
    Transport,
    /// The process ran and exited unsuccessfully.
    Exit,
    /// An output stream could not be drained or transformed.
    Capture,
    /// A defaults file could not be loaded.
    Config,
    /// Anything else.
    Other,
}

/// Core error type for pshell operations.
#[derive(Debug, Error)]
pub enum ShellError {
    /// The child process could not be started.
    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting on a running child failed.
    #[error("Failed to wait for process {pid}: {source}")]
    Wait {
        pid: u32,
        #[source]
        source: std::io::Error,
    },

    /// The process exited with a non-zero code or was killed by a signal.
    #[error("Process {pid} {}", describe_exit(.code, .signal))]
    ExitFailure {
        pid: u32,
        code: Option<i32>,
        signal: Option<String>,
    },

    /// Reading a captured stream failed before end of stream.
    #[error("Failed to read {stream}: {source}")]
    Capture {
        stream: StreamName,
        #[source]
        source: std::io::Error,
    },

    /// A capture transform rejected the stream contents.
    #[error("Failed to transform {stream}: {source}")]
    Transform {
        stream: StreamName,
        #[source]
        source: anyhow::Error,
    },

    /// A signal was sent to a process that has already been reaped.
    #[error("Process {pid} is no longer running")]
    NotRunning { pid: u32 },

    /// Defaults file not found at the given location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Defaults file could not be parsed.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ShellError {
    /// Classify this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Spawn { .. } | Self::Wait { .. } => FailureKind::Transport,
            Self::ExitFailure { .. } => FailureKind::Exit,
            Self::Capture { .. } | Self::Transform { .. } => FailureKind::Capture,
            Self::ConfigNotFound { .. } | Self::ConfigParseError { .. } => FailureKind::Config,
            Self::NotRunning { .. } | Self::Io(_) | Self::Other(_) => FailureKind::Other,
        }
    }

    /// Exit code carried by an [`ShellError::ExitFailure`].
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::ExitFailure { code, .. } => *code,
            _ => None,
        }
    }
}

fn describe_exit(code: &Option<i32>, signal: &Option<String>) -> String {
    match (*code, signal.as_deref()) {
        (Some(code), _) if code != 0 => format!("exited with code {code}"),
        (_, Some(signal)) => format!("was terminated by signal {signal}"),
        _ => "exited abnormally".to_string(),
    }
}

/// Result type alias for pshell operations.
pub type Result<T> = std::result::Result<T, ShellError>;
