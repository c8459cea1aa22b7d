//! pshell - run shell commands and programs from async Rust.
//!
//! pshell launches a program or a shell command line, optionally feeds it
//! input, optionally captures its output, and resolves a single future with
//! the exit status and captured data. Defaults live in composable
//! [`Context`]s.
//!
//! # Modules
//!
//! - [`config`] - Options, environment composition, and defaults files
//! - [`context`] - Contexts and the `shell`/`spawn`/`exec`/`context` entry points
//! - [`error`] - Error types and result aliases
//! - [`shell`] - Shell command building, process invocation, and capture
//! - [`cli`] - Command-line interface of the `pshell` binary
//!
//! # Example
//!
//! ```no_run
//! use pshell::{Captured, Options};
//!
//! # #[tokio::main]
//! # async fn main() -> pshell::Result<()> {
//! let outcome = pshell::shell(
//!     "echo hello",
//!     Options::new().with_echo_command(false).with_capture_output(true),
//! )
//! .await?
//! .expect("no echo predicate was set");
//!
//! assert_eq!(outcome.code, Some(0));
//! assert_eq!(outcome.stdout, Some(Captured::Text("hello\n".into())));
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod shell;

pub use config::{Capture, Echo, EnvValue, Normalize, Options, StdioMode};
pub use context::{context, exec, global, shell, spawn, Context, LiveOptions};
pub use error::{FailureKind, Result, ShellError, StreamName};
pub use shell::{Captured, LiveInvocation, Outcome, PendingOutcome, ProcessHandle, Signal};
