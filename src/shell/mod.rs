//! Shell command building, process invocation, and output capture.

pub mod capture;
pub mod command;
pub mod outcome;
pub mod platform;
pub mod process;

pub use capture::capture;
pub use command::invoke;
pub use outcome::{Captured, Outcome};
pub use platform::{build_shell_command, shell_command, CommandLine, Platform};
pub use process::{LiveInvocation, PendingOutcome, ProcessHandle, Signal};

#[cfg(unix)]
pub use process::signal_number;
