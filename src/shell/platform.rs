//! Platform-specific shell command construction.
//!
//! Turns a command string into the program and argument vector that make
//! the platform's command interpreter run it.

use crate::config::Options;
use std::fmt;

/// Default interpreter on POSIX systems.
pub const POSIX_SHELL: &str = "/bin/sh";

/// Fallback interpreter on Windows when `COMSPEC` is not set.
pub const WINDOWS_SHELL: &str = "cmd.exe";

/// Command interpreter family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Posix,
    Windows,
}

impl Platform {
    /// The platform this binary was built for.
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Posix
        }
    }

    fn default_switch(self) -> Vec<String> {
        match self {
            Platform::Posix => vec!["-c".to_string()],
            Platform::Windows => vec!["/s".to_string(), "/c".to_string()],
        }
    }
}

/// A program plus arguments, ready to hand to the process primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    /// Executable name or path.
    pub program: String,

    /// Argument vector, excluding the program.
    pub args: Vec<String>,

    /// Pass arguments through without the primitive's own quoting.
    ///
    /// Only has an effect on Windows.
    pub verbatim_args: bool,
}

impl CommandLine {
    /// A direct program invocation with no shell involved.
    pub fn direct<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            verbatim_args: false,
        }
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            write!(f, "{}", self.program)
        } else {
            write!(f, "{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Build the interpreter invocation for `command` on the current platform.
///
/// # Example
///
/// ```
/// use pshell::config::Options;
/// use pshell::shell::shell_command;
///
/// let line = shell_command("echo hi", &Options::new().with_shell_name("bash"));
/// assert_eq!(line.program, "bash");
/// ```
pub fn shell_command(command: &str, options: &Options) -> CommandLine {
    let comspec = std::env::var("COMSPEC").ok();
    build_shell_command(command, options, Platform::current(), comspec.as_deref())
}

/// Build the interpreter invocation for an explicit platform.
///
/// `comspec` is the value of the `COMSPEC` variable, consulted on Windows
/// when no shell name is configured.
pub fn build_shell_command(
    command: &str,
    options: &Options,
    platform: Platform,
    comspec: Option<&str>,
) -> CommandLine {
    let switch = options
        .shell_switch
        .clone()
        .unwrap_or_else(|| platform.default_switch());

    match platform {
        Platform::Windows => {
            let program = options
                .shell_name
                .clone()
                .or_else(|| comspec.map(str::to_string))
                .unwrap_or_else(|| WINDOWS_SHELL.to_string());
            let mut args = switch;
            // cmd.exe strips exactly one layer of quotes with /s
            args.push(format!("\"{command}\""));
            CommandLine {
                program,
                args,
                verbatim_args: true,
            }
        }
        Platform::Posix => {
            let program = options
                .shell_name
                .clone()
                .unwrap_or_else(|| POSIX_SHELL.to_string());
            let mut args = switch;
            args.push(command.to_string());
            CommandLine {
                program,
                args,
                verbatim_args: false,
            }
        }
    }
}
