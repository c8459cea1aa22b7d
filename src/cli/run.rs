//! Run command implementation.
//!
//! Layers the defaults file and command-line flags into [`Options`], runs the
//! command through a [`Context`], and reports captured output.

use std::io::Write;

use crate::cli::args::Cli;
use crate::config::{load_options, Capture, Normalize, Options};
use crate::context::Context;
use crate::error::Result;
use crate::shell::{Captured, Outcome};

/// The `pshell` command.
pub struct RunCommand {
    args: Cli,
}

impl RunCommand {
    /// Create a new run command.
    pub fn new(args: Cli) -> Self {
        Self { args }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &Cli {
        &self.args
    }

    /// Defaults file first, then flags. Unset flags leave the file's value alone.
    pub fn build_options(&self) -> Result<Options> {
        let args = &self.args;
        let mut options = match &args.config {
            Some(path) => load_options(path)?,
            None => Options::new(),
        };

        if args.quiet {
            options.echo_command = Some(false.into());
        }
        if args.ignore_error {
            options.ignore_error = Some(true);
        }
        if args.json {
            options.capture_output = Some(Capture::json());
        } else if args.capture {
            options.capture_output = Some(Capture::Enabled);
        }
        if args.capture_error {
            options.capture_error = Some(Capture::Enabled);
        }
        if args.raw {
            options.normalize_text = Some(Normalize::Disabled);
        }
        if let Some(input) = &args.input {
            options.input_content = Some(input.clone().into_bytes());
        }
        if let Some(cwd) = &args.cwd {
            options.cwd = Some(cwd.clone());
        }
        if let Some(shell) = &args.shell {
            options.shell_name = Some(shell.clone());
        }
        if !args.shell_switch.is_empty() {
            options.shell_switch = Some(args.shell_switch.clone());
        }
        for (key, value) in &args.env {
            options = options.with_env_var(key.clone(), value.clone());
        }

        Ok(options)
    }

    /// Run the command and return the process exit code.
    pub async fn execute(&self) -> Result<i32> {
        let context = Context::new().context(self.build_options()?);

        let pending = if self.args.direct {
            let (program, args) = self
                .args
                .command
                .split_first()
                .ok_or_else(|| anyhow::anyhow!("no program given"))?;
            context.spawn(program, args.iter().cloned(), Options::new()).outcome
        } else {
            context.shell(&self.args.command.join(" "), Options::new())
        };

        match pending.await? {
            Some(outcome) => {
                report(&outcome)?;
                Ok(exit_code(&outcome))
            }
            None => {
                tracing::debug!("Command vetoed before start");
                Ok(0)
            }
        }
    }
}

fn report(outcome: &Outcome) -> Result<()> {
    if let Some(captured) = &outcome.stdout {
        write_captured(&mut std::io::stdout().lock(), captured)?;
    }
    if let Some(captured) = &outcome.stderr {
        write_captured(&mut std::io::stderr().lock(), captured)?;
    }
    Ok(())
}

fn write_captured(out: &mut impl Write, captured: &Captured) -> Result<()> {
    match captured {
        Captured::Text(text) => out.write_all(text.as_bytes())?,
        Captured::Bytes(bytes) => out.write_all(bytes)?,
        Captured::Json(value) => {
            let pretty = serde_json::to_string_pretty(value).map_err(anyhow::Error::from)?;
            writeln!(out, "{pretty}")?;
        }
    }
    out.flush()?;
    Ok(())
}

/// Exit code the binary reports for an outcome.
pub fn exit_code(outcome: &Outcome) -> i32 {
    if let Some(code) = outcome.code {
        return code;
    }
    #[cfg(unix)]
    {
        if let Some(number) = outcome
            .signal
            .as_deref()
            .and_then(crate::shell::signal_number)
        {
            return 128 + number;
        }
    }
    1
}
