//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use crate::config::EnvValue;
use clap::Parser;
use std::path::PathBuf;

/// pshell - run a command with captured output and composable defaults.
#[derive(Debug, Parser)]
#[command(name = "pshell")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// YAML file with default options
    #[arg(short, long, env = "PSHELL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Do not echo the command before running it
    #[arg(short, long)]
    pub quiet: bool,

    /// Exit with the child's code instead of reporting a failure
    #[arg(long)]
    pub ignore_error: bool,

    /// Capture stdout and print it once the command finishes
    #[arg(long)]
    pub capture: bool,

    /// Capture stderr and print it once the command finishes
    #[arg(long)]
    pub capture_error: bool,

    /// Parse captured stdout as JSON and pretty-print it
    #[arg(long)]
    pub json: bool,

    /// Keep captured line endings as they are
    #[arg(long)]
    pub raw: bool,

    /// Text written to the command's stdin
    #[arg(long)]
    pub input: Option<String>,

    /// Working directory for the command
    #[arg(long)]
    pub cwd: Option<PathBuf>,

    /// Set an environment variable (KEY=VALUE or KEY=[a, b, PATH])
    #[arg(short, long = "env", value_parser = parse_env_pair)]
    pub env: Vec<(String, EnvValue)>,

    /// Shell executable used to run the command
    #[arg(long)]
    pub shell: Option<String>,

    /// Switch passed to the shell before the command (repeatable)
    #[arg(long = "shell-switch", allow_hyphen_values = true)]
    pub shell_switch: Vec<String>,

    /// Run the program directly instead of through a shell
    #[arg(long)]
    pub direct: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Command to run
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

/// Parse `KEY=VALUE`. A value in brackets is read as a list.
pub fn parse_env_pair(raw: &str) -> Result<(String, EnvValue), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    if key.is_empty() {
        return Err(format!("missing variable name in '{raw}'"));
    }

    let value = if value.trim_start().starts_with('[') {
        let items: Vec<String> =
            serde_yaml::from_str(value).map_err(|e| format!("invalid list for {key}: {e}"))?;
        EnvValue::List(items)
    } else {
        EnvValue::Value(value.to_string())
    };
    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_command_and_flags() {
        let cli = Cli::parse_from([
            "pshell",
            "-q",
            "--capture",
            "-e",
            "A=1",
            "echo",
            "hello",
            "--not-a-flag",
        ]);
        assert!(cli.quiet);
        assert!(cli.capture);
        assert_eq!(cli.env, vec![("A".to_string(), EnvValue::from("1"))]);
        assert_eq!(cli.command, vec!["echo", "hello", "--not-a-flag"]);
    }

    #[test]
    fn env_pair_list_syntax() {
        let (key, value) = parse_env_pair("PATH=[/opt/bin, PATH]").unwrap();
        assert_eq!(key, "PATH");
        assert_eq!(value, EnvValue::list(["/opt/bin", "PATH"]));
    }

    #[test]
    fn env_pair_keeps_equals_in_value() {
        let (_, value) = parse_env_pair("OPTS=a=b").unwrap();
        assert_eq!(value, EnvValue::from("a=b"));
    }

    #[test]
    fn env_pair_rejects_garbage() {
        assert!(parse_env_pair("NOEQUALS").is_err());
        assert!(parse_env_pair("=value").is_err());
    }
}
