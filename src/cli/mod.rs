//! Command-line interface for pshell.
//!
//! This module provides the CLI argument parsing using clap's derive macros
//! and the run command behind the `pshell` binary.
//!
//! # Architecture
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`run`] - Options layering, execution, and output reporting

pub mod args;
pub mod run;

pub use args::Cli;
pub use run::{exit_code, RunCommand};
