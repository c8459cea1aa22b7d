//! Invocation options, environment composition, and defaults files.
//!
//! This module handles everything that decides *how* a command runs:
//! - Option types and merge rules in [`options`]
//! - Environment variable composition in [`env`]
//! - YAML defaults files in [`loader`]
//!
//! # Example
//!
//! ```
//! use pshell::config::{load_options, Options};
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! let path = temp.path().join("pshell.yml");
//! fs::write(&path, "echo_command: false\nignore_error: true\n").unwrap();
//!
//! let options = Options::defaults().merge(&load_options(&path).unwrap());
//! assert_eq!(options.ignore_error, Some(true));
//! ```

pub mod env;
pub mod loader;
pub mod options;

pub use env::{compose_env, resolve_child_env, ChildEnv, EnvSpec, EnvValue, PATH_DELIMITER};
pub use loader::{load_options, ContextConfig};
pub use options::{
    Capture, Echo, EchoFn, Normalize, NormalizeFn, Options, StdioMode, TransformFn,
};
