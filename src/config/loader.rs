//! Loading context defaults from YAML files.
//!
//! A defaults file holds the serializable subset of [`Options`]. Fields
//! whose runtime type is a variant (`echo_command`, `capture_output`, ...)
//! are plain booleans in the file; custom predicates and transforms can
//! only be supplied from code.
//!
//! ```yaml
//! echo_command: false
//! capture_output: true
//! env:
//!   PATH: [./node_modules/.bin, PATH]
//!   NODE_ENV: production
//! ```

use super::env::EnvSpec;
use super::options::{Options, StdioMode};
use crate::error::{Result, ShellError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The on-disk shape of a defaults file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContextConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub echo_command: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_error: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell_switch: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_output: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_error: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalize_text: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdio: Option<[StdioMode; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<EnvSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_env: Option<EnvSpec>,
}

impl ContextConfig {
    /// Parse a defaults document.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        // An empty file is a valid, empty config.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| ShellError::ConfigParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Read and parse a defaults file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ShellError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        debug!("Loading defaults from {}", path.display());
        let content = fs::read_to_string(path)?;
        Self::parse(&content, path)
    }

    /// Convert into an override set. Fields absent from the file stay unset.
    pub fn into_options(self) -> Options {
        Options {
            echo_command: self.echo_command.map(Into::into),
            ignore_error: self.ignore_error,
            shell_name: self.shell_name,
            shell_switch: self.shell_switch,
            capture_output: self.capture_output.map(Into::into),
            capture_error: self.capture_error.map(Into::into),
            normalize_text: self.normalize_text.map(Into::into),
            stdio: self.stdio,
            cwd: self.cwd,
            env: self.env,
            raw_env: self.raw_env,
            ..Options::default()
        }
    }
}

/// Load a defaults file straight into [`Options`].
pub fn load_options(path: &Path) -> Result<Options> {
    ContextConfig::load(path).map(ContextConfig::into_options)
}
