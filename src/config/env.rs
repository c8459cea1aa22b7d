//! Environment variable composition.
//!
//! Declarative environment specs map names to either a plain value or an
//! ordered list of entries. Lists are joined with the platform path-list
//! delimiter, and any entry that names a variable of the current process
//! environment is replaced by that variable's value, so a spec can extend
//! `PATH` without reading it first.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// Separator used to join list-valued entries.
#[cfg(windows)]
pub const PATH_DELIMITER: &str = ";";

/// Separator used to join list-valued entries.
#[cfg(not(windows))]
pub const PATH_DELIMITER: &str = ":";

/// A single environment spec value.
///
/// # Example
///
/// ```
/// use pshell::config::{compose_env, EnvValue, PATH_DELIMITER};
/// use std::collections::{BTreeMap, HashMap};
///
/// let current = HashMap::from([("PATH".to_string(), "/usr/bin".to_string())]);
/// let mut spec = BTreeMap::new();
/// spec.insert("PATH".to_string(), EnvValue::list(["/opt/tool/bin", "PATH"]));
/// spec.insert("MODE".to_string(), EnvValue::from("release"));
///
/// let env = compose_env(&spec, &current);
/// assert_eq!(env["PATH"], format!("/opt/tool/bin{PATH_DELIMITER}/usr/bin"));
/// assert_eq!(env["MODE"], "release");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnvValue {
    /// Used verbatim. Numbers and booleans are read as their text.
    #[serde(deserialize_with = "scalar_string")]
    Value(String),
    /// Joined with [`PATH_DELIMITER`], with variable-name lookups.
    List(Vec<String>),
}

impl EnvValue {
    /// Build a list value from any iterable of strings.
    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Expand this value against the given environment.
    pub fn expand(&self, current: &HashMap<String, String>) -> String {
        match self {
            Self::Value(value) => value.clone(),
            Self::List(items) => items
                .iter()
                .map(|item| current.get(item).map(String::as_str).unwrap_or(item))
                .collect::<Vec<_>>()
                .join(PATH_DELIMITER),
        }
    }
}

impl From<&str> for EnvValue {
    fn from(value: &str) -> Self {
        Self::Value(value.to_string())
    }
}

impl From<String> for EnvValue {
    fn from(value: String) -> Self {
        Self::Value(value)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Int(i64),
    Unsigned(u64),
    Float(f64),
    Bool(bool),
}

fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Scalar::deserialize(deserializer)? {
        Scalar::Text(text) => text,
        Scalar::Int(n) => n.to_string(),
        Scalar::Unsigned(n) => n.to_string(),
        Scalar::Float(n) => n.to_string(),
        Scalar::Bool(b) => b.to_string(),
    })
}

/// A declarative environment specification.
pub type EnvSpec = BTreeMap<String, EnvValue>;

/// Expand every entry of `spec` into a flat map.
pub fn compose_env(spec: &EnvSpec, current: &HashMap<String, String>) -> BTreeMap<String, String> {
    spec.iter()
        .map(|(key, value)| (key.clone(), value.expand(current)))
        .collect()
}

/// The environment handed to a child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildEnv {
    /// Inherit the parent environment and layer these variables on top.
    Extend(BTreeMap<String, String>),
    /// Start from an empty environment containing only these variables.
    Replace(BTreeMap<String, String>),
}

/// Decide the child environment from the `env` and `raw_env` options.
///
/// `raw_env` takes precedence when both are present.
pub fn resolve_child_env(env: Option<&EnvSpec>, raw_env: Option<&EnvSpec>) -> Option<ChildEnv> {
    if env.is_none() && raw_env.is_none() {
        return None;
    }
    let current = current_vars();
    match (env, raw_env) {
        (Some(_), Some(raw)) => {
            warn!("both env and raw_env given; using raw_env");
            Some(ChildEnv::Replace(compose_env(raw, &current)))
        }
        (None, Some(raw)) => Some(ChildEnv::Replace(compose_env(raw, &current))),
        (Some(env), None) => Some(ChildEnv::Extend(compose_env(env, &current))),
        (None, None) => None,
    }
}

/// The parent environment, minus entries that are not valid Unicode.
///
/// Skipped entries can still be inherited by an `env` child; they just
/// cannot be spliced into list values.
fn current_vars() -> HashMap<String, String> {
    std::env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
        .collect()
}
