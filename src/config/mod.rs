//! Rule document model and loading.
//!
//! Rules are declared in a YAML file with a top-level `rules:` list. Each
//! rule names a watch root, a list of filters, and a list of actions. The
//! whole set is loaded once at startup and is immutable for the process
//! lifetime; a malformed document fails the load entirely rather than
//! producing a partial rule set.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading the rule document
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The rule file could not be read
    #[error("failed to read rules from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The rule file is not valid YAML or does not match the schema
    #[error("invalid rule document {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Deserialize)]
struct RuleDocument {
    #[serde(default)]
    rules: Vec<Rule>,
}

/// One file-processing rule: a watch root, filters, and actions.
#[derive(Debug, Clone, Deserialize)]
pub struct Rule {
    pub name: String,
    pub watch: PathBuf,
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

/// Optional predicates over a candidate path.
///
/// The `operator` field is overloaded, matching the rule-file dialect: it
/// selects the age comparison (`OLDER_THAN` / `WITHIN`) for this filter's
/// `last_modified` check, and it also acts as the combinator (`OR` vs the
/// default `AND`) when this filter's verdict is folded into the running
/// result across the rule's filter list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Filter {
    /// Acceptable extensions, dot included (e.g. ".pdf"). Case-insensitive.
    #[serde(default, rename = "extension")]
    pub extensions: Vec<String>,
    /// Regex matched against the base name; a match excludes the file.
    #[serde(default)]
    pub exclude: Option<String>,
    /// Age threshold, e.g. "1h" or "30m".
    #[serde(default)]
    pub last_modified: Option<String>,
    #[serde(default)]
    pub operator: Option<String>,
}

impl Filter {
    /// Whether the age comparison keeps files older than the threshold.
    /// Anything other than `OLDER_THAN` (including absence) means `WITHIN`.
    pub fn keeps_older(&self) -> bool {
        self.operator.as_deref() == Some("OLDER_THAN")
    }

    /// Whether this filter's verdict is OR-combined into the running result.
    pub fn combines_with_or(&self) -> bool {
        self.operator.as_deref() == Some("OR")
    }
}

/// A rename and/or move instruction executed on filter match.
///
/// Within a rule, actions run in declared order and a rename's output path
/// feeds the subsequent move.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Action {
    /// Destination directory for a move.
    #[serde(default, rename = "move")]
    pub move_to: Option<PathBuf>,
    /// Rename pattern applied to the base name.
    #[serde(default)]
    pub regex: Option<String>,
    /// Replacement template; may reference capture groups ($1, $2, ...).
    #[serde(default)]
    pub replace: Option<String>,
}

/// Runtime settings resolved once at startup, threaded into the dispatcher
/// at construction rather than read from ambient state.
#[derive(Debug, Clone)]
pub struct Settings {
    /// When true, move actions emit a preview notice and touch nothing.
    pub dry_run: bool,
}

/// Read and parse the YAML rule file.
pub fn load_rules(path: &Path) -> Result<Vec<Rule>, ConfigError> {
    let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let doc: RuleDocument =
        serde_yaml::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(doc.rules)
}
