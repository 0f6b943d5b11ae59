//! Rule-driven filesystem watcher.
//!
//! Watches directory trees for change notifications and, for each changed
//! path, evaluates an ordered set of declarative rules to decide whether to
//! rename and/or relocate the file.

pub mod actions;
pub mod config;
pub mod filters;
pub mod models;
pub mod watcher;

pub use config::{load_rules, Action, ConfigError, Filter, Rule, Settings};
pub use models::{ChangeEvent, FileOp};
pub use watcher::Dispatcher;
