//! Filesystem change events.
//!
//! A `ChangeEvent` is the ephemeral unit of work flowing through the
//! dispatcher: a path plus the kind of operation the watch subsystem
//! observed. Events are consumed once and never persisted; a rename action
//! on a directory may synthesize new Created events for its contents.

use notify::{event::ModifyKind, EventKind};
use serde::Serialize;
use std::path::PathBuf;

/// Operation kind reported by the watch subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FileOp {
    Created,
    Modified,
    Renamed,
    Removed,
    PermissionChanged,
    Unknown,
}

impl FileOp {
    /// Translate a raw notify event kind into the operation vocabulary the
    /// rule engine works with.
    pub fn from_event_kind(kind: &EventKind) -> Self {
        match kind {
            EventKind::Create(_) => FileOp::Created,
            EventKind::Modify(ModifyKind::Name(_)) => FileOp::Renamed,
            EventKind::Modify(ModifyKind::Metadata(_)) => FileOp::PermissionChanged,
            EventKind::Modify(_) => FileOp::Modified,
            EventKind::Remove(_) => FileOp::Removed,
            _ => FileOp::Unknown,
        }
    }
}

/// One observed filesystem change: a path and what happened to it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub op: FileOp,
}

impl ChangeEvent {
    pub fn new(path: PathBuf, op: FileOp) -> Self {
        Self { path, op }
    }

    /// Synthetic Created event, used when a renamed directory's contents
    /// re-enter the pipeline.
    pub fn created(path: PathBuf) -> Self {
        Self::new(path, FileOp::Created)
    }
}

/// Platform trash-directory markers, matched as case-sensitive substrings.
const TRASH_MARKERS: &[&str] = &[
    "/Trash/",
    "/.Trash/",
    "/.local/share/Trash/",
    "/$RECYCLE.BIN/",
];

/// Whether a path points inside a known trash directory. A Renamed event on
/// such a path is classified as "moved to trash" rather than a plain rename.
pub fn is_trash_path(path: &std::path::Path) -> bool {
    let raw = path.to_string_lossy();
    TRASH_MARKERS.iter().any(|marker| raw.contains(marker))
}
