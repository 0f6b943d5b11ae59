//! Event dispatch.
//!
//! One long-lived collector multiplexes the notification stream and
//! processes each event to completion before reading the next. Per event:
//! debounce, existence guard, rule scan (first match wins), action
//! execution, classification logging. A rename that reveals a directory
//! enqueues synthetic Created events for its files onto the dispatcher's
//! own queue, so fan-out stays single-pass instead of recursing.

use crate::actions::{rename_with_pattern, Relocator};
use crate::config::{Rule, Settings};
use crate::filters;
use crate::models::event::is_trash_path;
use crate::models::{ChangeEvent, FileOp};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::{BTreeSet, VecDeque};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

/// Errors that can occur while setting up the watch loop
#[derive(Debug, Error)]
pub enum WatchError {
    /// The notification backend could not be created
    #[error("failed to create watcher: {0}")]
    Init(#[from] notify::Error),
}

/// How long to let the producing process settle before acting on an event.
const CREATED_DEBOUNCE: Duration = Duration::from_millis(300);
const MODIFIED_DEBOUNCE: Duration = Duration::from_millis(100);

/// Consumes change events and applies the rule set to them.
///
/// Rules and settings are injected at construction and read-only from then
/// on; there is no ambient state.
pub struct Dispatcher {
    rules: Vec<Rule>,
    settings: Settings,
    relocator: Relocator,
    queue: VecDeque<ChangeEvent>,
}

impl Dispatcher {
    pub fn new(rules: Vec<Rule>, settings: Settings) -> Self {
        Self::with_relocator(rules, settings, Relocator::new())
    }

    pub fn with_relocator(rules: Vec<Rule>, settings: Settings, relocator: Relocator) -> Self {
        Self {
            rules,
            settings,
            relocator,
            queue: VecDeque::new(),
        }
    }

    /// Subscribe to every distinct watch root and process events until a
    /// shutdown signal arrives. The in-flight event finishes; queued events
    /// are not drained.
    pub async fn run(mut self) -> Result<(), WatchError> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut watcher: RecommendedWatcher =
            notify::recommended_watcher(move |result: Result<notify::Event, notify::Error>| {
                let _ = tx.send(result);
            })?;

        let roots: BTreeSet<PathBuf> = self.rules.iter().map(|r| r.watch.clone()).collect();
        for root in &roots {
            match watcher.watch(root, RecursiveMode::NonRecursive) {
                Ok(()) => info!("now watching: {}", root.display()),
                Err(err) => warn!("couldn't watch {}: {}", root.display(), err),
            }
        }

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutting down watcher");
                    break;
                }
                received = rx.recv() => match received {
                    Some(Ok(event)) => {
                        let op = FileOp::from_event_kind(&event.kind);
                        for path in event.paths {
                            self.dispatch(ChangeEvent::new(path, op)).await;
                        }
                    }
                    Some(Err(err)) => error!("watcher error: {}", err),
                    None => {
                        warn!("watcher event channel closed");
                        break;
                    }
                },
            }
        }
        Ok(())
    }

    /// Process one event, plus any synthetic events it fans out into.
    pub async fn dispatch(&mut self, event: ChangeEvent) {
        self.queue.push_back(event);
        while let Some(next) = self.queue.pop_front() {
            self.process(next).await;
        }
    }

    async fn process(&mut self, mut event: ChangeEvent) {
        match event.op {
            FileOp::Created => tokio::time::sleep(CREATED_DEBOUNCE).await,
            FileOp::Modified => tokio::time::sleep(MODIFIED_DEBOUNCE).await,
            _ => {}
        }

        if !event.path.exists() {
            info!("skipping event for vanished path: {}", event.path.display());
            return;
        }

        let matched = self
            .rules
            .iter()
            .position(|rule| filters::matches(&event.path, &rule.filters));
        if let Some(index) = matched {
            let rule = self.rules[index].clone();
            debug!("rule {:?} matched {}", rule.name, event.path.display());
            self.run_actions(&rule, &mut event).await;
        }

        self.classify(&event);
    }

    async fn run_actions(&mut self, rule: &Rule, event: &mut ChangeEvent) {
        for action in &rule.actions {
            if let Some(pattern) = action.regex.as_deref() {
                let replacement = action.replace.as_deref().unwrap_or_default();
                match rename_with_pattern(&event.path, pattern, replacement) {
                    Ok(new_path) => {
                        info!("renamed to: {}", new_path.display());
                        event.path = new_path;
                        if event.path.is_dir() {
                            self.enqueue_directory_contents(&event.path);
                        }
                    }
                    Err(err) => {
                        error!("rename failed for {}: {}", event.path.display(), err);
                        continue;
                    }
                }
            }

            if let Some(dest_dir) = action.move_to.as_deref() {
                if self.settings.dry_run {
                    info!(
                        "dry-run: would move {} to {}",
                        event.path.display(),
                        dest_dir.display()
                    );
                } else if let Err(err) = self.relocator.relocate(&event.path, dest_dir).await {
                    error!("move failed for {}: {}", event.path.display(), err);
                }
            }
        }
    }

    /// A renamed directory's files re-enter the pipeline as synthetic
    /// Created events, so per-file rules still apply to its members.
    fn enqueue_directory_contents(&mut self, dir: &PathBuf) {
        for entry in WalkDir::new(dir) {
            match entry {
                Ok(entry) if entry.file_type().is_file() => {
                    debug!("queueing directory member: {}", entry.path().display());
                    self.queue
                        .push_back(ChangeEvent::created(entry.path().to_path_buf()));
                }
                Ok(_) => {}
                Err(err) => warn!("walk failed under {}: {}", dir.display(), err),
            }
        }
    }

    fn classify(&self, event: &ChangeEvent) {
        let path = event.path.display();
        match event.op {
            FileOp::Created => info!("created: {}", path),
            FileOp::Modified => info!("modified: {}", path),
            FileOp::Renamed => {
                if is_trash_path(&event.path) {
                    info!("moved to trash: {}", path);
                } else {
                    info!("renamed: {}", path);
                }
            }
            FileOp::Removed => info!("permanently deleted: {}", path),
            FileOp::PermissionChanged => info!("permissions changed: {}", path),
            FileOp::Unknown => info!("unknown operation: {}", path),
        }
    }
}

/// Resolves when SIGINT or SIGTERM is delivered.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(stream) => stream,
            Err(err) => {
                warn!("could not install SIGTERM handler: {}", err);
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
