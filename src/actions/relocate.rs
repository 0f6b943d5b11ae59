//! Resilient file relocation.
//!
//! Moves a file into a destination directory using the fastest safe method.
//! Watch events often race against the process still writing the file, so
//! the source is allowed to vanish momentarily and is re-checked under a
//! bounded retry policy. Same-volume moves use an atomic rename;
//! cross-volume moves copy, verify, then delete, and never leave the data
//! with no intact copy: either the source survives or the destination
//! exists and the source is gone.

use super::{peer, transfer, ActionError};
use rand::Rng;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Bounded retry schedule for a source that momentarily does not exist.
///
/// Each attempt waits the base delay plus a random jitter, so multiple
/// events racing on the same path do not re-check in lockstep.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(200),
            max_jitter: Duration::from_millis(50),
        }
    }
}

type ExistenceProbe = fn(&Path) -> bool;

fn path_exists(path: &Path) -> bool {
    path.exists()
}

/// Moves files into destination directories.
pub struct Relocator {
    retry: RetryPolicy,
    probe: ExistenceProbe,
}

impl Default for Relocator {
    fn default() -> Self {
        Self::new()
    }
}

impl Relocator {
    pub fn new() -> Self {
        Self::with_policy(RetryPolicy::default())
    }

    pub fn with_policy(retry: RetryPolicy) -> Self {
        Self {
            retry,
            probe: path_exists,
        }
    }

    /// Replace the existence check (for tests).
    #[allow(dead_code)]
    pub fn with_probe(retry: RetryPolicy, probe: ExistenceProbe) -> Self {
        Self { retry, probe }
    }

    /// Move `source` into `dest_dir`, creating the directory as needed.
    /// Returns the destination path.
    pub async fn relocate(&self, source: &Path, dest_dir: &Path) -> Result<PathBuf, ActionError> {
        info!("moving {} -> {}", source.display(), dest_dir.display());

        self.await_source(source).await?;

        fs::create_dir_all(dest_dir).map_err(|err| ActionError::DirCreate {
            path: dest_dir.to_path_buf(),
            source: err,
        })?;

        let base_name = source
            .file_name()
            .ok_or_else(|| ActionError::NotFound(source.to_path_buf()))?;
        let dest_path = dest_dir.join(base_name);

        if peer::same_volume(source, dest_dir)? {
            // Fast, crash-safe path.
            fs::rename(source, &dest_path).map_err(|err| ActionError::Rename {
                from: source.to_path_buf(),
                to: dest_path.clone(),
                source: err,
            })?;
            return Ok(dest_path);
        }

        copy_and_replace(source, &dest_path)?;
        Ok(dest_path)
    }

    /// Wait for the source to exist, up to the retry budget.
    async fn await_source(&self, source: &Path) -> Result<(), ActionError> {
        for attempt in 0..self.retry.max_attempts {
            if (self.probe)(source) {
                return Ok(());
            }
            debug!(
                "source {} missing, retry {}/{}",
                source.display(),
                attempt + 1,
                self.retry.max_attempts
            );
            tokio::time::sleep(self.retry.base_delay + self.jitter()).await;
        }
        if (self.probe)(source) {
            Ok(())
        } else {
            Err(ActionError::Vanished(source.to_path_buf()))
        }
    }

    fn jitter(&self) -> Duration {
        let max = self.retry.max_jitter.as_millis() as u64;
        if max == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..max))
    }
}

/// Cross-volume move: copy, verify, then remove the source. If the source
/// cannot be removed, the fresh destination copy is deleted so the file
/// never exists in two places; the source stays canonical.
fn copy_and_replace(source: &Path, dest_path: &Path) -> Result<(), ActionError> {
    match transfer::copy_file(source, dest_path) {
        Ok(()) => {}
        Err(err @ ActionError::Open { .. }) => return Err(err),
        Err(err) => {
            // The copy started; drop the partial destination.
            let _ = fs::remove_file(dest_path);
            return Err(err);
        }
    }

    if !dest_path.exists() {
        return Err(ActionError::Verification(dest_path.to_path_buf()));
    }

    if let Err(err) = fs::remove_file(source) {
        let _ = fs::remove_file(dest_path);
        return Err(ActionError::Cleanup {
            path: source.to_path_buf(),
            source: err,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(5),
            max_jitter: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn test_same_volume_relocate_renames() {
        let dir = tempfile::TempDir::new().unwrap();
        let source = dir.path().join("invoice.pdf");
        fs::write(&source, b"pdf bytes").unwrap();
        let dest_dir = dir.path().join("archive");

        let relocator = Relocator::with_policy(fast_policy());
        let dest = relocator.relocate(&source, &dest_dir).await.unwrap();

        assert_eq!(dest, dest_dir.join("invoice.pdf"));
        assert!(!source.exists());
        assert_eq!(fs::read(&dest).unwrap(), b"pdf bytes");
    }

    #[tokio::test]
    async fn test_creates_missing_destination_segments() {
        let dir = tempfile::TempDir::new().unwrap();
        let source = dir.path().join("a.log");
        File::create(&source).unwrap();
        let dest_dir = dir.path().join("by-year/2024/logs");

        let relocator = Relocator::with_policy(fast_policy());
        relocator.relocate(&source, &dest_dir).await.unwrap();

        assert!(dest_dir.join("a.log").exists());
    }

    #[tokio::test]
    async fn test_vanished_source_after_retries() {
        let dir = tempfile::TempDir::new().unwrap();
        let source = dir.path().join("never-appears.tmp");
        let dest_dir = dir.path().join("dest");

        let relocator = Relocator::with_policy(fast_policy());
        let err = relocator.relocate(&source, &dest_dir).await.unwrap_err();

        assert!(matches!(err, ActionError::Vanished(_)));
        // Vanishing is terminal before any directory creation or copy.
        assert!(!dest_dir.exists());
    }

    #[tokio::test]
    async fn test_source_appearing_during_retry_window() {
        let dir = tempfile::TempDir::new().unwrap();
        let source = dir.path().join("late.txt");
        let dest_dir = dir.path().join("dest");

        let writer = {
            let source = source.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(60)).await;
                let mut f = File::create(&source).unwrap();
                f.write_all(b"late content").unwrap();
            })
        };

        let relocator = Relocator::with_policy(RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(50),
            max_jitter: Duration::ZERO,
        });
        let dest = relocator.relocate(&source, &dest_dir).await.unwrap();
        writer.await.unwrap();

        assert_eq!(fs::read(&dest).unwrap(), b"late content");
    }

    #[tokio::test]
    async fn test_injected_probe_short_circuits_vanish() {
        fn never(_: &Path) -> bool {
            false
        }

        let dir = tempfile::TempDir::new().unwrap();
        let source = dir.path().join("present.txt");
        File::create(&source).unwrap();

        // The probe says the file is gone even though it exists; the
        // relocator must trust the probe and report a vanish.
        let relocator = Relocator::with_probe(fast_policy(), never);
        let err = relocator
            .relocate(&source, &dir.path().join("dest"))
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::Vanished(_)));
        assert!(source.exists());
    }

    #[test]
    fn test_copy_and_replace_moves_content() {
        let dir = tempfile::TempDir::new().unwrap();
        let source = dir.path().join("src.dat");
        let dest = dir.path().join("dst.dat");
        fs::write(&source, b"across volumes").unwrap();

        copy_and_replace(&source, &dest).unwrap();

        assert!(!source.exists());
        assert_eq!(fs::read(&dest).unwrap(), b"across volumes");
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_and_replace_cleans_up_when_remove_fails() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        let source = locked.join("pinned.txt");
        fs::write(&source, b"cannot remove me").unwrap();
        let dest = dir.path().join("escaped.txt");

        // Read-only parent makes the post-copy unlink fail.
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();
        if File::create(locked.join(".probe")).is_ok() {
            // Permission bits do not bind this user (e.g. root); the
            // failure cannot be provoked here.
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }
        let result = copy_and_replace(&source, &dest);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(matches!(result, Err(ActionError::Cleanup { .. })));
        // No duplicate: the destination copy was deleted, the source is
        // still canonical.
        assert!(!dest.exists());
        assert!(source.exists());
    }
}
