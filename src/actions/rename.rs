//! Pattern-substitution rename.
//!
//! The regular expression is applied to the base name only; the directory
//! portion is never touched. When the renamed entity is a directory, the
//! dispatcher walks its contents and re-injects each file as a synthetic
//! Created event.

use super::ActionError;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

/// Rename `source` by substituting `pattern` with `replacement` in its base
/// name. The replacement may reference capture groups ($1, $2, ...).
/// Returns the new path.
pub fn rename_with_pattern(
    source: &Path,
    pattern: &str,
    replacement: &str,
) -> Result<PathBuf, ActionError> {
    if !source.exists() {
        return Err(ActionError::NotFound(source.to_path_buf()));
    }

    let re = Regex::new(pattern).map_err(|err| ActionError::Pattern {
        pattern: pattern.to_string(),
        source: err,
    })?;

    let base_name = source
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| ActionError::NotFound(source.to_path_buf()))?;
    let new_base = re.replace_all(&base_name, replacement).to_string();
    let new_path = match source.parent() {
        Some(parent) => parent.join(&new_base),
        None => PathBuf::from(&new_base),
    };

    if new_path == source {
        return Ok(new_path);
    }

    fs::rename(source, &new_path).map_err(|err| ActionError::Rename {
        from: source.to_path_buf(),
        to: new_path.clone(),
        source: err,
    })?;
    Ok(new_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn test_rename_with_capture_group() {
        let dir = tempfile::TempDir::new().unwrap();
        let src = dir.path().join("report_2024.csv");
        File::create(&src).unwrap();

        let new_path = rename_with_pattern(&src, r"report_(\d+)", "summary_$1").unwrap();

        assert_eq!(new_path, dir.path().join("summary_2024.csv"));
        assert!(new_path.exists());
        assert!(!src.exists());
    }

    #[test]
    fn test_rename_leaves_directory_portion_untouched() {
        let dir = tempfile::TempDir::new().unwrap();
        let sub = dir.path().join("report_archive");
        std::fs::create_dir(&sub).unwrap();
        let src = sub.join("report_old.txt");
        File::create(&src).unwrap();

        // "report" appears in the parent directory name too; only the base
        // name may change.
        let new_path = rename_with_pattern(&src, "report", "summary").unwrap();
        assert_eq!(new_path, sub.join("summary_old.txt"));
        assert!(sub.exists());
    }

    #[test]
    fn test_rename_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let src = dir.path().join("incoming");
        std::fs::create_dir(&src).unwrap();
        File::create(src.join("a.txt")).unwrap();

        let new_path = rename_with_pattern(&src, "incoming", "processed").unwrap();
        assert!(new_path.is_dir());
        assert!(new_path.join("a.txt").exists());
    }

    #[test]
    fn test_non_matching_pattern_is_noop() {
        let dir = tempfile::TempDir::new().unwrap();
        let src = dir.path().join("notes.md");
        File::create(&src).unwrap();

        let new_path = rename_with_pattern(&src, r"report_(\d+)", "summary_$1").unwrap();
        assert_eq!(new_path, src);
        assert!(src.exists());
    }

    #[test]
    fn test_missing_source_is_not_found() {
        let err =
            rename_with_pattern(Path::new("/nonexistent/x.txt"), "x", "y").unwrap_err();
        assert!(matches!(err, ActionError::NotFound(_)));
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let dir = tempfile::TempDir::new().unwrap();
        let src = dir.path().join("a.txt");
        File::create(&src).unwrap();

        let err = rename_with_pattern(&src, "([unclosed", "x").unwrap_err();
        assert!(matches!(err, ActionError::Pattern { .. }));
        assert!(src.exists());
    }
}
