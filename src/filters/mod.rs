//! Filter evaluation.
//!
//! Decides whether a changed path satisfies a rule's declared conditions.
//! Filters are folded left-to-right: each filter produces its own verdict
//! from its sub-conditions (extension, exclusion, age), and that verdict is
//! combined into the running result with the filter's combinator (`OR`, or
//! the default `AND`). There is no short-circuiting and no expression-tree
//! regrouping; the fold order is the semantics.

use crate::config::Filter;
use regex::Regex;
use std::path::Path;
use std::time::SystemTime;
use tracing::warn;

/// Evaluate a rule's filter list against a candidate path.
///
/// An empty filter list matches unconditionally. Age checks require a stat
/// and a parseable threshold; either failing is a hard non-match for the
/// whole path, logged, so a broken rule configuration never silently
/// suppresses processing.
pub fn matches(path: &Path, filters: &[Filter]) -> bool {
    if filters.is_empty() {
        return true;
    }

    let mut result = true;
    for filter in filters {
        let mut matched = true;

        if !filter.extensions.is_empty() {
            let ext = path
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
                .unwrap_or_default();
            let found = filter
                .extensions
                .iter()
                .any(|declared| declared.to_lowercase() == ext);
            matched = matched && found;
        }

        if let Some(pattern) = filter.exclude.as_deref() {
            let base_name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            match Regex::new(pattern) {
                Ok(re) => matched = matched && !re.is_match(&base_name),
                Err(err) => {
                    warn!("invalid exclude pattern {:?}: {}", pattern, err);
                    return false;
                }
            }
        }

        if let Some(threshold) = filter.last_modified.as_deref() {
            let modified = match std::fs::metadata(path).and_then(|m| m.modified()) {
                Ok(t) => t,
                Err(err) => {
                    warn!("could not stat {} for age filter: {}", path.display(), err);
                    return false;
                }
            };
            let threshold = match humantime::parse_duration(threshold) {
                Ok(d) => d,
                Err(err) => {
                    warn!("invalid duration {:?}: {}", threshold, err);
                    return false;
                }
            };
            // A modification time in the future counts as age zero.
            let age = SystemTime::now()
                .duration_since(modified)
                .unwrap_or_default();
            if filter.keeps_older() {
                matched = matched && age > threshold;
            } else {
                matched = matched && age < threshold;
            }
        }

        if filter.combines_with_or() {
            result = result || matched;
        } else {
            result = result && matched;
        }
    }

    result
}
