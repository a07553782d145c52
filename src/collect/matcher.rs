//! Exclusion matching for scanned paths
//!
//! Patterns wrapped in slashes (`/regex/`) are regular expressions tested against the
//! base name, the root-relative path and the full path. Everything else is a glob:
//! always tested against the base name, and against the root-relative path only when
//! the glob itself contains a separator, so `*.log` never matches recursively by accident.

use globset::{GlobBuilder, GlobMatcher};
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::core::paths::{base_name, make_relative, normalize_path};

#[derive(Debug)]
enum CompiledPattern {
    Regex(Regex),
    Glob {
        matcher: GlobMatcher,
        match_relative: bool,
    },
}

/// Compiled exclusion patterns, in declared order
#[derive(Debug)]
pub struct PathMatcher {
    root: PathBuf,
    patterns: Vec<CompiledPattern>,
}

/// The inner expression of a `/regex/` pattern
fn regex_body(pattern: &str) -> Option<&str> {
    if pattern.len() >= 2 && pattern.starts_with('/') && pattern.ends_with('/') {
        Some(&pattern[1..pattern.len() - 1])
    } else {
        None
    }
}

fn has_separator(pattern: &str) -> bool {
    pattern.contains('/') || pattern.contains(std::path::MAIN_SEPARATOR)
}

fn compile(pattern: &str) -> Option<CompiledPattern> {
    if let Some(body) = regex_body(pattern) {
        return match Regex::new(body) {
            Ok(re) => Some(CompiledPattern::Regex(re)),
            Err(e) => {
                warn!(pattern, error = %e, "invalid regex exclude pattern, ignoring");
                None
            }
        };
    }

    if pattern.starts_with('/') {
        debug!(pattern, "exclude pattern starts with '/' but is not a /regex/, ignoring");
        return None;
    }

    match GlobBuilder::new(pattern).literal_separator(true).build() {
        Ok(glob) => Some(CompiledPattern::Glob {
            matcher: glob.compile_matcher(),
            match_relative: has_separator(pattern),
        }),
        Err(e) => {
            warn!(pattern, error = %e, "invalid glob exclude pattern, ignoring");
            None
        }
    }
}

impl PathMatcher {
    /// Compile exclusion patterns once; invalid ones are logged and dropped
    pub fn new<S: AsRef<str>>(root: &Path, patterns: &[S]) -> Self {
        let patterns = patterns
            .iter()
            .map(|p| p.as_ref().trim())
            .filter(|p| !p.is_empty())
            .filter_map(compile)
            .collect();

        Self {
            root: root.to_path_buf(),
            patterns,
        }
    }

    /// Number of usable patterns
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Whether the path is vetoed by any pattern; the first match wins
    pub fn is_excluded(&self, path: &Path) -> bool {
        if self.patterns.is_empty() {
            return false;
        }

        let base = base_name(path);
        let relative = make_relative(path, &self.root).unwrap_or_else(|| base.clone());
        let full = normalize_path(path);

        self.patterns.iter().any(|pattern| match pattern {
            CompiledPattern::Regex(re) => {
                re.is_match(&base) || re.is_match(&relative) || re.is_match(&full)
            }
            CompiledPattern::Glob {
                matcher,
                match_relative,
            } => matcher.is_match(&base) || (*match_relative && matcher.is_match(&relative)),
        })
    }
}
