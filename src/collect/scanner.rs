//! File discovery
//!
//! Walks every directive's target with walkdir, prunes excluded directories, keeps files
//! whose extension is in the format allow-list, and returns entries sorted by display path.
//! A later directive that finds the same display path replaces the earlier entry.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::collect::matcher::PathMatcher;
use crate::core::error::CollectError;
use crate::core::model::{CollectMode, FileEntry, ScanDirective};
use crate::core::paths::{base_name, display_path, file_format, make_relative, resolve_under};

/// Single-threaded directory scanner bound to one project root
pub struct Scanner<'a> {
    root: &'a Path,
    root_base: String,
    formats: HashSet<String>,
    matcher: &'a PathMatcher,
}

type Found = BTreeMap<String, FileEntry>;

impl<'a> Scanner<'a> {
    /// `formats` are expected lowercased and without a leading dot
    pub fn new(root: &'a Path, formats: &[String], matcher: &'a PathMatcher) -> Self {
        Self {
            root,
            root_base: base_name(root),
            formats: formats.iter().cloned().collect(),
            matcher,
        }
    }

    /// Discover files for all directives, deduplicated and sorted by display path
    pub fn discover(&self, directives: &[ScanDirective]) -> Result<Vec<FileEntry>, CollectError> {
        fs::read_dir(self.root).map_err(|source| CollectError::Root {
            path: self.root.to_path_buf(),
            source,
        })?;

        let mut found = Found::new();
        for directive in directives {
            let Some(target) = resolve_under(self.root, &directive.path) else {
                warn!(path = %directive.path, "include path leaves the project root, skipping");
                continue;
            };
            let metadata = match fs::metadata(&target) {
                Ok(m) => m,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    warn!(path = %target.display(), "include path not found, skipping");
                    continue;
                }
                Err(e) => {
                    warn!(path = %target.display(), error = %e, "cannot stat include path, skipping");
                    continue;
                }
            };

            if metadata.is_dir() && directive.flat_only {
                self.walk(&target, Some(1), directive.mode, &mut found);
            } else if metadata.is_dir() {
                self.walk(&target, None, directive.mode, &mut found);
            } else if !self.matcher.is_excluded(&target) && self.matches_format(&target) {
                self.record(&target, metadata.len(), directive.mode, &mut found);
            }
        }

        debug!(files = found.len(), "discovery finished");
        Ok(found.into_values().collect())
    }

    fn matches_format(&self, path: &Path) -> bool {
        self.formats.contains(&file_format(path))
    }

    /// Walk a directory; `max_depth = Some(1)` limits the walk to direct children
    fn walk(&self, dir: &Path, max_depth: Option<usize>, mode: CollectMode, found: &mut Found) {
        let mut walker = WalkDir::new(dir).sort_by_file_name();
        if let Some(depth) = max_depth {
            walker = walker.min_depth(1).max_depth(depth);
        }

        // Flat listings only filter files; recursive walks prune excluded directories too
        let flat = max_depth.is_some();
        let entries = walker.into_iter().filter_entry(|entry| {
            if flat && entry.file_type().is_dir() {
                return true;
            }
            !self.matcher.is_excluded(entry.path())
        });

        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!(error = %e, "error accessing path, skipping");
                    continue;
                }
            };

            if entry.file_type().is_dir() || !self.matches_format(entry.path()) {
                continue;
            }

            let size = match entry.metadata() {
                Ok(m) => m.len(),
                Err(e) => {
                    warn!(path = %entry.path().display(), error = %e, "could not stat file, skipping");
                    continue;
                }
            };

            self.record(entry.path(), size, mode, found);
        }
    }

    fn record(&self, path: &Path, size_bytes: u64, mode: CollectMode, found: &mut Found) {
        let Some(relative) = make_relative(path, self.root) else {
            warn!(path = %path.display(), "path is outside the project root, skipping");
            return;
        };

        let entry = FileEntry {
            path: display_path(&self.root_base, &relative),
            original_path: relative,
            source_path: path.to_path_buf(),
            mode,
            size_bytes,
            format: file_format(path),
        };
        found.insert(entry.path.clone(), entry);
    }
}
