//! Include entry parsing
//!
//! Syntax: `path`, `path:mode`, `dir/*` (direct children only), `dir/*:mode`.
//! Modes are `path`, `content` and `both`; anything else falls back to `both`.

use tracing::warn;

use crate::core::model::{CollectMode, ScanDirective};

const FLAT_SUFFIX: &str = "/*";

/// Parse raw include entries into directives, preserving order
pub fn parse_include<S: AsRef<str>>(entries: &[S]) -> Vec<ScanDirective> {
    entries
        .iter()
        .filter_map(|entry| parse_entry(entry.as_ref()))
        .collect()
}

fn parse_entry(entry: &str) -> Option<ScanDirective> {
    let entry = entry.trim();
    if entry.is_empty() {
        return None;
    }

    let mut flat_only = false;
    let mut path = entry;
    if let Some(stripped) = path.strip_suffix(FLAT_SUFFIX) {
        path = stripped;
        flat_only = true;
    }

    let mut mode = CollectMode::Both;
    if let Some((head, token)) = path.split_once(':') {
        path = head.trim();
        match token.parse::<CollectMode>() {
            Ok(parsed) => mode = parsed,
            Err(_) => warn!(entry, token, "unknown include mode, using 'both'"),
        }
    }

    // "dir/*:mode" carries the flat marker before the mode
    if let Some(stripped) = path.strip_suffix(FLAT_SUFFIX) {
        path = stripped;
        flat_only = true;
    }

    Some(ScanDirective {
        path: path.to_string(),
        mode,
        flat_only,
    })
}
