//! Content exclusion and whitespace normalization
//!
//! Rules run in declared order, each on the output of the previous one. Only rules whose
//! file pattern matches the file's extension apply. Normalization runs last and always.

use globset::{Glob, GlobMatcher};
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::str::FromStr;
use tracing::warn;

use crate::core::config::ContentExclusionRule;

/// Supported content exclusion kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// Strip every `start ... end` span, lazily and across lines
    Delimiters,
    /// Strip every regex match
    Regex,
}

impl FromStr for RuleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "delimiters" | "delimiter" => Ok(RuleKind::Delimiters),
            "regexp" | "regex" => Ok(RuleKind::Regex),
            _ => Err(format!("Unknown content exclusion type: {}", s)),
        }
    }
}

// Inline flag group at the very start, e.g. "(?i)" or "(?ms:"
static LEADING_FLAGS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\(\?[A-Za-z-]+[:)]").expect("static regex is valid"));

#[derive(Debug)]
enum RuleScope {
    All,
    Extension(GlobMatcher),
}

impl RuleScope {
    fn matches(&self, format: &str) -> bool {
        match self {
            RuleScope::All => true,
            RuleScope::Extension(glob) => {
                glob.is_match(format) || glob.is_match(format!(".{}", format))
            }
        }
    }
}

#[derive(Debug)]
struct CompiledRule {
    scope: RuleScope,
    strip: Regex,
}

/// Compiled content exclusion rules
#[derive(Debug, Default)]
pub struct ContentTransformer {
    rules: Vec<CompiledRule>,
}

/// Enable dot-matches-newline unless the pattern sets its own flags
fn with_default_flags(pattern: &str) -> Cow<'_, str> {
    if LEADING_FLAGS.is_match(pattern) {
        Cow::Borrowed(pattern)
    } else {
        Cow::Owned(format!("(?s){}", pattern))
    }
}

fn compile_scope(file_pattern: &str) -> Option<RuleScope> {
    let file_pattern = file_pattern.trim();
    if file_pattern == "*" {
        return Some(RuleScope::All);
    }
    if file_pattern.is_empty() {
        warn!("content exclusion rule without file_pattern, ignoring");
        return None;
    }
    match Glob::new(file_pattern) {
        Ok(glob) => Some(RuleScope::Extension(glob.compile_matcher())),
        Err(e) => {
            warn!(file_pattern, error = %e, "invalid content exclusion file_pattern, ignoring");
            None
        }
    }
}

fn compile_strip(rule: &ContentExclusionRule) -> Option<Regex> {
    let kind = match rule.kind.parse::<RuleKind>() {
        Ok(kind) => kind,
        Err(e) => {
            warn!(kind = %rule.kind, "{}", e);
            return None;
        }
    };

    let source = match kind {
        RuleKind::Delimiters => {
            let start = rule.start.as_deref().unwrap_or_default();
            let end = rule.end.as_deref().unwrap_or_default();
            if start.is_empty() || end.is_empty() {
                warn!(file_pattern = %rule.file_pattern, "delimiters rule needs both start and end, ignoring");
                return None;
            }
            format!("(?s){}.*?{}", regex::escape(start), regex::escape(end))
        }
        RuleKind::Regex => {
            let pattern = rule.pattern.as_deref().unwrap_or_default();
            if pattern.is_empty() {
                warn!(file_pattern = %rule.file_pattern, "regexp rule without pattern, ignoring");
                return None;
            }
            with_default_flags(pattern).into_owned()
        }
    };

    match Regex::new(&source) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!(pattern = %source, error = %e, "invalid content exclusion regex, ignoring");
            None
        }
    }
}

impl ContentTransformer {
    /// Compile rules once; unusable rules are logged and dropped, the rest keep their order
    pub fn new(rules: &[ContentExclusionRule]) -> Self {
        let rules = rules
            .iter()
            .filter_map(|rule| {
                let scope = compile_scope(&rule.file_pattern)?;
                let strip = compile_strip(rule)?;
                Some(CompiledRule { scope, strip })
            })
            .collect();

        Self { rules }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Apply every rule matching `format` (extension without dot), in order
    pub fn apply_exclusions(&self, content: &str, format: &str) -> String {
        let mut current = content.to_string();
        for rule in self.rules.iter().filter(|r| r.scope.matches(format)) {
            if let Cow::Owned(stripped) = rule.strip.replace_all(&current, "") {
                current = stripped;
            }
        }
        current
    }

    /// Exclusions followed by whitespace normalization
    pub fn transform(&self, content: &str, format: &str) -> String {
        collapse_whitespace(&self.apply_exclusions(content, format))
    }
}

/// Collapse every ASCII whitespace run (space, tab, LF, FF, CR) to one space and trim the ends.
/// Other Unicode spaces such as U+00A0 are content and stay as they are.
pub fn collapse_whitespace(content: &str) -> String {
    content.split_ascii_whitespace().collect::<Vec<_>>().join(" ")
}
