//! Collection data model
//!
//! Every stage of a run speaks these types: include directives go into the scanner,
//! file entries come out of it, and output records are what the pipeline serializes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// What a collected file contributes to the output document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectMode {
    /// Only the display path
    Path,
    /// Only the normalized content
    Content,
    /// Path and content
    #[default]
    Both,
}

impl CollectMode {
    /// Whether records of this mode carry a `path` key
    pub fn wants_path(self) -> bool {
        matches!(self, CollectMode::Path | CollectMode::Both)
    }

    /// Whether records of this mode carry a `content` key
    pub fn wants_content(self) -> bool {
        matches!(self, CollectMode::Content | CollectMode::Both)
    }
}

impl fmt::Display for CollectMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CollectMode::Path => "path",
            CollectMode::Content => "content",
            CollectMode::Both => "both",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for CollectMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "path" => Ok(CollectMode::Path),
            "content" => Ok(CollectMode::Content),
            "both" => Ok(CollectMode::Both),
            _ => Err(format!("Unknown collection mode: {}", s)),
        }
    }
}

/// A parsed include entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanDirective {
    /// Path relative to the project root
    pub path: String,
    pub mode: CollectMode,
    /// Only direct children of `path` are considered
    pub flat_only: bool,
}

/// A file selected for collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    /// Root base name joined with the root-relative path, using '/' as separator
    pub path: String,

    /// Path relative to the project root
    pub original_path: String,

    /// Absolute location on disk (never emitted)
    #[serde(skip)]
    pub source_path: PathBuf,

    pub mode: CollectMode,

    pub size_bytes: u64,

    /// Lowercased extension without the dot
    pub format: String,
}

/// One element of `project_files`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl OutputRecord {
    /// A record with neither key contributes nothing
    pub fn is_empty(&self) -> bool {
        self.path.is_none() && self.content.is_none()
    }
}

/// The aggregate written to the output destination
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputDocument {
    pub project_files: Vec<OutputRecord>,
}

impl OutputDocument {
    pub fn len(&self) -> usize {
        self.project_files.len()
    }
}

impl FromIterator<OutputRecord> for OutputDocument {
    fn from_iter<T: IntoIterator<Item = OutputRecord>>(iter: T) -> Self {
        Self {
            project_files: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_mode_parse() {
        assert_eq!("path".parse::<CollectMode>().unwrap(), CollectMode::Path);
        assert_eq!("CONTENT".parse::<CollectMode>().unwrap(), CollectMode::Content);
        assert_eq!(" both ".parse::<CollectMode>().unwrap(), CollectMode::Both);
        assert!("lines".parse::<CollectMode>().is_err());
    }

    #[test]
    fn test_collect_mode_default() {
        assert_eq!(CollectMode::default(), CollectMode::Both);
    }

    #[test]
    fn test_collect_mode_wants() {
        assert!(CollectMode::Path.wants_path());
        assert!(!CollectMode::Path.wants_content());
        assert!(!CollectMode::Content.wants_path());
        assert!(CollectMode::Content.wants_content());
        assert!(CollectMode::Both.wants_path());
        assert!(CollectMode::Both.wants_content());
    }

    #[test]
    fn test_collect_mode_display() {
        assert_eq!(CollectMode::Path.to_string(), "path");
        assert_eq!(CollectMode::Both.to_string(), "both");
    }

    #[test]
    fn test_output_record_skips_missing_keys() {
        let record = OutputRecord {
            path: Some("proj/a.go".to_string()),
            content: None,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"path":"proj/a.go"}"#);
    }

    #[test]
    fn test_output_record_is_empty() {
        assert!(OutputRecord::default().is_empty());
        let record = OutputRecord {
            path: None,
            content: Some("x".to_string()),
        };
        assert!(!record.is_empty());
    }

    #[test]
    fn test_empty_document_shape() {
        let doc = OutputDocument::default();
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value, serde_json::json!({ "project_files": [] }));
    }

    #[test]
    fn test_file_entry_serialization_hides_source() {
        let entry = FileEntry {
            path: "proj/src/main.go".to_string(),
            original_path: "src/main.go".to_string(),
            source_path: PathBuf::from("/home/me/proj/src/main.go"),
            mode: CollectMode::Content,
            size_bytes: 42,
            format: "go".to_string(),
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("/home/me"));
        assert!(json.contains("\"mode\":\"content\""));
        assert!(json.contains("\"size_bytes\":42"));
    }

    #[test]
    fn test_document_from_iter() {
        let doc: OutputDocument = vec![OutputRecord::default(), OutputRecord::default()]
            .into_iter()
            .collect();
        assert_eq!(doc.len(), 2);
        assert!(!doc.project_files.is_empty());
    }
}
