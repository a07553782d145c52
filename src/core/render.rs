//! Renderer module
//!
//! Renders discovered file entries to jsonl, json or md for `preview`

use crate::core::model::{CollectMode, FileEntry};
use crate::core::util::format_size;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Jsonl,
    Json,
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jsonl" => Ok(OutputFormat::Jsonl),
            "json" => Ok(OutputFormat::Json),
            "md" | "markdown" => Ok(OutputFormat::Markdown),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

/// Render configuration combining format and options
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderConfig {
    pub format: OutputFormat,
    pub pretty: bool,
}

impl RenderConfig {
    /// Create a new render config with pretty option
    pub fn with_pretty(format: OutputFormat, pretty: bool) -> Self {
        Self { format, pretty }
    }
}

/// Renderer for discovered entries
pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    pub fn with_config(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Render entries to a string
    pub fn render(&self, entries: &[FileEntry]) -> String {
        match self.config.format {
            OutputFormat::Jsonl => self.render_jsonl(entries),
            OutputFormat::Json => self.render_json(entries),
            OutputFormat::Markdown => self.render_markdown(entries),
        }
    }

    /// One JSON object per line
    fn render_jsonl(&self, entries: &[FileEntry]) -> String {
        entries
            .iter()
            .filter_map(|entry| {
                if self.config.pretty {
                    serde_json::to_string_pretty(entry).ok()
                } else {
                    serde_json::to_string(entry).ok()
                }
            })
            .collect::<Vec<_>>()
            .join(if self.config.pretty { "\n\n" } else { "\n" })
    }

    fn render_json(&self, entries: &[FileEntry]) -> String {
        if self.config.pretty {
            serde_json::to_string_pretty(entries).unwrap_or_else(|_| "[]".to_string())
        } else {
            serde_json::to_string(entries).unwrap_or_else(|_| "[]".to_string())
        }
    }

    /// Markdown grouped by collection mode
    fn render_markdown(&self, entries: &[FileEntry]) -> String {
        let mut output = String::new();

        for (title, mode) in [
            ("Path and content", CollectMode::Both),
            ("Content only", CollectMode::Content),
            ("Path only", CollectMode::Path),
        ] {
            let group: Vec<&FileEntry> = entries.iter().filter(|e| e.mode == mode).collect();
            if group.is_empty() {
                continue;
            }

            output.push_str(&format!("## {} ({})\n\n", title, group.len()));
            for entry in group {
                output.push_str(&format!(
                    "- `{}` ({})\n",
                    entry.path,
                    format_size(entry.size_bytes)
                ));
            }
            output.push('\n');
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn entry(path: &str, mode: CollectMode, size_bytes: u64) -> FileEntry {
        FileEntry {
            path: format!("proj/{}", path),
            original_path: path.to_string(),
            source_path: PathBuf::from("/tmp/proj").join(path),
            mode,
            size_bytes,
            format: "rs".to_string(),
        }
    }

    fn sample() -> Vec<FileEntry> {
        vec![
            entry("src/main.rs", CollectMode::Both, 2048),
            entry("src/lib.rs", CollectMode::Path, 10),
        ]
    }

    #[test]
    fn test_render_jsonl() {
        let output = Renderer::with_config(RenderConfig::with_pretty(OutputFormat::Jsonl, false)).render(&sample());
        assert_eq!(output.lines().count(), 2);
        assert!(output.contains("proj/src/main.rs"));
        assert!(output.contains("\"mode\":\"path\""));
    }

    #[test]
    fn test_render_does_not_leak_source_path() {
        let output = Renderer::with_config(RenderConfig::with_pretty(OutputFormat::Json, false)).render(&sample());
        assert!(!output.contains("/tmp/proj"));
    }

    #[test]
    fn test_render_json() {
        let output = Renderer::with_config(RenderConfig::with_pretty(OutputFormat::Json, false)).render(&sample());
        assert!(output.starts_with('['));
        assert!(output.ends_with(']'));
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
        assert_eq!(value[0]["original_path"], "src/main.rs");
        assert_eq!(value[0]["size_bytes"], 2048);
    }

    #[test]
    fn test_render_json_pretty() {
        let renderer = Renderer::with_config(RenderConfig::with_pretty(OutputFormat::Json, true));
        let output = renderer.render(&sample());
        assert!(output.contains("\n  {"));
    }

    #[test]
    fn test_render_markdown_groups() {
        let output = Renderer::with_config(RenderConfig::with_pretty(OutputFormat::Markdown, false)).render(&sample());
        assert!(output.contains("## Path and content (1)"));
        assert!(output.contains("## Path only (1)"));
        assert!(!output.contains("## Content only"));
        assert!(output.contains("- `proj/src/main.rs` (2.0 KB)"));
        assert!(output.contains("- `proj/src/lib.rs` (10 B)"));
    }

    #[test]
    fn test_render_markdown_empty() {
        let output = Renderer::with_config(RenderConfig::with_pretty(OutputFormat::Markdown, false)).render(&[]);
        assert!(output.is_empty());
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("jsonl".parse::<OutputFormat>().unwrap(), OutputFormat::Jsonl);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!(
            "Markdown".parse::<OutputFormat>().unwrap(),
            OutputFormat::Markdown
        );
        let err = "raw".parse::<OutputFormat>().unwrap_err();
        assert!(err.contains("Unknown format"));
    }

    #[test]
    fn test_render_config_default() {
        let config = RenderConfig::default();
        assert_eq!(config.format, OutputFormat::Jsonl);
        assert!(!config.pretty);
    }
}
