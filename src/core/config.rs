//! Configuration - the immutable settings value handed to a collector
//!
//! Persisted as YAML (`projectson_config.yaml` by default). CLI flags are layered on top
//! with [`ConfigOverrides`]; a changed configuration means building a new collector.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::ConfigError;

/// Default config file name, looked up in the current directory
pub const DEFAULT_CONFIG_FILE: &str = "projectson_config.yaml";

/// Default output document path
pub const DEFAULT_OUTPUT: &str = "output.json";

/// A raw content-exclusion rule as written in the config file
///
/// `type` stays a string here so that an unknown kind only disables its own rule
/// instead of failing the whole config load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentExclusionRule {
    /// "delimiters" or "regexp"
    #[serde(rename = "type")]
    pub kind: String,

    /// Glob over the file extension ("vue", "*.vue", "*")
    #[serde(default)]
    pub file_pattern: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

#[cfg(test)]
impl ContentExclusionRule {
    pub fn delimiters(file_pattern: &str, start: &str, end: &str) -> Self {
        Self {
            kind: "delimiters".to_string(),
            file_pattern: file_pattern.to_string(),
            start: Some(start.to_string()),
            end: Some(end.to_string()),
            pattern: None,
        }
    }

    pub fn regex(file_pattern: &str, pattern: &str) -> Self {
        Self {
            kind: "regexp".to_string(),
            file_pattern: file_pattern.to_string(),
            start: None,
            end: None,
            pattern: Some(pattern.to_string()),
        }
    }
}

/// Project collection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Project root directory
    pub root: PathBuf,

    /// Include entries: "path", "path:mode", "dir/*", "dir/*:mode"
    pub include: Vec<String>,

    /// Accepted file extensions (case-insensitive, without dot)
    pub formats: Vec<String>,

    /// Output document path
    pub output: PathBuf,

    /// Glob patterns, or regex patterns written as /regex/
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude_patterns: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub content_exclusions: Vec<ContentExclusionRule>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::new(),
            include: Vec::new(),
            formats: Vec::new(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            exclude_patterns: Vec::new(),
            content_exclusions: Vec::new(),
        }
    }
}

/// Values supplied on the command line; empty fields leave the config untouched
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub root: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub formats: Vec<String>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl Config {
    /// Load a config from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse a config from YAML text
    pub fn from_yaml(data: &str) -> Result<Self, serde_yaml::Error> {
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(data)
    }

    /// Load the explicit config file, or the default file if present, or defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::load(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Write the config as YAML, refusing to overwrite unless `force` is set
    pub fn save(&self, path: &Path, force: bool) -> Result<(), ConfigError> {
        if path.exists() && !force {
            return Err(ConfigError::AlreadyExists(path.to_path_buf()));
        }
        let data = serde_yaml::to_string(self)?;
        fs::write(path, data).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Layer command-line values on top of the loaded config
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(root) = &overrides.root {
            self.root = root.canonicalize().unwrap_or_else(|_| root.clone());
        }
        if let Some(output) = &overrides.output {
            self.output = output.clone();
        }
        if !overrides.formats.is_empty() {
            self.formats = overrides.formats.clone();
        }
        if !overrides.include.is_empty() {
            self.include = overrides.include.clone();
        }
        if !overrides.exclude.is_empty() {
            self.exclude_patterns = overrides.exclude.clone();
        }
    }

    /// Check the contract the collector relies on; creates the output directory if missing
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.root.as_os_str().is_empty() {
            return Err(ConfigError::MissingRoot);
        }
        if !self.root.exists() {
            return Err(ConfigError::RootNotFound(self.root.clone()));
        }
        if self.normalized_formats().is_empty() {
            return Err(ConfigError::NoFormats);
        }
        if self.output.as_os_str().is_empty() {
            return Err(ConfigError::MissingOutput);
        }
        if let Some(dir) = self.output.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir).map_err(|source| ConfigError::OutputDir {
                    path: dir.to_path_buf(),
                    source,
                })?;
            }
        }
        Ok(())
    }

    /// Formats trimmed, lowercased and stripped of a leading dot
    pub fn normalized_formats(&self) -> Vec<String> {
        self.formats
            .iter()
            .map(|f| f.trim().trim_start_matches('.').to_lowercase())
            .filter(|f| !f.is_empty())
            .collect()
    }
}
