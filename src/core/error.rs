//! Error types for the collection engine and the configuration layer
//!
//! Only run-level failures surface here. Per-file and per-rule problems are logged
//! and skipped by the engine instead.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CollectError {
    #[error("Cannot read project root: {path}")]
    Root {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Path is outside the project root: {0}")]
    OutsideRoot(String),

    #[error("Failed to start worker pool")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Failed to serialize output document")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write output: {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write output")]
    Output(#[source] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Config file already exists: {0} (use --force to overwrite)")]
    AlreadyExists(PathBuf),

    #[error("Failed to access config file: {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to serialize config")]
    Serialize(#[from] serde_yaml::Error),

    #[error("'root' directory not specified")]
    MissingRoot,

    #[error("'root' directory does not exist: {0}")]
    RootNotFound(PathBuf),

    #[error("no file formats specified")]
    NoFormats,

    #[error("output path not specified")]
    MissingOutput,

    #[error("could not create output directory: {path}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_root_error_display_and_source() {
        let err = CollectError::Root {
            path: PathBuf::from("/missing"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(err.to_string(), "Cannot read project root: /missing");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_config_error_display() {
        assert_eq!(
            ConfigError::NoFormats.to_string(),
            "no file formats specified"
        );
        assert_eq!(
            ConfigError::RootNotFound(PathBuf::from("/nope")).to_string(),
            "'root' directory does not exist: /nope"
        );
    }

    #[test]
    fn test_serialize_error_from() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: CollectError = json_err.into();
        assert!(matches!(err, CollectError::Serialize(_)));
    }
}
