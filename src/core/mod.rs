//! Core module - Contains the fundamental data structures and utilities
//!
//! This module provides:
//! - Data model (directives, file entries, output records)
//! - Configuration loading, overrides and validation
//! - Error types for the engine and the config layer
//! - Rendering of discovered entries
//! - Path normalization utilities
//! - Token counting for the collected document

pub mod config;
pub mod error;
pub mod model;
pub mod paths;
pub mod render;
pub mod tokenizer;
pub mod util;
