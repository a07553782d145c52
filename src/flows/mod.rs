//! Flows module - Operations built on top of the collector
//!
//! Provides:
//! - stats: distribution of discovered files and token estimates

pub mod stats;
