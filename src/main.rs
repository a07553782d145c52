//! projectson - collect a project's files into a single JSON document
//!
//! projectson provides:
//! - Include rules with per-entry collection modes (path, content, both)
//! - Glob and /regex/ exclusion patterns with directory pruning
//! - Content exclusion rules and whitespace normalization
//! - Concurrent collection on a bounded worker pool

use anyhow::Result;
use clap::Parser;

mod cli;
mod collect;
mod core;
mod flows;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbose, cli.quiet);
    cli::run(cli)
}
