//! Collection engine
//!
//! A [`Collector`] is built from one immutable [`Config`]: include entries are parsed into
//! directives, exclusion patterns and content rules are compiled once, and the same instance
//! can then preview, run, or inspect single files any number of times.
//!
//! - include: include entry parsing
//! - matcher: path exclusion (glob and /regex/)
//! - transform: content exclusion rules and whitespace normalization
//! - scanner: single-threaded discovery
//! - pipeline: concurrent reading and record building

pub mod include;
pub mod matcher;
pub mod pipeline;
pub mod scanner;
pub mod transform;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::core::config::Config;
use crate::core::error::CollectError;
use crate::core::model::{CollectMode, FileEntry, OutputDocument, ScanDirective};
use crate::core::paths::{file_format, resolve_under};

use self::matcher::PathMatcher;
use self::pipeline::{process_entries, serialize_document, write_document};
use self::scanner::Scanner;
use self::transform::ContentTransformer;

/// Outcome of one completed run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Records written to the output document
    pub files_included: usize,
    /// Files discovered and handed to the workers
    pub files_scanned: usize,
    /// Files skipped because they could not be read
    pub files_failed: usize,
    /// Size of the serialized document
    pub output_bytes: usize,
    pub workers: usize,
    pub elapsed: Duration,
}

pub struct Collector {
    root: PathBuf,
    output: PathBuf,
    formats: Vec<String>,
    directives: Vec<ScanDirective>,
    matcher: PathMatcher,
    transformer: ContentTransformer,
}

impl Collector {
    /// Build a collector; the config is expected to have passed [`Config::validate`]
    pub fn new(config: &Config) -> Self {
        let root = config
            .root
            .canonicalize()
            .unwrap_or_else(|_| config.root.clone());

        // No include entries means the whole root, recursively
        let mut directives = include::parse_include(&config.include);
        if directives.is_empty() {
            directives.push(ScanDirective {
                path: ".".to_string(),
                mode: CollectMode::Both,
                flat_only: false,
            });
        }

        let matcher = PathMatcher::new(&root, &config.exclude_patterns);
        let transformer = ContentTransformer::new(&config.content_exclusions);
        debug!(
            root = %root.display(),
            directives = directives.len(),
            exclude_patterns = matcher.pattern_count(),
            content_rules = transformer.rule_count(),
            "collector ready"
        );

        Self {
            matcher,
            transformer,
            directives,
            formats: config.normalized_formats(),
            output: config.output.clone(),
            root,
        }
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Discover files without reading them
    pub fn preview(&self) -> Result<Vec<FileEntry>, CollectError> {
        Scanner::new(&self.root, &self.formats, &self.matcher).discover(&self.directives)
    }

    /// Build the output document in memory
    pub fn collect<F>(&self, progress: &F) -> Result<OutputDocument, CollectError>
    where
        F: Fn(usize, usize) + Sync,
    {
        self.gather(progress).map(|(document, _)| document)
    }

    /// Run the whole pipeline and write the document to the configured output path
    pub fn run<F>(&self, progress: &F) -> Result<RunSummary, CollectError>
    where
        F: Fn(usize, usize) + Sync,
    {
        let started = Instant::now();
        let (document, mut summary) = self.gather(progress)?;

        let bytes = serialize_document(&document)?;
        fs::write(&self.output, &bytes).map_err(|source| CollectError::Write {
            path: self.output.clone(),
            source,
        })?;

        summary.output_bytes = bytes.len();
        summary.elapsed = started.elapsed();
        info!(
            included = summary.files_included,
            scanned = summary.files_scanned,
            failed = summary.files_failed,
            bytes = summary.output_bytes,
            output = %self.output.display(),
            "run finished"
        );
        Ok(summary)
    }

    /// Same as [`Collector::run`], writing the document to `writer` instead
    pub fn run_to_writer<W, F>(&self, writer: W, progress: &F) -> Result<RunSummary, CollectError>
    where
        W: Write,
        F: Fn(usize, usize) + Sync,
    {
        let started = Instant::now();
        let (document, mut summary) = self.gather(progress)?;
        summary.output_bytes = write_document(&document, writer)?;
        summary.elapsed = started.elapsed();
        Ok(summary)
    }

    /// Document plus every summary field except output size and elapsed time
    fn gather<F>(&self, progress: &F) -> Result<(OutputDocument, RunSummary), CollectError>
    where
        F: Fn(usize, usize) + Sync,
    {
        let entries = self.preview()?;
        let collected = process_entries(&entries, &self.transformer, progress)?;
        let files_scanned = collected.processed;
        let files_failed = collected.failed.len();
        let workers = collected.workers;

        let document = collected.into_document();
        let summary = RunSummary {
            files_included: document.len(),
            files_scanned,
            files_failed,
            output_bytes: 0,
            workers,
            elapsed: Duration::ZERO,
        };
        Ok((document, summary))
    }

    /// Raw text of a file given relative to the root; paths climbing out of it are refused
    pub fn file_content(&self, relative: &str) -> Result<String, CollectError> {
        let path = resolve_under(&self.root, relative)
            .ok_or_else(|| CollectError::OutsideRoot(relative.to_string()))?;
        let bytes = fs::read(&path).map_err(|source| CollectError::Read { path, source })?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Original text and the text the pipeline would emit for it
    pub fn content_with_exclusions(&self, relative: &str) -> Result<(String, String), CollectError> {
        let original = self.file_content(relative)?;
        let format = file_format(Path::new(relative));
        let transformed = self.transformer.transform(&original, &format);
        Ok((original, transformed))
    }
}
