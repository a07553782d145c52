//! Concurrent processing of discovered files
//!
//! A rayon pool sized `min(available parallelism, files)` reads and transforms entries.
//! Results and the processed counter sit behind one mutex; progress is reported under that
//! lock so successive calls never go backwards. Records arrive in completion order and are
//! re-sorted by display path before serialization.

use rayon::prelude::*;
use std::fs;
use std::io::Write;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

use crate::collect::transform::ContentTransformer;
use crate::core::error::CollectError;
use crate::core::model::{FileEntry, OutputDocument, OutputRecord};

/// Records gathered by one pass over the entry list
#[derive(Debug, Default)]
pub struct Collected {
    /// (display path, record) in completion order
    pub records: Vec<(String, OutputRecord)>,
    /// Files handled, successful or not
    pub processed: usize,
    /// Display paths of files that could not be read, in completion order
    pub failed: Vec<String>,
    /// Size of the worker pool used
    pub workers: usize,
}

impl Collected {
    /// Order records by the display path of the entry that produced them
    pub fn into_document(mut self) -> OutputDocument {
        self.records.sort_by(|a, b| a.0.cmp(&b.0));
        self.records.into_iter().map(|(_, record)| record).collect()
    }
}

#[derive(Default)]
struct Shared {
    records: Vec<(String, OutputRecord)>,
    processed: usize,
    failed: Vec<String>,
}

/// Never more workers than files, and at least one when there is work
pub fn worker_count(available: usize, files: usize) -> usize {
    available.max(1).min(files)
}

fn available_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Build the output record for one entry; `None` when it ends up with neither key
pub fn build_record(
    entry: &FileEntry,
    transformer: &ContentTransformer,
) -> Result<Option<OutputRecord>, CollectError> {
    let mut record = OutputRecord::default();

    if entry.mode.wants_path() {
        record.path = Some(entry.path.clone());
    }

    if entry.mode.wants_content() {
        let bytes = fs::read(&entry.source_path).map_err(|source| CollectError::Read {
            path: entry.source_path.clone(),
            source,
        })?;
        let text = String::from_utf8_lossy(&bytes);
        let content = transformer.transform(&text, &entry.format);
        if !content.is_empty() {
            record.content = Some(content);
        }
    }

    Ok((!record.is_empty()).then_some(record))
}

/// Process all entries on a bounded pool, reporting `(done, total)` after every file
pub fn process_entries<F>(
    entries: &[FileEntry],
    transformer: &ContentTransformer,
    progress: &F,
) -> Result<Collected, CollectError>
where
    F: Fn(usize, usize) + Sync,
{
    let total = entries.len();
    if total == 0 {
        progress(0, 0);
        return Ok(Collected::default());
    }

    let workers = worker_count(available_parallelism(), total);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("collect-worker-{}", i))
        .build()?;
    debug!(workers, files = total, "processing files");

    let shared = Mutex::new(Shared::default());
    pool.install(|| {
        entries.par_iter().for_each(|entry| {
            let outcome = build_record(entry, transformer);

            let mut state = shared.lock().unwrap_or_else(PoisonError::into_inner);
            match outcome {
                Ok(Some(record)) => state.records.push((entry.path.clone(), record)),
                Ok(None) => debug!(path = %entry.path, "empty record dropped"),
                Err(e) => {
                    warn!(path = %entry.path, error = %e, "failed to process file, skipping");
                    state.failed.push(entry.path.clone());
                }
            }
            state.processed += 1;
            progress(state.processed, total);
        });
    });

    let state = shared.into_inner().unwrap_or_else(PoisonError::into_inner);
    Ok(Collected {
        records: state.records,
        processed: state.processed,
        failed: state.failed,
        workers,
    })
}

/// Pretty-printed JSON bytes of the document
pub fn serialize_document(document: &OutputDocument) -> Result<Vec<u8>, CollectError> {
    Ok(serde_json::to_vec_pretty(document)?)
}

/// Serialize the document into `writer`, returning the number of bytes written
pub fn write_document<W: Write>(
    document: &OutputDocument,
    mut writer: W,
) -> Result<usize, CollectError> {
    let bytes = serialize_document(document)?;
    writer.write_all(&bytes).map_err(CollectError::Output)?;
    writer.flush().map_err(CollectError::Output)?;
    Ok(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ContentExclusionRule;
    use crate::core::model::CollectMode;
    use std::collections::HashSet;
    use std::path::Path;
    use tempfile::tempdir;

    fn entry(dir: &Path, name: &str, content: Option<&str>, mode: CollectMode) -> FileEntry {
        let source_path = dir.join(name);
        if let Some(content) = content {
            fs::write(&source_path, content).unwrap();
        }
        FileEntry {
            path: format!("proj/{}", name),
            original_path: name.to_string(),
            source_path,
            mode,
            size_bytes: content.map(|c| c.len() as u64).unwrap_or(0),
            format: crate::core::paths::file_format(Path::new(name)),
        }
    }

    #[test]
    fn test_worker_count() {
        assert_eq!(worker_count(8, 3), 3);
        assert_eq!(worker_count(2, 3), 2);
        assert_eq!(worker_count(0, 3), 1);
        assert_eq!(worker_count(8, 0), 0);
    }

    #[test]
    fn test_build_record_modes() {
        let temp = tempdir().unwrap();
        let t = ContentTransformer::default();

        let both = entry(temp.path(), "a.go", Some("package  a\n"), CollectMode::Both);
        let record = build_record(&both, &t).unwrap().unwrap();
        assert_eq!(record.path.as_deref(), Some("proj/a.go"));
        assert_eq!(record.content.as_deref(), Some("package a"));

        let path_only = entry(temp.path(), "b.go", Some("package b"), CollectMode::Path);
        let record = build_record(&path_only, &t).unwrap().unwrap();
        assert_eq!(record.path.as_deref(), Some("proj/b.go"));
        assert!(record.content.is_none());

        let content_only = entry(temp.path(), "c.go", Some("package c"), CollectMode::Content);
        let record = build_record(&content_only, &t).unwrap().unwrap();
        assert!(record.path.is_none());
        assert_eq!(record.content.as_deref(), Some("package c"));
    }

    #[test]
    fn test_path_mode_does_not_read_file() {
        let temp = tempdir().unwrap();
        let missing = entry(temp.path(), "gone.go", None, CollectMode::Path);
        let record = build_record(&missing, &ContentTransformer::default()).unwrap();
        assert!(record.is_some());
    }

    #[test]
    fn test_empty_content_record_dropped() {
        let temp = tempdir().unwrap();
        let blank = entry(temp.path(), "blank.go", Some(" \n\t\n"), CollectMode::Content);
        assert!(build_record(&blank, &ContentTransformer::default())
            .unwrap()
            .is_none());

        let both = entry(temp.path(), "blank2.go", Some("\n"), CollectMode::Both);
        let record = build_record(&both, &ContentTransformer::default())
            .unwrap()
            .unwrap();
        assert!(record.path.is_some());
        assert!(record.content.is_none());
    }

    #[test]
    fn test_content_exclusions_applied() {
        let temp = tempdir().unwrap();
        let t = ContentTransformer::new(&[ContentExclusionRule::delimiters(
            "vue",
            "<style>",
            "</style>",
        )]);
        let vue = entry(
            temp.path(),
            "App.vue",
            Some("<template>\n  <div/>\n</template>\n<style>\n.a { color: red }\n</style>\n"),
            CollectMode::Content,
        );
        let record = build_record(&vue, &t).unwrap().unwrap();
        assert_eq!(record.content.as_deref(), Some("<template> <div/> </template>"));
    }

    #[test]
    fn test_non_utf8_content_is_lossy() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("bin.txt");
        fs::write(&path, [b'o', b'k', 0xff, b'!']).unwrap();
        let e = FileEntry {
            path: "proj/bin.txt".to_string(),
            original_path: "bin.txt".to_string(),
            source_path: path,
            mode: CollectMode::Content,
            size_bytes: 4,
            format: "txt".to_string(),
        };
        let record = build_record(&e, &ContentTransformer::default())
            .unwrap()
            .unwrap();
        assert_eq!(record.content.as_deref(), Some("ok\u{fffd}!"));
    }

    #[test]
    fn test_zero_entries_reports_once() {
        let calls = Mutex::new(Vec::new());
        let progress = |current: usize, total: usize| calls.lock().unwrap().push((current, total));

        let collected = process_entries(&[], &ContentTransformer::default(), &progress).unwrap();
        assert!(collected.records.is_empty());
        assert_eq!(collected.workers, 0);
        assert_eq!(*calls.lock().unwrap(), vec![(0, 0)]);
    }

    #[test]
    fn test_failure_isolation() {
        let temp = tempdir().unwrap();
        let mut entries: Vec<FileEntry> = (0..4)
            .map(|i| {
                entry(
                    temp.path(),
                    &format!("f{}.go", i),
                    Some("package x"),
                    CollectMode::Both,
                )
            })
            .collect();
        entries.push(entry(temp.path(), "missing.go", None, CollectMode::Both));

        let calls = Mutex::new(Vec::new());
        let progress = |current: usize, total: usize| calls.lock().unwrap().push((current, total));
        let collected =
            process_entries(&entries, &ContentTransformer::default(), &progress).unwrap();

        // The warn! event itself goes to the global subscriber and is not captured here
        assert_eq!(collected.processed, 5);
        assert_eq!(collected.records.len(), 4);
        assert_eq!(collected.failed, vec!["proj/missing.go".to_string()]);
        assert_eq!(calls.into_inner().unwrap().last(), Some(&(5, 5)));
    }

    #[test]
    fn test_progress_is_monotonic_and_complete() {
        let temp = tempdir().unwrap();
        let entries: Vec<FileEntry> = (0..20)
            .map(|i| {
                entry(
                    temp.path(),
                    &format!("f{:02}.txt", i),
                    Some("x"),
                    CollectMode::Both,
                )
            })
            .collect();

        let calls = Mutex::new(Vec::new());
        let progress = |current: usize, total: usize| calls.lock().unwrap().push((current, total));
        process_entries(&entries, &ContentTransformer::default(), &progress).unwrap();

        let calls = calls.into_inner().unwrap();
        assert_eq!(calls.len(), 20);
        assert!(calls.windows(2).all(|w| w[0].0 < w[1].0));
        assert_eq!(calls.last(), Some(&(20, 20)));
    }

    #[test]
    fn test_pool_never_exceeds_file_count() {
        let temp = tempdir().unwrap();
        let entries: Vec<FileEntry> = (0..3)
            .map(|i| {
                entry(
                    temp.path(),
                    &format!("f{}.txt", i),
                    Some("x"),
                    CollectMode::Both,
                )
            })
            .collect();

        let threads = Mutex::new(HashSet::new());
        let progress = |_: usize, _: usize| {
            if let Some(name) = std::thread::current().name() {
                threads.lock().unwrap().insert(name.to_string());
            }
        };
        let collected =
            process_entries(&entries, &ContentTransformer::default(), &progress).unwrap();

        assert!(collected.workers <= 3);
        assert!(collected.workers >= 1);
        let threads = threads.into_inner().unwrap();
        assert!(threads.len() <= 3);
        assert!(threads.iter().all(|t| t.starts_with("collect-worker-")));
    }

    #[test]
    fn test_into_document_sorted_by_display_path() {
        let collected = Collected {
            records: vec![
                (
                    "proj/b.go".to_string(),
                    OutputRecord {
                        path: None,
                        content: Some("b".to_string()),
                    },
                ),
                (
                    "proj/a.go".to_string(),
                    OutputRecord {
                        path: None,
                        content: Some("a".to_string()),
                    },
                ),
            ],
            processed: 2,
            failed: Vec::new(),
            workers: 2,
        };
        let doc = collected.into_document();
        assert_eq!(doc.project_files[0].content.as_deref(), Some("a"));
        assert_eq!(doc.project_files[1].content.as_deref(), Some("b"));
    }

    #[test]
    fn test_write_document() {
        let doc = OutputDocument::default();
        let mut buffer = Vec::new();
        let written = write_document(&doc, &mut buffer).unwrap();
        assert_eq!(written, buffer.len());
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value, serde_json::json!({ "project_files": [] }));
    }
}
