//! Statistics flow - what a run would collect, without writing anything
//!
//! Groups discovered files by format, collection mode and size bucket. Optionally
//! builds the output document in memory and estimates its token count.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::collect::Collector;
use crate::core::model::FileEntry;
use crate::core::tokenizer::{count_tokens, TokenModel};
use crate::core::util::format_size;

/// File size buckets, smallest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SizeBucket {
    Tiny,
    Small,
    Medium,
    Large,
    Huge,
}

impl SizeBucket {
    pub const ALL: [SizeBucket; 5] = [
        SizeBucket::Tiny,
        SizeBucket::Small,
        SizeBucket::Medium,
        SizeBucket::Large,
        SizeBucket::Huge,
    ];

    pub fn of(bytes: u64) -> Self {
        const KB: u64 = 1024;
        match bytes {
            b if b < KB => SizeBucket::Tiny,
            b if b < 10 * KB => SizeBucket::Small,
            b if b < 100 * KB => SizeBucket::Medium,
            b if b < KB * KB => SizeBucket::Large,
            _ => SizeBucket::Huge,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SizeBucket::Tiny => "< 1KB",
            SizeBucket::Small => "1-10KB",
            SizeBucket::Medium => "10-100KB",
            SizeBucket::Large => "100KB-1MB",
            SizeBucket::Huge => "> 1MB",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketCount {
    pub label: String,
    pub files: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenEstimate {
    pub model: String,
    pub tokens: usize,
    /// Size of the serialized document the estimate was taken from
    pub document_bytes: usize,
}

/// Distribution of the files a run would collect
#[derive(Debug, Clone, Default, Serialize)]
pub struct CollectionStats {
    pub total_files: usize,
    pub total_bytes: u64,
    pub by_format: BTreeMap<String, usize>,
    pub by_mode: BTreeMap<String, usize>,
    /// Every bucket in size order, including empty ones
    pub by_size: Vec<BucketCount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens: Option<TokenEstimate>,
}

/// Aggregate discovered entries
pub fn calculate_stats(entries: &[FileEntry]) -> CollectionStats {
    let mut stats = CollectionStats {
        total_files: entries.len(),
        ..Default::default()
    };
    let mut buckets: BTreeMap<SizeBucket, usize> = BTreeMap::new();

    for entry in entries {
        stats.total_bytes += entry.size_bytes;

        let format = if entry.format.is_empty() {
            "(none)".to_string()
        } else {
            entry.format.clone()
        };
        *stats.by_format.entry(format).or_insert(0) += 1;
        *stats.by_mode.entry(entry.mode.to_string()).or_insert(0) += 1;
        *buckets.entry(SizeBucket::of(entry.size_bytes)).or_insert(0) += 1;
    }

    stats.by_size = SizeBucket::ALL
        .iter()
        .map(|bucket| BucketCount {
            label: bucket.label().to_string(),
            files: buckets.get(bucket).copied().unwrap_or(0),
        })
        .collect();

    stats
}

/// Stats output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatsFormat {
    /// Human-readable summary
    #[default]
    Summary,
    /// JSON object with full statistics
    Json,
    /// Markdown tables
    Table,
}

impl std::str::FromStr for StatsFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "summary" | "default" => Ok(StatsFormat::Summary),
            "json" => Ok(StatsFormat::Json),
            "table" | "md" => Ok(StatsFormat::Table),
            _ => Err(format!("Unknown stats format: {}", s)),
        }
    }
}

fn sorted_by_count(map: &BTreeMap<String, usize>) -> Vec<(&String, &usize)> {
    let mut rows: Vec<_> = map.iter().collect();
    rows.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    rows
}

fn render_summary(stats: &CollectionStats) -> String {
    let mut out = String::new();
    out.push_str("📊 Collection Statistics\n");
    out.push_str("═══════════════════════════════════════\n");
    out.push_str(&format!("  Files:        {}\n", stats.total_files));
    out.push_str(&format!("  Total size:   {}\n", format_size(stats.total_bytes)));
    if let Some(t) = &stats.tokens {
        out.push_str(&format!("  Est. Tokens:  {} ({})\n", t.tokens, t.model));
    }
    out.push_str("═══════════════════════════════════════\n");

    if !stats.by_format.is_empty() {
        out.push_str("\n📄 By format:\n");
        for (format, count) in sorted_by_count(&stats.by_format) {
            out.push_str(&format!("  {:20} {}\n", format, count));
        }
    }

    if !stats.by_mode.is_empty() {
        out.push_str("\n📌 By mode:\n");
        for (mode, count) in sorted_by_count(&stats.by_mode) {
            out.push_str(&format!("  {:20} {}\n", mode, count));
        }
    }

    out.push_str("\n📦 By size:\n");
    for bucket in &stats.by_size {
        out.push_str(&format!("  {:20} {}\n", bucket.label, bucket.files));
    }

    out
}

fn render_table(stats: &CollectionStats) -> String {
    let mut out = String::new();
    out.push_str("# Collection Statistics\n\n");
    out.push_str("| Metric | Value |\n|--------|-------|\n");
    out.push_str(&format!("| Files | {} |\n", stats.total_files));
    out.push_str(&format!("| Total size | {} |\n", format_size(stats.total_bytes)));
    if let Some(t) = &stats.tokens {
        out.push_str(&format!("| Estimated tokens ({}) | {} |\n", t.model, t.tokens));
    }

    out.push_str("\n## By format\n\n| Format | Files |\n|--------|-------|\n");
    for (format, count) in sorted_by_count(&stats.by_format) {
        out.push_str(&format!("| {} | {} |\n", format, count));
    }

    out.push_str("\n## By size\n\n| Size | Files |\n|------|-------|\n");
    for bucket in &stats.by_size {
        out.push_str(&format!("| {} | {} |\n", bucket.label, bucket.files));
    }

    out
}

/// Render statistics in the requested format
pub fn render_stats(stats: &CollectionStats, format: StatsFormat) -> Result<String> {
    match format {
        StatsFormat::Json => Ok(serde_json::to_string_pretty(stats)?),
        StatsFormat::Summary => Ok(render_summary(stats)),
        StatsFormat::Table => Ok(render_table(stats)),
    }
}

/// Run the stats command
pub fn run_stats(
    collector: &Collector,
    token_model: Option<TokenModel>,
    format: StatsFormat,
) -> Result<()> {
    let entries = collector.preview().context("Failed to discover files")?;
    let mut stats = calculate_stats(&entries);

    if let Some(model) = token_model {
        let document = collector
            .collect(&|_: usize, _: usize| {})
            .context("Failed to build document for token estimate")?;
        let text = serde_json::to_string_pretty(&document)?;
        stats.tokens = Some(TokenEstimate {
            model: model.to_string(),
            tokens: count_tokens(&text, model),
            document_bytes: text.len(),
        });
    }

    println!("{}", render_stats(&stats, format)?);
    Ok(())
}
