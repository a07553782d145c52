//! CLI module - Command-line interface definitions and handlers

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use crate::collect::{Collector, RunSummary};
use crate::core::config::{Config, ConfigOverrides, DEFAULT_CONFIG_FILE};
use crate::core::render::{OutputFormat, RenderConfig, Renderer};
use crate::core::tokenizer::TokenModel;
use crate::core::util::{format_size, truncate_string};
use crate::flows::stats::{run_stats, StatsFormat};

/// projectson - aggregate a project's files into one compact JSON document.
#[derive(Parser, Debug)]
#[command(name = "projectson")]
#[command(
    author,
    version,
    about,
    long_about = r#"projectson walks a project, selects files by include rules, formats and
exclusion patterns, strips configured content spans, collapses whitespace, and writes a
single JSON document:

    { "project_files": [ { "path": "...", "content": "..." }, ... ] }

Settings come from a YAML config file (default: projectson_config.yaml in the current
directory). Flags such as --root, --formats and --exclude override the file.

Examples:
    projectson init --root . --formats go,vue
    projectson validate
    projectson preview --format md
    projectson run -o snapshot.json
    projectson stats --tokens
"#
)]
pub struct Cli {
    /// Config file path.
    #[arg(
        short,
        long,
        global = true,
        value_name = "FILE",
        long_help = "Path to the YAML config file.\n\n\
If omitted, projectson_config.yaml in the current directory is used when present;\n\
otherwise built-in defaults apply."
    )]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: OverrideArgs,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (errors only, no progress).
    #[arg(
        short,
        long,
        global = true,
        long_help = "Only log errors and suppress the progress line. Results and summaries are\n\
still printed to stdout."
    )]
    pub quiet: bool,

    /// Verbose mode (debug logging).
    #[arg(
        short,
        long,
        global = true,
        long_help = "Log at debug level on stderr. RUST_LOG, when set, takes precedence."
    )]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags layered on top of the config file
#[derive(Args, Debug, Default)]
pub struct OverrideArgs {
    /// Project root directory.
    #[arg(short, long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Output JSON path.
    #[arg(short, long, global = true, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// File formats to collect (comma-separated extensions).
    #[arg(
        short,
        long,
        global = true,
        value_name = "EXTS",
        value_delimiter = ',',
        long_help = "Comma-separated list of file extensions to collect, without the dot.\n\n\
Matching is case-insensitive. Example: --formats go,vue,md"
    )]
    pub formats: Vec<String>,

    /// Include entries (comma-separated).
    #[arg(
        long,
        global = true,
        value_name = "ENTRIES",
        value_delimiter = ',',
        long_help = "Comma-separated include entries, relative to the root.\n\n\
Syntax: path[:mode] or dir/*[:mode]. Modes: path, content, both (default).\n\
'/*' collects only the direct children of a directory."
    )]
    pub include: Vec<String>,

    /// Exclusion patterns (comma-separated).
    #[arg(
        short,
        long,
        global = true,
        value_name = "PATTERNS",
        value_delimiter = ',',
        long_help = "Comma-separated exclusion patterns.\n\n\
Globs match the base name, and the root-relative path when they contain '/'.\n\
Patterns written as /regex/ match the base name, relative path or full path."
    )]
    pub exclude: Vec<String>,
}

impl OverrideArgs {
    fn to_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            root: self.root.clone(),
            output: self.output.clone(),
            formats: self.formats.clone(),
            include: self.include.clone(),
            exclude: self.exclude.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a default config file.
    #[command(
        long_about = "Write a config file with default values, pre-filled from --root, --output,\n\
--formats and --include when given. Refuses to overwrite an existing file unless --force.\n\n\
Examples:\n\
  projectson init\n\
  projectson init --root ../app --formats go,md -c app.yaml\n"
    )]
    Init {
        /// Overwrite an existing config file.
        #[arg(long)]
        force: bool,
    },

    /// Validate the configuration.
    Validate,

    /// List the files a run would collect.
    #[command(
        long_about = "Discover files without reading them and print one entry per file, sorted\n\
by display path.\n\n\
Examples:\n\
  projectson preview\n\
  projectson preview --format md\n"
    )]
    Preview {
        /// Output format (jsonl/json/md).
        #[arg(long, default_value = "jsonl", value_name = "FORMAT")]
        format: String,

        /// Pretty-print JSON/JSONL output.
        #[arg(long)]
        pretty: bool,
    },

    /// Collect files and write the JSON document.
    #[command(
        long_about = "Run discovery and concurrent collection, then write the document to the\n\
configured output path (or stdout with --stdout).\n\n\
Examples:\n\
  projectson run\n\
  projectson run -o build/context.json\n\
  projectson run --stdout | jq '.project_files | length'\n"
    )]
    Run {
        /// Write the document to stdout instead of the output file.
        #[arg(long)]
        stdout: bool,
    },

    /// Show statistics about the files a run would collect.
    #[command(
        long_about = "Group discovered files by format, collection mode and size.\n\n\
With --tokens the document is built in memory and its token count estimated.\n\n\
Examples:\n\
  projectson stats\n\
  projectson stats --tokens --token-model o200k\n\
  projectson stats --stats-format json\n"
    )]
    Stats {
        /// Estimate tokens of the collected document.
        #[arg(long)]
        tokens: bool,

        /// Token model (cl100k/o200k/heuristic).
        #[arg(long, default_value = "cl100k", value_name = "MODEL")]
        token_model: String,

        /// Output format (summary/json/table).
        #[arg(long = "stats-format", default_value = "summary", value_name = "FORMAT")]
        stats_format: String,
    },

    /// Show a file before and after content exclusions.
    #[command(
        long_about = "Print the original content of a file under the root, followed by the text\n\
the collector would emit for it after content exclusions and whitespace normalization.\n\n\
Example:\n\
  projectson show src/App.vue\n"
    )]
    Show {
        /// File path relative to the root.
        #[arg(value_name = "RELATIVE_PATH")]
        path: String,

        /// Maximum bytes to print for each section.
        #[arg(long, default_value = "65536", value_name = "BYTES")]
        max_bytes: usize,
    },
}

/// Install the stderr log subscriber; RUST_LOG wins over -v/-q
pub fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // A second init (e.g. in tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    if cli.no_color {
        colored::control::set_override(false);
    }

    let overrides = cli.overrides.to_overrides();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Init { force } => run_init(config_path, &overrides, force),
        Commands::Validate => {
            load_config(config_path, &overrides)?;
            println!("{}", "Configuration is valid.".green());
            Ok(())
        }
        Commands::Preview { format, pretty } => {
            let format: OutputFormat = format.parse().map_err(anyhow::Error::msg)?;
            let collector = Collector::new(&load_config(config_path, &overrides)?);
            run_preview(&collector, RenderConfig::with_pretty(format, pretty))
        }
        Commands::Run { stdout } => {
            let collector = Collector::new(&load_config(config_path, &overrides)?);
            run_collect(&collector, stdout, cli.quiet)
        }
        Commands::Stats {
            tokens,
            token_model,
            stats_format,
        } => {
            let model = if tokens {
                Some(token_model.parse::<TokenModel>().map_err(anyhow::Error::msg)?)
            } else {
                None
            };
            let format: StatsFormat = stats_format.parse().map_err(anyhow::Error::msg)?;
            let collector = Collector::new(&load_config(config_path, &overrides)?);
            run_stats(&collector, model, format)
        }
        Commands::Show { path, max_bytes } => {
            let collector = Collector::new(&load_config(config_path, &overrides)?);
            run_show(&collector, &path, max_bytes)
        }
    }
}

/// Load the config file (or defaults), apply flag overrides and validate
fn load_config(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Config> {
    let mut config = Config::load_or_default(path)?;
    config.apply_overrides(overrides);
    config
        .validate()
        .context("Configuration validation failed")?;
    Ok(config)
}

fn run_init(path: Option<&Path>, overrides: &ConfigOverrides, force: bool) -> Result<()> {
    let target = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));

    let mut config = Config::default();
    config.apply_overrides(overrides);
    config.save(target, force)?;

    println!("Default configuration saved to {}", target.display());
    println!("Please review and edit this file, especially the 'root' and 'formats' fields.");
    Ok(())
}

fn run_preview(collector: &Collector, config: RenderConfig) -> Result<()> {
    let entries = collector.preview().context("Error during file preview")?;
    if entries.is_empty() {
        eprintln!("No files found matching the criteria.");
        return Ok(());
    }

    let rendered = Renderer::with_config(config).render(&entries);
    println!("{}", rendered);
    Ok(())
}

fn run_collect(collector: &Collector, to_stdout: bool, quiet: bool) -> Result<()> {
    let show_progress = !quiet && !to_stdout;
    let progress = |current: usize, total: usize| {
        if !show_progress {
            return;
        }
        let mut err = std::io::stderr().lock();
        let _ = write!(err, "\rProcessing: {} / {} files", current, total);
        if current == total {
            let _ = writeln!(err);
        }
    };

    if to_stdout {
        let stdout = std::io::stdout();
        collector
            .run_to_writer(stdout.lock(), &progress)
            .context("Error during file collection")?;
        return Ok(());
    }

    let summary = collector
        .run(&progress)
        .context("Error during file collection")?;
    print_summary(&summary, collector.output());
    Ok(())
}

fn print_summary(summary: &RunSummary, output: &Path) {
    println!("{}", "Collection completed".green().bold());
    println!("--------------------------------------------------");
    println!("files included:  {}", summary.files_included);
    println!("files scanned:   {}", summary.files_scanned);
    if summary.files_failed > 0 {
        println!("files skipped:   {}", summary.files_failed.to_string().yellow());
    }
    println!("output size:     {}", format_size(summary.output_bytes as u64));
    println!("workers:         {}", summary.workers);
    println!("elapsed:         {:.2?}", summary.elapsed);
    println!("output written:  {}", output.display());
    println!("finished at:     {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
    println!("--------------------------------------------------");
}

fn run_show(collector: &Collector, relative: &str, max_bytes: usize) -> Result<()> {
    if Path::new(relative).is_absolute() {
        bail!("Path must be relative to the project root: {}", relative);
    }

    let (original, transformed) = collector
        .content_with_exclusions(relative)
        .with_context(|| format!("Failed to load {}", relative))?;

    for (title, text) in [("Original", original), ("Collected", transformed)] {
        let (text, truncated) = truncate_string(&text, max_bytes);
        println!("{}", format!("== {} ==", title).cyan().bold());
        println!("{}", text);
        if truncated {
            println!("{}", format!("... truncated at {} bytes", max_bytes).yellow());
        }
        println!();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_override_flags_parse() {
        let cli = Cli::try_parse_from([
            "projectson",
            "preview",
            "-r",
            "/tmp/app",
            "-f",
            "go,vue",
            "-e",
            "node_modules,/\\.min\\./",
            "--include",
            "src,docs/*:path",
        ])
        .unwrap();

        let overrides = cli.overrides.to_overrides();
        assert_eq!(overrides.root, Some(PathBuf::from("/tmp/app")));
        assert_eq!(overrides.formats, vec!["go", "vue"]);
        assert_eq!(overrides.exclude, vec!["node_modules", "/\\.min\\./"]);
        assert_eq!(overrides.include, vec!["src", "docs/*:path"]);
        assert!(matches!(cli.command, Commands::Preview { .. }));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["projectson", "run", "-q", "-c", "cfg.yaml"]).unwrap();
        assert!(cli.quiet);
        assert_eq!(cli.config, Some(PathBuf::from("cfg.yaml")));
    }
}
