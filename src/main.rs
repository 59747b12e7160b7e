//! scopegraph CLI - build and inspect per-file scope resolution graphs

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use scopegraph::adapter::{AdapterRegistry, LanguageAdapter};
use scopegraph::config::{self, ScopegraphConfig};
use scopegraph::debug::{context, ScopeDebug};
use scopegraph::ignore::IgnoreFilter;
use scopegraph::ui::{self, AdapterRow, Icons, LanguageRow, ProgressManager, TableBuilder};
use scopegraph::{GraphStats, NodeKind, ResolveStats, UnitMessage};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "scopegraph")]
#[command(version)]
#[command(about = "Per-file scope graphs: which definition does each name refer to")]
#[command(long_about = r#"
scopegraph parses a source file, builds its lexical scope graph and binds
every reference to the definition or import it denotes.

Example usage:
  scopegraph render --file src/app.py
  scopegraph lookup --file src/app.py --line 12 --column 8
  scopegraph stats --path ./src
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file (defaults to ./scopegraph.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

impl Format {
    /// Command-line flag first, then the config file, then text
    fn pick(flag: Option<Format>, config: &ScopegraphConfig) -> Format {
        flag.or_else(|| match config.format.as_deref() {
            Some("json") => Some(Format::Json),
            Some("text") | None => None,
            Some(other) => {
                tracing::warn!("unknown format `{}` in config, using text", other);
                None
            }
        })
        .unwrap_or(Format::Text)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the resolved scope tree of a file
    Render {
        /// File to analyze
        #[arg(short, long)]
        file: PathBuf,

        /// Language name, overriding detection by extension
        #[arg(short, long)]
        language: Option<String>,

        /// Output format
        #[arg(long, value_enum)]
        format: Option<Format>,
    },

    /// Show the binding and usages of the name at a position
    Lookup {
        /// File to analyze
        #[arg(short, long)]
        file: PathBuf,

        /// Line number (1-based)
        #[arg(short = 'L', long)]
        line: usize,

        /// Column number (1-based, in bytes)
        #[arg(short = 'C', long, default_value = "1")]
        column: usize,

        /// Language name, overriding detection by extension
        #[arg(short, long)]
        language: Option<String>,
    },

    /// Build and resolve every supported file under a directory
    Stats {
        /// Directory to analyze (defaults to `path` in the config, then `.`)
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Worker threads
        #[arg(short, long)]
        threads: Option<usize>,

        /// Output format
        #[arg(long, value_enum)]
        format: Option<Format>,
    },

    /// List built-in language adapters and their namespaces
    Languages,

    /// Write a default scopegraph.toml
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);

    if let Commands::Init { force } = cli.command {
        return init(&config_path, force);
    }

    let config = config::load_config(Some(&config_path))?.unwrap_or_default();
    let registry = AdapterRegistry::from_config(&config)?;

    match cli.command {
        Commands::Render { file, language, format } => {
            render(&registry, &file, language.as_deref(), Format::pick(format, &config))
        }
        Commands::Lookup { file, line, column, language } => {
            lookup(&registry, &file, line, column, language.as_deref())
        }
        Commands::Stats { path, threads, format } => {
            let root = path
                .or_else(|| config.path.as_ref().map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from("."));
            let threads = threads
                .or(config.threads)
                .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
                .max(1);
            stats(&registry, &config, &root, threads, Format::pick(format, &config))
        }
        Commands::Languages => {
            languages(&registry);
            Ok(())
        }
        Commands::Init { force } => init(&config_path, force),
    }
}

fn select_adapter<'r>(
    registry: &'r AdapterRegistry,
    file: &Path,
    language: Option<&str>,
) -> anyhow::Result<&'r dyn LanguageAdapter> {
    let adapter = match language {
        Some(name) => registry.find_by_name(name),
        None => registry.find_adapter(file),
    };
    adapter.ok_or_else(|| {
        let what = language
            .map(str::to_string)
            .unwrap_or_else(|| file.display().to_string());
        scopegraph::Error::UnsupportedLanguage(what).into()
    })
}

fn read_source(file: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))
}

fn render(
    registry: &AdapterRegistry,
    file: &Path,
    language: Option<&str>,
    format: Format,
) -> anyhow::Result<()> {
    let adapter = select_adapter(registry, file, language)?;
    let content = read_source(file)?;
    let unit = adapter.analyze(&file.to_string_lossy(), &content)?;
    tracing::info!(
        "{}: {} references, {} resolved",
        unit.path,
        unit.stats.references,
        unit.stats.resolved()
    );

    let debug = ScopeDebug::new(&unit.graph, unit.graph.root(), &content, adapter.namespaces());
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&debug)?),
        Format::Text => print!("{}", debug),
    }
    Ok(())
}

/// Byte offset of a 1-based line and column, if it lies within that line
fn byte_offset(content: &str, line: usize, column: usize) -> Option<usize> {
    let line_start = if line <= 1 {
        0
    } else {
        content.match_indices('\n').nth(line - 2)?.0 + 1
    };
    let line_end = content[line_start..]
        .find('\n')
        .map(|i| line_start + i)
        .unwrap_or(content.len());
    let byte = line_start + column.saturating_sub(1);
    (byte <= line_end).then_some(byte)
}

fn lookup(
    registry: &AdapterRegistry,
    file: &Path,
    line: usize,
    column: usize,
    language: Option<&str>,
) -> anyhow::Result<()> {
    let adapter = select_adapter(registry, file, language)?;
    let content = read_source(file)?;
    let unit = adapter.analyze(&file.to_string_lossy(), &content)?;
    let graph = &unit.graph;
    let namespaces = adapter.namespaces();

    let byte = byte_offset(&content, line, column)
        .ok_or_else(|| anyhow::anyhow!("{}:{}:{} is outside the file", file.display(), line, column))?;

    ui::header(&format!("{}:{}:{}", file.display(), line, column));

    let Some(node) = graph.node_at_byte(byte) else {
        ui::warn("No definition, import or reference at this position");
        return Ok(());
    };

    let target = match graph.node(node) {
        Some(NodeKind::Ref(_)) => graph.binding_of(node),
        _ => Some(node),
    };

    let Some(target) = target.and_then(|t| graph.node(t).map(|n| (t, n))) else {
        if let Some(reference) = graph.node(node) {
            let range = reference.range();
            ui::node_line(reference, false, "unresolved", &context(&range, &content));
        }
        return Ok(());
    };
    let (target, binding) = target;

    let kind = match binding {
        NodeKind::Def(def) => namespaces.label_of(def.symbol_id).to_string(),
        other => other.as_str().to_string(),
    };

    ui::section("Binding");
    let range = binding.range();
    ui::node_line(binding, true, &kind, &context(&range, &content));

    let usages = graph.references_of(target);
    ui::section(&format!("References ({})", usages.len()));
    for usage in usages {
        if let Some(reference) = graph.node(usage) {
            let range = reference.range();
            ui::node_line(reference, true, "ref", &context(&range, &content));
        }
    }

    ui::section("Scope chain");
    for scope in graph.scope_chain(target) {
        if let Some(node) = graph.node(scope) {
            let range = node.range();
            ui::summary_row(
                Icons::SCOPE,
                &format!("{}:{} - {}:{}", range.start.row + 1, range.start.column + 1, range.end.row + 1, range.end.column + 1),
            );
        }
    }
    Ok(())
}

#[derive(Debug, Default, Serialize)]
struct LanguageSummary {
    files: usize,
    graph: GraphStats,
    resolution: ResolveStats,
}

#[derive(Debug, Serialize)]
struct Failure {
    path: String,
    error: String,
}

#[derive(Debug, Default, Serialize)]
struct StatsReport {
    files: usize,
    languages: BTreeMap<String, LanguageSummary>,
    failures: Vec<Failure>,
}

fn analyze_file(registry: &AdapterRegistry, file: &Path, relative_path: String) -> UnitMessage {
    let result = std::fs::read_to_string(file)
        .map_err(scopegraph::Error::from)
        .and_then(|content| registry.analyze_file(Path::new(&relative_path), &content));

    match result {
        Ok(Some(unit)) => UnitMessage::Analyzed {
            graph: unit.graph.stats(),
            resolution: unit.stats,
            language: unit.language,
            relative_path,
        },
        Ok(None) => UnitMessage::Error(relative_path, "no adapter for file".to_string()),
        Err(e) => UnitMessage::Error(relative_path, e.to_string()),
    }
}

fn stats(
    registry: &AdapterRegistry,
    config: &ScopegraphConfig,
    root: &Path,
    threads: usize,
    format: Format,
) -> anyhow::Result<()> {
    let filter = IgnoreFilter::new(root, &config.exclude);
    let files: Vec<PathBuf> = filter
        .source_files(root)
        .into_iter()
        .filter(|path| registry.find_adapter(path).is_some())
        .collect();

    if files.is_empty() {
        ui::warn(&format!("No supported source files under {}", root.display()));
        return Ok(());
    }
    tracing::info!("Analyzing {} files with {} threads", files.len(), threads);

    let (job_tx, job_rx) = crossbeam::channel::unbounded::<PathBuf>();
    let (msg_tx, msg_rx) = crossbeam::channel::unbounded::<UnitMessage>();
    for file in &files {
        job_tx.send(file.clone())?;
    }
    drop(job_tx);

    let progress = (format == Format::Text).then(|| ProgressManager::new(files.len()));
    let started = Instant::now();
    let mut report = StatsReport::default();

    std::thread::scope(|s| {
        for _ in 0..threads {
            let job_rx = job_rx.clone();
            let msg_tx = msg_tx.clone();
            s.spawn(move || {
                for file in job_rx {
                    let relative_path = file
                        .strip_prefix(root)
                        .unwrap_or(&file)
                        .to_string_lossy()
                        .to_string();
                    if msg_tx.send(analyze_file(registry, &file, relative_path)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(msg_tx);

        for msg in msg_rx.iter() {
            match msg {
                UnitMessage::Analyzed { relative_path, language, graph, resolution } => {
                    let summary = report.languages.entry(language).or_default();
                    summary.files += 1;
                    summary.graph.merge(&graph);
                    summary.resolution.merge(&resolution);
                    report.files += 1;
                    if let Some(progress) = &progress {
                        progress.inc(&relative_path);
                    }
                }
                UnitMessage::Error(path, error) => {
                    tracing::debug!("failed to analyze {}: {}", path, error);
                    if let Some(progress) = &progress {
                        progress.inc(&path);
                    }
                    report.failures.push(Failure { path, error });
                }
            }
        }
    });
    report.failures.sort_by(|a, b| a.path.cmp(&b.path));

    if format == Format::Json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let mut totals = ResolveStats::default();
    let rows: Vec<LanguageRow> = report
        .languages
        .iter()
        .map(|(language, summary)| {
            totals.merge(&summary.resolution);
            LanguageRow::new(language, summary.files, &summary.graph)
        })
        .collect();

    if let Some(progress) = &progress {
        progress.finish_with_summary(started.elapsed(), report.files, totals.references, totals.resolved());
    }

    ui::section(&format!("{} Scope graphs under {}", Icons::STATS, root.display()));
    println!("{}", ui::table::rounded(&rows));

    let mut table = TableBuilder::new();
    table.add_row("Bound to definitions", &totals.to_definitions.to_string());
    table.add_row("Bound to imports", &totals.to_imports.to_string());
    table.add_row("Unresolved", &totals.unresolved.to_string());
    println!("{}", table.build());

    for failure in &report.failures {
        ui::error(&format!("{}: {}", failure.path, failure.error));
    }
    Ok(())
}

fn languages(registry: &AdapterRegistry) {
    let rows: Vec<AdapterRow> = registry
        .adapters()
        .iter()
        .map(|adapter| AdapterRow {
            language: adapter.language_name().to_string(),
            extensions: adapter.file_extensions().join(", "),
            namespaces: adapter.namespaces().to_string(),
        })
        .collect();
    ui::section(&format!("{} Language adapters", Icons::PACKAGE));
    println!("{}", ui::table::rounded(&rows));
}

fn init(path: &Path, force: bool) -> anyhow::Result<()> {
    let defaults = ScopegraphConfig {
        path: Some(".".to_string()),
        format: Some("text".to_string()),
        ..Default::default()
    };
    config::write_config(path, &defaults, force)?;
    ui::success(&format!("Wrote {}", path.display()));
    ui::info("Next", "add [languages.<name>] sections to override queries or namespaces");
    Ok(())
}
