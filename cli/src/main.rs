use anyhow::{bail, Context, Result};
use chitalka::{
    ContentPipeline, DataPaths, Definition, DefinitionCache, DefinitionFetcher, FetchConfig, StoreConfig,
    WiktionarySource,
};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "chitalka")]
#[command(about = "Wrap Russian words in HTML and manage the definition cache", long_about = None)]
struct Cli {
    #[command(flatten)]
    store: StoreArgs,
    #[command(flatten)]
    fetch: FetchArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct StoreArgs {
    /// Directory holding the word store and its snapshot
    #[arg(long, global = true, default_value = "./data")]
    data_dir: PathBuf,
    /// Snapshot file (defaults to <data-dir>/words.yaml)
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,
    /// Keep the store in memory, seeded from the snapshot
    #[arg(long, global = true, default_value_t = false)]
    memory: bool,
    /// With --memory: ignore writes
    #[arg(long, global = true, default_value_t = false, requires = "memory")]
    read_only: bool,
}

#[derive(Args)]
struct FetchArgs {
    /// Dictionary base URL; the word is appended as a path segment
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Minimum delay between dictionary requests, in milliseconds
    #[arg(long, global = true)]
    delay_ms: Option<u64>,
    /// Language section to extract from each page
    #[arg(long, global = true)]
    section: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Wrap the words of an HTML file, or of every .html file under a directory
    Process {
        /// Input path (file or directory)
        input: PathBuf,
        /// Output file, or directory when the input is a directory
        #[arg(long)]
        output: PathBuf,
        /// Also look up every word found
        #[arg(long, default_value_t = false)]
        fetch: bool,
    },
    /// Look up one word and print its definition markup
    Define { word: String },
    /// Write every cached record to the snapshot
    Dump {
        #[arg(long)]
        to: Option<PathBuf>,
    },
    /// Replace the store's contents with a snapshot
    Restore {
        #[arg(long)]
        from: Option<PathBuf>,
    },
    /// Forget cached definitions (occurrences stay), then dump
    Purge,
    /// Add the Russian words that cached definitions refer to
    Augment,
    /// Delete every record
    Clear,
    /// Print record counts
    Stats,
}

impl StoreArgs {
    fn config(&self) -> StoreConfig {
        let paths = DataPaths::new(&self.data_dir);
        let snapshot = self.snapshot.clone().unwrap_or_else(|| paths.snapshot());
        if self.memory {
            StoreConfig::memory(Some(snapshot), self.read_only)
        } else {
            StoreConfig { snapshot: Some(snapshot), ..StoreConfig::in_dir(&paths) }
        }
    }
}

impl FetchArgs {
    fn config(&self) -> FetchConfig {
        let mut config = FetchConfig::default();
        if let Some(url) = &self.base_url {
            config.base_url = url.clone();
        }
        if let Some(ms) = self.delay_ms {
            config.request_delay_ms = ms;
        }
        if let Some(section) = &self.section {
            config.section = section.clone();
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    fs::create_dir_all(&cli.store.data_dir)
        .with_context(|| format!("creating data dir {}", cli.store.data_dir.display()))?;
    let cache = Arc::new(DefinitionCache::open(&cli.store.config())?);
    cache.initialize()?;

    let result = run(cli.command, cache.clone(), &cli.fetch.config()).await;
    cache.close()?;
    result
}

async fn run(command: Commands, cache: Arc<DefinitionCache>, fetch: &FetchConfig) -> Result<()> {
    match command {
        Commands::Process { input, output, fetch: with_fetch } => {
            let pipeline = ContentPipeline::new(fetcher(cache, fetch)?);
            process_path(&pipeline, &input, &output, with_fetch).await
        }
        Commands::Define { word } => {
            let fetcher = fetcher(cache, fetch)?;
            let got = fetcher.fetch_definition(&word, &[]).await?;
            match got.definition {
                Definition::Html(html) => println!("{html}"),
                Definition::NotFound => println!("{}: no {} entry", got.word, fetch.section),
            }
            Ok(())
        }
        Commands::Dump { to } => {
            let path = cache.dump_snapshot(to.as_deref())?;
            println!("dumped {} words to {}", cache.len()?, path.display());
            Ok(())
        }
        Commands::Restore { from } => {
            let count = cache.restore_snapshot(from.as_deref())?;
            println!("restored {count} words");
            Ok(())
        }
        Commands::Purge => {
            let purged = cache.purge_definitions()?;
            let path = cache.dump_snapshot(None)?;
            println!("purged {purged} definitions, snapshot at {}", path.display());
            Ok(())
        }
        Commands::Augment => {
            let report = chitalka::augment::augment(&cache)?;
            println!(
                "scanned {} words, {} with definitions, added {}",
                report.scanned,
                report.with_definition,
                report.added.len()
            );
            if !report.added.is_empty() {
                println!("{}", report.added.join(", "));
            }
            Ok(())
        }
        Commands::Clear => {
            cache.clear()?;
            println!("store cleared");
            Ok(())
        }
        Commands::Stats => {
            let records = cache.get_all()?;
            let fetched = records.iter().filter(|r| r.is_fetched()).count();
            println!("words={} fetched={} unfetched={}", records.len(), fetched, records.len() - fetched);
            Ok(())
        }
    }
}

fn fetcher(cache: Arc<DefinitionCache>, config: &FetchConfig) -> Result<DefinitionFetcher<WiktionarySource>> {
    let source = WiktionarySource::new(config)?;
    Ok(DefinitionFetcher::new(cache, source, config))
}

async fn process_path(
    pipeline: &ContentPipeline<WiktionarySource>,
    input: &Path,
    output: &Path,
    fetch: bool,
) -> Result<()> {
    if input.is_file() {
        return process_file(pipeline, input, output, fetch).await;
    }
    if !input.is_dir() {
        bail!("input {} does not exist", input.display());
    }

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(input).into_iter().filter_map(|e| e.ok()) {
        let p = entry.path();
        if p.is_file() {
            if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                if matches!(ext, "html" | "htm") {
                    files.push(p.to_path_buf());
                }
            }
        }
    }
    files.sort();
    tracing::info!(files = files.len(), input = %input.display(), "processing directory");

    for file in files {
        let rel = file.strip_prefix(input).unwrap_or(&file);
        let target = output.join(rel);
        if let Some(dir) = target.parent() {
            fs::create_dir_all(dir)?;
        }
        process_file(pipeline, &file, &target, fetch).await?;
    }
    Ok(())
}

async fn process_file(
    pipeline: &ContentPipeline<WiktionarySource>,
    input: &Path,
    output: &Path,
    fetch: bool,
) -> Result<()> {
    let html = fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))?;
    let processed = pipeline.process(&html, fetch).await;
    fs::write(output, &processed.html).with_context(|| format!("writing {}", output.display()))?;

    println!("{}: {} words -> {}", input.display(), processed.words.len(), output.display());
    for failure in &processed.failures {
        eprintln!("  failed {}: {}", failure.word, failure.error);
    }
    Ok(())
}
