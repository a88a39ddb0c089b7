use anyhow::{anyhow, Context, Result};
use chitalka::{
    DataPaths, Definition, DefinitionCache, DefinitionFetcher, FetchConfig, FetchError, StoreConfig, WiktionarySource,
};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use std::collections::{HashSet, VecDeque};
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "prefetch")]
#[command(about = "Warm the definition cache from a word list")]
struct Cli {
    /// File with one word per line; blank lines and '#' comments are skipped
    #[arg(long)]
    words: PathBuf,
    /// Directory holding the word store and its snapshot
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,
    /// Maximum lookups in flight
    #[arg(long, default_value_t = 4)]
    concurrency: usize,
    /// Minimum delay between dictionary requests, shared by all workers
    #[arg(long, default_value_t = 1000)]
    delay_ms: u64,
    /// Request timeout seconds
    #[arg(long, default_value_t = 12)]
    timeout_secs: u64,
    /// Dictionary base URL
    #[arg(long, default_value = "https://en.wiktionary.org/wiki/")]
    base_url: String,
    /// Language section to extract
    #[arg(long, default_value = "Russian")]
    section: String,
}

#[derive(Default)]
struct Tally {
    found: usize,
    not_found: usize,
    cached: usize,
    failed: usize,
}

impl Tally {
    fn done(&self) -> usize {
        self.found + self.not_found + self.cached + self.failed
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Cli::parse();

    let mut queue: VecDeque<String> = VecDeque::new();
    let mut seen = HashSet::new();
    let file = File::open(&args.words).with_context(|| format!("opening {}", args.words.display()))?;
    for line in BufReader::new(file).lines() {
        let s = line?.trim().to_string();
        if s.is_empty() || s.starts_with('#') {
            continue;
        }
        if seen.insert(s.to_lowercase()) {
            queue.push_back(s);
        }
    }
    if queue.is_empty() {
        return Err(anyhow!("no words in {}", args.words.display()));
    }
    let total = queue.len();

    fs::create_dir_all(&args.data_dir)?;
    let cache = Arc::new(DefinitionCache::open(&StoreConfig::in_dir(&DataPaths::new(&args.data_dir)))?);
    cache.initialize()?;

    let config = FetchConfig {
        base_url: args.base_url.clone(),
        timeout_secs: args.timeout_secs,
        request_delay_ms: args.delay_ms,
        section: args.section.clone(),
        ..FetchConfig::default()
    };
    let fetcher = Arc::new(DefinitionFetcher::new(cache.clone(), WiktionarySource::new(&config)?, &config));
    let concurrency = args.concurrency.max(1);
    tracing::info!(total, concurrency, delay_ms = args.delay_ms, "prefetch starting");

    let mut tally = Tally::default();
    let mut inflight: Vec<tokio::task::JoinHandle<(String, Result<(Definition, bool), FetchError>)>> = Vec::new();

    while !queue.is_empty() || !inflight.is_empty() {
        while inflight.len() < concurrency {
            let Some(word) = queue.pop_front() else { break };
            let fetcher = fetcher.clone();
            inflight.push(tokio::spawn(async move {
                let got = fetcher.fetch_definition(&word, &[]).await.map(|f| (f.definition, f.from_network));
                (word, got)
            }));
        }

        let mut i = 0;
        while i < inflight.len() {
            if !inflight[i].is_finished() {
                i += 1;
                continue;
            }
            let handle = inflight.swap_remove(i);
            match handle.await {
                Ok((_, Ok((_, false)))) => tally.cached += 1,
                Ok((_, Ok((Definition::Html(_), true)))) => tally.found += 1,
                Ok((_, Ok((Definition::NotFound, true)))) => tally.not_found += 1,
                Ok((word, Err(e))) => {
                    tracing::warn!(word = %word, error = %e, "prefetch failed");
                    tally.failed += 1;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "prefetch task panicked");
                    tally.failed += 1;
                }
            }
            if tally.done() % 25 == 0 {
                tracing::info!(done = tally.done(), total, found = tally.found, failed = tally.failed, "progress");
            }
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    let path = cache.dump_snapshot(None)?;
    cache.close()?;
    tracing::info!(
        found = tally.found,
        not_found = tally.not_found,
        cached = tally.cached,
        failed = tally.failed,
        snapshot = %path.display(),
        "prefetch done"
    );
    Ok(())
}
