use anyhow::Result;
use axum::Router;
use chitalka::{ContentPipeline, DataPaths, DefinitionCache, DefinitionFetcher, FetchConfig, StoreConfig, WiktionarySource};
use clap::Parser;
use server::build_app;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Directory holding the word store and its snapshot
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,
    /// Snapshot file (defaults to <data-dir>/words.yaml)
    #[arg(long)]
    snapshot: Option<PathBuf>,
    /// Serve from memory, seeded from the snapshot
    #[arg(long, default_value_t = false)]
    memory: bool,
    /// With --memory: ignore writes
    #[arg(long, default_value_t = false, requires = "memory")]
    read_only: bool,
    /// Dictionary base URL
    #[arg(long, default_value = "https://en.wiktionary.org/wiki/")]
    base_url: String,
    /// Minimum delay between dictionary requests, in milliseconds
    #[arg(long, default_value_t = 1000)]
    delay_ms: u64,
    /// Language section to extract
    #[arg(long, default_value = "Russian")]
    section: String,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let paths = DataPaths::new(&args.data_dir);
    let snapshot = args.snapshot.clone().unwrap_or_else(|| paths.snapshot());
    let store = if args.memory {
        StoreConfig::memory(Some(snapshot), args.read_only)
    } else {
        std::fs::create_dir_all(&args.data_dir)?;
        StoreConfig { snapshot: Some(snapshot), ..StoreConfig::in_dir(&paths) }
    };
    let cache = Arc::new(DefinitionCache::open(&store)?);
    cache.initialize()?;

    let fetch = FetchConfig {
        base_url: args.base_url.clone(),
        request_delay_ms: args.delay_ms,
        section: args.section.clone(),
        ..FetchConfig::default()
    };
    let fetcher = DefinitionFetcher::new(cache.clone(), WiktionarySource::new(&fetch)?, &fetch);
    let app: Router = build_app(Arc::new(ContentPipeline::new(fetcher)));

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;
    cache.close()?;
    tracing::info!("server stopped");
    Ok(())
}
