//! # ldp-server
//!
//! Serves an in-memory LDP store over HTTP.
//!
//! Settings come from an optional JSON config file; `--bind` and
//! `--base-url` override it. The root container is created at startup.

use clap::Parser;
use ldp_rs::{ldp_service, MemoryStore, ResourceManager, ServerConfig};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "ldp-server")]
#[command(about = "Linked Data Platform resource server")]
struct Cli {
    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Listen address, e.g. 127.0.0.1:8000
    #[arg(short, long)]
    bind: Option<String>,
    /// Public scheme and authority, e.g. https://data.example.org
    #[arg(long)]
    base_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "ldp_rs=info,ldp_server=info".to_string()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ServerConfig::load(path).await?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.bind = bind;
    }
    if let Some(base_url) = cli.base_url {
        config.base_url = Some(base_url);
    }
    config.validate()?;
    if config.pin_base_url() {
        tracing::warn!(
            "no base_url configured; resource URIs use {} regardless of Host (set --base-url to change)",
            config.base_url.as_deref().unwrap_or_default()
        );
    }

    let engine = ResourceManager::new(Arc::new(MemoryStore::new()))
        .with_slug_allocator(config.slug_allocator())
        .with_negotiator(config.negotiator());
    let engine = Arc::new(engine);

    let root = config.root_container_uri()?;
    engine.bootstrap_container(&root).await?;
    tracing::info!("root container {}", root);

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    let app = ldp_service(engine, config);
    axum::serve(listener, app).await?;
    Ok(())
}
