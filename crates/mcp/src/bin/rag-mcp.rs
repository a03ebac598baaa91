// Standalone MCP server binary

use anyhow::{Context, Result};
use clap::Parser;
use rag_mcp_core::oracle::OpenAiClient;
use rag_mcp_core::settings::{Settings, StrategyKind};
use rag_mcp_core::{CatalogStore, MatchStrategy, OracleStrategy, SimilarityStrategy};
use rag_mcp::server::McpServer;
use rag_mcp::tools::{MatchMcpTool, ToolRegistry};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "rag-mcp")]
#[command(about = "MCP server that matches task descriptions to catalogued MCPs", long_about = None)]
#[command(version)]
struct Args {
    /// Settings file (TOML); missing file means defaults
    #[arg(long, env = "RAG_MCP_CONFIG", default_value = "rag-mcp.toml")]
    config: PathBuf,

    /// Catalog file, overriding the settings file
    #[arg(long, env = "RAG_MCP_CATALOG")]
    catalog: Option<PathBuf>,

    /// Matching strategy: oracle or similarity
    #[arg(long, env = "RAG_MCP_STRATEGY")]
    strategy: Option<StrategyKind>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries protocol frames, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rag_mcp=info,rag_mcp_core=info".into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    tracing::info!("rag-mcp server starting...");

    let mut settings = Settings::load(&args.config)
        .with_context(|| format!("Failed to load settings from {}", args.config.display()))?;
    if let Some(catalog) = args.catalog {
        settings.catalog_path = catalog;
    }
    if let Some(strategy) = args.strategy {
        settings.matcher.strategy = strategy;
    }

    let (catalog, loaded) = CatalogStore::load(&settings.catalog_path);
    if !loaded {
        tracing::info!(
            path = %settings.catalog_path.display(),
            "Serving the built-in catalog"
        );
    }
    let catalog = Arc::new(catalog);

    let client = OpenAiClient::from_env(&settings.oracle)
        .context("Failed to build oracle client")?;
    if settings.oracle.api_key().is_none() {
        tracing::warn!(
            env_var = %settings.oracle.api_key_env,
            "No API key set; matching will report no matches until one is provided"
        );
    }
    let client = Arc::new(client);

    let primary = build_strategy(settings.matcher.strategy, &settings, &client);
    let mut tool = MatchMcpTool::new(catalog.clone(), primary);
    if let Some(fallback) = settings.matcher.fallback {
        if fallback != settings.matcher.strategy {
            tool = tool.with_fallback(build_strategy(fallback, &settings, &client));
        }
    }
    tracing::info!(
        strategy = %settings.matcher.strategy,
        fallback = ?settings.matcher.fallback,
        "Matcher configured"
    );

    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(tool));

    #[cfg(unix)]
    spawn_reload_on_sighup(catalog.clone(), settings.catalog_path.clone())?;

    let server = McpServer::new(catalog, registry);
    server.start().await?;

    Ok(())
}

fn build_strategy(
    kind: StrategyKind,
    settings: &Settings,
    client: &Arc<OpenAiClient>,
) -> Arc<dyn MatchStrategy> {
    match kind {
        StrategyKind::Oracle => Arc::new(
            OracleStrategy::new(client.clone()).with_temperature(settings.oracle.temperature),
        ),
        StrategyKind::Similarity => Arc::new(
            SimilarityStrategy::new(client.clone()).with_top_k(settings.matcher.top_k),
        ),
    }
}

/// Re-read the catalog file whenever the process receives SIGHUP
#[cfg(unix)]
fn spawn_reload_on_sighup(catalog: Arc<CatalogStore>, path: PathBuf) -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangups = signal(SignalKind::hangup()).context("Failed to install SIGHUP handler")?;
    tokio::spawn(async move {
        while hangups.recv().await.is_some() {
            reload(&catalog, &path);
        }
    });
    Ok(())
}

#[cfg(unix)]
fn reload(catalog: &CatalogStore, path: &std::path::Path) {
    tracing::info!(path = %path.display(), "SIGHUP received, reloading catalog");
    if !catalog.reload(path) {
        tracing::warn!("Catalog file unavailable, reverted to built-in catalog");
    }
}
