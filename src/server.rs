//! MCP server initialization for stdio and streamable-HTTP transports.
//!
//! Provides [`serve_stdio`] and [`serve_http`] entry points that wire up the
//! database, compaction evaluator, and MCP tool handler into a running server.

use crate::compaction::{create_policy, CompactionEvaluator, TracingSink};
use crate::config::SrpConfig;
use crate::db;
use crate::tools::SrpTools;
use anyhow::Result;
use rmcp::ServiceExt;
use std::sync::{Arc, Mutex};

/// Shared setup: open DB and build the evaluator from the configured policy.
fn setup_shared_state(
    config: &SrpConfig,
) -> Result<(Arc<Mutex<rusqlite::Connection>>, Arc<CompactionEvaluator>)> {
    let db_path = config.resolved_db_path();
    let conn = db::open_database(&db_path)?;
    tracing::info!(db = %db_path.display(), "database ready");

    let evaluator = build_evaluator(config)?;
    tracing::info!(policy = %evaluator.policy_name(), "compaction evaluator ready");

    Ok((Arc::new(Mutex::new(conn)), Arc::new(evaluator)))
}

/// Evaluator with the configured retention policy, logging through `tracing`.
pub fn build_evaluator(config: &SrpConfig) -> Result<CompactionEvaluator> {
    let policy = create_policy(&config.compaction)?;
    Ok(CompactionEvaluator::new(Arc::from(policy), Arc::new(TracingSink)))
}

/// Start the server on the transport named in config.
pub async fn serve(config: SrpConfig) -> Result<()> {
    match config.server.transport.as_str() {
        "stdio" => serve_stdio(config).await,
        "http" => serve_http(config).await,
        other => anyhow::bail!("unknown transport: {other}. Supported: stdio, http"),
    }
}

/// Start the MCP server over stdio transport.
pub async fn serve_stdio(config: SrpConfig) -> Result<()> {
    tracing::info!("starting SRP MCP server on stdio");

    let (db, evaluator) = setup_shared_state(&config)?;

    let tools = SrpTools::new(db, evaluator);
    let transport = rmcp::transport::stdio();

    let server = tools.serve(transport).await?;
    tracing::info!("MCP server running, waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");

    Ok(())
}

/// Start the MCP server over streamable HTTP at `/mcp`.
pub async fn serve_http(config: SrpConfig) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!(addr = %bind_addr, "starting SRP MCP server on HTTP");

    let (db, evaluator) = setup_shared_state(&config)?;

    let service = rmcp::transport::streamable_http_server::StreamableHttpService::new(
        move || Ok(SrpTools::new(db.clone(), evaluator.clone())),
        rmcp::transport::streamable_http_server::session::local::LocalSessionManager::default()
            .into(),
        Default::default(),
    );

    let router = axum::Router::new().nest_service("/mcp", service);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "MCP server listening at http://{bind_addr}/mcp");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
            tracing::info!("shutting down HTTP server");
        })
        .await?;

    Ok(())
}
