//! powchain-node: serve a ledger over HTTP.

use anyhow::{Context, Result};
use clap::Parser;
use powchain_core::DEFAULT_TARGET;
use powchain_node::{build_router, generate_node_id, Node, NodeConfig, DEFAULT_LISTEN_ADDR};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "powchain-node")]
#[command(about = "Proof-of-work ledger node", long_about = None)]
#[command(version)]
struct Args {
    /// Address to listen on
    #[arg(short, long, env = "POWCHAIN_LISTEN", default_value = DEFAULT_LISTEN_ADDR)]
    listen: SocketAddr,

    /// Hex prefix every proof digest must start with
    #[arg(short, long, env = "POWCHAIN_DIFFICULTY", default_value = DEFAULT_TARGET)]
    difficulty: String,

    /// Node identifier paid the mining reward (random if omitted)
    #[arg(long, env = "POWCHAIN_NODE_ID")]
    node_id: Option<String>,

    /// Peer to register at startup (repeatable)
    #[arg(short, long = "peer")]
    peers: Vec<String>,

    /// Timeout for fetching a peer's chain, in seconds
    #[arg(long, env = "POWCHAIN_PEER_TIMEOUT_SECS", default_value_t = 5)]
    peer_timeout_secs: u64,

    /// Give up mining a block after this many candidate proofs
    #[arg(long, env = "POWCHAIN_MAX_ATTEMPTS")]
    max_attempts: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = NodeConfig {
        listen_addr: args.listen,
        difficulty: args.difficulty,
        node_id: args.node_id.unwrap_or_else(generate_node_id),
        peers: args.peers,
        peer_timeout: Duration::from_secs(args.peer_timeout_secs),
        max_attempts: args.max_attempts,
    };

    let node = Arc::new(Node::new(config.clone()).context("invalid node configuration")?);
    let app = build_router(node.clone());

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;

    info!(
        addr = %config.listen_addr,
        node_id = %config.node_id,
        difficulty = %config.difficulty,
        peers = config.peers.len(),
        "node listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(node))
        .await
        .context("server error")?;

    info!("node stopped");
    Ok(())
}

async fn shutdown_signal(node: Arc<Node>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    node.shutdown();
}
