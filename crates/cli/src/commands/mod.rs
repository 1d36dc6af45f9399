//! CLI commands module.

use anyhow::Result;
use clap::Subcommand;
use powchain_node::NodeClient;
use std::time::Duration;

mod chain;
mod nodes;
mod solve;
mod tx;

/// What every command talking to a node needs.
pub struct Context {
    pub client: NodeClient,
}

impl Context {
    pub fn new(node: &str, timeout: Duration) -> Self {
        Self {
            client: NodeClient::new(node, timeout),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the node's chain
    Chain {
        /// Print the raw JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Ask the node to mine a block
    Mine,
    /// Submit a transaction
    Send(tx::SendArgs),
    /// Register peers with the node
    Peers {
        /// Peer addresses (URL or host:port)
        #[arg(required = true)]
        addresses: Vec<String>,
    },
    /// Ask the node to resolve conflicts with its peers
    Resolve,
    /// Solve the puzzle locally, without a node
    Solve(solve::SolveArgs),
}

pub async fn run(cmd: Commands, ctx: &Context) -> Result<()> {
    match cmd {
        Commands::Chain { json } => chain::show(ctx, json).await,
        Commands::Mine => chain::mine(ctx).await,
        Commands::Send(args) => tx::send(ctx, args).await,
        Commands::Peers { addresses } => nodes::register(ctx, addresses).await,
        Commands::Resolve => nodes::resolve(ctx).await,
        Commands::Solve(args) => solve::run(args),
    }
}
