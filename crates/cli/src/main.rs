//! powchain CLI entry point.

use clap::Parser;
use std::time::Duration;

mod commands;

#[derive(Parser)]
#[command(name = "powchain")]
#[command(about = "Client for powchain nodes", long_about = None)]
struct Cli {
    /// Node to talk to
    #[arg(short, long, global = true, env = "POWCHAIN_NODE", default_value = "http://127.0.0.1:5000")]
    node: String,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value_t = 30)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Option<commands::Commands>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(cmd) => {
            let ctx = commands::Context::new(&cli.node, Duration::from_secs(cli.timeout_secs));
            if let Err(e) = commands::run(cmd, &ctx).await {
                eprintln!("Error: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("powchain - client for proof-of-work ledger nodes");
            println!("Run 'powchain --help' for usage information.");
        }
    }
}
