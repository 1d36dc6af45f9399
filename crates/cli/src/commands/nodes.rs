//! Peer registration and conflict resolution commands.

use super::Context;
use anyhow::{Context as _, Result};
use colored::Colorize;

pub async fn register(ctx: &Context, addresses: Vec<String>) -> Result<()> {
    let registered = ctx
        .client
        .register_peers(&addresses)
        .await
        .context("Failed to register peers")?;

    println!("{}  {}", "✓".green().bold(), registered.message);
    println!();
    println!("{}", "Known peers:".bold().cyan());
    for peer in &registered.total_nodes {
        println!("  {}", peer);
    }
    Ok(())
}

pub async fn resolve(ctx: &Context) -> Result<()> {
    let resolved = ctx
        .client
        .resolve()
        .await
        .context("Conflict resolution failed")?;

    let length = resolved
        .new_chain
        .as_ref()
        .or(resolved.chain.as_ref())
        .map(Vec::len)
        .unwrap_or_default();

    if resolved.replaced() {
        println!("{}", resolved.message.yellow().bold());
    } else {
        println!("{}", resolved.message.green().bold());
    }
    println!("  {}: {}", "Length".bold(), length);
    Ok(())
}
