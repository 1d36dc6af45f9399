//! Chain inspection and mining commands.

use super::Context;
use anyhow::{Context as _, Result};
use colored::Colorize;
use powchain_core::Block;

pub async fn show(ctx: &Context, json: bool) -> Result<()> {
    let snapshot = ctx
        .client
        .chain()
        .await
        .with_context(|| format!("Failed to fetch chain from {}", ctx.client.base_url()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!();
    println!(
        "{} {}",
        "Chain:".bold().cyan(),
        format!("{} blocks", snapshot.length).bright_black()
    );
    println!();
    for block in &snapshot.chain {
        print_block(block);
    }
    println!();
    Ok(())
}

pub async fn mine(ctx: &Context) -> Result<()> {
    println!("{}", "Mining...".bright_black());
    let mined = ctx.client.mine().await.context("Mining failed")?;

    println!();
    println!("{}", mined.message.bold().green());
    println!("  {}: {}", "Index".bold(), mined.index);
    println!("  {}: {}", "Proof".bold(), mined.proof);
    println!("  {}: {}", "Previous".bold(), mined.previous_hash.bright_yellow());
    println!("  {}: {}", "Transactions".bold(), mined.transactions.len());
    for tx in &mined.transactions {
        let label = if tx.is_reward() { " reward" } else { "" };
        println!(
            "    {} -> {} {}{}",
            tx.sender,
            tx.recipient,
            format!("({})", tx.amount).bright_black(),
            label.bright_green()
        );
    }
    println!();
    Ok(())
}

fn print_block(block: &Block) {
    let label = if block.is_genesis() { " genesis" } else { "" };
    println!(
        "  {} {} proof {} {}{}",
        format!("#{}", block.index).bright_black(),
        block.hash()[..16].bright_yellow(),
        block.proof,
        format!("({} txs)", block.tx_count()).bright_black(),
        label.cyan()
    );
}
