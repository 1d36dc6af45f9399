//! Transaction submission command.

use super::Context;
use anyhow::{Context as _, Result};
use clap::Args;
use colored::Colorize;
use powchain_core::Transaction;

#[derive(Args)]
pub struct SendArgs {
    /// Sending address
    #[arg(short, long)]
    sender: String,

    /// Receiving address
    #[arg(short, long)]
    recipient: String,

    /// Amount to transfer
    #[arg(short, long)]
    amount: f64,
}

pub async fn send(ctx: &Context, args: SendArgs) -> Result<()> {
    let tx = Transaction::new(args.sender, args.recipient, args.amount);
    let queued = ctx
        .client
        .submit_transaction(&tx)
        .await
        .context("Failed to submit transaction")?;

    println!("{}  Transaction queued", "✓".green().bold());
    println!("  {}", queued.message.bright_black());
    Ok(())
}
