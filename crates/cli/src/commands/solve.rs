//! Offline puzzle solving.

use anyhow::{Context as _, Result};
use clap::Args;
use colored::Colorize;
use powchain_core::{ProofOfWork, SolveOptions, DEFAULT_TARGET};
use std::time::Instant;

#[derive(Args)]
pub struct SolveArgs {
    /// Proof of the block being built on
    #[arg(short, long)]
    last_proof: u64,

    /// Hex prefix the digest must start with
    #[arg(short, long, default_value = DEFAULT_TARGET)]
    difficulty: String,

    /// Give up after this many candidates
    #[arg(long)]
    max_attempts: Option<u64>,
}

pub fn run(args: SolveArgs) -> Result<()> {
    let pow = ProofOfWork::new(args.difficulty).context("Invalid difficulty")?;
    let options = match args.max_attempts {
        Some(max) => SolveOptions::unbounded().with_max_attempts(max),
        None => SolveOptions::unbounded(),
    };

    let started = Instant::now();
    let proof = pow.solve_with(args.last_proof, &options)?;

    println!("{}  Proof found", "✓".green().bold());
    println!("  {}: {}", "Proof".bold(), proof);
    println!(
        "  {}: {}",
        "Digest".bold(),
        ProofOfWork::guess_hash(args.last_proof, proof).bright_yellow()
    );
    println!(
        "  {}",
        format!("{} candidates in {:.2?}", proof + 1, started.elapsed()).bright_black()
    );
    Ok(())
}
