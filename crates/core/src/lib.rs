//! Core ledger primitives for powchain.
//!
//! This crate provides the fundamental types used throughout the ledger:
//! - Canonical hashing (SHA-256 over sorted-key JSON)
//! - Transactions
//! - Blocks and the genesis block
//! - The proof-of-work puzzle

pub mod block;
pub mod hash;
pub mod pow;
pub mod transaction;

// Re-export commonly used types at the crate root
pub use block::{Block, GENESIS_PREVIOUS_HASH, GENESIS_PROOF};
pub use hash::{canonical_json, hash_value, sha256_hex};
pub use pow::{CancelToken, PowError, ProofOfWork, SolveOptions, DEFAULT_TARGET};
pub use transaction::{Transaction, MINING_REWARD, REWARD_SENDER};
