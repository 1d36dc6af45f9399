//! Block structure and the genesis block.

use crate::hash::hash_json;
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Previous-hash sentinel carried by the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "1";

/// Proof carried by the genesis block.
pub const GENESIS_PROOF: u64 = 100;

/// A sealed, hash-linked batch of transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Position in the chain (1 for genesis).
    pub index: u64,
    /// Unix timestamp in seconds, with sub-second precision.
    pub timestamp: f64,
    /// Transactions in the order they were queued.
    pub transactions: Vec<Transaction>,
    /// Proof-of-work answer relative to the previous block's proof.
    pub proof: u64,
    /// Canonical hash of the previous block.
    pub previous_hash: String,
}

impl Block {
    /// Create a new block stamped with the current time.
    pub fn new(
        index: u64,
        transactions: Vec<Transaction>,
        proof: u64,
        previous_hash: impl Into<String>,
    ) -> Self {
        Self {
            index,
            timestamp: Self::current_timestamp(),
            transactions,
            proof,
            previous_hash: previous_hash.into(),
        }
    }

    /// Create the genesis block.
    pub fn genesis() -> Self {
        Self::new(1, Vec::new(), GENESIS_PROOF, GENESIS_PREVIOUS_HASH)
    }

    /// Get the canonical hash of this block.
    pub fn hash(&self) -> String {
        hash_json(self).expect("block serialization should not fail")
    }

    /// Check if this is the genesis block.
    pub fn is_genesis(&self) -> bool {
        self.index == 1 && self.previous_hash == GENESIS_PREVIOUS_HASH
    }

    /// Get the number of transactions in this block.
    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }

    /// Get the current Unix timestamp in seconds.
    pub fn current_timestamp() -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or_default()
    }
}
