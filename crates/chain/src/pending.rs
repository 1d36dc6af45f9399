//! Pending transaction pool.
//!
//! The pool holds transactions waiting for the next block, in the order they
//! were queued. Sealing a block takes the whole pool at once.

use powchain_core::Transaction;
use std::mem;

/// Transactions queued but not yet sealed into a block.
#[derive(Debug, Clone, Default)]
pub struct PendingPool {
    transactions: Vec<Transaction>,
}

impl PendingPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of queued transactions.
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Check if the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Append a transaction after everything already queued.
    pub fn push(&mut self, tx: Transaction) {
        self.transactions.push(tx);
    }

    /// Queued transactions in queue order.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Take every queued transaction, leaving the pool empty.
    pub fn take(&mut self) -> Vec<Transaction> {
        mem::take(&mut self.transactions)
    }
}
