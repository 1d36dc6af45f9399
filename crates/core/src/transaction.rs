//! Ledger transactions.

use serde::{Deserialize, Serialize};

/// Sender recorded on the reward transaction a miner pays itself.
pub const REWARD_SENDER: &str = "0";

/// Amount paid to the miner of each block.
pub const MINING_REWARD: f64 = 1.0;

/// A value transfer between two parties.
///
/// Transactions carry no signature and no identifier of their own; once sealed
/// they are identified only by their position inside a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Sending party.
    pub sender: String,
    /// Receiving party.
    pub recipient: String,
    /// Transferred amount. Sign and magnitude are not checked.
    pub amount: f64,
}

impl Transaction {
    /// Create a new transaction.
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, amount: f64) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
        }
    }

    /// Create the reward transaction for a freshly mined block.
    pub fn reward(recipient: impl Into<String>) -> Self {
        Self::new(REWARD_SENDER, recipient, MINING_REWARD)
    }

    /// Check if this is a mining reward.
    pub fn is_reward(&self) -> bool {
        self.sender == REWARD_SENDER
    }
}
