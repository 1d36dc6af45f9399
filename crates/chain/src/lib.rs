//! Ledger state machine for powchain.
//!
//! This crate brings the core primitives and the consensus rule together:
//! - **Ledger**: the chain, block sealing, mining and conflict resolution
//! - **PendingPool**: transactions waiting for the next block
//! - **PeerSet**: registered peer nodes
//!
//! # Example
//!
//! ```rust
//! use powchain_chain::Ledger;
//! use powchain_core::ProofOfWork;
//!
//! let mut ledger = Ledger::new(ProofOfWork::new("00").unwrap());
//!
//! // Queue a transfer and mine the block that contains it.
//! let index = ledger.queue_transaction("alice", "bob", 5.0);
//! let block = ledger.mine("my-node");
//!
//! assert_eq!(block.index, index);
//! assert!(ledger.is_valid());
//! ```

pub mod ledger;
pub mod peers;
pub mod pending;

// Re-export commonly used types
pub use ledger::{Ledger, LedgerError, LedgerStats, MiningJob};
pub use peers::{normalize_peer_address, PeerError, PeerSet};
pub use pending::PendingPool;
