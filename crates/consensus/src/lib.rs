//! Chain validation and longest-valid-chain consensus for powchain.
//!
//! This crate provides:
//! - Chain validation (hash links and proof-of-work between every block pair)
//! - Conflict resolution between the local chain and peer snapshots
//!
//! # Example
//!
//! ```rust
//! use powchain_consensus::{ChainSnapshot, ChainValidator, ConsensusResolver};
//! use powchain_core::{Block, ProofOfWork};
//!
//! let pow = ProofOfWork::new("00").unwrap();
//! let local = vec![Block::genesis()];
//! assert!(ChainValidator::new(&pow).is_valid(&local));
//!
//! // A peer reporting the same length never replaces the local chain.
//! let peer = ChainSnapshot::new(vec![Block::genesis()]);
//! let resolver = ConsensusResolver::new(&pow);
//! assert!(resolver.select(local.len(), vec![peer]).is_none());
//! ```

pub mod resolver;
pub mod validator;

// Re-export commonly used types
pub use resolver::{ChainSnapshot, ConsensusResolver};
pub use validator::{ChainValidator, ValidationError};
