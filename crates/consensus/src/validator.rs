//! Chain validation rules.
//!
//! A chain is valid when every block links to the hash of the block before
//! it and carries a proof that solves the puzzle relative to the previous
//! block's proof. The genesis block itself is not checked.

use powchain_core::{Block, ProofOfWork};
use thiserror::Error;
use tracing::trace;

/// Errors that can occur during chain validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("chain contains no blocks")]
    EmptyChain,

    #[error("block {index} does not link to the hash of its predecessor")]
    BrokenLink { index: u64 },

    #[error("block {index} carries a proof that does not solve the puzzle")]
    InvalidProof { index: u64 },
}

pub type Result<T> = std::result::Result<T, ValidationError>;

/// Chain validator bound to a puzzle difficulty.
#[derive(Debug, Clone, Copy)]
pub struct ChainValidator<'a> {
    pow: &'a ProofOfWork,
}

impl<'a> ChainValidator<'a> {
    /// Create a validator checking proofs against `pow`.
    pub fn new(pow: &'a ProofOfWork) -> Self {
        Self { pow }
    }

    /// Validate the link and proof between two adjacent blocks.
    pub fn validate_pair(&self, previous: &Block, current: &Block) -> Result<()> {
        if current.previous_hash != previous.hash() {
            return Err(ValidationError::BrokenLink {
                index: current.index,
            });
        }

        if !self.pow.verify(previous.proof, current.proof) {
            return Err(ValidationError::InvalidProof {
                index: current.index,
            });
        }

        Ok(())
    }

    /// Walk the chain from genesis and return the first violation found.
    pub fn validate(&self, chain: &[Block]) -> Result<()> {
        if chain.is_empty() {
            return Err(ValidationError::EmptyChain);
        }

        for pair in chain.windows(2) {
            let (previous, current) = (&pair[0], &pair[1]);
            trace!(
                previous = previous.index,
                current = current.index,
                "checking block pair"
            );
            self.validate_pair(previous, current)?;
        }

        Ok(())
    }

    /// Check if every adjacent pair in the chain is valid.
    pub fn is_valid(&self, chain: &[Block]) -> bool {
        self.validate(chain).is_ok()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use powchain_core::Transaction;

    /// Build a valid chain of `len` blocks the same way a ledger seals them.
    pub(crate) fn build_chain(pow: &ProofOfWork, len: usize) -> Vec<Block> {
        let mut chain = vec![Block::genesis()];
        while chain.len() < len {
            let last = chain.last().unwrap();
            let proof = pow.solve(last.proof);
            let txs = vec![
                Transaction::new("alice", "bob", chain.len() as f64),
                Transaction::reward("miner"),
            ];
            let block = Block::new(last.index + 1, txs, proof, last.hash());
            chain.push(block);
        }
        chain
    }

    fn pow() -> ProofOfWork {
        ProofOfWork::new("00").unwrap()
    }

    #[test]
    fn test_constructed_chain_is_valid() {
        let pow = pow();
        let chain = build_chain(&pow, 4);

        assert!(ChainValidator::new(&pow).is_valid(&chain));
    }

    #[test]
    fn test_single_block_chain_is_valid() {
        let pow = pow();
        assert!(ChainValidator::new(&pow).is_valid(&[Block::genesis()]));
    }

    #[test]
    fn test_empty_chain_is_invalid() {
        let pow = pow();
        assert_eq!(
            ChainValidator::new(&pow).validate(&[]),
            Err(ValidationError::EmptyChain)
        );
    }

    #[test]
    fn test_tampered_proof_detected() {
        let pow = pow();
        let mut chain = build_chain(&pow, 3);
        chain[1].proof += 1;

        assert!(!ChainValidator::new(&pow).is_valid(&chain));
    }

    #[test]
    fn test_broken_link_detected() {
        let pow = pow();
        let mut chain = build_chain(&pow, 3);
        chain[2].previous_hash = "deadbeef".into();

        assert_eq!(
            ChainValidator::new(&pow).validate(&chain),
            Err(ValidationError::BrokenLink { index: 3 })
        );
    }

    #[test]
    fn test_tampered_transaction_breaks_next_link() {
        let pow = pow();
        let mut chain = build_chain(&pow, 3);
        chain[1].transactions[0].amount = 1_000.0;

        assert_eq!(
            ChainValidator::new(&pow).validate(&chain),
            Err(ValidationError::BrokenLink { index: 3 })
        );
    }

    #[test]
    fn test_invalid_proof_on_last_block() {
        let pow = pow();
        let mut chain = build_chain(&pow, 2);
        // Re-link the last block with a proof that fails the puzzle.
        let bad_proof = (0..)
            .find(|p| !pow.verify(chain[0].proof, *p))
            .unwrap();
        chain[1].proof = bad_proof;

        assert_eq!(
            ChainValidator::new(&pow).validate(&chain),
            Err(ValidationError::InvalidProof { index: 2 })
        );
    }

    #[test]
    fn test_harder_puzzle_rejects_easier_chain() {
        let easy = ProofOfWork::new("0").unwrap();
        let chain = build_chain(&easy, 6);
        let hard = ProofOfWork::new("0000").unwrap();

        assert!(ChainValidator::new(&easy).is_valid(&chain));
        assert!(!ChainValidator::new(&hard).is_valid(&chain));
    }
}
