//! Longest-valid-chain conflict resolution.
//!
//! Peers answer with a [`ChainSnapshot`]: their full chain and the length they
//! claim for it. Starting from the local length, the resolver keeps the best
//! candidate seen so far and only adopts a snapshot that is strictly longer
//! than the current best and passes validation. Because the bar only ever
//! rises, the outcome does not depend on the order peers are visited in.

use crate::validator::ChainValidator;
use powchain_core::{Block, ProofOfWork};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A full chain as served by a node: `{chain, length}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub chain: Vec<Block>,
    pub length: u64,
}

impl ChainSnapshot {
    /// Snapshot a chain, reporting its real length.
    pub fn new(chain: Vec<Block>) -> Self {
        let length = chain.len() as u64;
        Self { chain, length }
    }
}

/// Applies the longest-valid-chain rule.
#[derive(Debug, Clone, Copy)]
pub struct ConsensusResolver<'a> {
    validator: ChainValidator<'a>,
}

impl<'a> ConsensusResolver<'a> {
    pub fn new(pow: &'a ProofOfWork) -> Self {
        Self {
            validator: ChainValidator::new(pow),
        }
    }

    /// Pick the chain that should replace a local chain of `local_len` blocks.
    ///
    /// Returns `None` when no candidate is both strictly longer and valid.
    /// Snapshots whose reported length disagrees with the blocks they carry
    /// are rejected.
    pub fn select<I>(&self, local_len: usize, candidates: I) -> Option<Vec<Block>>
    where
        I: IntoIterator<Item = ChainSnapshot>,
    {
        let mut max_length = local_len as u64;
        let mut best = None;

        for snapshot in candidates {
            if snapshot.length <= max_length {
                debug!(
                    length = snapshot.length,
                    threshold = max_length,
                    "ignoring chain that is not longer"
                );
                continue;
            }
            if snapshot.length != snapshot.chain.len() as u64 {
                debug!(
                    reported = snapshot.length,
                    actual = snapshot.chain.len(),
                    "ignoring chain with mismatched length"
                );
                continue;
            }
            if let Err(err) = self.validator.validate(&snapshot.chain) {
                debug!(length = snapshot.length, %err, "ignoring invalid chain");
                continue;
            }

            max_length = snapshot.length;
            best = Some(snapshot.chain);
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::tests::build_chain;

    fn pow() -> ProofOfWork {
        ProofOfWork::new("00").unwrap()
    }

    fn broken(mut chain: Vec<Block>) -> Vec<Block> {
        let last = chain.len() - 1;
        chain[last].previous_hash = "broken".into();
        chain
    }

    #[test]
    fn test_adopts_longest_valid_chain() {
        let pow = pow();
        let local = build_chain(&pow, 3);
        let peer_a = ChainSnapshot::new(broken(build_chain(&pow, 5)));
        let peer_b = ChainSnapshot::new(build_chain(&pow, 4));

        let resolver = ConsensusResolver::new(&pow);
        let chosen = resolver
            .select(local.len(), vec![peer_a.clone(), peer_b.clone()])
            .unwrap();
        assert_eq!(chosen, peer_b.chain);

        // Visiting peers in the other order gives the same answer.
        let chosen = resolver
            .select(local.len(), vec![peer_b.clone(), peer_a])
            .unwrap();
        assert_eq!(chosen, peer_b.chain);
    }

    #[test]
    fn test_equal_or_shorter_chains_never_replace() {
        let pow = pow();
        let local = build_chain(&pow, 5);
        let peers = vec![
            ChainSnapshot::new(build_chain(&pow, 5)),
            ChainSnapshot::new(build_chain(&pow, 4)),
            ChainSnapshot::new(build_chain(&pow, 1)),
        ];

        assert!(ConsensusResolver::new(&pow)
            .select(local.len(), peers)
            .is_none());
    }

    #[test]
    fn test_globally_longest_wins_regardless_of_order() {
        let pow = pow();
        let four = ChainSnapshot::new(build_chain(&pow, 4));
        let six = ChainSnapshot::new(build_chain(&pow, 6));
        let five = ChainSnapshot::new(build_chain(&pow, 5));

        let resolver = ConsensusResolver::new(&pow);
        let orders = [
            vec![four.clone(), six.clone(), five.clone()],
            vec![six.clone(), five.clone(), four.clone()],
            vec![five.clone(), four.clone(), six.clone()],
        ];
        for order in orders {
            assert_eq!(resolver.select(2, order).unwrap(), six.chain);
        }
    }

    #[test]
    fn test_inflated_length_rejected() {
        let pow = pow();
        let mut snapshot = ChainSnapshot::new(build_chain(&pow, 3));
        snapshot.length = 10;

        assert!(ConsensusResolver::new(&pow)
            .select(2, vec![snapshot])
            .is_none());
    }

    #[test]
    fn test_no_candidates() {
        let pow = pow();
        assert!(ConsensusResolver::new(&pow)
            .select(1, Vec::new())
            .is_none());
    }

    #[test]
    fn test_snapshot_wire_shape() {
        let snapshot = ChainSnapshot::new(vec![Block::genesis()]);
        let value = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(value["length"], 1);
        assert!(value["chain"].is_array());
        assert_eq!(value["chain"][0]["index"], 1);
        assert_eq!(value["chain"][0]["previous_hash"], "1");
    }
}
