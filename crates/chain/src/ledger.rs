//! The ledger state machine.
//!
//! The ledger owns the chain, the pending pool and the peer registry. It is a
//! plain value mutated through `&mut self`; callers sharing it between tasks
//! wrap it in a lock so that queueing, sealing and chain replacement are
//! serialized against each other.

use crate::peers::{PeerError, PeerSet};
use crate::pending::PendingPool;
use powchain_consensus::{ChainSnapshot, ChainValidator, ConsensusResolver, ValidationError};
use powchain_core::{Block, PowError, ProofOfWork, SolveOptions, Transaction};
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("peer error: {0}")]
    Peer(#[from] PeerError),

    #[error("proof of work error: {0}")]
    Pow(#[from] PowError),

    #[error("chain tip moved (mined against block {expected}, tip is now block {found})")]
    StaleTip { expected: u64, found: u64 },

    #[error("proof {proof} does not solve the puzzle after proof {last_proof}")]
    InvalidProof { last_proof: u64, proof: u64 },

    #[error("candidate chain rejected: {0}")]
    InvalidChain(#[from] ValidationError),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Snapshot of the chain tip a proof-of-work search runs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiningJob {
    /// Index of the block the search builds on.
    pub index: u64,
    /// Proof of that block.
    pub last_proof: u64,
    /// Hash of that block.
    pub last_hash: String,
}

/// The replicated ledger.
#[derive(Debug, Clone)]
pub struct Ledger {
    /// Sealed blocks, genesis first. Never empty.
    chain: Vec<Block>,
    /// Transactions waiting for the next block.
    pending: PendingPool,
    /// Known peer nodes.
    peers: PeerSet,
    /// Puzzle every block after genesis must solve.
    pow: ProofOfWork,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(ProofOfWork::default())
    }
}

impl Ledger {
    /// Create a ledger seeded with the genesis block.
    pub fn new(pow: ProofOfWork) -> Self {
        let mut ledger = Self {
            chain: Vec::new(),
            pending: PendingPool::new(),
            peers: PeerSet::new(),
            pow,
        };
        ledger.chain.push(Block::genesis());
        ledger
    }

    /// Get the full chain.
    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    /// Get the number of blocks.
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Always false: the genesis block is never removed.
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Get the most recently sealed block.
    pub fn last_block(&self) -> &Block {
        // Constructed with genesis; replacement only accepts validated,
        // therefore non-empty, chains.
        &self.chain[self.chain.len() - 1]
    }

    pub fn pending(&self) -> &PendingPool {
        &self.pending
    }

    pub fn peers(&self) -> &PeerSet {
        &self.peers
    }

    pub fn pow(&self) -> &ProofOfWork {
        &self.pow
    }

    /// Get the full chain as served to peers.
    pub fn snapshot(&self) -> ChainSnapshot {
        ChainSnapshot::new(self.chain.clone())
    }

    /// Seal every pending transaction into a new block.
    ///
    /// The block links to `previous_hash` when given, otherwise to the hash
    /// of the current last block. The pending pool is emptied.
    pub fn seal_block(&mut self, proof: u64, previous_hash: Option<String>) -> Block {
        let previous_hash = previous_hash.unwrap_or_else(|| self.last_block().hash());
        let index = self.chain.len() as u64 + 1;
        let transactions = self.pending.take();

        let block = Block::new(index, transactions, proof, previous_hash);
        info!(
            index = block.index,
            proof = block.proof,
            transactions = block.tx_count(),
            "sealed block"
        );
        self.chain.push(block.clone());
        block
    }

    /// Queue a transaction for the next block.
    ///
    /// Returns the index of the block that will contain it.
    pub fn queue_transaction(
        &mut self,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: f64,
    ) -> u64 {
        self.submit(Transaction::new(sender, recipient, amount))
    }

    /// Queue an already built transaction for the next block.
    pub fn submit(&mut self, tx: Transaction) -> u64 {
        debug!(sender = %tx.sender, recipient = %tx.recipient, amount = tx.amount, "queued transaction");
        self.pending.push(tx);
        self.last_block().index + 1
    }

    /// Register a peer by URL or `host:port`.
    ///
    /// Re-registering a known peer is a no-op. Returns the normalized address.
    pub fn register_peer(&mut self, address: &str) -> Result<String> {
        let (normalized, added) = self.peers.insert(address)?;
        if added {
            info!(peer = %normalized, "registered peer");
        }
        Ok(normalized)
    }

    /// Snapshot the tip for a proof-of-work search.
    pub fn mining_job(&self) -> MiningJob {
        let last = self.last_block();
        MiningJob {
            index: last.index,
            last_proof: last.proof,
            last_hash: last.hash(),
        }
    }

    /// Seal a block for a proof found against `job`.
    ///
    /// Queues the reward for `reward_recipient` and seals it together with
    /// the pending pool. Fails without touching the ledger when the tip has
    /// changed since the job was taken or the proof does not solve the puzzle.
    pub fn complete_mining(
        &mut self,
        job: &MiningJob,
        proof: u64,
        reward_recipient: &str,
    ) -> Result<Block> {
        let last = self.last_block();
        if last.index != job.index || last.proof != job.last_proof || last.hash() != job.last_hash
        {
            return Err(LedgerError::StaleTip {
                expected: job.index,
                found: last.index,
            });
        }
        if !self.pow.verify(job.last_proof, proof) {
            return Err(LedgerError::InvalidProof {
                last_proof: job.last_proof,
                proof,
            });
        }

        self.submit(Transaction::reward(reward_recipient));
        Ok(self.seal_block(proof, Some(job.last_hash.clone())))
    }

    /// Solve the puzzle, pay the reward and seal a block.
    ///
    /// Blocks the calling thread for as long as the search runs.
    pub fn mine(&mut self, reward_recipient: &str) -> Block {
        let last_proof = self.last_block().proof;
        let proof = self.pow.solve(last_proof);
        self.submit(Transaction::reward(reward_recipient));
        self.seal_block(proof, None)
    }

    /// Like [`Ledger::mine`], with the search bounded by `options`.
    pub fn mine_with(&mut self, reward_recipient: &str, options: &SolveOptions) -> Result<Block> {
        let job = self.mining_job();
        let proof = self.pow.solve_with(job.last_proof, options)?;
        self.complete_mining(&job, proof, reward_recipient)
    }

    /// Check the local chain with the validator.
    pub fn is_valid(&self) -> bool {
        ChainValidator::new(&self.pow).is_valid(&self.chain)
    }

    /// Replace the local chain with a validated candidate.
    ///
    /// Pending transactions are kept for the next block.
    pub fn replace_chain(&mut self, candidate: Vec<Block>) -> Result<()> {
        ChainValidator::new(&self.pow).validate(&candidate)?;
        info!(
            old_length = self.chain.len(),
            new_length = candidate.len(),
            "replaced chain"
        );
        self.chain = candidate;
        Ok(())
    }

    /// Apply the longest-valid-chain rule to peer snapshots.
    ///
    /// Returns true if the local chain was replaced.
    pub fn resolve_conflicts<I>(&mut self, candidates: I) -> bool
    where
        I: IntoIterator<Item = ChainSnapshot>,
    {
        let best = ConsensusResolver::new(&self.pow).select(self.chain.len(), candidates);
        match best {
            Some(chain) => {
                info!(
                    old_length = self.chain.len(),
                    new_length = chain.len(),
                    "adopted longer peer chain"
                );
                self.chain = chain;
                true
            }
            None => false,
        }
    }

    /// Get ledger statistics.
    pub fn stats(&self) -> LedgerStats {
        LedgerStats {
            length: self.chain.len(),
            pending_transactions: self.pending.len(),
            peer_count: self.peers.len(),
            last_block_hash: self.last_block().hash(),
            difficulty: self.pow.target().to_string(),
        }
    }
}

/// Ledger statistics.
#[derive(Debug, Clone)]
pub struct LedgerStats {
    /// Number of blocks.
    pub length: usize,
    /// Number of pending transactions.
    pub pending_transactions: usize,
    /// Number of registered peers.
    pub peer_count: usize,
    /// Hash of the latest block.
    pub last_block_hash: String,
    /// Difficulty target prefix.
    pub difficulty: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use powchain_core::{CancelToken, GENESIS_PREVIOUS_HASH, REWARD_SENDER};

    fn ledger() -> Ledger {
        Ledger::new(ProofOfWork::new("00").unwrap())
    }

    fn ledger_with_blocks(len: usize) -> Ledger {
        let mut ledger = ledger();
        while ledger.len() < len {
            ledger.queue_transaction("alice", "bob", ledger.len() as f64);
            ledger.mine("miner");
        }
        ledger
    }

    #[test]
    fn test_new_ledger_has_genesis() {
        let ledger = ledger();

        assert_eq!(ledger.len(), 1);
        assert!(!ledger.is_empty());
        assert!(ledger.last_block().is_genesis());
        assert_eq!(ledger.last_block().previous_hash, GENESIS_PREVIOUS_HASH);
        assert!(ledger.pending().is_empty());
        assert!(ledger.is_valid());
    }

    #[test]
    fn test_queue_returns_next_index() {
        let mut ledger = ledger();

        assert_eq!(ledger.queue_transaction("a", "b", 1.0), 2);
        assert_eq!(ledger.queue_transaction("c", "d", 2.0), 2);

        ledger.mine("miner");
        assert_eq!(ledger.queue_transaction("e", "f", 3.0), 3);
    }

    #[test]
    fn test_seal_moves_pending_in_order() {
        let mut ledger = ledger();
        let t1 = Transaction::new("alice", "bob", 1.0);
        let t2 = Transaction::new("bob", "carol", 2.0);
        ledger.submit(t1.clone());
        ledger.submit(t2.clone());

        let proof = ledger.pow().solve(ledger.last_block().proof);
        let block = ledger.seal_block(proof, None);

        assert_eq!(block.transactions, vec![t1, t2]);
        assert!(ledger.pending().is_empty());
        assert_eq!(ledger.last_block(), &block);
    }

    #[test]
    fn test_seal_links_to_previous_block() {
        let mut ledger = ledger();
        let genesis_hash = ledger.last_block().hash();

        let block = ledger.seal_block(ledger.pow().solve(100), None);

        assert_eq!(block.index, 2);
        assert_eq!(block.previous_hash, genesis_hash);
        assert!(ledger.is_valid());
    }

    #[test]
    fn test_seal_with_explicit_previous_hash() {
        let mut ledger = ledger();

        let block = ledger.seal_block(7, Some("abc".into()));

        assert_eq!(block.previous_hash, "abc");
        assert!(!ledger.is_valid());
    }

    #[test]
    fn test_mined_chain_is_valid() {
        let ledger = ledger_with_blocks(5);

        assert_eq!(ledger.len(), 5);
        assert!(ledger.is_valid());
        for (i, block) in ledger.chain().iter().enumerate() {
            assert_eq!(block.index, i as u64 + 1);
        }
    }

    #[test]
    fn test_mine_pays_reward_last() {
        let mut ledger = ledger();
        ledger.queue_transaction("alice", "bob", 5.0);

        let block = ledger.mine("node-1");

        assert_eq!(block.tx_count(), 2);
        assert_eq!(block.transactions[0].sender, "alice");
        assert_eq!(block.transactions[1].sender, REWARD_SENDER);
        assert_eq!(block.transactions[1].recipient, "node-1");
        assert!(ledger.pow().verify(100, block.proof));
    }

    #[test]
    fn test_register_peer_idempotent() {
        let mut ledger = ledger();

        ledger.register_peer("http://127.0.0.1:5001").unwrap();
        ledger.register_peer("http://127.0.0.1:5001").unwrap();

        assert_eq!(ledger.peers().len(), 1);
        assert_eq!(ledger.peers().to_vec(), vec!["127.0.0.1:5001".to_string()]);
    }

    #[test]
    fn test_register_invalid_peer() {
        let mut ledger = ledger();

        assert!(matches!(
            ledger.register_peer("not a url"),
            Err(LedgerError::Peer(_))
        ));
        assert!(ledger.peers().is_empty());
    }

    #[test]
    fn test_complete_mining_success() {
        let mut ledger = ledger();
        ledger.queue_transaction("a", "b", 1.0);

        let job = ledger.mining_job();
        let proof = ledger.pow().solve(job.last_proof);
        let block = ledger.complete_mining(&job, proof, "miner").unwrap();

        assert_eq!(block.index, 2);
        assert_eq!(block.previous_hash, job.last_hash);
        assert_eq!(block.tx_count(), 2);
        assert!(ledger.is_valid());
    }

    #[test]
    fn test_complete_mining_rejects_stale_job() {
        let mut ledger = ledger();
        let job = ledger.mining_job();
        let proof = ledger.pow().solve(job.last_proof);

        // Another block lands first.
        ledger.mine("other");
        ledger.queue_transaction("a", "b", 1.0);

        let err = ledger.complete_mining(&job, proof, "miner").unwrap_err();
        assert!(matches!(
            err,
            LedgerError::StaleTip {
                expected: 1,
                found: 2
            }
        ));
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.pending().len(), 1);
    }

    #[test]
    fn test_complete_mining_rejects_bad_proof() {
        let mut ledger = ledger();
        let job = ledger.mining_job();
        let bad = (0..).find(|p| !ledger.pow().verify(job.last_proof, *p)).unwrap();

        assert!(matches!(
            ledger.complete_mining(&job, bad, "miner"),
            Err(LedgerError::InvalidProof { .. })
        ));
        assert_eq!(ledger.len(), 1);
        assert!(ledger.pending().is_empty());
    }

    #[test]
    fn test_mine_with_cancelled() {
        let mut ledger = Ledger::new(ProofOfWork::with_leading_zeros(64).unwrap());
        let cancel = CancelToken::new();
        cancel.cancel();

        let result = ledger.mine_with("miner", &SolveOptions::default().with_cancel(cancel));

        assert!(matches!(
            result,
            Err(LedgerError::Pow(PowError::Cancelled { .. }))
        ));
        assert_eq!(ledger.len(), 1);
        assert!(ledger.pending().is_empty());
    }

    #[test]
    fn test_resolve_adopts_longer_valid_chain() {
        let mut local = ledger_with_blocks(3);
        let peer_b = ledger_with_blocks(4);

        let mut peer_a = ledger_with_blocks(5).snapshot();
        peer_a.chain[2].previous_hash = "broken".into();

        let replaced = local.resolve_conflicts(vec![peer_a, peer_b.snapshot()]);

        assert!(replaced);
        assert_eq!(local.chain(), peer_b.chain());
    }

    #[test]
    fn test_resolve_adopts_chain_decoded_from_json() {
        for _ in 0..50 {
            let mut local = ledger();
            let peer = ledger_with_blocks(6);

            let body = serde_json::to_vec(&peer.snapshot()).unwrap();
            let fetched: ChainSnapshot = serde_json::from_slice(&body).unwrap();

            assert!(local.resolve_conflicts(vec![fetched]));
            assert_eq!(local.chain(), peer.chain());
        }
    }

    #[test]
    fn test_resolve_keeps_local_when_not_longer() {
        let mut local = ledger_with_blocks(5);
        let before = serde_json::to_vec(local.chain()).unwrap();

        let replaced = local.resolve_conflicts(vec![
            ledger_with_blocks(5).snapshot(),
            ledger_with_blocks(3).snapshot(),
        ]);

        assert!(!replaced);
        assert_eq!(serde_json::to_vec(local.chain()).unwrap(), before);
    }

    #[test]
    fn test_resolve_keeps_pending_transactions() {
        let mut local = ledger();
        local.queue_transaction("a", "b", 1.0);

        assert!(local.resolve_conflicts(vec![ledger_with_blocks(2).snapshot()]));
        assert_eq!(local.pending().len(), 1);
        assert_eq!(local.queue_transaction("c", "d", 1.0), 3);
    }

    #[test]
    fn test_replace_chain_validates() {
        let mut ledger = ledger();
        let mut candidate = ledger_with_blocks(3).chain().to_vec();
        candidate[1].proof += 1;

        assert!(matches!(
            ledger.replace_chain(candidate),
            Err(LedgerError::InvalidChain(_))
        ));
        assert!(matches!(
            ledger.replace_chain(Vec::new()),
            Err(LedgerError::InvalidChain(ValidationError::EmptyChain))
        ));
        assert_eq!(ledger.len(), 1);

        ledger
            .replace_chain(ledger_with_blocks(3).chain().to_vec())
            .unwrap();
        assert_eq!(ledger.len(), 3);
    }

    #[test]
    fn test_stats() {
        let mut ledger = ledger_with_blocks(2);
        ledger.queue_transaction("a", "b", 1.0);
        ledger.register_peer("peer:1").unwrap();

        let stats = ledger.stats();
        assert_eq!(stats.length, 2);
        assert_eq!(stats.pending_transactions, 1);
        assert_eq!(stats.peer_count, 1);
        assert_eq!(stats.last_block_hash, ledger.last_block().hash());
        assert_eq!(stats.difficulty, "00");
    }
}
