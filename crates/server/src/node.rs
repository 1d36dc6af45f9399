//! A running node: the shared ledger plus the work that happens around it.

use crate::client::{ChainFetcher, HttpChainFetcher};
use crate::config::NodeConfig;
use futures::future::join_all;
use powchain_chain::{normalize_peer_address, Ledger, LedgerError, LedgerStats};
use powchain_consensus::ChainSnapshot;
use powchain_core::{Block, CancelToken, PowError, ProofOfWork, SolveOptions, Transaction};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// How many times a mining request re-runs the search after the tip moved
/// underneath it.
const MAX_MINING_ROUNDS: u32 = 3;

/// Errors that can occur while serving node operations.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Pow(#[from] PowError),

    #[error("mining task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("chain tip kept moving while mining ({attempts} rounds)")]
    TipKeptMoving { attempts: u32 },
}

pub type Result<T> = std::result::Result<T, NodeError>;

/// A node and its shared state.
pub struct Node {
    ledger: Arc<RwLock<Ledger>>,
    config: NodeConfig,
    fetcher: Arc<dyn ChainFetcher>,
    shutdown: CancelToken,
}

impl Node {
    /// Create a node that fetches peer chains over HTTP.
    pub fn new(config: NodeConfig) -> Result<Self> {
        let fetcher = Arc::new(HttpChainFetcher::new(config.peer_timeout));
        Self::with_fetcher(config, fetcher)
    }

    /// Create a node with a custom peer chain source.
    pub fn with_fetcher(config: NodeConfig, fetcher: Arc<dyn ChainFetcher>) -> Result<Self> {
        let pow = ProofOfWork::new(config.difficulty.as_str())?;
        let mut ledger = Ledger::new(pow);
        for peer in &config.peers {
            ledger.register_peer(peer)?;
        }

        Ok(Self {
            ledger: Arc::new(RwLock::new(ledger)),
            config,
            fetcher,
            shutdown: CancelToken::new(),
        })
    }

    pub fn ledger(&self) -> &Arc<RwLock<Ledger>> {
        &self.ledger
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn node_id(&self) -> &str {
        &self.config.node_id
    }

    /// Stop every running and future proof search.
    pub fn shutdown(&self) {
        info!("stopping proof searches");
        self.shutdown.cancel();
    }

    fn solve_options(&self) -> SolveOptions {
        let options = SolveOptions::unbounded().with_cancel(self.shutdown.clone());
        match self.config.max_attempts {
            Some(max) => options.with_max_attempts(max),
            None => options,
        }
    }

    /// Mine a block paying the reward to this node.
    ///
    /// The search runs on the blocking pool without holding the ledger lock,
    /// so transactions keep flowing while it runs. If another block is sealed
    /// first the search is repeated against the new tip.
    pub async fn mine(&self) -> Result<Block> {
        for round in 1..=MAX_MINING_ROUNDS {
            let (job, pow) = {
                let ledger = self.ledger.read().await;
                (ledger.mining_job(), ledger.pow().clone())
            };

            let options = self.solve_options();
            let last_proof = job.last_proof;
            let proof =
                tokio::task::spawn_blocking(move || pow.solve_with(last_proof, &options)).await??;

            let mut ledger = self.ledger.write().await;
            match ledger.complete_mining(&job, proof, &self.config.node_id) {
                Ok(block) => return Ok(block),
                Err(LedgerError::StaleTip { expected, found }) => {
                    debug!(round, expected, found, "tip moved while mining, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(NodeError::TipKeptMoving {
            attempts: MAX_MINING_ROUNDS,
        })
    }

    /// Queue a transaction. Returns the index of the block that will hold it.
    pub async fn submit_transaction(&self, tx: Transaction) -> u64 {
        self.ledger.write().await.submit(tx)
    }

    /// Register peers, all or none.
    ///
    /// Returns every known peer afterwards.
    pub async fn register_peers(&self, addresses: &[String]) -> Result<Vec<String>> {
        for address in addresses {
            normalize_peer_address(address).map_err(LedgerError::from)?;
        }

        let mut ledger = self.ledger.write().await;
        for address in addresses {
            ledger.register_peer(address)?;
        }
        Ok(ledger.peers().to_vec())
    }

    /// Fetch every peer's chain and adopt the longest valid one.
    ///
    /// Unreachable or misbehaving peers are skipped. Returns true if the
    /// local chain was replaced.
    pub async fn resolve_conflicts(&self) -> bool {
        let peers = self.ledger.read().await.peers().to_vec();
        if peers.is_empty() {
            return false;
        }

        let fetches = peers.iter().map(|peer| async move {
            (peer.as_str(), self.fetcher.fetch_chain(peer).await)
        });
        let snapshots: Vec<ChainSnapshot> = join_all(fetches)
            .await
            .into_iter()
            .filter_map(|(peer, result)| match result {
                Ok(snapshot) => Some(snapshot),
                Err(e) => {
                    warn!(peer, error = %e, "skipping peer");
                    None
                }
            })
            .collect();

        self.ledger.write().await.resolve_conflicts(snapshots)
    }

    /// The full chain.
    pub async fn snapshot(&self) -> ChainSnapshot {
        self.ledger.read().await.snapshot()
    }

    pub async fn stats(&self) -> LedgerStats {
        self.ledger.read().await.stats()
    }
}
