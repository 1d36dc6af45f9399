//! Node configuration.

use powchain_core::DEFAULT_TARGET;
use std::net::SocketAddr;
use std::time::Duration;

/// Default address the HTTP server binds to.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:5000";

/// Default timeout for a single peer chain fetch.
pub const DEFAULT_PEER_TIMEOUT: Duration = Duration::from_secs(5);

/// Runtime configuration of a node.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Address the HTTP server binds to.
    pub listen_addr: SocketAddr,
    /// Proof-of-work target prefix.
    pub difficulty: String,
    /// Identifier of this node, paid the mining reward.
    pub node_id: String,
    /// Peers registered at startup.
    pub peers: Vec<String>,
    /// Timeout for a single peer chain fetch.
    pub peer_timeout: Duration,
    /// Upper bound on candidates tried per mined block.
    pub max_attempts: Option<u64>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            difficulty: DEFAULT_TARGET.to_string(),
            node_id: generate_node_id(),
            peers: Vec::new(),
            peer_timeout: DEFAULT_PEER_TIMEOUT,
            max_attempts: None,
        }
    }
}

/// Generate a random node identifier (32 hex characters).
pub fn generate_node_id() -> String {
    hex::encode(rand::random::<[u8; 16]>())
}
