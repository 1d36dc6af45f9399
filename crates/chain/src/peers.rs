//! Registry of peer nodes.

use http::Uri;
use std::collections::BTreeSet;
use thiserror::Error;

/// Errors that can occur when registering a peer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PeerError {
    #[error("invalid peer address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },
}

pub type Result<T> = std::result::Result<T, PeerError>;

/// Reduce a peer address to its `host:port` form.
///
/// Accepts full URLs (`http://10.0.0.2:5000/`) as well as bare authorities
/// (`10.0.0.2:5000`). Any path, query or user info is dropped and the host is
/// lowercased.
pub fn normalize_peer_address(address: &str) -> Result<String> {
    let invalid = |reason: &str| PeerError::InvalidAddress {
        address: address.to_string(),
        reason: reason.to_string(),
    };

    let uri: Uri = address
        .trim()
        .parse()
        .map_err(|e: http::uri::InvalidUri| invalid(&e.to_string()))?;
    let authority = uri.authority().ok_or_else(|| invalid("missing host"))?;

    let host = authority.host().to_ascii_lowercase();
    if host.is_empty() {
        return Err(invalid("missing host"));
    }

    Ok(match authority.port_u16() {
        Some(port) => format!("{host}:{port}"),
        None => host,
    })
}

/// Deduplicated set of peer addresses, listed in sorted order.
#[derive(Debug, Clone, Default)]
pub struct PeerSet {
    peers: BTreeSet<String>,
}

impl PeerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize and insert an address.
    ///
    /// Returns the normalized address and whether it was newly added.
    pub fn insert(&mut self, address: &str) -> Result<(String, bool)> {
        let normalized = normalize_peer_address(address)?;
        let added = self.peers.insert(normalized.clone());
        Ok((normalized, added))
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.peers.iter().cloned().collect()
    }
}
