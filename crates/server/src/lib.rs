//! # Powchain Node
//!
//! HTTP node for the powchain ledger.
//!
//! A node keeps a [`powchain_chain::Ledger`] behind a lock, serves it over
//! the routes in [`api`], mines blocks on request and resolves conflicts by
//! fetching its peers' chains through a [`client::ChainFetcher`].

pub mod api;
pub mod client;
pub mod config;
pub mod node;

pub use api::build_router;
pub use client::{ChainFetcher, FetchError, HttpChainFetcher, NodeClient};
pub use config::{generate_node_id, NodeConfig, DEFAULT_LISTEN_ADDR, DEFAULT_PEER_TIMEOUT};
pub use node::{Node, NodeError};
