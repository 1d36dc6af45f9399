//! HTTP client for talking to powchain nodes.
//!
//! [`NodeClient`] wraps every route a node serves and is used both by the
//! command-line client and, through [`HttpChainFetcher`], by a node fetching
//! its peers' chains during conflict resolution.

use crate::api::{
    MineResponse, NewTransactionRequest, RegisterNodesRequest, RegisterResponse,
    ResolveResponse, TransactionResponse,
};
use futures::future::BoxFuture;
use hyper::client::HttpConnector;
use hyper::{Body, Client, Method, Request, StatusCode};
use powchain_consensus::ChainSnapshot;
use powchain_core::Transaction;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while talking to a node.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid node url: {0}")]
    InvalidUrl(#[from] hyper::http::uri::InvalidUri),

    #[error("failed to build request: {0}")]
    Request(#[from] hyper::http::Error),

    #[error("http error: {0}")]
    Http(#[from] hyper::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("node answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FetchError>;

/// Source of peer chain snapshots.
pub trait ChainFetcher: Send + Sync {
    /// Fetch `{chain, length}` from the peer at `host:port`.
    fn fetch_chain<'a>(&'a self, peer: &'a str) -> BoxFuture<'a, Result<ChainSnapshot>>;
}

/// Client for a single node.
#[derive(Debug, Clone)]
pub struct NodeClient {
    client: Client<HttpConnector>,
    base_url: String,
    timeout: Duration,
}

impl NodeClient {
    /// Create a client for the node at `base_url`.
    ///
    /// `http://` is assumed when no scheme is given.
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let base_url = base_url.trim().trim_end_matches('/');
        let base_url = if base_url.contains("://") {
            base_url.to_string()
        } else {
            format!("http://{base_url}")
        };

        Self {
            client: Client::new(),
            base_url,
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the node's full chain.
    pub async fn chain(&self) -> Result<ChainSnapshot> {
        self.request(Method::GET, "/chain", None::<&()>, StatusCode::OK)
            .await
    }

    /// Ask the node to mine a block.
    pub async fn mine(&self) -> Result<MineResponse> {
        self.request(Method::GET, "/mine", None::<&()>, StatusCode::OK)
            .await
    }

    /// Submit a transaction to the node's pending pool.
    pub async fn submit_transaction(&self, tx: &Transaction) -> Result<TransactionResponse> {
        let body = NewTransactionRequest {
            sender: Some(tx.sender.clone()),
            recipient: Some(tx.recipient.clone()),
            amount: Some(tx.amount),
        };
        self.request(
            Method::POST,
            "/transactions/new",
            Some(&body),
            StatusCode::CREATED,
        )
        .await
    }

    /// Register peers with the node.
    pub async fn register_peers(&self, nodes: &[String]) -> Result<RegisterResponse> {
        let body = RegisterNodesRequest {
            nodes: Some(nodes.to_vec()),
        };
        self.request(
            Method::POST,
            "/nodes/register",
            Some(&body),
            StatusCode::CREATED,
        )
        .await
    }

    /// Ask the node to resolve conflicts with its peers.
    pub async fn resolve(&self) -> Result<ResolveResponse> {
        self.request(Method::GET, "/nodes/resolve", None::<&()>, StatusCode::OK)
            .await
    }

    async fn request<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        expected: StatusCode,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let uri: hyper::Uri = format!("{}{}", self.base_url, path).parse()?;
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(hyper::header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(body)?))?,
            None => builder.body(Body::empty())?,
        };

        let exchange = async {
            let response = self.client.request(request).await?;
            let status = response.status();
            let bytes = hyper::body::to_bytes(response.into_body()).await?;
            Ok::<_, FetchError>((status, bytes))
        };
        let (status, bytes) = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| FetchError::Timeout(self.timeout))??;

        if status != expected {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Fetches peer chains over HTTP.
#[derive(Debug, Clone)]
pub struct HttpChainFetcher {
    timeout: Duration,
}

impl HttpChainFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl ChainFetcher for HttpChainFetcher {
    fn fetch_chain<'a>(&'a self, peer: &'a str) -> BoxFuture<'a, Result<ChainSnapshot>> {
        Box::pin(async move { NodeClient::new(peer, self.timeout).chain().await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_normalization() {
        let timeout = Duration::from_secs(1);

        assert_eq!(
            NodeClient::new("127.0.0.1:5000", timeout).base_url(),
            "http://127.0.0.1:5000"
        );
        assert_eq!(
            NodeClient::new("http://node-a:5001/", timeout).base_url(),
            "http://node-a:5001"
        );
    }

    #[tokio::test]
    async fn test_unreachable_node_is_an_error() {
        // Nothing listens on port 9 of the loopback interface.
        let client = NodeClient::new("127.0.0.1:9", Duration::from_secs(2));
        assert!(client.chain().await.is_err());
    }

    #[tokio::test]
    async fn test_fetcher_reports_failure() {
        let fetcher = HttpChainFetcher::new(Duration::from_secs(2));
        assert!(fetcher.fetch_chain("127.0.0.1:9").await.is_err());
    }
}
