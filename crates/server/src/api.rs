//! HTTP API of a node.
//!
//! Routes:
//! - `GET  /mine` mines a block paying this node the reward
//! - `POST /transactions/new` queues a transaction (`/transactions.new` is an alias)
//! - `GET  /chain` returns `{chain, length}`
//! - `POST /nodes/register` registers peers from `{nodes: [...]}`
//! - `GET  /nodes/resolve` runs conflict resolution against every peer
//! - `GET  /health` reports node status

use crate::node::{Node, NodeError};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use powchain_chain::LedgerError;
use powchain_consensus::ChainSnapshot;
use powchain_core::{Block, PowError, Transaction};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Body of `POST /transactions/new`. Every field is required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransactionRequest {
    pub sender: Option<String>,
    pub recipient: Option<String>,
    pub amount: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub message: String,
    pub index: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MineResponse {
    pub message: String,
    pub index: u64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
}

/// Body of `POST /nodes/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterNodesRequest {
    pub nodes: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
    pub total_nodes: Vec<String>,
}

/// Answer of `GET /nodes/resolve`: `new_chain` when replaced, `chain` otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_chain: Option<Vec<Block>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain: Option<Vec<Block>>,
}

impl ResolveResponse {
    pub fn replaced(&self) -> bool {
        self.new_chain.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub node_id: String,
    pub length: usize,
    pub pending: usize,
    pub peers: usize,
    pub difficulty: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

// ============================================================================
// API Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    /// Body was not valid JSON of the expected shape.
    MalformedInput(String),
    /// Required fields were absent.
    MissingFields(Vec<&'static str>),
    Node(NodeError),
}

impl From<NodeError> for ApiError {
    fn from(err: NodeError) -> Self {
        ApiError::Node(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::MalformedInput(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::MissingFields(fields) => (
                StatusCode::BAD_REQUEST,
                format!("missing value: {}", fields.join(", ")),
            ),
            ApiError::Node(err) => (node_error_status(&err), err.to_string()),
        };

        if status.is_server_error() {
            warn!(%status, error = %message, "request failed");
        }
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

fn node_error_status(err: &NodeError) -> StatusCode {
    match err {
        NodeError::Ledger(LedgerError::Peer(_)) => StatusCode::BAD_REQUEST,
        NodeError::Pow(PowError::Cancelled { .. } | PowError::Exhausted { .. })
        | NodeError::Ledger(LedgerError::Pow(PowError::Cancelled { .. } | PowError::Exhausted { .. })) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        NodeError::TipKeptMoving { .. } => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::MalformedInput(rejection.body_text()))
}

// ============================================================================
// Router
// ============================================================================

/// Build the node's router.
pub fn build_router(node: Arc<Node>) -> Router {
    Router::new()
        .route("/mine", get(mine))
        .route("/transactions/new", post(new_transaction))
        .route("/transactions.new", post(new_transaction))
        .route("/chain", get(full_chain))
        .route("/nodes/register", post(register_nodes))
        .route("/nodes/resolve", get(consensus))
        .route("/health", get(health))
        .with_state(node)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Handlers
// ============================================================================

async fn mine(State(node): State<Arc<Node>>) -> Result<Json<MineResponse>, ApiError> {
    let block = node.mine().await?;

    Ok(Json(MineResponse {
        message: "New Block Forged".to_string(),
        index: block.index,
        transactions: block.transactions,
        proof: block.proof,
        previous_hash: block.previous_hash,
    }))
}

async fn new_transaction(
    State(node): State<Arc<Node>>,
    payload: Result<Json<NewTransactionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TransactionResponse>), ApiError> {
    let request = json_body(payload)?;

    let (sender, recipient, amount) = match (request.sender, request.recipient, request.amount) {
        (Some(sender), Some(recipient), Some(amount)) => (sender, recipient, amount),
        (sender, recipient, amount) => {
            let mut missing = Vec::new();
            if sender.is_none() {
                missing.push("sender");
            }
            if recipient.is_none() {
                missing.push("recipient");
            }
            if amount.is_none() {
                missing.push("amount");
            }
            return Err(ApiError::MissingFields(missing));
        }
    };

    let index = node
        .submit_transaction(Transaction::new(sender, recipient, amount))
        .await;

    Ok((
        StatusCode::CREATED,
        Json(TransactionResponse {
            message: format!("Transaction will be added to Block {index}"),
            index,
        }),
    ))
}

async fn full_chain(State(node): State<Arc<Node>>) -> Json<ChainSnapshot> {
    Json(node.snapshot().await)
}

async fn register_nodes(
    State(node): State<Arc<Node>>,
    payload: Result<Json<RegisterNodesRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let nodes = json_body(payload)?
        .nodes
        .ok_or(ApiError::MissingFields(vec!["nodes"]))?;

    let total_nodes = node.register_peers(&nodes).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "New nodes have been added".to_string(),
            total_nodes,
        }),
    ))
}

async fn consensus(State(node): State<Arc<Node>>) -> Json<ResolveResponse> {
    let replaced = node.resolve_conflicts().await;
    let chain = node.snapshot().await.chain;

    Json(if replaced {
        ResolveResponse {
            message: "Our chain was replaced".to_string(),
            new_chain: Some(chain),
            chain: None,
        }
    } else {
        ResolveResponse {
            message: "Our chain is authoritative".to_string(),
            new_chain: None,
            chain: Some(chain),
        }
    })
}

async fn health(State(node): State<Arc<Node>>) -> Json<HealthResponse> {
    let stats = node.stats().await;

    Json(HealthResponse {
        status: "healthy".to_string(),
        node_id: node.node_id().to_string(),
        length: stats.length,
        pending: stats.pending_transactions,
        peers: stats.peer_count,
        difficulty: stats.difficulty,
    })
}
