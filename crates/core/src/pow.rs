//! Proof-of-work puzzle.
//!
//! A proof `p` is accepted after a previous proof `q` when the SHA-256 hex
//! digest of the decimal string `"{q}{p}"` starts with the configured target
//! prefix. Solving is a forward brute-force search from zero, so the answer for
//! a given `q` and target is always the smallest accepted value.
//!
//! The search is CPU-bound and blocks the calling thread. With the default
//! options it has no iteration bound and cannot be interrupted; use
//! [`SolveOptions`] to cap the number of attempts or to observe a
//! [`CancelToken`].

use crate::hash::sha256_hex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Default difficulty: four leading hex zeros.
pub const DEFAULT_TARGET: &str = "0000";

/// How many candidates are tried between two cancellation checks.
const CANCEL_CHECK_INTERVAL: u64 = 1024;

/// Errors that can occur while configuring or running the puzzle.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PowError {
    #[error("invalid difficulty target {0:?} (expected 1-64 hex digits)")]
    InvalidTarget(String),

    #[error("no proof found within {attempts} attempts")]
    Exhausted { attempts: u64 },

    #[error("proof search cancelled after {attempts} attempts")]
    Cancelled { attempts: u64 },
}

pub type Result<T> = std::result::Result<T, PowError>;

/// Shared flag used to stop a running search.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every search observing this token to stop.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Limits applied to a single search.
#[derive(Debug, Clone, Default)]
pub struct SolveOptions {
    /// Give up after this many candidates.
    pub max_attempts: Option<u64>,
    /// Stop early once this token is cancelled.
    pub cancel: Option<CancelToken>,
}

impl SolveOptions {
    /// No bound and no cancellation.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_max_attempts(mut self, max_attempts: u64) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// The proof-of-work puzzle with its difficulty target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofOfWork {
    target: String,
}

impl Default for ProofOfWork {
    fn default() -> Self {
        Self {
            target: DEFAULT_TARGET.to_string(),
        }
    }
}

impl ProofOfWork {
    /// Create a puzzle whose digests must start with `target`.
    pub fn new(target: impl Into<String>) -> Result<Self> {
        let target = target.into().to_ascii_lowercase();
        if target.is_empty() || target.len() > 64 || !target.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(PowError::InvalidTarget(target));
        }
        Ok(Self { target })
    }

    /// Create a puzzle requiring `zeros` leading hex zeros.
    pub fn with_leading_zeros(zeros: usize) -> Result<Self> {
        Self::new("0".repeat(zeros))
    }

    /// Get the target prefix.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Digest checked against the target for a candidate proof.
    pub fn guess_hash(last_proof: u64, proof: u64) -> String {
        sha256_hex(format!("{last_proof}{proof}").as_bytes())
    }

    /// Check if `proof` solves the puzzle after `last_proof`.
    pub fn verify(&self, last_proof: u64, proof: u64) -> bool {
        Self::guess_hash(last_proof, proof).starts_with(&self.target)
    }

    /// Find the smallest proof accepted after `last_proof`.
    ///
    /// Blocks until a proof is found, with no upper bound on running time.
    pub fn solve(&self, last_proof: u64) -> u64 {
        let mut proof = 0;
        while !self.verify(last_proof, proof) {
            proof += 1;
        }
        proof
    }

    /// Find the smallest proof accepted after `last_proof`, honouring the
    /// attempt bound and cancellation token in `options`.
    pub fn solve_with(&self, last_proof: u64, options: &SolveOptions) -> Result<u64> {
        let mut attempts: u64 = 0;
        loop {
            if let Some(max) = options.max_attempts {
                if attempts >= max {
                    return Err(PowError::Exhausted { attempts });
                }
            }
            if attempts % CANCEL_CHECK_INTERVAL == 0 {
                if let Some(cancel) = &options.cancel {
                    if cancel.is_cancelled() {
                        return Err(PowError::Cancelled { attempts });
                    }
                }
            }

            // The candidate tried on attempt n is n itself.
            let proof = attempts;
            if self.verify(last_proof, proof) {
                return Ok(proof);
            }
            attempts += 1;
        }
    }
}
