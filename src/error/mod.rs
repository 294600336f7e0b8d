//! Error handling for the ledger
//!
//! This module provides the error taxonomy shared by the engine, the peer
//! client and the HTTP request layer.

use std::fmt;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, BlockchainError>;

/// Error types for ledger operations
#[derive(Debug, Clone)]
pub enum BlockchainError {
    /// A submitted transaction is missing `sender`, `recipient` or `amount`
    InvalidTransactionPayload(String),
    /// A peer-supplied chain failed validation
    InvalidChainCandidate(String),
    /// A peer could not be reached or answered with a non-success status
    PeerUnreachable { peer: String, reason: String },
    /// A peer did not answer before the fetch deadline
    PeerTimeout(String),
    /// The local chain advanced while a proof was being searched
    ConcurrentMintConflict { expected: String, found: String },
    /// Another mine operation already holds the miner slot
    MiningInProgress,
    /// The proof search was cancelled before a proof was found
    MiningCancelled,
    /// Network communication errors
    Network(String),
    /// Serialization/deserialization errors
    Serialization(String),
    /// Configuration errors
    Config(String),
    /// File I/O errors
    Io(String),
}

impl fmt::Display for BlockchainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockchainError::InvalidTransactionPayload(msg) => {
                write!(f, "Invalid transaction payload: {msg}")
            }
            BlockchainError::InvalidChainCandidate(msg) => {
                write!(f, "Invalid chain candidate: {msg}")
            }
            BlockchainError::PeerUnreachable { peer, reason } => {
                write!(f, "Peer {peer} unreachable: {reason}")
            }
            BlockchainError::PeerTimeout(peer) => write!(f, "Peer {peer} timed out"),
            BlockchainError::ConcurrentMintConflict { expected, found } => {
                write!(
                    f,
                    "Chain moved during mining: expected tip {expected}, found {found}"
                )
            }
            BlockchainError::MiningInProgress => write!(f, "A block is already being mined"),
            BlockchainError::MiningCancelled => write!(f, "Mining was cancelled"),
            BlockchainError::Network(msg) => write!(f, "Network error: {msg}"),
            BlockchainError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            BlockchainError::Config(msg) => write!(f, "Configuration error: {msg}"),
            BlockchainError::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for BlockchainError {}

impl BlockchainError {
    /// True for errors a caller can clear by retrying the same operation
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BlockchainError::ConcurrentMintConflict { .. } | BlockchainError::MiningInProgress
        )
    }
}

impl From<std::io::Error> for BlockchainError {
    fn from(err: std::io::Error) -> Self {
        BlockchainError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BlockchainError {
    fn from(err: serde_json::Error) -> Self {
        BlockchainError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for BlockchainError {
    fn from(err: toml::de::Error) -> Self {
        BlockchainError::Config(err.to_string())
    }
}

impl From<reqwest::Error> for BlockchainError {
    fn from(err: reqwest::Error) -> Self {
        BlockchainError::Network(err.to_string())
    }
}
