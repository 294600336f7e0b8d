//! # powledger
//!
//! A minimal append-only ledger secured by proof-of-work and replicated
//! between peers with a longest-valid-chain rule.
//!
//! ## Layout
//! - `core/`: transactions, blocks and their canonical hash, proof-of-work,
//!   chain validation, consensus resolution and the `Engine` facade
//! - `storage/`: the pool of pending transactions
//! - `network/`: peer registry, HTTP peer client and HTTP server
//! - `config/`: node settings (TOML file + environment)
//! - `utils/`: SHA-256 helpers, timestamps, canonical JSON
//! - `cli/`: command-line parsing for the node binary
//!
//! State lives only in memory; a restarted node begins again from genesis.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod network;
pub mod storage;
pub mod utils;

#[cfg(test)]
pub mod testnet;

// Re-export commonly used types for convenience
pub use cli::{Command, Opt};
pub use config::Settings;
pub use core::{
    check_chain, valid_chain, Block, Blockchain, CancellationToken, ConsensusResolver, Engine,
    EngineConfig, PeerChain, PeerChainProvider, ProofOfWork, Transaction,
};
pub use error::{BlockchainError, Result};
pub use network::{HttpPeerClient, NodeRegistry, Server};
pub use storage::TransactionPool;
pub use utils::{canonical_json, current_timestamp, sha256_digest, sha256_hex};
