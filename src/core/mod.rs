//! Core ledger functionality
//!
//! This module contains the fundamental ledger components: transactions,
//! blocks and their canonical hash, proof-of-work, chain validation,
//! consensus resolution and the engine that ties them together.

pub mod block;
pub mod blockchain;
pub mod consensus;
pub mod engine;
pub mod proof_of_work;
pub mod transaction;
pub mod validation;

pub use block::{Block, GENESIS_PREVIOUS_HASH, GENESIS_PROOF};
pub use blockchain::Blockchain;
pub use consensus::{ConsensusResolver, PeerChain, PeerChainProvider, DEFAULT_PEER_TIMEOUT};
pub use engine::{new_node_id, Engine, EngineConfig, DEFAULT_MINING_REWARD};
pub use proof_of_work::{CancellationToken, ProofOfWork, DEFAULT_DIFFICULTY, MAX_DIFFICULTY};
pub use transaction::{Transaction, REQUIRED_FIELDS, REWARD_SENDER};
pub use validation::{check_chain, valid_chain};
