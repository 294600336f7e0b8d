use crate::core::Transaction;
use crate::utils::{canonical_json, sha256_hex};
use serde::{Deserialize, Serialize};
use serde_json::Number;

/// `previous_hash` carried by the genesis block
pub const GENESIS_PREVIOUS_HASH: &str = "1";

/// Proof carried by the genesis block
pub const GENESIS_PROOF: u64 = 100;

/// One entry of the chain.
///
/// The JSON form of a block (`index`, `created_at`, `transactions`, `proof`,
/// `previous_hash`) is what peers exchange on `/chain` and what the
/// canonical hash is computed over. `created_at` is Unix time in seconds and
/// is kept as the exact JSON number a block arrived with, integer or float.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    index: u64,
    created_at: Number,
    transactions: Vec<Transaction>,
    proof: u64,
    previous_hash: String,
}

impl Block {
    pub fn with_timestamp(
        index: u64,
        created_at: Number,
        transactions: Vec<Transaction>,
        proof: u64,
        previous_hash: String,
    ) -> Block {
        Block {
            index,
            created_at,
            transactions,
            proof,
            previous_hash,
        }
    }

    /// SHA-256 over the canonical (key-sorted) JSON form of the block, hex encoded
    pub fn hash(&self) -> String {
        let bytes = canonical_json(self)
            .expect("Block serialization should never fail: all map keys are strings");
        sha256_hex(&bytes)
    }

    pub fn get_index(&self) -> u64 {
        self.index
    }

    pub fn get_timestamp(&self) -> &Number {
        &self.created_at
    }

    pub fn get_transactions(&self) -> &[Transaction] {
        self.transactions.as_slice()
    }

    pub fn get_proof(&self) -> u64 {
        self.proof
    }

    pub fn get_previous_hash(&self) -> &str {
        self.previous_hash.as_str()
    }

    pub fn is_genesis_shaped(&self) -> bool {
        self.index == 1
            && self.proof == GENESIS_PROOF
            && self.previous_hash == GENESIS_PREVIOUS_HASH
    }
}
