// The engine is the single owner of the ledger state: the chain, the pool of
// pending transactions and the set of known peers. Request handlers hold an
// Arc<Engine> and go through the methods below, never through the
// structures themselves.
//
// Locking discipline:
//  - chain + pool live behind one RwLock so a mint (drain + append) is atomic
//    and readers always see a consistent chain
//  - the proof search runs without any lock; the tip is re-checked before
//    the block is appended
//  - only one mine runs at a time, a second one is rejected

use crate::core::consensus::DEFAULT_PEER_TIMEOUT;
use crate::core::{
    Block, Blockchain, CancellationToken, ConsensusResolver, PeerChainProvider, ProofOfWork,
    Transaction, DEFAULT_DIFFICULTY,
};
use crate::error::{BlockchainError, Result};
use crate::network::NodeRegistry;
use crate::utils::current_timestamp;
use log::{info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use uuid::Uuid;

/// Amount credited to the miner of each block by default
pub const DEFAULT_MINING_REWARD: u64 = 1;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub difficulty: usize,
    pub mining_reward: u64,
    pub node_id: String,
    pub peer_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            difficulty: DEFAULT_DIFFICULTY,
            mining_reward: DEFAULT_MINING_REWARD,
            node_id: new_node_id(),
            peer_timeout: DEFAULT_PEER_TIMEOUT,
        }
    }
}

/// Random node identity: a v4 UUID without dashes
pub fn new_node_id() -> String {
    Uuid::new_v4().simple().to_string()
}

pub struct Engine {
    state: RwLock<Blockchain>,
    nodes: NodeRegistry,
    pow: ProofOfWork,
    resolver: ConsensusResolver,
    mining: AtomicBool,
    node_id: String,
    mining_reward: u64,
}

// Frees the miner slot when a mine finishes, fails or unwinds
struct MiningGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for MiningGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

impl Engine {
    /// Create an engine whose chain holds only the genesis block
    pub fn new(config: EngineConfig) -> Result<Engine> {
        let pow = ProofOfWork::new(config.difficulty);
        let engine = Engine {
            state: RwLock::new(Blockchain::new()?),
            nodes: NodeRegistry::new(),
            pow,
            resolver: ConsensusResolver::new(pow, config.peer_timeout),
            mining: AtomicBool::new(false),
            node_id: config.node_id,
            mining_reward: config.mining_reward,
        };
        info!(
            "Engine started for node {} at difficulty {}",
            engine.node_id,
            engine.pow.get_difficulty()
        );
        Ok(engine)
    }

    pub fn node_id(&self) -> &str {
        self.node_id.as_str()
    }

    pub fn proof_of_work(&self) -> &ProofOfWork {
        &self.pow
    }

    /// Queue a transaction; returns the index of the block expected to hold it
    pub fn submit_transaction(&self, tx: Transaction) -> u64 {
        let index = self.write_state().submit(tx);
        info!("Transaction queued for block {index}");
        index
    }

    /// Mine the next block, running to completion
    pub fn mine(&self) -> Result<Block> {
        self.mine_with_cancel(&CancellationToken::new())
    }

    /// Mine the next block unless `cancel` fires first.
    ///
    /// On cancellation or a tip conflict the chain and the pool are left
    /// exactly as they were.
    pub fn mine_with_cancel(&self, cancel: &CancellationToken) -> Result<Block> {
        let _guard = self.acquire_miner()?;

        let last_block = self.read_state().last_block().clone();
        let proof = self
            .pow
            .solve_with_cancel(&last_block, cancel)
            .ok_or(BlockchainError::MiningCancelled)?;

        self.forge(&last_block, proof)
    }

    // Append the block for a proof found against `last_block`, provided the
    // chain still ends with it; otherwise the proof is dropped untouched.
    fn forge(&self, last_block: &Block, proof: u64) -> Result<Block> {
        let last_hash = last_block.hash();
        let created_at = current_timestamp()?;

        let mut state = self.write_state();
        let tip_hash = state.last_block().hash();
        if tip_hash != last_hash {
            warn!(
                "Chain moved while mining block {}; discarding proof",
                last_block.get_index() + 1
            );
            return Err(BlockchainError::ConcurrentMintConflict {
                expected: last_hash,
                found: tip_hash,
            });
        }

        state.submit(Transaction::reward(&self.node_id, self.mining_reward));
        let block = state.mint_at(created_at, proof, Some(&last_hash));
        info!("New block forged: {} (proof {proof})", block.get_index());
        Ok(block)
    }

    /// Consistent snapshot of the chain and its length
    pub fn list_chain(&self) -> (Vec<Block>, usize) {
        let state = self.read_state();
        (state.get_chain().to_vec(), state.len())
    }

    pub fn last_block(&self) -> Block {
        self.read_state().last_block().clone()
    }

    pub fn pending_transactions(&self) -> Vec<Transaction> {
        self.read_state().get_pending().to_vec()
    }

    pub fn register_peer(&self, address: &str) {
        self.nodes.add_node(address);
    }

    pub fn peers(&self) -> Vec<String> {
        self.nodes.get_nodes()
    }

    /// Run a consensus round against every registered peer.
    ///
    /// Returns whether the local chain was replaced, along with the chain
    /// now in effect.
    pub fn resolve(&self, provider: Arc<dyn PeerChainProvider>) -> (bool, Vec<Block>) {
        let peers = self.nodes.get_nodes();
        let local_length = self.read_state().len();

        let candidate = self
            .resolver
            .find_longer_chain(&peers, local_length, provider);

        let mut state = self.write_state();
        if let Some(chain) = candidate {
            // The local chain may have grown while peers were being asked
            if chain.len() > state.len() {
                warn!("Replacing chain with a newer, longer, valid chain.");
                state.replace_chain(chain);
                return (true, state.get_chain().to_vec());
            }
            info!("Local chain grew during resolution; keeping it");
        }

        (false, state.get_chain().to_vec())
    }

    fn acquire_miner(&self) -> Result<MiningGuard<'_>> {
        self.mining
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| BlockchainError::MiningInProgress)?;
        Ok(MiningGuard {
            flag: &self.mining,
        })
    }

    // Every mutation leaves the ledger consistent, so a poisoned lock still holds usable state
    fn read_state(&self) -> RwLockReadGuard<'_, Blockchain> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, Blockchain> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
