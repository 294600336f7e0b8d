//! Longest-valid-chain consensus
//!
//! The resolver asks every known peer for its chain, keeps the longest one
//! that validates, and leaves applying it to the caller. Peer fetches run on
//! their own threads behind a shared deadline so one slow peer can never
//! stall a round.

use crate::core::validation::check_chain;
use crate::core::{Block, ProofOfWork};
use crate::error::{BlockchainError, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Default deadline for a whole round of peer fetches
pub const DEFAULT_PEER_TIMEOUT: Duration = Duration::from_secs(5);

/// Body of a peer's `GET /chain` answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerChain {
    pub chain: Vec<Block>,
    pub length: usize,
}

impl PeerChain {
    pub fn new(chain: Vec<Block>) -> PeerChain {
        let length = chain.len();
        PeerChain { chain, length }
    }
}

/// Source of peer chains. Each call is a single attempt.
pub trait PeerChainProvider: Send + Sync {
    fn fetch_chain(&self, peer: &str) -> Result<PeerChain>;
}

pub struct ConsensusResolver {
    pow: ProofOfWork,
    peer_timeout: Duration,
}

impl ConsensusResolver {
    pub fn new(pow: ProofOfWork, peer_timeout: Duration) -> ConsensusResolver {
        ConsensusResolver { pow, peer_timeout }
    }

    /// Return the chain that should replace `local_chain`, if any.
    ///
    /// The boolean is true only when a strictly longer valid chain was found;
    /// otherwise `local_chain` is handed back unchanged.
    pub fn resolve(
        &self,
        peers: &[String],
        local_chain: &[Block],
        provider: Arc<dyn PeerChainProvider>,
    ) -> (bool, Vec<Block>) {
        match self.find_longer_chain(peers, local_chain.len(), provider) {
            Some(chain) => (true, chain),
            None => (false, local_chain.to_vec()),
        }
    }

    /// Scan the peers and keep the longest valid chain longer than `local_length`
    pub fn find_longer_chain(
        &self,
        peers: &[String],
        local_length: usize,
        provider: Arc<dyn PeerChainProvider>,
    ) -> Option<Vec<Block>> {
        let mut max_length = local_length;
        let mut best: Option<Vec<Block>> = None;

        for (peer, result) in self.fetch_all(peers, provider) {
            let peer_chain = match result {
                Ok(peer_chain) => peer_chain,
                Err(e) => {
                    warn!("Skipping peer {peer}: {e}");
                    continue;
                }
            };

            // Equal length never wins; the local chain is kept on ties
            if peer_chain.length <= max_length {
                debug!(
                    "Peer {peer} reports length {}, not longer than {max_length}",
                    peer_chain.length
                );
                continue;
            }

            match self.check_candidate(&peer_chain) {
                Ok(()) => {
                    info!("Peer {peer} offers a valid chain of length {}", peer_chain.length);
                    max_length = peer_chain.length;
                    best = Some(peer_chain.chain);
                }
                Err(e) => warn!("Discarding chain from {peer}: {e}"),
            }
        }

        best
    }

    fn check_candidate(&self, peer_chain: &PeerChain) -> Result<()> {
        if peer_chain.chain.is_empty() {
            return Err(BlockchainError::InvalidChainCandidate(
                "chain is empty".to_string(),
            ));
        }
        if peer_chain.chain.len() != peer_chain.length {
            return Err(BlockchainError::InvalidChainCandidate(format!(
                "reported length {} but carries {} blocks",
                peer_chain.length,
                peer_chain.chain.len()
            )));
        }
        check_chain(&peer_chain.chain, &self.pow)
    }

    // Results come back in the order of `peers`, whatever order the threads finish in
    fn fetch_all(
        &self,
        peers: &[String],
        provider: Arc<dyn PeerChainProvider>,
    ) -> Vec<(String, Result<PeerChain>)> {
        let (tx, rx) = mpsc::channel();
        for (slot, peer) in peers.iter().enumerate() {
            let tx = tx.clone();
            let provider = Arc::clone(&provider);
            let peer = peer.clone();
            info!("Fetching chain from: {peer}");
            thread::spawn(move || {
                let result = provider.fetch_chain(&peer);
                // The receiver is gone once the deadline passed; late answers are dropped
                let _ = tx.send((slot, result));
            });
        }
        drop(tx);

        let deadline = Instant::now() + self.peer_timeout;
        let mut results: Vec<Option<Result<PeerChain>>> = peers.iter().map(|_| None).collect();
        let mut outstanding = peers.len();

        while outstanding > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match rx.recv_timeout(remaining) {
                Ok((slot, result)) => {
                    results[slot] = Some(result);
                    outstanding -= 1;
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        peers
            .iter()
            .zip(results)
            .map(|(peer, result)| {
                let result =
                    result.unwrap_or_else(|| Err(BlockchainError::PeerTimeout(peer.clone())));
                (peer.clone(), result)
            })
            .collect()
    }
}
