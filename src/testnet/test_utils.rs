//! Test utilities for ledger and consensus testing

use crate::core::{
    Block, Blockchain, PeerChain, PeerChainProvider, ProofOfWork, Transaction,
};
use crate::error::{BlockchainError, Result};
use std::collections::HashMap;
use std::thread;
use std::time::Duration;

/// Node identity used on reward transactions in test chains
pub const TEST_NODE_ID: &str = "test-node";

/// Mine a valid chain of `length` blocks (genesis included)
pub fn build_chain(length: usize, pow: &ProofOfWork) -> Vec<Block> {
    let mut blockchain = Blockchain::new().expect("genesis creation should not fail in tests");
    while blockchain.len() < length {
        let proof = pow.solve(blockchain.last_block());
        blockchain.submit(Transaction::reward(TEST_NODE_ID, 1));
        blockchain
            .mint(proof, None)
            .expect("minting should not fail in tests");
    }
    blockchain.get_chain().to_vec()
}

enum MockAnswer {
    Chain(PeerChain, Option<Duration>),
    Failure,
}

/// Peer provider answering from a fixed table; unknown peers are unreachable
#[derive(Default)]
pub struct MockPeers {
    answers: HashMap<String, MockAnswer>,
}

impl MockPeers {
    pub fn new() -> MockPeers {
        MockPeers::default()
    }

    pub fn with_chain(self, peer: &str, chain: Vec<Block>) -> MockPeers {
        self.with_peer_chain(peer, PeerChain::new(chain))
    }

    pub fn with_peer_chain(mut self, peer: &str, peer_chain: PeerChain) -> MockPeers {
        self.answers
            .insert(peer.to_string(), MockAnswer::Chain(peer_chain, None));
        self
    }

    pub fn with_delayed_chain(mut self, peer: &str, chain: Vec<Block>, delay: Duration) -> MockPeers {
        self.answers.insert(
            peer.to_string(),
            MockAnswer::Chain(PeerChain::new(chain), Some(delay)),
        );
        self
    }

    pub fn with_failure(mut self, peer: &str) -> MockPeers {
        self.answers.insert(peer.to_string(), MockAnswer::Failure);
        self
    }
}

impl PeerChainProvider for MockPeers {
    fn fetch_chain(&self, peer: &str) -> Result<PeerChain> {
        match self.answers.get(peer) {
            Some(MockAnswer::Chain(peer_chain, delay)) => {
                if let Some(delay) = delay {
                    thread::sleep(*delay);
                }
                Ok(peer_chain.clone())
            }
            Some(MockAnswer::Failure) => Err(BlockchainError::PeerUnreachable {
                peer: peer.to_string(),
                reason: "status 500".to_string(),
            }),
            None => Err(BlockchainError::PeerUnreachable {
                peer: peer.to_string(),
                reason: "connection refused".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::valid_chain;

    #[test]
    fn test_build_chain_lengths() {
        let pow = ProofOfWork::new(2);
        assert_eq!(build_chain(1, &pow).len(), 1);

        let chain = build_chain(3, &pow);
        assert_eq!(chain.len(), 3);
        assert!(valid_chain(&chain, &pow));
    }

    #[test]
    fn test_mock_peers_unknown_peer() {
        let peers = MockPeers::new();
        assert!(matches!(
            peers.fetch_chain("nowhere:1"),
            Err(BlockchainError::PeerUnreachable { .. })
        ));
    }
}
