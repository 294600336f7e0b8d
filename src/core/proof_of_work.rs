use crate::core::Block;
use crate::utils::sha256_hex;
use log::{debug, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Number of leading zero hex digits a proof digest needs by default
pub const DEFAULT_DIFFICULTY: usize = 4;

/// A SHA-256 hex digest has 64 digits; anything above can never be met
pub const MAX_DIFFICULTY: usize = 64;

// How many nonces are tried between two looks at the cancellation flag
const CANCEL_CHECK_INTERVAL: u64 = 1024;

/// Cooperative cancellation signal shared between a miner and its caller
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> CancellationToken {
        CancellationToken::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofOfWork {
    difficulty: usize,
}

impl Default for ProofOfWork {
    fn default() -> Self {
        ProofOfWork::new(DEFAULT_DIFFICULTY)
    }
}

impl ProofOfWork {
    pub fn new(difficulty: usize) -> ProofOfWork {
        ProofOfWork { difficulty }
    }

    pub fn get_difficulty(&self) -> usize {
        self.difficulty
    }

    /// Check that `sha256("{last_proof}{proof}{last_hash}")` starts with
    /// `difficulty` zero hex digits
    pub fn verify(&self, last_proof: u64, proof: u64, last_hash: &str) -> bool {
        let guess = format!("{last_proof}{proof}{last_hash}");
        let digest = sha256_hex(guess.as_bytes());
        digest.len() >= self.difficulty && digest.bytes().take(self.difficulty).all(|b| b == b'0')
    }

    /// Find the smallest proof that satisfies `verify` against `last_block`.
    ///
    /// Runs until a proof is found; use `solve_with_cancel` when the caller
    /// needs a way out.
    pub fn solve(&self, last_block: &Block) -> u64 {
        let last_hash = last_block.hash();
        info!(
            "Searching proof for block {} at difficulty {}",
            last_block.get_index() + 1,
            self.difficulty
        );

        let mut proof = 0;
        while !self.verify(last_block.get_proof(), proof, &last_hash) {
            proof += 1;
        }

        debug!("Found proof {proof}");
        proof
    }

    /// Same search as `solve`, abandoned with `None` once `cancel` fires
    pub fn solve_with_cancel(&self, last_block: &Block, cancel: &CancellationToken) -> Option<u64> {
        let last_hash = last_block.hash();
        let last_proof = last_block.get_proof();
        info!(
            "Searching proof for block {} at difficulty {}",
            last_block.get_index() + 1,
            self.difficulty
        );

        let mut proof = 0;
        loop {
            if proof % CANCEL_CHECK_INTERVAL == 0 && cancel.is_cancelled() {
                info!("Proof search cancelled after {proof} attempts");
                return None;
            }
            if self.verify(last_proof, proof, &last_hash) {
                debug!("Found proof {proof}");
                return Some(proof);
            }
            proof += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::block::{GENESIS_PREVIOUS_HASH, GENESIS_PROOF};
    use std::thread;
    use std::time::Duration;

    fn create_test_block() -> Block {
        Block::with_timestamp(
            1,
            serde_json::Number::from(1_700_000_000u64),
            vec![],
            GENESIS_PROOF,
            GENESIS_PREVIOUS_HASH.to_string(),
        )
    }

    #[test]
    fn test_solved_proof_verifies() {
        let block = create_test_block();
        let pow = ProofOfWork::default();
        let proof = pow.solve(&block);

        assert!(pow.verify(block.get_proof(), proof, &block.hash()));
    }

    #[test]
    fn test_solve_returns_smallest_proof() {
        let block = create_test_block();
        let pow = ProofOfWork::new(3);
        let proof = pow.solve(&block);
        let last_hash = block.hash();

        for smaller in 0..proof {
            assert!(!pow.verify(block.get_proof(), smaller, &last_hash));
        }
    }

    #[test]
    fn test_cancellable_search_agrees_with_solve() {
        let block = create_test_block();
        let pow = ProofOfWork::new(3);
        let token = CancellationToken::new();

        assert_eq!(pow.solve_with_cancel(&block, &token), Some(pow.solve(&block)));
    }

    #[test]
    fn test_cancelled_before_start() {
        let block = create_test_block();
        let pow = ProofOfWork::new(MAX_DIFFICULTY);
        let token = CancellationToken::new();
        token.cancel();

        assert_eq!(pow.solve_with_cancel(&block, &token), None);
    }

    #[test]
    fn test_cancel_from_another_thread() {
        let block = create_test_block();
        let pow = ProofOfWork::new(MAX_DIFFICULTY);
        let token = CancellationToken::new();

        let canceller = token.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            canceller.cancel();
        });

        assert_eq!(pow.solve_with_cancel(&block, &token), None);
        handle.join().unwrap();
    }

    #[test]
    fn test_zero_difficulty_accepts_everything() {
        let pow = ProofOfWork::new(0);
        assert!(pow.verify(1, 2, "anything"));
        assert_eq!(pow.solve(&create_test_block()), 0);
    }
}
