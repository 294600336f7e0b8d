// Chain validation: pure and read-only. Only links between adjacent blocks
// are checked; the genesis block itself is taken as given.
use crate::core::{Block, ProofOfWork};
use crate::error::{BlockchainError, Result};
use log::{error, info};

/// Walk every `(previous, current)` pair and stop at the first broken link.
///
/// A link holds when `current.previous_hash` equals the hash of `previous`
/// and `current.proof` satisfies the proof-of-work predicate against it.
pub fn check_chain(chain: &[Block], pow: &ProofOfWork) -> Result<()> {
    for pair in chain.windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);
        let previous_hash = previous.hash();

        if current.get_previous_hash() != previous_hash {
            error!(
                "Block {} does not link to the hash of block {}",
                current.get_index(),
                previous.get_index()
            );
            return Err(BlockchainError::InvalidChainCandidate(format!(
                "block {} has previous_hash {}, expected {previous_hash}",
                current.get_index(),
                current.get_previous_hash()
            )));
        }

        if !pow.verify(previous.get_proof(), current.get_proof(), &previous_hash) {
            error!("Block {} carries an invalid proof", current.get_index());
            return Err(BlockchainError::InvalidChainCandidate(format!(
                "block {} has invalid proof {}",
                current.get_index(),
                current.get_proof()
            )));
        }
    }

    info!("Chain of length {} is valid", chain.len());
    Ok(())
}

pub fn valid_chain(chain: &[Block], pow: &ProofOfWork) -> bool {
    check_chain(chain, pow).is_ok()
}
