// This is the ledger itself: the ordered list of blocks plus the pool of
// transactions waiting for the next block.
// Nothing here locks; the engine wraps a Blockchain in an RwLock and every
// mutation below runs under its write guard.

use crate::core::block::{GENESIS_PREVIOUS_HASH, GENESIS_PROOF};
use crate::core::{Block, Transaction};
use crate::error::Result;
use crate::storage::TransactionPool;
use crate::utils::current_timestamp;
use log::info;
use serde_json::Number;

#[derive(Debug)]
pub struct Blockchain {
    chain: Vec<Block>,
    pool: TransactionPool,
}

impl Blockchain {
    // A new ledger always starts with the genesis block, so the chain is never empty
    pub fn new() -> Result<Blockchain> {
        let mut blockchain = Blockchain {
            chain: Vec::new(),
            pool: TransactionPool::new(),
        };
        blockchain.mint(GENESIS_PROOF, Some(GENESIS_PREVIOUS_HASH))?;
        Ok(blockchain)
    }

    /// Append a block holding every pooled transaction, stamped now.
    ///
    /// An empty or missing `previous_hash` falls back to the hash of the
    /// current last block.
    pub fn mint(&mut self, proof: u64, previous_hash: Option<&str>) -> Result<Block> {
        let created_at = current_timestamp()?;
        Ok(self.mint_at(created_at, proof, previous_hash))
    }

    /// `mint` with an explicit timestamp; cannot fail
    pub fn mint_at(
        &mut self,
        created_at: Number,
        proof: u64,
        previous_hash: Option<&str>,
    ) -> Block {
        let previous_hash = match previous_hash {
            Some(hash) if !hash.is_empty() => hash.to_string(),
            _ => self.last_block().hash(),
        };

        // I drain the pool right before the append so no transaction can land in two blocks
        let transactions = self.pool.drain();
        let block = Block::with_timestamp(
            self.chain.len() as u64 + 1,
            created_at,
            transactions,
            proof,
            previous_hash,
        );
        self.chain.push(block.clone());

        info!(
            "New block {} created with {} transactions",
            block.get_index(),
            block.get_transactions().len()
        );
        block
    }

    /// Queue a transaction; returns the index of the block that will hold it
    pub fn submit(&mut self, tx: Transaction) -> u64 {
        self.pool.add(tx);
        self.last_block().get_index() + 1
    }

    pub fn last_block(&self) -> &Block {
        self.chain
            .last()
            .expect("Chain always holds at least the genesis block")
    }

    pub fn get_chain(&self) -> &[Block] {
        self.chain.as_slice()
    }

    pub fn get_pending(&self) -> &[Transaction] {
        self.pool.get_all()
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    // Always false once constructed
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Swap the whole chain for `chain`. Callers validate it first.
    /// Pending transactions stay in the pool.
    pub fn replace_chain(&mut self, chain: Vec<Block>) {
        if chain.is_empty() {
            return;
        }
        info!(
            "Replacing chain of length {} with chain of length {}",
            self.chain.len(),
            chain.len()
        );
        self.chain = chain;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genesis_block() {
        let blockchain = Blockchain::new().unwrap();
        assert_eq!(blockchain.len(), 1);

        let genesis = blockchain.last_block();
        assert_eq!(genesis.get_index(), 1);
        assert_eq!(genesis.get_proof(), 100);
        assert_eq!(genesis.get_previous_hash(), "1");
        assert!(genesis.get_transactions().is_empty());
    }

    #[test]
    fn test_submit_predicts_next_index() {
        let mut blockchain = Blockchain::new().unwrap();
        assert_eq!(blockchain.submit(Transaction::new("a", "b", 1)), 2);
        assert_eq!(blockchain.submit(Transaction::new("c", "d", 1)), 2);
        assert_eq!(blockchain.get_pending().len(), 2);
    }

    #[test]
    fn test_mint_consumes_pool() {
        let mut blockchain = Blockchain::new().unwrap();
        blockchain.submit(Transaction::new("a", "b", 1));
        blockchain.submit(Transaction::new("c", "d", 2));

        let block = blockchain.mint(12, None).unwrap();
        assert_eq!(block.get_index(), 2);
        assert_eq!(block.get_transactions().len(), 2);
        assert!(blockchain.get_pending().is_empty());

        // The next block does not see the same transactions again
        let next = blockchain.mint(13, None).unwrap();
        assert!(next.get_transactions().is_empty());
    }

    #[test]
    fn test_mint_falls_back_to_last_hash() {
        let mut blockchain = Blockchain::new().unwrap();
        let genesis_hash = blockchain.last_block().hash();

        let from_none = blockchain.mint(1, None).unwrap();
        assert_eq!(from_none.get_previous_hash(), genesis_hash);

        let second_hash = from_none.hash();
        let from_empty = blockchain.mint(2, Some("")).unwrap();
        assert_eq!(from_empty.get_previous_hash(), second_hash);

        let explicit = blockchain.mint(3, Some("deadbeef")).unwrap();
        assert_eq!(explicit.get_previous_hash(), "deadbeef");
    }

    #[test]
    fn test_replace_chain_keeps_pool() {
        let mut blockchain = Blockchain::new().unwrap();
        blockchain.submit(Transaction::new("a", "b", 1));

        let mut other = Blockchain::new().unwrap();
        other.mint(5, None).unwrap();
        let replacement = other.get_chain().to_vec();

        blockchain.replace_chain(replacement.clone());
        assert_eq!(blockchain.get_chain(), replacement.as_slice());
        assert_eq!(blockchain.get_pending().len(), 1);
    }

    #[test]
    fn test_replace_with_empty_chain_is_ignored() {
        let mut blockchain = Blockchain::new().unwrap();
        blockchain.replace_chain(Vec::new());
        assert_eq!(blockchain.len(), 1);
    }
}
