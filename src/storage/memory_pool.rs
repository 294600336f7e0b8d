use crate::core::Transaction;

/// Pending transactions waiting for the next mined block.
///
/// The pool has no lock of its own: it lives inside the ledger state and is
/// only touched while the engine holds the state lock, so `drain` and the
/// block append that follows it happen in one critical section.
#[derive(Debug, Default)]
pub struct TransactionPool {
    pending: Vec<Transaction>,
}

impl TransactionPool {
    pub fn new() -> TransactionPool {
        TransactionPool {
            pending: Vec::new(),
        }
    }

    pub fn add(&mut self, tx: Transaction) {
        self.pending.push(tx);
    }

    /// Take every pending transaction, leaving the pool empty
    pub fn drain(&mut self) -> Vec<Transaction> {
        std::mem::take(&mut self.pending)
    }

    pub fn get_all(&self) -> &[Transaction] {
        self.pending.as_slice()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
