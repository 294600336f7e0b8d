//! In-memory storage
//!
//! This module holds the pool of pending transactions. Nothing is persisted
//! across restarts.

pub mod memory_pool;

pub use memory_pool::TransactionPool;
