//! Utility functions and helpers
//!
//! This module contains the digest helpers, timestamps and the canonical
//! JSON encoding used for block hashing.

pub mod crypto;
pub mod serialization;

pub use crypto::{current_timestamp, sha256_digest, sha256_hex};

pub use serialization::{canonical_json, to_canonical_value};
