//! Configuration management
//!
//! This module handles node settings: listen address, proof-of-work
//! difficulty, peer fetch timeout, mining reward and node identity.

pub mod settings;

pub use settings::Settings;
