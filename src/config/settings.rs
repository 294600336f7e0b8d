use crate::core::{
    new_node_id, EngineConfig, DEFAULT_DIFFICULTY, DEFAULT_MINING_REWARD, MAX_DIFFICULTY,
};
use crate::error::{BlockchainError, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

static DEFAULT_NODE_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_PEER_TIMEOUT_MS: u64 = 5000;

const NODE_ADDRESS_KEY: &str = "NODE_ADDRESS";
const POW_DIFFICULTY_KEY: &str = "POW_DIFFICULTY";
const PEER_TIMEOUT_KEY: &str = "PEER_TIMEOUT_MS";
const NODE_ID_KEY: &str = "NODE_ID";

/// Node settings: TOML file, then environment, then command-line flags
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub listen_addr: String,
    pub difficulty: usize,
    pub peer_timeout_ms: u64,
    pub mining_reward: u64,
    pub node_id: Option<String>,
    pub peers: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            listen_addr: String::from(DEFAULT_NODE_ADDR),
            difficulty: DEFAULT_DIFFICULTY,
            peer_timeout_ms: DEFAULT_PEER_TIMEOUT_MS,
            mining_reward: DEFAULT_MINING_REWARD,
            node_id: None,
            peers: Vec::new(),
        }
    }
}

impl Settings {
    /// Load settings from an optional TOML file and the process environment
    pub fn load(path: Option<&Path>) -> Result<Settings> {
        let mut settings = match path {
            Some(path) => {
                let contents = fs::read_to_string(path).map_err(|e| {
                    BlockchainError::Config(format!("Cannot read {}: {e}", path.display()))
                })?;
                Settings::from_toml_str(&contents)?
            }
            None => Settings::default(),
        };
        settings.apply_overrides(|key| env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_toml_str(contents: &str) -> Result<Settings> {
        Ok(toml::from_str(contents)?)
    }

    /// Apply overrides from `lookup`, keyed by environment variable name
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup(NODE_ADDRESS_KEY) {
            self.listen_addr = addr;
        }
        if let Some(difficulty) = lookup(POW_DIFFICULTY_KEY) {
            self.difficulty = difficulty.trim().parse().map_err(|_| {
                BlockchainError::Config(format!("{POW_DIFFICULTY_KEY} is not a number: {difficulty}"))
            })?;
        }
        if let Some(timeout) = lookup(PEER_TIMEOUT_KEY) {
            self.peer_timeout_ms = timeout.trim().parse().map_err(|_| {
                BlockchainError::Config(format!("{PEER_TIMEOUT_KEY} is not a number: {timeout}"))
            })?;
        }
        if let Some(node_id) = lookup(NODE_ID_KEY) {
            self.node_id = Some(node_id);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.difficulty > MAX_DIFFICULTY {
            return Err(BlockchainError::Config(format!(
                "difficulty {} exceeds the {MAX_DIFFICULTY} hex digits of a SHA-256 digest",
                self.difficulty
            )));
        }
        if self.peer_timeout_ms == 0 {
            return Err(BlockchainError::Config(
                "peer_timeout_ms must be positive".to_string(),
            ));
        }
        if self.node_id.as_deref().is_some_and(str::is_empty) {
            return Err(BlockchainError::Config("node_id must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn peer_timeout(&self) -> Duration {
        Duration::from_millis(self.peer_timeout_ms)
    }

    /// Engine configuration; a random node id is drawn when none is set
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            difficulty: self.difficulty,
            mining_reward: self.mining_reward,
            node_id: self.node_id.clone().unwrap_or_else(new_node_id),
            peer_timeout: self.peer_timeout(),
        }
    }
}
