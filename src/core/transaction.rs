use crate::error::{BlockchainError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Sender recorded on the reward transaction a miner credits to itself
pub const REWARD_SENDER: &str = "0";

/// Keys every submitted transaction has to carry
pub const REQUIRED_FIELDS: [&str; 3] = ["sender", "recipient", "amount"];

/// A value transfer waiting in the pool or recorded in a block.
///
/// The engine performs no semantic validation: the required keys hold
/// whatever JSON values the client sent, and any extra keys are kept in
/// `extra` and serialized back verbatim next to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    sender: Value,
    recipient: Value,
    amount: Value,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Transaction {
    pub fn new(sender: &str, recipient: &str, amount: u64) -> Transaction {
        Transaction {
            sender: Value::from(sender),
            recipient: Value::from(recipient),
            amount: Value::from(amount),
            extra: Map::new(),
        }
    }

    /// The reward a miner receives for finding a proof
    pub fn reward(recipient: &str, amount: u64) -> Transaction {
        Transaction::new(REWARD_SENDER, recipient, amount)
    }

    /// Attach an additional key that is stored alongside the required fields
    pub fn with_field(mut self, key: &str, value: Value) -> Transaction {
        if !REQUIRED_FIELDS.contains(&key) {
            self.extra.insert(key.to_string(), value);
        }
        self
    }

    /// Build a transaction from a client-supplied JSON payload.
    ///
    /// Fails with `InvalidTransactionPayload` when the payload is not an
    /// object or a required key is missing. Values are not inspected.
    pub fn from_payload(payload: &Value) -> Result<Transaction> {
        let object = payload.as_object().ok_or_else(|| {
            BlockchainError::InvalidTransactionPayload("payload is not a JSON object".to_string())
        })?;

        let missing: Vec<&str> = REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|key| !object.contains_key(*key))
            .collect();
        if !missing.is_empty() {
            return Err(BlockchainError::InvalidTransactionPayload(format!(
                "missing {}",
                missing.join(", ")
            )));
        }

        serde_json::from_value(payload.clone())
            .map_err(|e| BlockchainError::InvalidTransactionPayload(e.to_string()))
    }

    /// The sender, when it is a string
    pub fn get_sender(&self) -> Option<&str> {
        self.sender.as_str()
    }

    /// The recipient, when it is a string
    pub fn get_recipient(&self) -> Option<&str> {
        self.recipient.as_str()
    }

    pub fn get_amount(&self) -> &Value {
        &self.amount
    }

    pub fn get_extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    pub fn is_reward(&self) -> bool {
        self.get_sender() == Some(REWARD_SENDER)
    }
}
