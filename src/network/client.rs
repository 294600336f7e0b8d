use crate::core::{PeerChain, PeerChainProvider};
use crate::error::{BlockchainError, Result};
use log::debug;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::time::Duration;

/// Fetches peer chains over HTTP: `GET http://{peer}/chain`.
///
/// Every request is a single attempt bounded by the client timeout.
#[derive(Clone)]
pub struct HttpPeerClient {
    client: Client,
}

impl HttpPeerClient {
    pub fn new(timeout: Duration) -> Result<HttpPeerClient> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;
        Ok(HttpPeerClient { client })
    }

    fn transport_error(peer: &str, err: reqwest::Error) -> BlockchainError {
        if err.is_timeout() {
            BlockchainError::PeerTimeout(peer.to_string())
        } else {
            BlockchainError::PeerUnreachable {
                peer: peer.to_string(),
                reason: err.to_string(),
            }
        }
    }
}

impl PeerChainProvider for HttpPeerClient {
    fn fetch_chain(&self, peer: &str) -> Result<PeerChain> {
        let url = chain_url(peer);
        debug!("GET {url}");

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| Self::transport_error(peer, e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(BlockchainError::PeerUnreachable {
                peer: peer.to_string(),
                reason: format!("status {status}"),
            });
        }

        response.json::<PeerChain>().map_err(|e| {
            if e.is_timeout() {
                BlockchainError::PeerTimeout(peer.to_string())
            } else {
                BlockchainError::InvalidChainCandidate(format!("malformed body from {peer}: {e}"))
            }
        })
    }
}

pub fn chain_url(peer: &str) -> String {
    format!("http://{peer}/chain")
}
