//! Peer chain fetching
//!
//! The reconciler only needs one remote call: "give me your chain". It is a
//! trait so the HTTP transport can be swapped for an in-memory one in tests.

use crate::types::ChainResponse;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Source of peer chains
#[async_trait]
pub trait PeerClient: Send + Sync {
    /// Fetch a peer's full chain and its reported length
    async fn fetch_chain(&self, peer: &str) -> Result<ChainResponse>;
}

/// HTTP client calling `GET http://<peer>/chain`
#[derive(Debug, Clone)]
pub struct HttpPeerClient {
    client: Client,
}

impl HttpPeerClient {
    /// Create client with a per-request timeout
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PeerClient for HttpPeerClient {
    async fn fetch_chain(&self, peer: &str) -> Result<ChainResponse> {
        let url = format!("http://{}/chain", peer);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::PeerUnreachable {
                peer: peer.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(Error::PeerUnreachable {
                peer: peer.to_string(),
                reason: format!("status {}", response.status()),
            });
        }

        response
            .json::<ChainResponse>()
            .await
            .map_err(|e| Error::PeerUnreachable {
                peer: peer.to_string(),
                reason: format!("Failed to parse response: {}", e),
            })
    }
}
