//! Longest-valid-chain reconciliation
//!
//! Every registered peer is asked for its chain. A peer's chain becomes the
//! candidate when it is strictly longer than the best length seen so far and
//! passes full validation. Equal lengths never replace the current chain;
//! there is no cumulative-work weighting and no quorum.

use crate::client::PeerClient;
use crate::peers::NodeRegistry;
use crate::types::{Block, ChainResponse};
use crate::validation::validate_chain;
use crate::{Error, Result};
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;

/// Result of a reconciliation round
#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    /// Whether the local chain was replaced
    pub adopted: bool,

    /// Chain in effect after the round
    pub chain: Vec<Block>,
}

/// Polls peers and picks the longest valid chain
#[derive(Clone)]
pub struct Reconciler {
    client: Arc<dyn PeerClient>,
    difficulty: usize,
    peer_timeout: Duration,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("difficulty", &self.difficulty)
            .field("peer_timeout", &self.peer_timeout)
            .finish()
    }
}

impl Reconciler {
    /// Create reconciler
    pub fn new(client: Arc<dyn PeerClient>, difficulty: usize, peer_timeout: Duration) -> Self {
        Self {
            client,
            difficulty,
            peer_timeout,
        }
    }

    /// Fetch every peer's chain concurrently
    ///
    /// Results come back in the order of `peers`. A slow peer is cut off at
    /// the peer timeout and reported as unreachable.
    pub async fn fetch_all(&self, peers: &[String]) -> Vec<(String, Result<ChainResponse>)> {
        let fetches = peers.iter().map(|peer| async move {
            let fetch = self.client.fetch_chain(peer);
            let result = match tokio::time::timeout(self.peer_timeout, fetch).await {
                Ok(result) => result,
                Err(_) => Err(Error::PeerUnreachable {
                    peer: peer.clone(),
                    reason: format!("timed out after {:?}", self.peer_timeout),
                }),
            };
            (peer.clone(), result)
        });

        join_all(fetches).await
    }

    /// Longest valid peer chain strictly longer than `local_len`, if any
    pub async fn longest_valid_chain(
        &self,
        peers: &[String],
        local_len: usize,
    ) -> Option<Vec<Block>> {
        let responses = self.fetch_all(peers).await;
        self.select_candidate(local_len, responses)
    }

    /// Apply the longest-chain rule to fetched responses
    pub fn select_candidate(
        &self,
        local_len: usize,
        responses: Vec<(String, Result<ChainResponse>)>,
    ) -> Option<Vec<Block>> {
        let mut max_length = local_len as u64;
        let mut candidate = None;

        for (peer, response) in responses {
            let response = match response {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!("Skipping peer {}: {}", peer, e);
                    continue;
                }
            };

            if response.length <= max_length {
                tracing::debug!(
                    "Peer {} chain length {} does not exceed {}",
                    peer,
                    response.length,
                    max_length
                );
                continue;
            }

            if response.length != response.chain.len() as u64 {
                tracing::warn!(
                    "Peer {} reported length {} but sent {} blocks",
                    peer,
                    response.length,
                    response.chain.len()
                );
                continue;
            }

            if let Err(e) = validate_chain(&response.chain, self.difficulty) {
                tracing::warn!("Peer {} chain rejected: {}", peer, e);
                continue;
            }

            tracing::info!(
                "Peer {} offers longer valid chain ({} blocks)",
                peer,
                response.length
            );
            max_length = response.length;
            candidate = Some(response.chain);
        }

        candidate
    }

    /// Reconcile a local chain against all registered peers
    pub async fn reconcile(
        &self,
        registry: &NodeRegistry,
        local_chain: Vec<Block>,
    ) -> ReconcileOutcome {
        match self.longest_valid_chain(&registry.list(), local_chain.len()).await {
            Some(chain) => ReconcileOutcome {
                adopted: true,
                chain,
            },
            None => ReconcileOutcome {
                adopted: false,
                chain: local_chain,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pow::{mine, pow_input};
    use crate::types::Invoice;
    use async_trait::async_trait;
    use std::collections::HashMap;

    const DIFFICULTY: usize = 1;

    struct StaticPeers {
        chains: HashMap<String, ChainResponse>,
    }

    #[async_trait]
    impl PeerClient for StaticPeers {
        async fn fetch_chain(&self, peer: &str) -> Result<ChainResponse> {
            self.chains.get(peer).cloned().ok_or_else(|| Error::PeerUnreachable {
                peer: peer.to_string(),
                reason: "connection refused".to_string(),
            })
        }
    }

    struct SlowPeer;

    #[async_trait]
    impl PeerClient for SlowPeer {
        async fn fetch_chain(&self, _peer: &str) -> Result<ChainResponse> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(ChainResponse::new(vec![Block::genesis()]))
        }
    }

    fn extend(chain: &mut Vec<Block>, blocks: usize, stamp: i64) {
        for _ in 0..blocks {
            let previous = chain.last().unwrap();
            let index = previous.index + 1;
            let prev_hash = previous.hash();
            let nonce = mine(&pow_input(&[]), &prev_hash, DIFFICULTY);
            chain.push(Block {
                index,
                timestamp_nanos: stamp,
                invoices: vec![Invoice::reward("peer")],
                nonce,
                prev_hash,
            });
        }
    }

    fn chain_of(len: usize) -> Vec<Block> {
        let mut chain = vec![Block::genesis()];
        extend(&mut chain, len - 1, 7);
        chain
    }

    fn reconciler(chains: Vec<(&str, ChainResponse)>) -> Reconciler {
        let peers = StaticPeers {
            chains: chains.into_iter().map(|(p, c)| (p.to_string(), c)).collect(),
        };
        Reconciler::new(Arc::new(peers), DIFFICULTY, Duration::from_secs(1))
    }

    fn registry(peers: &[&str]) -> NodeRegistry {
        let mut registry = NodeRegistry::new();
        for peer in peers {
            registry.register(peer).unwrap();
        }
        registry
    }

    #[tokio::test]
    async fn test_adopts_longest_valid_chain() {
        let longer = chain_of(3);
        let longest = chain_of(4);
        let reconciler = reconciler(vec![
            ("a:1", ChainResponse::new(longer)),
            ("b:1", ChainResponse::new(longest.clone())),
        ]);

        let outcome = reconciler.reconcile(&registry(&["a:1", "b:1"]), chain_of(2)).await;
        assert!(outcome.adopted);
        assert_eq!(outcome.chain, longest);
    }

    #[tokio::test]
    async fn test_equal_length_keeps_local() {
        let local = chain_of(3);
        let mut peer_chain = vec![Block::genesis()];
        extend(&mut peer_chain, 2, 99);
        assert_ne!(peer_chain, local);

        let reconciler = reconciler(vec![("a:1", ChainResponse::new(peer_chain))]);
        let outcome = reconciler.reconcile(&registry(&["a:1"]), local.clone()).await;
        assert!(!outcome.adopted);
        assert_eq!(outcome.chain, local);
    }

    #[tokio::test]
    async fn test_rejects_invalid_longer_chain() {
        let mut tampered = chain_of(4);
        tampered[2].timestamp_nanos += 1;

        let reconciler = reconciler(vec![("a:1", ChainResponse::new(tampered))]);
        let local = chain_of(2);
        let outcome = reconciler.reconcile(&registry(&["a:1"]), local.clone()).await;
        assert!(!outcome.adopted);
        assert_eq!(outcome.chain, local);
    }

    #[tokio::test]
    async fn test_rejects_misreported_length() {
        let mut response = ChainResponse::new(chain_of(2));
        response.length = 10;

        let reconciler = reconciler(vec![("a:1", response)]);
        let outcome = reconciler.reconcile(&registry(&["a:1"]), chain_of(1)).await;
        assert!(!outcome.adopted);
    }

    #[tokio::test]
    async fn test_rejects_chain_with_foreign_genesis() {
        let mut forged = Block::genesis();
        forged.index = 77;
        forged.prev_hash = "not-genesis".to_string();
        forged.invoices.push(Invoice::reward("free money"));
        let mut chain = vec![forged];
        extend(&mut chain, 2, 7);

        let reconciler = reconciler(vec![("a:1", ChainResponse::new(chain))]);
        let local = chain_of(1);
        let outcome = reconciler.reconcile(&registry(&["a:1"]), local.clone()).await;
        assert!(!outcome.adopted);
        assert_eq!(outcome.chain, local);
    }

    #[tokio::test]
    async fn test_unreachable_peers_are_skipped() {
        let longer = chain_of(3);
        let reconciler = reconciler(vec![("b:1", ChainResponse::new(longer.clone()))]);

        let outcome = reconciler
            .reconcile(&registry(&["a:1", "b:1", "c:1"]), chain_of(1))
            .await;
        assert!(outcome.adopted);
        assert_eq!(outcome.chain, longer);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_peer_times_out() {
        let reconciler = Reconciler::new(Arc::new(SlowPeer), DIFFICULTY, Duration::from_secs(2));
        let responses = reconciler.fetch_all(&["slow:1".to_string()]).await;

        assert_eq!(responses.len(), 1);
        assert!(matches!(responses[0].1, Err(Error::PeerUnreachable { .. })));
    }
}
