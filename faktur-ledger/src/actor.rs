//! Actor-based concurrency for the ledger
//!
//! This module implements the single-writer pattern using Tokio actors:
//! - One task owns the chain, the pending pool and the peer registry
//! - Every read and mutation is a message, so they never interleave
//! - Proof-of-work runs outside the actor between `Snapshot` and `CommitMined`
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │           HTTP handlers / Ledger façade               │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       │ mpsc::channel (bounded)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │              LedgerActor (Single Task)                │
//! │  ┌────────────────────────────────────────────────┐  │
//! │  │ chain: Vec<Block>      tip_hash: String        │  │
//! │  │ pending: Vec<Invoice>  peers: NodeRegistry     │  │
//! │  └────────────────────────────────────────────────┘  │
//! └───────────────────────────────────────────────────────┘
//!          ▲ Snapshot                    │ CommitMined
//!          │                             ▼
//!    spawn_blocking(pow::mine) ──────────┘
//! ```

use crate::peers::NodeRegistry;
use crate::types::{Block, Invoice};
use crate::{Error, Result};
use chrono::Utc;
use tokio::sync::{mpsc, oneshot};

/// Frozen inputs for one proof-of-work search
#[derive(Debug, Clone)]
pub struct MiningSnapshot {
    /// Pending invoices at snapshot time
    pub invoices: Vec<Invoice>,

    /// Hash of the chain tip at snapshot time
    pub prev_hash: String,
}

/// Result of a finished proof-of-work search
#[derive(Debug, Clone)]
pub struct MinedBlock {
    /// Tip hash the search ran against
    pub prev_hash: String,

    /// Number of pending invoices covered by the search
    pub invoice_count: usize,

    /// Nonce found
    pub nonce: u64,

    /// Reward invoice appended after the searched invoices
    pub reward: Invoice,
}

/// Message sent to the ledger actor
pub enum LedgerMessage {
    /// Register comma-separated peer addresses
    RegisterPeers {
        input: String,
        response: oneshot::Sender<Result<Vec<String>>>,
    },

    /// List registered peers
    ListPeers {
        response: oneshot::Sender<Vec<String>>,
    },

    /// Snapshot of the registry
    GetRegistry {
        response: oneshot::Sender<NodeRegistry>,
    },

    /// Append an already-admitted invoice to the pending pool
    AdmitInvoice {
        invoice: Invoice,
        response: oneshot::Sender<u64>,
    },

    /// Get pending invoices
    GetPending {
        response: oneshot::Sender<Vec<Invoice>>,
    },

    /// Get full chain
    GetChain {
        response: oneshot::Sender<Vec<Block>>,
    },

    /// Freeze mining inputs
    Snapshot {
        response: oneshot::Sender<MiningSnapshot>,
    },

    /// Append a mined block if the tip has not moved
    CommitMined {
        mined: MinedBlock,
        response: oneshot::Sender<Result<Block>>,
    },

    /// Replace the chain if the candidate is still strictly longer
    ReplaceChain {
        chain: Vec<Block>,
        response: oneshot::Sender<bool>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor that owns all mutable ledger state
pub struct LedgerActor {
    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<LedgerMessage>,

    /// Blocks, genesis first
    chain: Vec<Block>,

    /// Hash of the last block
    tip_hash: String,

    /// Admitted, not yet mined invoices
    pending: Vec<Invoice>,

    /// Peer addresses
    peers: NodeRegistry,
}

impl LedgerActor {
    /// Create new actor holding only the genesis block
    pub fn new(mailbox: mpsc::Receiver<LedgerMessage>) -> Self {
        let genesis = Block::genesis();
        let tip_hash = genesis.hash();

        Self {
            mailbox,
            chain: vec![genesis],
            tip_hash,
            pending: Vec::new(),
            peers: NodeRegistry::new(),
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            if let LedgerMessage::Shutdown = msg {
                tracing::info!(
                    "Ledger actor stopping with {} blocks and {} pending invoices",
                    self.chain.len(),
                    self.pending.len()
                );
                break;
            }

            self.handle_message(msg);
        }
    }

    /// Handle a single message
    fn handle_message(&mut self, msg: LedgerMessage) {
        match msg {
            LedgerMessage::RegisterPeers { input, response } => {
                let _ = response.send(self.peers.register_many(&input));
            }

            LedgerMessage::ListPeers { response } => {
                let _ = response.send(self.peers.list());
            }

            LedgerMessage::GetRegistry { response } => {
                let _ = response.send(self.peers.clone());
            }

            LedgerMessage::AdmitInvoice { invoice, response } => {
                self.pending.push(invoice);
                let _ = response.send(self.chain.len() as u64 + 1);
            }

            LedgerMessage::GetPending { response } => {
                let _ = response.send(self.pending.clone());
            }

            LedgerMessage::GetChain { response } => {
                let _ = response.send(self.chain.clone());
            }

            LedgerMessage::Snapshot { response } => {
                let _ = response.send(MiningSnapshot {
                    invoices: self.pending.clone(),
                    prev_hash: self.tip_hash.clone(),
                });
            }

            LedgerMessage::CommitMined { mined, response } => {
                let _ = response.send(self.commit_mined(mined));
            }

            LedgerMessage::ReplaceChain { chain, response } => {
                let _ = response.send(self.replace_chain(chain));
            }

            LedgerMessage::Shutdown => {
                // Handled in main loop
            }
        }
    }

    /// Append a mined block on top of the tip it was searched against
    fn commit_mined(&mut self, mined: MinedBlock) -> Result<Block> {
        if mined.prev_hash != self.tip_hash {
            tracing::warn!("Discarding mined block: tip moved during search");
            return Err(Error::StaleTip);
        }

        // The pool only grows while the tip is unchanged, so the snapshot is
        // still its prefix.
        if mined.invoice_count > self.pending.len() {
            return Err(Error::StaleTip);
        }

        let mut invoices: Vec<Invoice> = self.pending.drain(..mined.invoice_count).collect();
        invoices.push(mined.reward);

        let block = Block {
            index: self.chain.len() as u64 + 1,
            timestamp_nanos: Utc::now().timestamp_nanos_opt().unwrap_or(0),
            invoices,
            nonce: mined.nonce,
            prev_hash: mined.prev_hash,
        };

        self.tip_hash = block.hash();
        self.chain.push(block.clone());

        Ok(block)
    }

    /// Adopt a validated peer chain
    fn replace_chain(&mut self, chain: Vec<Block>) -> bool {
        // The node may have mined while peers were being polled.
        if chain.len() <= self.chain.len() {
            return false;
        }

        let Some(tip) = chain.last() else {
            return false;
        };
        self.tip_hash = tip.hash();
        self.chain = chain;
        true
    }
}

/// Handle for sending messages to the actor
#[derive(Clone, Debug)]
pub struct LedgerHandle {
    sender: mpsc::Sender<LedgerMessage>,
}

impl LedgerHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<LedgerMessage>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> LedgerMessage,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Register comma-separated peers
    pub async fn register_peers(&self, input: impl Into<String>) -> Result<Vec<String>> {
        let input = input.into();
        self.request(|response| LedgerMessage::RegisterPeers { input, response })
            .await?
    }

    /// List peers
    pub async fn list_peers(&self) -> Result<Vec<String>> {
        self.request(|response| LedgerMessage::ListPeers { response })
            .await
    }

    /// Snapshot of the registry
    pub async fn registry(&self) -> Result<NodeRegistry> {
        self.request(|response| LedgerMessage::GetRegistry { response })
            .await
    }

    /// Append an admitted invoice; returns the advisory block index
    pub async fn admit_invoice(&self, invoice: Invoice) -> Result<u64> {
        self.request(|response| LedgerMessage::AdmitInvoice { invoice, response })
            .await
    }

    /// Get pending invoices
    pub async fn pending(&self) -> Result<Vec<Invoice>> {
        self.request(|response| LedgerMessage::GetPending { response })
            .await
    }

    /// Get full chain
    pub async fn chain(&self) -> Result<Vec<Block>> {
        self.request(|response| LedgerMessage::GetChain { response })
            .await
    }

    /// Freeze mining inputs
    pub async fn snapshot(&self) -> Result<MiningSnapshot> {
        self.request(|response| LedgerMessage::Snapshot { response })
            .await
    }

    /// Commit a mined block
    pub async fn commit_mined(&self, mined: MinedBlock) -> Result<Block> {
        self.request(|response| LedgerMessage::CommitMined { mined, response })
            .await?
    }

    /// Replace the chain with a longer validated one
    pub async fn replace_chain(&self, chain: Vec<Block>) -> Result<bool> {
        self.request(|response| LedgerMessage::ReplaceChain { chain, response })
            .await
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(LedgerMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the ledger actor
pub fn spawn_ledger_actor(mailbox_capacity: usize) -> LedgerHandle {
    let (tx, rx) = mpsc::channel(mailbox_capacity); // Bounded channel for backpressure
    let actor = LedgerActor::new(rx);

    tokio::spawn(async move {
        actor.run().await;
    });

    LedgerHandle::new(tx)
}
