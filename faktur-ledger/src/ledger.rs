//! Main ledger orchestration layer
//!
//! This module ties together the actor, the proof-of-work engine and the
//! reconciler into a high-level API for invoice processing.
//!
//! # Example
//!
//! ```no_run
//! use faktur_ledger::{Config, Ledger};
//!
//! #[tokio::main]
//! async fn main() -> faktur_ledger::Result<()> {
//!     let ledger = Ledger::open(Config::default()).await?;
//!
//!     // let index = ledger.submit(invoice).await?;
//!     let block = ledger.mine().await?;
//!     println!("mined block {}", block.index);
//!
//!     ledger.shutdown().await
//! }
//! ```

use crate::{
    actor::{spawn_ledger_actor, LedgerHandle, MinedBlock},
    client::{HttpPeerClient, PeerClient},
    consensus::{ReconcileOutcome, Reconciler},
    crypto::verify_invoice,
    metrics::Metrics,
    pow,
    types::{vat, Block, Invoice, InvoiceSubmission},
    Config, Error, Result,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Main ledger interface
pub struct Ledger {
    /// Actor handle for all state access
    handle: LedgerHandle,

    /// Peer chain reconciliation
    reconciler: Reconciler,

    /// Pseudonymous miner identity carried by reward invoices
    node_id: String,

    /// Configuration
    config: Config,

    /// Prometheus metrics
    metrics: Metrics,
}

impl Ledger {
    /// Open ledger talking to peers over HTTP
    pub async fn open(config: Config) -> Result<Self> {
        let timeout = Duration::from_millis(config.consensus.peer_timeout_ms);
        let client = HttpPeerClient::new(timeout)?;
        Self::with_client(config, Arc::new(client)).await
    }

    /// Open ledger with a custom peer client
    pub async fn with_client(config: Config, client: Arc<dyn PeerClient>) -> Result<Self> {
        config.validate()?;

        let handle = spawn_ledger_actor(config.actor.mailbox_capacity);
        let reconciler = Reconciler::new(
            client,
            config.mining.difficulty,
            Duration::from_millis(config.consensus.peer_timeout_ms),
        );
        let metrics = Metrics::new()
            .map_err(|e| Error::Config(format!("Failed to register metrics: {}", e)))?;

        if !config.consensus.peers.is_empty() {
            handle.register_peers(config.consensus.peers.join(",")).await?;
        }

        let node_id = Uuid::new_v4().simple().to_string();
        tracing::info!(
            "Ledger {} opened (difficulty {})",
            node_id,
            config.mining.difficulty
        );

        Ok(Self {
            handle,
            reconciler,
            node_id,
            config,
            metrics,
        })
    }

    /// Miner identity of this node
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Configuration in effect
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Register one or more comma-separated peer addresses
    ///
    /// All addresses are parsed before any is added.
    pub async fn register_peers(&self, input: &str) -> Result<Vec<String>> {
        let added = self.handle.register_peers(input).await?;
        tracing::info!("Registered peers: {}", added.join(", "));
        Ok(added)
    }

    /// Registered peers
    pub async fn peers(&self) -> Result<Vec<String>> {
        self.handle.list_peers().await
    }

    /// Admit an invoice to the pending pool
    ///
    /// Returns the index of the block the invoice is expected to land in.
    pub async fn submit(&self, invoice: Invoice) -> Result<u64> {
        if let Err(e) = Self::check_admissible(&invoice) {
            self.metrics.record_rejected();
            tracing::warn!("Rejected invoice: {}", e);
            return Err(e);
        }

        let index = self.handle.admit_invoice(invoice).await?;
        self.metrics.record_admitted();
        tracing::info!("Invoice admitted for block {}", index);
        Ok(index)
    }

    /// Admit a request-layer submission, deriving VAT when absent
    pub async fn submit_signed(&self, submission: InvoiceSubmission) -> Result<u64> {
        match submission.into_invoice() {
            Ok(invoice) => self.submit(invoice).await,
            Err(e) => {
                self.metrics.record_rejected();
                tracing::warn!("Rejected invoice: {}", e);
                Err(e)
            }
        }
    }

    /// Pending invoices in admission order
    pub async fn pending(&self) -> Result<Vec<Invoice>> {
        self.handle.pending().await
    }

    /// Full chain, genesis first
    pub async fn chain(&self) -> Result<Vec<Block>> {
        self.handle.chain().await
    }

    /// Mine the pending pool into a new block
    ///
    /// The search runs on a blocking thread; the ledger keeps serving reads
    /// and admissions meanwhile. Fails with [`Error::StaleTip`] when the
    /// chain changed before the block could be committed.
    pub async fn mine(&self) -> Result<Block> {
        let snapshot = self.handle.snapshot().await?;
        let invoice_count = snapshot.invoices.len();
        let entries = pow::pow_input(&snapshot.invoices);
        let difficulty = self.config.mining.difficulty;
        let prev_hash = snapshot.prev_hash.clone();

        let started = Instant::now();
        let nonce = tokio::task::spawn_blocking(move || pow::mine(&entries, &prev_hash, difficulty))
            .await
            .map_err(|e| Error::Concurrency(format!("Mining task failed: {}", e)))?;
        let elapsed = started.elapsed();

        let block = self
            .handle
            .commit_mined(MinedBlock {
                prev_hash: snapshot.prev_hash,
                invoice_count,
                nonce,
                reward: Invoice::reward(self.node_id.clone()),
            })
            .await?;

        self.metrics
            .record_block_mined(block.index as usize, elapsed.as_secs_f64());
        tracing::info!(
            "Mined block {} with {} invoices (nonce {}, {:?})",
            block.index,
            invoice_count,
            nonce,
            elapsed
        );

        Ok(block)
    }

    /// Replace the local chain with the longest valid peer chain, if any
    pub async fn reconcile(&self) -> Result<ReconcileOutcome> {
        let registry = self.handle.registry().await?;
        let local = self.handle.chain().await?;

        let outcome = self.reconciler.reconcile(&registry, local).await;
        if !outcome.adopted {
            tracing::info!("Local chain is authoritative ({} blocks)", outcome.chain.len());
            return Ok(outcome);
        }

        let length = outcome.chain.len();
        if self.handle.replace_chain(outcome.chain.clone()).await? {
            self.metrics.record_chain_replaced(length);
            tracing::info!("Chain replaced by peer chain ({} blocks)", length);
            return Ok(outcome);
        }

        tracing::info!("Local chain grew during reconciliation; keeping it");
        Ok(ReconcileOutcome {
            adopted: false,
            chain: self.handle.chain().await?,
        })
    }

    /// Graceful shutdown
    pub async fn shutdown(self) -> Result<()> {
        self.handle.shutdown().await
    }

    fn check_admissible(invoice: &Invoice) -> Result<()> {
        let signed = match invoice {
            Invoice::Reward { .. } => return Ok(()),
            Invoice::Signed(signed) => signed,
        };

        let expected = vat(signed.sale_price);
        if signed.vat != expected {
            return Err(Error::VatMismatch {
                expected,
                actual: signed.vat,
            });
        }

        if !verify_invoice(&signed.signable(), &signed.signature, &signed.seller_key) {
            return Err(Error::SignatureRejected(
                "signature does not verify under the seller key".to_string(),
            ));
        }

        Ok(())
    }
}
