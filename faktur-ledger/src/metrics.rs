//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring the node.
//!
//! # Metrics
//!
//! - `faktur_invoices_admitted_total` - Invoices admitted to the pending pool
//! - `faktur_invoices_rejected_total` - Invoices rejected at admission
//! - `faktur_blocks_mined_total` - Blocks mined by this node
//! - `faktur_chain_replacements_total` - Chains adopted from peers
//! - `faktur_chain_length` - Current chain length
//! - `faktur_mining_duration_seconds` - Histogram of proof-of-work search time

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};
use std::sync::Arc;

/// Metrics collector
///
/// Each collector owns its registry, so several nodes (or tests) can live in
/// one process.
#[derive(Clone)]
pub struct Metrics {
    /// Invoices admitted
    pub invoices_admitted: IntCounter,

    /// Invoices rejected
    pub invoices_rejected: IntCounter,

    /// Blocks mined locally
    pub blocks_mined: IntCounter,

    /// Chains adopted through consensus
    pub chain_replacements: IntCounter,

    /// Current chain length
    pub chain_length: IntGauge,

    /// Proof-of-work duration histogram
    pub mining_duration: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let invoices_admitted = IntCounter::new(
            "faktur_invoices_admitted_total",
            "Invoices admitted to the pending pool",
        )?;
        registry.register(Box::new(invoices_admitted.clone()))?;

        let invoices_rejected = IntCounter::new(
            "faktur_invoices_rejected_total",
            "Invoices rejected at admission",
        )?;
        registry.register(Box::new(invoices_rejected.clone()))?;

        let blocks_mined = IntCounter::new("faktur_blocks_mined_total", "Blocks mined by this node")?;
        registry.register(Box::new(blocks_mined.clone()))?;

        let chain_replacements = IntCounter::new(
            "faktur_chain_replacements_total",
            "Chains adopted from peers",
        )?;
        registry.register(Box::new(chain_replacements.clone()))?;

        let chain_length = IntGauge::new("faktur_chain_length", "Current chain length")?;
        registry.register(Box::new(chain_length.clone()))?;

        let mining_duration = Histogram::with_opts(
            HistogramOpts::new(
                "faktur_mining_duration_seconds",
                "Histogram of proof-of-work search time",
            )
            .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        )?;
        registry.register(Box::new(mining_duration.clone()))?;

        chain_length.set(1);

        Ok(Self {
            invoices_admitted,
            invoices_rejected,
            blocks_mined,
            chain_replacements,
            chain_length,
            mining_duration,
            registry,
        })
    }

    /// Record invoice admission
    pub fn record_admitted(&self) {
        self.invoices_admitted.inc();
    }

    /// Record invoice rejection
    pub fn record_rejected(&self) {
        self.invoices_rejected.inc();
    }

    /// Record a locally mined block
    pub fn record_block_mined(&self, chain_length: usize, search_seconds: f64) {
        self.blocks_mined.inc();
        self.chain_length.set(chain_length as i64);
        self.mining_duration.observe(search_seconds);
    }

    /// Record a chain adopted from a peer
    pub fn record_chain_replaced(&self, chain_length: usize) {
        self.chain_replacements.inc();
        self.chain_length.set(chain_length as i64);
    }

    /// Render the registry in Prometheus text format
    pub fn render(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert_eq!(metrics.invoices_admitted.get(), 0);
        assert_eq!(metrics.blocks_mined.get(), 0);
        assert_eq!(metrics.chain_length.get(), 1);
    }

    #[test]
    fn test_independent_registries() {
        let first = Metrics::new().unwrap();
        let second = Metrics::new().unwrap();
        first.record_admitted();
        assert_eq!(first.invoices_admitted.get(), 1);
        assert_eq!(second.invoices_admitted.get(), 0);
    }

    #[test]
    fn test_record_block_mined() {
        let metrics = Metrics::new().unwrap();
        metrics.record_block_mined(2, 0.2);
        assert_eq!(metrics.blocks_mined.get(), 1);
        assert_eq!(metrics.chain_length.get(), 2);
        assert_eq!(metrics.mining_duration.get_sample_count(), 1);
    }

    #[test]
    fn test_render_text_format() {
        let metrics = Metrics::new().unwrap();
        metrics.record_chain_replaced(5);
        let text = metrics.render().unwrap();
        assert!(text.contains("faktur_chain_replacements_total 1"));
        assert!(text.contains("faktur_chain_length 5"));
    }
}
