//! Faktur Ledger Core
//!
//! Hash-linked ledger of signed tax invoices, mined by proof of work and
//! reconciled across manually registered peers.
//!
//! # Architecture
//!
//! - **Signed admission**: Invoices enter the pending pool only if the
//!   seller's RSA signature verifies
//! - **Single Writer**: One actor owns the chain, pending pool and peers
//! - **Off-writer mining**: Proof-of-work runs on a blocking thread against
//!   a snapshot
//! - **Longest valid chain**: Peers' chains replace the local one only when
//!   strictly longer and fully valid
//!
//! # Invariants
//!
//! - Linkage: every block's `prev_hash` is the hash of its predecessor
//! - Proof of work: every non-genesis block satisfies the network difficulty
//! - Admission: pending signed invoices always carry a valid signature

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod actor;
pub mod api;
pub mod client;
pub mod config;
pub mod consensus;
pub mod crypto;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod peers;
pub mod pow;
pub mod types;
pub mod validation;
pub mod wallet;

#[cfg(test)]
mod testing;

// Re-exports
pub use config::Config;
pub use consensus::ReconcileOutcome;
pub use error::{Error, Result};
pub use ledger::Ledger;
pub use types::{Block, Invoice, InvoiceSubmission, SignableInvoice, SignedInvoice};
