//! Error types for the ledger

use rust_decimal::Decimal;
use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Peer registration input is not a `host:port` address
    #[error("Invalid peer address: {0}")]
    InvalidPeerAddress(String),

    /// Invoice signature did not verify under the seller key
    #[error("Signature rejected: {0}")]
    SignatureRejected(String),

    /// Submitted VAT does not match 10% of the sale price
    #[error("VAT mismatch: expected {expected}, got {actual}")]
    VatMismatch {
        /// VAT derived from the sale price
        expected: Decimal,
        /// VAT supplied by the caller
        actual: Decimal,
    },

    /// Candidate chain failed linkage or proof-of-work replay
    #[error("Chain invalid: {0}")]
    ChainInvalid(String),

    /// Peer could not be reached or returned an unusable response
    #[error("Peer {peer} unreachable: {reason}")]
    PeerUnreachable {
        /// Peer address (`host:port`)
        peer: String,
        /// Transport or decoding failure
        reason: String,
    },

    /// Mined block no longer extends the chain tip
    #[error("Chain tip moved while mining; block discarded")]
    StaleTip,

    /// Key generation, key import or signing failure
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}
