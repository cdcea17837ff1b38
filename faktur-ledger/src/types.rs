//! Core types for the ledger
//!
//! All types are designed for:
//! - Deterministic JSON serialization (block hashes must agree across nodes)
//! - Exact arithmetic (Decimal for prices and VAT)
//! - Explicit variants instead of sentinel values

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// VAT (PPN) rate applied to every sale: 10%
pub fn vat_rate() -> Decimal {
    Decimal::new(10, 2)
}

/// Compute VAT for a sale price
///
/// Exact decimal multiplication; the scale of the result is kept as produced
/// so every node renders the same string.
pub fn vat(sale_price: Decimal) -> Decimal {
    sale_price * vat_rate()
}

/// Canonical signable form of an invoice
///
/// Field order is part of the signing contract: reordering these fields
/// invalidates every existing signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignableInvoice {
    /// Seller public key (hex DER)
    pub seller_key: String,

    /// Buyer public key (hex DER)
    pub buyer_key: String,

    /// Sale price (exact decimal)
    pub sale_price: Decimal,
}

impl SignableInvoice {
    /// Create new signable form
    pub fn new(
        seller_key: impl Into<String>,
        buyer_key: impl Into<String>,
        sale_price: Decimal,
    ) -> Self {
        Self {
            seller_key: seller_key.into(),
            buyer_key: buyer_key.into(),
            sale_price,
        }
    }

    /// Deterministic string that gets hashed and signed
    pub fn canonical_form(&self) -> String {
        serde_json::to_string(self).expect("serialization cannot fail")
    }

    /// VAT for this sale
    pub fn vat(&self) -> Decimal {
        vat(self.sale_price)
    }
}

/// Invoice that passed signature admission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedInvoice {
    /// Seller public key (hex DER)
    pub seller_key: String,

    /// Buyer public key (hex DER)
    pub buyer_key: String,

    /// Sale price
    pub sale_price: Decimal,

    /// VAT derived from the sale price
    pub vat: Decimal,

    /// RSA PKCS#1 v1.5 signature over the canonical form (hex)
    pub signature: String,
}

impl SignedInvoice {
    /// Fields covered by the signature
    pub fn signable(&self) -> SignableInvoice {
        SignableInvoice::new(
            self.seller_key.clone(),
            self.buyer_key.clone(),
            self.sale_price,
        )
    }
}

/// Ledger entry batched into blocks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Invoice {
    /// Tax invoice signed by the seller
    Signed(SignedInvoice),

    /// Marker injected by the mining node; never signed
    Reward {
        /// Pseudonymous id of the node that mined the block
        miner_id: String,
    },
}

impl Invoice {
    /// Reward/marker invoice for a miner
    pub fn reward(miner_id: impl Into<String>) -> Self {
        Invoice::Reward {
            miner_id: miner_id.into(),
        }
    }

    /// Whether this is the miner's marker invoice
    pub fn is_reward(&self) -> bool {
        matches!(self, Invoice::Reward { .. })
    }
}

/// Hash-linked block of invoices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// 1-based position in the chain
    pub index: u64,

    /// Creation time (nanoseconds since Unix epoch); not validated
    pub timestamp_nanos: i64,

    /// Invoices in admission order
    pub invoices: Vec<Invoice>,

    /// Proof-of-work nonce
    pub nonce: u64,

    /// SHA-256 hex of the previous block's canonical form
    pub prev_hash: String,
}

impl Block {
    /// `prev_hash` carried by the genesis block
    pub const GENESIS_PREV_HASH: &'static str = "00";

    /// Genesis block shared by every node
    pub fn genesis() -> Self {
        Self {
            index: 1,
            timestamp_nanos: 0,
            invoices: Vec::new(),
            nonce: 0,
            prev_hash: Self::GENESIS_PREV_HASH.to_string(),
        }
    }

    /// Compute block hash
    pub fn hash(&self) -> String {
        crate::crypto::hash_block(self)
    }
}

/// Invoice submission as received from the request layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceSubmission {
    /// Seller public key (hex DER)
    pub seller_key: String,

    /// Buyer public key (hex DER)
    pub buyer_key: String,

    /// Sale price
    pub sale_price: Decimal,

    /// VAT computed by the wallet; derived when absent
    #[serde(default)]
    pub vat: Option<Decimal>,

    /// Signature over the canonical form (hex)
    pub signature: String,
}

impl InvoiceSubmission {
    /// Convert into a ledger invoice, checking the VAT if one was supplied
    pub fn into_invoice(self) -> crate::Result<Invoice> {
        let expected = vat(self.sale_price);
        if let Some(actual) = self.vat {
            if actual != expected {
                return Err(crate::Error::VatMismatch { expected, actual });
            }
        }

        Ok(Invoice::Signed(SignedInvoice {
            seller_key: self.seller_key,
            buyer_key: self.buyer_key,
            sale_price: self.sale_price,
            vat: expected,
            signature: self.signature,
        }))
    }
}

/// Full chain as served to peers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainResponse {
    /// Blocks, genesis first
    pub chain: Vec<Block>,

    /// Number of blocks
    pub length: u64,
}

impl ChainResponse {
    /// Wrap a chain with its length
    pub fn new(chain: Vec<Block>) -> Self {
        let length = chain.len() as u64;
        Self { chain, length }
    }
}
