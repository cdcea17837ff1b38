//! Companion signing utility
//!
//! Generates seller key pairs and turns a sale into a signed invoice ready
//! for `POST /invoices/new`. Keys never leave the caller except through the
//! request that asked for the signature.

use crate::crypto::{self, parse_public_key, KeyPair};
use crate::types::{self, SignableInvoice};
use crate::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Hex-encoded key pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletKeys {
    /// PKCS#1 DER private key (hex)
    pub private_key: String,

    /// SubjectPublicKeyInfo DER public key (hex)
    pub public_key: String,
}

/// Sale to be signed by the seller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleRequest {
    /// Seller public key (hex DER)
    pub seller_public_key: String,

    /// Seller private key (hex DER)
    pub seller_private_key: String,

    /// Buyer public key (hex DER)
    pub buyer_public_key: String,

    /// Sale price
    pub sale_price: Decimal,
}

/// Signed invoice as returned to the seller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreparedInvoice {
    /// Canonical signable form
    pub invoice: SignableInvoice,

    /// VAT owed on the sale
    pub vat: Decimal,

    /// Signature over the canonical form (hex)
    pub signature: String,
}

/// Generate a fresh key pair
pub fn generate_keypair(bits: usize) -> Result<WalletKeys> {
    let keypair = KeyPair::generate(bits)?;
    Ok(WalletKeys {
        private_key: keypair.private_key_hex()?,
        public_key: keypair.public_key_hex()?,
    })
}

/// Canonical signable form of a sale
pub fn canonical_form(invoice: &SignableInvoice) -> String {
    invoice.canonical_form()
}

/// Sign an invoice with a hex-encoded private key
pub fn sign_invoice(invoice: &SignableInvoice, private_key_hex: &str) -> Result<String> {
    let keypair = KeyPair::from_private_key_hex(private_key_hex)?;
    crypto::sign_invoice(invoice, &keypair)
}

/// VAT owed on a sale price
pub fn vat(sale_price: Decimal) -> Decimal {
    types::vat(sale_price)
}

/// Sign a sale
///
/// The seller public key must belong to the private key, otherwise the
/// node would reject the signature anyway.
pub fn prepare_invoice(request: SaleRequest) -> Result<PreparedInvoice> {
    let keypair = KeyPair::from_private_key_hex(&request.seller_private_key)?;
    let seller_key = parse_public_key(&request.seller_public_key)?;
    if &seller_key != keypair.public_key() {
        return Err(Error::Crypto(
            "Seller public key does not match the private key".to_string(),
        ));
    }

    let invoice = SignableInvoice::new(
        request.seller_public_key,
        request.buyer_public_key,
        request.sale_price,
    );
    let signature = crypto::sign_invoice(&invoice, &keypair)?;

    Ok(PreparedInvoice {
        vat: invoice.vat(),
        invoice,
        signature,
    })
}
