//! Shared fixtures for unit tests
//!
//! RSA key generation dominates test time, so keys are generated once per
//! test binary.

use crate::crypto::{sign_invoice, KeyPair};
use crate::types::{Invoice, SignableInvoice, SignedInvoice};
use lazy_static::lazy_static;
use rust_decimal::Decimal;

lazy_static! {
    static ref SELLER: KeyPair = KeyPair::generate(1024).unwrap();
    static ref OTHER: KeyPair = KeyPair::generate(1024).unwrap();
}

/// Seller key pair
pub fn seller_keys() -> &'static KeyPair {
    &SELLER
}

/// Unrelated key pair (forged signer / wrong verifier)
pub fn other_keys() -> &'static KeyPair {
    &OTHER
}

/// Signed invoice from the seller to `buyer`
pub fn signed_invoice(buyer: &str, sale_price: Decimal) -> Invoice {
    let keys = seller_keys();
    let signable = SignableInvoice::new(keys.public_key_hex().unwrap(), buyer, sale_price);
    let signature = sign_invoice(&signable, keys).unwrap();

    Invoice::Signed(SignedInvoice {
        vat: signable.vat(),
        seller_key: signable.seller_key,
        buyer_key: signable.buyer_key,
        sale_price,
        signature,
    })
}
