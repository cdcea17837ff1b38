//! Cryptographic operations for the ledger
//!
//! This module provides:
//! - RSA key pair generation and hex-DER import/export
//! - SHA-1 + PKCS#1 v1.5 invoice signing and verification
//! - SHA-256 hashing and canonical JSON for blocks

use crate::types::{Block, SignableInvoice};
use crate::{Error, Result};
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePublicKey};
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use serde_json::{Map, Value};
use sha1::Sha1;
use sha2::{Digest, Sha256};

/// RSA key pair for signing invoices
#[derive(Debug, Clone)]
pub struct KeyPair {
    private_key: RsaPrivateKey,
    public_key: RsaPublicKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate(bits: usize) -> Result<Self> {
        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, bits)
            .map_err(|e| Error::Crypto(format!("Key generation failed: {}", e)))?;
        let public_key = private_key.to_public_key();

        Ok(Self {
            private_key,
            public_key,
        })
    }

    /// Import from a hex-encoded DER private key (PKCS#1, or PKCS#8 as fallback)
    pub fn from_private_key_hex(private_key_hex: &str) -> Result<Self> {
        let der = hex::decode(private_key_hex.trim())
            .map_err(|e| Error::Crypto(format!("Private key is not hex: {}", e)))?;
        let private_key = RsaPrivateKey::from_pkcs1_der(&der)
            .or_else(|_| RsaPrivateKey::from_pkcs8_der(&der))
            .map_err(|e| Error::Crypto(format!("Private key is not RSA DER: {}", e)))?;
        let public_key = private_key.to_public_key();

        Ok(Self {
            private_key,
            public_key,
        })
    }

    /// Public key as hex-encoded SubjectPublicKeyInfo DER
    pub fn public_key_hex(&self) -> Result<String> {
        let der = self
            .public_key
            .to_public_key_der()
            .map_err(|e| Error::Crypto(format!("Public key export failed: {}", e)))?;
        Ok(hex::encode(der.as_bytes()))
    }

    /// Public key
    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    /// Private key as hex-encoded PKCS#1 DER (USE WITH CAUTION)
    pub fn private_key_hex(&self) -> Result<String> {
        let der = self
            .private_key
            .to_pkcs1_der()
            .map_err(|e| Error::Crypto(format!("Private key export failed: {}", e)))?;
        Ok(hex::encode(der.as_bytes()))
    }

    /// Sign a message: SHA-1 digest, PKCS#1 v1.5 padding. Returns hex.
    pub fn sign(&self, message: &[u8]) -> Result<String> {
        let digest = Sha1::digest(message);
        let signature = self
            .private_key
            .sign(Pkcs1v15Sign::new::<Sha1>(), &digest)
            .map_err(|e| Error::Crypto(format!("Signing failed: {}", e)))?;
        Ok(hex::encode(signature))
    }

    /// Verify a hex signature against this key pair's public key
    pub fn verify(&self, message: &[u8], signature_hex: &str) -> bool {
        verify_with_key(&self.public_key, message, signature_hex)
    }
}

/// Parse a hex-encoded DER public key (SubjectPublicKeyInfo or PKCS#1)
pub fn parse_public_key(public_key_hex: &str) -> Result<RsaPublicKey> {
    let der = hex::decode(public_key_hex.trim())
        .map_err(|e| Error::Crypto(format!("Public key is not hex: {}", e)))?;
    RsaPublicKey::from_public_key_der(&der)
        .or_else(|_| RsaPublicKey::from_pkcs1_der(&der))
        .map_err(|e| Error::Crypto(format!("Public key is not RSA DER: {}", e)))
}

/// Verify a signature with a hex public key
///
/// Malformed keys or signatures verify as `false`.
pub fn verify_signature(message: &[u8], signature_hex: &str, public_key_hex: &str) -> bool {
    match parse_public_key(public_key_hex) {
        Ok(key) => verify_with_key(&key, message, signature_hex),
        Err(_) => false,
    }
}

fn verify_with_key(key: &RsaPublicKey, message: &[u8], signature_hex: &str) -> bool {
    let signature = match hex::decode(signature_hex.trim()) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    let digest = Sha1::digest(message);

    key.verify(Pkcs1v15Sign::new::<Sha1>(), &digest, &signature)
        .is_ok()
}

/// Sign an invoice's canonical form
pub fn sign_invoice(invoice: &SignableInvoice, keypair: &KeyPair) -> Result<String> {
    keypair.sign(invoice.canonical_form().as_bytes())
}

/// Verify an invoice signature under the seller's public key
pub fn verify_invoice(invoice: &SignableInvoice, signature_hex: &str, public_key_hex: &str) -> bool {
    verify_signature(
        invoice.canonical_form().as_bytes(),
        signature_hex,
        public_key_hex,
    )
}

/// Hash arbitrary bytes using SHA-256
pub fn hash_bytes(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// SHA-256 of bytes as lowercase hex
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(hash_bytes(data))
}

/// Render a JSON value with every object's keys in lexicographic order
///
/// Independent of serde_json's map ordering features.
pub fn canonical_json(value: &Value) -> String {
    sort_keys(value).to_string()
}

fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            let mut sorted = Map::new();
            for (key, inner) in entries {
                sorted.insert(key.clone(), sort_keys(inner));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

/// Hash a block using SHA-256 over its canonical JSON
pub fn hash_block(block: &Block) -> String {
    let value = serde_json::to_value(block).expect("serialization cannot fail");
    sha256_hex(canonical_json(&value).as_bytes())
}
