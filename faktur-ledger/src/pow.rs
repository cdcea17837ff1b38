//! Proof-of-work engine
//!
//! The proof hash is `sha256(entries || prev_hash || nonce)` where `entries`
//! is the PoW-input projection of a block's invoices. Miner and validator
//! both go through [`pow_input`], so the bytes hashed at mining time are the
//! bytes replayed at validation time.

use crate::types::Invoice;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Default leading-zero hex characters
pub const DEFAULT_DIFFICULTY: usize = 5;

/// Invoice fields covered by the proof of work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowEntry {
    /// Seller public key
    pub seller_key: String,
    /// Buyer public key
    pub buyer_key: String,
    /// VAT
    pub vat: Decimal,
}

/// Project invoices onto the proof-of-work input
///
/// Reward invoices are skipped; signed invoices keep seller, buyer and VAT.
pub fn pow_input(invoices: &[Invoice]) -> Vec<PowEntry> {
    invoices
        .iter()
        .filter_map(|invoice| match invoice {
            Invoice::Signed(signed) => Some(PowEntry {
                seller_key: signed.seller_key.clone(),
                buyer_key: signed.buyer_key.clone(),
                vat: signed.vat,
            }),
            Invoice::Reward { .. } => None,
        })
        .collect()
}

/// String form of the entries: each entry's compact JSON, concatenated
pub fn render_entries(entries: &[PowEntry]) -> String {
    entries
        .iter()
        .map(|entry| serde_json::to_string(entry).expect("serialization cannot fail"))
        .collect()
}

/// Whether a digest starts with `difficulty` zero hex characters
fn meets_difficulty(digest: &[u8], difficulty: usize) -> bool {
    if difficulty > digest.len() * 2 {
        return false;
    }

    (0..difficulty).all(|i| {
        let byte = digest[i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
        nibble == 0
    })
}

/// Check a nonce against the difficulty predicate
pub fn difficulty_ok(entries: &[PowEntry], prev_hash: &str, nonce: u64, difficulty: usize) -> bool {
    let mut hasher = Sha256::new();
    hasher.update(render_entries(entries).as_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(nonce.to_string().as_bytes());
    meets_difficulty(&hasher.finalize(), difficulty)
}

/// Find the smallest nonce satisfying the difficulty predicate
///
/// Exhaustive search from 0, so identical inputs always give the same nonce.
/// Unbounded and CPU-bound: call from a blocking thread.
pub fn mine(entries: &[PowEntry], prev_hash: &str, difficulty: usize) -> u64 {
    let mut prefix = Sha256::new();
    prefix.update(render_entries(entries).as_bytes());
    prefix.update(prev_hash.as_bytes());

    let mut nonce: u64 = 0;
    loop {
        let mut hasher = prefix.clone();
        hasher.update(nonce.to_string().as_bytes());
        if meets_difficulty(&hasher.finalize(), difficulty) {
            return nonce;
        }

        nonce += 1;
        if nonce % (1 << 22) == 0 {
            tracing::debug!(nonce, difficulty, "proof-of-work search still running");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::sha256_hex;
    use crate::testing::signed_invoice;
    use rust_decimal_macros::dec;

    #[test]
    fn test_empty_pool_difficulty_one() {
        let nonce = mine(&[], "00", 1);
        let digest = sha256_hex(format!("00{}", nonce).as_bytes());
        assert!(digest.starts_with('0'));
        assert!(difficulty_ok(&[], "00", nonce, 1));

        // Smallest such nonce
        for earlier in 0..nonce {
            assert!(!difficulty_ok(&[], "00", earlier, 1));
        }
    }

    #[test]
    fn test_mine_is_deterministic() {
        let entries = pow_input(&[signed_invoice("buyer", dec!(100))]);
        let first = mine(&entries, "abc", 2);
        let second = mine(&entries, "abc", 2);
        assert_eq!(first, second);
        assert!(difficulty_ok(&entries, "abc", first, 2));
    }

    #[test]
    fn test_difficulty_zero_accepts_nonce_zero() {
        assert_eq!(mine(&[], "00", 0), 0);
    }

    #[test]
    fn test_projection_drops_rewards_and_signatures() {
        let invoices = vec![signed_invoice("buyer", dec!(200)), Invoice::reward("node")];
        let entries = pow_input(&invoices);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].buyer_key, "buyer");
        assert_eq!(entries[0].vat, dec!(20));

        let rendered = render_entries(&entries);
        assert!(rendered.starts_with(r#"{"seller_key":"#));
        assert!(!rendered.contains("signature"));
        assert!(!rendered.contains("sale_price"));
    }

    #[test]
    fn test_meets_difficulty_nibbles() {
        assert!(meets_difficulty(&[0x00, 0x0f], 3));
        assert!(!meets_difficulty(&[0x00, 0x1f], 3));
        assert!(meets_difficulty(&[0x0f], 1));
        assert!(!meets_difficulty(&[0x00], 3));
    }

    #[test]
    fn test_difficulty_ok_matches_hex_prefix() {
        let entries = pow_input(&[signed_invoice("buyer", dec!(75))]);
        for nonce in 0..64 {
            let digest = sha256_hex(
                format!("{}{}{}", render_entries(&entries), "ff", nonce).as_bytes(),
            );
            assert_eq!(
                difficulty_ok(&entries, "ff", nonce, 1),
                digest.starts_with('0')
            );
        }
    }
}
