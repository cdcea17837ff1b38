//! Chain validation
//!
//! Checks the genesis head and block numbering, then replays hash linkage
//! and proof of work over a whole candidate chain.
//! The first failure aborts; there is no partial validity.

use crate::pow::{difficulty_ok, pow_input};
use crate::types::Block;
use crate::{Error, Result};

/// Validate a chain, reporting the first failure
///
/// The chain must start with the shared genesis block. Every later block must
/// end with a reward invoice, which is left out of the proof-of-work replay.
pub fn validate_chain(chain: &[Block], difficulty: usize) -> Result<()> {
    match chain.first() {
        None => return Err(Error::ChainInvalid("chain has no genesis block".to_string())),
        Some(head) if *head != Block::genesis() => {
            return Err(Error::ChainInvalid(
                "chain does not start with the genesis block".to_string(),
            ))
        }
        Some(_) => {}
    }

    for window in chain.windows(2) {
        let (previous, block) = (&window[0], &window[1]);

        if block.index != previous.index + 1 {
            return Err(Error::ChainInvalid(format!(
                "block {} follows block {}",
                block.index, previous.index
            )));
        }

        if block.prev_hash != previous.hash() {
            return Err(Error::ChainInvalid(format!(
                "block {} does not link to block {}",
                block.index, previous.index
            )));
        }

        // The reward invoice is appended after the search ran.
        let mined = match block.invoices.split_last() {
            Some((last, rest)) if last.is_reward() => rest,
            _ => {
                return Err(Error::ChainInvalid(format!(
                    "block {} does not end with a reward invoice",
                    block.index
                )))
            }
        };

        if !difficulty_ok(&pow_input(mined), &block.prev_hash, block.nonce, difficulty) {
            return Err(Error::ChainInvalid(format!(
                "block {} fails proof of work (nonce {})",
                block.index, block.nonce
            )));
        }
    }

    Ok(())
}

/// Whether a chain passes validation
pub fn valid_chain(chain: &[Block], difficulty: usize) -> bool {
    match validate_chain(chain, difficulty) {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!("Rejected chain: {}", e);
            false
        }
    }
}
