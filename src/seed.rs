//! Epoch seed hashes.
//!
//! The seed of epoch `e` is Keccak-256 applied `e` times to 32 zero bytes.
//! The chain is strictly sequential; each link needs the previous one.

use ethereum_types::H256;

use crate::{keccak_256, Params};

fn extend_chain(mut seed: [u8; 32], links: u64) -> [u8; 32] {
    for _ in 0..links {
        seed = keccak_256(&seed);
    }
    seed
}

/// Seed hash for the epoch containing `block_number` on the sevash network.
pub fn seed_hash(block_number: u64) -> H256 {
    seed_hash_for_epoch(Params::SEVASH.epoch(block_number))
}

/// Seed hash of `epoch`. With `std` the chain is memoized process-wide.
pub fn seed_hash_for_epoch(epoch: u64) -> H256 {
    #[cfg(feature = "std")]
    {
        SEEDS.get(epoch)
    }
    #[cfg(not(feature = "std"))]
    {
        H256(extend_chain([0u8; 32], epoch))
    }
}

#[cfg(feature = "std")]
static SEEDS: SeedHashes = SeedHashes::new();

/// Seeds kept by a [`SeedHashes`] memo.
#[cfg(feature = "std")]
pub const SEED_MEMO: usize = 8;

/// Memo of the most recently asked for seeds.
///
/// Holds at most [`SEED_MEMO`] `(epoch, seed)` pairs. A lookup extends the
/// chain from the closest memoized epoch at or below the target, outside the
/// lock, and then replaces the least recently inserted pair.
#[cfg(feature = "std")]
pub struct SeedHashes {
    recent: parking_lot::Mutex<alloc::collections::VecDeque<(u64, H256)>>,
}

#[cfg(feature = "std")]
impl SeedHashes {
    pub const fn new() -> Self {
        Self {
            recent: parking_lot::const_mutex(alloc::collections::VecDeque::new()),
        }
    }

    pub fn get(&self, epoch: u64) -> H256 {
        let (known, seed) = self
            .recent
            .lock()
            .iter()
            .copied()
            .filter(|&(e, _)| e <= epoch)
            .max_by_key(|&(e, _)| e)
            .unwrap_or((0, H256::zero()));
        if known == epoch {
            return seed;
        }

        tracing::debug!(from = known, to = epoch, "extending seed chain");
        let seed = H256(extend_chain(seed.0, epoch - known));

        let mut recent = self.recent.lock();
        if !recent.iter().any(|&(e, _)| e == epoch) {
            if recent.len() == SEED_MEMO {
                recent.pop_front();
            }
            recent.push_back((epoch, seed));
        }
        seed
    }

    /// Number of seeds currently memoized.
    pub fn len(&self) -> usize {
        self.recent.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(feature = "std")]
impl Default for SeedHashes {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn epoch_zero_is_zero() {
        assert_eq!(seed_hash(0), H256::zero());
        assert_eq!(seed_hash(29_999), H256::zero());
    }

    #[test]
    fn epoch_one() {
        let expected = H256(hex!(
            "290decd9548b62a8d60345a988386fc84ba6bc95484008f6362f93160ef3e563"
        ));
        assert_eq!(seed_hash(30_000), expected);
        assert_eq!(seed_hash(59_999), expected);
    }

    #[cfg(feature = "std")]
    #[test]
    fn memo_matches_direct_chain() {
        let seeds = SeedHashes::new();
        assert!(seeds.is_empty());
        // Out of order on purpose so both extension and lookup are hit.
        for epoch in [5u64, 2, 9, 0, 9, 7] {
            assert_eq!(seeds.get(epoch), H256(extend_chain([0u8; 32], epoch)));
        }
        // Epoch 0 needs no hashing and is never stored.
        assert_eq!(seeds.len(), 4);
    }

    #[cfg(feature = "std")]
    #[test]
    fn memo_stays_bounded() {
        let seeds = SeedHashes::new();
        for epoch in (1..=3 * SEED_MEMO as u64).rev() {
            assert_eq!(seeds.get(epoch), H256(extend_chain([0u8; 32], epoch)));
            assert!(seeds.len() <= SEED_MEMO);
        }
        assert_eq!(seeds.len(), SEED_MEMO);

        // Far epochs extend from the nearest memoized seed below them.
        let far = 2_000;
        assert_eq!(seeds.get(far), H256(extend_chain([0u8; 32], far)));
        assert_eq!(seeds.get(far + 3), H256(extend_chain([0u8; 32], far + 3)));
        assert_eq!(seeds.len(), SEED_MEMO);
    }

    #[test]
    fn global_memo_agrees() {
        assert_eq!(
            seed_hash_for_epoch(12),
            H256(extend_chain([0u8; 32], 12))
        );
        assert_eq!(seed_hash(12 * 30_000 + 1), seed_hash_for_epoch(12));
    }
}
