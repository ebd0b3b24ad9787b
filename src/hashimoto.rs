use byteorder::{ByteOrder, LittleEndian};
use ethereum_types::H256;
use sha3::{Digest, Keccak256};

use crate::{
    calc_dataset_item, fnv, fnv_mix_hash, keccak_512, Cache, Dataset,
    ACCESSES, HASH_BYTES, HASH_WORDS, MIX_BYTES, MIX_HASHES, MIX_WORDS,
};

/// Output of one hashimoto evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PowResult {
    /// Compared against the difficulty target by the caller.
    pub result: H256,
    /// Compressed mix, stored in the block so verifiers can check it.
    pub mix_hash: H256,
}

/// "Main" function of sevash, calculating the mix digest and result given
/// the header hash and nonce.
///
/// `lookup` returns dataset item `i`, either from a full dataset or
/// recomputed from the cache. `full_size` should be a multiple of
/// `MIX_BYTES`; any remainder is ignored.
///
/// # Panics
///
/// If `full_size` is smaller than `MIX_BYTES`.
pub fn hashimoto<F>(
    header_hash: H256,
    nonce: u64,
    full_size: usize,
    mut lookup: F,
) -> PowResult
where
    F: FnMut(usize) -> [u8; HASH_BYTES],
{
    let rows = (full_size / MIX_BYTES) as u32;
    assert!(rows > 0, "dataset holds no rows");

    let mut seed = [0u8; 40]; // 32 + 8
    seed[..32].copy_from_slice(header_hash.as_bytes());
    LittleEndian::write_u64(&mut seed[32..], nonce);
    let seed = keccak_512(&seed);
    let seed_head = LittleEndian::read_u32(&seed);

    let mut mix = [0u32; MIX_WORDS];
    for (i, w) in mix.iter_mut().enumerate() {
        *w = LittleEndian::read_u32(&seed[(i % HASH_WORDS) * 4..]);
    }

    let mut temp = [0u32; MIX_WORDS];
    for i in 0..ACCESSES {
        let parent = fnv(i as u32 ^ seed_head, mix[i % MIX_WORDS]) % rows;
        for (k, words) in temp.chunks_exact_mut(HASH_WORDS).enumerate() {
            let item = lookup(MIX_HASHES * parent as usize + k);
            LittleEndian::read_u32_into(&item, words);
        }
        fnv_mix_hash(&mut mix, &temp);
    }

    let mut mix_hash = [0u8; 32];
    for (out, w) in mix_hash.chunks_exact_mut(4).zip(mix.chunks_exact(4)) {
        LittleEndian::write_u32(out, fnv(fnv(fnv(w[0], w[1]), w[2]), w[3]));
    }

    let mut result = [0u8; 32];
    result.copy_from_slice(
        &Keccak256::new()
            .chain_update(seed)
            .chain_update(mix_hash)
            .finalize(),
    );

    PowResult {
        result: H256(result),
        mix_hash: H256(mix_hash),
    }
}

/// Sevash used by a light client. Only the cache is held; every dataset
/// item touched is recomputed, two per access.
pub fn hashimoto_light(cache: &Cache, header_hash: H256, nonce: u64) -> PowResult {
    let bytes = cache.as_bytes();
    hashimoto(header_hash, nonce, cache.full_size(), |i| {
        calc_dataset_item(bytes, i)
    })
}

/// Sevash used by a full client. Stores the whole dataset in memory.
pub fn hashimoto_full(dataset: &Dataset, header_hash: H256, nonce: u64) -> PowResult {
    hashimoto(header_hash, nonce, dataset.full_size(), |i| dataset.item(i))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn lookups_stay_in_range() {
        let full_size = 4 * MIX_BYTES;
        let items = full_size / HASH_BYTES;
        let mut touched = vec![];
        hashimoto(H256::repeat_byte(0xab), 42, full_size, |i| {
            touched.push(i);
            [i as u8; HASH_BYTES]
        });
        assert_eq!(touched.len(), ACCESSES * MIX_HASHES);
        assert!(touched.iter().all(|&i| i < items));
        // Items are fetched in aligned pairs.
        for pair in touched.chunks(2) {
            assert_eq!(pair[0] % 2, 0);
            assert_eq!(pair[1], pair[0] + 1);
        }
    }

    #[test]
    fn nonce_and_header_matter() {
        let lookup = |i: usize| [i as u8; HASH_BYTES];
        let a = hashimoto(H256::zero(), 0, 1024, lookup);
        let b = hashimoto(H256::zero(), 1, 1024, lookup);
        let c = hashimoto(H256::repeat_byte(1), 0, 1024, lookup);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, hashimoto(H256::zero(), 0, 1024, lookup));
    }

    #[test]
    #[should_panic(expected = "dataset holds no rows")]
    fn empty_dataset_panics() {
        hashimoto(H256::zero(), 0, MIX_BYTES - 1, |_| [0u8; HASH_BYTES]);
    }
}
