use alloc::vec::Vec;
use core::fmt;

use byteorder::{ByteOrder, LittleEndian};
use ethereum_types::H256;

use crate::{
    alloc_zeroed, keccak_512, seed_hash_for_epoch, Error, Params, Result,
    CACHE_ROUNDS, HASH_BYTES, MIX_BYTES,
};

/// Make a sevash cache using the given seed.
///
/// Fills the whole of `cache`, which must be a non-empty multiple of
/// `HASH_BYTES`. Both passes are sequential chains and must stay that way:
/// every item depends on the one written just before it.
///
/// # Panics
///
/// If `cache` is empty.
pub fn make_cache(cache: &mut [u8], seed: H256) {
    assert!(cache.len() >= HASH_BYTES, "cache holds no items");
    let n = cache.len() / HASH_BYTES;

    cache[..HASH_BYTES].copy_from_slice(&keccak_512(seed.as_bytes()));
    for i in 1..n {
        let prev = keccak_512(&cache[(i - 1) * HASH_BYTES..i * HASH_BYTES]);
        cache[i * HASH_BYTES..(i + 1) * HASH_BYTES].copy_from_slice(&prev);
    }

    let mut temp = [0u8; HASH_BYTES];
    for _ in 0..CACHE_ROUNDS {
        for i in 0..n {
            let dst = i * HASH_BYTES;
            let src = ((i + n - 1) % n) * HASH_BYTES;
            let xor = (LittleEndian::read_u32(&cache[dst..]) as usize % n) * HASH_BYTES;
            for (j, t) in temp.iter_mut().enumerate() {
                *t = cache[src + j] ^ cache[xor + j];
            }
            cache[dst..dst + HASH_BYTES].copy_from_slice(&keccak_512(&temp));
        }
    }
}

/// A light client cache together with the size of the dataset it expands to.
#[derive(Clone, PartialEq, Eq)]
pub struct Cache {
    bytes: Vec<u8>,
    full_size: usize,
}

impl Cache {
    /// Cache of `epoch` under `params`, seeded with the epoch's seed hash.
    pub fn new(params: &Params, epoch: u64) -> Result<Self> {
        params.validate()?;
        let (cache_size, full_size) = epoch_sizes(params, epoch)?;
        Self::with_sizes(cache_size, full_size, seed_hash_for_epoch(epoch))
    }

    /// Cache of arbitrary sizes. Only the checks of [`Cache::from_bytes`]
    /// apply, so test-sized caches can be built too.
    pub fn with_sizes(cache_size: usize, full_size: usize, seed: H256) -> Result<Self> {
        check_cache_size(cache_size)?;
        check_full_size(full_size)?;
        let _span = tracing::debug_span!("make_cache", cache_size).entered();
        let mut bytes = alloc_zeroed(cache_size)?;
        make_cache(&mut bytes, seed);
        tracing::debug!(items = cache_size / HASH_BYTES, "cache ready");
        Ok(Self { bytes, full_size })
    }

    /// Wraps an already generated cache.
    pub fn from_bytes(bytes: Vec<u8>, full_size: usize) -> Result<Self> {
        check_cache_size(bytes.len())?;
        check_full_size(full_size)?;
        Ok(Self { bytes, full_size })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Number of 64-byte items.
    pub fn items(&self) -> usize {
        self.bytes.len() / HASH_BYTES
    }

    /// Size in bytes of the dataset this cache verifies against.
    pub fn full_size(&self) -> usize {
        self.full_size
    }
}

impl fmt::Debug for Cache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("size", &self.bytes.len())
            .field("full_size", &self.full_size)
            .finish()
    }
}

/// Builds the sevash cache of `epoch` from `seed`.
///
/// `seed` is normally [`seed_hash_for_epoch`]`(epoch)`; it is taken as an
/// argument so callers holding a memoized seed do not recompute it.
pub fn build_cache(epoch: u64, seed: H256) -> Result<Cache> {
    let (cache_size, full_size) = epoch_sizes(&Params::SEVASH, epoch)?;
    Cache::with_sizes(cache_size, full_size, seed)
}

fn epoch_sizes(params: &Params, epoch: u64) -> Result<(usize, usize)> {
    Ok((
        to_usize("cache", params.cache_size(epoch)?)?,
        to_usize("dataset", params.dataset_size(epoch)?)?,
    ))
}

pub(crate) fn check_cache_size(size: usize) -> Result<()> {
    if size == 0 {
        return Err(Error::size("cache", 0, "empty"));
    }
    if size % HASH_BYTES != 0 {
        return Err(Error::size("cache", size as u64, "not a multiple of HASH_BYTES"));
    }
    Ok(())
}

pub(crate) fn check_full_size(size: usize) -> Result<()> {
    if size == 0 {
        return Err(Error::size("dataset", 0, "empty"));
    }
    if size % MIX_BYTES != 0 {
        return Err(Error::size("dataset", size as u64, "not a multiple of MIX_BYTES"));
    }
    Ok(())
}

pub(crate) fn to_usize(what: &'static str, size: u64) -> Result<usize> {
    usize::try_from(size).map_err(|_| Error::size(what, size, "does not fit in memory"))
}
