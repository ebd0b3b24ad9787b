//! Apache-2 licensed Sevash implementation.
//!
//! Sevash is an Ethash derivative: a memory-hard proof-of-work where a light
//! client verifies with a per-epoch cache while a full client (miner) expands
//! the cache into a large dataset ("DAG") and hashes against it.
//!
//! ```text
//! block number -> seed hash -> cache -> dataset
//! (header hash, nonce, cache or dataset) -> hashimoto -> (result, mix hash)
//! ```
//!
//! Sevash differs from Ethash only in the initial cache size, see
//! [`Params::SEVASH`] and [`Params::ETHASH`].

// The reference algorithm used is from https://github.com/ethereum/wiki/wiki/Ethash

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

use alloc::vec::Vec;

use sha3::{Digest, Keccak256, Keccak512};

mod cache;
mod dag;
mod dataset;
mod error;
mod hashimoto;
mod miller_rabin;
mod params;
mod seed;

#[cfg(feature = "std")]
pub mod storage;

pub use cache::{build_cache, make_cache, Cache};
pub use dag::{FullDAG, LightDAG};
pub use dataset::{
    build_dataset, build_dataset_with, calc_dataset_item, make_dataset,
    DagOptions, Dataset,
};
pub use error::{Error, Result};
pub use ethereum_types::H256;
pub use hashimoto::{hashimoto, hashimoto_full, hashimoto_light, PowResult};
pub use miller_rabin::is_prime;
pub use params::{cache_size_for_epoch, dataset_size_for_epoch, Params};
pub use seed::{seed_hash, seed_hash_for_epoch};
#[cfg(feature = "std")]
pub use seed::{SeedHashes, SEED_MEMO};

pub const REVISION: u32 = 23;
pub const DATASET_BYTES_INIT: u64 = 1 << 30;
pub const DATASET_BYTES_GROWTH: u64 = 1 << 23;
pub const CACHE_BYTES_INIT: u64 = 1 << 30;
pub const CACHE_BYTES_GROWTH: u64 = 1 << 17;
pub const EPOCH_LENGTH: u64 = 30_000;
pub const MIX_BYTES: usize = 128;
pub const HASH_BYTES: usize = 64;
pub const WORD_BYTES: usize = 4;
pub const DATASET_PARENTS: usize = 256;
pub const CACHE_ROUNDS: usize = 3;
pub const ACCESSES: usize = 64;
pub const DAG_MAGIC_NUM_SIZE: usize = 8;
pub const DAG_MAGIC_NUM: u64 = 0xFEE1_DEAD_BADD_CAFE;

/// 32-bit words in one cache or dataset item.
pub const HASH_WORDS: usize = HASH_BYTES / WORD_BYTES;
/// 32-bit words in the hashimoto mix.
pub const MIX_WORDS: usize = MIX_BYTES / WORD_BYTES;
/// Dataset items fetched per hashimoto access.
pub const MIX_HASHES: usize = MIX_BYTES / HASH_BYTES;

const FNV_PRIME: u32 = 0x0100_0193;

/// The FNV-1 inspired mixer. Not a hash function, only used to spread bits
/// when picking parents and folding items.
#[inline]
pub fn fnv(v1: u32, v2: u32) -> u32 {
    v1.wrapping_mul(FNV_PRIME) ^ v2
}

/// Word-wise `fnv` of `data` into `mix`.
#[inline]
pub fn fnv_mix_hash(mix: &mut [u32], data: &[u32]) {
    debug_assert_eq!(mix.len(), data.len());
    for (m, d) in mix.iter_mut().zip(data) {
        *m = fnv(*m, *d);
    }
}

pub fn keccak_512(data: &[u8]) -> [u8; 64] {
    let mut output = [0u8; 64];
    output.copy_from_slice(&Keccak512::digest(data));
    output
}

pub fn keccak_256(data: &[u8]) -> [u8; 32] {
    let mut output = [0u8; 32];
    output.copy_from_slice(&Keccak256::digest(data));
    output
}

/// Zeroed buffer of `bytes` bytes, reporting allocation failure instead of
/// aborting. Caches and datasets are hundreds of megabytes and up.
pub(crate) fn alloc_zeroed(bytes: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(bytes)
        .map_err(|_| Error::Allocation { bytes })?;
    buf.resize(bytes, 0);
    Ok(buf)
}
