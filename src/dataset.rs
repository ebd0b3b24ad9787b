use alloc::vec::Vec;
use core::fmt;

use byteorder::{ByteOrder, LittleEndian};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::cache::{check_full_size, to_usize};
use crate::{
    alloc_zeroed, fnv, fnv_mix_hash, keccak_512, Cache, Error, Result,
    DATASET_PARENTS, HASH_BYTES, HASH_WORDS,
};

/// Computes dataset item `i` from the cache alone.
///
/// The item starts from cache item `i % n`, is hashed, then folded with
/// `DATASET_PARENTS` cache items picked from its own running state, and
/// hashed again. Items are independent of each other.
///
/// # Panics
///
/// If `cache` holds no items.
pub fn calc_dataset_item(cache: &[u8], i: usize) -> [u8; HASH_BYTES] {
    debug_assert!(cache.len() % HASH_BYTES == 0);
    let rows = cache.len() / HASH_BYTES;
    assert!(rows > 0, "cache holds no items");
    let index = i as u32;

    let mut mix = [0u32; HASH_WORDS];
    let off = (i % rows) * HASH_BYTES;
    LittleEndian::read_u32_into(&cache[off..off + HASH_BYTES], &mut mix);
    mix[0] ^= index;

    let mut bytes = [0u8; HASH_BYTES];
    LittleEndian::write_u32_into(&mix, &mut bytes);
    LittleEndian::read_u32_into(&keccak_512(&bytes), &mut mix);

    let mut parent_words = [0u32; HASH_WORDS];
    for j in 0..DATASET_PARENTS {
        let parent = fnv(index ^ j as u32, mix[j % HASH_WORDS]) as usize % rows;
        let off = parent * HASH_BYTES;
        LittleEndian::read_u32_into(&cache[off..off + HASH_BYTES], &mut parent_words);
        fnv_mix_hash(&mut mix, &parent_words);
    }

    LittleEndian::write_u32_into(&mix, &mut bytes);
    keccak_512(&bytes)
}

/// Make a sevash dataset using the given cache, filling all of `dataset`.
///
/// Low-level counterpart of [`build_dataset`]: no size checks, no progress,
/// no cancellation. With the `parallel` feature it runs on the global rayon
/// pool.
pub fn make_dataset(dataset: &mut [u8], cache: &[u8]) {
    fill_items(cache, 0, dataset);
}

#[cfg(feature = "parallel")]
fn fill_items(cache: &[u8], first: usize, out: &mut [u8]) {
    out.par_chunks_mut(HASH_BYTES)
        .enumerate()
        .for_each(|(k, item)| {
            item.copy_from_slice(&calc_dataset_item(cache, first + k))
        });
}

#[cfg(not(feature = "parallel"))]
fn fill_items(cache: &[u8], first: usize, out: &mut [u8]) {
    for (k, item) in out.chunks_mut(HASH_BYTES).enumerate() {
        item.copy_from_slice(&calc_dataset_item(cache, first + k));
    }
}

/// How dataset generation is run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(default))]
pub struct DagOptions {
    /// Worker threads, `0` for one per CPU. Ignored without `parallel`.
    pub threads: usize,
    /// Number of batches the dataset is split into. The progress callback
    /// runs once per batch, which bounds how late a cancellation is seen.
    pub progress_batches: usize,
}

impl Default for DagOptions {
    fn default() -> Self {
        Self {
            threads: 0,
            progress_batches: 100,
        }
    }
}

/// The full dataset. Only handed out once every item has been computed.
#[derive(Clone, PartialEq, Eq)]
pub struct Dataset {
    bytes: Vec<u8>,
}

impl Dataset {
    /// Wraps an already generated dataset, e.g. one read back from disk.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        check_full_size(bytes.len())?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn full_size(&self) -> usize {
        self.bytes.len()
    }

    /// Number of 64-byte items.
    pub fn items(&self) -> usize {
        self.bytes.len() / HASH_BYTES
    }

    /// Item `i`.
    ///
    /// # Panics
    ///
    /// If `i >= self.items()`.
    pub fn item(&self, i: usize) -> [u8; HASH_BYTES] {
        let mut item = [0u8; HASH_BYTES];
        item.copy_from_slice(&self.bytes[i * HASH_BYTES..(i + 1) * HASH_BYTES]);
        item
    }
}

impl fmt::Debug for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dataset")
            .field("full_size", &self.bytes.len())
            .finish()
    }
}

/// Expands `cache` into a dataset of `dataset_size` bytes with default
/// [`DagOptions`].
///
/// `progress` receives a percentage after each batch; returning `true`
/// stops generation with [`Error::Cancelled`] and the partial buffer is
/// dropped.
pub fn build_dataset(
    cache: &Cache,
    dataset_size: u64,
    progress: Option<&mut dyn FnMut(u32) -> bool>,
) -> Result<Dataset> {
    build_dataset_with(cache, dataset_size, &DagOptions::default(), progress)
}

pub fn build_dataset_with(
    cache: &Cache,
    dataset_size: u64,
    options: &DagOptions,
    mut progress: Option<&mut dyn FnMut(u32) -> bool>,
) -> Result<Dataset> {
    let full_size = to_usize("dataset", dataset_size)?;
    check_full_size(full_size)?;

    let items = full_size / HASH_BYTES;
    let batches = options.progress_batches.clamp(1, items);

    let _span = tracing::info_span!("build_dataset", full_size, batches).entered();
    #[cfg(feature = "parallel")]
    let pool = {
        let threads = match options.threads {
            0 => num_cpus::get(),
            n => n,
        };
        tracing::debug!(threads, "starting dataset workers");
        rayon::ThreadPoolBuilder::new().num_threads(threads).build()?
    };

    let mut bytes = alloc_zeroed(full_size)?;
    let mut rest: &mut [u8] = &mut bytes;
    let mut first = 0;
    for batch in 1..=batches {
        let end = batch * items / batches;
        let (chunk, tail) =
            core::mem::take(&mut rest).split_at_mut((end - first) * HASH_BYTES);
        rest = tail;

        #[cfg(feature = "parallel")]
        pool.install(|| fill_items(cache.as_bytes(), first, chunk));
        #[cfg(not(feature = "parallel"))]
        fill_items(cache.as_bytes(), first, chunk);
        first = end;

        let percent = (end * 100 / items) as u32;
        tracing::trace!(done = end, percent, "dataset batch finished");
        if let Some(callback) = progress.as_deref_mut() {
            if callback(percent) {
                tracing::warn!(percent, "dataset generation cancelled");
                return Err(Error::Cancelled { percent });
            }
        }
    }

    tracing::info!(items, "dataset ready");
    Ok(Dataset { bytes })
}
