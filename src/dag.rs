use ethereum_types::H256;

use crate::cache::to_usize;
use crate::{
    build_dataset_with, hashimoto_full, hashimoto_light, seed_hash_for_epoch,
    Cache, DagOptions, Dataset, Params, PowResult, Result,
};

/// Verifier state for one epoch: the cache only.
#[derive(Debug, Clone)]
pub struct LightDAG {
    pub epoch: u64,
    pub params: Params,
    pub cache: Cache,
}

impl LightDAG {
    /// Light handler for the epoch of `number` on the sevash network.
    pub fn new(number: u64) -> Result<Self> {
        Self::with_params(number, Params::SEVASH)
    }

    pub fn with_params(number: u64, params: Params) -> Result<Self> {
        params.validate()?;
        let epoch = params.epoch(number);
        let cache = Cache::new(&params, epoch)?;
        Ok(Self {
            epoch,
            params,
            cache,
        })
    }

    pub fn hashimoto(&self, hash: H256, nonce: u64) -> PowResult {
        hashimoto_light(&self.cache, hash, nonce)
    }

    pub fn is_valid_for(&self, number: u64) -> bool {
        self.params.epoch(number) == self.epoch
    }

    pub fn seed_hash(&self) -> H256 {
        seed_hash_for_epoch(self.epoch)
    }
}

/// Miner state for one epoch: the complete dataset.
#[derive(Debug, Clone)]
pub struct FullDAG {
    pub epoch: u64,
    pub params: Params,
    pub dataset: Dataset,
}

impl FullDAG {
    /// Generates the dataset for `light`'s epoch. See [`crate::build_dataset`]
    /// for the meaning of `progress`.
    pub fn new(
        light: &LightDAG,
        progress: Option<&mut dyn FnMut(u32) -> bool>,
    ) -> Result<Self> {
        Self::with_options(light, &DagOptions::default(), progress)
    }

    pub fn with_options(
        light: &LightDAG,
        options: &DagOptions,
        progress: Option<&mut dyn FnMut(u32) -> bool>,
    ) -> Result<Self> {
        let full_size = light.cache.full_size() as u64;
        let dataset = build_dataset_with(&light.cache, full_size, options, progress)?;
        Ok(Self {
            epoch: light.epoch,
            params: light.params,
            dataset,
        })
    }

    /// Wraps a dataset generated earlier, checking it has the epoch's size.
    pub fn from_dataset(epoch: u64, params: Params, dataset: Dataset) -> Result<Self> {
        let expected = to_usize("dataset", params.dataset_size(epoch)?)?;
        if dataset.full_size() != expected {
            return Err(crate::Error::size(
                "dataset",
                dataset.full_size() as u64,
                "does not match the epoch",
            ));
        }
        Ok(Self {
            epoch,
            params,
            dataset,
        })
    }

    pub fn hashimoto(&self, hash: H256, nonce: u64) -> PowResult {
        hashimoto_full(&self.dataset, hash, nonce)
    }

    pub fn is_valid_for(&self, number: u64) -> bool {
        self.params.epoch(number) == self.epoch
    }

    /// The raw dataset, e.g. for handing to a GPU or writing to disk.
    pub fn dag(&self) -> &[u8] {
        self.dataset.as_bytes()
    }

    pub fn dag_size(&self) -> u64 {
        self.dataset.full_size() as u64
    }
}
