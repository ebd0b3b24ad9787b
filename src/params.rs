use crate::{
    is_prime, Error, Result, CACHE_BYTES_GROWTH, CACHE_BYTES_INIT,
    DATASET_BYTES_GROWTH, DATASET_BYTES_INIT, EPOCH_LENGTH, HASH_BYTES,
    MIX_BYTES,
};

const HASH: u64 = HASH_BYTES as u64;
const MIX: u64 = MIX_BYTES as u64;

/// Network constants that decide epoch boundaries and buffer sizes.
///
/// Everything else (hash functions, parent counts, rounds) is fixed by the
/// algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Params {
    pub epoch_length: u64,
    pub cache_bytes_init: u64,
    pub cache_bytes_growth: u64,
    pub dataset_bytes_init: u64,
    pub dataset_bytes_growth: u64,
}

impl Params {
    pub const SEVASH: Params = Params {
        epoch_length: EPOCH_LENGTH,
        cache_bytes_init: CACHE_BYTES_INIT,
        cache_bytes_growth: CACHE_BYTES_GROWTH,
        dataset_bytes_init: DATASET_BYTES_INIT,
        dataset_bytes_growth: DATASET_BYTES_GROWTH,
    };

    /// Upstream Ethash: same algorithm, 16 MiB initial cache.
    pub const ETHASH: Params = Params {
        cache_bytes_init: 1 << 24,
        ..Params::SEVASH
    };

    /// Rejects constants the size search cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.epoch_length == 0 {
            return Err(Error::size("epoch length", 0, "must be non-zero"));
        }
        check_unit("cache init", self.cache_bytes_init, HASH)?;
        check_unit("cache growth", self.cache_bytes_growth, HASH)?;
        check_unit("dataset init", self.dataset_bytes_init, MIX)?;
        check_unit("dataset growth", self.dataset_bytes_growth, MIX)?;
        if self.cache_bytes_init < 3 * HASH {
            return Err(Error::size(
                "cache init",
                self.cache_bytes_init,
                "must hold at least three items",
            ));
        }
        if self.dataset_bytes_init < 3 * MIX {
            return Err(Error::size(
                "dataset init",
                self.dataset_bytes_init,
                "must hold at least three rows",
            ));
        }
        Ok(())
    }

    pub fn epoch(&self, block_number: u64) -> u64 {
        block_number / self.epoch_length
    }

    /// Cache size in bytes: the largest size below the epoch's nominal size
    /// whose item count is prime. Fails once the nominal size no longer fits
    /// in a `u64`.
    pub fn cache_size(&self, epoch: u64) -> Result<u64> {
        let nominal = nominal_size(
            self.cache_bytes_init,
            self.cache_bytes_growth,
            epoch,
        )
        .ok_or_else(|| overflow("cache epoch", epoch))?;
        Ok(largest_prime_size(nominal, HASH))
    }

    /// Dataset size in bytes: the largest size below the epoch's nominal size
    /// whose 128-byte row count is prime. Fails like [`Params::cache_size`].
    pub fn dataset_size(&self, epoch: u64) -> Result<u64> {
        let nominal = nominal_size(
            self.dataset_bytes_init,
            self.dataset_bytes_growth,
            epoch,
        )
        .ok_or_else(|| overflow("dataset epoch", epoch))?;
        Ok(largest_prime_size(nominal, MIX))
    }
}

impl Default for Params {
    fn default() -> Self {
        Self::SEVASH
    }
}

fn nominal_size(init: u64, growth: u64, epoch: u64) -> Option<u64> {
    growth.checked_mul(epoch)?.checked_add(init)
}

fn overflow(what: &'static str, epoch: u64) -> Error {
    Error::size(what, epoch, "nominal size overflows u64")
}

fn check_unit(what: &'static str, size: u64, unit: u64) -> Result<()> {
    if size % unit != 0 {
        let reason = if unit == HASH {
            "not a multiple of HASH_BYTES"
        } else {
            "not a multiple of MIX_BYTES"
        };
        return Err(Error::size(what, size, reason));
    }
    Ok(())
}

fn largest_prime_size(nominal: u64, unit: u64) -> u64 {
    let mut sz = nominal.saturating_sub(unit);
    while sz > unit && !is_prime(sz / unit) {
        sz -= 2 * unit;
    }
    sz
}

/// Cache size in bytes for `epoch` on the sevash network.
pub fn cache_size_for_epoch(epoch: u64) -> Result<u64> {
    Params::SEVASH.cache_size(epoch)
}

/// Dataset size in bytes for `epoch` on the sevash network.
pub fn dataset_size_for_epoch(epoch: u64) -> Result<u64> {
    Params::SEVASH.dataset_size(epoch)
}
