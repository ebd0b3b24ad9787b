//! Error type shared by the generation, hashing and storage entry points.
//!
//! The algorithm itself cannot fail: every variant is raised at the boundary,
//! before any hashing starts, or by a caller-requested cancellation.

use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A cache, dataset or parameter size is not usable.
    #[error("invalid {what} size {size}: {reason}")]
    InvalidSize {
        what: &'static str,
        size: u64,
        reason: &'static str,
    },

    /// The buffer for a cache or dataset could not be reserved.
    #[error("failed to allocate {bytes} bytes")]
    Allocation { bytes: usize },

    /// The progress callback asked dataset generation to stop.
    #[error("dataset generation cancelled at {percent}%")]
    Cancelled { percent: u32 },

    #[cfg(feature = "parallel")]
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// A DAG file did not start with `DAG_MAGIC_NUM`.
    #[error("bad DAG magic number {found:#018x}")]
    BadMagic { found: u64 },

    #[cfg(feature = "std")]
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn size(what: &'static str, size: u64, reason: &'static str) -> Self {
        Self::InvalidSize { what, size, reason }
    }

    /// Whether this error is a requested stop rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}
