use std::collections::TryReserveError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TableError {
    /// Strict lookup found no entry for the key.
    #[error("key not found")]
    KeyNotFound,
    #[error("failed to allocate a bucket array of {buckets} buckets")]
    AllocationFailure {
        buckets: usize,
        #[source]
        source: TryReserveError,
    },
    /// No prime bucket count at or above `requested` fits in `usize`.
    #[error("bucket count overflow while growing past {requested} buckets")]
    CapacityOverflow { requested: usize },
}

/// Unwraps the outcome of a fallible allocation on behalf of the infallible
/// API, panicking the way std collections do when they cannot grow.
pub(crate) fn or_panic<T>(res: Result<T, TableError>) -> T {
    match res {
        Ok(v) => v,
        Err(e) => panic!("hashtbl: {e}"),
    }
}
