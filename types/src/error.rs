//! Structural errors reported at the engine's API boundaries.

use thiserror::Error;

/// Everything that can go wrong before the arithmetic starts. There are no
/// recoverable errors inside the producer, the quick calculator, or the
/// mixing loop: every index those construct is in range by the production
/// rules.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DaggerError {
    /// A parameter is zero, `d < 2`, or the working-set identity
    /// `memory == numdags * dag_size * 64` does not hold.
    #[error("invalid parameters: {0}")]
    ConfigInvalid(String),

    /// The allocator refused the working-set reservation.
    #[error("failed to allocate {0} bytes of DAG storage")]
    AllocationFailed(usize),

    /// The seed set length does not match `numdags`.
    #[error("seed set has {got} entries, expected {expected}")]
    SeedSetMismatch { expected: usize, got: usize },

    /// A DAG slot or entry index is outside its range. Programmer error.
    #[error("index {index} out of range, limit {limit}")]
    IndexOutOfRange { index: usize, limit: usize },
}
