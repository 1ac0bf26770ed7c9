//! Contains the common set of types used across all of the `dagger_rs`
//! modules: the wide unsigned integers that DAG entries are computed in, the
//! mining parameters, and the structural error type.
//!
//! This module implements a single location where these types are managed,
//! making them easy to reference and maintain.

#![allow(clippy::assign_op_pattern)]
#![allow(clippy::non_canonical_clone_impl)]
use fixed_hash::construct_fixed_hash;
use serde_derive::{Deserialize, Serialize};
use uint::{construct_uint, uint_full_mul_reg};

pub mod error;
pub mod field;
pub mod hash;

pub use error::DaggerError;

//==============================================================================
// U512 / U1024 Types
//------------------------------------------------------------------------------
construct_uint! {
    /// 512-bit unsigned integer, the width of one DAG entry.
    pub struct U512(8);
}

construct_uint! {
    /// 1024-bit unsigned integer, wide enough for a full 512x512 product.
    pub struct U1024(16);
}

impl U512 {
    /// Multiplies two 512-bit integers to produce a full 1024-bit integer.
    /// Overflow is not possible.
    #[inline(always)]
    pub fn full_mul(self, other: U512) -> U1024 {
        U1024(uint_full_mul_reg!(U512, 8, self, other))
    }

    /// Widens to 1024 bits.
    pub fn widen(self) -> U1024 {
        let mut words = [0u64; 16];
        words[..8].copy_from_slice(&self.0);
        U1024(words)
    }
}

impl U1024 {
    /// Truncates to the low 512 bits.
    ///
    /// # Panics
    ///
    /// Panics if any of the high 512 bits are set.
    pub fn to_u512(self) -> U512 {
        assert!(self.0[8..].iter().all(|word| *word == 0), "value exceeds 512 bits");
        let mut words = [0u64; 8];
        words.copy_from_slice(&self.0[..8]);
        U512(words)
    }
}

//==============================================================================
// H256 Type
//------------------------------------------------------------------------------
construct_fixed_hash! {
    /// A 256-bit hash type (32 bytes), the output width of the sponge.
    pub struct H256(32);
}

/// Width of one DAG entry in bytes.
pub const ENTRY_BYTES: usize = 64;

//==============================================================================
// Mining parameters
//------------------------------------------------------------------------------
/// The immutable parameter set a DAG-set is built under.
///
/// The fields are coupled by the working-set identity
/// `memory == numdags * dag_size * 64`; [`DagParams::validate`] enforces it
/// along with the other structural constraints before anything expensive
/// runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DagParams {
    /// Total working-set size in bytes across all DAGs.
    pub memory: usize,

    /// Number of independent DAGs held simultaneously.
    pub numdags: usize,

    /// Number of 64-byte entries per DAG.
    pub dag_size: usize,

    /// Memory lookups per hashimoto mix.
    pub lookups: usize,

    /// Difficulty; a mix `m` is accepted iff `m <= 2^512 / diff`.
    pub diff: u64,

    /// Number of dependencies per entry drawn by the uniform producer. The
    /// windowed producer always draws two, one per window.
    pub k: usize,

    /// Dependency-range divisor: each dependency window of entry `i` spans
    /// `i / d + 1` entries.
    pub d: usize,

    /// Exponent applied to the combined dependencies of each entry.
    pub w: u64,
}

impl DagParams {
    /// Canonical parameters: 512 MiB of working set split across 128 DAGs
    /// of 65536 entries each.
    pub fn standard() -> Self {
        let memory = 512 * 1024 * 1024;
        let numdags = 128;
        DagParams {
            memory,
            numdags,
            dag_size: memory / numdags / ENTRY_BYTES,
            lookups: 512,
            diff: 1 << 14,
            k: 2,
            d: 8,
            w: 2,
        }
    }

    /// Reduced parameters for tests and demos: 1 MiB across 4 DAGs of 4096
    /// entries, 32 lookups, difficulty 16.
    pub fn reduced() -> Self {
        let memory = 1024 * 1024;
        let numdags = 4;
        DagParams {
            memory,
            numdags,
            dag_size: memory / numdags / ENTRY_BYTES,
            lookups: 32,
            diff: 16,
            k: 2,
            d: 8,
            w: 2,
        }
    }

    /// Checks the structural constraints: every field nonzero, `d >= 2`,
    /// and the working-set identity `memory == numdags * dag_size * 64`.
    pub fn validate(&self) -> Result<(), DaggerError> {
        if self.memory == 0
            || self.numdags == 0
            || self.dag_size == 0
            || self.lookups == 0
            || self.diff == 0
            || self.k == 0
            || self.d == 0
            || self.w == 0
        {
            return Err(DaggerError::ConfigInvalid(
                "every parameter must be nonzero".into(),
            ));
        }

        if self.d < 2 {
            return Err(DaggerError::ConfigInvalid(
                "dependency divisor d must be at least 2".into(),
            ));
        }

        let implied = self
            .numdags
            .checked_mul(self.dag_size)
            .and_then(|entries| entries.checked_mul(ENTRY_BYTES));
        if implied != Some(self.memory) {
            return Err(DaggerError::ConfigInvalid(
                "memory must equal numdags * dag_size * 64".into(),
            ));
        }

        Ok(())
    }
}

impl Default for DagParams {
    fn default() -> Self {
        Self::standard()
    }
}
