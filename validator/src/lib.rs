//! Light verification: checking a claimed nonce without holding any DAG.
//!
//! The verifier replays the hashimoto lookup chain, but every entry it
//! touches is regenerated on demand by the quick calculator. Entries
//! discovered on behalf of one lookup stay memoized for the rest of the
//! call, one known-map per seed, created fresh for the call and dropped
//! with it. Because the producer and the quick calculator are
//! deterministic, the predicate computed here is the same one the full
//! DAG-set mixer computes.

use dagger_rs_dag::quick::{quick_calc, KnownMap};
use dagger_rs_types::field::{difficulty_to_boundary, meets_boundary, mod_index};
use dagger_rs_types::hash::seal_hash;
use dagger_rs_types::{DagParams, DaggerError, U512};

/// The outcome of one light mix: the mix value and how many distinct
/// entries had to be regenerated to produce it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightMix {
    pub mix: U512,
    pub accesses: usize,
}

/// Computes the mix for `(header, nonce)` from the seed set alone.
pub fn light_hashimoto(
    params: &DagParams,
    seeds: &[Vec<u8>],
    header: &[u8],
    nonce: u64,
) -> Result<LightMix, DaggerError> {
    let numdags = seeds.len();
    let mut known: Vec<KnownMap> = seeds.iter().map(|_| KnownMap::new()).collect();

    let mut mix = seal_hash(header, nonce);
    for _ in 0..params.lookups {
        let slot = mod_index(mix, numdags);
        let pos = mod_index(mix, params.dag_size);
        mix = mix ^ quick_calc(params, &seeds[slot], pos, &mut known[slot])?;
    }

    let accesses = known.iter().map(|map| map.len()).sum();
    Ok(LightMix { mix, accesses })
}

/// Returns whether the claimed nonce's mix falls under the difficulty
/// boundary. `Ok(false)` is an invalid claim, not an error.
pub fn light_verify(
    params: &DagParams,
    seeds: &[Vec<u8>],
    header: &[u8],
    nonce: u64,
) -> Result<bool, DaggerError> {
    params.validate()?;
    if seeds.len() != params.numdags {
        return Err(DaggerError::SeedSetMismatch {
            expected: params.numdags,
            got: seeds.len(),
        });
    }

    let boundary = difficulty_to_boundary(params.diff);
    let light = light_hashimoto(params, seeds, header, nonce)?;
    Ok(meets_boundary(light.mix, boundary))
}
