//! On-demand regeneration of single DAG entries.
//!
//! Light verifiers cannot afford the full working set, so any one entry is
//! recomputed by descending its dependency graph, memoizing every entry
//! touched along the way. The descent runs on an explicit work stack: a
//! hostile position can chain enough dependencies to overflow native
//! recursion.

use crate::window_indices;
use dagger_rs_types::field::{mod_index, powmod};
use dagger_rs_types::hash::seed_hash;
use dagger_rs_types::{DagParams, DaggerError, U512};
use std::collections::HashMap;

/// Memoization cache for one verification call: entry index to entry value.
///
/// One map per seed, owned by the verification call that created it. The
/// map is never shared across calls: entries found while mixing one lookup
/// are reused by the later lookups of the same call, nothing else.
pub type KnownMap = HashMap<usize, U512>;

#[derive(Clone, Copy)]
struct Frame {
    idx: usize,
    hi: usize,
    lo: usize,
}

fn frame_for(params: &DagParams, init: U512, idx: usize) -> Frame {
    let curpicker = powmod(init, idx as u64);
    let (hi, lo) = window_indices(idx, params.d, curpicker);
    Frame { idx, hi, lo }
}

/// Recomputes entry `pos` of the DAG for `seed` without materializing the
/// DAG, reusing and extending the entries already present in `known`.
///
/// The map is preseeded with entry `0`. Every dependency index is strictly
/// below its dependent, so the descent always bottoms out there.
pub fn quick_calc(
    params: &DagParams,
    seed: &[u8],
    pos: usize,
    known: &mut KnownMap,
) -> Result<U512, DaggerError> {
    if pos >= params.dag_size {
        return Err(DaggerError::IndexOutOfRange {
            index: pos,
            limit: params.dag_size,
        });
    }

    let init = seed_hash(seed);
    known.entry(0).or_insert(init);
    if let Some(entry) = known.get(&pos) {
        return Ok(*entry);
    }

    // Postorder: a frame stays on the stack until both of its dependencies
    // are memoized, then computes and pops.
    let mut stack = vec![frame_for(params, init, pos)];
    while let Some(top) = stack.last().copied() {
        if known.contains_key(&top.idx) {
            stack.pop();
            continue;
        }
        match (known.get(&top.hi).copied(), known.get(&top.lo).copied()) {
            (Some(hi), Some(lo)) => {
                known.insert(top.idx, powmod(hi | lo, params.w));
                stack.pop();
            }
            (hi, lo) => {
                if hi.is_none() {
                    stack.push(frame_for(params, init, top.hi));
                }
                if lo.is_none() && top.lo != top.hi {
                    stack.push(frame_for(params, init, top.lo));
                }
            }
        }
    }

    Ok(known[&pos])
}

/// Uniform-rule counterpart of [`quick_calc`], matching
/// [`crate::produce_dag_uniform`]: `k` dependencies per entry, each drawn
/// uniformly from `[0, i)`.
pub fn quick_calc_uniform(
    params: &DagParams,
    seed: &[u8],
    pos: usize,
    known: &mut KnownMap,
) -> Result<U512, DaggerError> {
    if pos >= params.dag_size {
        return Err(DaggerError::IndexOutOfRange {
            index: pos,
            limit: params.dag_size,
        });
    }

    let init = seed_hash(seed);
    known.entry(0).or_insert(init);
    if let Some(entry) = known.get(&pos) {
        return Ok(*entry);
    }

    enum Step {
        Pop,
        Store(U512),
        Descend(Vec<usize>),
    }

    let deps_for = |idx: usize| -> Vec<usize> {
        let mut curpicker = powmod(init, idx as u64);
        let mut deps = Vec::with_capacity(params.k);
        for _ in 0..params.k {
            deps.push(mod_index(curpicker, idx));
            curpicker = curpicker >> 10;
        }
        deps
    };

    let mut stack = vec![(pos, deps_for(pos))];
    loop {
        let (idx, step) = match stack.last() {
            None => break,
            Some((idx, deps)) => {
                let step = if known.contains_key(idx) {
                    Step::Pop
                } else if deps.iter().all(|dep| known.contains_key(dep)) {
                    let x = deps
                        .iter()
                        .fold(U512::zero(), |acc, dep| acc | known[dep]);
                    Step::Store(powmod(x, params.w))
                } else {
                    let mut missing: Vec<usize> = deps
                        .iter()
                        .copied()
                        .filter(|dep| !known.contains_key(dep))
                        .collect();
                    missing.sort_unstable();
                    missing.dedup();
                    Step::Descend(missing)
                };
                (*idx, step)
            }
        };

        match step {
            Step::Pop => {
                stack.pop();
            }
            Step::Store(entry) => {
                known.insert(idx, entry);
                stack.pop();
            }
            Step::Descend(missing) => {
                for dep in missing {
                    stack.push((dep, deps_for(dep)));
                }
            }
        }
    }

    Ok(known[&pos])
}
