//! The hashimoto mixer and the nonce search that drives it.
//!
//! One mix is a chain of `lookups` dependent reads: each iteration picks a
//! DAG and an entry position from the current mix value, then folds the
//! entry back in with XOR. The next read address is unknowable until the
//! previous read completes, so the loop cannot be unrolled or speculated
//! across; parallelism belongs to the nonce space, not to the lookups of
//! one mix. Nothing in the loop blocks or yields.

use dagger_rs_dag::DagSet;
use dagger_rs_types::field::{difficulty_to_boundary, meets_boundary, mod_index};
use dagger_rs_types::hash::seal_hash;
use dagger_rs_types::U512;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;

/// Computes the mix for `(header, nonce)` against a full DAG-set.
pub fn hashimoto(dag_set: &DagSet, header: &[u8], nonce: u64) -> U512 {
    let numdags = dag_set.num_dags();
    let dag_size = dag_set.params().dag_size;

    let mut mix = seal_hash(header, nonce);
    for _ in 0..dag_set.params().lookups {
        let dag = dag_set.dag(mod_index(mix, numdags));
        let pos = mod_index(mix, dag_size);
        mix = mix ^ dag[pos];
    }
    mix
}

/// A successful nonce search: the winning nonce and its mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Found {
    pub nonce: u64,
    pub mix: U512,
}

/// Enumerates nonces from `start_nonce` until one mixes under the
/// difficulty boundary.
///
/// The cancel flag is checked once per nonce attempt, never inside the
/// lookup loop; a cancelled search returns `None`.
pub fn mine(dag_set: &DagSet, header: &[u8], start_nonce: u64, cancel: &AtomicBool) -> Option<Found> {
    let boundary = difficulty_to_boundary(dag_set.params().diff);
    let mut nonce = start_nonce;
    loop {
        if cancel.load(Ordering::Relaxed) {
            return None;
        }
        let mix = hashimoto(dag_set, header, nonce);
        if meets_boundary(mix, boundary) {
            return Some(Found { nonce, mix });
        }
        nonce = nonce.wrapping_add(1);
    }
}

/// Partitions the nonce space across `workers` scoped threads, each
/// striding by `workers` from its own offset.
///
/// The first worker to find a valid nonce claims the result slot with a
/// compare-and-set; the others observe the claim between nonce attempts and
/// stop. Workers race, so the returned nonce is *a* valid nonce, not
/// necessarily the smallest one.
pub fn mine_parallel(
    dag_set: &DagSet,
    header: &[u8],
    start_nonce: u64,
    workers: usize,
    cancel: &AtomicBool,
) -> Option<Found> {
    if workers <= 1 {
        return mine(dag_set, header, start_nonce, cancel);
    }

    let boundary = difficulty_to_boundary(dag_set.params().diff);
    let claimed = AtomicBool::new(false);
    let won_nonce = AtomicU64::new(0);

    thread::scope(|scope| {
        for offset in 0..workers {
            let claimed = &claimed;
            let won_nonce = &won_nonce;
            scope.spawn(move || {
                let mut nonce = start_nonce.wrapping_add(offset as u64);
                loop {
                    if cancel.load(Ordering::Relaxed) || claimed.load(Ordering::Acquire) {
                        return;
                    }
                    let mix = hashimoto(dag_set, header, nonce);
                    if meets_boundary(mix, boundary) {
                        if claimed
                            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Relaxed)
                            .is_ok()
                        {
                            won_nonce.store(nonce, Ordering::Release);
                        }
                        return;
                    }
                    nonce = nonce.wrapping_add(workers as u64);
                }
            });
        }
    });

    if claimed.load(Ordering::Acquire) {
        let nonce = won_nonce.load(Ordering::Acquire);
        let mix = hashimoto(dag_set, header, nonce);
        Some(Found { nonce, mix })
    } else {
        None
    }
}
