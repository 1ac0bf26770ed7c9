//! End-to-end demo of the engine: build a DAG-set, age one slot, then mine
//! and light-verify a series of headers, logging timings along the way.

use dagger_rs_dag::DagSet;
use dagger_rs_hashimoto::{mine_parallel, Found};
use dagger_rs_types::field::{difficulty_to_boundary, meets_boundary};
use dagger_rs_types::DagParams;
use dagger_rs_validator::light_hashimoto;
use eyre::Result;
use paris::Logger;
use std::sync::atomic::AtomicBool;
use std::time::Instant;

fn main() -> Result<()> {
    color_eyre::install()?;
    let mut logger = Logger::new();

    // The reduced parameter set keeps the demo under a second end to end;
    // swap in DagParams::standard() for a full 512 MiB working set.
    let params = DagParams::reduced();
    logger.info(format!("params: {}", serde_json::to_string(&params)?));

    // Odds that a miner holding all but `missing` of the working set can
    // still answer a full lookup chain.
    let missing = 0.01_f64;
    let success = (1.0 - missing).powi(params.lookups as i32);
    logger.info(format!(
        "P(success per hash with {:.0}% of memory missing): {:.1}% (x{:.1} slowdown)",
        missing * 100.0,
        success * 100.0,
        1.0 / success
    ));

    let seeds: Vec<Vec<u8>> = (0..params.numdags)
        .map(|i| i.to_string().into_bytes())
        .collect();

    logger.loading("building dag-set...");
    let start = Instant::now();
    let mut dag_set = DagSet::build(params, seeds)?;
    logger.success(format!(
        "built {} dags ({} KiB) in {:.2?}",
        dag_set.num_dags(),
        params.memory / 1024,
        start.elapsed()
    ));

    let start = Instant::now();
    let slot = dag_set.update_for_seed(b"new")?;
    logger.success(format!("updated dag slot {} in {:.2?}", slot, start.elapsed()));

    let workers = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let cancel = AtomicBool::new(false);
    let boundary = difficulty_to_boundary(params.diff);

    for i in 0..10 {
        let header = format!("test{i}");
        logger.loading(format!("mining {header}..."));

        let start = Instant::now();
        let found = match mine_parallel(&dag_set, header.as_bytes(), 0, workers, &cancel) {
            Some(found) => found,
            None => {
                logger.error(format!("mining {header} was cancelled"));
                continue;
            }
        };
        let Found { nonce, .. } = found;
        let mined_in = start.elapsed();

        let start = Instant::now();
        let light = light_hashimoto(&params, dag_set.seeds(), header.as_bytes(), nonce)?;
        if meets_boundary(light.mix, boundary) {
            logger.success(format!(
                "{header}: nonce {nonce} mined in {mined_in:.2?}, \
                 verified in {:.2?} with {} entries regenerated",
                start.elapsed(),
                light.accesses
            ));
        } else {
            logger.error(format!("{header}: nonce {nonce} failed light verification"));
        }
    }

    Ok(())
}
