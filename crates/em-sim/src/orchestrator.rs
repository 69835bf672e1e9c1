//! Fan-out of experiments over a dedicated thread pool.
//!
//! Each configuration is one independent unit of work: it loads its own
//! copy of the dataset, owns its own session and shares nothing mutable
//! with its siblings.  All units run to completion (join-all); a failure is
//! logged with the configuration name and reported in its [`UnitOutcome`].
//! A unit that panics is reported as [`ExperimentError::Panicked`]; its
//! siblings' outcomes are still returned.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;

use log::{error, info};
use rayon::prelude::*;

use em_core::ExperimentConfig;
use em_grid::Dataset;
use em_traci::Launcher;

use crate::{run_experiment, ExperimentError, ExperimentReport, ExperimentResult, NoopObserver};

/// Result of one configuration.
#[derive(Debug)]
pub struct UnitOutcome {
    pub config_name: String,
    pub result:      ExperimentResult<ExperimentReport>,
}

impl UnitOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Run `unit` once per configuration, at most `jobs` at a time (default:
/// all at once).  Outcomes are returned in configuration order.
pub fn run_units<F>(configs: &[ExperimentConfig], jobs: Option<usize>, unit: F) -> ExperimentResult<Vec<UnitOutcome>>
where
    F: Fn(&ExperimentConfig) -> ExperimentResult<ExperimentReport> + Sync,
{
    if configs.is_empty() {
        return Ok(Vec::new());
    }
    let threads = jobs.unwrap_or(configs.len()).clamp(1, configs.len());
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("experiment-{i}"))
        .build()
        .map_err(|e| ExperimentError::Pool(e.to_string()))?;

    info!("running {} configuration(s) on {threads} thread(s)", configs.len());
    let outcomes: Vec<UnitOutcome> = pool.install(|| {
        configs
            .par_iter()
            .map(|config| {
                let result = catch_unwind(AssertUnwindSafe(|| unit(config)))
                    .unwrap_or_else(|payload| Err(ExperimentError::Panicked(panic_message(payload.as_ref()))));
                if let Err(e) = &result {
                    error!("{}: experiment failed: {e}", config.name);
                }
                UnitOutcome { config_name: config.name.clone(), result }
            })
            .collect()
    });

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    info!("{} of {} configuration(s) succeeded", outcomes.len() - failed, outcomes.len());
    Ok(outcomes)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_owned()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

/// Run every configuration against the dump at `dump`, each unit loading
/// its own copy and launching its own session.
pub fn run_dump<L: Launcher>(
    launcher: &L,
    dump:     &Path,
    configs:  &[ExperimentConfig],
    jobs:     Option<usize>,
) -> ExperimentResult<Vec<UnitOutcome>> {
    run_units(configs, jobs, |config| {
        let dataset = Dataset::load(dump)?;
        run_experiment(launcher, &dataset, config, &mut NoopObserver)
    })
}
