//! Step observer trait for progress reporting and data collection.

use em_core::{Emission, ExperimentConfig};
use em_grid::Dataset;
use em_mitigation::MitigationEngine;

use crate::ExperimentReport;

/// Callbacks invoked by [`run_experiment`][crate::run_experiment].
///
/// All methods have default no-op implementations.  They cannot fail;
/// implementations that write somewhere keep their first error and expose
/// it after the run.
pub trait StepObserver {
    /// Called once the session is open, before the first step.
    fn on_start(&mut self, _config: &ExperimentConfig, _dataset: &Dataset) {}

    /// Called after each step's mitigation.  `per_area` is indexed by
    /// `AreaId`; `engine` exposes every area's flags and window.
    fn on_step(&mut self, _step: usize, _per_area: &[Emission], _engine: &MitigationEngine) {}

    /// Called exactly once per started run, also when a step failed (the
    /// report then holds the totals up to the failure).
    fn on_finish(&mut self, _report: &ExperimentReport) {}
}

/// A [`StepObserver`] that does nothing.
pub struct NoopObserver;

impl StepObserver for NoopObserver {}
