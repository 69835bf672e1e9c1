//! `em-sim`: experiment step loop and orchestrator.
//!
//! # Step loop
//!
//! ```text
//! launch session, install overlay
//! for step in 0..config.n_steps:
//!   ① Step      : Gateway::step
//!   ② Snapshot  : every vehicle's position and emission
//!   ③ Aggregate : bucket vehicles into areas, sum per area
//!   ④ Mitigate  : window update, decide, apply / restore
//!   ⑤ Observe   : StepObserver::on_step (CSV export, ...)
//! report, StepObserver::on_finish, close session
//! ```
//!
//! The session is closed on every exit path and the observer always sees
//! `on_finish`, with partial totals when a step failed.
//!
//! # Crate layout
//!
//! | Module           | Contents                                                  |
//! |------------------|-----------------------------------------------------------|
//! | [`aggregator`]   | `Vehicle`, `snapshot_vehicles`, `aggregate`               |
//! | [`observer`]     | `StepObserver` trait, `NoopObserver`                      |
//! | [`experiment`]   | `run_experiment`, `Session` guard, `scenario_spec`        |
//! | [`report`]       | `ExperimentReport`, `Reductions`, `reduction_percentage`  |
//! | [`orchestrator`] | `run_units`, `run_dump`, `UnitOutcome`                    |
//! | [`error`]        | `ExperimentError`, `ExperimentResult<T>`                  |

pub mod aggregator;
pub mod error;
pub mod experiment;
pub mod observer;
pub mod orchestrator;
pub mod report;

#[cfg(test)]
mod tests;

pub use aggregator::{aggregate, snapshot_vehicles, Aggregation, Vehicle};
pub use error::{ExperimentError, ExperimentResult};
pub use experiment::{run_experiment, scenario_spec, Session};
pub use observer::{NoopObserver, StepObserver};
pub use orchestrator::{run_dump, run_units, UnitOutcome};
pub use report::{reduction_percentage, AreaTotal, ExperimentReport, Reductions};
