//! `em-core`: foundational types for the `emgrid` workspace.
//!
//! This crate is a dependency of every other `em-*` crate.  It has no `em-*`
//! dependencies and talks to nothing external: the simulation engine lives
//! behind `em-traci`, the grid behind `em-grid`.
//!
//! # What lives here
//!
//! | Module       | Contents                                                  |
//! |--------------|-----------------------------------------------------------|
//! | [`ids`]      | `AreaId`, `LaneId`, `TlsId`                               |
//! | [`geo`]      | `Point2`, `Bounds`                                        |
//! | [`emission`] | `Emission`, `Pollutant`                                   |
//! | [`signal`]   | `Phase`, `Logic` (traffic-light programs)                 |
//! | [`vclass`]   | `VehicleClass` enum                                       |
//! | [`config`]   | `ExperimentConfig` and its per-strategy sections          |
//! | [`error`]    | `CoreError`, `CoreResult`                                 |

pub mod config;
pub mod emission;
pub mod error;
pub mod geo;
pub mod ids;
pub mod signal;
pub mod vclass;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{
    ExperimentConfig, LockAreaConfig, ScaleStrategy, SignalRetimeConfig, WeightRoutingConfig,
};
pub use emission::{Emission, Pollutant};
pub use error::{CoreError, CoreResult};
pub use geo::{Bounds, Point2};
pub use ids::{AreaId, LaneId, TlsId};
pub use signal::{Logic, Phase};
pub use vclass::VehicleClass;
