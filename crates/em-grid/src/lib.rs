//! `em-grid`: spatial grid and the static scenario dataset ("dump").
//!
//! # Crate layout
//!
//! | Module      | Contents                                                      |
//! |-------------|---------------------------------------------------------------|
//! | [`grid`]    | `Grid`, `Area`, `build_grid`, `associate`                     |
//! | [`dataset`] | `Dataset`, `Lane`, `TrafficLight`, `build_dataset`            |
//! | [`persist`] | versioned JSON dumps: `create_dump`, `Dataset::save`/`load`   |
//! | [`error`]   | `DatasetError`, `DatasetResult<T>`                            |
//!
//! A dataset is computed once per scenario and then loaded read-only by
//! every experiment; it holds no runtime state.

pub mod dataset;
pub mod error;
pub mod grid;
pub mod persist;


pub use dataset::{build_dataset, Dataset, Lane, TrafficLight};
pub use error::{DatasetError, DatasetResult};
pub use grid::{associate, build_grid, Area, Grid};
pub use persist::{create_dump, dump_path, find_scenario_file, resolve_scenario_file, FORMAT_VERSION};
