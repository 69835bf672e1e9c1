//! `em-output`: per-step area emission export.
//!
//! | Module       | Contents                                                   |
//! |--------------|------------------------------------------------------------|
//! | [`writer`]   | `OutputWriter` trait                                       |
//! | [`csv`]      | `CsvWriter`, `csv_path`                                    |
//! | [`observer`] | `OutputObserver`: `StepObserver` driving any writer        |
//! | [`error`]    | `OutputError`, `OutputResult<T>`                           |
//!
//! # Usage
//!
//! ```rust,ignore
//! use em_output::{csv_path, CsvWriter, OutputObserver};
//!
//! let path = csv_path(&dataset.scenario_dir, &dataset.name, &config.name, &stamp);
//! let names = dataset.grid.iter().map(|a| a.name.as_str());
//! let mut obs = OutputObserver::new(CsvWriter::create(&path, names)?);
//! run_experiment(&launcher, &dataset, &config, &mut obs)?;
//! if let Some(e) = obs.take_error() { log::warn!("output error: {e}"); }
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod writer;

#[cfg(test)]
mod tests;

pub use self::csv::{csv_path, CsvWriter};
pub use error::{OutputError, OutputResult};
pub use observer::OutputObserver;
pub use writer::OutputWriter;
