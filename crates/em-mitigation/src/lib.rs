//! `em-mitigation`: threshold detection and per-area mitigation.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                  |
//! |----------------|-----------------------------------------------------------|
//! | [`window`]     | `SlidingWindow`: trailing moving sum                      |
//! | [`state`]      | `AreaState`: history, window and strategy flags per area  |
//! | [`action`]     | `Action` enum and `plan` (pure decision step)             |
//! | [`strategies`] | gateway side effects of each action and its reversal      |
//! | [`engine`]     | `MitigationEngine`, `ActivationCounters`                  |
//! | [`error`]      | `MitigationError`, `MitigationResult<T>`                  |
//!
//! # Design notes
//!
//! Each step is split in two phases, per area:
//!
//! 1. **Decide**: record the step's emission, update the window and compute
//!    the list of [`Action`]s from the flags and the configuration alone.
//! 2. **Apply**: execute the actions against the gateway and update flags.
//!
//! Every scaled value is derived from the dataset's baseline, never from the
//! engine's current value, so repeated activate/restore cycles are exact.

pub mod action;
pub mod engine;
pub mod error;
pub mod state;
pub mod strategies;
pub mod window;


pub use action::{plan, Action};
pub use engine::{ActivationCounters, MitigationEngine, OVERLAY_CALM, OVERLAY_HOT};
pub use error::{MitigationError, MitigationResult};
pub use state::AreaState;
pub use window::SlidingWindow;
