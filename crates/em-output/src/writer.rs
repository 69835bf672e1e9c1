//! The `OutputWriter` trait.

use em_core::Emission;

use crate::OutputResult;

/// A sink for one experiment's per-step area emissions.
///
/// Errors are kept by [`OutputObserver`][crate::OutputObserver], whose
/// callbacks cannot fail.
pub trait OutputWriter {
    /// Append one step; `per_area` is indexed by `AreaId`.
    fn write_step(&mut self, step: usize, per_area: &[Emission]) -> OutputResult<()>;

    /// Flush and close.  Idempotent.
    fn finish(&mut self) -> OutputResult<()>;
}
