//! Runtime state of one area during one experiment.

use em_core::Emission;

use crate::SlidingWindow;

/// History, window and strategy flags of one area.
///
/// Lives only inside one experiment; the dataset it refers to stays
/// read-only.
#[derive(Clone, Debug)]
pub struct AreaState {
    /// Emission per step; index = step number.
    pub history: Vec<Emission>,
    pub window:  SlidingWindow,

    pub speed_limited:    bool,
    pub signals_adjusted: bool,
    pub locked:           bool,
    pub weight_adjusted:  bool,

    /// Window sum at or above the threshold after the latest step.
    pub over_threshold: bool,
    /// `(step, over_threshold)` each time the threshold state changed.
    pub transitions: Vec<(usize, bool)>,
}

impl AreaState {
    pub fn new(window_size: usize) -> Self {
        Self {
            history:          Vec::new(),
            window:           SlidingWindow::new(window_size),
            speed_limited:    false,
            signals_adjusted: false,
            locked:           false,
            weight_adjusted:  false,
            over_threshold:   false,
            transitions:      Vec::new(),
        }
    }

    /// Append one step's emission; returns the new window sum.
    pub fn record(&mut self, emission: Emission) -> f64 {
        self.history.push(emission);
        self.window.push(emission.total());
        self.window.sum()
    }

    /// Update the threshold state for `step`; returns `true` on change.
    pub fn set_over_threshold(&mut self, step: usize, over: bool) -> bool {
        if self.over_threshold == over {
            return false;
        }
        self.over_threshold = over;
        self.transitions.push((step, over));
        true
    }

    pub fn any_active(&self) -> bool {
        self.speed_limited || self.signals_adjusted || self.locked || self.weight_adjusted
    }

    /// Sum over all recorded steps.
    pub fn total(&self) -> Emission {
        self.history.iter().sum()
    }
}
