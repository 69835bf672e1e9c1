//! Decision step: which strategies to apply to an area this step.

use em_core::{ExperimentConfig, VehicleClass};

use crate::AreaState;

/// One side effect on one area.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    /// Scale lane max speeds to `factor` × baseline.
    LimitSpeed { factor: f64 },
    /// Install scaled copies of every signal program.
    RetimeSignals { factor: f64 },
    /// Disallow `class` while vehicles are present on the area's lanes.
    Lock { class: VehicleClass },
    /// Weight edges by emission and reroute every vehicle.
    WeightRouting { factor: f64, per_lane: bool },
    /// Reverse every active strategy.
    Restore,
}

/// Actions for an area given its flags and whether its window sum is over
/// the threshold.
///
/// Order is fixed: speed limiting precedes retiming so that retiming gated
/// on speed limiting can fire in the same step.
pub fn plan(config: &ExperimentConfig, state: &AreaState, over: bool) -> Vec<Action> {
    if !over {
        return if state.any_active() { vec![Action::Restore] } else { Vec::new() };
    }

    let mut actions = Vec::new();
    let mut speed_limited = state.speed_limited;

    if config.limit_speed.enabled && !state.speed_limited {
        actions.push(Action::LimitSpeed { factor: config.limit_speed.factor });
        speed_limited = true;
    }

    let retime = &config.adjust_traffic_lights;
    if retime.enabled && !state.signals_adjusted && (!retime.requires_speed_limit || speed_limited) {
        actions.push(Action::RetimeSignals { factor: retime.factor });
    }

    if config.lock_area.enabled && !state.locked {
        actions.push(Action::Lock { class: config.lock_area.vehicle_class.clone() });
    }

    let weight = &config.weight_routing;
    if weight.enabled && !state.weight_adjusted {
        actions.push(Action::WeightRouting { factor: weight.factor, per_lane: weight.per_lane });
    }

    actions
}
