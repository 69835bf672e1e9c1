//! Gateway side effects of each strategy and of its reversal.
//!
//! Every function touches only the lanes, edges and traffic lights that the
//! dataset associates with `area`.

use log::debug;

use em_core::{AreaId, VehicleClass};
use em_grid::Dataset;
use em_traci::Gateway;

use crate::MitigationResult;

// ── Speed limiting ────────────────────────────────────────────────────────────

/// Set each lane's max speed to `factor` × its baseline.
pub fn limit_speed<G: Gateway>(gw: &mut G, ds: &Dataset, area: AreaId, factor: f64) -> MitigationResult<()> {
    for &lane in &ds.grid.area(area).lanes {
        let lane = ds.lane(lane);
        gw.set_lane_max_speed(&lane.name, lane.initial_max_speed * factor)?;
    }
    Ok(())
}

/// Put back each lane's exact baseline max speed.
pub fn restore_speed<G: Gateway>(gw: &mut G, ds: &Dataset, area: AreaId) -> MitigationResult<()> {
    for &lane in &ds.grid.area(area).lanes {
        let lane = ds.lane(lane);
        gw.set_lane_max_speed(&lane.name, lane.initial_max_speed)?;
    }
    Ok(())
}

// ── Signal retiming ───────────────────────────────────────────────────────────

/// Program id under which a scaled copy of `program_id` is installed.
pub fn retimed_program_id(program_id: &str) -> String {
    format!("{program_id}-retimed")
}

/// Install a copy of every captured program with all phase durations scaled.
pub fn retime_signals<G: Gateway>(gw: &mut G, ds: &Dataset, area: AreaId, factor: f64) -> MitigationResult<()> {
    for &tls in &ds.grid.area(area).traffic_lights {
        let tls = ds.traffic_light(tls);
        for logic in &tls.programs {
            let scaled = logic.scaled(retimed_program_id(&logic.program_id), factor);
            gw.set_signal_program(&tls.name, &scaled)?;
            debug!(
                "{}: program {} cycle {:.1}s -> {:.1}s",
                tls.name,
                logic.program_id,
                logic.cycle_secs(),
                scaled.cycle_secs()
            );
        }
    }
    Ok(())
}

/// Reinstall every captured program as it was.
pub fn restore_signals<G: Gateway>(gw: &mut G, ds: &Dataset, area: AreaId) -> MitigationResult<()> {
    for &tls in &ds.grid.area(area).traffic_lights {
        let tls = ds.traffic_light(tls);
        for logic in &tls.programs {
            gw.set_signal_program(&tls.name, logic)?;
        }
    }
    Ok(())
}

// ── Locking ───────────────────────────────────────────────────────────────────

/// Vehicles currently on the area's lanes.
pub fn vehicles_on_lanes<G: Gateway>(gw: &mut G, ds: &Dataset, area: AreaId) -> MitigationResult<u64> {
    let mut count = 0u64;
    for &lane in &ds.grid.area(area).lanes {
        count += u64::from(gw.lane_vehicle_count(&ds.lane(lane).name)?);
    }
    Ok(count)
}

/// Disallow `class` on every lane of the area, but only while at least one
/// vehicle is on them.  Returns whether the area was locked.
pub fn lock_area<G: Gateway>(gw: &mut G, ds: &Dataset, area: AreaId, class: &VehicleClass) -> MitigationResult<bool> {
    if vehicles_on_lanes(gw, ds, area)? == 0 {
        return Ok(false);
    }
    let classes = std::slice::from_ref(class);
    for &lane in &ds.grid.area(area).lanes {
        gw.set_lane_disallowed(&ds.lane(lane).name, classes)?;
    }
    Ok(true)
}

/// Allow every class on every lane of the area.
///
/// Not the inverse of [`lock_area`]: a lane that restricted some classes
/// before the lock ends up unrestricted.
pub fn unlock_area<G: Gateway>(gw: &mut G, ds: &Dataset, area: AreaId) -> MitigationResult<()> {
    for &lane in &ds.grid.area(area).lanes {
        gw.set_lane_allowed(&ds.lane(lane).name, &[])?;
    }
    Ok(())
}

// ── Weight routing ────────────────────────────────────────────────────────────

/// Set each of the area's edges' effort to its emission total × `factor`
/// (divided by the edge's lane count when `per_lane`), then reroute every
/// vehicle in `vehicles` by effort.
pub fn weight_routing<G: Gateway>(
    gw:       &mut G,
    ds:       &Dataset,
    area:     AreaId,
    factor:   f64,
    per_lane: bool,
    vehicles: &[String],
) -> MitigationResult<()> {
    for edge in ds.area_edges(area) {
        let mut effort = gw.edge_emission(edge)?.total() * factor;
        if per_lane {
            effort /= ds.edge_lane_count(edge).max(1) as f64;
        }
        gw.set_edge_effort(edge, effort)?;
    }
    for vehicle in vehicles {
        gw.reroute_by_effort(vehicle)?;
    }
    Ok(())
}

/// Reset the area's edge efforts to their current travel time.
pub fn reset_weights<G: Gateway>(gw: &mut G, ds: &Dataset, area: AreaId) -> MitigationResult<()> {
    for edge in ds.area_edges(area) {
        let travel_time = gw.edge_travel_time(edge)?;
        gw.set_edge_effort(edge, travel_time)?;
    }
    Ok(())
}
