//! Per-step emission aggregation.
//!
//! Vehicles are bucketed by computing their cell directly from the position
//! ([`Grid::locate`]), so a step costs O(vehicles) regardless of resolution.

use em_core::{Emission, Point2};
use em_grid::Grid;
use em_traci::{Gateway, GatewayResult};

/// One vehicle as seen during the current step.  Never kept past it.
#[derive(Clone, Debug, PartialEq)]
pub struct Vehicle {
    pub id:       String,
    pub position: Point2,
    pub emission: Emission,
}

/// Read every vehicle's position and its five pollutant emissions.
pub fn snapshot_vehicles<G: Gateway>(gw: &mut G) -> GatewayResult<Vec<Vehicle>> {
    let ids = gw.vehicle_ids()?;
    let mut vehicles = Vec::with_capacity(ids.len());
    for id in ids {
        let position = gw.vehicle_position(&id)?;
        let emission = gw.vehicle_emission(&id)?;
        vehicles.push(Vehicle { id, position, emission });
    }
    Ok(vehicles)
}

/// Result of bucketing one step's vehicles.
#[derive(Clone, Debug, PartialEq)]
pub struct Aggregation {
    /// Summed emission per area, indexed by `AreaId`.
    pub per_area: Vec<Emission>,
    /// Vehicles counted per area.
    pub counts:   Vec<u32>,
    /// Vehicles outside the grid boundary.
    pub outside:  usize,
}

/// Sum each vehicle's emission into the single area owning its position.
pub fn aggregate(grid: &Grid, vehicles: &[Vehicle]) -> Aggregation {
    let mut per_area = vec![Emission::ZERO; grid.len()];
    let mut counts = vec![0u32; grid.len()];
    let mut outside = 0;

    for v in vehicles {
        match grid.locate(v.position) {
            Some(area) => {
                per_area[area.index()] += v.emission;
                counts[area.index()] += 1;
            }
            None => outside += 1,
        }
    }
    Aggregation { per_area, counts, outside }
}
