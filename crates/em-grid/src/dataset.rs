//! Static scenario dataset: the grid plus every lane and traffic light with
//! its pre-mitigation baseline.
//!
//! Lanes and traffic lights live in flat tables indexed by [`LaneId`] /
//! [`TlsId`]; areas reference them by id.  The engine's own string ids are
//! kept alongside for gateway calls.

use std::collections::HashMap;
use std::path::PathBuf;

use log::{debug, info};
use serde::{Deserialize, Deserializer, Serialize};

use em_core::{AreaId, Bounds, LaneId, Logic, Point2, TlsId};
use em_traci::Gateway;

use crate::grid::{associate, build_grid, Grid};
use crate::{DatasetError, DatasetResult};

/// A lane and its baseline maximum speed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lane {
    pub id:    LaneId,
    /// Engine lane id.
    pub name:  String,
    /// Engine id of the parent edge.
    pub edge:  String,
    pub shape: Vec<Point2>,
    /// m/s, read before any mitigation ran.  Restoration target.  Absent or
    /// `null` in a dump reads as NaN, which validation reports as a data
    /// integrity error.
    #[serde(default = "missing_speed", deserialize_with = "baseline_speed")]
    pub initial_max_speed: f64,
}

fn missing_speed() -> f64 {
    f64::NAN
}

fn baseline_speed<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(d)?.unwrap_or(f64::NAN))
}

/// A traffic light and its baseline programs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrafficLight {
    pub id:   TlsId,
    pub name: String,
    /// Engine lane ids, deduplicated, in signal-link order.
    pub controlled_lanes: Vec<String>,
    /// Every program as captured; reinstalled verbatim on reversal.
    pub programs: Vec<Logic>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Dump name chosen by the user.
    pub name:           String,
    pub scenario_dir:   PathBuf,
    pub grid:           Grid,
    pub lanes:          Vec<Lane>,
    pub traffic_lights: Vec<TrafficLight>,
}

impl Dataset {
    #[inline]
    pub fn lane(&self, id: LaneId) -> &Lane {
        &self.lanes[id.index()]
    }

    #[inline]
    pub fn traffic_light(&self, id: TlsId) -> &TrafficLight {
        &self.traffic_lights[id.index()]
    }

    pub fn area_count(&self) -> usize {
        self.grid.len()
    }

    /// Parent edges of an area's lanes, deduplicated, first occurrence order.
    pub fn area_edges(&self, area: AreaId) -> Vec<&str> {
        let mut edges: Vec<&str> = Vec::new();
        for &lane in &self.grid.area(area).lanes {
            let edge = self.lane(lane).edge.as_str();
            if !edges.contains(&edge) {
                edges.push(edge);
            }
        }
        edges
    }

    /// Number of lanes in the network belonging to `edge`.
    pub fn edge_lane_count(&self, edge: &str) -> usize {
        self.lanes.iter().filter(|l| l.edge == edge).count()
    }
}

/// Query the engine once and associate its infrastructure with an
/// `resolution × resolution` grid over the network boundary.
///
/// Must run before any mitigation touches the session: the speeds and
/// programs read here are the restoration baselines.
pub fn build_dataset<G: Gateway>(
    gateway:      &mut G,
    name:         &str,
    scenario_dir: PathBuf,
    resolution:   u32,
) -> DatasetResult<Dataset> {
    let bounds = gateway.net_boundary()?;
    let mut grid = build_grid(bounds, resolution)?;
    info!("{name}: {resolution}x{resolution} grid over {bounds}");

    // ── Lanes ─────────────────────────────────────────────────────────────
    let mut lanes = Vec::new();
    for (idx, lane_name) in gateway.lane_ids()?.into_iter().enumerate() {
        let shape = gateway.lane_shape(&lane_name)?;
        let initial_max_speed = gateway.lane_max_speed(&lane_name)?;
        if !initial_max_speed.is_finite() || initial_max_speed < 0.0 {
            return Err(DatasetError::DataIntegrity(format!(
                "lane {lane_name:?} reports max speed {initial_max_speed}"
            )));
        }
        let edge = gateway.lane_edge_id(&lane_name)?;
        let id = LaneId::try_from(idx)
            .map_err(|_| DatasetError::DataIntegrity("too many lanes".into()))?;

        if let Some(bbox) = Bounds::enclosing(&shape) {
            for area in grid.candidates(&bbox) {
                if associate(grid.area(area), &shape) {
                    grid.areas[area.index()].lanes.push(id);
                }
            }
        }
        lanes.push(Lane { id, name: lane_name, edge, shape, initial_max_speed });
    }
    debug!("{name}: {} lanes read", lanes.len());

    // ── Traffic lights ────────────────────────────────────────────────────
    let lane_index: HashMap<&str, LaneId> = lanes.iter().map(|l| (l.name.as_str(), l.id)).collect();
    let mut traffic_lights = Vec::new();
    for (idx, tls_name) in gateway.traffic_light_ids()?.into_iter().enumerate() {
        let mut controlled_lanes: Vec<String> = Vec::new();
        for lane in gateway.controlled_lanes(&tls_name)? {
            if !controlled_lanes.contains(&lane) {
                controlled_lanes.push(lane);
            }
        }
        let programs = gateway.signal_programs(&tls_name)?;
        let id = TlsId::try_from(idx)
            .map_err(|_| DatasetError::DataIntegrity("too many traffic lights".into()))?;

        let controlled: Vec<LaneId> = controlled_lanes
            .iter()
            .filter_map(|l| lane_index.get(l.as_str()).copied())
            .collect();
        for area in &mut grid.areas {
            if controlled.iter().any(|l| area.lanes.binary_search(l).is_ok()) {
                area.traffic_lights.push(id);
            }
        }
        traffic_lights.push(TrafficLight { id, name: tls_name, controlled_lanes, programs });
    }

    let with_lanes = grid.areas.iter().filter(|a| !a.lanes.is_empty()).count();
    info!(
        "{name}: {} lanes, {} traffic lights, {with_lanes}/{} areas with lanes",
        lanes.len(),
        traffic_lights.len(),
        grid.len()
    );

    Ok(Dataset { name: name.to_string(), scenario_dir, grid, lanes, traffic_lights })
}
