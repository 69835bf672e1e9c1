//! The `Gateway` trait: every query and mutation the workspace performs
//! against the simulation engine.

use std::path::PathBuf;

use em_core::{Bounds, Emission, Logic, Point2, VehicleClass};

use crate::GatewayResult;

/// RGBA colour for overlay polygons.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const RED: Color = Color { r: 255, g: 0, b: 0, a: 255 };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// What to start: the engine executable and its scenario file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScenarioSpec {
    pub binary:      String,
    pub config_file: PathBuf,
}

/// One live session with the simulation engine.
///
/// Lane, traffic-light, edge and vehicle identifiers are the engine's own
/// strings.  Implementations must be usable again after an error on a single
/// call; only [`close`][Self::close] ends the session.
pub trait Gateway {
    // ── Session ───────────────────────────────────────────────────────────

    /// Advance the simulation by one step.
    fn step(&mut self) -> GatewayResult<()>;

    /// End the session.  Idempotent.
    fn close(&mut self) -> GatewayResult<()>;

    /// Bounding box of the road network.
    fn net_boundary(&mut self) -> GatewayResult<Bounds>;

    // ── Vehicles ──────────────────────────────────────────────────────────

    fn vehicle_ids(&mut self) -> GatewayResult<Vec<String>>;

    fn vehicle_position(&mut self, vehicle: &str) -> GatewayResult<Point2>;

    /// Current emission of all five pollutants (mg during the last step).
    fn vehicle_emission(&mut self, vehicle: &str) -> GatewayResult<Emission>;

    /// Recompute the vehicle's route using edge efforts as cost.
    fn reroute_by_effort(&mut self, vehicle: &str) -> GatewayResult<()>;

    // ── Lanes ─────────────────────────────────────────────────────────────

    fn lane_ids(&mut self) -> GatewayResult<Vec<String>>;

    /// Centerline polyline.
    fn lane_shape(&mut self, lane: &str) -> GatewayResult<Vec<Point2>>;

    fn lane_max_speed(&mut self, lane: &str) -> GatewayResult<f64>;

    fn set_lane_max_speed(&mut self, lane: &str, speed: f64) -> GatewayResult<()>;

    fn lane_edge_id(&mut self, lane: &str) -> GatewayResult<String>;

    /// Vehicles on the lane during the last step.
    fn lane_vehicle_count(&mut self, lane: &str) -> GatewayResult<u32>;

    fn set_lane_disallowed(&mut self, lane: &str, classes: &[VehicleClass]) -> GatewayResult<()>;

    /// An empty `classes` slice allows every class.
    fn set_lane_allowed(&mut self, lane: &str, classes: &[VehicleClass]) -> GatewayResult<()>;

    // ── Traffic lights ────────────────────────────────────────────────────

    fn traffic_light_ids(&mut self) -> GatewayResult<Vec<String>>;

    fn controlled_lanes(&mut self, tls: &str) -> GatewayResult<Vec<String>>;

    /// Every program known for the traffic light.
    fn signal_programs(&mut self, tls: &str) -> GatewayResult<Vec<Logic>>;

    /// Install (or overwrite) a program and switch to it.
    fn set_signal_program(&mut self, tls: &str, logic: &Logic) -> GatewayResult<()>;

    // ── Edges ─────────────────────────────────────────────────────────────

    fn edge_emission(&mut self, edge: &str) -> GatewayResult<Emission>;

    fn edge_travel_time(&mut self, edge: &str) -> GatewayResult<f64>;

    fn set_edge_effort(&mut self, edge: &str, effort: f64) -> GatewayResult<()>;

    // ── Overlay polygons (GUI only) ───────────────────────────────────────

    fn add_polygon(&mut self, name: &str, shape: &[Point2], color: Color, filled: bool) -> GatewayResult<()>;

    fn set_polygon_filled(&mut self, name: &str, filled: bool) -> GatewayResult<()>;

    fn set_polygon_color(&mut self, name: &str, color: Color) -> GatewayResult<()>;
}

/// Opens sessions.  Shared by all concurrently running experiments, hence
/// `Sync`; each call returns an independent session.
pub trait Launcher: Sync {
    type Session: Gateway;

    fn launch(&self, scenario: &ScenarioSpec) -> GatewayResult<Self::Session>;
}
