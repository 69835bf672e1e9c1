//! In-memory engine for tests and dry runs.
//!
//! A [`ScriptedWorld`] describes a static network (lanes, edges, traffic
//! lights) plus a per-step script of vehicle samples.  [`ScriptedGateway`]
//! serves the [`Gateway`] trait from it and records every mutation so tests
//! can inspect what a controller did.  Lanes, edges and traffic lights are
//! kept in ordered maps so id listings are deterministic.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use em_core::{Bounds, Emission, Logic, Point2, VehicleClass};

use crate::{Color, Gateway, GatewayError, GatewayResult, Launcher, ScenarioSpec};

// ── World description ─────────────────────────────────────────────────────────

/// One vehicle as seen during one step.
#[derive(Clone, Debug, PartialEq)]
pub struct VehicleSample {
    pub id:       String,
    pub position: Point2,
    pub emission: Emission,
}

impl VehicleSample {
    pub fn new(id: impl Into<String>, position: Point2, emission: Emission) -> Self {
        Self { id: id.into(), position, emission }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScriptedLane {
    pub edge:          String,
    pub shape:         Vec<Point2>,
    pub max_speed:     f64,
    pub vehicle_count: u32,
    /// Last list passed to `set_lane_allowed`; empty means unrestricted.
    pub allowed:       Vec<VehicleClass>,
    pub disallowed:    Vec<VehicleClass>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScriptedTrafficLight {
    pub controlled_lanes: Vec<String>,
    pub programs:         Vec<Logic>,
    /// Every program installed through `set_signal_program`, in order.
    pub installed:        Vec<Logic>,
}

impl ScriptedTrafficLight {
    /// Program id currently running.
    pub fn active_program(&self) -> Option<&str> {
        self.installed
            .last()
            .or_else(|| self.programs.first())
            .map(|l| l.program_id.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScriptedEdge {
    pub emission:    Emission,
    pub travel_time: f64,
    /// Last effort set; `None` until first written.
    pub effort:      Option<f64>,
}

impl Default for ScriptedEdge {
    fn default() -> Self {
        Self { emission: Emission::ZERO, travel_time: 1.0, effort: None }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScriptedPolygon {
    pub shape:  Vec<Point2>,
    pub color:  Color,
    pub filled: bool,
    /// Number of fill changes after creation.
    pub fill_toggles: usize,
}

/// Complete state of a scripted engine.
#[derive(Clone, Debug)]
pub struct ScriptedWorld {
    pub bounds:         Bounds,
    pub lanes:          BTreeMap<String, ScriptedLane>,
    pub edges:          BTreeMap<String, ScriptedEdge>,
    pub traffic_lights: BTreeMap<String, ScriptedTrafficLight>,
    /// Vehicles present after step `i + 1`.  Steps past the end are empty.
    pub script:         Vec<Vec<VehicleSample>>,
    pub polygons:       BTreeMap<String, ScriptedPolygon>,
    /// Vehicle ids passed to `reroute_by_effort`, in call order.
    pub reroutes:       Vec<String>,
    /// Steps completed.
    pub steps:          usize,
    /// Make the given (1-based) call to `step` fail.
    pub fail_at_step:   Option<usize>,
    pub closed:         bool,
    pub close_calls:    usize,
}

impl ScriptedWorld {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            bounds,
            lanes:          BTreeMap::new(),
            edges:          BTreeMap::new(),
            traffic_lights: BTreeMap::new(),
            script:         Vec::new(),
            polygons:       BTreeMap::new(),
            reroutes:       Vec::new(),
            steps:          0,
            fail_at_step:   None,
            closed:         false,
            close_calls:    0,
        }
    }

    /// Add a lane; its edge is created with defaults when missing.
    pub fn with_lane(mut self, id: &str, edge: &str, shape: Vec<Point2>, max_speed: f64) -> Self {
        self.edges.entry(edge.to_string()).or_default();
        self.lanes.insert(id.to_string(), ScriptedLane {
            edge: edge.to_string(),
            shape,
            max_speed,
            vehicle_count: 0,
            allowed: Vec::new(),
            disallowed: Vec::new(),
        });
        self
    }

    pub fn with_edge(mut self, id: &str, emission: Emission, travel_time: f64) -> Self {
        self.edges.insert(id.to_string(), ScriptedEdge { emission, travel_time, effort: None });
        self
    }

    pub fn with_traffic_light(mut self, id: &str, controlled_lanes: &[&str], programs: Vec<Logic>) -> Self {
        self.traffic_lights.insert(id.to_string(), ScriptedTrafficLight {
            controlled_lanes: controlled_lanes.iter().map(|s| s.to_string()).collect(),
            programs,
            installed: Vec::new(),
        });
        self
    }

    /// Append one step of vehicle samples to the script.
    pub fn with_step(mut self, vehicles: Vec<VehicleSample>) -> Self {
        self.script.push(vehicles);
        self
    }

    pub fn failing_at_step(mut self, step: usize) -> Self {
        self.fail_at_step = Some(step);
        self
    }

    fn current_vehicles(&self) -> &[VehicleSample] {
        self.steps
            .checked_sub(1)
            .and_then(|i| self.script.get(i))
            .map_or(&[][..], Vec::as_slice)
    }

    fn vehicle(&self, id: &str) -> GatewayResult<&VehicleSample> {
        self.current_vehicles()
            .iter()
            .find(|v| v.id == id)
            .ok_or_else(|| unknown("vehicle", id))
    }

    fn lane(&mut self, id: &str) -> GatewayResult<&mut ScriptedLane> {
        self.lanes.get_mut(id).ok_or_else(|| unknown("lane", id))
    }

    fn edge(&mut self, id: &str) -> GatewayResult<&mut ScriptedEdge> {
        self.edges.get_mut(id).ok_or_else(|| unknown("edge", id))
    }

    fn traffic_light(&mut self, id: &str) -> GatewayResult<&mut ScriptedTrafficLight> {
        self.traffic_lights.get_mut(id).ok_or_else(|| unknown("traffic light", id))
    }

    fn polygon(&mut self, id: &str) -> GatewayResult<&mut ScriptedPolygon> {
        self.polygons.get_mut(id).ok_or_else(|| unknown("polygon", id))
    }
}

fn unknown(kind: &'static str, id: &str) -> GatewayError {
    GatewayError::UnknownObject { kind, id: id.to_string() }
}

// ── Gateway ───────────────────────────────────────────────────────────────────

/// [`Gateway`] over a shared [`ScriptedWorld`].
#[derive(Clone, Debug)]
pub struct ScriptedGateway {
    world: Arc<Mutex<ScriptedWorld>>,
}

impl ScriptedGateway {
    pub fn new(world: ScriptedWorld) -> Self {
        Self { world: Arc::new(Mutex::new(world)) }
    }

    /// Shared handle for inspecting the world after the gateway is gone.
    pub fn handle(&self) -> Arc<Mutex<ScriptedWorld>> {
        Arc::clone(&self.world)
    }

    fn world(&self) -> MutexGuard<'_, ScriptedWorld> {
        self.world.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock the world, refusing if the session was closed.
    fn open(&self) -> GatewayResult<MutexGuard<'_, ScriptedWorld>> {
        let world = self.world();
        if world.closed {
            return Err(GatewayError::Closed);
        }
        Ok(world)
    }
}

impl Gateway for ScriptedGateway {
    fn step(&mut self) -> GatewayResult<()> {
        let mut world = self.open()?;
        let next = world.steps + 1;
        if world.fail_at_step == Some(next) {
            return Err(GatewayError::Command {
                command: crate::constants::CMD_SIMSTEP,
                message: format!("scripted failure at step {next}"),
            });
        }
        world.steps = next;
        Ok(())
    }

    fn close(&mut self) -> GatewayResult<()> {
        let mut world = self.world();
        world.close_calls += 1;
        world.closed = true;
        Ok(())
    }

    fn net_boundary(&mut self) -> GatewayResult<Bounds> {
        Ok(self.open()?.bounds)
    }

    fn vehicle_ids(&mut self) -> GatewayResult<Vec<String>> {
        Ok(self.open()?.current_vehicles().iter().map(|v| v.id.clone()).collect())
    }

    fn vehicle_position(&mut self, vehicle: &str) -> GatewayResult<Point2> {
        Ok(self.open()?.vehicle(vehicle)?.position)
    }

    fn vehicle_emission(&mut self, vehicle: &str) -> GatewayResult<Emission> {
        Ok(self.open()?.vehicle(vehicle)?.emission)
    }

    fn reroute_by_effort(&mut self, vehicle: &str) -> GatewayResult<()> {
        let mut world = self.open()?;
        world.vehicle(vehicle)?;
        world.reroutes.push(vehicle.to_string());
        Ok(())
    }

    fn lane_ids(&mut self) -> GatewayResult<Vec<String>> {
        Ok(self.open()?.lanes.keys().cloned().collect())
    }

    fn lane_shape(&mut self, lane: &str) -> GatewayResult<Vec<Point2>> {
        Ok(self.open()?.lane(lane)?.shape.clone())
    }

    fn lane_max_speed(&mut self, lane: &str) -> GatewayResult<f64> {
        Ok(self.open()?.lane(lane)?.max_speed)
    }

    fn set_lane_max_speed(&mut self, lane: &str, speed: f64) -> GatewayResult<()> {
        self.open()?.lane(lane)?.max_speed = speed;
        Ok(())
    }

    fn lane_edge_id(&mut self, lane: &str) -> GatewayResult<String> {
        Ok(self.open()?.lane(lane)?.edge.clone())
    }

    fn lane_vehicle_count(&mut self, lane: &str) -> GatewayResult<u32> {
        Ok(self.open()?.lane(lane)?.vehicle_count)
    }

    fn set_lane_disallowed(&mut self, lane: &str, classes: &[VehicleClass]) -> GatewayResult<()> {
        self.open()?.lane(lane)?.disallowed = classes.to_vec();
        Ok(())
    }

    fn set_lane_allowed(&mut self, lane: &str, classes: &[VehicleClass]) -> GatewayResult<()> {
        let mut world = self.open()?;
        let lane = world.lane(lane)?;
        lane.allowed = classes.to_vec();
        // The engine derives one list from the other; "allow all" clears both.
        if classes.is_empty() {
            lane.disallowed.clear();
        } else {
            lane.disallowed.retain(|c| !classes.contains(c));
        }
        Ok(())
    }

    fn traffic_light_ids(&mut self) -> GatewayResult<Vec<String>> {
        Ok(self.open()?.traffic_lights.keys().cloned().collect())
    }

    fn controlled_lanes(&mut self, tls: &str) -> GatewayResult<Vec<String>> {
        Ok(self.open()?.traffic_light(tls)?.controlled_lanes.clone())
    }

    fn signal_programs(&mut self, tls: &str) -> GatewayResult<Vec<Logic>> {
        Ok(self.open()?.traffic_light(tls)?.programs.clone())
    }

    fn set_signal_program(&mut self, tls: &str, logic: &Logic) -> GatewayResult<()> {
        let mut world = self.open()?;
        let light = world.traffic_light(tls)?;
        match light.programs.iter().position(|p| p.program_id == logic.program_id) {
            Some(i) => light.programs[i] = logic.clone(),
            None => light.programs.push(logic.clone()),
        }
        light.installed.push(logic.clone());
        Ok(())
    }

    fn edge_emission(&mut self, edge: &str) -> GatewayResult<Emission> {
        Ok(self.open()?.edge(edge)?.emission)
    }

    fn edge_travel_time(&mut self, edge: &str) -> GatewayResult<f64> {
        Ok(self.open()?.edge(edge)?.travel_time)
    }

    fn set_edge_effort(&mut self, edge: &str, effort: f64) -> GatewayResult<()> {
        self.open()?.edge(edge)?.effort = Some(effort);
        Ok(())
    }

    fn add_polygon(&mut self, name: &str, shape: &[Point2], color: Color, filled: bool) -> GatewayResult<()> {
        let mut world = self.open()?;
        if world.polygons.contains_key(name) {
            return Err(GatewayError::Command {
                command: crate::constants::CMD_SET_POLYGON_VARIABLE,
                message: format!("polygon {name:?} already exists"),
            });
        }
        world.polygons.insert(name.to_string(), ScriptedPolygon {
            shape: shape.to_vec(),
            color,
            filled,
            fill_toggles: 0,
        });
        Ok(())
    }

    fn set_polygon_filled(&mut self, name: &str, filled: bool) -> GatewayResult<()> {
        let mut world = self.open()?;
        let polygon = world.polygon(name)?;
        polygon.filled = filled;
        polygon.fill_toggles += 1;
        Ok(())
    }

    fn set_polygon_color(&mut self, name: &str, color: Color) -> GatewayResult<()> {
        self.open()?.polygon(name)?.color = color;
        Ok(())
    }
}

// ── Launcher ──────────────────────────────────────────────────────────────────

/// Hands every session a fresh copy of a template world.
#[derive(Debug)]
pub struct ScriptedLauncher {
    template: ScriptedWorld,
    sessions: Mutex<Vec<Arc<Mutex<ScriptedWorld>>>>,
}

impl ScriptedLauncher {
    pub fn new(template: ScriptedWorld) -> Self {
        Self { template, sessions: Mutex::new(Vec::new()) }
    }

    /// Handles of every session launched so far, in launch order.
    pub fn sessions(&self) -> Vec<Arc<Mutex<ScriptedWorld>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Launcher for ScriptedLauncher {
    type Session = ScriptedGateway;

    fn launch(&self, _scenario: &ScenarioSpec) -> GatewayResult<ScriptedGateway> {
        let gateway = ScriptedGateway::new(self.template.clone());
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(gateway.handle());
        Ok(gateway)
    }
}
