//! `TraciGateway`: [`Gateway`] over a TraCI TCP connection.
//!
//! One command per message, answered synchronously.  The optional child
//! process is the engine started by [`SumoLauncher`][crate::SumoLauncher];
//! it is reaped on [`close`][Gateway::close] and killed if the gateway is
//! dropped without a clean close.

use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::process::Child;

use log::{debug, warn};

use em_core::{Bounds, Emission, Logic, Point2, VehicleClass};

use crate::codec::{command, get_command, message, set_command, Reader, Storage};
use crate::constants::*;
use crate::{Color, Gateway, GatewayError, GatewayResult};

/// A live TraCI session.
pub struct TraciGateway {
    stream: Option<TcpStream>,
    child:  Option<Child>,
}

impl TraciGateway {
    /// Connect to an engine that is already listening.
    pub fn connect<A: ToSocketAddrs>(addr: A) -> GatewayResult<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        Ok(Self { stream: Some(stream), child: None })
    }

    /// Take ownership of the engine process so it is reaped with the session.
    pub fn with_child(mut self, child: Child) -> Self {
        self.child = Some(child);
        self
    }

    /// Send one framed command and return the body of the answer.
    fn exchange(&mut self, framed: Vec<u8>) -> GatewayResult<Vec<u8>> {
        let stream = self.stream.as_mut().ok_or(GatewayError::Closed)?;
        stream.write_all(&message(&[framed]))?;

        let mut len = [0u8; 4];
        stream.read_exact(&mut len)?;
        let total = i32::from_be_bytes(len);
        let body_len = usize::try_from(total)
            .ok()
            .and_then(|t| t.checked_sub(4))
            .ok_or_else(|| GatewayError::Protocol(format!("invalid message length {total}")))?;

        let mut body = vec![0u8; body_len];
        stream.read_exact(&mut body)?;
        Ok(body)
    }

    fn get<T>(
        &mut self,
        domain:   u8,
        variable: u8,
        object:   &str,
        decode:   impl FnOnce(&mut Reader<'_>) -> GatewayResult<T>,
    ) -> GatewayResult<T> {
        let body = self.exchange(get_command(domain, variable, object))?;
        let mut reader = Reader::new(&body);
        reader.get_response(domain, variable, object)?;
        decode(&mut reader)
    }

    fn get_f64(&mut self, domain: u8, variable: u8, object: &str) -> GatewayResult<f64> {
        self.get(domain, variable, object, |r| r.typed_f64())
    }

    fn get_string_list(&mut self, domain: u8, variable: u8, object: &str) -> GatewayResult<Vec<String>> {
        self.get(domain, variable, object, |r| r.typed_string_list())
    }

    fn set(&mut self, domain: u8, variable: u8, object: &str, value: &Storage) -> GatewayResult<()> {
        let body = self.exchange(set_command(domain, variable, object, value))?;
        Reader::new(&body).status(domain)
    }

    fn emission(&mut self, domain: u8, object: &str) -> GatewayResult<Emission> {
        Ok(Emission {
            co2: self.get_f64(domain, VAR_CO2EMISSION, object)?,
            co:  self.get_f64(domain, VAR_COEMISSION, object)?,
            nox: self.get_f64(domain, VAR_NOXEMISSION, object)?,
            hc:  self.get_f64(domain, VAR_HCEMISSION, object)?,
            pmx: self.get_f64(domain, VAR_PMXEMISSION, object)?,
        })
    }

    fn reap_child(&mut self, kill: bool) {
        if let Some(mut child) = self.child.take() {
            if kill {
                if let Err(e) = child.kill() {
                    debug!("engine process already gone: {e}");
                }
            }
            match child.wait() {
                Ok(status) => debug!("engine process exited with {status}"),
                Err(e) => warn!("failed to wait for engine process: {e}"),
            }
        }
    }
}

fn class_names(classes: &[VehicleClass]) -> Vec<&str> {
    classes.iter().map(VehicleClass::as_str).collect()
}

impl Gateway for TraciGateway {
    fn step(&mut self) -> GatewayResult<()> {
        let mut content = Storage::new();
        content.f64(0.0);
        let body = self.exchange(command(CMD_SIMSTEP, content.as_bytes()))?;
        let mut reader = Reader::new(&body);
        reader.status(CMD_SIMSTEP)?;
        // Subscription results; nothing is subscribed.
        let _subscriptions = reader.i32()?;
        Ok(())
    }

    fn close(&mut self) -> GatewayResult<()> {
        if self.stream.is_none() {
            return Ok(());
        }
        let result = self
            .exchange(command(CMD_CLOSE, &[]))
            .and_then(|body| Reader::new(&body).status(CMD_CLOSE));
        self.stream = None;
        self.reap_child(result.is_err());
        result
    }

    fn net_boundary(&mut self) -> GatewayResult<Bounds> {
        let (lo, hi) = self.get(CMD_GET_SIM_VARIABLE, VAR_NET_BOUNDING_BOX, "", |r| r.typed_boundary())?;
        Ok(Bounds::new(lo.x, lo.y, hi.x, hi.y))
    }

    fn vehicle_ids(&mut self) -> GatewayResult<Vec<String>> {
        self.get_string_list(CMD_GET_VEHICLE_VARIABLE, ID_LIST, "")
    }

    fn vehicle_position(&mut self, vehicle: &str) -> GatewayResult<Point2> {
        self.get(CMD_GET_VEHICLE_VARIABLE, VAR_POSITION, vehicle, |r| r.typed_position())
    }

    fn vehicle_emission(&mut self, vehicle: &str) -> GatewayResult<Emission> {
        self.emission(CMD_GET_VEHICLE_VARIABLE, vehicle)
    }

    fn reroute_by_effort(&mut self, vehicle: &str) -> GatewayResult<()> {
        let mut value = Storage::new();
        value.compound(0);
        self.set(CMD_SET_VEHICLE_VARIABLE, CMD_REROUTE_EFFORT, vehicle, &value)
    }

    fn lane_ids(&mut self) -> GatewayResult<Vec<String>> {
        self.get_string_list(CMD_GET_LANE_VARIABLE, ID_LIST, "")
    }

    fn lane_shape(&mut self, lane: &str) -> GatewayResult<Vec<Point2>> {
        self.get(CMD_GET_LANE_VARIABLE, VAR_SHAPE, lane, |r| r.typed_polygon())
    }

    fn lane_max_speed(&mut self, lane: &str) -> GatewayResult<f64> {
        self.get_f64(CMD_GET_LANE_VARIABLE, VAR_MAXSPEED, lane)
    }

    fn set_lane_max_speed(&mut self, lane: &str, speed: f64) -> GatewayResult<()> {
        let mut value = Storage::new();
        value.typed_f64(speed);
        self.set(CMD_SET_LANE_VARIABLE, VAR_MAXSPEED, lane, &value)
    }

    fn lane_edge_id(&mut self, lane: &str) -> GatewayResult<String> {
        self.get(CMD_GET_LANE_VARIABLE, LANE_EDGE_ID, lane, |r| r.typed_string())
    }

    fn lane_vehicle_count(&mut self, lane: &str) -> GatewayResult<u32> {
        let n = self.get(CMD_GET_LANE_VARIABLE, LAST_STEP_VEHICLE_NUMBER, lane, |r| r.typed_i32())?;
        u32::try_from(n).map_err(|_| GatewayError::Protocol(format!("negative vehicle count {n}")))
    }

    fn set_lane_disallowed(&mut self, lane: &str, classes: &[VehicleClass]) -> GatewayResult<()> {
        let mut value = Storage::new();
        value.typed_string_list(&class_names(classes));
        self.set(CMD_SET_LANE_VARIABLE, LANE_DISALLOWED, lane, &value)
    }

    fn set_lane_allowed(&mut self, lane: &str, classes: &[VehicleClass]) -> GatewayResult<()> {
        let mut value = Storage::new();
        value.typed_string_list(&class_names(classes));
        self.set(CMD_SET_LANE_VARIABLE, LANE_ALLOWED, lane, &value)
    }

    fn traffic_light_ids(&mut self) -> GatewayResult<Vec<String>> {
        self.get_string_list(CMD_GET_TL_VARIABLE, ID_LIST, "")
    }

    fn controlled_lanes(&mut self, tls: &str) -> GatewayResult<Vec<String>> {
        self.get_string_list(CMD_GET_TL_VARIABLE, TL_CONTROLLED_LANES, tls)
    }

    fn signal_programs(&mut self, tls: &str) -> GatewayResult<Vec<Logic>> {
        self.get(CMD_GET_TL_VARIABLE, TL_COMPLETE_DEFINITION_RYG, tls, |r| r.typed_logics())
    }

    fn set_signal_program(&mut self, tls: &str, logic: &Logic) -> GatewayResult<()> {
        let mut value = Storage::new();
        value.typed_logic(logic);
        self.set(CMD_SET_TL_VARIABLE, TL_COMPLETE_PROGRAM_RYG, tls, &value)
    }

    fn edge_emission(&mut self, edge: &str) -> GatewayResult<Emission> {
        self.emission(CMD_GET_EDGE_VARIABLE, edge)
    }

    fn edge_travel_time(&mut self, edge: &str) -> GatewayResult<f64> {
        self.get_f64(CMD_GET_EDGE_VARIABLE, VAR_CURRENT_TRAVELTIME, edge)
    }

    fn set_edge_effort(&mut self, edge: &str, effort: f64) -> GatewayResult<()> {
        let mut value = Storage::new();
        value.compound(1).typed_f64(effort);
        self.set(CMD_SET_EDGE_VARIABLE, VAR_EDGE_EFFORT, edge, &value)
    }

    fn add_polygon(&mut self, name: &str, shape: &[Point2], color: Color, filled: bool) -> GatewayResult<()> {
        let mut value = Storage::new();
        value
            .compound(5)
            .typed_string("")
            .typed_color(color)
            .typed_u8(filled as u8)
            .typed_i32(0)
            .typed_polygon(shape);
        self.set(CMD_SET_POLYGON_VARIABLE, ADD, name, &value)
    }

    fn set_polygon_filled(&mut self, name: &str, filled: bool) -> GatewayResult<()> {
        let mut value = Storage::new();
        value.typed_i32(filled as i32);
        self.set(CMD_SET_POLYGON_VARIABLE, VAR_FILL, name, &value)
    }

    fn set_polygon_color(&mut self, name: &str, color: Color) -> GatewayResult<()> {
        let mut value = Storage::new();
        value.typed_color(color);
        self.set(CMD_SET_POLYGON_VARIABLE, VAR_COLOR, name, &value)
    }
}

impl Drop for TraciGateway {
    fn drop(&mut self) {
        if self.stream.is_some() {
            if let Err(e) = self.close() {
                warn!("closing TraCI session on drop failed: {e}");
            }
        }
        self.reap_child(true);
    }
}
