//! `em-traci`: the boundary to the traffic simulation engine.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                   |
//! |---------------|------------------------------------------------------------|
//! | [`gateway`]   | `Gateway` trait, `Launcher` trait, `Color`, `ScenarioSpec` |
//! | [`codec`]     | TraCI byte storage: writer, reader, command framing        |
//! | [`constants`] | TraCI command, variable and type identifiers               |
//! | [`client`]    | `TraciGateway`: `Gateway` over a TraCI TCP connection      |
//! | [`launcher`]  | `SumoLauncher`: spawns the engine and connects             |
//! | [`scripted`]  | `ScriptedGateway`, `ScriptedLauncher`: in-memory engine    |
//! | [`error`]     | `GatewayError`, `GatewayResult<T>`                         |
//!
//! Every session is strictly sequential: step N+1 depends on step N, so the
//! trait takes `&mut self` everywhere and is never shared between threads.

pub mod client;
pub mod codec;
pub mod constants;
pub mod error;
pub mod gateway;
pub mod launcher;
pub mod scripted;


pub use client::TraciGateway;
pub use error::{GatewayError, GatewayResult};
pub use gateway::{Color, Gateway, Launcher, ScenarioSpec};
pub use launcher::SumoLauncher;
pub use scripted::{ScriptedGateway, ScriptedLauncher, ScriptedWorld, VehicleSample};
