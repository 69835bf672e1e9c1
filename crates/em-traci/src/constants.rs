//! TraCI protocol identifiers used by [`TraciGateway`][crate::TraciGateway].
//!
//! Values follow the engine's `TraCIConstants`; only the subset this
//! workspace needs is listed.

// ── Commands ──────────────────────────────────────────────────────────────────

pub const CMD_SIMSTEP: u8 = 0x02;
pub const CMD_CLOSE:   u8 = 0x7f;

pub const CMD_GET_TL_VARIABLE:      u8 = 0xa2;
pub const CMD_GET_LANE_VARIABLE:    u8 = 0xa3;
pub const CMD_GET_VEHICLE_VARIABLE: u8 = 0xa4;
pub const CMD_GET_EDGE_VARIABLE:    u8 = 0xaa;
pub const CMD_GET_SIM_VARIABLE:     u8 = 0xab;

pub const CMD_SET_TL_VARIABLE:      u8 = 0xc2;
pub const CMD_SET_LANE_VARIABLE:    u8 = 0xc3;
pub const CMD_SET_VEHICLE_VARIABLE: u8 = 0xc4;
pub const CMD_SET_POLYGON_VARIABLE: u8 = 0xc8;
pub const CMD_SET_EDGE_VARIABLE:    u8 = 0xca;

/// Offset between a get command and its response command.
pub const RESPONSE_OFFSET: u8 = 0x10;

// ── Result codes ──────────────────────────────────────────────────────────────

pub const RTYPE_OK: u8 = 0x00;

// ── Data types ────────────────────────────────────────────────────────────────

pub const POSITION_2D:      u8 = 0x01;
pub const TYPE_BOUNDINGBOX: u8 = 0x05;
pub const TYPE_POLYGON:     u8 = 0x06;
pub const TYPE_UBYTE:       u8 = 0x07;
pub const TYPE_INTEGER:     u8 = 0x09;
pub const TYPE_DOUBLE:      u8 = 0x0b;
pub const TYPE_STRING:      u8 = 0x0c;
pub const TYPE_STRINGLIST:  u8 = 0x0e;
pub const TYPE_COMPOUND:    u8 = 0x0f;
pub const TYPE_COLOR:       u8 = 0x11;

// ── Variables ─────────────────────────────────────────────────────────────────

pub const ID_LIST: u8 = 0x00;

pub const LAST_STEP_VEHICLE_NUMBER: u8 = 0x10;
pub const TL_CONTROLLED_LANES:      u8 = 0x26;
pub const TL_COMPLETE_DEFINITION_RYG: u8 = 0x2b;
pub const TL_COMPLETE_PROGRAM_RYG:  u8 = 0x2c;
pub const LANE_EDGE_ID:             u8 = 0x31;
pub const LANE_ALLOWED:             u8 = 0x34;
pub const LANE_DISALLOWED:          u8 = 0x35;
pub const VAR_MAXSPEED:             u8 = 0x41;
pub const VAR_POSITION:             u8 = 0x42;
pub const VAR_COLOR:                u8 = 0x45;
pub const VAR_SHAPE:                u8 = 0x4e;
pub const VAR_FILL:                 u8 = 0x55;
pub const VAR_EDGE_EFFORT:          u8 = 0x59;
pub const VAR_CURRENT_TRAVELTIME:   u8 = 0x5a;
pub const VAR_CO2EMISSION:          u8 = 0x60;
pub const VAR_COEMISSION:           u8 = 0x61;
pub const VAR_HCEMISSION:           u8 = 0x62;
pub const VAR_PMXEMISSION:          u8 = 0x63;
pub const VAR_NOXEMISSION:          u8 = 0x64;
pub const VAR_NET_BOUNDING_BOX:     u8 = 0x7c;
pub const ADD:                      u8 = 0x80;
pub const CMD_REROUTE_EFFORT:       u8 = 0x91;
