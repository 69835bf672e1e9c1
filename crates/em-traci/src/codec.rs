//! TraCI byte storage.
//!
//! # Framing
//!
//! ```text
//! message  := i32 total_len (including these 4 bytes) command*
//! command  := u8 len  u8 id  content          (len = 2 + |content| <= 255)
//!           | u8 0  i32 len  u8 id  content   (len = 6 + |content|)
//! response := status [result-command]
//! status   := command with content  u8 result  string description
//! ```
//!
//! All integers and doubles are big-endian.  Strings are an `i32` length
//! followed by the bytes.  A *typed* value is prefixed with its type byte
//! (see [`constants`][crate::constants]).

use em_core::{Logic, Phase, Point2};

use crate::constants::*;
use crate::{Color, GatewayError, GatewayResult};

// ── Writer ────────────────────────────────────────────────────────────────────

/// Append-only byte buffer with TraCI encoders.
#[derive(Default, Debug, Clone)]
pub struct Storage {
    buf: Vec<u8>,
}

impl Storage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    pub fn i32(&mut self, v: i32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn f64(&mut self, v: f64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn string(&mut self, s: &str) -> &mut Self {
        self.i32(s.len() as i32);
        self.buf.extend_from_slice(s.as_bytes());
        self
    }

    pub fn typed_u8(&mut self, v: u8) -> &mut Self {
        self.u8(TYPE_UBYTE).u8(v)
    }

    pub fn typed_i32(&mut self, v: i32) -> &mut Self {
        self.u8(TYPE_INTEGER).i32(v)
    }

    pub fn typed_f64(&mut self, v: f64) -> &mut Self {
        self.u8(TYPE_DOUBLE).f64(v)
    }

    pub fn typed_string(&mut self, s: &str) -> &mut Self {
        self.u8(TYPE_STRING).string(s)
    }

    pub fn typed_string_list<S: AsRef<str>>(&mut self, items: &[S]) -> &mut Self {
        self.u8(TYPE_STRINGLIST).i32(items.len() as i32);
        for s in items {
            self.string(s.as_ref());
        }
        self
    }

    /// Compound header: the items follow as typed values.
    pub fn compound(&mut self, items: i32) -> &mut Self {
        self.u8(TYPE_COMPOUND).i32(items)
    }

    pub fn typed_color(&mut self, c: Color) -> &mut Self {
        self.u8(TYPE_COLOR).u8(c.r).u8(c.g).u8(c.b).u8(c.a)
    }

    pub fn typed_polygon(&mut self, shape: &[Point2]) -> &mut Self {
        self.u8(TYPE_POLYGON);
        if shape.len() < 256 {
            self.u8(shape.len() as u8);
        } else {
            self.u8(0).i32(shape.len() as i32);
        }
        for p in shape {
            self.f64(p.x).f64(p.y);
        }
        self
    }

    /// A complete signal program as accepted by `TL_COMPLETE_PROGRAM_RYG`.
    pub fn typed_logic(&mut self, logic: &Logic) -> &mut Self {
        self.compound(5)
            .typed_string(&logic.program_id)
            .typed_i32(logic.kind)
            .typed_i32(logic.current_phase_index)
            .compound(logic.phases.len() as i32);
        for phase in &logic.phases {
            self.compound(6)
                .typed_f64(phase.duration)
                .typed_string(&phase.state)
                .typed_f64(phase.min_duration)
                .typed_f64(phase.max_duration)
                .compound(phase.next.len() as i32);
            for &n in &phase.next {
                self.typed_i32(n);
            }
            self.typed_string(&phase.name);
        }
        self.compound(logic.parameters.len() as i32);
        for (key, value) in &logic.parameters {
            self.typed_string_list(&[key.as_str(), value.as_str()]);
        }
        self
    }
}

// ── Framing ───────────────────────────────────────────────────────────────────

/// Frame one command, switching to the extended length form when needed.
pub fn command(id: u8, content: &[u8]) -> Vec<u8> {
    let len = 2 + content.len();
    let mut out = Vec::with_capacity(len + 4);
    if len <= 255 {
        out.push(len as u8);
    } else {
        out.push(0);
        out.extend_from_slice(&((len + 4) as i32).to_be_bytes());
    }
    out.push(id);
    out.extend_from_slice(content);
    out
}

/// Wrap framed commands into one message.
pub fn message(commands: &[Vec<u8>]) -> Vec<u8> {
    let body: usize = commands.iter().map(Vec::len).sum();
    let mut out = Vec::with_capacity(body + 4);
    out.extend_from_slice(&((body + 4) as i32).to_be_bytes());
    for c in commands {
        out.extend_from_slice(c);
    }
    out
}

/// `get` command: variable id + object id.
pub fn get_command(domain: u8, variable: u8, object: &str) -> Vec<u8> {
    let mut s = Storage::new();
    s.u8(variable).string(object);
    command(domain, s.as_bytes())
}

/// `set` command: variable id + object id + typed value.
pub fn set_command(domain: u8, variable: u8, object: &str, value: &Storage) -> Vec<u8> {
    let mut s = Storage::new();
    s.u8(variable).string(object);
    s.buf.extend_from_slice(value.as_bytes());
    command(domain, s.as_bytes())
}

// ── Reader ────────────────────────────────────────────────────────────────────

/// Cursor over a received message body.
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> GatewayResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(GatewayError::Protocol(format!(
                "unexpected end of message: wanted {n} bytes at offset {}, {} left",
                self.pos,
                self.remaining()
            )));
        }
        let buf = self.buf;
        let slice = &buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn u8(&mut self) -> GatewayResult<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn i32(&mut self) -> GatewayResult<i32> {
        let mut b = [0u8; 4];
        b.copy_from_slice(self.take(4)?);
        Ok(i32::from_be_bytes(b))
    }

    pub fn f64(&mut self) -> GatewayResult<f64> {
        let mut b = [0u8; 8];
        b.copy_from_slice(self.take(8)?);
        Ok(f64::from_be_bytes(b))
    }

    fn count(&mut self) -> GatewayResult<usize> {
        let n = self.i32()?;
        usize::try_from(n).map_err(|_| GatewayError::Protocol(format!("negative length {n}")))
    }

    pub fn string(&mut self) -> GatewayResult<String> {
        let len = self.count()?;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| GatewayError::Protocol(format!("invalid UTF-8 in string: {e}")))
    }

    pub fn string_list(&mut self) -> GatewayResult<Vec<String>> {
        let n = self.count()?;
        (0..n).map(|_| self.string()).collect()
    }

    pub fn expect_type(&mut self, expected: u8) -> GatewayResult<()> {
        let got = self.u8()?;
        if got != expected {
            return Err(GatewayError::Protocol(format!(
                "expected type 0x{expected:02x}, got 0x{got:02x}"
            )));
        }
        Ok(())
    }

    pub fn typed_i32(&mut self) -> GatewayResult<i32> {
        self.expect_type(TYPE_INTEGER)?;
        self.i32()
    }

    pub fn typed_f64(&mut self) -> GatewayResult<f64> {
        self.expect_type(TYPE_DOUBLE)?;
        self.f64()
    }

    pub fn typed_string(&mut self) -> GatewayResult<String> {
        self.expect_type(TYPE_STRING)?;
        self.string()
    }

    pub fn typed_string_list(&mut self) -> GatewayResult<Vec<String>> {
        self.expect_type(TYPE_STRINGLIST)?;
        self.string_list()
    }

    /// Compound header; returns the item count.
    pub fn compound(&mut self) -> GatewayResult<usize> {
        self.expect_type(TYPE_COMPOUND)?;
        self.count()
    }

    fn compound_of(&mut self, expected: usize, what: &str) -> GatewayResult<()> {
        let n = self.compound()?;
        if n != expected {
            return Err(GatewayError::Protocol(format!("{what}: expected {expected} items, got {n}")));
        }
        Ok(())
    }

    pub fn typed_position(&mut self) -> GatewayResult<Point2> {
        self.expect_type(POSITION_2D)?;
        Ok(Point2::new(self.f64()?, self.f64()?))
    }

    pub fn typed_polygon(&mut self) -> GatewayResult<Vec<Point2>> {
        self.expect_type(TYPE_POLYGON)?;
        let mut n = self.u8()? as usize;
        if n == 0 {
            n = self.count()?;
        }
        (0..n)
            .map(|_| -> GatewayResult<Point2> { Ok(Point2::new(self.f64()?, self.f64()?)) })
            .collect()
    }

    /// Network boundary: either a two-point polygon or a legacy bounding box.
    pub fn typed_boundary(&mut self) -> GatewayResult<(Point2, Point2)> {
        match self.u8()? {
            TYPE_BOUNDINGBOX => {
                let lo = Point2::new(self.f64()?, self.f64()?);
                let hi = Point2::new(self.f64()?, self.f64()?);
                Ok((lo, hi))
            }
            TYPE_POLYGON => {
                self.pos -= 1;
                let pts = self.typed_polygon()?;
                match pts.as_slice() {
                    [lo, hi] => Ok((*lo, *hi)),
                    _ => Err(GatewayError::Protocol(format!(
                        "network boundary has {} points, expected 2",
                        pts.len()
                    ))),
                }
            }
            other => Err(GatewayError::Protocol(format!("unexpected boundary type 0x{other:02x}"))),
        }
    }

    /// Decode the answer to `TL_COMPLETE_DEFINITION_RYG`.
    pub fn typed_logics(&mut self) -> GatewayResult<Vec<Logic>> {
        let n_logics = self.compound()?;
        let mut logics = Vec::with_capacity(n_logics);
        for _ in 0..n_logics {
            self.compound_of(5, "signal program")?;
            let program_id = self.typed_string()?;
            let kind = self.typed_i32()?;
            let current_phase_index = self.typed_i32()?;

            let n_phases = self.compound()?;
            let mut phases = Vec::with_capacity(n_phases);
            for _ in 0..n_phases {
                self.compound_of(6, "signal phase")?;
                let duration = self.typed_f64()?;
                let state = self.typed_string()?;
                let min_duration = self.typed_f64()?;
                let max_duration = self.typed_f64()?;
                let n_next = self.compound()?;
                let next = (0..n_next).map(|_| self.typed_i32()).collect::<GatewayResult<_>>()?;
                let name = self.typed_string()?;
                phases.push(Phase { duration, min_duration, max_duration, state, next, name });
            }

            let n_params = self.compound()?;
            let mut parameters = Vec::with_capacity(n_params);
            for _ in 0..n_params {
                let mut kv = self.typed_string_list()?;
                if kv.len() != 2 {
                    return Err(GatewayError::Protocol(format!(
                        "program parameter has {} entries, expected 2",
                        kv.len()
                    )));
                }
                let value = kv.pop().unwrap_or_default();
                let key = kv.pop().unwrap_or_default();
                parameters.push((key, value));
            }

            logics.push(Logic { program_id, kind, current_phase_index, phases, parameters });
        }
        Ok(logics)
    }

    /// Command header; returns `(id, content_len)`.
    pub fn command_header(&mut self) -> GatewayResult<(u8, usize)> {
        let short = self.u8()? as usize;
        let content_len = if short == 0 {
            let ext = self.count()?;
            ext.checked_sub(6)
        } else {
            short.checked_sub(2)
        }
        .ok_or_else(|| GatewayError::Protocol("command length too small".into()))?;
        Ok((self.u8()?, content_len))
    }

    /// Consume a status response for `command`, failing on a non-OK result.
    pub fn status(&mut self, command: u8) -> GatewayResult<()> {
        let (id, _) = self.command_header()?;
        if id != command {
            return Err(GatewayError::Protocol(format!(
                "status for 0x{id:02x}, expected 0x{command:02x}"
            )));
        }
        let result = self.u8()?;
        let description = self.string()?;
        if result != RTYPE_OK {
            return Err(GatewayError::Command { command, message: description });
        }
        Ok(())
    }

    /// Consume the status and result header of a `get` answer, leaving the
    /// cursor on the value's type byte.
    pub fn get_response(&mut self, domain: u8, variable: u8, object: &str) -> GatewayResult<()> {
        self.status(domain)?;
        let (id, _) = self.command_header()?;
        if id != domain + RESPONSE_OFFSET {
            return Err(GatewayError::Protocol(format!(
                "response 0x{id:02x} does not answer 0x{domain:02x}"
            )));
        }
        let var = self.u8()?;
        let obj = self.string()?;
        if var != variable || obj != object {
            return Err(GatewayError::Protocol(format!(
                "response for variable 0x{var:02x} of {obj:?}, expected 0x{variable:02x} of {object:?}"
            )));
        }
        Ok(())
    }
}
