//! N×N area grid over the network boundary.
//!
//! # Layout
//!
//! Cells are numbered row-major with the x index outermost:
//!
//! ```text
//! AreaId = i * n + j        i = column (x), j = row (y)
//! ```
//!
//! Cell `(i, j)` spans `[min_x + i·w, min_x + (i+1)·w) × [min_y + j·h, min_y + (j+1)·h)`.
//! The outer maximum edges belong to the last column/row, so every point of
//! the closed boundary is owned by exactly one cell.

use geo::{Intersects, LineString, Rect};
use serde::{Deserialize, Serialize};

use em_core::{AreaId, Bounds, LaneId, Point2, TlsId};

use crate::{DatasetError, DatasetResult};

// ── Area ──────────────────────────────────────────────────────────────────────

/// One grid cell and the infrastructure associated with it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub id:   AreaId,
    /// `"Area (i,j)"`.
    pub name: String,
    pub i:    u32,
    pub j:    u32,
    pub bounds: Bounds,
    /// Lanes whose centerline touches the cell, ascending.
    pub lanes: Vec<LaneId>,
    /// Traffic lights controlling at least one of `lanes`, ascending.
    pub traffic_lights: Vec<TlsId>,
}

impl Area {
    /// Cell outline, counter-clockwise from the lower-left corner.
    pub fn polygon(&self) -> [Point2; 4] {
        self.bounds.corners()
    }
}

// ── Grid ──────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub bounds:     Bounds,
    /// Cells per side.
    pub resolution: u32,
    /// Indexed by `AreaId`.
    pub areas:      Vec<Area>,
}

/// Partition `bounds` into `n × n` equal cells.
pub fn build_grid(bounds: Bounds, n: u32) -> DatasetResult<Grid> {
    if n == 0 {
        return Err(DatasetError::InvalidGrid("resolution must be at least 1".into()));
    }
    if !bounds.is_valid() {
        return Err(DatasetError::InvalidGrid(format!("degenerate boundary {bounds}")));
    }

    let w = bounds.width() / n as f64;
    let h = bounds.height() / n as f64;
    let edge = |min: f64, max: f64, step: f64, k: u32| {
        if k == n { max } else { min + k as f64 * step }
    };

    let mut areas = Vec::with_capacity((n as usize) * (n as usize));
    for i in 0..n {
        for j in 0..n {
            let id = AreaId(i * n + j);
            areas.push(Area {
                id,
                name: format!("Area ({i},{j})"),
                i,
                j,
                bounds: Bounds::new(
                    edge(bounds.min_x, bounds.max_x, w, i),
                    edge(bounds.min_y, bounds.max_y, h, j),
                    edge(bounds.min_x, bounds.max_x, w, i + 1),
                    edge(bounds.min_y, bounds.max_y, h, j + 1),
                ),
                lanes: Vec::new(),
                traffic_lights: Vec::new(),
            });
        }
    }
    Ok(Grid { bounds, resolution: n, areas })
}

impl Grid {
    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    #[inline]
    pub fn area(&self, id: AreaId) -> &Area {
        &self.areas[id.index()]
    }

    #[inline]
    pub fn id_of(&self, i: u32, j: u32) -> AreaId {
        AreaId(i * self.resolution + j)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Area> {
        self.areas.iter()
    }

    /// Column of `x`, or `None` when outside the closed boundary.
    fn column(&self, x: f64) -> Option<u32> {
        if !(x >= self.bounds.min_x && x <= self.bounds.max_x) {
            return None;
        }
        let n = self.resolution;
        let guess = ((x - self.bounds.min_x) / self.bounds.width() * n as f64).floor();
        let mut i = (guess.max(0.0) as u32).min(n - 1);
        // Settle rounding against the stored cell edges.
        let cols = |i: u32| self.areas[(i * n) as usize].bounds;
        while i > 0 && x < cols(i).min_x {
            i -= 1;
        }
        while i + 1 < n && x >= cols(i + 1).min_x {
            i += 1;
        }
        Some(i)
    }

    fn row(&self, y: f64) -> Option<u32> {
        if !(y >= self.bounds.min_y && y <= self.bounds.max_y) {
            return None;
        }
        let n = self.resolution;
        let guess = ((y - self.bounds.min_y) / self.bounds.height() * n as f64).floor();
        let mut j = (guess.max(0.0) as u32).min(n - 1);
        let rows = |j: u32| self.areas[j as usize].bounds;
        while j > 0 && y < rows(j).min_y {
            j -= 1;
        }
        while j + 1 < n && y >= rows(j + 1).min_y {
            j += 1;
        }
        Some(j)
    }

    /// The single area owning `p`, or `None` outside the boundary.
    pub fn locate(&self, p: Point2) -> Option<AreaId> {
        Some(self.id_of(self.column(p.x)?, self.row(p.y)?))
    }

    /// Half-open ownership test consistent with [`locate`][Self::locate].
    pub fn owns(&self, id: AreaId, p: Point2) -> bool {
        let b = self.area(id).bounds;
        let in_x = p.x >= b.min_x && (p.x < b.max_x || (b.max_x == self.bounds.max_x && p.x == b.max_x));
        let in_y = p.y >= b.min_y && (p.y < b.max_y || (b.max_y == self.bounds.max_y && p.y == b.max_y));
        in_x && in_y
    }

    /// Areas whose closed rectangle may meet `bbox`.  A superset; callers
    /// run the exact test.
    pub fn candidates(&self, bbox: &Bounds) -> Vec<AreaId> {
        let g = &self.bounds;
        if bbox.max_x < g.min_x || bbox.min_x > g.max_x || bbox.max_y < g.min_y || bbox.min_y > g.max_y {
            return Vec::new();
        }
        let n = self.resolution;
        let (Some(i0), Some(i1), Some(j0), Some(j1)) = (
            self.column(bbox.min_x.max(g.min_x)),
            self.column(bbox.max_x.min(g.max_x)),
            self.row(bbox.min_y.max(g.min_y)),
            self.row(bbox.max_y.min(g.max_y)),
        ) else {
            return Vec::new();
        };
        // One extra cell each way covers shapes lying exactly on a shared edge.
        let (i0, j0) = (i0.saturating_sub(1), j0.saturating_sub(1));
        let (i1, j1) = ((i1 + 1).min(n - 1), (j1 + 1).min(n - 1));
        (i0..=i1)
            .flat_map(|i| (j0..=j1).map(move |j| (i, j)))
            .map(|(i, j)| self.id_of(i, j))
            .collect()
    }
}

// ── Association ───────────────────────────────────────────────────────────────

fn to_rect(b: &Bounds) -> Rect<f64> {
    Rect::new((b.min_x, b.min_y), (b.max_x, b.max_y))
}

/// `true` iff the lane centerline `shape` meets the closed cell rectangle.
/// Touching an edge or a corner counts.
pub fn associate(area: &Area, shape: &[Point2]) -> bool {
    match shape {
        [] => false,
        [p] => area.bounds.contains_closed(*p),
        _ => {
            let line: LineString<f64> = shape.iter().map(|p| (p.x, p.y)).collect();
            to_rect(&area.bounds).intersects(&line)
        }
    }
}
