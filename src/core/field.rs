//! Point field: a jittered grid of anchor points covering the viewport.
//!
//! Each cell of the grid gets exactly one point, placed uniformly at random
//! inside the cell. A point's `origin` is its anchor; `x`/`y` drift around it
//! (see [`crate::motion`]). Neighbour lists are indices into the same
//! `points` vector, so they can never outlive or escape the field that built
//! them.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::{FieldConfig, SpacingPolicy};
use crate::neighbors::build_neighbor_index;
use crate::prng::Prng;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Squared Euclidean distance. Only ever used for ordering and thresholds,
/// so the square root is never taken.
#[inline]
pub fn dist_sq(a: Vec2, b: Vec2) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    dx * dx + dy * dy
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub origin_x: f64,
    pub origin_y: f64,
    /// Indices of neighbouring points in the owning field.
    pub closest: Vec<usize>,
    /// Line opacity for the current frame.
    pub active_line: f64,
    /// Dot opacity for the current frame.
    pub active_dot: f64,
    pub radius: f64,
}

impl Point {
    pub fn new(x: f64, y: f64, radius: f64) -> Self {
        Self {
            x,
            y,
            origin_x: x,
            origin_y: y,
            closest: Vec::new(),
            active_line: 0.0,
            active_dot: 0.0,
            radius,
        }
    }

    #[inline]
    pub fn pos(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    #[inline]
    pub fn origin(&self) -> Vec2 {
        Vec2::new(self.origin_x, self.origin_y)
    }
}

/// The full set of points for one viewport, plus the focal target.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Field {
    pub points: Vec<Point>,
    pub target: Vec2,
    pub width: f64,
    pub height: f64,
    /// Bumped on every regeneration; motion state bound to an older value
    /// must not write into this field.
    pub generation: u64,
}

impl Field {
    pub fn empty(width: f64, height: f64, generation: u64) -> Self {
        Self {
            points: Vec::new(),
            target: Vec2::new(width / 2.0, height / 2.0),
            width,
            height,
            generation,
        }
    }

    /// Generate points and their neighbour lists in one go. The returned
    /// field is complete; nothing observes it half-built.
    pub fn generate(
        width: f64,
        height: f64,
        cfg: &FieldConfig,
        rng: &mut Prng,
        generation: u64,
    ) -> Self {
        let mut field = Self::empty(width, height, generation);
        field.points = generate_points(width, height, &cfg.spacing, cfg.dot_radius, rng);
        build_neighbor_index(&mut field.points, cfg.neighbor_count);
        field
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Neighbour positions of point `idx`, in list order.
    pub fn neighbor_positions(&self, idx: usize) -> impl Iterator<Item = Vec2> + '_ {
        self.points[idx]
            .closest
            .iter()
            .map(move |&j| self.points[j].pos())
    }
}

/// Lay out one jittered point per grid cell.
///
/// Columns are walked outermost, rows inner, matching the neighbour builder's
/// expected encounter order. Non-positive dimensions or cell sizes yield an
/// empty vector.
pub fn generate_points(
    width: f64,
    height: f64,
    spacing: &SpacingPolicy,
    dot_radius: (f64, f64),
    rng: &mut Prng,
) -> Vec<Point> {
    let (sx, sy) = spacing.cell_size(width, height);
    if !(width > 0.0 && height > 0.0 && sx > 0.0 && sy > 0.0) {
        return Vec::new();
    }

    let cols = (width / sx).ceil() as usize;
    let rows = (height / sy).ceil() as usize;
    let mut points = Vec::with_capacity(cols * rows);

    for c in 0..cols {
        let x = c as f64 * sx;
        for r in 0..rows {
            let y = r as f64 * sy;
            let px = x + rng.next_f64() * sx;
            let py = y + rng.next_f64() * sy;
            let radius = rng.gen_range_f64(dot_radius.0, dot_radius.1);
            points.push(Point::new(px, py, radius));
        }
    }
    points
}
