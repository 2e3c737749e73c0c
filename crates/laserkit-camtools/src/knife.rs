//! Drag-knife corner compensation.
//!
//! A drag knife trails its pivot by a fixed tip offset, so sharp corners
//! have to be swept: at each corner the pivot walks an arc of radius `tip`
//! around the vertex in 5° steps until the blade faces the next edge. Paths
//! get a lead-in from the left and a lead-out past the end so the blade is
//! aligned before it reaches the part.

use laserkit_core::{Point, Polygon, Result, POINT_TOLERANCE};
use tracing::warn;

/// Arc step between swept blade directions, in degrees.
pub const ANGLE_STEP: f64 = 5.0;

/// Turns smaller than this are cut straight through, in degrees.
pub const MIN_CORNER_ANGLE: f64 = 10.0;

/// Unit direction in the XY plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slope {
    pub dx: f64,
    pub dy: f64,
}

impl Slope {
    /// Unit direction from `from` to `to`, or `None` when the points coincide.
    pub fn between(from: &Point, to: &Point) -> Option<Self> {
        from.direction_to(to).map(|(dx, dy)| Self { dx, dy })
    }

    /// Unit direction at `degrees` counter-clockwise from +X.
    pub fn from_angle(degrees: f64) -> Self {
        let rad = degrees.to_radians();
        Self {
            dx: rad.cos(),
            dy: rad.sin(),
        }
    }

    /// Direction angle in degrees, in `(-180, 180]`.
    pub fn angle(&self) -> f64 {
        self.dy.atan2(self.dx).to_degrees()
    }

    /// Signed turn from `self` to `to` in degrees, in `(-180, 180]`.
    /// Negative turns are clockwise.
    pub fn angle_diff(&self, to: &Slope) -> f64 {
        let mut diff = to.angle() - self.angle();
        while diff > 180.0 {
            diff -= 360.0;
        }
        while diff <= -180.0 {
            diff += 360.0;
        }
        // keeps exact right angles exact
        (diff * 1e9).round() / 1e9
    }

    fn as_tuple(&self) -> (f64, f64) {
        (self.dx, self.dy)
    }
}

/// Append the swept blade positions around `center` turning from `s1` to `s2`.
fn arc(center: &Point, s1: &Slope, s2: &Slope, tip: f64, out: &mut Vec<Point>) {
    let diff = s1.angle_diff(s2);
    let mut ticks = (diff / ANGLE_STEP).floor().abs() as usize;
    let dir = diff.signum();
    let off = (diff % ANGLE_STEP) / 2.0;

    if off == 0.0 {
        ticks += 1;
    } else {
        out.push(center.project(s1.as_tuple(), tip));
    }

    let mut angle = s1.angle();
    for _ in 0..ticks {
        out.push(center.project(Slope::from_angle(angle + off).as_tuple(), tip));
        angle += ANGLE_STEP * dir;
    }
    out.push(center.project(s2.as_tuple(), tip));
}

/// Rewrite a closed polygon as an open drag-knife path.
///
/// The path is wound clockwise, starts at its leftmost vertex (highest on
/// ties) with a lead-in from `(-tip, 0)`, sweeps every corner turning by at
/// least [`MIN_CORNER_ANGLE`] whose outgoing edge is at least `tip` long, and
/// ends with a lead-out along the last edge followed by a `+tip` step in x.
/// Corners with a shorter outgoing edge are cut without compensation.
pub fn add_knife_radii(polygon: &Polygon, tip: f64) -> Result<Polygon> {
    let mut ring = Polygon::new(polygon.points.clone());
    ring.dedup(POINT_TOLERANCE);
    ring.validate()?;
    ring.set_clockwise();

    let start = ring
        .points
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.x.total_cmp(&b.x).then(b.y.total_cmp(&a.y)))
        .map_or(0, |(i, _)| i);
    ring.points.rotate_left(start);

    let pts = &ring.points;
    let n = pts.len();
    let first = pts[0];

    let lead_in = first.translate(-tip, 0.0);
    let mut last_sl = Slope { dx: 1.0, dy: 0.0 };
    let mut last_pt = first;
    let mut out = vec![lead_in, first];

    for i in 1..=n {
        let next = pts[i % n];
        let Some(next_sl) = Slope::between(&last_pt, &next) else {
            continue;
        };
        if last_sl.angle_diff(&next_sl).abs() >= MIN_CORNER_ANGLE
            && last_pt.dist_2d(&next) >= tip
        {
            arc(&last_pt, &last_sl, &next_sl, tip, &mut out);
        }
        out.push(next);
        last_sl = next_sl;
        last_pt = next;
    }

    let tail = last_pt.project(last_sl.as_tuple(), tip);
    out.push(tail);
    out.push(tail.translate(tip, 0.0));

    Ok(Polygon::new_open(out))
}

/// Knife paths for an outer polygon and its holes. Degenerate rings are
/// dropped with a warning; `None` when the outer ring itself is unusable.
pub fn knife_tree(polygon: &Polygon, tip: f64) -> Option<Polygon> {
    let outer = match add_knife_radii(polygon, tip) {
        Ok(outer) => outer,
        Err(e) => {
            warn!("Skipping knife path at z={:.3}: {}", polygon.z(), e);
            return None;
        }
    };
    let inner = polygon
        .inner
        .iter()
        .filter_map(|hole| match add_knife_radii(hole, tip) {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Skipping knife hole at z={:.3}: {}", hole.z(), e);
                None
            }
        })
        .collect();
    Some(outer.with_inner(inner))
}
