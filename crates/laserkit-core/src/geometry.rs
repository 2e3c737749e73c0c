//! 2D geometry primitives shared by every pipeline phase.
//!
//! Points carry a z value so slice height survives through emission and
//! export, but all geometric predicates here are planar.

use crate::error::{LaserError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric noise floor for lengths and areas.
pub const EPSILON: f64 = 1e-9;

/// Distance under which two points are the same vertex.
pub const POINT_TOLERANCE: f64 = 1e-6;

/// Slack allowed when deciding that one polygon lies inside another.
pub const CONTAINMENT_TOLERANCE: f64 = 1e-4;

/// A point in the XY plane with carried z.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point {
    pub const ORIGIN: Point = Point {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Point at `(x, y, z)`.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Point on the z=0 plane.
    pub fn xy(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Copy moved by `(dx, dy)` in the XY plane. `z` is kept.
    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z,
        }
    }

    /// Squared planar distance.
    pub fn dist_sq_2d(&self, other: &Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }

    /// Planar distance, ignoring z.
    pub fn dist_2d(&self, other: &Point) -> f64 {
        self.dist_sq_2d(other).sqrt()
    }

    /// Whether both coordinates are within `tolerance` of `other`.
    pub fn is_same_2d(&self, other: &Point, tolerance: f64) -> bool {
        self.dist_sq_2d(other) <= tolerance * tolerance
    }

    /// Unit direction from `self` towards `other`, `None` when they coincide.
    pub fn direction_to(&self, other: &Point) -> Option<(f64, f64)> {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let len = (dx * dx + dy * dy).sqrt();
        if len < EPSILON {
            None
        } else {
            Some((dx / len, dy / len))
        }
    }

    /// Move `distance` along the unit direction `dir`.
    pub fn project(&self, dir: (f64, f64), distance: f64) -> Self {
        self.translate(dir.0 * distance, dir.1 * distance)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

/// Axis aligned 2D bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::empty()
    }
}

impl Bounds {
    /// An inverted box that any point will grow.
    pub fn empty() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    /// Smallest box holding `points`. Empty when there are none.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point>) -> Self {
        let mut bounds = Self::empty();
        for point in points {
            bounds.include(point);
        }
        bounds
    }

    /// Grow to include `point`.
    pub fn include(&mut self, point: &Point) {
        self.min_x = self.min_x.min(point.x);
        self.min_y = self.min_y.min(point.y);
        self.max_x = self.max_x.max(point.x);
        self.max_y = self.max_y.max(point.y);
    }

    /// True until a point has been included.
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    pub fn width(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max_x - self.min_x
        }
    }

    pub fn height(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max_y - self.min_y
        }
    }

    /// Area of the box, or zero when empty.
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// True when `other` fits inside this box, allowing `tolerance` slack.
    pub fn contains(&self, other: &Bounds, tolerance: f64) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && other.min_x >= self.min_x - tolerance
            && other.min_y >= self.min_y - tolerance
            && other.max_x <= self.max_x + tolerance
            && other.max_y <= self.max_y + tolerance
    }
}

/// A closed (or, for drag-knife output, open) polyline with nested holes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polygon {
    pub points: Vec<Point>,
    /// Open polygons are not closed back to their first point when cut.
    #[serde(default)]
    pub open: bool,
    /// Holes directly inside this polygon.
    #[serde(default)]
    pub inner: Vec<Polygon>,
}

impl Polygon {
    /// Closed polygon with no holes.
    pub fn new(points: Vec<Point>) -> Self {
        Self {
            points,
            open: false,
            inner: Vec::new(),
        }
    }

    /// Open polyline, cut without returning to the start.
    pub fn new_open(points: Vec<Point>) -> Self {
        Self {
            points,
            open: true,
            inner: Vec::new(),
        }
    }

    /// Build a closed polygon from planar coordinates at height `z`.
    pub fn from_xy(coords: &[(f64, f64)], z: f64) -> Self {
        Self::new(coords.iter().map(|&(x, y)| Point::new(x, y, z)).collect())
    }

    /// Replace the holes.
    pub fn with_inner(mut self, inner: Vec<Polygon>) -> Self {
        self.inner = inner;
        self
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Height of the first vertex, or zero when empty.
    pub fn z(&self) -> f64 {
        self.points.first().map_or(0.0, |p| p.z)
    }

    /// Signed shoelace area of the outer ring. Positive when counter-clockwise.
    pub fn area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut sum = 0.0;
        for i in 0..n {
            let a = &self.points[i];
            let b = &self.points[(i + 1) % n];
            sum += a.x * b.y - b.x * a.y;
        }
        sum / 2.0
    }

    pub fn is_clockwise(&self) -> bool {
        self.area() < 0.0
    }

    /// Reverse the ring if needed so it winds clockwise.
    pub fn set_clockwise(&mut self) {
        if !self.is_clockwise() {
            self.points.reverse();
        }
    }

    /// Reverse the ring if needed so it winds counter-clockwise.
    pub fn set_counter_clockwise(&mut self) {
        if self.is_clockwise() {
            self.points.reverse();
        }
    }

    /// Planar bounds of the outer ring.
    pub fn bounds(&self) -> Bounds {
        Bounds::from_points(&self.points)
    }

    /// Drop consecutive duplicate vertices, including a repeated closing vertex.
    pub fn dedup(&mut self, tolerance: f64) {
        self.points.dedup_by(|b, a| a.is_same_2d(b, tolerance));
        while self.points.len() > 1 {
            let first = self.points[0];
            match self.points.last() {
                Some(last) if last.is_same_2d(&first, tolerance) => {
                    self.points.pop();
                }
                _ => break,
            }
        }
    }

    /// Drop vertices that lie on the straight line between their neighbours.
    pub fn remove_collinear(&mut self, tolerance: f64) {
        if self.points.len() < 4 {
            return;
        }
        let mut changed = true;
        while changed && self.points.len() > 3 {
            changed = false;
            let n = self.points.len();
            for i in 0..n {
                let prev = self.points[(i + n - 1) % n];
                let cur = self.points[i];
                let next = self.points[(i + 1) % n];
                if segment_distance(&cur, &prev, &next) <= tolerance {
                    self.points.remove(i);
                    changed = true;
                    break;
                }
            }
        }
    }

    /// Fails with [`LaserError::GeometryDegenerate`] when the outer ring can't be cut.
    pub fn validate(&self) -> Result<()> {
        let mut distinct = self.clone();
        distinct.inner.clear();
        distinct.dedup(POINT_TOLERANCE);
        if distinct.len() < 3 {
            return Err(LaserError::GeometryDegenerate(format!(
                "polygon has {} distinct points",
                distinct.len()
            )));
        }
        if !self.open && distinct.area().abs() < EPSILON {
            return Err(LaserError::GeometryDegenerate(
                "polygon encloses no area".to_string(),
            ));
        }
        Ok(())
    }

    /// Even-odd ray cast against the outer ring only.
    pub fn contains_point(&self, point: &Point) -> bool {
        let pts = &self.points;
        let n = pts.len();
        if n < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let (pi, pj) = (&pts[i], &pts[j]);
            if (pi.y > point.y) != (pj.y > point.y)
                && point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x
            {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    /// Shortest distance from `point` to the outer ring's edges.
    pub fn distance_to_boundary(&self, point: &Point) -> f64 {
        let n = self.points.len();
        match n {
            0 => f64::INFINITY,
            1 => point.dist_2d(&self.points[0]),
            _ => (0..n)
                .map(|i| segment_distance(point, &self.points[i], &self.points[(i + 1) % n]))
                .fold(f64::INFINITY, f64::min),
        }
    }

    /// True when every vertex of `self` lies inside `other` or on its boundary.
    pub fn is_inside(&self, other: &Polygon) -> bool {
        if self.is_empty() || other.len() < 3 {
            return false;
        }
        if !other
            .bounds()
            .contains(&self.bounds(), CONTAINMENT_TOLERANCE)
        {
            return false;
        }
        self.points.iter().all(|p| {
            other.contains_point(p) || other.distance_to_boundary(p) <= CONTAINMENT_TOLERANCE
        })
    }

    /// Same vertex set and area within `tolerance`, regardless of start vertex or winding.
    pub fn is_equivalent(&self, other: &Polygon, tolerance: f64) -> bool {
        if self.len() != other.len() || self.open != other.open {
            return false;
        }
        let (a, b) = (self.area().abs(), other.area().abs());
        if (a - b).abs() > tolerance * a.max(b).max(1.0) {
            return false;
        }
        self.points
            .iter()
            .all(|p| other.points.iter().any(|q| p.is_same_2d(q, tolerance)))
    }

    /// This polygon and all nested holes as simple polygons, outer first.
    pub fn flatten(&self) -> Vec<Polygon> {
        let mut out = Vec::new();
        self.flatten_into(&mut out);
        out
    }

    /// Push this polygon and its holes onto `out`, as in [`flatten`](Self::flatten).
    pub fn flatten_into(&self, out: &mut Vec<Polygon>) {
        out.push(Polygon {
            points: self.points.clone(),
            open: self.open,
            inner: Vec::new(),
        });
        for hole in &self.inner {
            hole.flatten_into(out);
        }
    }

    /// Index of the vertex closest to `point`.
    pub fn nearest_index(&self, point: &Point) -> usize {
        self.points
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.dist_sq_2d(point).total_cmp(&b.dist_sq_2d(point)))
            .map_or(0, |(i, _)| i)
    }
}

fn segment_distance(p: &Point, a: &Point, b: &Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq < EPSILON * EPSILON {
        return p.dist_2d(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.dist_2d(&Point::xy(a.x + t * dx, a.y + t * dy))
}

/// Organise flat closed loops into outer polygons with holes.
///
/// Each loop's parent is the smallest loop that contains it. Loops at even
/// nesting depth become top-level outers (counter-clockwise); loops at odd
/// depth become holes (clockwise) of their parent. Islands inside holes are
/// therefore returned as new top-level polygons.
pub fn nest(polygons: Vec<Polygon>) -> Vec<Polygon> {
    let mut loops: Vec<Polygon> = polygons
        .into_iter()
        .filter(|p| p.len() >= 3)
        .map(|mut p| {
            p.inner.clear();
            p
        })
        .collect();
    loops.sort_by(|a, b| b.area().abs().total_cmp(&a.area().abs()));

    let n = loops.len();
    let mut parent: Vec<Option<usize>> = vec![None; n];
    let mut depth = vec![0usize; n];
    for i in 0..n {
        // sorted by decreasing area, so the nearest container is the tightest one
        for j in (0..i).rev() {
            if loops[i].is_inside(&loops[j]) {
                parent[i] = Some(j);
                depth[i] = depth[j] + 1;
                break;
            }
        }
    }

    let mut slots: Vec<Option<Polygon>> = loops.into_iter().map(Some).collect();
    let mut holes: Vec<Vec<Polygon>> = vec![Vec::new(); n];
    for i in 0..n {
        if depth[i] % 2 == 1 {
            if let (Some(p), Some(mut hole)) = (parent[i], slots[i].take()) {
                hole.set_clockwise();
                holes[p].push(hole);
            }
        }
    }

    let mut tops = Vec::new();
    for i in 0..n {
        if let Some(mut outer) = slots[i].take() {
            outer.set_counter_clockwise();
            outer.inner = std::mem::take(&mut holes[i]);
            tops.push(outer);
        }
    }
    tops
}
