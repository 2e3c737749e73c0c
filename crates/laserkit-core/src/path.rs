//! Cut path streams.
//!
//! A [`PathGroup`] is the unit the packer places and the exporters walk: a
//! flat list of travel and cut points for one layer, or for a whole job when
//! layers are grouped or merged.

use crate::geometry::{Bounds, Point};
use serde::{Deserialize, Serialize};

/// One vertex of a cut path stream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub point: Point,
    /// `false` for a travel move, `true` for a cutting move.
    pub emit: bool,
    /// Thickness of the layer this point came from.
    pub thick: f64,
    /// Pen/power index. 1 for cuts, 2 for marks, depth when merged.
    pub color: u32,
}

impl PathPoint {
    /// Travel move to `point`. The laser is off.
    pub fn travel(point: Point, thick: f64) -> Self {
        Self {
            point,
            emit: false,
            thick,
            color: 0,
        }
    }

    /// Cut to `point` in `color`.
    pub fn cut(point: Point, thick: f64, color: u32) -> Self {
        Self {
            point,
            emit: true,
            thick,
            color,
        }
    }
}

/// Ordered travel/cut stream plus its packing footprint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathGroup {
    pub points: Vec<PathPoint>,
    pub thick: f64,
    /// Footprint width, valid after [`PathGroup::normalize`].
    pub width: f64,
    /// Footprint height, valid after [`PathGroup::normalize`].
    pub height: f64,
    /// Packed position of the footprint's lower-left corner.
    pub fit: Option<Point>,
}

impl PathGroup {
    /// Empty group for layers of thickness `thick`.
    pub fn new(thick: f64) -> Self {
        Self {
            thick,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Append a point. Bounds are refreshed by [`normalize`](Self::normalize).
    pub fn push(&mut self, point: PathPoint) {
        self.points.push(point);
    }

    /// Planar bounds of every point.
    pub fn bounds(&self) -> Bounds {
        Bounds::from_points(self.points.iter().map(|p| &p.point))
    }

    /// Number of cut runs, i.e. polygons the exporters will see.
    pub fn cut_runs(&self) -> usize {
        let mut runs = 0;
        let mut in_run = false;
        for p in &self.points {
            if p.emit && !in_run {
                runs += 1;
            }
            in_run = p.emit;
        }
        runs
    }

    /// Shift the group so its bounding box starts at the origin and record its size.
    pub fn normalize(&mut self) {
        let bounds = self.bounds();
        if bounds.is_empty() {
            self.width = 0.0;
            self.height = 0.0;
            return;
        }
        self.translate(-bounds.min_x, -bounds.min_y);
        self.width = bounds.width();
        self.height = bounds.height();
    }

    /// Move every point by `(dx, dy)`. Heights are kept.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        for p in &mut self.points {
            p.point = p.point.translate(dx, dy);
        }
    }

    /// Area of the normalized footprint, used to order groups for packing.
    pub fn footprint_area(&self) -> f64 {
        self.width * self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group_with(points: &[(f64, f64, bool)]) -> PathGroup {
        let mut group = PathGroup::new(1.0);
        for &(x, y, emit) in points {
            let p = Point::xy(x, y);
            group.push(if emit {
                PathPoint::cut(p, 1.0, 1)
            } else {
                PathPoint::travel(p, 1.0)
            });
        }
        group
    }

    #[test]
    fn test_cut_runs() {
        let group = group_with(&[
            (0.0, 0.0, false),
            (1.0, 0.0, true),
            (1.0, 1.0, true),
            (5.0, 5.0, false),
            (6.0, 5.0, true),
        ]);
        assert_eq!(group.cut_runs(), 2);
    }

    #[test]
    fn test_normalize_moves_to_origin() {
        let mut group = group_with(&[(3.0, 4.0, false), (8.0, 6.0, true)]);
        group.normalize();
        assert_eq!(group.width, 5.0);
        assert_eq!(group.height, 2.0);
        assert_eq!(group.points[0].point, Point::xy(0.0, 0.0));
        assert_eq!(group.points[1].point, Point::xy(5.0, 2.0));
    }

    #[test]
    fn test_normalize_empty_group() {
        let mut group = PathGroup::new(0.5);
        group.normalize();
        assert_eq!(group.footprint_area(), 0.0);
    }
}
