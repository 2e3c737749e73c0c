//! Shared traversal for all output formats.
//!
//! Every backend sees the same normalized coordinates and the same polygon
//! boundaries. The traversal walks the packed groups, joins consecutive cut
//! points into polygons and hands each polygon to the backend.

use laserkit_core::{PathGroup, Point};
use laserkit_settings::Settings;
use tracing::debug;

/// Bounding box of the normalized job.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extents {
    pub min: Point,
    pub max: Point,
}

impl Extents {
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}

/// Output format driven by [`export_groups`].
///
/// Callbacks arrive in this order: [`on_preamble`](Self::on_preamble) once,
/// then per group [`on_layer_change`](Self::on_layer_change) followed by
/// [`on_point`](Self::on_point) for each cut vertex and
/// [`on_polygon`](Self::on_polygon) for each finished run, then
/// [`on_postamble`](Self::on_postamble) once.
pub trait ExportBackend {
    /// Per-vertex representation collected into polygons.
    type Vertex;

    fn on_preamble(&mut self, extents: &Extents, power: f64, speed: f64);

    /// Convert a normalized point. Called in path order.
    fn on_point(&mut self, point: &Point) -> Self::Vertex;

    /// A finished run of vertices. The first vertex is the travel position
    /// the run starts from.
    fn on_polygon(&mut self, polygon: Vec<Self::Vertex>, color: u32, thick: f64);

    fn on_postamble(&mut self);

    /// Start of group `index` of `layers`, carrying the group's first z and thickness.
    fn on_layer_change(&mut self, _index: usize, _z: f64, _thick: f64, _layers: usize) {}

    /// The finished document.
    fn into_output(self) -> String;
}

/// Apply axis inversion and the origin policy to copies of `groups`.
///
/// Returns the moved groups and the extents backends should use. The raw
/// minimum and maximum always include the origin.
pub fn normalize(groups: &[PathGroup], settings: &Settings) -> (Vec<PathGroup>, Extents) {
    let process = &settings.process;
    let mut groups = groups.to_vec();
    let mut min = Point::ORIGIN;
    let mut max = Point::ORIGIN;

    for p in groups.iter_mut().flat_map(|g| g.points.iter_mut()) {
        if process.invert_x {
            p.point.x = -p.point.x;
        }
        if process.invert_y {
            p.point.y = -p.point.y;
        }
        min.x = min.x.min(p.point.x);
        min.y = min.y.min(p.point.y);
        max.x = max.x.max(p.point.x);
        max.y = max.y.max(p.point.y);
    }

    let (dx, dy, max) = if process.origin_center {
        let (w, h) = (settings.device.bed_width, settings.device.bed_depth);
        (w / 2.0, h / 2.0, Point::xy(w, h))
    } else {
        (-min.x, -min.y, Point::xy(max.x - min.x, max.y - min.y))
    };
    for group in &mut groups {
        group.translate(dx, dy);
    }

    (
        groups,
        Extents {
            min: Point::ORIGIN,
            max,
        },
    )
}

/// Walk `groups` through `backend` and return its document.
pub fn export_groups<B: ExportBackend>(groups: &[PathGroup], settings: &Settings, mut backend: B) -> String {
    let (groups, extents) = normalize(groups, settings);
    backend.on_preamble(&extents, settings.process.power, settings.process.speed);

    let layers = groups.len();
    let mut last: Option<Point> = None;
    let mut polygon: Vec<B::Vertex> = Vec::new();
    let mut polygons = 0usize;

    for (index, group) in groups.iter().enumerate() {
        let Some(first) = group.points.first() else {
            continue;
        };
        backend.on_layer_change(index, first.point.z, first.thick, layers);

        let mut color = 0;
        let mut thick = group.thick;
        for p in &group.points {
            if p.emit {
                color = p.color;
                thick = p.thick;
                if polygon.is_empty() {
                    if let Some(lead) = last {
                        polygon.push(backend.on_point(&lead));
                    }
                }
                polygon.push(backend.on_point(&p.point));
            } else if !polygon.is_empty() {
                backend.on_polygon(std::mem::take(&mut polygon), color, thick);
                polygons += 1;
            }
            last = Some(p.point);
        }
        if !polygon.is_empty() {
            backend.on_polygon(std::mem::take(&mut polygon), color, thick);
            polygons += 1;
        }
    }

    backend.on_postamble();
    debug!(
        "Exported {} polygons from {} groups ({:.1} x {:.1})",
        polygons,
        layers,
        extents.width(),
        extents.height()
    );
    backend.into_output()
}
