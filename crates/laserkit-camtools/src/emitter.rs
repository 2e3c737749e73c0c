//! Toolpath emission.
//!
//! Walks the offset contours of each layer and writes ordered travel/cut
//! streams. Holes are always cut before the outline around them so the part
//! does not drop out of the sheet before its inside is finished.

use crate::knife::knife_tree;
use laserkit_core::{PathGroup, PathPoint, Point, Polygon};
use laserkit_settings::{ProcessSettings, Settings};
use laserkit_slicer::Layer;
use tracing::{debug, info};

/// Color used for scoring marks.
pub const MARK_COLOR: u32 = 2;

/// Distance under which merged outlines count as the same shape.
pub const MERGE_TOLERANCE: f64 = 1e-3;

/// How layers map onto path groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitMode {
    /// One group per layer.
    Ungrouped,
    /// All layers in one group.
    Grouped,
    /// Identical outlines across layers collapse into one weighted path.
    Merged,
}

impl EmitMode {
    /// Mode selected by the `merged` and `group` flags. `merged` wins.
    pub fn from_process(process: &ProcessSettings) -> Self {
        if process.merged {
            Self::Merged
        } else if process.group {
            Self::Grouped
        } else {
            Self::Ungrouped
        }
    }
}

/// Role of an emitted path within its layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// Hole, cut first.
    In,
    /// Outline.
    Out,
    /// Scoring line copied from the layer above.
    Mark,
}

/// Writes polygons into a group as a travel move followed by cuts.
///
/// Closed polygons start at the vertex nearest to where the previous path
/// ended and return to it. Open polygons, and every polygon in `simple`
/// mode, start at their first vertex.
#[derive(Debug, Clone)]
pub struct PathPrinter {
    last: Point,
    simple: bool,
}

impl PathPrinter {
    /// A printer starting from the origin. `simple` always starts at the first vertex.
    pub fn new(simple: bool) -> Self {
        Self {
            last: Point::ORIGIN,
            simple,
        }
    }

    /// Append `polygon` to `group` as one travel move and its cuts.
    pub fn print(&mut self, polygon: &Polygon, group: &mut PathGroup, color: u32, thick: f64) {
        let pts = &polygon.points;
        let n = pts.len();
        if n < 2 {
            return;
        }

        let start = if self.simple || polygon.open {
            0
        } else {
            polygon.nearest_index(&self.last)
        };

        group.push(PathPoint::travel(pts[start], thick));
        for k in 1..n {
            group.push(PathPoint::cut(pts[(start + k) % n], thick, color));
        }
        if !polygon.open {
            group.push(PathPoint::cut(pts[start], thick, color));
        }

        self.last = group.points.last().map_or(pts[start], |p| p.point);
    }
}

/// A merged outline and the number of layers it occurred in.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedShape {
    pub polygon: Polygon,
    pub depth: u32,
    /// Total thickness of the layers that share this outline.
    pub thick: f64,
}

/// Produces path groups from a solid's layers.
pub struct ToolpathEmitter<'a> {
    process: &'a ProcessSettings,
}

impl<'a> ToolpathEmitter<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self {
            process: &settings.process,
        }
    }

    /// Emission mode for the current settings.
    pub fn mode(&self) -> EmitMode {
        EmitMode::from_process(self.process)
    }

    /// Emit every layer. `on_update` receives the fraction of layers done.
    pub fn emit(&self, layers: &[Layer], on_update: &mut dyn FnMut(f64)) -> Vec<PathGroup> {
        let groups = match self.mode() {
            EmitMode::Merged => self.emit_merged(layers, on_update),
            mode => self.emit_layered(layers, mode == EmitMode::Grouped, on_update),
        };
        info!(
            "Emitted {} path groups from {} layers ({:?})",
            groups.len(),
            layers.len(),
            self.mode()
        );
        groups
    }

    /// Cut contours of a layer, with knife compensation applied when enabled.
    fn contours(&self, layer: &Layer) -> Vec<Polygon> {
        if self.process.knife_on {
            layer
                .offset()
                .iter()
                .filter_map(|poly| knife_tree(poly, self.process.knife_tip))
                .collect()
        } else {
            layer.offset().to_vec()
        }
    }

    /// Layers top-down, each emitting holes then outlines.
    fn emit_layered(
        &self,
        layers: &[Layer],
        grouped: bool,
        on_update: &mut dyn FnMut(f64),
    ) -> Vec<PathGroup> {
        let total = layers.len().max(1) as f64;
        let mut groups = Vec::new();
        let mut shared = PathGroup::new(layers.last().map_or(0.0, |l| l.thickness));
        let mut last_out: Option<Vec<Polygon>> = None;

        for (done, layer) in layers.iter().rev().enumerate() {
            let contours = self.contours(layer);
            if grouped {
                last_out = Some(self.emit_layer(layer, &contours, last_out.as_deref(), &mut shared));
            } else {
                let mut group = PathGroup::new(layer.thickness);
                last_out = Some(self.emit_layer(layer, &contours, last_out.as_deref(), &mut group));
                if group.is_empty() {
                    debug!("Layer {} at z={:.3} has nothing to cut", layer.index, layer.z);
                } else {
                    groups.push(group);
                }
            }
            on_update((done + 1) as f64 / total);
        }

        if grouped && !shared.is_empty() {
            groups.push(shared);
        }
        groups
    }

    /// Emit one layer into `group`, returning the outlines it cut.
    fn emit_layer(
        &self,
        layer: &Layer,
        contours: &[Polygon],
        previous_out: Option<&[Polygon]>,
        group: &mut PathGroup,
    ) -> Vec<Polygon> {
        let color = if self.process.z_color {
            layer.index as u32 + 1
        } else {
            1
        };
        let thick = layer.thickness;
        let mut printer = PathPrinter::new(self.process.knife_on);
        let mut emitted = Vec::with_capacity(contours.len());

        for hole in contours.iter().flat_map(|c| c.inner.iter()) {
            self.emit_path(&mut printer, hole, PathKind::In, color, thick, group);
        }

        for outline in contours {
            let outline = Polygon {
                inner: Vec::new(),
                ..outline.clone()
            };
            self.emit_path(&mut printer, &outline, PathKind::Out, color, thick, group);

            if self.process.stack {
                for below in previous_out.unwrap_or_default() {
                    if below.is_inside(&outline) {
                        self.emit_path(&mut printer, below, PathKind::Mark, color, thick, group);
                    }
                }
            }
            emitted.push(outline);
        }

        debug!(
            "Layer {} z={:.3}: {} outlines, {} holes",
            layer.index,
            layer.z,
            emitted.len(),
            contours.iter().map(|c| c.inner.len()).sum::<usize>()
        );
        emitted
    }

    fn emit_path(
        &self,
        printer: &mut PathPrinter,
        polygon: &Polygon,
        kind: PathKind,
        color: u32,
        thick: f64,
        group: &mut PathGroup,
    ) {
        let color = match kind {
            PathKind::Mark => MARK_COLOR,
            PathKind::In | PathKind::Out => color,
        };
        printer.print(polygon, group, color, thick);
    }

    /// Collapse equivalent outlines across all layers, weighting by occurrence.
    pub fn merge_layers(layers: &[Layer]) -> Vec<MergedShape> {
        let mut merged: Vec<MergedShape> = Vec::new();
        for layer in layers {
            for poly in layer.offset().iter().flat_map(Polygon::flatten) {
                let mut matched = false;
                for shape in merged.iter_mut() {
                    if poly.is_equivalent(&shape.polygon, MERGE_TOLERANCE) {
                        shape.depth += 1;
                        shape.thick += layer.thickness;
                        matched = true;
                    }
                }
                if !matched {
                    merged.push(MergedShape {
                        polygon: poly,
                        depth: 1,
                        thick: layer.thickness,
                    });
                }
            }
        }
        merged
    }

    fn emit_merged(&self, layers: &[Layer], on_update: &mut dyn FnMut(f64)) -> Vec<PathGroup> {
        let merged = Self::merge_layers(layers);
        on_update(0.5);

        let mut group = PathGroup::new(layers.iter().map(|l| l.thickness).sum());
        let mut printer = PathPrinter::new(self.process.knife_on);
        for shape in &merged {
            let polygon = if self.process.knife_on {
                match knife_tree(&shape.polygon, self.process.knife_tip) {
                    Some(path) => path,
                    None => continue,
                }
            } else {
                shape.polygon.clone()
            };
            printer.print(&polygon, &mut group, shape.depth, shape.thick);
        }
        on_update(1.0);

        debug!("Merged {} layers into {} shapes", layers.len(), merged.len());
        if group.is_empty() {
            Vec::new()
        } else {
            vec![group]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use laserkit_slicer::Contours;

    fn square(x: f64, y: f64, size: f64, z: f64) -> Polygon {
        Polygon::from_xy(
            &[(x, y), (x + size, y), (x + size, y + size), (x, y + size)],
            z,
        )
    }

    fn layer(index: usize, z: f64, tops: Vec<Polygon>) -> Layer {
        Layer::new(z, index, 1.0, tops, Contours::Identity)
    }

    #[test]
    fn test_mode_selection() {
        let mut process = ProcessSettings::default();
        assert_eq!(EmitMode::from_process(&process), EmitMode::Ungrouped);
        process.group = true;
        assert_eq!(EmitMode::from_process(&process), EmitMode::Grouped);
        process.merged = true;
        assert_eq!(EmitMode::from_process(&process), EmitMode::Merged);
    }

    #[test]
    fn test_printer_closes_and_starts_near_last() {
        let mut group = PathGroup::new(1.0);
        let mut printer = PathPrinter::new(false);
        printer.print(&square(0.0, 0.0, 10.0, 0.0), &mut group, 1, 1.0);
        assert_eq!(group.len(), 5);
        assert!(!group.points[0].emit);
        assert!(group.points[1..].iter().all(|p| p.emit));
        assert_eq!(group.points[0].point, group.points[4].point);
        assert_eq!(group.points[0].point, Point::ORIGIN);

        // next square starts at its vertex closest to (0, 0)
        printer.print(&square(20.0, 20.0, 5.0, 0.0), &mut group, 1, 1.0);
        assert_eq!(group.points[5].point, Point::xy(20.0, 20.0));
    }

    #[test]
    fn test_printer_leaves_open_paths_open() {
        let mut group = PathGroup::new(1.0);
        let open = Polygon::new_open(vec![Point::xy(5.0, 5.0), Point::xy(6.0, 5.0), Point::xy(6.0, 6.0)]);
        PathPrinter::new(false).print(&open, &mut group, 1, 1.0);
        assert_eq!(group.len(), 3);
        assert_eq!(group.points[0].point, Point::xy(5.0, 5.0));
    }

    #[test]
    fn test_holes_before_outlines() {
        let settings = Settings::default();
        let top = square(0.0, 0.0, 20.0, 0.5).with_inner(vec![square(5.0, 5.0, 5.0, 0.5)]);
        let layers = vec![layer(0, 0.5, vec![top])];

        let groups = ToolpathEmitter::new(&settings).emit(&layers, &mut |_: f64| {});
        assert_eq!(groups.len(), 1);
        let pts = &groups[0].points;
        assert_eq!(groups[0].cut_runs(), 2);
        // first run lies within the hole's bounds
        assert!(pts[..5].iter().all(|p| p.point.x >= 5.0 && p.point.x <= 10.0));
        assert!(pts[5..].iter().any(|p| p.point.x == 20.0));
    }

    #[test]
    fn test_ungrouped_reverses_layers() {
        let settings = Settings::default();
        let layers = vec![
            layer(0, 0.5, vec![square(0.0, 0.0, 4.0, 0.5)]),
            layer(1, 1.5, vec![square(0.0, 0.0, 4.0, 1.5)]),
        ];
        let groups = ToolpathEmitter::new(&settings).emit(&layers, &mut |_: f64| {});
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].points[0].point.z, 1.5);
        assert_eq!(groups[1].points[0].point.z, 0.5);
    }

    #[test]
    fn test_grouped_collects_one_group() {
        let mut settings = Settings::default();
        settings.process.group = true;
        let layers = vec![
            layer(0, 0.5, vec![square(0.0, 0.0, 4.0, 0.5)]),
            layer(1, 1.5, vec![square(0.0, 0.0, 4.0, 1.5)]),
            layer(2, 2.5, Vec::new()),
        ];
        let groups = ToolpathEmitter::new(&settings).emit(&layers, &mut |_: f64| {});
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].cut_runs(), 2);
    }

    #[test]
    fn test_stacked_marks_previous_outline() {
        let mut settings = Settings::default();
        settings.process.stack = true;
        let layers = vec![
            layer(0, 0.5, vec![square(0.0, 0.0, 10.0, 0.5)]),
            layer(1, 1.5, vec![square(2.0, 2.0, 4.0, 1.5)]),
        ];
        let groups = ToolpathEmitter::new(&settings).emit(&layers, &mut |_: f64| {});
        assert_eq!(groups.len(), 2);
        // top layer has nothing above it
        assert_eq!(groups[0].cut_runs(), 1);
        // bottom layer cuts its outline, then scores the top layer's outline
        assert_eq!(groups[1].cut_runs(), 2);
        let marks: Vec<_> = groups[1].points.iter().filter(|p| p.emit && p.color == MARK_COLOR).collect();
        assert_eq!(marks.len(), 4);
        assert!(marks.iter().all(|p| p.point.z == 1.5));
    }

    #[test]
    fn test_z_color_uses_layer_index() {
        let mut settings = Settings::default();
        settings.process.z_color = true;
        let layers = vec![
            layer(0, 0.5, vec![square(0.0, 0.0, 4.0, 0.5)]),
            layer(1, 1.5, vec![square(0.0, 0.0, 4.0, 1.5)]),
        ];
        let groups = ToolpathEmitter::new(&settings).emit(&layers, &mut |_: f64| {});
        let colors: Vec<u32> = groups.iter().map(|g| g.points[1].color).collect();
        assert_eq!(colors, vec![2, 1]);
    }

    #[test]
    fn test_merged_depth_counts_layers() {
        let mut settings = Settings::default();
        settings.process.merged = true;
        let layers = vec![
            layer(0, 0.5, vec![square(0.0, 0.0, 4.0, 0.5)]),
            layer(1, 1.5, vec![square(0.0, 0.0, 4.0, 1.5)]),
            layer(2, 2.5, vec![square(1.0, 1.0, 2.0, 2.5)]),
        ];

        let merged = ToolpathEmitter::merge_layers(&layers);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].depth, 2);
        assert_eq!(merged[0].thick, 2.0);
        assert_eq!(merged[1].depth, 1);

        let groups = ToolpathEmitter::new(&settings).emit(&layers, &mut |_: f64| {});
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].points[1].color, 2);
        assert_eq!(groups[0].cut_runs(), 2);
    }

    #[test]
    fn test_knife_paths_are_simple_and_open() {
        let mut settings = Settings::default();
        settings.process.knife_on = true;
        let layers = vec![layer(0, 0.5, vec![square(0.0, 0.0, 10.0, 0.5)])];
        let groups = ToolpathEmitter::new(&settings).emit(&layers, &mut |_: f64| {});
        assert_eq!(groups.len(), 1);
        let pts = &groups[0].points;
        assert_eq!(pts.len(), 68);
        assert_eq!(pts[0].point, Point::new(-2.0, 10.0, 0.5));
        assert!(!pts[0].emit);
        assert!(pts[1..].iter().all(|p| p.emit));
    }
}
