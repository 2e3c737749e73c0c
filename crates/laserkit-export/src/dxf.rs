//! DXF output: AutoCAD R14 (AC1014) lightweight polylines.
//!
//! Written as plain group-code/value line pairs, one `LWPOLYLINE` per polygon.

use crate::traverse::{ExportBackend, Extents};
use laserkit_core::Point;

/// AC1014 entity list with one `LWPOLYLINE` per cut run.
#[derive(Debug, Clone, Default)]
pub struct DxfBackend {
    lines: Vec<String>,
}

impl DxfBackend {
    /// Empty document.
    pub fn new() -> Self {
        Self::default()
    }

    fn pairs(&mut self, pairs: &[(&str, &str)]) {
        for (code, value) in pairs {
            self.lines.push((*code).to_string());
            self.lines.push((*value).to_string());
        }
    }
}

impl ExportBackend for DxfBackend {
    type Vertex = (f64, f64);

    fn on_preamble(&mut self, _extents: &Extents, _power: f64, _speed: f64) {
        self.pairs(&[
            ("  0", "SECTION"),
            ("  2", "HEADER"),
            ("  9", "$ACADVER"),
            ("1", "AC1014"),
            ("  0", "ENDSEC"),
            ("  0", "SECTION"),
            ("  2", "ENTITIES"),
        ]);
    }

    fn on_point(&mut self, point: &Point) -> (f64, f64) {
        (point.x, point.y)
    }

    fn on_polygon(&mut self, polygon: Vec<(f64, f64)>, _color: u32, _thick: f64) {
        let count = polygon.len().to_string();
        self.pairs(&[
            ("  0", "LWPOLYLINE"),
            ("100", "AcDbPolyline"),
            (" 90", count.as_str()),
            (" 70", "0"),
            (" 43", "0.0"),
        ]);
        for (x, y) in polygon {
            self.pairs(&[(" 10", x.to_string().as_str()), (" 20", y.to_string().as_str())]);
        }
        self.pairs(&[("  0", "SEQEND")]);
    }

    fn on_postamble(&mut self) {
        self.pairs(&[("  0", "ENDSEC"), ("  0", "EOF")]);
    }

    fn into_output(self) -> String {
        self.lines.join("\n")
    }
}
