//! SVG 1.1 output in millimetres.

use crate::traverse::{ExportBackend, Extents};
use laserkit_core::Point;
use laserkit_settings::Settings;

/// Stroke colors indexed by `color - 1`.
pub const PALETTE: [&str; 9] = [
    "black", "purple", "blue", "red", "orange", "yellow", "green", "brown", "gray",
];

/// Round to 3 decimals, folding `-0` into `0`.
fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0 + 0.0
}

/// Stroke for a layer in z-color mode: an even gradient over the 24-bit range.
pub fn layer_gradient(index: usize, layers: usize) -> String {
    let value = ((index + 1) as f64 / layers.max(1) as f64 * f64::from(0xff_ffff_u32)).round();
    format!("#{:06x}", value as u32)
}

/// Stroke for `color`. Colors past the palette wrap around.
pub fn palette_color(color: u32) -> &'static str {
    PALETTE[(color as usize + PALETTE.len() - 1) % PALETTE.len()]
}

/// Writes one `<polyline>` per cut run.
pub struct SvgBackend {
    z_color: bool,
    layer_stroke: Option<String>,
    max_y: f64,
    z: f64,
    lines: Vec<String>,
}

impl SvgBackend {
    /// Empty document. The canvas is sized from the job extents in the preamble.
    pub fn new(settings: &Settings) -> Self {
        Self {
            z_color: settings.process.z_color,
            layer_stroke: None,
            max_y: 0.0,
            z: 0.0,
            lines: Vec::new(),
        }
    }
}

impl ExportBackend for SvgBackend {
    type Vertex = String;

    fn on_preamble(&mut self, extents: &Extents, _power: f64, _speed: f64) {
        let (w, h) = (extents.width(), extents.height());
        self.max_y = extents.max.y;
        self.lines.push(r#"<?xml version="1.0" standalone="no"?>"#.to_string());
        self.lines.push(
            r#"<!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN" "http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd">"#
                .to_string(),
        );
        self.lines.push(format!(
            r#"<svg width="{w}mm" height="{h}mm" viewBox="0 0 {w} {h}" xmlns="http://www.w3.org/2000/svg" version="1.1">"#
        ));
    }

    fn on_point(&mut self, point: &Point) -> String {
        self.z = point.z;
        format!("{},{}", round3(point.x), round3(self.max_y - point.y))
    }

    fn on_polygon(&mut self, polygon: Vec<String>, color: u32, thick: f64) {
        let stroke = match (&self.layer_stroke, self.z_color) {
            (Some(stroke), true) => stroke.as_str(),
            _ => palette_color(color),
        };
        self.lines.push(format!(
            r#"<polyline z="{}" h="{}" points="{}" fill="none" stroke="{}" stroke-width="0.1mm" />"#,
            self.z,
            thick,
            polygon.join(" "),
            stroke
        ));
    }

    fn on_postamble(&mut self) {
        self.lines.push("</svg>".to_string());
    }

    fn on_layer_change(&mut self, index: usize, _z: f64, _thick: f64, layers: usize) {
        if self.z_color {
            self.layer_stroke = Some(layer_gradient(index, layers));
        }
    }

    fn into_output(self) -> String {
        self.lines.join("\n")
    }
}
