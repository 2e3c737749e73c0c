//! # LaserKit Export
//!
//! Serializes packed cut paths. One traversal core ([`traverse`]) normalizes
//! coordinates and splits the path stream into polygons; the backends only
//! decide how a polygon is written:
//! - [`gcode`]: laser or drag-knife G-code
//! - [`svg`]: SVG 1.1 polylines
//! - [`dxf`]: AC1014 `LWPOLYLINE` entities

pub mod dxf;
pub mod format;
pub mod gcode;
pub mod svg;
pub mod traverse;

pub use dxf::DxfBackend;
pub use format::{export, ExportFormat};
pub use gcode::{scaled_power, GcodeBackend, KNIFE_LIFT_Z};
pub use svg::{layer_gradient, palette_color, SvgBackend, PALETTE};
pub use traverse::{export_groups, normalize, ExportBackend, Extents};
