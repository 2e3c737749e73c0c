//! # LaserKit
//!
//! Turns 3D meshes into laser or drag-knife cutting jobs.
//!
//! ## Architecture
//!
//! LaserKit is organized as a workspace with multiple crates:
//!
//! 1. **laserkit-core** - Geometry, path streams, errors, progress reporting
//! 2. **laserkit-settings** - Process and device settings (JSON/TOML)
//! 3. **laserkit-slicer** - STL import, z-height planning, slicing, kerf offset
//! 4. **laserkit-camtools** - Toolpath emission, drag-knife arcs, bed packing
//! 5. **laserkit-export** - G-code, SVG and DXF output
//! 6. **laserkit** - Pipeline driver and command line tool

pub mod pipeline;

pub use laserkit_camtools::{PackResult, ToolpathEmitter};
pub use laserkit_core::{
    JobObserver, JobPhase, LaserError, NoopObserver, PathGroup, PathPoint, Point, Polygon,
    Result, TracingObserver,
};
pub use laserkit_export::ExportFormat;
pub use laserkit_settings::{DeviceSettings, ProcessSettings, Settings};
pub use laserkit_slicer::{Layer, Mesh3D, MeshSlicer, PlaneSlicer};
pub use pipeline::{export_job, prepare_job, run_job, slice_widgets, PreparedJob, Widget};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output on stderr with pretty formatting, so job output can go to stdout
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
