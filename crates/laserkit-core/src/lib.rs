//! # LaserKit Core
//!
//! Shared types for the LaserKit pipeline:
//! - [`geometry`]: points, bounds, nested polygons, containment and equivalence
//! - [`path`]: travel/cut point streams handed from emission to packing and export
//! - [`progress`]: job observer trait
//! - [`error`]: the pipeline error type

pub mod error;
pub mod geometry;
pub mod path;
pub mod progress;

pub use error::{LaserError, Result};
pub use geometry::{nest, Bounds, Point, Polygon, CONTAINMENT_TOLERANCE, EPSILON, POINT_TOLERANCE};
pub use path::{PathGroup, PathPoint};
pub use progress::{JobObserver, JobPhase, NoopObserver, PhaseProgress, TracingObserver};
