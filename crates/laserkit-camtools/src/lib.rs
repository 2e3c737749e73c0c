//! CAM tools for LaserKit.
//!
//! Turns sliced layers into cut path groups and lays the groups out on the
//! bed:
//! - [`emitter`]: ordered travel/cut streams, holes before outlines
//! - [`knife`]: drag-knife corner sweeps
//! - [`packer`]: binary-tree bed packing

pub mod emitter;
pub mod knife;
pub mod packer;

pub use emitter::{EmitMode, MergedShape, PathKind, PathPrinter, ToolpathEmitter, MARK_COLOR};
pub use knife::{add_knife_radii, knife_tree, Slope};
pub use packer::{pack_groups, PackResult, Packer, Size, GROWTH_FACTOR, MAX_GROWTH_ATTEMPTS};
