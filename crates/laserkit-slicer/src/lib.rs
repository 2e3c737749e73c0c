//! # LaserKit Slicer
//!
//! Turns a triangle mesh into layers of nested, kerf-compensated polygons.
//!
//! 1. [`heights`] picks the z-planes to cut at
//! 2. [`primitive`] cuts the mesh into closed loops at those planes
//! 3. [`layer`] nests the loops into outers with holes
//! 4. [`offset`] applies the kerf offset

pub mod heights;
pub mod layer;
pub mod mesh;
pub mod offset;
pub mod primitive;

pub use heights::{plan_heights, HeightPlan, HeightPolicy};
pub use layer::{slice_mesh, Contours, Layer};
pub use mesh::{Mesh3D, Triangle3D};
pub use offset::{offset_polygons, offset_tops};
pub use primitive::{MeshSlicer, PlaneSlicer, RawSlice, SliceRequest, ZOptions};
