//! Mesh slicing primitive.
//!
//! [`MeshSlicer`] is the seam between the layer pipeline and whatever turns
//! triangles into closed loops. [`PlaneSlicer`] is the built-in
//! implementation: plain triangle/plane intersection followed by endpoint
//! chaining.

use crate::mesh::Mesh3D;
use laserkit_core::{LaserError, Point, Polygon, Result};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Vertical extent handed to the slicer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliceRequest {
    pub z_min: f64,
    pub z_max: f64,
}

/// What the height generator gets to look at.
#[derive(Debug, Clone, Copy)]
pub struct ZOptions<'a> {
    pub z_min: f64,
    pub z_max: f64,
    /// Sorted distinct facet heights of the mesh.
    pub z_indexes: &'a [f64],
}

/// Flat closed loops found at one height, not yet nested.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSlice {
    pub z: f64,
    pub groups: Vec<Polygon>,
}

/// Cuts a mesh into closed loops at heights chosen by `z_gen`.
pub trait MeshSlicer {
    /// `on_update` receives the fraction of heights processed, in `[0, 1]`.
    fn slice(
        &self,
        mesh: &Mesh3D,
        request: &SliceRequest,
        z_gen: &mut dyn FnMut(&ZOptions<'_>) -> Result<Vec<f64>>,
        on_update: &mut dyn FnMut(f64),
    ) -> Result<Vec<RawSlice>>;
}

/// Triangle/plane intersection slicer.
#[derive(Debug, Clone, Copy)]
pub struct PlaneSlicer {
    /// Distance under which segment endpoints are joined.
    pub tolerance: f64,
}

impl Default for PlaneSlicer {
    fn default() -> Self {
        Self { tolerance: 1e-6 }
    }
}

impl PlaneSlicer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Closed loops where the plane at `z` cuts the mesh.
    pub fn slice_at(&self, mesh: &Mesh3D, z: f64) -> Vec<Polygon> {
        let segments: Vec<(Point, Point)> = mesh
            .triangles
            .iter()
            .filter(|t| {
                let (lo, hi) = t.z_range();
                lo <= z && z <= hi
            })
            .filter_map(|t| t.intersect_plane_z(z))
            .collect();
        chain_segments(&segments, self.tolerance)
    }
}

impl MeshSlicer for PlaneSlicer {
    fn slice(
        &self,
        mesh: &Mesh3D,
        request: &SliceRequest,
        z_gen: &mut dyn FnMut(&ZOptions<'_>) -> Result<Vec<f64>>,
        on_update: &mut dyn FnMut(f64),
    ) -> Result<Vec<RawSlice>> {
        if mesh.is_empty() {
            return Err(LaserError::EmptyMesh);
        }

        let z_indexes = mesh.z_indexes();
        let heights = z_gen(&ZOptions {
            z_min: request.z_min,
            z_max: request.z_max,
            z_indexes: &z_indexes,
        })?;

        let total = heights.len().max(1) as f64;
        let mut slices = Vec::with_capacity(heights.len());
        for (i, &z) in heights.iter().enumerate() {
            let groups = self.slice_at(mesh, z);
            debug!("z={:.3}: {} loops", z, groups.len());
            slices.push(RawSlice { z, groups });
            on_update((i + 1) as f64 / total);
        }
        Ok(slices)
    }
}

/// Join unordered segments into closed loops by matching endpoints.
fn chain_segments(segments: &[(Point, Point)], tolerance: f64) -> Vec<Polygon> {
    let key = |p: &Point| {
        (
            (p.x / tolerance).round() as i64,
            (p.y / tolerance).round() as i64,
        )
    };

    let mut by_end: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
    for (i, (a, b)) in segments.iter().enumerate() {
        by_end.entry(key(a)).or_default().push(i);
        by_end.entry(key(b)).or_default().push(i);
    }

    let mut used = vec![false; segments.len()];
    let mut loops = Vec::new();
    let mut open_chains = 0usize;

    for start in 0..segments.len() {
        if used[start] {
            continue;
        }
        used[start] = true;

        let (first, mut cur) = segments[start];
        let start_key = key(&first);
        let mut points = vec![first];
        let mut closed = false;

        loop {
            let k = key(&cur);
            if k == start_key {
                closed = true;
                break;
            }
            points.push(cur);
            let next = by_end
                .get(&k)
                .and_then(|candidates| candidates.iter().copied().find(|&i| !used[i]));
            let Some(i) = next else {
                break;
            };
            used[i] = true;
            let (a, b) = segments[i];
            cur = if key(&a) == k { b } else { a };
        }

        if !closed {
            open_chains += 1;
            continue;
        }

        let mut polygon = Polygon::new(points);
        polygon.dedup(tolerance);
        polygon.remove_collinear(tolerance);
        if polygon.len() >= 3 {
            loops.push(polygon);
        }
    }

    if open_chains > 0 {
        warn!("Dropped {} open chains while slicing", open_chains);
    }
    loops
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cuboid_cross_section_is_rectangle() {
        let mesh = Mesh3D::cuboid(10.0, 4.0, 5.0);
        let loops = PlaneSlicer::new().slice_at(&mesh, 2.5);
        assert_eq!(loops.len(), 1);
        let ring = &loops[0];
        assert_eq!(ring.len(), 4);
        assert!((ring.area().abs() - 40.0).abs() < 1e-9);
        assert!(ring.points.iter().all(|p| p.z == 2.5));
    }

    #[test]
    fn test_slice_drives_height_generator_and_progress() {
        let mesh = Mesh3D::cuboid(2.0, 2.0, 3.0);
        let request = SliceRequest {
            z_min: 0.0,
            z_max: 3.0,
        };
        let mut seen_indexes = Vec::new();
        let mut z_gen = |opts: &ZOptions<'_>| {
            seen_indexes = opts.z_indexes.to_vec();
            Ok::<_, LaserError>(vec![0.5, 1.5, 2.5])
        };
        let mut updates = Vec::new();
        let mut on_update = |f: f64| updates.push(f);

        let slices = PlaneSlicer::new()
            .slice(&mesh, &request, &mut z_gen, &mut on_update)
            .unwrap();

        assert_eq!(seen_indexes, vec![0.0, 3.0]);
        assert_eq!(slices.len(), 3);
        assert_eq!(updates.len(), 3);
        assert_eq!(updates.last().copied(), Some(1.0));
        assert!(updates.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_empty_mesh_rejected() {
        let mesh = Mesh3D::new(Vec::new());
        let request = SliceRequest {
            z_min: 0.0,
            z_max: 0.0,
        };
        let err = PlaneSlicer::new()
            .slice(
                &mesh,
                &request,
                &mut |_: &ZOptions<'_>| Ok(vec![0.0]),
                &mut |_: f64| {},
            )
            .unwrap_err();
        assert!(matches!(err, LaserError::EmptyMesh));
    }

    #[test]
    fn test_open_chain_dropped() {
        let segments = [
            (Point::xy(0.0, 0.0), Point::xy(1.0, 0.0)),
            (Point::xy(1.0, 0.0), Point::xy(1.0, 1.0)),
        ];
        assert!(chain_segments(&segments, 1e-6).is_empty());
    }
}
