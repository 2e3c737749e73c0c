//! # Mesh Module
//!
//! Triangle meshes to be sliced. Meshes are imported from STL files (ASCII
//! or binary) or built directly from triangles.

use laserkit_core::{LaserError, Point, Result};
use nalgebra::Point3;
use std::io::{Read, Seek};
use std::path::Path;
use tracing::debug;

/// A 3D triangle made up of three vertices
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle3D {
    pub vertices: [Point3<f64>; 3],
}

impl Triangle3D {
    pub fn new(v1: Point3<f64>, v2: Point3<f64>, v3: Point3<f64>) -> Self {
        Self {
            vertices: [v1, v2, v3],
        }
    }

    /// Lowest and highest vertex z.
    pub fn z_range(&self) -> (f64, f64) {
        let [a, b, c] = &self.vertices;
        (a.z.min(b.z).min(c.z), a.z.max(b.z).max(c.z))
    }

    /// Segment where a horizontal plane at `z` crosses the triangle.
    ///
    /// Vertices exactly on the plane count as above it, so a plane through a
    /// vertex yields one segment per straddling triangle and none for
    /// triangles lying flat in the plane.
    pub fn intersect_plane_z(&self, z: f64) -> Option<(Point, Point)> {
        let above = self.vertices.map(|v| v.z >= z);
        let count = above.iter().filter(|a| **a).count();
        if count == 0 || count == 3 {
            return None;
        }

        let mut hits = [Point::ORIGIN; 2];
        let mut n = 0;
        for i in 0..3 {
            let j = (i + 1) % 3;
            if above[i] != above[j] && n < 2 {
                // walk every edge bottom-up so neighbouring faces produce identical points
                let (a, b) = if above[i] {
                    (self.vertices[j], self.vertices[i])
                } else {
                    (self.vertices[i], self.vertices[j])
                };
                let t = (z - a.z) / (b.z - a.z);
                hits[n] = Point::new(a.x + t * (b.x - a.x), a.y + t * (b.y - a.y), z);
                n += 1;
            }
        }

        if n == 2 && !hits[0].is_same_2d(&hits[1], laserkit_core::POINT_TOLERANCE) {
            Some((hits[0], hits[1]))
        } else {
            None
        }
    }
}

/// A 3D mesh model
#[derive(Debug, Clone)]
pub struct Mesh3D {
    pub triangles: Vec<Triangle3D>,
    pub bounds_min: Point3<f64>,
    pub bounds_max: Point3<f64>,
}

impl Mesh3D {
    /// Mesh over `triangles` with bounds computed.
    pub fn new(triangles: Vec<Triangle3D>) -> Self {
        let mut mesh = Self {
            triangles,
            bounds_min: Point3::origin(),
            bounds_max: Point3::origin(),
        };
        mesh.calculate_bounds();
        mesh
    }

    /// Convert an indexed STL mesh. Faces pointing at missing vertices are dropped.
    pub fn from_stl_mesh(stl_mesh: &stl_io::IndexedMesh) -> Self {
        let vertex = |idx: usize| {
            stl_mesh
                .vertices
                .get(idx)
                .map(|v| Point3::new(v[0] as f64, v[1] as f64, v[2] as f64))
        };

        let triangles = stl_mesh
            .faces
            .iter()
            .filter_map(|face| {
                let [a, b, c] = face.vertices;
                Some(Triangle3D::new(vertex(a)?, vertex(b)?, vertex(c)?))
            })
            .collect();

        Self::new(triangles)
    }

    /// Read an STL stream
    pub fn read_stl<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let stl = stl_io::read_stl(reader).map_err(|e| LaserError::MeshImport(e.to_string()))?;
        debug!("STL contains {} faces", stl.faces.len());
        Ok(Self::from_stl_mesh(&stl))
    }

    /// Import STL from file path
    pub fn load_stl(path: &Path) -> Result<Self> {
        debug!("Importing STL file: {}", path.display());
        let mut file = std::fs::File::open(path)?;
        let stl = stl_io::read_stl(&mut file)
            .map_err(|e| LaserError::MeshImport(format!("{}: {}", path.display(), e)))?;
        debug!("STL contains {} faces", stl.faces.len());
        Ok(Self::from_stl_mesh(&stl))
    }

    /// Closed axis aligned box spanning `[0, width] x [0, depth] x [0, height]`.
    pub fn cuboid(width: f64, depth: f64, height: f64) -> Self {
        let c = |x: f64, y: f64, z: f64| Point3::new(x, y, z);
        let (w, d, h) = (width, depth, height);
        let quads = [
            // bottom, top
            [c(0., 0., 0.), c(0., d, 0.), c(w, d, 0.), c(w, 0., 0.)],
            [c(0., 0., h), c(w, 0., h), c(w, d, h), c(0., d, h)],
            // front, back
            [c(0., 0., 0.), c(w, 0., 0.), c(w, 0., h), c(0., 0., h)],
            [c(0., d, 0.), c(0., d, h), c(w, d, h), c(w, d, 0.)],
            // left, right
            [c(0., 0., 0.), c(0., 0., h), c(0., d, h), c(0., d, 0.)],
            [c(w, 0., 0.), c(w, d, 0.), c(w, d, h), c(w, 0., h)],
        ];

        let triangles = quads
            .iter()
            .flat_map(|[p0, p1, p2, p3]| {
                [
                    Triangle3D::new(*p0, *p1, *p2),
                    Triangle3D::new(*p0, *p2, *p3),
                ]
            })
            .collect();

        Self::new(triangles)
    }

    fn calculate_bounds(&mut self) {
        let mut vertices = self.triangles.iter().flat_map(|t| t.vertices.iter());
        let Some(first) = vertices.next() else {
            self.bounds_min = Point3::origin();
            self.bounds_max = Point3::origin();
            return;
        };

        let mut min = *first;
        let mut max = *first;
        for v in vertices {
            min.x = min.x.min(v.x);
            min.y = min.y.min(v.y);
            min.z = min.z.min(v.z);
            max.x = max.x.max(v.x);
            max.y = max.y.max(v.y);
            max.z = max.z.max(v.z);
        }

        self.bounds_min = min;
        self.bounds_max = max;
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Sorted distinct vertex heights.
    pub fn z_indexes(&self) -> Vec<f64> {
        let mut zs: Vec<f64> = self
            .triangles
            .iter()
            .flat_map(|t| t.vertices.iter().map(|v| v.z))
            .collect();
        zs.sort_by(f64::total_cmp);
        zs.dedup_by(|a, b| (*a - *b).abs() < laserkit_core::EPSILON);
        zs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cuboid_bounds() {
        let mesh = Mesh3D::cuboid(10.0, 20.0, 5.0);
        assert_eq!(mesh.triangle_count(), 12);
        assert_eq!(mesh.bounds_min, Point3::origin());
        assert_eq!(mesh.bounds_max, Point3::new(10.0, 20.0, 5.0));
        assert_eq!(mesh.z_indexes(), vec![0.0, 5.0]);
    }

    #[test]
    fn test_triangle_plane_intersection() {
        let tri = Triangle3D::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 10.0),
        );
        let (a, b) = tri.intersect_plane_z(5.0).unwrap();
        let mut xs = [a.x, b.x];
        xs.sort_by(f64::total_cmp);
        assert!((xs[0] - 0.0).abs() < 1e-12);
        assert!((xs[1] - 5.0).abs() < 1e-12);
        assert_eq!(a.z, 5.0);

        assert!(tri.intersect_plane_z(11.0).is_none());
        assert!(tri.intersect_plane_z(-1.0).is_none());
    }

    #[test]
    fn test_flat_triangle_never_intersects() {
        let tri = Triangle3D::new(
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
        );
        assert!(tri.intersect_plane_z(1.0).is_none());
    }

    #[test]
    fn test_from_stl_mesh_skips_bad_indices() {
        let stl = stl_io::IndexedMesh {
            vertices: vec![
                stl_io::Vector::new([0.0, 0.0, 0.0]),
                stl_io::Vector::new([1.0, 0.0, 0.0]),
                stl_io::Vector::new([0.0, 1.0, 1.0]),
            ],
            faces: vec![
                stl_io::IndexedTriangle {
                    normal: stl_io::Vector::new([0.0, 0.0, 1.0]),
                    vertices: [0, 1, 2],
                },
                stl_io::IndexedTriangle {
                    normal: stl_io::Vector::new([0.0, 0.0, 1.0]),
                    vertices: [0, 1, 7],
                },
            ],
        };
        let mesh = Mesh3D::from_stl_mesh(&stl);
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.bounds_max.z, 1.0);
    }
}
