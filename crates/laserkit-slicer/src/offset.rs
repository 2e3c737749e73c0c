//! Kerf compensation.
//!
//! Offsets each layer's nested polygons with a miter join. Outer boundaries
//! grow by the offset distance and holes shrink by it. The polygon offset
//! itself is delegated to Clipper2.

use crate::layer::Contours;
use clipper2::{EndType, JoinType, Path, Paths, Point as ClipPoint, PointScaler};
use laserkit_core::{nest, Point, Polygon};
use tracing::{debug, warn};

/// Fixed-point scale for Clipper2: one integer unit per micrometre.
#[derive(Debug, Default, Clone, Copy, PartialEq, Hash)]
struct Micro;

impl PointScaler for Micro {
    const MULTIPLIER: f64 = 1_000_000.0;
}

type ClipPath = Path<Micro>;

/// Miter limit used for an offset of `distance`, in multiples of the distance.
pub fn miter_limit(distance: f64) -> f64 {
    2.0 / distance.abs()
}

/// Kerf-compensated contours for `tops`. A zero distance reuses `tops` as is.
pub fn offset_tops(tops: &[Polygon], distance: f64) -> Contours {
    if distance == 0.0 {
        return Contours::Identity;
    }
    Contours::Derived(offset_polygons(tops, distance))
}

/// Offset outer boundaries outward and holes inward by `distance`, then re-nest.
///
/// Degenerate rings are skipped with a warning. Rings that collapse under a
/// negative distance disappear from the result.
pub fn offset_polygons(tops: &[Polygon], distance: f64) -> Vec<Polygon> {
    let z = tops.first().map_or(0.0, Polygon::z);
    let mut rings: Vec<ClipPath> = Vec::new();

    for top in tops {
        if let Err(e) = top.validate() {
            warn!("Skipping outer polygon at z={:.3}: {}", top.z(), e);
            continue;
        }
        rings.push(to_clip_path(top, true));
        for hole in &top.inner {
            if let Err(e) = hole.validate() {
                warn!("Skipping hole at z={:.3}: {}", hole.z(), e);
                continue;
            }
            rings.push(to_clip_path(hole, false));
        }
    }

    if rings.is_empty() {
        return Vec::new();
    }

    // inflate scales the miter limit like a coordinate
    let inflated = Paths::new(rings).inflate(
        distance,
        JoinType::Miter,
        EndType::Polygon,
        Micro::descale(miter_limit(distance)),
    );

    let loops: Vec<Polygon> = inflated
        .iter()
        .map(|path| from_clip_path(path, z))
        .filter(|p| p.len() >= 3)
        .collect();

    debug!(
        "Offset {:.3} at z={:.3}: {} rings -> {} rings",
        distance,
        z,
        tops.iter().map(|t| 1 + t.inner.len()).sum::<usize>(),
        loops.len()
    );
    nest(loops)
}

/// Outers go in counter-clockwise and holes clockwise so a positive delta
/// grows material.
fn to_clip_path(polygon: &Polygon, outer: bool) -> ClipPath {
    let mut ring = Polygon::new(polygon.points.clone());
    if outer {
        ring.set_counter_clockwise();
    } else {
        ring.set_clockwise();
    }
    Path::new(
        ring.points
            .iter()
            .map(|p| ClipPoint::<Micro>::new(p.x, p.y))
            .collect(),
    )
}

fn from_clip_path(path: &ClipPath, z: f64) -> Polygon {
    Polygon::new(path.iter().map(|p| Point::new(p.x(), p.y(), z)).collect())
}
