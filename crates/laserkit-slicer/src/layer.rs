//! Layers
//!
//! Runs the slicing primitive at the planned heights, nests the raw loops and
//! derives each layer's kerf-compensated contours.

use crate::heights::{plan_heights, HeightPlan, HeightPolicy};
use crate::mesh::Mesh3D;
use crate::offset::offset_tops;
use crate::primitive::{MeshSlicer, SliceRequest, ZOptions};
use laserkit_core::{nest, LaserError, Polygon, Result};
use laserkit_settings::Settings;
use tracing::info;

/// Cut contours of a layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Contours {
    /// No offset was applied; the layer's tops are the contours.
    Identity,
    Derived(Vec<Polygon>),
}

/// One horizontal cross-section of a solid.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub z: f64,
    /// Position of `z` within the height plan.
    pub index: usize,
    /// Height of the slab this layer stands for.
    pub thickness: f64,
    /// Nested polygons exactly as sliced.
    pub tops: Vec<Polygon>,
    contours: Contours,
}

impl Layer {
    pub fn new(z: f64, index: usize, thickness: f64, tops: Vec<Polygon>, contours: Contours) -> Self {
        Self {
            z,
            index,
            thickness,
            tops,
            contours,
        }
    }

    /// Kerf-compensated contours to cut.
    pub fn offset(&self) -> &[Polygon] {
        match &self.contours {
            Contours::Identity => &self.tops,
            Contours::Derived(polys) => polys,
        }
    }

    /// Whether the contours are the tops themselves or a separate offset.
    pub fn contours(&self) -> &Contours {
        &self.contours
    }
}

/// Slice `mesh` into layers according to the process settings.
///
/// `on_update` receives the fraction of heights sliced.
pub fn slice_mesh(
    mesh: &Mesh3D,
    settings: &Settings,
    slicer: &dyn MeshSlicer,
    on_update: &mut dyn FnMut(f64),
) -> Result<Vec<Layer>> {
    let process = &settings.process;
    let policy = HeightPolicy::from_process(process);
    if !(policy.slice_height >= 0.0) {
        return Err(LaserError::invalid_parameter(
            "slice_height",
            format!("invalid slice height {}", policy.slice_height),
        ));
    }

    let request = SliceRequest {
        z_min: mesh.bounds_min.z,
        z_max: mesh.bounds_max.z,
    };
    let mut plan = HeightPlan::default();
    let raw = slicer.slice(
        mesh,
        &request,
        &mut |opts: &ZOptions<'_>| -> Result<Vec<f64>> {
            plan = plan_heights(opts.z_min, opts.z_max, opts.z_indexes, &policy)?;
            Ok(plan.values().to_vec())
        },
        on_update,
    )?;

    let layers: Vec<Layer> = raw
        .into_iter()
        .enumerate()
        .map(|(position, slice)| {
            let index = plan.index_of(slice.z).unwrap_or(position);
            let thickness = plan.thickness(index, request.z_min, request.z_max);
            let tops = nest(slice.groups);
            let contours = offset_tops(&tops, process.laser_offset);
            Layer::new(slice.z, index, thickness, tops, contours)
        })
        .collect();

    info!(
        "Sliced {} layers over z {:.3}..{:.3} (offset {})",
        layers.len(),
        request.z_min,
        request.z_max,
        process.laser_offset
    );
    Ok(layers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::PlaneSlicer;

    #[test]
    fn test_offset_identity_shares_tops() {
        let mut settings = Settings::default();
        settings.process.laser_offset = 0.0;
        let mesh = Mesh3D::cuboid(4.0, 4.0, 2.0);
        let layers = slice_mesh(&mesh, &settings, &PlaneSlicer::new(), &mut |_: f64| {}).unwrap();

        assert_eq!(layers.len(), 2);
        for layer in &layers {
            assert_eq!(layer.contours(), &Contours::Identity);
            assert!(std::ptr::eq(layer.offset(), layer.tops.as_slice()));
        }
    }

    #[test]
    fn test_layer_index_and_thickness() {
        let settings = Settings::default();
        let mesh = Mesh3D::cuboid(4.0, 4.0, 3.0);
        let layers = slice_mesh(&mesh, &settings, &PlaneSlicer::new(), &mut |_: f64| {}).unwrap();

        let indexes: Vec<usize> = layers.iter().map(|l| l.index).collect();
        assert_eq!(indexes, vec![0, 1, 2]);
        assert!(layers.iter().all(|l| (l.thickness - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_negative_height_fails_before_slicing() {
        let mut settings = Settings::default();
        settings.process.slice_height = -0.5;
        let mesh = Mesh3D::new(Vec::new());
        let err = slice_mesh(&mesh, &settings, &PlaneSlicer::new(), &mut |_: f64| {}).unwrap_err();
        assert!(matches!(err, LaserError::InvalidParameter { .. }));
    }

    #[test]
    fn test_adaptive_layers_use_facet_midpoints() {
        let mut settings = Settings::default();
        settings.process.slice_height = 0.0;
        let mesh = Mesh3D::cuboid(4.0, 4.0, 3.0);
        let layers = slice_mesh(&mesh, &settings, &PlaneSlicer::new(), &mut |_: f64| {}).unwrap();
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].z, 1.5);
        assert_eq!(layers[0].thickness, 3.0);
    }
}
