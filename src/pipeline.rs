//! Job pipeline
//!
//! Runs the phases in order for a set of widgets:
//! slice (0% to 50%), emit (50% to 75%), pack (75% to 80%), render (80% to 100%).
//! Any fatal error ends the run; partial results are dropped and the
//! observer's completion callback receives the error text.

use laserkit_camtools::{pack_groups, PackResult, ToolpathEmitter};
use laserkit_core::{JobObserver, JobPhase, LaserError, PathGroup, PhaseProgress, Result};
use laserkit_export::{export, ExportFormat};
use laserkit_settings::Settings;
use laserkit_slicer::{slice_mesh, Layer, Mesh3D, MeshSlicer};
use tracing::{debug, info};

/// A named mesh placed in the job.
#[derive(Debug, Clone)]
pub struct Widget {
    pub name: String,
    pub mesh: Mesh3D,
}

impl Widget {
    pub fn new(name: impl Into<String>, mesh: Mesh3D) -> Self {
        Self {
            name: name.into(),
            mesh,
        }
    }
}

/// Packed path groups ready for export.
#[derive(Debug, Clone)]
pub struct PreparedJob {
    pub groups: Vec<PathGroup>,
    pub pack: PackResult,
    /// Layers sliced across all widgets.
    pub layer_count: usize,
}

/// Slice every widget. Returns one layer list per widget, in input order.
pub fn slice_widgets(
    widgets: &[Widget],
    settings: &Settings,
    slicer: &dyn MeshSlicer,
    progress: &mut PhaseProgress<'_>,
) -> Result<Vec<Vec<Layer>>> {
    let count = widgets.len().max(1) as f64;
    let mut sliced = Vec::with_capacity(widgets.len());
    for (i, widget) in widgets.iter().enumerate() {
        debug!("Slicing widget '{}' ({} triangles)", widget.name, widget.mesh.triangle_count());
        let layers = slice_mesh(&widget.mesh, settings, slicer, &mut |f: f64| {
            progress.report((i as f64 + f) / count, Some(widget.name.as_str()));
        })?;
        sliced.push(layers);
    }
    Ok(sliced)
}

/// Slice, emit and pack `widgets`.
pub fn prepare_job(
    widgets: &[Widget],
    settings: &Settings,
    slicer: &dyn MeshSlicer,
    observer: &dyn JobObserver,
) -> Result<PreparedJob> {
    settings.validate()?;
    if widgets.is_empty() {
        return Err(LaserError::EmptyMesh);
    }

    let mut slicing = PhaseProgress::new(observer, JobPhase::Slice, 0.0, 0.5);
    let sliced = slice_widgets(widgets, settings, slicer, &mut slicing)?;
    let layer_count = sliced.iter().map(Vec::len).sum();

    let mut emitting = PhaseProgress::new(observer, JobPhase::Prepare, 0.5, 0.25);
    let emitter = ToolpathEmitter::new(settings);
    let count = sliced.len() as f64;
    let mut groups = Vec::new();
    for (i, layers) in sliced.iter().enumerate() {
        groups.extend(emitter.emit(layers, &mut |f: f64| {
            emitting.report((i as f64 + f) / count, None);
        }));
    }

    let mut packing = PhaseProgress::new(observer, JobPhase::Pack, 0.75, 0.05);
    let pack = pack_groups(&mut groups, settings)?;
    packing.report(1.0, None);

    info!(
        "Prepared {} widgets: {} layers, {} groups on {:.1} x {:.1}",
        widgets.len(),
        layer_count,
        groups.len(),
        pack.max.w,
        pack.max.h
    );
    Ok(PreparedJob {
        groups,
        pack,
        layer_count,
    })
}

/// Render a prepared job.
pub fn export_job(
    job: &PreparedJob,
    settings: &Settings,
    format: ExportFormat,
    observer: &dyn JobObserver,
) -> String {
    let mut rendering = PhaseProgress::new(observer, JobPhase::Render, 0.8, 0.2);
    rendering.report(0.0, Some(format.extension()));
    let output = export(&job.groups, settings, format);
    rendering.report(1.0, Some(format.extension()));
    output
}

/// Prepare and render in one go, reporting completion to `observer`.
pub fn run_job(
    widgets: &[Widget],
    settings: &Settings,
    slicer: &dyn MeshSlicer,
    format: ExportFormat,
    observer: &dyn JobObserver,
) -> Result<String> {
    let result = prepare_job(widgets, settings, slicer, observer)
        .map(|job| export_job(&job, settings, format, observer));
    match &result {
        Ok(_) => observer.on_complete(None),
        Err(e) => observer.on_complete(Some(&e.to_string())),
    }
    result
}
