//! Bin packing of path groups onto the bed.
//!
//! A binary-tree packer: each placed block splits the free node it lands in
//! into a node to its right and a node below it. When the blocks do not fit,
//! the surface grows by [`GROWTH_FACTOR`] and packing restarts, up to
//! [`MAX_GROWTH_ATTEMPTS`] times.

use laserkit_core::{LaserError, PathGroup, Point, Result, EPSILON};
use laserkit_settings::Settings;
use tracing::{debug, info, warn};

/// Surface growth per failed attempt.
pub const GROWTH_FACTOR: f64 = 1.1;

/// Growths tried before giving up.
pub const MAX_GROWTH_ATTEMPTS: u32 = 100;

/// Block or surface dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub w: f64,
    pub h: f64,
}

impl Size {
    pub fn new(w: f64, h: f64) -> Self {
        Self { w, h }
    }
}

#[derive(Debug, Clone, Copy)]
struct Node {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
    used: bool,
    right: Option<usize>,
    down: Option<usize>,
}

impl Node {
    fn free(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            x,
            y,
            w,
            h,
            used: false,
            right: None,
            down: None,
        }
    }
}

/// Outcome of one packing attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct PackResult {
    /// Whether every block found a place.
    pub packed: bool,
    pub pad: f64,
    /// Extent actually used by the placed blocks.
    pub max: Size,
    /// Lower-left corner per block, in input order. `None` for blocks that did not fit.
    pub placements: Vec<Option<Point>>,
}

/// Binary-tree packer over a fixed surface.
#[derive(Debug, Clone)]
pub struct Packer {
    nodes: Vec<Node>,
    pad: f64,
}

impl Packer {
    /// An empty surface of `w` by `h`, with `pad` added to every block.
    pub fn new(w: f64, h: f64, pad: f64) -> Self {
        Self {
            nodes: vec![Node::free(0.0, 0.0, w, h)],
            pad,
        }
    }

    /// Place every block, in order. Each block is padded by `pad` in both axes.
    pub fn fit(mut self, sizes: &[Size]) -> PackResult {
        let mut packed = true;
        let mut max = Size::new(0.0, 0.0);
        let mut placements = Vec::with_capacity(sizes.len());

        for size in sizes {
            let w = size.w + self.pad;
            let h = size.h + self.pad;
            match self.find(0, w, h) {
                Some(node) => {
                    let (x, y) = self.split(node, w, h);
                    max.w = max.w.max(x + w);
                    max.h = max.h.max(y + h);
                    placements.push(Some(Point::xy(x, y)));
                }
                None => {
                    packed = false;
                    placements.push(None);
                }
            }
        }

        PackResult {
            packed,
            pad: self.pad,
            max,
            placements,
        }
    }

    fn find(&self, root: usize, w: f64, h: f64) -> Option<usize> {
        let node = &self.nodes[root];
        if node.used {
            node.right
                .and_then(|right| self.find(right, w, h))
                .or_else(|| node.down.and_then(|down| self.find(down, w, h)))
        } else if w <= node.w + EPSILON && h <= node.h + EPSILON {
            Some(root)
        } else {
            None
        }
    }

    fn split(&mut self, index: usize, w: f64, h: f64) -> (f64, f64) {
        let node = self.nodes[index];
        let down = Node::free(node.x, node.y + h, node.w, node.h - h);
        let right = Node::free(node.x + w, node.y, node.w - w, h);

        self.nodes.push(down);
        let down_index = self.nodes.len() - 1;
        self.nodes.push(right);
        let right_index = self.nodes.len() - 1;

        let node = &mut self.nodes[index];
        node.used = true;
        node.down = Some(down_index);
        node.right = Some(right_index);
        (node.x, node.y)
    }
}

/// Normalize, order and place `groups`, then translate each group so the
/// packed layout is centred on the origin.
///
/// Groups are ordered by footprint area, largest first, unless
/// `layer_order` is set. The surface starts at half the bed and grows until
/// everything fits.
pub fn pack_groups(groups: &mut [PathGroup], settings: &Settings) -> Result<PackResult> {
    let process = &settings.process;
    let device = &settings.device;

    for group in groups.iter_mut() {
        group.normalize();
    }
    if !process.layer_order {
        // stable, so equal footprints keep layer order
        groups.sort_by(|a, b| b.footprint_area().total_cmp(&a.footprint_area()));
    }

    let sizes: Vec<Size> = groups.iter().map(|g| Size::new(g.width, g.height)).collect();
    let mut w = device.bed_width / 2.0;
    let mut h = device.bed_depth / 2.0;
    let pad = process.tile_spacing;

    if !(w > 0.0 && h > 0.0 && w.is_finite() && h.is_finite()) {
        return Err(LaserError::PackingImpossible {
            attempts: 0,
            groups: groups.len(),
        });
    }

    let mut attempts = 0;
    let result = loop {
        let result = Packer::new(w, h, pad).fit(&sizes);
        if result.packed {
            break result;
        }
        if attempts >= MAX_GROWTH_ATTEMPTS {
            warn!(
                "Giving up packing {} groups at {:.1} x {:.1}",
                groups.len(),
                w,
                h
            );
            return Err(LaserError::PackingImpossible {
                attempts,
                groups: groups.len(),
            });
        }
        attempts += 1;
        w *= GROWTH_FACTOR;
        h *= GROWTH_FACTOR;
        debug!("Packing surface grown to {:.1} x {:.1}", w, h);
    };

    let (cx, cy) = (result.max.w / 2.0, result.max.h / 2.0);
    for (group, fit) in groups.iter_mut().zip(&result.placements) {
        if let Some(fit) = fit {
            group.fit = Some(*fit);
            group.translate(fit.x - cx, fit.y - cy);
        }
    }

    info!(
        "Packed {} groups into {:.1} x {:.1} after {} growths",
        groups.len(),
        result.max.w,
        result.max.h,
        attempts
    );
    Ok(result)
}
