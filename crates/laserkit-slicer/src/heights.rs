//! Z-height selection
//!
//! Decides where the mesh is cut. Three policies, checked in order:
//! a single absolute height, a fixed pitch from the bottom of the solid, or
//! midpoints between the mesh's distinct facet heights with an optional
//! minimum gap between kept layers.

use laserkit_core::{LaserError, Result, EPSILON};
use laserkit_settings::ProcessSettings;
use tracing::debug;

/// Height selection policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightPolicy {
    pub single: bool,
    pub slice_height: f64,
    pub min_gap: f64,
}

impl HeightPolicy {
    /// Policy for the slice height and adaptive flag in `process`.
    pub fn from_process(process: &ProcessSettings) -> Self {
        Self {
            single: process.slice_single,
            slice_height: process.slice_height,
            min_gap: process.slice_height_min,
        }
    }
}

/// Strictly increasing slice heights.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HeightPlan {
    values: Vec<f64>,
}

impl HeightPlan {
    /// Heights in ascending order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Position of `z` within the plan.
    pub fn index_of(&self, z: f64) -> Option<usize> {
        self.values.iter().position(|v| (v - z).abs() < EPSILON)
    }

    /// Height of the slab represented by the plane at `index`: from the
    /// midpoint with the plane below to the midpoint with the plane above,
    /// using the solid's own extent at either end.
    pub fn thickness(&self, index: usize, z_min: f64, z_max: f64) -> f64 {
        let Some(&z) = self.values.get(index) else {
            return 0.0;
        };
        let lower = match index.checked_sub(1).and_then(|i| self.values.get(i)) {
            Some(prev) => (prev + z) / 2.0,
            None => z_min.min(z),
        };
        let upper = match self.values.get(index + 1) {
            Some(next) => (z + next) / 2.0,
            None => z_max.max(z),
        };
        (upper - lower).max(0.0)
    }
}

/// Compute the heights at which to slice a solid spanning `[z_min, z_max]`.
///
/// `z_indexes` are the mesh's facet heights; they are only used by the
/// adaptive policy and need not be sorted.
pub fn plan_heights(
    z_min: f64,
    z_max: f64,
    z_indexes: &[f64],
    policy: &HeightPolicy,
) -> Result<HeightPlan> {
    let h = policy.slice_height;
    if !(h >= 0.0) {
        return Err(LaserError::invalid_parameter(
            "slice_height",
            format!("invalid slice height {}", h),
        ));
    }

    let values = if policy.single {
        vec![h]
    } else if h > 0.0 {
        fixed_pitch(z_min, z_max, h)
    } else {
        let mids = facet_midpoints(z_indexes);
        if policy.min_gap > 0.0 {
            drop_close(mids, policy.min_gap)
        } else {
            mids
        }
    };

    debug!(
        "Height plan: {} planes over z {:.3}..{:.3}",
        values.len(),
        z_min,
        z_max
    );
    Ok(HeightPlan { values })
}

fn fixed_pitch(z_min: f64, z_max: f64, h: f64) -> Vec<f64> {
    let mut values = Vec::new();
    let mut i = 0u32;
    loop {
        let z = z_min + h / 2.0 + f64::from(i) * h;
        if z >= z_max {
            break;
        }
        values.push(z);
        i += 1;
    }
    values
}

fn facet_midpoints(z_indexes: &[f64]) -> Vec<f64> {
    let mut zs: Vec<f64> = z_indexes.iter().copied().filter(|z| z.is_finite()).collect();
    zs.sort_by(f64::total_cmp);
    zs.dedup_by(|a, b| (*a - *b).abs() < EPSILON);
    zs.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect()
}

/// Greedy pass keeping a value only when it is at least `gap` above the last kept one.
fn drop_close(values: Vec<f64>, gap: f64) -> Vec<f64> {
    let mut kept: Vec<f64> = Vec::with_capacity(values.len());
    for v in values {
        match kept.last() {
            Some(last) if (v - last).abs() < gap => {}
            _ => kept.push(v),
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(single: bool, slice_height: f64, min_gap: f64) -> HeightPolicy {
        HeightPolicy {
            single,
            slice_height,
            min_gap,
        }
    }

    #[test]
    fn test_single_height() {
        let plan = plan_heights(0.0, 10.0, &[], &policy(true, 3.5, 0.0)).unwrap();
        assert_eq!(plan.values(), &[3.5]);
        assert_eq!(plan.thickness(0, 0.0, 10.0), 10.0);
    }

    #[test]
    fn test_fixed_pitch() {
        let plan = plan_heights(0.0, 5.0, &[0.0, 5.0], &policy(false, 1.0, 0.0)).unwrap();
        assert_eq!(plan.values(), &[0.5, 1.5, 2.5, 3.5, 4.5]);
        assert_eq!(plan.index_of(2.5), Some(2));
        for i in 0..plan.len() {
            assert!((plan.thickness(i, 0.0, 5.0) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_fixed_pitch_thin_solid_is_empty() {
        let plan = plan_heights(0.0, 0.4, &[], &policy(false, 1.0, 0.0)).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_adaptive_midpoints() {
        let plan = plan_heights(0.0, 4.0, &[4.0, 0.0, 1.0, 1.0], &policy(false, 0.0, 0.0)).unwrap();
        assert_eq!(plan.values(), &[0.5, 2.5]);
    }

    #[test]
    fn test_adaptive_min_gap_is_greedy() {
        let zs = [0.0, 1.0, 1.2, 1.4, 3.0];
        // midpoints 0.5, 1.1, 1.3, 2.2; 1.1 is measured against 0.5, not against 1.3
        let plan = plan_heights(0.0, 3.0, &zs, &policy(false, 0.0, 0.7)).unwrap();
        let expected = [0.5, 1.3, 2.2];
        assert_eq!(plan.len(), expected.len());
        for (got, want) in plan.values().iter().zip(expected) {
            assert!((got - want).abs() < 1e-12);
        }
    }

    #[test]
    fn test_negative_height_rejected_in_every_mode() {
        for single in [true, false] {
            let err = plan_heights(0.0, 1.0, &[], &policy(single, -1.0, 0.0)).unwrap_err();
            assert!(matches!(err, LaserError::InvalidParameter { .. }));
        }
    }
}
