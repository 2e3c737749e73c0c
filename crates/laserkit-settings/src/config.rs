//! Job settings for LaserKit
//!
//! Settings are split the way a job is described to the machine:
//! - Process settings (slicing, kerf offset, output modes, drag-knife)
//! - Device settings (bed size, G-code templates)
//!
//! Both sections deserialize with defaults for every missing field, so a
//! settings file only needs the values that differ. Files may be JSON or TOML.

use crate::error::{SettingsError, SettingsResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Slicing, offset and output parameters for one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessSettings {
    /// Kerf compensation distance. 0 disables offsetting.
    pub laser_offset: f64,
    /// Layer pitch, or the absolute height when `slice_single` is set.
    /// 0 derives layers from the mesh's facet heights.
    pub slice_height: f64,
    /// Minimum gap between adaptive layers. 0 keeps all of them.
    pub slice_height_min: f64,
    /// Cut a single layer at `slice_height`.
    pub slice_single: bool,
    /// Padding between packed layer groups.
    pub tile_spacing: f64,
    /// Laser power in percent.
    pub power: f64,
    /// Cutting feed rate.
    pub speed: f64,
    /// Collect every layer into one group instead of packing layers separately.
    pub group: bool,
    /// Color output by layer instead of by path type.
    pub z_color: bool,
    /// Keep layer order when packing instead of sorting by size.
    pub layer_order: bool,
    /// Score the outline of the layer above onto each layer.
    pub stack: bool,
    /// Collapse identical outlines across layers into one weighted path.
    pub merged: bool,
    /// Center the job on the bed instead of placing it at the lower-left corner.
    pub origin_center: bool,
    pub invert_x: bool,
    pub invert_y: bool,
    /// Drag-knife mode.
    pub knife_on: bool,
    /// Depth increment per knife pass.
    pub knife_depth: f64,
    /// Number of knife passes per path.
    pub knife_passes: u32,
    /// Distance from the knife's pivot to its tip.
    pub knife_tip: f64,
}

impl Default for ProcessSettings {
    fn default() -> Self {
        Self {
            laser_offset: 0.25,
            slice_height: 1.0,
            slice_height_min: 0.0,
            slice_single: false,
            tile_spacing: 1.0,
            power: 100.0,
            speed: 1000.0,
            group: false,
            z_color: false,
            layer_order: false,
            stack: false,
            merged: false,
            origin_center: true,
            invert_x: false,
            invert_y: false,
            knife_on: false,
            knife_depth: 1.0,
            knife_passes: 1,
            knife_tip: 2.0,
        }
    }
}

/// Machine description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSettings {
    pub bed_width: f64,
    pub bed_depth: f64,
    /// Put a space between G-code words.
    pub gcode_space: bool,
    /// Lines written before the first move.
    pub gcode_pre: Vec<String>,
    /// Lines written after the last move.
    pub gcode_post: Vec<String>,
    /// Laser-on template. Supports `{power}`, `{color}`, `{thick}` and `{z}`.
    pub gcode_laser_on: Vec<String>,
    pub gcode_laser_off: Vec<String>,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            bed_width: 300.0,
            bed_depth: 175.0,
            gcode_space: true,
            gcode_pre: Vec::new(),
            gcode_post: Vec::new(),
            gcode_laser_on: vec!["M106 S{power}".to_string()],
            gcode_laser_off: vec!["M107".to_string()],
        }
    }
}

/// Complete job settings, read-only for the pipeline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub process: ProcessSettings,
    pub device: DeviceSettings,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path)?;

        let settings: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&content)?
        } else {
            return Err(SettingsError::UnsupportedFormat(
                path.display().to_string(),
            ));
        };

        settings.validate()?;
        debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Save settings to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::to_string_pretty(self)?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            self.to_toml()?
        } else {
            return Err(SettingsError::UnsupportedFormat(
                path.display().to_string(),
            ));
        };

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Serialize as pretty TOML.
    pub fn to_toml(&self) -> SettingsResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate settings
    pub fn validate(&self) -> SettingsResult<()> {
        let process = &self.process;
        let device = &self.device;

        if !(process.slice_height >= 0.0) {
            return Err(SettingsError::invalid(
                "slice_height",
                "must not be negative",
            ));
        }

        if !(process.slice_height_min >= 0.0) {
            return Err(SettingsError::invalid(
                "slice_height_min",
                "must not be negative",
            ));
        }

        if !(process.laser_offset.is_finite()) {
            return Err(SettingsError::invalid("laser_offset", "must be finite"));
        }

        if !(process.tile_spacing >= 0.0) {
            return Err(SettingsError::invalid(
                "tile_spacing",
                "must not be negative",
            ));
        }

        if !(device.bed_width > 0.0) || !(device.bed_depth > 0.0) {
            return Err(SettingsError::invalid(
                "bed_size",
                "bed width and depth must be > 0",
            ));
        }

        if process.knife_on {
            if process.knife_passes == 0 {
                return Err(SettingsError::invalid("knife_passes", "must be > 0"));
            }
            if !(process.knife_tip > 0.0) {
                return Err(SettingsError::invalid("knife_tip", "must be > 0"));
            }
        }

        Ok(())
    }
}
