//! Output format selection.

use crate::dxf::DxfBackend;
use crate::gcode::GcodeBackend;
use crate::svg::SvgBackend;
use crate::traverse::export_groups;
use laserkit_core::{LaserError, PathGroup};
use laserkit_settings::Settings;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Gcode,
    Svg,
    Dxf,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [Self::Gcode, Self::Svg, Self::Dxf];

    /// Conventional file extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Gcode => "gcode",
            Self::Svg => "svg",
            Self::Dxf => "dxf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = LaserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gcode" | "nc" | "g" => Ok(Self::Gcode),
            "svg" => Ok(Self::Svg),
            "dxf" => Ok(Self::Dxf),
            other => Err(LaserError::invalid_parameter(
                "format",
                format!("unknown output format '{}'", other),
            )),
        }
    }
}

/// Serialize packed groups in `format`.
pub fn export(groups: &[PathGroup], settings: &Settings, format: ExportFormat) -> String {
    let output = match format {
        ExportFormat::Gcode => export_groups(groups, settings, GcodeBackend::new(settings)),
        ExportFormat::Svg => export_groups(groups, settings, SvgBackend::new(settings)),
        ExportFormat::Dxf => export_groups(groups, settings, DxfBackend::new()),
    };
    info!("Rendered {} groups as {} ({} bytes)", groups.len(), format, output.len());
    output
}
