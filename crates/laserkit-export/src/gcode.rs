//! G-code output.
//!
//! Laser mode switches the beam with the device's on/off templates around
//! every polygon. Drag-knife mode lifts to Z5 between polygons and plunges
//! one depth step further on each pass.

use crate::traverse::{ExportBackend, Extents};
use laserkit_core::Point;
use laserkit_settings::Settings;

/// Safe travel height for the drag knife.
pub const KNIFE_LIFT_Z: f64 = 5.0;

/// Collects G-code lines for one job.
#[derive(Debug, Clone)]
pub struct GcodeBackend {
    space: &'static str,
    pre: Vec<String>,
    post: Vec<String>,
    laser_on: Vec<String>,
    laser_off: Vec<String>,
    knife: bool,
    knife_depth: f64,
    passes: u32,
    power: String,
    feedrate: String,
    lines: Vec<String>,
}

impl GcodeBackend {
    /// Backend using the device templates and knife settings from `settings`.
    pub fn new(settings: &Settings) -> Self {
        let device = &settings.device;
        let process = &settings.process;
        Self {
            space: if device.gcode_space { " " } else { "" },
            pre: device.gcode_pre.clone(),
            post: device.gcode_post.clone(),
            laser_on: device.gcode_laser_on.clone(),
            laser_off: device.gcode_laser_off.clone(),
            knife: process.knife_on,
            knife_depth: process.knife_depth,
            passes: if process.knife_on {
                process.knife_passes
            } else {
                1
            },
            power: String::new(),
            feedrate: String::new(),
            lines: Vec::new(),
        }
    }

    fn coords(&self, point: &Point) -> String {
        format!("X{:.3}{}Y{:.3}", point.x, self.space, point.y)
    }

    fn laser_on_lines(&self, color: u32, thick: f64, z: f64) -> Vec<String> {
        self.laser_on
            .iter()
            .map(|line| {
                line.replace("{power}", &self.power)
                    .replace("{color}", &color.to_string())
                    .replace("{thick}", &thick.to_string())
                    .replace("{z}", &z.to_string())
            })
            .collect()
    }
}

/// Spindle/laser power scaled from percent to the 0..256 PWM range.
pub fn scaled_power(percent: f64) -> String {
    format!("{:.3}", 256.0 * (percent / 100.0))
}

impl ExportBackend for GcodeBackend {
    type Vertex = Point;

    fn on_preamble(&mut self, _extents: &Extents, power: f64, speed: f64) {
        self.power = scaled_power(power);
        self.feedrate = format!("{}F{}", self.space, speed);
        self.lines.extend(self.pre.iter().cloned());
    }

    fn on_point(&mut self, point: &Point) -> Point {
        *point
    }

    fn on_polygon(&mut self, polygon: Vec<Point>, color: u32, thick: f64) {
        let sp = self.space;
        let z = polygon.last().map_or(0.0, |p| p.z);
        if self.knife {
            self.lines
                .push(format!("; start new poly len={}", polygon.len()));
        }

        for pass in 1..=self.passes {
            for (index, point) in polygon.iter().enumerate() {
                match index {
                    0 => {
                        if self.knife {
                            self.lines.push("; drag-knife lift".to_string());
                            self.lines.push(format!("G0{sp}Z{KNIFE_LIFT_Z}"));
                        }
                        self.lines.push(format!("G0{sp}{}", self.coords(point)));
                        if self.knife {
                            self.lines.push("; drag-knife down".to_string());
                            self.lines
                                .push(format!("G0{sp}Z{}", -(pass as f64) * self.knife_depth));
                        }
                    }
                    1 => {
                        let on = self.laser_on_lines(color, thick, z);
                        self.lines.extend(on);
                        self.lines
                            .push(format!("G1{sp}{}{}", self.coords(point), self.feedrate));
                    }
                    _ => self.lines.push(format!("G1{sp}{}", self.coords(point))),
                }
            }
            self.lines.extend(self.laser_off.iter().cloned());
        }

        if self.knife {
            self.lines.push(format!("G0{sp}Z{KNIFE_LIFT_Z}"));
        }
    }

    fn on_postamble(&mut self) {
        self.lines.extend(self.post.iter().cloned());
    }

    fn into_output(self) -> String {
        self.lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Point> {
        [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 0.0)]
            .iter()
            .map(|&(x, y)| Point::new(x, y, 0.5))
            .collect()
    }

    fn extents() -> Extents {
        Extents {
            min: Point::ORIGIN,
            max: Point::xy(10.0, 10.0),
        }
    }

    #[test]
    fn test_scaled_power() {
        assert_eq!(scaled_power(100.0), "256.000");
        assert_eq!(scaled_power(50.0), "128.000");
        assert_eq!(scaled_power(33.0), "84.480");
    }

    #[test]
    fn test_laser_polygon() {
        let mut settings = Settings::default();
        settings.device.gcode_pre = vec!["G21".to_string(), "G90".to_string()];
        settings.device.gcode_post = vec!["M2".to_string()];
        let mut backend = GcodeBackend::new(&settings);
        backend.on_preamble(&extents(), 100.0, 1000.0);
        backend.on_polygon(square(), 1, 1.0);
        backend.on_postamble();

        let expected = [
            "G21",
            "G90",
            "G0 X0.000 Y0.000",
            "M106 S256.000",
            "G1 X10.000 Y0.000 F1000",
            "G1 X10.000 Y10.000",
            "G1 X0.000 Y0.000",
            "M107",
            "M2",
        ]
        .join("\n");
        assert_eq!(backend.into_output(), expected);
    }

    #[test]
    fn test_compact_words_and_template_tokens() {
        let mut settings = Settings::default();
        settings.device.gcode_space = false;
        settings.device.gcode_laser_on = vec!["; c={color} h={thick} z={z}".to_string(), "M3 S{power}".to_string()];
        let mut backend = GcodeBackend::new(&settings);
        backend.on_preamble(&extents(), 50.0, 600.0);
        backend.on_polygon(square(), 3, 2.5);

        let out = backend.into_output();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "G0X0.000Y0.000");
        assert_eq!(lines[1], "; c=3 h=2.5 z=0.5");
        assert_eq!(lines[2], "M3 S128.000");
        assert_eq!(lines[3], "G1X10.000Y0.000F600");
    }

    #[test]
    fn test_knife_passes_step_down() {
        let mut settings = Settings::default();
        settings.process.knife_on = true;
        settings.process.knife_passes = 2;
        settings.process.knife_depth = 0.5;
        settings.device.gcode_laser_on.clear();
        settings.device.gcode_laser_off.clear();
        let mut backend = GcodeBackend::new(&settings);
        backend.on_preamble(&extents(), 100.0, 1000.0);
        backend.on_polygon(square(), 1, 1.0);

        let out = backend.into_output();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "; start new poly len=4");
        assert_eq!(&lines[1..6], &["; drag-knife lift", "G0 Z5", "G0 X0.000 Y0.000", "; drag-knife down", "G0 Z-0.5"]);
        assert!(lines.contains(&"G0 Z-1"));
        assert_eq!(lines.iter().filter(|l| l.starts_with("G1")).count(), 6);
        assert_eq!(lines.last().copied(), Some("G0 Z5"));
    }
}
