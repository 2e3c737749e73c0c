//! Settings for LaserKit jobs.
//!
//! [`Settings`] is an immutable value handed by reference to every pipeline
//! phase. It loads from and saves to JSON or TOML files.

pub mod config;
pub mod error;

pub use config::{DeviceSettings, ProcessSettings, Settings};
pub use error::{SettingsError, SettingsResult};
