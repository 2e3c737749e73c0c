//! Error handling for LaserKit
//!
//! A single error type is shared by every pipeline phase so that a failure in
//! slicing, emission, packing or export can be reported through one channel.
//!
//! Recoverable geometry issues use [`LaserError::GeometryDegenerate`]; callers
//! log and skip the offending polygon instead of aborting the job.

use std::io;
use thiserror::Error;

/// Errors raised by the slicing, toolpath, packing and export phases.
#[derive(Error, Debug)]
pub enum LaserError {
    /// A parameter is outside its valid domain (negative slice height, empty bed, ...).
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// The offending parameter.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// The packer grew the work surface without every group fitting.
    #[error("Packing impossible: {groups} groups did not fit after {attempts} surface growths")]
    PackingImpossible {
        /// Number of growth attempts made.
        attempts: u32,
        /// Number of groups that had to be placed.
        groups: usize,
    },

    /// A polygon has zero-length edges or too few distinct points.
    #[error("Degenerate geometry: {0}")]
    GeometryDegenerate(String),

    /// The mesh has no triangles to slice.
    #[error("Mesh contains no triangles")]
    EmptyMesh,

    /// The mesh could not be read or decoded.
    #[error("Mesh import failed: {0}")]
    MeshImport(String),

    /// The slicing primitive reported a failure.
    #[error("Slicing failed: {0}")]
    SliceFailed(String),

    /// Settings could not be loaded, saved or validated.
    #[error("Settings error: {0}")]
    Settings(String),

    /// I/O error while reading input or writing output.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl LaserError {
    /// Shorthand for [`LaserError::InvalidParameter`].
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// True for errors that only cost a single polygon.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::GeometryDegenerate(_))
    }
}

/// Result type used throughout LaserKit.
pub type Result<T> = std::result::Result<T, LaserError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameter_display() {
        let err = LaserError::invalid_parameter("slice_height", "must not be negative");
        assert_eq!(
            err.to_string(),
            "Invalid parameter 'slice_height': must not be negative"
        );
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_packing_error_display() {
        let err = LaserError::PackingImpossible {
            attempts: 100,
            groups: 3,
        };
        assert_eq!(
            err.to_string(),
            "Packing impossible: 3 groups did not fit after 100 surface growths"
        );
    }

    #[test]
    fn test_degenerate_is_recoverable() {
        let err = LaserError::GeometryDegenerate("2 distinct points".to_string());
        assert!(err.is_recoverable());
        assert_eq!(err.to_string(), "Degenerate geometry: 2 distinct points");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "missing.stl");
        let err: LaserError = io_err.into();
        assert!(matches!(err, LaserError::Io(_)));
        assert_eq!(err.to_string(), "I/O error: missing.stl");
    }
}
