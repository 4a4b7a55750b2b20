//! Error types for the biofilm model.

use thiserror::Error;

/// Errors raised when building or seeding a colony.
///
/// Nothing inside a time step can fail; numeric edge cases are clamped.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ColonyError {
    /// A configuration parameter is out of its allowed range
    #[error("Invalid configuration `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    /// Lattice index outside the volume
    #[error("Index {index} out of range for lattice of {len} sites")]
    IndexOutOfRange { index: usize, len: usize },

    /// Seeding target is not empty
    #[error("Site {0} is already occupied")]
    SiteOccupied(usize),

    /// A hand-placed cell has a timer that is not a positive finite number
    #[error("Invalid {timer} {value} for cell at site {index}")]
    InvalidTimer {
        index: usize,
        timer: &'static str,
        value: f64,
    },

    /// Random seeding asked for more cells than there are empty sites
    #[error("Requested {requested} cells but only {available} empty sites remain")]
    NotEnoughEmptySites { requested: usize, available: usize },
}

impl ColonyError {
    /// Creates a configuration error.
    pub fn config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }

    /// Creates an out-of-range error.
    pub fn out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }
}

/// Result alias for colony operations.
pub type Result<T> = std::result::Result<T, ColonyError>;
