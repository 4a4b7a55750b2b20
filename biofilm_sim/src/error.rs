//! Error types for the scenario harness.

use biofilm_core::ColonyError;
use thiserror::Error;

/// Errors that can occur while preparing or exporting a run.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Colony construction or seeding failed
    #[error("Colony error: {0}")]
    Colony(#[from] ColonyError),

    /// Reading a config file or writing an export failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config or export JSON was malformed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Override names a field `ColonyConfig` does not have
    #[error("Unknown config field: {0}")]
    UnknownConfigField(String),

    /// Override file did not contain a JSON object
    #[error("Config file {0} must contain a JSON object")]
    NotAnObject(String),

    /// Scenario name not recognized
    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),
}
