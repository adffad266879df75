use thiserror::Error;

use super::config::{ConfigError, SimulationType};
use crate::core::models::system::SystemError;
use crate::core::path::error::PathError;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Simulation '{simulation}' requires the setting '{key}'")]
    MissingSetting {
        key: &'static str,
        simulation: String,
    },

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Simulation '{simulation}' cannot use these ensembles: {reason}")]
    Ensembles { simulation: String, reason: String },

    #[error("System error: {source}")]
    System {
        #[from]
        source: SystemError,
    },

    #[error("Path error: {source}")]
    Path {
        #[from]
        source: PathError,
    },

    #[error("Restart file '{path}' could not be accessed: {source}")]
    RestartIo {
        path: String,
        source: std::io::Error,
    },

    #[error("Malformed restart record: {0}")]
    RestartFormat(#[from] serde_json::Error),

    #[error("Restart record belongs to a '{found}' simulation, expected '{expected}'")]
    RestartMismatch {
        expected: SimulationType,
        found: SimulationType,
    },

    #[error("Output task '{task}' failed: {source}")]
    Output {
        task: String,
        source: std::io::Error,
    },

    #[error("Could not create directory '{path}': {source}")]
    Directory {
        path: String,
        source: std::io::Error,
    },

    #[error("Initial path for ensemble '{ensemble}' could not be generated: {reason}")]
    Initiation { ensemble: String, reason: String },

    #[error("Move failed: {0}")]
    Move(String),
}
