use super::config::SimulationType;
use super::error::SimulationError;
use crate::core::random::RandomState;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the restart file written to the execution directory.
pub const RESTART_FILE: &str = "simulation.restart";

/// Position of a simulation in its cycle range.
///
/// `step` is the absolute cycle number, `stepno` the number of cycles performed since
/// the simulation object was created (or restored).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleCounter {
    pub step: u64,
    pub stepno: u64,
    pub start: u64,
    pub end: u64,
}

impl CycleCounter {
    pub fn new(start: u64, end: u64) -> Self {
        Self {
            step: start,
            stepno: 0,
            start,
            end,
        }
    }

    pub fn advance(&mut self) {
        self.step += 1;
        self.stepno += 1;
    }

    pub fn is_finished(&self) -> bool {
        self.step >= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineRestart {
    pub rgen: RandomState,
}

/// Everything needed to resume a simulation bit for bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestartInfo {
    pub cycle: CycleCounter,
    pub rgen: RandomState,
    #[serde(rename = "type")]
    pub simulation_type: SimulationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<EngineRestart>,
}

impl RestartInfo {
    pub fn write(&self, path: &Path) -> Result<(), SimulationError> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text).map_err(|e| SimulationError::RestartIo {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }

    pub fn read(path: &Path) -> Result<Self, SimulationError> {
        let text = std::fs::read_to_string(path).map_err(|e| SimulationError::RestartIo {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Ok(serde_json::from_str(&text)?)
    }
}
