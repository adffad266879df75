use super::config::Settings;
use super::error::SimulationError;
use super::restart::CycleCounter;
use crate::core::models::system::{System, SystemError};
use crate::core::path::path::{Interfaces, Path, Status};
use crate::core::random::RandomHandle;
use nalgebra::DVector;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// The time integrator used to propagate trajectories.
///
/// Only its random generator takes part in restarts.
pub trait Engine: fmt::Debug {
    fn name(&self) -> &str;

    fn rgen(&self) -> Option<&RandomHandle> {
        None
    }
}

/// Maps a system configuration to an order parameter.
pub trait OrderParameter: fmt::Debug {
    fn name(&self) -> &str;

    fn calculate(&self, system: &System) -> Result<Vec<f64>, SystemError>;
}

/// A path ensemble: its interfaces, its current path and its output locations.
pub trait PathEnsemble: fmt::Debug {
    fn ensemble_number(&self) -> usize;

    fn ensemble_name(&self) -> &str;

    fn interfaces(&self) -> Interfaces;

    /// Named output directories of the ensemble.
    fn directory(&self) -> &BTreeMap<String, PathBuf>;

    /// Directories that have to exist before output is written.
    fn directories(&self) -> Vec<PathBuf> {
        self.directory().values().cloned().collect()
    }

    /// Records a path generated in `cycle`; an accepted path becomes the current path.
    fn add_path(&mut self, path: Path, status: Status, cycle: u64);

    /// The currently accepted path.
    fn last_path(&self) -> Option<&Path>;

    fn write_restart(&self) -> Result<(), SimulationError>;
}

/// Shooting parameters derived once from the settings at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ShootingParameters {
    pub aimless: bool,
    /// Per-particle velocity widths, present when shooting is not aimless.
    pub sigma_v: Option<DVector<f64>>,
}

/// The parts of a simulation a move routine may use during one cycle.
pub struct SimulationContext<'a> {
    pub system: &'a mut System,
    pub order_function: &'a dyn OrderParameter,
    pub engine: &'a mut dyn Engine,
    pub rgen: &'a RandomHandle,
    pub settings: &'a Settings,
    pub shooting: &'a ShootingParameters,
    pub cycle: CycleCounter,
}

/// The outcome of a move in one ensemble. A rejected move is not an error.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveOutcome {
    pub accept: bool,
    pub trial: Path,
    pub status: Status,
}

/// The outcome for one ensemble of a replica exchange cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct RetisOutcome {
    pub ensemble_number: usize,
    /// Short name of the move performed, such as `"sh"`, `"swap"` or `"nullmove"`.
    pub mc_move: String,
    pub accept: bool,
    pub trial: Path,
    pub status: Status,
}

/// Generates the initial path of an ensemble.
pub trait PathInitializer {
    fn initiate(
        &mut self,
        context: &mut SimulationContext<'_>,
        ensemble: &mut dyn PathEnsemble,
    ) -> Result<MoveOutcome, SimulationError>;
}

/// Performs one TIS move in a single ensemble.
pub trait TisMove {
    fn make_move(
        &mut self,
        context: &mut SimulationContext<'_>,
        ensemble: &mut dyn PathEnsemble,
    ) -> Result<MoveOutcome, SimulationError>;
}

/// Performs one replica exchange cycle over all ensembles at once.
///
/// Outcomes are returned in the order the ensembles were processed.
pub trait RetisMove {
    fn make_cycle(
        &mut self,
        context: &mut SimulationContext<'_>,
        ensembles: &mut [Box<dyn PathEnsemble>],
    ) -> Result<Vec<RetisOutcome>, SimulationError>;
}
