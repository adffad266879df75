use super::config::{ConfigError, Settings, SigmaV, SimulationType, TisSettings};
use super::error::SimulationError;
use super::exit::SoftExit;
use super::output::{OutputTask, PATH_OUTPUT_TASKS, PROGRESS_OUTPUT_TASK};
use super::restart::{CycleCounter, EngineRestart, RESTART_FILE, RestartInfo};
use super::result::{EnsembleSummary, SimulationResult, ensemble_result};
use super::traits::{
    Engine, OrderParameter, PathEnsemble, PathInitializer, ShootingParameters, SimulationContext,
};
use crate::core::models::system::System;
use crate::core::random::RandomHandle;
use nalgebra::DVector;
use std::path::PathBuf;
use tracing::{debug, error, info, instrument, warn};

/// Key of the ensemble directory output files are written to.
pub const PATH_ENSEMBLE_DIRECTORY: &str = "path-ensemble";

/// The collaborators a path simulation is assembled from.
pub struct SimulationComponents {
    pub system: System,
    pub order_function: Box<dyn OrderParameter>,
    pub engine: Box<dyn Engine>,
    pub ensembles: Vec<Box<dyn PathEnsemble>>,
    pub settings: Settings,
}

/// State and behaviour shared by all path simulations.
///
/// The simulation exclusively owns the system. Its random generator is shared by all
/// ensembles and consumed in ensemble order, which keeps restarted runs identical to
/// uninterrupted ones.
#[derive(Debug)]
pub struct PathSimulation {
    name: String,
    simulation_type: SimulationType,
    system: System,
    order_function: Box<dyn OrderParameter>,
    engine: Box<dyn Engine>,
    ensembles: Vec<Box<dyn PathEnsemble>>,
    settings: Settings,
    shooting: ShootingParameters,
    rgen: RandomHandle,
    cycle: CycleCounter,
    output_tasks: Vec<OutputTask>,
    soft_exit: SoftExit,
}

impl PathSimulation {
    /// Creates a path simulation.
    ///
    /// # Arguments
    ///
    /// * `name` - Human readable name used in logs and errors.
    /// * `simulation_type` - The type recorded in restart files.
    /// * `required` - Settings sections that must be present.
    /// * `components` - System, order parameter, engine, ensembles and settings.
    ///
    /// # Errors
    ///
    /// Fails when a required section is missing, when the force field of the system
    /// cannot be evaluated, or when the shooting parameters do not fit the system.
    pub fn new(
        name: &str,
        simulation_type: SimulationType,
        required: &[&'static str],
        components: SimulationComponents,
    ) -> Result<Self, SimulationError> {
        let SimulationComponents {
            system,
            order_function,
            engine,
            ensembles,
            settings,
        } = components;

        for &key in required {
            if !settings.has_section(key) {
                error!(simulation = name, key, "Missing required setting.");
                return Err(SimulationError::MissingSetting {
                    key,
                    simulation: name.to_string(),
                });
            }
        }

        system.evaluate_potential_and_force()?;

        let shooting = derive_shooting(settings.tis.as_ref(), &system)?;
        let seed = settings.tis.as_ref().map_or(0, |tis| tis.seed);
        let cycle = CycleCounter::new(settings.simulation.startcycle, settings.simulation.steps);
        let soft_exit = SoftExit::new(&settings.simulation.exe_path);

        info!(
            simulation = name,
            ensembles = ensembles.len(),
            aimless = shooting.aimless,
            start = cycle.start,
            end = cycle.end,
            "Created path simulation."
        );

        Ok(Self {
            name: name.to_string(),
            simulation_type,
            system,
            order_function,
            engine,
            ensembles,
            settings,
            shooting,
            rgen: RandomHandle::seeded(seed),
            cycle,
            output_tasks: Vec::new(),
            soft_exit,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn simulation_type(&self) -> SimulationType {
        self.simulation_type
    }

    pub fn system(&self) -> &System {
        &self.system
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn shooting(&self) -> &ShootingParameters {
        &self.shooting
    }

    pub fn rgen(&self) -> &RandomHandle {
        &self.rgen
    }

    pub fn cycle(&self) -> CycleCounter {
        self.cycle
    }

    pub fn engine(&self) -> &dyn Engine {
        self.engine.as_ref()
    }

    pub fn order_function(&self) -> &dyn OrderParameter {
        self.order_function.as_ref()
    }

    pub fn ensembles(&self) -> &[Box<dyn PathEnsemble>] {
        &self.ensembles
    }

    pub fn output_tasks(&self) -> &[OutputTask] {
        &self.output_tasks
    }

    pub fn is_finished(&self) -> bool {
        self.cycle.is_finished()
    }

    pub fn soft_exit(&self) -> bool {
        self.soft_exit.is_requested()
    }

    pub fn request_soft_exit(&mut self) {
        self.soft_exit.request();
    }

    pub fn restart_file(&self) -> PathBuf {
        self.settings.simulation.exe_path.join(RESTART_FILE)
    }

    pub(crate) fn advance_cycle(&mut self) {
        self.cycle.advance();
    }

    /// Restores a counter saved before [`Self::advance_cycle`] when the cycle failed.
    pub(crate) fn rewind_cycle(&mut self, cycle: CycleCounter) {
        self.cycle = cycle;
    }

    /// Splits the simulation into the context handed to move routines and its ensembles.
    pub fn split(&mut self) -> (SimulationContext<'_>, &mut [Box<dyn PathEnsemble>]) {
        let context = SimulationContext {
            system: &mut self.system,
            order_function: self.order_function.as_ref(),
            engine: self.engine.as_mut(),
            rgen: &self.rgen,
            settings: &self.settings,
            shooting: &self.shooting,
            cycle: self.cycle,
        };
        (context, self.ensembles.as_mut_slice())
    }

    /// Obtains an initial path for every ensemble.
    ///
    /// Unless the simulation is restarting, each ensemble writes its restart data and
    /// the initial path is routed through the output tasks. Returns `false` as soon as
    /// a soft exit is requested.
    #[instrument(skip_all, fields(simulation = %self.name))]
    pub fn initiate(
        &mut self,
        initializer: &mut dyn PathInitializer,
    ) -> Result<bool, SimulationError> {
        let restarting = self.settings.simulation.restart;
        for idx in 0..self.ensembles.len() {
            let outcome = {
                let (mut context, ensembles) = self.split();
                initializer.initiate(&mut context, ensembles[idx].as_mut())?
            };

            let ensemble = self.ensembles[idx].as_ref();
            let summary = EnsembleSummary::from_ensemble(ensemble);
            info!(
                ensemble = %summary.ensemble_name,
                status = %outcome.status,
                length = outcome.trial.length(),
                "Found initial path."
            );
            if let Some(path) = ensemble.last_path() {
                debug!(
                    ordermin = ?path.ordermin().map(|(value, _)| value),
                    ordermax = ?path.ordermax().map(|(value, _)| value),
                    generated = ?path.generated.map(|g| g.code()),
                    "Current path of the ensemble."
                );
            }

            if !restarting {
                ensemble.write_restart()?;
                let result = ensemble_result(
                    self.cycle,
                    &summary,
                    outcome.accept,
                    outcome.trial,
                    outcome.status,
                );
                self.output(&result)?;
            }

            if self.soft_exit() {
                info!("Soft exit requested during initiation.");
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Rebuilds the output tasks from the task table for every ensemble.
    #[instrument(skip_all, fields(simulation = %self.name, progress = progress))]
    pub fn create_output_tasks(&mut self, progress: bool) -> Result<(), SimulationError> {
        let mut tasks = Vec::new();
        for ensemble in &self.ensembles {
            let directory = ensemble
                .directory()
                .get(PATH_ENSEMBLE_DIRECTORY)
                .cloned()
                .unwrap_or_else(|| self.settings.output.directory.join(ensemble.ensemble_name()));
            for dir in ensemble.directories().iter().chain(std::iter::once(&directory)) {
                std::fs::create_dir_all(dir).map_err(|e| SimulationError::Directory {
                    path: dir.to_string_lossy().to_string(),
                    source: e,
                })?;
            }

            let specs = PATH_OUTPUT_TASKS
                .iter()
                .chain(progress.then_some(&PROGRESS_OUTPUT_TASK));
            tasks.extend(specs.filter_map(|spec| {
                OutputTask::create(
                    spec,
                    ensemble.ensemble_number(),
                    &directory,
                    &self.settings.output,
                )
            }));
        }
        debug!(tasks = tasks.len(), "Created output tasks.");
        self.output_tasks = tasks;
        Ok(())
    }

    /// Routes a result through all output tasks.
    pub fn output(&self, result: &SimulationResult) -> Result<(), SimulationError> {
        for task in &self.output_tasks {
            task.output(result)?;
        }
        Ok(())
    }

    /// Writes the restart file and the ensembles' restart data when due.
    ///
    /// Writing is due when `now` is set or when the number of performed cycles is a
    /// multiple of the restart frequency. Returns whether anything was written.
    #[instrument(skip_all, fields(simulation = %self.name, now = now))]
    pub fn write_restart(&self, now: bool) -> Result<bool, SimulationError> {
        let freq = self.settings.output.restart_file;
        if !now && (freq == 0 || self.cycle.stepno % freq != 0) {
            return Ok(false);
        }
        let file = self.restart_file();
        self.restart_info().write(&file)?;
        for ensemble in &self.ensembles {
            ensemble.write_restart()?;
        }
        debug!(path = %file.display(), step = self.cycle.step, "Wrote restart data.");
        Ok(true)
    }

    /// Captures the cycle counter and every generator state needed to resume.
    pub fn restart_info(&self) -> RestartInfo {
        RestartInfo {
            cycle: self.cycle,
            rgen: self.rgen.state(),
            simulation_type: self.simulation_type,
            engine: self.engine.rgen().map(|rgen| EngineRestart { rgen: rgen.state() }),
        }
    }

    /// Restores the state captured by [`PathSimulation::restart_info`].
    ///
    /// The end cycle is kept from the current settings so a restarted simulation can
    /// be extended.
    pub fn load_restart_info(&mut self, info: &RestartInfo) -> Result<(), SimulationError> {
        if info.simulation_type != self.simulation_type {
            return Err(SimulationError::RestartMismatch {
                expected: self.simulation_type,
                found: info.simulation_type,
            });
        }
        self.cycle = CycleCounter {
            end: self.cycle.end,
            ..info.cycle
        };
        self.rgen.set_state(&info.rgen);
        match (&info.engine, self.engine.rgen()) {
            (Some(engine), Some(rgen)) => rgen.set_state(&engine.rgen),
            (Some(_), None) => warn!(
                engine = self.engine.name(),
                "Restart data contains an engine generator, but the engine has none."
            ),
            _ => {}
        }
        info!(step = self.cycle.step, "Loaded restart information.");
        Ok(())
    }

    pub fn load_restart_file(&mut self) -> Result<(), SimulationError> {
        let info = RestartInfo::read(&self.restart_file())?;
        self.load_restart_info(&info)
    }
}

/// Derives aimless shooting and per-particle velocity widths from the settings.
///
/// A negative scalar width selects aimless shooting; otherwise widths are scaled by
/// the square root of the inverse particle masses.
fn derive_shooting(
    tis: Option<&TisSettings>,
    system: &System,
) -> Result<ShootingParameters, ConfigError> {
    let aimless = ShootingParameters {
        aimless: true,
        sigma_v: None,
    };
    let Some(tis) = tis.filter(|tis| !tis.aimless_shooting()) else {
        return Ok(aimless);
    };
    let imass = system.particles.imass();
    let sigma_v = match &tis.sigma_v {
        SigmaV::Scalar(sigma_v) => imass.map(|im| sigma_v * im.sqrt()),
        SigmaV::PerParticle(values) => {
            if values.len() != imass.len() {
                return Err(ConfigError::InvalidValue {
                    key: "tis.sigma-v",
                    reason: format!(
                        "{} value(s) given for {} particle(s)",
                        values.len(),
                        imass.len()
                    ),
                });
            }
            DVector::from_fn(imass.len(), |i, _| values[i] * imass[i].sqrt())
        }
    };
    Ok(ShootingParameters {
        aimless: false,
        sigma_v: Some(sigma_v),
    })
}

/// A runnable path simulation.
pub trait PathSampling {
    fn base(&self) -> &PathSimulation;

    fn base_mut(&mut self) -> &mut PathSimulation;

    /// Performs one cycle, writes its output and, when due, its restart data.
    fn step(&mut self) -> Result<SimulationResult, SimulationError>;
}
