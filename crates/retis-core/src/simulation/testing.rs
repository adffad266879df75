use super::config::{OutputSettings, RetisSettings, Settings, SettingsBuilder, SimulationType, TisSettings};
use super::base::SimulationComponents;
use super::error::SimulationError;
use super::traits::{
    Engine, MoveOutcome, OrderParameter, PathEnsemble, PathInitializer, RetisMove, RetisOutcome,
    SimulationContext, TisMove,
};
use crate::core::forcefield::potentials::DoubleWell;
use crate::core::models::particles::Particles;
use crate::core::models::system::{System, SystemError};
use crate::core::path::path::{GeneratedBy, Interfaces, Path, Status};
use crate::core::path::phasepoint::PhasePoint;
use crate::core::random::RandomHandle;
use std::cell::Cell;
use std::collections::BTreeMap;
use std::path::{Path as FsPath, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

pub fn double_well_system() -> System {
    let mut particles = Particles::new(1);
    particles
        .add_particle(&[-0.9], &[0.1], &[0.0], 1.0, "X", 0)
        .unwrap();
    particles
        .add_particle(&[0.9], &[-0.1], &[0.0], 4.0, "X", 0)
        .unwrap();
    System::new("reduced", particles, None, Some(0.07))
        .unwrap()
        .with_forcefield(Arc::new(DoubleWell::new(1.0, 2.0, 0.0)))
}

pub fn tis_settings(exe_path: &FsPath, steps: u64) -> Settings {
    let mut tis = TisSettings::new(17);
    tis.sigma_v = super::config::SigmaV::Scalar(0.5);
    SettingsBuilder::new()
        .task(SimulationType::Tis)
        .steps(steps)
        .exe_path(exe_path.to_path_buf())
        .temperature(0.07)
        .tis(tis)
        .output(OutputSettings {
            directory: exe_path.to_path_buf(),
            ..OutputSettings::default()
        })
        .build()
        .unwrap()
}

pub fn retis_settings(exe_path: &FsPath, steps: u64) -> Settings {
    let mut settings = tis_settings(exe_path, steps);
    settings.simulation.task = SimulationType::Retis;
    settings.retis = Some(RetisSettings::new(0.5));
    settings
}

pub fn path_from_orders(orders: &[f64], rgen: &RandomHandle) -> Path {
    let mut path = Path::new(rgen.share(), None);
    for (i, &order) in orders.iter().enumerate() {
        path.append(PhasePoint::scalar(order, i as f64));
    }
    path
}

#[derive(Debug, Default)]
pub struct MockEngine {
    pub rgen: Option<RandomHandle>,
}

impl Engine for MockEngine {
    fn name(&self) -> &str {
        "mock-engine"
    }

    fn rgen(&self) -> Option<&RandomHandle> {
        self.rgen.as_ref()
    }
}

#[derive(Debug)]
pub struct FirstPosition;

impl OrderParameter for FirstPosition {
    fn name(&self) -> &str {
        "first-position"
    }

    fn calculate(&self, system: &System) -> Result<Vec<f64>, SystemError> {
        Ok(vec![system.particles.pos[(0, 0)]])
    }
}

#[derive(Debug)]
pub struct MockEnsemble {
    pub number: usize,
    pub name: String,
    pub interfaces: Interfaces,
    pub directory: BTreeMap<String, PathBuf>,
    pub paths: Vec<(Path, Status, u64)>,
    pub accepted: Option<Path>,
    pub restarts_written: Rc<Cell<usize>>,
}

impl MockEnsemble {
    pub fn new(number: usize, root: &FsPath) -> Self {
        let name = format!("{number:03}");
        let mut directory = BTreeMap::new();
        directory.insert("path-ensemble".to_string(), root.join(&name));
        Self {
            number,
            name,
            interfaces: Interfaces::new(-0.9, -0.5 + 0.1 * number as f64, 1.0),
            directory,
            paths: Vec::new(),
            accepted: None,
            restarts_written: Rc::new(Cell::new(0)),
        }
    }
}

impl PathEnsemble for MockEnsemble {
    fn ensemble_number(&self) -> usize {
        self.number
    }

    fn ensemble_name(&self) -> &str {
        &self.name
    }

    fn interfaces(&self) -> Interfaces {
        self.interfaces
    }

    fn directory(&self) -> &BTreeMap<String, PathBuf> {
        &self.directory
    }

    fn add_path(&mut self, path: Path, status: Status, cycle: u64) {
        if status.is_accepted() {
            self.accepted = Some(path.clone());
        }
        self.paths.push((path, status, cycle));
    }

    fn last_path(&self) -> Option<&Path> {
        self.accepted.as_ref()
    }

    fn write_restart(&self) -> Result<(), SimulationError> {
        self.restarts_written.set(self.restarts_written.get() + 1);
        Ok(())
    }
}

/// Generates a transition path for every ensemble without using randomness.
#[derive(Debug, Default)]
pub struct MockInitializer {
    pub calls: usize,
}

impl PathInitializer for MockInitializer {
    fn initiate(
        &mut self,
        context: &mut SimulationContext<'_>,
        ensemble: &mut dyn PathEnsemble,
    ) -> Result<MoveOutcome, SimulationError> {
        self.calls += 1;
        let mut path = path_from_orders(&[-1.0, -0.2, 0.4, 1.1], context.rgen);
        path.generated = Some(GeneratedBy::Load);
        path.status = Some(Status::Accepted);
        ensemble.add_path(path.clone(), Status::Accepted, context.cycle.step);
        Ok(MoveOutcome {
            accept: true,
            trial: path,
            status: Status::Accepted,
        })
    }
}

/// Accepts a move when the shared generator draws below one half.
pub fn random_outcome(context: &SimulationContext<'_>, ensemble: &mut dyn PathEnsemble) -> MoveOutcome {
    let accept = context.rgen.rand() < 0.5;
    let status = if accept {
        Status::Accepted
    } else {
        Status::ForwardTooShort
    };
    let mut trial = path_from_orders(&[-1.0, 0.2, 0.6, -1.0], context.rgen);
    trial.generated = Some(GeneratedBy::Shooting);
    trial.status = Some(status);
    ensemble.add_path(trial.clone(), status, context.cycle.step);
    MoveOutcome {
        accept,
        trial,
        status,
    }
}

#[derive(Debug, Default)]
pub struct MockTisMove;

impl TisMove for MockTisMove {
    fn make_move(
        &mut self,
        context: &mut SimulationContext<'_>,
        ensemble: &mut dyn PathEnsemble,
    ) -> Result<MoveOutcome, SimulationError> {
        Ok(random_outcome(context, ensemble))
    }
}

#[derive(Debug, Default)]
pub struct MockRetisMove;

impl RetisMove for MockRetisMove {
    fn make_cycle(
        &mut self,
        context: &mut SimulationContext<'_>,
        ensembles: &mut [Box<dyn PathEnsemble>],
    ) -> Result<Vec<RetisOutcome>, SimulationError> {
        let swap = context.rgen.rand() < 0.5;
        let mut outcomes = Vec::with_capacity(ensembles.len());
        for ensemble in ensembles.iter_mut() {
            let outcome = random_outcome(context, ensemble.as_mut());
            outcomes.push(RetisOutcome {
                ensemble_number: ensemble.ensemble_number(),
                mc_move: if swap { "swap" } else { "sh" }.to_string(),
                accept: outcome.accept,
                trial: outcome.trial,
                status: outcome.status,
            });
        }
        Ok(outcomes)
    }
}

/// Builds simulation components with `ensembles` mock ensembles below `root`.
///
/// Returns the components and the restart counters of the ensembles.
pub fn components(
    root: &FsPath,
    settings: Settings,
    ensembles: usize,
) -> (SimulationComponents, Vec<Rc<Cell<usize>>>) {
    let ensembles: Vec<MockEnsemble> = (0..ensembles).map(|i| MockEnsemble::new(i, root)).collect();
    let counters = ensembles
        .iter()
        .map(|ensemble| Rc::clone(&ensemble.restarts_written))
        .collect();
    let components = SimulationComponents {
        system: double_well_system(),
        order_function: Box::new(FirstPosition),
        engine: Box::new(MockEngine::default()),
        ensembles: ensembles
            .into_iter()
            .map(|ensemble| Box::new(ensemble) as Box<dyn PathEnsemble>)
            .collect(),
        settings,
    };
    (components, counters)
}
