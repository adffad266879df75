use super::base::{PathSampling, PathSimulation, SimulationComponents};
use super::config::SimulationType;
use super::error::SimulationError;
use super::result::{EnsembleSummary, SimulationResult, ensemble_result};
use super::traits::TisMove;
use tracing::{debug, instrument};

/// A TIS simulation in a single path ensemble.
///
/// Every cycle performs exactly one TIS move through the supplied move routine.
pub struct SimulationSingleTis {
    base: PathSimulation,
    tis_move: Box<dyn TisMove>,
}

impl SimulationSingleTis {
    pub const NAME: &'static str = "Single TIS simulation";
    pub const REQUIRED_SETTINGS: &'static [&'static str] = &["simulation", "tis"];

    pub fn new(
        components: SimulationComponents,
        tis_move: Box<dyn TisMove>,
    ) -> Result<Self, SimulationError> {
        if components.ensembles.len() != 1 {
            return Err(SimulationError::Ensembles {
                simulation: Self::NAME.to_string(),
                reason: format!(
                    "exactly one ensemble is required, got {}",
                    components.ensembles.len()
                ),
            });
        }
        let base = PathSimulation::new(
            Self::NAME,
            SimulationType::Tis,
            Self::REQUIRED_SETTINGS,
            components,
        )?;
        Ok(Self { base, tis_move })
    }
}

impl PathSampling for SimulationSingleTis {
    fn base(&self) -> &PathSimulation {
        &self.base
    }

    fn base_mut(&mut self) -> &mut PathSimulation {
        &mut self.base
    }

    #[instrument(skip_all, name = "tis_step", fields(step = self.base.cycle().step + 1))]
    fn step(&mut self) -> Result<SimulationResult, SimulationError> {
        let previous = self.base.cycle();
        self.base.advance_cycle();
        let outcome = {
            let (mut context, ensembles) = self.base.split();
            self.tis_move.make_move(&mut context, ensembles[0].as_mut())
        };
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(err) => {
                self.base.rewind_cycle(previous);
                return Err(err);
            }
        };
        debug!(accept = outcome.accept, status = %outcome.status, "TIS move done.");

        let summary = EnsembleSummary::from_ensemble(self.base.ensembles()[0].as_ref());
        let result = ensemble_result(
            self.base.cycle(),
            &summary,
            outcome.accept,
            outcome.trial,
            outcome.status,
        );
        self.base.output(&result)?;
        self.base.write_restart(false)?;
        Ok(result)
    }
}
