use super::base::{PathSampling, PathSimulation, SimulationComponents};
use super::config::SimulationType;
use super::error::SimulationError;
use super::result::{EnsembleSummary, ResultValue, SimulationResult, result_key};
use super::traits::RetisMove;
use tracing::{debug, instrument};

/// A replica exchange TIS simulation over several path ensembles.
///
/// Every cycle is one call of the RETIS move routine, which performs shooting and
/// swapping over all ensembles as one unit.
pub struct SimulationRetis {
    base: PathSimulation,
    retis_move: Box<dyn RetisMove>,
}

impl SimulationRetis {
    pub const NAME: &'static str = "RETIS simulation";
    pub const REQUIRED_SETTINGS: &'static [&'static str] = &["simulation", "tis", "retis"];

    pub fn new(
        components: SimulationComponents,
        retis_move: Box<dyn RetisMove>,
    ) -> Result<Self, SimulationError> {
        if components.ensembles.is_empty() {
            return Err(SimulationError::Ensembles {
                simulation: Self::NAME.to_string(),
                reason: "at least one ensemble is required".to_string(),
            });
        }
        let ensembles = components.ensembles.len();
        let base = PathSimulation::new(
            Self::NAME,
            SimulationType::Retis,
            Self::REQUIRED_SETTINGS,
            components,
        )?;
        if let Some(retis) = &base.settings().retis {
            retis.validate(Some(ensembles))?;
        }
        Ok(Self { base, retis_move })
    }
}

impl PathSampling for SimulationRetis {
    fn base(&self) -> &PathSimulation {
        &self.base
    }

    fn base_mut(&mut self) -> &mut PathSimulation {
        &mut self.base
    }

    #[instrument(skip_all, name = "retis_step", fields(step = self.base.cycle().step + 1))]
    fn step(&mut self) -> Result<SimulationResult, SimulationError> {
        let previous = self.base.cycle();
        self.base.advance_cycle();
        let outcomes = {
            let (mut context, ensembles) = self.base.split();
            self.retis_move.make_cycle(&mut context, ensembles)
        };
        let outcomes = match outcomes {
            Ok(outcomes) => outcomes,
            Err(err) => {
                self.base.rewind_cycle(previous);
                return Err(err);
            }
        };

        let mut result = SimulationResult::new();
        result.insert("cycle".to_string(), ResultValue::Cycle(self.base.cycle()));
        for outcome in outcomes {
            let idx = outcome.ensemble_number;
            let summary = self
                .base
                .ensembles()
                .iter()
                .find(|ensemble| ensemble.ensemble_number() == idx)
                .map(|ensemble| EnsembleSummary::from_ensemble(ensemble.as_ref()))
                .ok_or_else(|| {
                    SimulationError::Move(format!("outcome for unknown ensemble {idx}"))
                })?;
            debug!(
                ensemble = %summary.ensemble_name,
                mc_move = %outcome.mc_move,
                accept = outcome.accept,
                status = %outcome.status,
                "RETIS move done."
            );
            result.insert(result_key("move", idx), ResultValue::Move(outcome.mc_move.clone()));
            result.insert(result_key("status", idx), ResultValue::Status(outcome.status));
            result.insert(result_key("path", idx), ResultValue::Path(outcome.trial.clone()));
            result.insert(result_key("accept", idx), ResultValue::Accept(outcome.accept));
            result.insert(result_key("pathensemble", idx), ResultValue::Ensemble(summary));
            result.insert(result_key("all", idx), ResultValue::Outcome(Box::new(outcome)));
        }
        result.insert(
            "system".to_string(),
            ResultValue::System(Box::new(self.base.system().clone())),
        );

        self.base.output(&result)?;
        self.base.write_restart(false)?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::config::ConfigError;
    use crate::simulation::result::count_accepted;
    use crate::simulation::testing::{
        MockRetisMove, components, retis_settings, tis_settings,
    };
    use crate::simulation::traits::{PathEnsemble, RetisOutcome, SimulationContext};
    use std::path::Path;
    use tempfile::tempdir;

    fn retis(root: &Path, ensembles: usize) -> SimulationRetis {
        let (components, _) = components(root, retis_settings(root, 10), ensembles);
        SimulationRetis::new(components, Box::new(MockRetisMove)).unwrap()
    }

    #[test]
    fn requires_retis_settings() {
        let dir = tempdir().unwrap();
        let (components, _) = components(dir.path(), tis_settings(dir.path(), 10), 2);
        let result = SimulationRetis::new(components, Box::new(MockRetisMove));
        assert!(matches!(
            result,
            Err(SimulationError::MissingSetting { key: "retis", .. })
        ));
    }

    #[test]
    fn requires_at_least_one_ensemble() {
        let dir = tempdir().unwrap();
        let (components, _) = components(dir.path(), retis_settings(dir.path(), 10), 0);
        let result = SimulationRetis::new(components, Box::new(MockRetisMove));
        assert!(matches!(result, Err(SimulationError::Ensembles { .. })));
    }

    #[test]
    fn relative_shoots_must_cover_every_ensemble() {
        let dir = tempdir().unwrap();
        let mut settings = retis_settings(dir.path(), 10);
        settings.retis.as_mut().unwrap().relative_shoots = Some(vec![1.0, 1.0]);
        let (components, _) = components(dir.path(), settings, 3);
        let result = SimulationRetis::new(components, Box::new(MockRetisMove));
        assert!(matches!(
            result,
            Err(SimulationError::Config(ConfigError::InvalidValue { .. }))
        ));
    }

    #[test]
    fn step_rekeys_every_ensemble_result() {
        let dir = tempdir().unwrap();
        let mut simulation = retis(dir.path(), 3);
        simulation.base_mut().create_output_tasks(false).unwrap();
        let result = simulation.step().unwrap();

        for idx in 0..3 {
            for prefix in ["move", "status", "path", "accept", "all", "pathensemble"] {
                let key = result_key(prefix, idx);
                assert!(result.contains_key(&key), "missing key {key}");
            }
        }
        assert!(matches!(result.get("system"), Some(ResultValue::System(_))));
        assert!(matches!(result.get("cycle"), Some(ResultValue::Cycle(c)) if c.step == 1));
        assert_eq!(result.len(), 3 * 6 + 2);
        assert_eq!(count_accepted(&result).1, 3);

        for name in ["000", "001", "002"] {
            let text =
                std::fs::read_to_string(dir.path().join(name).join("pathensemble.txt")).unwrap();
            assert_eq!(text.lines().count(), 1);
        }
    }

    #[test]
    fn identical_seeds_give_identical_cycles() {
        let dir_a = tempdir().unwrap();
        let dir_b = tempdir().unwrap();
        let mut a = retis(dir_a.path(), 3);
        let mut b = retis(dir_b.path(), 3);
        for _ in 0..5 {
            let result_a = a.step().unwrap();
            let result_b = b.step().unwrap();
            for idx in 0..3 {
                assert_eq!(
                    result_a.get(&result_key("all", idx)),
                    result_b.get(&result_key("all", idx))
                );
            }
        }
    }

    struct UnknownEnsembleMove;

    impl RetisMove for UnknownEnsembleMove {
        fn make_cycle(
            &mut self,
            context: &mut SimulationContext<'_>,
            ensembles: &mut [Box<dyn PathEnsemble>],
        ) -> Result<Vec<RetisOutcome>, SimulationError> {
            let mut outcomes = MockRetisMove.make_cycle(context, ensembles)?;
            outcomes[0].ensemble_number = 42;
            Ok(outcomes)
        }
    }

    #[test]
    fn outcome_for_unknown_ensemble_is_an_error() {
        let dir = tempdir().unwrap();
        let (components, _) = components(dir.path(), retis_settings(dir.path(), 10), 2);
        let mut simulation = SimulationRetis::new(components, Box::new(UnknownEnsembleMove)).unwrap();
        assert!(matches!(simulation.step(), Err(SimulationError::Move(_))));
    }

    struct FailingCycle;

    impl RetisMove for FailingCycle {
        fn make_cycle(
            &mut self,
            _context: &mut SimulationContext<'_>,
            _ensembles: &mut [Box<dyn PathEnsemble>],
        ) -> Result<Vec<RetisOutcome>, SimulationError> {
            Err(SimulationError::Move("swap failed".to_string()))
        }
    }

    #[test]
    fn failed_cycle_does_not_advance_the_counter() {
        let dir = tempdir().unwrap();
        let (components, _) = components(dir.path(), retis_settings(dir.path(), 10), 2);
        let mut simulation = SimulationRetis::new(components, Box::new(FailingCycle)).unwrap();

        assert!(matches!(simulation.step(), Err(SimulationError::Move(_))));
        assert_eq!(simulation.base().cycle().step, 0);
        assert!(!simulation.base().is_finished());
    }
}
