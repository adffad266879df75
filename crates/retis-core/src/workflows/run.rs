use crate::simulation::base::PathSampling;
use crate::simulation::error::SimulationError;
use crate::simulation::progress::{Progress, ProgressReporter};
use crate::simulation::result::{ResultValue, SimulationResult, count_accepted};
use crate::simulation::traits::PathInitializer;
use std::collections::BTreeMap;
use tracing::{info, instrument};

/// What a completed (or softly interrupted) run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of cycles performed by this run.
    pub cycles: u64,
    /// Accepted moves per ensemble number.
    pub accepted: BTreeMap<usize, u64>,
    /// Whether the run stopped because a soft exit was requested.
    pub soft_exit: bool,
}

impl RunSummary {
    fn record(&mut self, result: &SimulationResult) {
        for (key, value) in result {
            let Some(idx) = key
                .strip_prefix("accept-")
                .and_then(|idx| idx.parse::<usize>().ok())
            else {
                continue;
            };
            let accepted = self.accepted.entry(idx).or_insert(0);
            if matches!(value, ResultValue::Accept(true)) {
                *accepted += 1;
            }
        }
        self.cycles += 1;
    }

    pub fn total_accepted(&self) -> u64 {
        self.accepted.values().sum()
    }
}

/// Runs a path simulation until its last cycle.
///
/// The run creates the output tasks, loads the restart file when the settings ask for a
/// restart, obtains the initial paths and then performs cycles until the simulation is
/// finished. A soft exit stops the run after the current initiation or cycle. A final
/// restart record is written whenever at least one cycle was attempted.
///
/// # Arguments
///
/// * `simulation` - The TIS or RETIS simulation to drive.
/// * `initializer` - Provides the initial path of every ensemble.
/// * `reporter` - Receives phase and cycle progress events.
/// * `progress` - Adds the per-cycle progress output task.
///
/// # Errors
///
/// Returns [`SimulationError`] if the output directories cannot be created, the restart
/// file cannot be read, or initiation, a cycle or restart writing fails.
#[instrument(skip_all, name = "path_sampling_workflow")]
pub fn run<S: PathSampling + ?Sized>(
    simulation: &mut S,
    initializer: &mut dyn PathInitializer,
    reporter: &ProgressReporter,
    progress: bool,
) -> Result<RunSummary, SimulationError> {
    // === Phase 0: Output and restart ===
    reporter.report(Progress::PhaseStart {
        name: "Preparation",
    });
    simulation.base_mut().create_output_tasks(progress)?;
    if simulation.base().settings().simulation.restart {
        info!(
            path = %simulation.base().restart_file().display(),
            "Resuming from restart file."
        );
        simulation.base_mut().load_restart_file()?;
    }
    reporter.report(Progress::PhaseFinish);

    // === Phase 1: Initial paths ===
    reporter.report(Progress::PhaseStart {
        name: "Initiation",
    });
    let initiated = simulation.base_mut().initiate(initializer)?;
    reporter.report(Progress::PhaseFinish);

    let mut summary = RunSummary::default();
    if !initiated {
        info!("Run stopped during initiation.");
        reporter.report(Progress::Message(
            "Soft exit requested during initiation.".to_string(),
        ));
        summary.soft_exit = true;
        return Ok(summary);
    }
    for ensemble in simulation.base().ensembles() {
        reporter.report(Progress::EnsembleReady {
            name: ensemble.ensemble_name().to_string(),
        });
    }

    // === Phase 2: Cycles ===
    let cycle = simulation.base().cycle();
    info!(
        simulation = simulation.base().name(),
        start = cycle.step,
        end = cycle.end,
        "Starting cycles."
    );
    reporter.report(Progress::CyclesStart {
        total: cycle.end.saturating_sub(cycle.step),
    });
    while !simulation.base().is_finished() {
        let result = simulation.step()?;
        summary.record(&result);

        let (accepted, moves) = count_accepted(&result);
        reporter.report(Progress::CycleFinish {
            cycle: simulation.base().cycle().step,
            accepted,
            moves,
        });

        if simulation.base().soft_exit() {
            info!(
                step = simulation.base().cycle().step,
                "Soft exit requested; stopping the run."
            );
            reporter.report(Progress::Message(format!(
                "Soft exit requested after cycle {}.",
                simulation.base().cycle().step
            )));
            summary.soft_exit = true;
            break;
        }
    }
    reporter.report(Progress::CyclesFinish);

    simulation.base().write_restart(true)?;
    info!(
        cycles = summary.cycles,
        accepted = summary.total_accepted(),
        "Run complete."
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::retis::SimulationRetis;
    use crate::simulation::testing::{
        MockInitializer, MockRetisMove, MockTisMove, components, retis_settings, tis_settings,
    };
    use crate::simulation::tis::SimulationSingleTis;
    use std::cell::RefCell;
    use tempfile::tempdir;

    #[test]
    fn tis_run_performs_every_cycle() {
        let dir = tempdir().unwrap();
        let (components, _) = components(dir.path(), tis_settings(dir.path(), 5), 1);
        let mut simulation = SimulationSingleTis::new(components, Box::new(MockTisMove)).unwrap();
        let mut initializer = MockInitializer::default();

        let summary = run(&mut simulation, &mut initializer, &ProgressReporter::new(), false).unwrap();

        assert_eq!(summary.cycles, 5);
        assert!(!summary.soft_exit);
        assert!(summary.accepted[&0] <= 5);
        assert_eq!(initializer.calls, 1);
        assert!(simulation.base().is_finished());
        assert!(simulation.base().restart_file().is_file());

        let text = std::fs::read_to_string(dir.path().join("000").join("pathensemble.txt")).unwrap();
        assert_eq!(text.lines().count(), 6);
    }

    #[test]
    fn retis_run_reports_progress_events() {
        let dir = tempdir().unwrap();
        let (components, counters) = components(dir.path(), retis_settings(dir.path(), 3), 2);
        let mut simulation = SimulationRetis::new(components, Box::new(MockRetisMove)).unwrap();
        let mut initializer = MockInitializer::default();

        let events = RefCell::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            events.borrow_mut().push(event);
        }));
        let summary = run(&mut simulation, &mut initializer, &reporter, true).unwrap();
        drop(reporter);
        let events = events.into_inner();

        assert_eq!(summary.cycles, 3);
        assert_eq!(summary.accepted.len(), 2);
        assert_eq!(initializer.calls, 2);
        let ready = events
            .iter()
            .filter(|e| matches!(e, Progress::EnsembleReady { .. }))
            .count();
        assert_eq!(ready, 2);
        let finished: Vec<u64> = events
            .iter()
            .filter_map(|e| match e {
                Progress::CycleFinish { cycle, moves, .. } => {
                    assert_eq!(*moves, 2);
                    Some(*cycle)
                }
                _ => None,
            })
            .collect();
        assert_eq!(finished, vec![1, 2, 3]);
        assert!(matches!(events.last(), Some(Progress::CyclesFinish)));
        assert!(counters.iter().all(|count| count.get() >= 1));
    }

    #[test]
    fn exit_file_stops_run_during_initiation() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(crate::simulation::exit::EXIT_FILE), "").unwrap();
        let (components, _) = components(dir.path(), retis_settings(dir.path(), 3), 3);
        let mut simulation = SimulationRetis::new(components, Box::new(MockRetisMove)).unwrap();
        let mut initializer = MockInitializer::default();

        let messages = RefCell::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::Message(message) = event {
                messages.borrow_mut().push(message);
            }
        }));
        let summary = run(&mut simulation, &mut initializer, &reporter, false).unwrap();
        drop(reporter);

        assert!(summary.soft_exit);
        assert_eq!(messages.into_inner().len(), 1);
        assert_eq!(summary.cycles, 0);
        assert_eq!(initializer.calls, 1);
    }

    #[test]
    fn restart_run_resumes_after_the_recorded_cycle() {
        let dir = tempdir().unwrap();
        let (first_components, _) = components(dir.path(), tis_settings(dir.path(), 3), 1);
        let mut first = SimulationSingleTis::new(first_components, Box::new(MockTisMove)).unwrap();
        run(&mut first, &mut MockInitializer::default(), &ProgressReporter::new(), false).unwrap();

        let mut settings = tis_settings(dir.path(), 5);
        settings.simulation.restart = true;
        let (resumed_components, _) = components(dir.path(), settings, 1);
        let mut resumed = SimulationSingleTis::new(resumed_components, Box::new(MockTisMove)).unwrap();
        let summary =
            run(&mut resumed, &mut MockInitializer::default(), &ProgressReporter::new(), false).unwrap();

        assert_eq!(summary.cycles, 2);
        assert_eq!(resumed.base().cycle().step, 5);
    }

    #[test]
    fn summary_counts_accepted_moves_per_ensemble() {
        let mut summary = RunSummary::default();
        let mut result = SimulationResult::new();
        result.insert("accept-0".to_string(), ResultValue::Accept(true));
        result.insert("accept-1".to_string(), ResultValue::Accept(false));
        result.insert("move-1".to_string(), ResultValue::Move("sh".to_string()));
        summary.record(&result);
        summary.record(&result);

        assert_eq!(summary.cycles, 2);
        assert_eq!(summary.accepted[&0], 2);
        assert_eq!(summary.accepted[&1], 0);
        assert_eq!(summary.total_accepted(), 2);
    }
}
