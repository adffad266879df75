//! Output tasks that turn cycle results into per-ensemble text files.
//!
//! Tasks are declared in a table of [`OutputTaskSpec`] records. Every template in a
//! record contains the placeholder `{}` which is replaced by an ensemble number when
//! the task is created for that ensemble.

use super::config::OutputSettings;
use super::error::SimulationError;
use super::restart::CycleCounter;
use super::result::{EnsembleSummary, ResultValue, SimulationResult};
use crate::core::path::path::{Path as TrajectoryPath, Side, Status};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const ENSEMBLE_PLACEHOLDER: &str = "{}";

/// A declarative output task: its type, its name and the result keys it consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputTaskSpec {
    pub kind: &'static str,
    pub name: &'static str,
    pub result: &'static [&'static str],
}

pub const PATH_OUTPUT_TASKS: &[OutputTaskSpec] = &[
    OutputTaskSpec {
        kind: "pathensemble",
        name: "path-ensemble-{}",
        result: &["pathensemble-{}", "path-{}", "status-{}", "accept-{}"],
    },
    OutputTaskSpec {
        kind: "path-order",
        name: "path-order-{}",
        result: &["path-{}", "status-{}"],
    },
    OutputTaskSpec {
        kind: "path-energy",
        name: "path-energy-{}",
        result: &["path-{}", "status-{}"],
    },
];

pub const PROGRESS_OUTPUT_TASK: OutputTaskSpec = OutputTaskSpec {
    kind: "cycle-progress",
    name: "cycle-progress-{}",
    result: &["pathensemble-{}", "status-{}", "accept-{}"],
};

pub fn instantiate(template: &str, ensemble_number: usize) -> String {
    template.replace(ENSEMBLE_PLACEHOLDER, &ensemble_number.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    PathEnsemble,
    PathOrder,
    PathEnergy,
    CycleProgress,
}

impl OutputKind {
    pub fn from_type(kind: &str) -> Option<Self> {
        match kind {
            "pathensemble" => Some(OutputKind::PathEnsemble),
            "path-order" => Some(OutputKind::PathOrder),
            "path-energy" => Some(OutputKind::PathEnergy),
            "cycle-progress" => Some(OutputKind::CycleProgress),
            _ => None,
        }
    }

    pub fn file_name(&self) -> Option<&'static str> {
        match self {
            OutputKind::PathEnsemble => Some("pathensemble.txt"),
            OutputKind::PathOrder => Some("order.txt"),
            OutputKind::PathEnergy => Some("energy.txt"),
            OutputKind::CycleProgress => None,
        }
    }

    pub fn frequency(&self, settings: &OutputSettings) -> u64 {
        match self {
            OutputKind::PathEnsemble => settings.pathensemble_file,
            OutputKind::PathOrder => settings.order_file,
            OutputKind::PathEnergy => settings.energy_file,
            OutputKind::CycleProgress => 1,
        }
    }
}

/// An output task bound to one ensemble.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputTask {
    name: String,
    kind: OutputKind,
    result_keys: Vec<String>,
    frequency: u64,
    file: Option<PathBuf>,
}

impl OutputTask {
    /// Creates the task described by `spec` for one ensemble.
    ///
    /// Returns `None` for unknown task types and for tasks whose output frequency is
    /// zero.
    pub fn create(
        spec: &OutputTaskSpec,
        ensemble_number: usize,
        directory: &Path,
        settings: &OutputSettings,
    ) -> Option<Self> {
        let Some(kind) = OutputKind::from_type(spec.kind) else {
            debug!(kind = spec.kind, "Skipping output task of unknown type.");
            return None;
        };
        let frequency = kind.frequency(settings);
        if frequency == 0 {
            return None;
        }
        Some(Self {
            name: instantiate(spec.name, ensemble_number),
            kind,
            result_keys: spec
                .result
                .iter()
                .map(|template| instantiate(template, ensemble_number))
                .collect(),
            frequency,
            file: kind.file_name().map(|name| directory.join(name)),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> OutputKind {
        self.kind
    }

    pub fn result_keys(&self) -> &[String] {
        &self.result_keys
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Writes the part of `result` this task is responsible for.
    ///
    /// Returns `false` when nothing was written, either because this cycle is not due
    /// or because the result does not contain the task's keys.
    pub fn output(&self, result: &SimulationResult) -> Result<bool, SimulationError> {
        let Some(ResultValue::Cycle(cycle)) = result.get("cycle") else {
            return Ok(false);
        };
        if cycle.step % self.frequency != 0 {
            return Ok(false);
        }
        let Some(values) = self
            .result_keys
            .iter()
            .map(|key| result.get(key))
            .collect::<Option<Vec<_>>>()
        else {
            return Ok(false);
        };

        let text = match (self.kind, values.as_slice()) {
            (
                OutputKind::PathEnsemble,
                [
                    ResultValue::Ensemble(ensemble),
                    ResultValue::Path(path),
                    ResultValue::Status(status),
                    ResultValue::Accept(accept),
                ],
            ) => format_pathensemble_line(cycle, ensemble, path, *status, *accept),
            (OutputKind::PathOrder, [ResultValue::Path(path), ResultValue::Status(status)]) => {
                format_order_block(cycle, path, *status)
            }
            (OutputKind::PathEnergy, [ResultValue::Path(path), ResultValue::Status(status)]) => {
                format_energy_block(cycle, path, *status)
            }
            (
                OutputKind::CycleProgress,
                [
                    ResultValue::Ensemble(ensemble),
                    ResultValue::Status(status),
                    ResultValue::Accept(accept),
                ],
            ) => {
                info!(
                    cycle = cycle.step,
                    ensemble = %ensemble.ensemble_name,
                    accept,
                    status = %status,
                    "Cycle finished."
                );
                return Ok(true);
            }
            _ => return Ok(false),
        };

        self.append(&text)?;
        Ok(true)
    }

    fn append(&self, text: &str) -> Result<(), SimulationError> {
        let Some(file) = &self.file else {
            return Ok(());
        };
        let to_error = |source| SimulationError::Output {
            task: self.name.clone(),
            source,
        };
        let mut handle = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file)
            .map_err(to_error)?;
        handle.write_all(text.as_bytes()).map_err(to_error)
    }
}

fn side_letter(side: Option<Side>) -> char {
    match side {
        Some(Side::Left) => 'L',
        Some(Side::Right) => 'R',
        None => '*',
    }
}

fn format_pathensemble_line(
    cycle: &CycleCounter,
    ensemble: &EnsembleSummary,
    path: &TrajectoryPath,
    status: Status,
    accept: bool,
) -> String {
    let (start, middle, end) = match path.check_interfaces(&ensemble.interfaces) {
        Some(check) => (
            side_letter(check.start),
            if check.middle_crossed { 'M' } else { '*' },
            side_letter(check.end),
        ),
        None => ('*', '*', '*'),
    };
    let generated = path.generated.map_or("--", |g| g.code());
    let (ordermin, _) = path.ordermin().unwrap_or((f64::NAN, 0));
    let (ordermax, _) = path.ordermax().unwrap_or((f64::NAN, 0));
    format!(
        "{:>10} {}{}{} {:>7} {} {} {:>2} {:>16.9} {:>16.9}\n",
        cycle.step,
        start,
        middle,
        end,
        path.length(),
        if accept { "ACC" } else { "REJ" },
        status,
        generated,
        ordermin,
        ordermax,
    )
}

fn format_order_block(cycle: &CycleCounter, path: &TrajectoryPath, status: Status) -> String {
    let mut text = format!("# Cycle: {}, status: {}\n", cycle.step, status);
    for point in path {
        let order: Vec<String> = point.order().iter().map(|v| format!("{v:>16.9}")).collect();
        text.push_str(&format!("{:>10} {}\n", point.time, order.join(" ")));
    }
    text
}

/// Columns are time, then potential, kinetic and total energy per particle.
fn format_energy_block(cycle: &CycleCounter, path: &TrajectoryPath, status: Status) -> String {
    let mut text = format!("# Cycle: {}, status: {}\n", cycle.step, status);
    for point in path {
        if let Some(particles) = &point.particles {
            text.push_str(&format!(
                "{:>10} {:>16.9} {:>16.9} {:>16.9}\n",
                point.time,
                particles.vpot,
                particles.ekin,
                particles.vpot + particles.ekin
            ));
        }
    }
    text
}
