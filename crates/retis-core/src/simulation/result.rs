use super::restart::CycleCounter;
use super::traits::{PathEnsemble, RetisOutcome};
use crate::core::models::system::System;
use crate::core::path::path::{Interfaces, Path, Status};
use std::collections::BTreeMap;

/// A snapshot of the identity of a path ensemble, stored in results.
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleSummary {
    pub ensemble_number: usize,
    pub ensemble_name: String,
    pub interfaces: Interfaces,
}

impl EnsembleSummary {
    pub fn from_ensemble(ensemble: &dyn PathEnsemble) -> Self {
        Self {
            ensemble_number: ensemble.ensemble_number(),
            ensemble_name: ensemble.ensemble_name().to_string(),
            interfaces: ensemble.interfaces(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResultValue {
    Cycle(CycleCounter),
    Accept(bool),
    Status(Status),
    Path(Path),
    Move(String),
    Outcome(Box<RetisOutcome>),
    Ensemble(EnsembleSummary),
    System(Box<System>),
}

/// The result of one cycle, keyed by names such as `"cycle"` or `"path-1"`.
pub type SimulationResult = BTreeMap<String, ResultValue>;

pub fn result_key(prefix: &str, ensemble_number: usize) -> String {
    format!("{prefix}-{ensemble_number}")
}

/// Builds the result entries shared by initiation and TIS steps.
pub fn ensemble_result(
    cycle: CycleCounter,
    ensemble: &EnsembleSummary,
    accept: bool,
    trial: Path,
    status: Status,
) -> SimulationResult {
    let idx = ensemble.ensemble_number;
    let mut result = SimulationResult::new();
    result.insert("cycle".to_string(), ResultValue::Cycle(cycle));
    result.insert(result_key("accept", idx), ResultValue::Accept(accept));
    result.insert(result_key("path", idx), ResultValue::Path(trial));
    result.insert(result_key("status", idx), ResultValue::Status(status));
    result.insert(
        result_key("pathensemble", idx),
        ResultValue::Ensemble(ensemble.clone()),
    );
    result
}

/// Counts the `accept-*` entries that are `true`, returning `(accepted, total)`.
pub fn count_accepted(result: &SimulationResult) -> (usize, usize) {
    result
        .iter()
        .filter(|(key, _)| key.starts_with("accept-"))
        .fold((0, 0), |(accepted, total), (_, value)| match value {
            ResultValue::Accept(true) => (accepted + 1, total + 1),
            _ => (accepted, total + 1),
        })
}
