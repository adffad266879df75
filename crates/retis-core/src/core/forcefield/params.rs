use super::ForceFieldHandle;
use super::potentials::{CompositeForceField, DoubleWell, LennardJonesCut};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PotentialParams {
    DoubleWell {
        a: f64,
        b: f64,
        #[serde(default)]
        c: f64,
    },
    LennardJones {
        epsilon: f64,
        sigma: f64,
        rcut: f64,
        #[serde(default)]
        shift: bool,
    },
}

impl PotentialParams {
    pub fn build(&self) -> ForceFieldHandle {
        match *self {
            PotentialParams::DoubleWell { a, b, c } => Arc::new(DoubleWell::new(a, b, c)),
            PotentialParams::LennardJones {
                epsilon,
                sigma,
                rcut,
                shift,
            } => Arc::new(LennardJonesCut::new(epsilon, sigma, rcut, shift)),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ForceFieldParams {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(rename = "potential")]
    pub potentials: Vec<PotentialParams>,
}

fn default_name() -> String {
    "forcefield".to_string()
}

#[derive(Debug, Error)]
pub enum ParamLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Force field definition contains no potentials")]
    Empty,
}

impl ForceFieldParams {
    pub fn load(path: &Path) -> Result<Self, ParamLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| ParamLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let params: Self = toml::from_str(&content).map_err(|e| ParamLoadError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        if params.potentials.is_empty() {
            return Err(ParamLoadError::Empty);
        }
        Ok(params)
    }

    /// Builds the force field. A single potential is returned as-is, several are summed.
    pub fn build(&self) -> ForceFieldHandle {
        match self.potentials.as_slice() {
            [single] => single.build(),
            many => Arc::new(CompositeForceField::new(
                &self.name,
                many.iter().map(PotentialParams::build).collect(),
            )),
        }
    }
}
