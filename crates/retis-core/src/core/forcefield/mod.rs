//! # Force Field Module
//!
//! This module defines how potential energies, forces and virials are evaluated for a
//! particle system.
//!
//! ## Overview
//!
//! A force field is anything implementing the [`ForceField`] capability set. A
//! [`System`](crate::core::models::system::System) holds a shared, polymorphic
//! [`ForceFieldHandle`]; copies of a system share the same force field instance.
//!
//! ## Key Components
//!
//! - [`potentials`] - Concrete force fields (double well, truncated Lennard-Jones, composites)
//! - [`params`] - Loading force field definitions from TOML parameter files
//!
//! ## Usage
//!
//! ```ignore
//! use retis::core::forcefield::params::ForceFieldParams;
//!
//! let forcefield = ForceFieldParams::load(Path::new("forcefield.toml"))?.build();
//! let system = system.with_forcefield(forcefield);
//! let vpot = system.evaluate_potential()?;
//! ```

pub mod params;
pub mod potentials;

use crate::core::models::particles::Particles;
use crate::core::models::simbox::SimulationBox;
use nalgebra::DMatrix;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ForceFieldError {
    #[error("Force field '{forcefield}' supports {expected} dimension(s), system has {found}")]
    UnsupportedDimension {
        forcefield: String,
        expected: usize,
        found: usize,
    },
    #[error("Force field '{forcefield}' produced a non-finite value")]
    NonFinite { forcefield: String },
}

/// The capability set every force field provides.
///
/// Evaluations are pure: they read the particle state and return values without
/// storing anything. Committing results to the particle state is the responsibility of
/// the owning system.
pub trait ForceField: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn evaluate_potential(
        &self,
        particles: &Particles,
        simbox: Option<&SimulationBox>,
    ) -> Result<f64, ForceFieldError>;

    /// Returns the forces (`npart x dim`) and the virial (`dim x dim`).
    fn evaluate_force(
        &self,
        particles: &Particles,
        simbox: Option<&SimulationBox>,
    ) -> Result<(DMatrix<f64>, DMatrix<f64>), ForceFieldError>;

    fn evaluate_potential_and_force(
        &self,
        particles: &Particles,
        simbox: Option<&SimulationBox>,
    ) -> Result<(f64, DMatrix<f64>, DMatrix<f64>), ForceFieldError> {
        let vpot = self.evaluate_potential(particles, simbox)?;
        let (force, virial) = self.evaluate_force(particles, simbox)?;
        Ok((vpot, force, virial))
    }
}

/// A shared handle to a force field.
pub type ForceFieldHandle = Arc<dyn ForceField>;
