//! # Core Models Module
//!
//! This module contains the data structures describing the particle system that
//! trajectories are generated from.
//!
//! ## Key Components
//!
//! - [`particles`] - Positions, velocities, masses, forces and the virial of all particles
//! - [`simbox`] - The simulation box with its periodic boundaries and volume
//! - [`system`] - The system aggregate binding particles, box, force field and temperature
//!
//! ## Usage
//!
//! ```ignore
//! use retis::core::models::{particles::Particles, simbox::SimulationBox, system::System};
//!
//! let mut particles = Particles::new(1);
//! particles.add_particle(&[-1.0], &[0.0], &[0.0], 1.0, "X", 0)?;
//!
//! let simbox = SimulationBox::unbounded(vec![false])?;
//! let system = System::new("reduced", particles, Some(simbox), Some(0.07))?;
//! ```

pub mod particles;
pub mod simbox;
pub mod system;
