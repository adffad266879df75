//! # Core Module
//!
//! This module provides the fundamental building blocks of RETIS++: the particle system
//! that is propagated, the functions that derive thermodynamic observables from it, and
//! the trajectory (path) representation used by the sampling algorithms.
//!
//! ## Architecture
//!
//! - **Particle Systems** ([`models`]) - Particle state, simulation box and the system aggregate
//! - **Energy Evaluation** ([`forcefield`]) - Force field interface and concrete potentials
//! - **Observables** ([`thermo`]) - Kinetic energy, temperature, pressure and momentum
//! - **Trajectories** ([`path`]) - Phase points, paths and interface-crossing algorithms
//! - **Randomness** ([`random`]) - Seeded, restartable and explicitly shared generators
//! - **Unit Systems** ([`units`]) - Boltzmann constants for the supported unit systems
//!
//! ## Scientific Foundation
//!
//! - **Transition interface sampling** samples rare transitions as an ordered family of
//!   path ensembles defined by order-parameter interfaces
//! - **Statistical mechanics** of classical particles for temperatures and pressures
//! - **Reproducible Monte Carlo** where every random draw is attributable to one generator

pub mod forcefield;
pub mod models;
pub mod path;
pub mod random;
pub mod thermo;
pub mod units;
