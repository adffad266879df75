//! # Simulation Module
//!
//! This module implements the stateful path-sampling simulations of RETIS++: the shared
//! simulation base, the single-ensemble TIS simulation and the replica exchange RETIS
//! simulation.
//!
//! ## Overview
//!
//! A simulation owns the particle system, the path ensembles, the validated settings and
//! the random generator that every Monte Carlo decision is drawn from. It does not
//! implement propagation, shooting or swapping itself. Those are supplied as move routines
//! through the traits in [`traits`], and the simulation drives them one cycle at a time,
//! packages their outcomes into results, routes results through output tasks and writes
//! restart records.
//!
//! ## Architecture
//!
//! - **Shared Base** ([`base`]) - Construction, initiation, output task creation and restarts
//! - **Simulations** ([`tis`], [`retis`]) - Cycle logic for one and for many ensembles
//! - **Configuration** ([`config`]) - Settings sections, validation and the settings builder
//! - **Collaborator Seams** ([`traits`]) - Engines, order parameters, ensembles and move routines
//! - **Results & Output** ([`result`], [`output`]) - Per-cycle results and the output task table
//! - **Restarts** ([`restart`], [`exit`]) - Restart records, cycle counters and soft exits
//! - **Progress Monitoring** ([`progress`]) - Progress events for user interfaces
//! - **Error Handling** ([`error`]) - Simulation errors and their propagation

pub mod base;
pub mod config;
pub mod error;
pub mod exit;
pub mod output;
pub mod progress;
pub mod restart;
pub mod result;
pub mod retis;
pub mod tis;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;
