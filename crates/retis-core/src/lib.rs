//! # RETIS++ Core Library
//!
//! A rare-event path-sampling library implementing Transition Interface Sampling (TIS)
//! and Replica Exchange Transition Interface Sampling (RETIS).
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture with a clear separation of concerns:
//!
//! - **[`core`]: The Foundation.** Particle state, simulation boxes and systems, force
//!   fields, thermodynamic functions, random generators, and the path representation
//!   together with the directional interface-crossing algorithms.
//!
//! - **[`simulation`]: The Orchestrator.** The stateful path-sampling simulations. It owns
//!   the system, the path ensembles, the validated settings and the random generator,
//!   drives TIS shooting and RETIS exchange cycles through external move routines, and
//!   wires results into output tasks and restart records.
//!
//! - **[`workflows`]: The Public API.** Complete procedures built on top of the
//!   orchestrator, such as running a simulation from its initial paths to the last cycle.

pub mod core;
pub mod simulation;
pub mod workflows;
