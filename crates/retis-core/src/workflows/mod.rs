//! # Workflows Module
//!
//! This module provides the high-level procedures that drive a path-sampling simulation
//! from its first initial path to its last cycle.
//!
//! ## Overview
//!
//! Workflows are the top-level entry points for users of RETIS++. A simulation built from
//! the [`crate::simulation`] module only performs single cycles when asked; a workflow
//! prepares its output, resumes from restart data, obtains initial paths, steps until
//! the configured number of cycles is reached and leaves a final restart record.
//!
//! ## Architecture
//!
//! - **Run Workflow** ([`run`]) - Complete TIS or RETIS runs with progress reporting and
//!   soft-exit handling

pub mod run;
