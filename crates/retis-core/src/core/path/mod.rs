//! # Path Module
//!
//! Trajectories as ordered sequences of phase points, and the directional
//! interface-crossing algorithms path sampling is built on.
//!
//! ## Key Components
//!
//! - [`phasepoint`] - A single trajectory sample with its order parameter
//! - [`path`] - The path container, move status codes and interface checks
//! - [`crossing`] - Crossing counting, crossing detection, trimming and segment extraction
//! - [`error`] - Errors raised by path operations
//!
//! ## Comparison Conventions
//!
//! The crossing functions use different comparisons and are tested
//! independently of one another:
//!
//! - crossings in either direction: `op2 >= I > op1 || op1 >= I > op2`
//! - forward segment boundaries: `op2 > I >= op1`
//! - trimming: the open interval `right > op > left`

pub mod crossing;
pub mod error;
pub mod path;
pub mod phasepoint;
