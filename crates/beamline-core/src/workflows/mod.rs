//! # Workflows Module
//!
//! High-level entry points tying the core and engine together.
//!
//! ## Overview
//!
//! Workflows are the user-facing API of the library. They consume a built
//! [`crate::core::models::lattice::Lattice`] and produce complete optics
//! results: element-by-element or equidistantly sampled Twiss functions,
//! tracked particles and ensembles, and one-pass transfer matrices for
//! consumers such as matching and chromaticity evaluation.
//!
//! - **Tracking** ([`tracking`]) - Particle/Twiss transport, interior
//!   sampling, ensemble tracking, and the lattice transfer matrix
//! - **Optics** ([`twiss`]) - Lattice-wide Twiss propagation with the
//!   matched-solution fallback

pub mod tracking;
pub mod twiss;
