//! # Models Module
//!
//! Data structures describing phase-space state and the accelerator lattice.
//!
//! ## Overview
//!
//! - [`particle`] - Single-particle coordinates and batched particle ensembles
//! - [`twiss`] - Second-moment beam envelopes with dispersion and phase advance
//! - [`element`] - Immutable lattice-element descriptors consumed by the map factory
//! - [`lattice`] - The ordered element sequence with its built transfer maps

pub mod element;
pub mod lattice;
pub mod particle;
pub mod twiss;
