//! # Core Module
//!
//! This module provides the fundamental building blocks for beam-optics
//! computations, serving as the computational core of the library.
//!
//! ## Overview
//!
//! The core module implements the data structures and pure mathematics required
//! to describe an accelerator lattice and transport phase-space objects through
//! it: phase-space entities, element descriptors, transfer-map construction and
//! composition, and utilities for reading lattice descriptions and writing
//! optics tables.
//!
//! ## Architecture
//!
//! The module is organized into specialized submodules that handle different
//! aspects of the problem:
//!
//! - **Phase-Space & Lattice Models** ([`models`]) - Data structures for particles,
//!   ensembles, Twiss envelopes, element descriptors, and the lattice sequence
//! - **Transfer Maps** ([`maps`]) - Per-element map construction, slicing,
//!   composition, and application to phase-space entities
//! - **File I/O** ([`io`]) - TOML lattice descriptions and CSV optics tables
//! - **Physical Constants** ([`constants`]) - Reference constants shared by the
//!   map mathematics
//!
//! ## Key Capabilities
//!
//! - **Closed-form linear optics** for drifts, quadrupoles, bends, solenoids,
//!   correctors, cavities, and undulators, energy-dependent where the physics
//!   requires it
//! - **Symplectic kick maps** for sextupoles, octupoles, thin multipoles, and
//!   the undulator field integrator
//! - **Composable map algebra** with an explicit linear/nonlinear boundary that
//!   never silently discards nonlinear content
//! - **Vectorized ensemble transport** over flat coordinate buffers

pub mod constants;
pub mod io;
pub mod maps;
pub mod models;
