//! # Beamline Core Library
//!
//! A library for simulating the transport of charged-particle beams through a
//! sequence of magnetic and RF lattice elements in an accelerator.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict three-layer architecture to ensure a clear
//! separation of concerns, making it modular, testable, and extensible.
//!
//! - **[`core`]: The Foundation.** Contains stateless data models (`Particle`,
//!   `ParticleArray`, `Twiss`, `Element`, `Lattice`), the pure mathematics of
//!   transfer maps (`maps`), and I/O utilities for lattice descriptions and
//!   optics tables.
//!
//! - **[`engine`]: The Logic Core.** This stateful layer walks the lattice. It
//!   provides the `Navigator` traversal cursor that merges linear maps while
//!   preserving nonlinear fidelity, the periodic-solution and closed-orbit
//!   solvers, and a bounded derivative-free minimizer used for orbit refinement.
//!
//! - **[`workflows`]: The Public API.** This is the highest-level, user-facing
//!   layer. It ties the `engine` and `core` together to execute complete optics
//!   procedures: lattice-wide Twiss propagation, particle and ensemble tracking,
//!   and one-pass transfer-matrix accumulation.

pub mod core;
pub mod engine;
pub mod workflows;
