//! Lattice-Boltzmann Fluid Solver Core Library
//!
//! A BGK lattice-Boltzmann solver over a uniform periodic 3D grid whose
//! populations live in a single flat buffer indexed with the A-A access
//! pattern (Bailey et al. 2009): streaming happens in place, and whether
//! a logical (cell, direction) pair maps to its natural or reflected slot
//! depends on the parity of the current step. Tracking that parity — and
//! the strict Even/Odd alternation around it — is the central correctness
//! contract of the crate.
//!
//! ## Structure
//!
//! - [`lattice`] — the D3Q27 velocity set behind a small descriptor trait
//! - [`solver`] — population store, tiling, BGK kernel, bounce-back walls
//! - [`simulation`] — the driving state machine, thread pool and snapshots
//!
//! ## Conventions
//!
//! Momentum is carried raw throughout the solver: the first moment
//! `sum f * c` is never divided by the density except at explicit query
//! boundaries. The equilibrium and relaxation algebra is written around
//! this convention; see [`solver::bgk`].

pub mod lattice;
pub mod simulation;
pub mod solver;

// Re-export the lattice descriptor
pub use lattice::{LatticeModel, D3Q27};

// Re-export the solver components
pub use solver::{
    BoundaryList, BoundarySite, ConfigError, ContinuumField, FlowConfig, Parity, PopulationStore,
    RelaxationParams,
};

// Re-export the driver
pub use simulation::persistence::{PersistenceError, SnapshotMeta};
pub use simulation::{Simulation, SimulationStats};
