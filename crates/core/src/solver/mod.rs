//! Lattice-Boltzmann solver components
//!
//! The solver is organized leaf-first:
//!
//! - [`populations`] — the A-A indexed population store (flat buffer,
//!   parity-aware accessors); the correctness core of the crate.
//! - [`tiles`] — cache-blocked tile partition and periodic neighbor
//!   windows; owns all spatial wrap-around arithmetic.
//! - [`bgk`] — the single-relaxation-time collision-streaming kernel.
//! - [`bounce_back`] — half-way bounce-back wall treatment.
//! - [`fields`] — the macroscopic continuum field written every K steps.
//! - [`config`] — run configuration, validated once at construction.
//!
//! A full physical time step is one [`Parity::Even`] sub-step followed by
//! one [`Parity::Odd`] sub-step; the driver in [`crate::simulation`] owns
//! the alternation and the thread pool.

pub mod bgk;
pub mod bounce_back;
pub mod config;
pub mod fields;
pub mod populations;
pub mod tiles;

pub use bounce_back::{BoundaryList, BoundarySite};
pub use config::{ConfigError, FlowConfig, RelaxationParams, DEFAULT_TILE_EDGE};
pub use fields::{ContinuumField, CONTINUUM_COMPONENTS};
pub use populations::PopulationStore;
pub use tiles::{CellWindows, TileRange};

use serde::{Deserialize, Serialize};

/// Step parity selecting the A-A buffer interpretation.
///
/// The population buffer is internally consistent only under one parity
/// at a time; every accessor takes the parity and callers alternate it
/// each sub-step. Restarting from a saved buffer requires knowing the
/// parity it was saved at, which is why this is serializable state and
/// not something inferable from the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Parity {
    /// In-cell swap sub-step.
    Even,
    /// Propagating sub-step.
    Odd,
}

impl Parity {
    /// The other parity.
    #[must_use]
    pub fn flipped(self) -> Self {
        match self {
            Parity::Even => Parity::Odd,
            Parity::Odd => Parity::Even,
        }
    }

    /// Whether this is the odd sub-step.
    #[must_use]
    pub fn is_odd(self) -> bool {
        matches!(self, Parity::Odd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parity_alternation() {
        assert_eq!(Parity::Even.flipped(), Parity::Odd);
        assert_eq!(Parity::Odd.flipped(), Parity::Even);
        assert_eq!(Parity::Even.flipped().flipped(), Parity::Even);
        assert!(!Parity::Even.is_odd());
        assert!(Parity::Odd.is_odd());
    }

    #[test]
    fn test_parity_serialization_round_trip() {
        let json = serde_json::to_string(&Parity::Odd).unwrap();
        let back: Parity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Parity::Odd);
    }
}
