//! Lattice discretization descriptors
//!
//! A lattice model fixes the discrete velocity set, quadrature weights and
//! speed of sound shared by the population store and the collision kernel.
//! Models are plain immutable constant tables behind the [`LatticeModel`]
//! trait; there is no per-call state and no dynamic dispatch on the hot
//! path — the solver is monomorphized against one concrete model.

mod d3q27;

pub use d3q27::D3Q27;

/// Capability set of a velocity discretization.
///
/// `ND` is the padded per-cell stride and may exceed `Q` so that the
/// per-cell block keeps cache-line alignment; padded slots carry zero
/// velocity and zero weight and are never read for physics.
///
/// Layout contract for the tables returned by [`velocities`] and
/// [`weights`] (both have `ND` entries, indexed `n * OFF + d`):
/// - entries `[0, HALF)` are the positive half-set,
/// - entry `REST` is the rest direction `(0, 0, 0)`,
/// - entries `[OFF, OFF + HALF)` are the exact negations of the positive
///   half-set (`velocities()[OFF + d] == -velocities()[d]`),
/// - any remaining entries are padding.
///
/// [`velocities`]: LatticeModel::velocities
/// [`weights`]: LatticeModel::weights
pub trait LatticeModel {
    /// Number of physical discrete velocity directions.
    const Q: usize;
    /// Padded per-cell stride of the population buffer.
    const ND: usize;
    /// Offset of the negative half-set within a cell block (`ND / 2`).
    const OFF: usize;
    /// Number of moving directions per half-set.
    const HALF: usize;
    /// Slot index of the rest direction (lives in the positive half).
    const REST: usize;
    /// Squared lattice speed of sound.
    const CS2: f64;

    /// Discrete velocity table, `ND` entries.
    fn velocities() -> &'static [[i32; 3]];

    /// Quadrature weight table, `ND` entries; sums to 1 over the `Q`
    /// physical directions.
    fn weights() -> &'static [f64];
}
