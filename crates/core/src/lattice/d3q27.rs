//! D3Q27 velocity set
//!
//! The full three-dimensional discretization: 27 discrete velocities
//! (6 faces, 12 edges, 8 corners, 1 rest), third-order Gauss-Hermite
//! quadrature weights and `cs^2 = 1/3`.
//!
//! Populations are stored as two half-sets so that a direction and its
//! negation differ only in the half index. The positive half occupies
//! slots `[0, 13)` with the rest direction at slot 13; the negative half
//! mirrors it at offset 14. Slot 27 pads the per-cell stride to 28 values
//! (a power-of-two multiple of the cache line for `f64`), and is never
//! read for physics.

use super::LatticeModel;

/// The D3Q27 lattice model.
///
/// A zero-sized marker; all data lives in `'static` constant tables.
pub struct D3Q27;

impl D3Q27 {
    /// Number of physical discrete velocities.
    pub const Q: usize = 27;
    /// Padded per-cell stride.
    pub const ND: usize = 28;
    /// Offset of the negative half-set (`ND / 2`).
    pub const OFF: usize = 14;
    /// Moving directions per half-set.
    pub const HALF: usize = 13;
    /// Slot of the rest direction within the positive half.
    pub const REST: usize = 13;
    /// Padding slot (negative half, mirror of the rest slot).
    pub const PAD: usize = 27;
    /// Squared speed of sound.
    pub const CS2: f64 = 1.0 / 3.0;

    /// Discrete velocities, indexed `n * OFF + d`.
    ///
    /// Slots `[14, 27)` are the exact negations of slots `[0, 13)`.
    pub const VELOCITIES: [[i32; 3]; 28] = [
        // Positive half: faces
        [1, 0, 0],
        [0, 1, 0],
        [0, 0, 1],
        // Positive half: edges
        [1, 1, 0],
        [1, -1, 0],
        [1, 0, 1],
        [1, 0, -1],
        [0, 1, 1],
        [0, 1, -1],
        // Positive half: corners
        [1, 1, 1],
        [1, 1, -1],
        [1, -1, 1],
        [1, -1, -1],
        // Rest
        [0, 0, 0],
        // Negative half: faces
        [-1, 0, 0],
        [0, -1, 0],
        [0, 0, -1],
        // Negative half: edges
        [-1, -1, 0],
        [-1, 1, 0],
        [-1, 0, -1],
        [-1, 0, 1],
        [0, -1, -1],
        [0, -1, 1],
        // Negative half: corners
        [-1, -1, -1],
        [-1, -1, 1],
        [-1, 1, -1],
        [-1, 1, 1],
        // Padding
        [0, 0, 0],
    ];

    /// Quadrature weights, indexed `n * OFF + d`; the padding slot is
    /// weightless.
    pub const WEIGHTS: [f64; 28] = [
        2.0 / 27.0,
        2.0 / 27.0,
        2.0 / 27.0,
        1.0 / 54.0,
        1.0 / 54.0,
        1.0 / 54.0,
        1.0 / 54.0,
        1.0 / 54.0,
        1.0 / 54.0,
        1.0 / 216.0,
        1.0 / 216.0,
        1.0 / 216.0,
        1.0 / 216.0,
        8.0 / 27.0,
        2.0 / 27.0,
        2.0 / 27.0,
        2.0 / 27.0,
        1.0 / 54.0,
        1.0 / 54.0,
        1.0 / 54.0,
        1.0 / 54.0,
        1.0 / 54.0,
        1.0 / 54.0,
        1.0 / 216.0,
        1.0 / 216.0,
        1.0 / 216.0,
        1.0 / 216.0,
        0.0,
    ];
}

impl LatticeModel for D3Q27 {
    const Q: usize = Self::Q;
    const ND: usize = Self::ND;
    const OFF: usize = Self::OFF;
    const HALF: usize = Self::HALF;
    const REST: usize = Self::REST;
    const CS2: f64 = Self::CS2;

    fn velocities() -> &'static [[i32; 3]] {
        &Self::VELOCITIES
    }

    fn weights() -> &'static [f64] {
        &Self::WEIGHTS
    }
}
