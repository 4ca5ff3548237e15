//! BGK collision-streaming kernel
//!
//! Advances one population set by exactly one parity sub-step over the
//! whole periodic domain. Per cell:
//!
//! ```text
//! f_k   <- incoming populations          (A-A read, parity-resolved)
//! rho   =  sum_k f_k
//! m     =  sum_k f_k * c_k               (raw momentum, NOT divided by rho)
//! feq_k =  w_k * (rho + rho * (cd * (1 + cd/2) - |m|^2 / (2 cs^2)))
//!          with cd = (m . c_k) / cs^2
//! f_k   <- f_k + omega * (feq_k - f_k)
//! outgoing <- f_k                        (A-A write, parity-resolved)
//! ```
//!
//! The raw-momentum convention is deliberate and load-bearing: the
//! equilibrium expansion consumes the undivided first moment directly,
//! and the weight and relaxation algebra is consistent around it. Do not
//! "fix" this by dividing by `rho` — that
//! would silently change the numerics. Velocities are derived only at
//! query boundaries (see `Simulation::velocity_at`).
//!
//! Iteration is cache-blocked: the domain is partitioned into cubic tiles
//! and the tile list runs under `rayon`. Tiles are independent within one
//! sub-step because every slot is touched by exactly one cell (the A-A
//! disjointness argument in the store), so no ordering or locking is
//! needed; the barrier between the even and odd halves of a physical step
//! is the sequential completion of the parallel loop.

use crate::lattice::D3Q27;
use crate::solver::config::RelaxationParams;
use crate::solver::fields::{ContinuumField, CONTINUUM_COMPONENTS};
use crate::solver::populations::PopulationStore;
use crate::solver::tiles::{CellWindows, TileRange};
use rayon::prelude::*;

/// Evaluate the discrete equilibrium distribution for the given density
/// and raw momentum into `out` (one entry per slot, padding stays zero).
///
/// For `density = 1` and zero momentum the result equals the quadrature
/// weights exactly.
pub fn equilibrium(density: f64, momentum: [f64; 3], out: &mut [f64; D3Q27::ND]) {
    let usqr = 1.5 * (momentum[0] * momentum[0]
        + momentum[1] * momentum[1]
        + momentum[2] * momentum[2]);
    for k in 0..D3Q27::ND {
        let c = D3Q27::VELOCITIES[k];
        let cd = 3.0
            * (momentum[0] * f64::from(c[0])
                + momentum[1] * f64::from(c[1])
                + momentum[2] * f64::from(c[2]));
        out[k] = D3Q27::WEIGHTS[k] * (density + density * (cd * (1.0 + 0.5 * cd) - usqr));
    }
}

/// Fill one population set with the equilibrium for a uniform state,
/// leaving the buffer ready for an even first sub-step.
pub fn initialize_equilibrium(
    populations: &mut PopulationStore,
    density: f64,
    momentum: [f64; 3],
    p: usize,
) {
    let mut values = [0.0; D3Q27::ND];
    equilibrium(density, momentum, &mut values);
    populations.prime(&values, p);
}

/// Density and raw momentum of one cell under the current parity
/// interpretation (the state the next sub-step would collide).
#[must_use]
pub fn cell_moments<const ODD: bool>(
    populations: &PopulationStore,
    x: usize,
    y: usize,
    z: usize,
    p: usize,
) -> (f64, [f64; 3]) {
    let (nx, ny, nz) = populations.dimensions();
    let windows = CellWindows::periodic(x, y, z, nx, ny, nz);
    let mut density = 0.0;
    let mut momentum = [0.0; 3];
    for n in 0..2 {
        for d in 0..D3Q27::HALF {
            let value = populations.read_incoming::<ODD>(&windows, n, d, p);
            let c = D3Q27::VELOCITIES[n * D3Q27::OFF + d];
            density += value;
            momentum[0] += value * f64::from(c[0]);
            momentum[1] += value * f64::from(c[1]);
            momentum[2] += value * f64::from(c[2]);
        }
    }
    density += populations.read_rest(x, y, z, p);
    (density, momentum)
}

/// Advance population set `p` by one parity sub-step.
///
/// Iterates every cell exactly once; when `continuum` is given, the
/// pre-collision moments of every cell are stored into it. The caller is
/// responsible for alternating the parity between calls and for running
/// the bounce-back pass afterwards.
pub fn collide_stream<const ODD: bool>(
    populations: &mut PopulationStore,
    continuum: Option<&mut ContinuumField>,
    relaxation: RelaxationParams,
    p: usize,
    tiles: &[TileRange],
) {
    let (nx, ny, nz) = populations.dimensions();
    let omega = relaxation.omega;
    let pops = populations.shared();
    let field = continuum.map(ContinuumField::shared);

    tiles.par_iter().for_each(|tile| {
        let mut f = [0.0_f64; D3Q27::ND];
        for z in tile.z0..tile.z1 {
            for y in tile.y0..tile.y1 {
                for x in tile.x0..tile.x1 {
                    let windows = CellWindows::periodic(x, y, z, nx, ny, nz);

                    // Gather the incoming populations. The padding slot is
                    // never loaded and stays zero, so the moment and
                    // relaxation loops below can run over the full stride
                    // branch-free (its weight and velocity are zero).
                    for n in 0..2 {
                        for d in 0..D3Q27::HALF {
                            // SAFETY: this cell belongs to exactly one
                            // tile; the A-A schedule maps each (cell,
                            // direction) pair to a slot no other cell
                            // touches this sub-step.
                            f[n * D3Q27::OFF + d] =
                                unsafe { pops.read_incoming::<ODD>(&windows, n, d, p) };
                        }
                    }
                    // SAFETY: rest slot of the local cell, see above.
                    f[D3Q27::REST] = unsafe { pops.read_rest(x, y, z, p) };

                    // Zeroth and raw first moments.
                    let mut density = 0.0;
                    let mut momentum = [0.0_f64; 3];
                    for k in 0..D3Q27::ND {
                        let c = D3Q27::VELOCITIES[k];
                        density += f[k];
                        momentum[0] += f[k] * f64::from(c[0]);
                        momentum[1] += f[k] * f64::from(c[1]);
                        momentum[2] += f[k] * f64::from(c[2]);
                    }

                    if let Some(view) = &field {
                        let at = ((z * ny + y) * nx + x) * CONTINUUM_COMPONENTS;
                        // SAFETY: the component block of this cell is
                        // written by this tile only.
                        unsafe {
                            view.write(at, density);
                            view.write(at + 1, momentum[0]);
                            view.write(at + 2, momentum[1]);
                            view.write(at + 3, momentum[2]);
                        }
                    }

                    // Relax toward equilibrium.
                    let usqr = 1.5
                        * (momentum[0] * momentum[0]
                            + momentum[1] * momentum[1]
                            + momentum[2] * momentum[2]);
                    for k in 0..D3Q27::ND {
                        let c = D3Q27::VELOCITIES[k];
                        let cd = 3.0
                            * (momentum[0] * f64::from(c[0])
                                + momentum[1] * f64::from(c[1])
                                + momentum[2] * f64::from(c[2]));
                        let feq =
                            D3Q27::WEIGHTS[k] * (density + density * (cd * (1.0 + 0.5 * cd) - usqr));
                        f[k] += omega * (feq - f[k]);
                    }

                    // Scatter the post-collision populations.
                    for n in 0..2 {
                        for d in 0..D3Q27::HALF {
                            // SAFETY: dual of the gather above.
                            unsafe {
                                pops.write_outgoing::<ODD>(&windows, n, d, p, f[n * D3Q27::OFF + d]);
                            }
                        }
                    }
                    // SAFETY: rest slot of the local cell.
                    unsafe { pops.write_rest(x, y, z, p, f[D3Q27::REST]); }
                }
            }
        }
    });
}
