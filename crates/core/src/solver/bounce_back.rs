//! Half-way bounce-back boundary treatment
//!
//! No-slip walls are enforced by reflecting, at every wall node, the
//! populations that would have streamed into the solid back toward the
//! fluid: the write slot of the reflected direction is overwritten with
//! the value the opposite parity interpretation reads for the incoming
//! direction at the same site. The pass runs strictly after the collision
//! sub-step of the same parity and owns no population data — its only
//! state is the site list, built once from geometry.
//!
//! A site's reflection for direction `(n, d)` exchanges data with the
//! neighbor one hop against that direction. Links whose partner cell is
//! itself a wall node carry no fluid information and are skipped; this is
//! also what keeps the parallel site loop free of aliasing, since every
//! processed link then touches slots no other site reaches.
//!
//! An optional per-site wall velocity adds the moving-wall momentum term
//! `-2 w_k rho0 (c_k . u_wall) / cs^2` (reference density `rho0 = 1`) to
//! each reflected value; sites without one get pure no-slip.

use crate::lattice::D3Q27;
use crate::solver::populations::PopulationStore;
use crate::solver::tiles::CellWindows;
use rayon::prelude::*;
use rustc_hash::FxHashSet;

/// Reference density of the moving-wall momentum correction.
const WALL_REFERENCE_DENSITY: f64 = 1.0;

/// One solid-adjacent lattice node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundarySite {
    /// Cell x coordinate.
    pub x: usize,
    /// Cell y coordinate.
    pub y: usize,
    /// Cell z coordinate.
    pub z: usize,
    /// Wall velocity for moving-wall bounce-back; `None` for a resting
    /// wall.
    pub wall_velocity: Option<[f64; 3]>,
}

impl BoundarySite {
    /// A resting-wall site at the given cell.
    #[must_use]
    pub fn resting(x: usize, y: usize, z: usize) -> Self {
        Self {
            x,
            y,
            z,
            wall_velocity: None,
        }
    }
}

/// Ordered list of wall nodes, with a membership index for link
/// classification.
#[derive(Debug, Clone, Default)]
pub struct BoundaryList {
    sites: Vec<BoundarySite>,
    occupied: FxHashSet<(usize, usize, usize)>,
}

impl BoundaryList {
    /// An empty list (fully periodic domain).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from explicit site coordinates.
    ///
    /// Duplicate coordinates are dropped (first occurrence wins) so that
    /// no two list entries can ever alias the same population slots.
    #[must_use]
    pub fn from_sites(sites: impl IntoIterator<Item = BoundarySite>) -> Self {
        let mut list = Self::default();
        for site in sites {
            if list.occupied.insert((site.x, site.y, site.z)) {
                list.sites.push(site);
            }
        }
        list
    }

    /// Build the wall-node list from a solid mask in row-major
    /// `z -> y -> x` order: every solid cell with at least one fluid
    /// neighbor along a discrete velocity (periodic wrap included)
    /// becomes a resting-wall site.
    #[must_use]
    pub fn from_solid_mask(mask: &[bool], nx: usize, ny: usize, nz: usize) -> Self {
        debug_assert_eq!(mask.len(), nx * ny * nz);
        let mut sites = Vec::new();
        for z in 0..nz {
            for y in 0..ny {
                for x in 0..nx {
                    if !mask[(z * ny + y) * nx + x] {
                        continue;
                    }
                    let windows = CellWindows::periodic(x, y, z, nx, ny, nz);
                    let touches_fluid = (0..2).any(|n| {
                        (0..D3Q27::HALF).any(|d| {
                            let c = D3Q27::VELOCITIES[n * D3Q27::OFF + d];
                            let ax = windows.x[(1 + c[0]) as usize];
                            let ay = windows.y[(1 + c[1]) as usize];
                            let az = windows.z[(1 + c[2]) as usize];
                            !mask[(az * ny + ay) * nx + ax]
                        })
                    });
                    if touches_fluid {
                        sites.push(BoundarySite::resting(x, y, z));
                    }
                }
            }
        }
        Self::from_sites(sites)
    }

    /// The site list, in insertion order.
    #[must_use]
    pub fn sites(&self) -> &[BoundarySite] {
        &self.sites
    }

    /// Number of wall nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    /// Whether the list holds no sites.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Whether a cell is a wall node.
    #[must_use]
    pub fn contains(&self, x: usize, y: usize, z: usize) -> bool {
        self.occupied.contains(&(x, y, z))
    }
}

/// Apply half-way bounce-back to every site, for the sub-step of the
/// given parity.
///
/// Must run after the collision sub-step of the same parity. Site order
/// is irrelevant; the loop is data-parallel.
pub fn apply<const ODD: bool>(list: &BoundaryList, populations: &mut PopulationStore, p: usize) {
    if list.is_empty() {
        return;
    }
    let (nx, ny, nz) = populations.dimensions();
    let pops = populations.shared();

    list.sites.par_iter().for_each(|site| {
        let windows = CellWindows::periodic(site.x, site.y, site.z, nx, ny, nz);
        for n in 0..2 {
            for d in 0..D3Q27::HALF {
                let c = D3Q27::VELOCITIES[n * D3Q27::OFF + d];
                // Partner cell one hop against (n, d): the fluid node this
                // link exchanges with. Wall-to-wall links are skipped.
                let px = windows.x[(1 - c[0]) as usize];
                let py = windows.y[(1 - c[1]) as usize];
                let pz = windows.z[(1 - c[2]) as usize];
                if list.occupied.contains(&(px, py, pz)) {
                    continue;
                }

                // SAFETY: after the skip above, the slots this link reads
                // and writes are reached by no other site in the list (a
                // conflicting access would require the partner cell to be
                // a wall node).
                let mut value = unsafe {
                    if ODD {
                        pops.read_incoming::<false>(&windows, n, d, p)
                    } else {
                        pops.read_incoming::<true>(&windows, n, d, p)
                    }
                };

                if let Some(wall) = site.wall_velocity {
                    let cu = f64::from(c[0]) * wall[0]
                        + f64::from(c[1]) * wall[1]
                        + f64::from(c[2]) * wall[2];
                    value -= 2.0 * D3Q27::WEIGHTS[n * D3Q27::OFF + d] * WALL_REFERENCE_DENSITY * cu
                        / D3Q27::CS2;
                }

                // SAFETY: as above; the reflected write of this link.
                unsafe { pops.write_outgoing::<ODD>(&windows, 1 - n, d, p, value); }
            }
        }
    });
}
