//! Simulation driver
//!
//! [`Simulation`] owns the population store, the continuum field, the
//! boundary list, the tile partition and the worker thread pool, and runs
//! the strict Even/Odd alternation: one full physical time step is an even
//! sub-step followed by an odd sub-step, each consisting of the collision
//! kernel and the bounce-back pass. The odd half never starts before the
//! even half has completed for all tiles — the parallel loop returns
//! before the next dispatch, which is the hard barrier the access pattern
//! requires.
//!
//! The thread pool is an explicit per-run resource sized from the
//! configuration; nothing in the crate mutates process-global thread
//! state.

pub mod persistence;

use crate::lattice::{LatticeModel, D3Q27};
use crate::solver::bgk::{self, cell_moments};
use crate::solver::{
    bounce_back, tiles::tile_domain, tiles::TileRange, BoundaryList, ConfigError, ContinuumField,
    FlowConfig, Parity, PopulationStore, RelaxationParams,
};
use nalgebra::Vector3;
use persistence::{PersistenceError, SnapshotMeta};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Progress snapshot of a running simulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationStats {
    /// Completed full physical time steps.
    pub steps: u64,
    /// Parity the buffer is currently consistent under.
    pub parity: Parity,
    /// Total mass of population set 0.
    pub total_mass: f64,
}

/// A complete simulation run over one periodic domain.
pub struct Simulation {
    config: FlowConfig,
    relaxation: RelaxationParams,
    populations: PopulationStore,
    continuum: ContinuumField,
    boundary: BoundaryList,
    tiles: Vec<TileRange>,
    pool: rayon::ThreadPool,
    parity: Parity,
    steps_completed: u64,
}

impl Simulation {
    /// Validate the configuration, allocate the buffers and initialize
    /// every population set to the resting equilibrium (`rho = 1`,
    /// zero momentum).
    ///
    /// # Errors
    ///
    /// Returns the configuration error when validation fails or the
    /// thread pool cannot be built. There is no degraded mode: callers
    /// are expected to report the error and abort.
    pub fn new(config: FlowConfig, boundary: BoundaryList) -> Result<Self, ConfigError> {
        config.validate()?;
        let relaxation = config.relaxation()?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads.unwrap_or(0))
            .build()
            .map_err(|e| ConfigError::ThreadPool(e.to_string()))?;

        let mut populations =
            PopulationStore::new(config.nx, config.ny, config.nz, config.population_sets);
        for p in 0..config.population_sets {
            bgk::initialize_equilibrium(&mut populations, 1.0, [0.0; 3], p);
        }
        let continuum = ContinuumField::new(config.nx, config.ny, config.nz);
        let tiles = tile_domain(config.nx, config.ny, config.nz, config.tile_edge);

        info!(
            "initialized {}x{}x{} domain ({} population sets, Q={}, stride {}), \
             tau={:.4}, {} tiles of edge {}, {} boundary sites",
            config.nx,
            config.ny,
            config.nz,
            config.population_sets,
            <D3Q27 as LatticeModel>::Q,
            <D3Q27 as LatticeModel>::ND,
            relaxation.tau,
            tiles.len(),
            config.tile_edge,
            boundary.len()
        );

        Ok(Self {
            config,
            relaxation,
            populations,
            continuum,
            boundary,
            tiles,
            pool,
            parity: Parity::Even,
            steps_completed: 0,
        })
    }

    /// Advance one parity sub-step: collision kernel over all population
    /// sets, then the bounce-back pass, then flip the parity.
    ///
    /// When `write_macroscopic` is set, the pre-collision moments of
    /// population set 0 are stored into the continuum field.
    pub fn step_half(&mut self, write_macroscopic: bool) {
        let relaxation = self.relaxation;
        let npop = self.config.population_sets;
        let parity = self.parity;
        let populations = &mut self.populations;
        let continuum = &mut self.continuum;
        let boundary = &self.boundary;
        let tiles = &self.tiles;

        self.pool.install(|| match parity {
            Parity::Even => {
                for p in 0..npop {
                    let field = if write_macroscopic && p == 0 {
                        Some(&mut *continuum)
                    } else {
                        None
                    };
                    bgk::collide_stream::<false>(populations, field, relaxation, p, tiles);
                    bounce_back::apply::<false>(boundary, populations, p);
                }
            }
            Parity::Odd => {
                for p in 0..npop {
                    let field = if write_macroscopic && p == 0 {
                        Some(&mut *continuum)
                    } else {
                        None
                    };
                    bgk::collide_stream::<true>(populations, field, relaxation, p, tiles);
                    bounce_back::apply::<true>(boundary, populations, p);
                }
            }
        });

        self.parity = self.parity.flipped();
    }

    /// Advance one full physical time step (two sub-steps).
    ///
    /// The continuum field is refreshed on the second sub-step of every
    /// `continuum_interval`-th step.
    pub fn step(&mut self) {
        let interval = u64::from(self.config.continuum_interval);
        let write = interval != 0 && (self.steps_completed + 1) % interval == 0;
        self.step_half(false);
        self.step_half(write);
        self.steps_completed += 1;
    }

    /// Run a fixed number of full steps.
    pub fn run(&mut self, steps: u64) {
        info!("advancing {steps} steps from step {}", self.steps_completed);
        for _ in 0..steps {
            self.step();
            if self.steps_completed % 100 == 0 {
                debug!("completed step {}", self.steps_completed);
            }
        }
    }

    /// Reset every population set to the equilibrium of a uniform state.
    ///
    /// `momentum` follows the raw (undivided) first-moment convention of
    /// the kernel. Resets the parity to even and the step counter to
    /// zero.
    pub fn set_uniform_flow(&mut self, density: f64, momentum: [f64; 3]) {
        for p in 0..self.config.population_sets {
            bgk::initialize_equilibrium(&mut self.populations, density, momentum, p);
        }
        self.parity = Parity::Even;
        self.steps_completed = 0;
    }

    /// Density of population set 0 at a cell, under the current parity.
    #[must_use]
    pub fn density_at(&self, x: usize, y: usize, z: usize) -> f64 {
        self.moments_at(x, y, z).0
    }

    /// Raw momentum of population set 0 at a cell, under the current
    /// parity. This is the undivided first moment `sum f * c`.
    #[must_use]
    pub fn momentum_at(&self, x: usize, y: usize, z: usize) -> Vector3<f64> {
        let (_, m) = self.moments_at(x, y, z);
        Vector3::new(m[0], m[1], m[2])
    }

    /// Flow velocity of population set 0 at a cell: the raw momentum
    /// divided by the local density. The division happens only here, at
    /// the query boundary; everything inside the solver stays in the raw
    /// convention.
    #[must_use]
    pub fn velocity_at(&self, x: usize, y: usize, z: usize) -> Vector3<f64> {
        let (density, m) = self.moments_at(x, y, z);
        Vector3::new(m[0], m[1], m[2]) / density
    }

    fn moments_at(&self, x: usize, y: usize, z: usize) -> (f64, [f64; 3]) {
        match self.parity {
            Parity::Even => cell_moments::<false>(&self.populations, x, y, z, 0),
            Parity::Odd => cell_moments::<true>(&self.populations, x, y, z, 0),
        }
    }

    /// Total mass of population set 0.
    #[must_use]
    pub fn total_mass(&self) -> f64 {
        self.populations.total_mass(0)
    }

    /// Progress snapshot.
    #[must_use]
    pub fn stats(&self) -> SimulationStats {
        SimulationStats {
            steps: self.steps_completed,
            parity: self.parity,
            total_mass: self.total_mass(),
        }
    }

    /// Current buffer parity.
    #[must_use]
    pub fn parity(&self) -> Parity {
        self.parity
    }

    /// Completed full steps.
    #[must_use]
    pub fn steps_completed(&self) -> u64 {
        self.steps_completed
    }

    /// The run configuration.
    #[must_use]
    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    /// Read-only population store (snapshot export, diagnostics).
    #[must_use]
    pub fn populations(&self) -> &PopulationStore {
        &self.populations
    }

    /// Read-only continuum field for export collaborators. Only valid
    /// after a step that wrote it (see `continuum_interval`).
    #[must_use]
    pub fn continuum(&self) -> &ContinuumField {
        &self.continuum
    }

    /// The wall-node list.
    #[must_use]
    pub fn boundary(&self) -> &BoundaryList {
        &self.boundary
    }

    /// Save the population buffer and its parity metadata under
    /// `dir/{name}_{step}.bin` (+ `.meta.json`).
    ///
    /// # Errors
    ///
    /// Propagates snapshot I/O errors.
    pub fn save_snapshot(&self, dir: &Path, name: &str) -> Result<PathBuf, PersistenceError> {
        persistence::save_populations(
            &self.populations,
            self.parity,
            self.steps_completed,
            dir,
            name,
        )
    }

    /// Restore the population buffer, parity and step counter from a
    /// snapshot written by [`save_snapshot`](Self::save_snapshot).
    ///
    /// # Errors
    ///
    /// Propagates snapshot I/O and shape-mismatch errors.
    pub fn load_snapshot(
        &mut self,
        dir: &Path,
        name: &str,
        step: u64,
    ) -> Result<(), PersistenceError> {
        let meta: SnapshotMeta =
            persistence::load_populations(&mut self.populations, dir, name, step)?;
        self.parity = meta.parity;
        self.steps_completed = meta.step;
        Ok(())
    }
}
