//! Flow configuration and relaxation parameters
//!
//! All knobs of a run are collected in [`FlowConfig`] and validated once,
//! before any buffer is allocated. The hot loop has no recoverable error
//! paths by construction, so everything that could go wrong numerically
//! (degenerate viscosity, relaxation time outside the stable range,
//! buffer length overflow) is rejected here with a typed error instead of
//! being clamped silently.

use crate::lattice::D3Q27;
use crate::solver::populations::buffer_len;
use serde::{Deserialize, Serialize};

/// Default cubic tile edge for the cache-blocked kernel loop.
pub const DEFAULT_TILE_EDGE: usize = 32;

/// Configuration for one simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Domain extent in cells along x.
    pub nx: usize,
    /// Domain extent in cells along y.
    pub ny: usize,
    /// Domain extent in cells along z.
    pub nz: usize,

    /// Number of independently stored population sets sharing the grid.
    pub population_sets: usize,

    /// Reynolds number of the configured flow.
    pub reynolds: f64,

    /// Characteristic velocity in lattice units.
    pub char_velocity: f64,

    /// Characteristic length in cells.
    pub char_length: f64,

    /// Explicit relaxation time override. When set, it is used as-is and
    /// the Reynolds-number derivation is skipped; it must still lie in the
    /// open interval (0, 2).
    pub relaxation_time: Option<f64>,

    /// Cubic tile edge for the kernel loop.
    pub tile_edge: usize,

    /// Worker thread count; `None` lets the thread pool pick one thread
    /// per available core. This is an explicit per-run value, not a
    /// process-wide setting.
    pub threads: Option<usize>,

    /// Write the macroscopic continuum field every this many full steps;
    /// 0 disables periodic write-out.
    pub continuum_interval: u32,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            nx: 64,
            ny: 64,
            nz: 64,
            population_sets: 1,
            reynolds: 100.0,
            char_velocity: 0.05,
            char_length: 32.0,
            relaxation_time: None,
            tile_edge: DEFAULT_TILE_EDGE,
            threads: None,
            continuum_interval: 0,
        }
    }
}

impl FlowConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidDomain`] for zero extents, zero
    /// population sets, a zero tile edge or a population buffer length
    /// that overflows `usize`, and propagates the relaxation-parameter
    /// check of [`relaxation`](Self::relaxation).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nx == 0 || self.ny == 0 || self.nz == 0 {
            return Err(ConfigError::InvalidDomain(format!(
                "domain extents must be nonzero, got {}x{}x{}",
                self.nx, self.ny, self.nz
            )));
        }
        if self.population_sets == 0 {
            return Err(ConfigError::InvalidDomain(
                "at least one population set is required".to_string(),
            ));
        }
        if self.tile_edge == 0 {
            return Err(ConfigError::InvalidDomain(
                "tile edge must be nonzero".to_string(),
            ));
        }
        if buffer_len::<D3Q27>(self.nx, self.ny, self.nz, self.population_sets).is_none() {
            return Err(ConfigError::InvalidDomain(format!(
                "population buffer length overflows for {}x{}x{} with {} sets",
                self.nx, self.ny, self.nz, self.population_sets
            )));
        }
        self.relaxation().map(|_| ())
    }

    /// Kinematic viscosity implied by the Reynolds configuration.
    #[must_use]
    pub fn viscosity(&self) -> f64 {
        self.char_velocity * self.char_length / self.reynolds
    }

    /// Derive the relaxation parameters.
    ///
    /// Uses the explicit [`relaxation_time`](Self::relaxation_time) when
    /// present, otherwise `tau = nu / cs^2 + 1/2` with
    /// `nu = char_velocity * char_length / reynolds`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRelaxation`] when the resulting
    /// relaxation time is non-finite or outside (0, 2).
    pub fn relaxation(&self) -> Result<RelaxationParams, ConfigError> {
        let tau = match self.relaxation_time {
            Some(tau) => tau,
            None => self.viscosity() / D3Q27::CS2 + 0.5,
        };
        RelaxationParams::from_tau(tau)
    }
}

/// Relaxation time and rate of the single-relaxation-time collision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelaxationParams {
    /// Relaxation time `tau`, in (0, 2).
    pub tau: f64,
    /// Relaxation rate `omega = 1 / tau`.
    pub omega: f64,
}

impl RelaxationParams {
    /// Build from a relaxation time.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRelaxation`] when `tau` is
    /// non-finite or outside the open interval (0, 2).
    pub fn from_tau(tau: f64) -> Result<Self, ConfigError> {
        if !tau.is_finite() || tau <= 0.0 || tau >= 2.0 {
            return Err(ConfigError::InvalidRelaxation { tau });
        }
        Ok(Self {
            tau,
            omega: 1.0 / tau,
        })
    }
}

/// Errors detected while validating a configuration.
///
/// All of these are construction-time failures; there is no degraded mode
/// and no retry, so binaries are expected to report them and abort.
#[derive(Debug)]
pub enum ConfigError {
    /// Degenerate domain layout (zero extent, zero sets, overflow).
    InvalidDomain(String),
    /// Relaxation time outside the stable range (0, 2) or non-finite.
    InvalidRelaxation {
        /// The offending relaxation time.
        tau: f64,
    },
    /// The worker thread pool could not be constructed.
    ThreadPool(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidDomain(msg) => write!(f, "invalid domain: {msg}"),
            ConfigError::InvalidRelaxation { tau } => {
                write!(f, "relaxation time {tau} outside the stable range (0, 2)")
            }
            ConfigError::ThreadPool(msg) => write!(f, "thread pool setup failed: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = FlowConfig::default();
        config.validate().expect("default config must validate");
        let relaxation = config.relaxation().unwrap();
        // nu = 0.05 * 32 / 100 = 0.016; tau = 3 * nu + 0.5
        assert!((relaxation.tau - 0.548).abs() < 1e-12);
        assert!((relaxation.omega * relaxation.tau - 1.0).abs() < 1e-15);
    }

    #[test]
    fn test_zero_extent_rejected() {
        let config = FlowConfig {
            ny: 0,
            ..FlowConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDomain(_))
        ));
    }

    #[test]
    fn test_degenerate_viscosity_rejected() {
        // Re -> 0 drives tau to infinity.
        let config = FlowConfig {
            reynolds: 0.0,
            ..FlowConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRelaxation { .. })
        ));
    }

    #[test]
    fn test_relaxation_time_range() {
        assert!(RelaxationParams::from_tau(0.0).is_err());
        assert!(RelaxationParams::from_tau(2.0).is_err());
        assert!(RelaxationParams::from_tau(-0.3).is_err());
        assert!(RelaxationParams::from_tau(f64::NAN).is_err());
        let params = RelaxationParams::from_tau(0.6).unwrap();
        assert!((params.omega - 1.0 / 0.6).abs() < 1e-15);
    }

    #[test]
    fn test_explicit_relaxation_override() {
        let config = FlowConfig {
            relaxation_time: Some(1.2),
            ..FlowConfig::default()
        };
        assert_eq!(config.relaxation().unwrap().tau, 1.2);
    }

    #[test]
    fn test_buffer_overflow_rejected() {
        let config = FlowConfig {
            nx: usize::MAX / 2,
            ny: usize::MAX / 2,
            nz: 2,
            ..FlowConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDomain(_))
        ));
    }
}
