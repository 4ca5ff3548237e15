//! Binary snapshot persistence
//!
//! Snapshots are raw little-endian `f64` dumps of the flat buffers with
//! no header: the byte length is exactly `8 * NX * NY * NZ * NPOP * ND`
//! for the population buffer and `8 * NX * NY * NZ * 4` for the continuum
//! field, under the filename convention `{name}_{step}.bin`.
//!
//! Producer and consumer must agree on the domain shape and — crucially —
//! on the parity the population buffer was saved at, which is not
//! inferable from the data. That agreement is carried by a JSON sidecar
//! (`{name}_{step}.meta.json`) holding a [`SnapshotMeta`]; the `.bin`
//! files themselves stay headerless for external tooling.

use crate::solver::{ContinuumField, Parity, PopulationStore};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Out-of-band description of a population snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    /// Domain extent in cells along x.
    pub nx: usize,
    /// Domain extent in cells along y.
    pub ny: usize,
    /// Domain extent in cells along z.
    pub nz: usize,
    /// Number of population sets in the buffer.
    pub npop: usize,
    /// Full steps completed when the snapshot was taken.
    pub step: u64,
    /// Parity the buffer is consistent under.
    pub parity: Parity,
}

/// Path of the raw dump for `{name}_{step}.bin`.
#[must_use]
pub fn snapshot_path(dir: &Path, name: &str, step: u64) -> PathBuf {
    dir.join(format!("{name}_{step}.bin"))
}

fn meta_path(dir: &Path, name: &str, step: u64) -> PathBuf {
    dir.join(format!("{name}_{step}.meta.json"))
}

/// Dump the population buffer and write its metadata sidecar.
///
/// # Errors
///
/// Returns an error when the metadata cannot be serialized or either
/// file cannot be written.
pub fn save_populations(
    populations: &PopulationStore,
    parity: Parity,
    step: u64,
    dir: &Path,
    name: &str,
) -> Result<PathBuf, PersistenceError> {
    let (nx, ny, nz) = populations.dimensions();
    let meta = SnapshotMeta {
        nx,
        ny,
        nz,
        npop: populations.population_sets(),
        step,
        parity,
    };
    let contents = serde_json::to_string_pretty(&meta)
        .map_err(|e| PersistenceError::SerializeFailed(e.to_string()))?;
    fs::write(meta_path(dir, name, step), contents)
        .map_err(|e| PersistenceError::SaveFailed(e.to_string()))?;

    let path = snapshot_path(dir, name, step);
    write_raw(&path, populations.as_slice())?;
    Ok(path)
}

/// Load a population snapshot into an existing store.
///
/// The store must already have the shape recorded in the sidecar; this
/// routine restores data, it does not reallocate.
///
/// # Errors
///
/// Returns an error when a file cannot be read or parsed, when the
/// sidecar shape disagrees with the store, or when the raw dump has the
/// wrong byte length.
pub fn load_populations(
    populations: &mut PopulationStore,
    dir: &Path,
    name: &str,
    step: u64,
) -> Result<SnapshotMeta, PersistenceError> {
    let contents = fs::read_to_string(meta_path(dir, name, step))
        .map_err(|e| PersistenceError::LoadFailed(e.to_string()))?;
    let meta: SnapshotMeta = serde_json::from_str(&contents)
        .map_err(|e| PersistenceError::ParseFailed(e.to_string()))?;

    let (nx, ny, nz) = populations.dimensions();
    if (meta.nx, meta.ny, meta.nz, meta.npop) != (nx, ny, nz, populations.population_sets()) {
        return Err(PersistenceError::ShapeMismatch(format!(
            "snapshot is {}x{}x{} with {} sets, store is {nx}x{ny}x{nz} with {} sets",
            meta.nx,
            meta.ny,
            meta.nz,
            meta.npop,
            populations.population_sets()
        )));
    }

    read_raw(&snapshot_path(dir, name, step), populations.as_mut_slice())?;
    Ok(meta)
}

/// Dump the continuum field (no sidecar; the export collaborator carries
/// the shape out-of-band).
///
/// # Errors
///
/// Returns an error when the file cannot be written.
pub fn save_continuum(
    continuum: &ContinuumField,
    step: u64,
    dir: &Path,
    name: &str,
) -> Result<PathBuf, PersistenceError> {
    let path = snapshot_path(dir, name, step);
    write_raw(&path, continuum.as_slice())?;
    Ok(path)
}

fn write_raw(path: &Path, values: &[f64]) -> Result<(), PersistenceError> {
    let file = fs::File::create(path).map_err(|e| PersistenceError::SaveFailed(e.to_string()))?;
    let mut writer = std::io::BufWriter::new(file);
    for value in values {
        writer
            .write_all(&value.to_le_bytes())
            .map_err(|e| PersistenceError::SaveFailed(e.to_string()))?;
    }
    writer
        .flush()
        .map_err(|e| PersistenceError::SaveFailed(e.to_string()))
}

fn read_raw(path: &Path, values: &mut [f64]) -> Result<(), PersistenceError> {
    let bytes = fs::read(path).map_err(|e| PersistenceError::LoadFailed(e.to_string()))?;
    if bytes.len() != values.len() * 8 {
        return Err(PersistenceError::ShapeMismatch(format!(
            "raw dump holds {} bytes, expected {}",
            bytes.len(),
            values.len() * 8
        )));
    }
    for (value, chunk) in values.iter_mut().zip(bytes.chunks_exact(8)) {
        *value = f64::from_le_bytes(chunk.try_into().expect("chunks_exact yields 8 bytes"));
    }
    Ok(())
}

/// Errors that can occur with snapshot operations.
#[derive(Debug)]
pub enum PersistenceError {
    /// Failed to read a file.
    LoadFailed(String),
    /// Failed to parse the metadata sidecar.
    ParseFailed(String),
    /// Failed to serialize the metadata sidecar.
    SerializeFailed(String),
    /// Failed to write a file.
    SaveFailed(String),
    /// Snapshot shape disagrees with the target buffer.
    ShapeMismatch(String),
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistenceError::LoadFailed(msg) => write!(f, "Failed to load: {msg}"),
            PersistenceError::ParseFailed(msg) => write!(f, "Failed to parse: {msg}"),
            PersistenceError::SerializeFailed(msg) => write!(f, "Failed to serialize: {msg}"),
            PersistenceError::SaveFailed(msg) => write!(f, "Failed to save: {msg}"),
            PersistenceError::ShapeMismatch(msg) => write!(f, "Shape mismatch: {msg}"),
        }
    }
}

impl std::error::Error for PersistenceError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("lbm-snapshot-{tag}-{}", std::process::id()));
        fs::create_dir_all(&dir).expect("scratch dir");
        dir
    }

    #[test]
    fn test_population_snapshot_round_trip() {
        let dir = scratch_dir("roundtrip");
        let mut store = PopulationStore::new(3, 4, 2, 1);
        for (at, value) in store.as_mut_slice().iter_mut().enumerate() {
            *value = at as f64 * 0.25;
        }
        let original = store.as_slice().to_vec();

        let path = save_populations(&store, Parity::Odd, 42, &dir, "flow").unwrap();
        assert!(path.ends_with("flow_42.bin"));

        // Clobber and restore.
        store.as_mut_slice().fill(0.0);
        let meta = load_populations(&mut store, &dir, "flow", 42).unwrap();
        assert_eq!(meta.parity, Parity::Odd);
        assert_eq!(meta.step, 42);
        assert_eq!(store.as_slice(), original.as_slice());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_raw_dump_has_fixed_length_and_no_header() {
        let dir = scratch_dir("length");
        let store = PopulationStore::new(2, 2, 2, 1);
        let path = save_populations(&store, Parity::Even, 0, &dir, "flow").unwrap();
        let bytes = fs::read(&path).unwrap();
        assert_eq!(bytes.len(), store.as_slice().len() * 8);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_shape_mismatch_is_rejected() {
        let dir = scratch_dir("mismatch");
        let store = PopulationStore::new(2, 2, 2, 1);
        save_populations(&store, Parity::Even, 7, &dir, "flow").unwrap();

        let mut other = PopulationStore::new(3, 2, 2, 1);
        let result = load_populations(&mut other, &dir, "flow", 7);
        assert!(matches!(result, Err(PersistenceError::ShapeMismatch(_))));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_snapshot_is_an_error() {
        let dir = scratch_dir("missing");
        let mut store = PopulationStore::new(2, 2, 2, 1);
        let result = load_populations(&mut store, &dir, "absent", 1);
        assert!(matches!(result, Err(PersistenceError::LoadFailed(_))));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_continuum_dump() {
        let dir = scratch_dir("continuum");
        let mut field = ContinuumField::new(2, 3, 2);
        field.set(1, 2, 0, [1.0, 0.1, 0.2, 0.3]);
        let path = save_continuum(&field, 5, &dir, "density").unwrap();
        let bytes = fs::read(&path).unwrap();
        assert_eq!(bytes.len(), field.as_slice().len() * 8);

        let _ = fs::remove_dir_all(&dir);
    }
}
