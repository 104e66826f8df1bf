//! Persistence of per-region results
//!
//! The driver hands each finished region to a [`CatalogSink`] exactly once.
//! [`CsvSink`] writes two files per region into one directory:
//!
//! - `halo_region_<index>.csv` : the halo catalog
//! - `used_particles_<index>.csv` : every claimed particle, with the
//!   discovery index of its halo in `halo_id_number`

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::halo::error::HaloError;
use crate::halo::states::{ClaimedParticle, HaloRecord, UsedParticles};

pub trait CatalogSink: Sync {
    fn write_region(&self, region: usize, halos: &[HaloRecord], used: &UsedParticles) -> Result<(), HaloError>;
}

/// Header of the used-particle table, in `UsedParticleRow` field order
const USED_PARTICLE_COLUMNS: [&str; 13] = [
    "id",
    "x",
    "y",
    "z",
    "code_x",
    "code_y",
    "code_z",
    "mass",
    "x_proj_density",
    "y_proj_density",
    "z_proj_density",
    "sum_proj_density",
    "halo_id_number",
];

/// Used-particle table row
#[derive(Debug, Clone, Serialize)]
struct UsedParticleRow {
    id: u64,
    x: f64,
    y: f64,
    z: f64,
    code_x: f64,
    code_y: f64,
    code_z: f64,
    mass: f64,
    x_proj_density: f64,
    y_proj_density: f64,
    z_proj_density: f64,
    sum_proj_density: f64,
    halo_id_number: usize,
}

impl From<&ClaimedParticle> for UsedParticleRow {
    fn from(c: &ClaimedParticle) -> Self {
        let p = &c.particle;
        UsedParticleRow {
            id: p.id.0,
            x: p.x.x,
            y: p.x.y,
            z: p.x.z,
            code_x: p.code_x.x,
            code_y: p.code_x.y,
            code_z: p.code_x.z,
            mass: p.m,
            x_proj_density: c.density.x,
            y_proj_density: c.density.y,
            z_proj_density: c.density.z,
            sum_proj_density: c.density.sum(),
            halo_id_number: c.halo,
        }
    }
}

/// Writes region results as CSV files under `dir`
#[derive(Debug, Clone)]
pub struct CsvSink {
    dir: PathBuf,
}

impl CsvSink {
    /// Creates `dir` if it does not exist yet
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, HaloError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn halo_path(&self, region: usize) -> PathBuf {
        self.dir.join(format!("halo_region_{region}.csv"))
    }

    pub fn used_path(&self, region: usize) -> PathBuf {
        self.dir.join(format!("used_particles_{region}.csv"))
    }
}

impl CatalogSink for CsvSink {
    fn write_region(&self, region: usize, halos: &[HaloRecord], used: &UsedParticles) -> Result<(), HaloError> {
        // headers are explicit so empty regions still get them
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(self.halo_path(region))?;
        wtr.write_record(["x0", "y0", "z0", "mass", "r200", "sum_dens", "key_particle", "n_particles"])?;
        for h in halos {
            wtr.serialize(h)?;
        }
        wtr.flush()?;

        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(self.used_path(region))?;
        wtr.write_record(USED_PARTICLE_COLUMNS)?;
        for c in used.iter() {
            wtr.serialize(UsedParticleRow::from(c))?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// Discards everything; used when a run has no output directory
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl CatalogSink for NullSink {
    fn write_region(&self, _region: usize, _halos: &[HaloRecord], _used: &UsedParticles) -> Result<(), HaloError> {
        Ok(())
    }
}

/// Read back a halo catalog written by [`CsvSink`]
pub fn read_halo_catalog(path: &Path) -> Result<Vec<HaloRecord>, HaloError> {
    let mut rdr = csv::Reader::from_path(path)?;
    let mut halos = Vec::new();
    for row in rdr.deserialize::<HaloRecord>() {
        halos.push(row?);
    }
    Ok(halos)
}
