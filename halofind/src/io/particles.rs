//! Particle table loading
//!
//! Reads a CSV with header `id,x,y,z,code_x,code_y,code_z,mass`.

use std::io::Read;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::halo::error::HaloError;
use crate::halo::states::{NVec3, Particle, ParticleId};

/// One row of the particle table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticleRow {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub code_x: f64,
    pub code_y: f64,
    pub code_z: f64,
    pub mass: f64,
}

impl From<ParticleRow> for Particle {
    fn from(row: ParticleRow) -> Self {
        Particle {
            id: ParticleId(row.id),
            x: NVec3::new(row.x, row.y, row.z),
            code_x: NVec3::new(row.code_x, row.code_y, row.code_z),
            m: row.mass,
        }
    }
}

impl From<&Particle> for ParticleRow {
    fn from(p: &Particle) -> Self {
        ParticleRow {
            id: p.id.0,
            x: p.x.x,
            y: p.x.y,
            z: p.x.z,
            code_x: p.code_x.x,
            code_y: p.code_x.y,
            code_z: p.code_x.z,
            mass: p.m,
        }
    }
}

/// Read particles from any CSV source
pub fn read_particles<R: Read>(reader: R) -> Result<Vec<Particle>, HaloError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut particles = Vec::new();
    for row in rdr.deserialize::<ParticleRow>() {
        particles.push(Particle::from(row?));
    }
    Ok(particles)
}

/// Read a particle table from disk
pub fn load_particles(path: &Path) -> Result<Vec<Particle>, HaloError> {
    let file = std::fs::File::open(path)?;
    let particles = read_particles(std::io::BufReader::new(file))?;
    info!("loaded {} particles from {}", particles.len(), path.display());
    Ok(particles)
}

/// Write a particle table, same layout `read_particles` expects
pub fn write_particles(path: &Path, particles: &[Particle]) -> Result<(), HaloError> {
    let mut wtr = csv::Writer::from_path(path)?;
    for p in particles {
        wtr.serialize(ParticleRow::from(p))?;
    }
    wtr.flush()?;
    Ok(())
}
