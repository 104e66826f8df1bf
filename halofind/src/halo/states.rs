//! Core state types for the halo finder.
//!
//! - `Particle` : one simulation particle (identity, two position systems, mass)
//! - `ParticleCatalog` : the shrinking working set, an arena with tombstones
//! - `UsedParticles` : every particle claimed so far, tagged by its halo
//! - `HaloRecord` : one row of the halo catalog
//!
//! Catalog slots are referenced by a stable `ParticleHandle`. Removing a
//! particle only flips its tombstone, so handles never move while the
//! extraction loop runs.

use std::collections::HashMap;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::halo::error::HaloError;

pub type NVec3 = Vector3<f64>;

/// Unique particle identity as stored in the simulation output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticleId(pub u64);

/// Stable slot index into a `ParticleCatalog`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParticleHandle(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub id: ParticleId,
    pub x: NVec3,      // physical position, same units as the projection grid
    pub code_x: NVec3, // native simulation position, unit cube
    pub m: f64,        // mass (Msun)
}

/// Projected densities of one particle along the three axes.
/// `x` is the density of the YZ map (projection along x), and so on.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProjectedDensity {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl ProjectedDensity {
    /// Composite score used to rank halo seeds
    pub fn sum(&self) -> f64 {
        self.x + self.y + self.z
    }
}

/// Working set of particles for one region.
pub struct ParticleCatalog {
    particles: Vec<Particle>,
    density: Vec<ProjectedDensity>,
    alive: Vec<bool>,
    lookup: HashMap<ParticleId, usize>,
    order: Vec<usize>, // live slots, composite score descending after a density pass
    live: usize,
}

impl ParticleCatalog {
    /// Build a catalog, rejecting duplicate identities
    pub fn new(particles: Vec<Particle>) -> Result<Self, HaloError> {
        let mut lookup = HashMap::with_capacity(particles.len());
        for (slot, p) in particles.iter().enumerate() {
            if lookup.insert(p.id, slot).is_some() {
                return Err(HaloError::DuplicateParticle(p.id.0));
            }
        }

        let n = particles.len();
        Ok(Self {
            particles,
            density: vec![ProjectedDensity::default(); n],
            alive: vec![true; n],
            lookup,
            order: (0..n).collect(),
            live: n,
        })
    }

    /// Number of particles still in the catalog
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn particle(&self, handle: ParticleHandle) -> &Particle {
        &self.particles[handle.0]
    }

    pub fn density(&self, handle: ParticleHandle) -> ProjectedDensity {
        self.density[handle.0]
    }

    pub fn contains(&self, id: ParticleId) -> bool {
        self.lookup.contains_key(&id)
    }

    /// Live particles in the current ranking order
    pub fn iter(&self) -> impl Iterator<Item = (ParticleHandle, &Particle)> + '_ {
        self.order
            .iter()
            .filter(|&&slot| self.alive[slot])
            .map(move |&slot| (ParticleHandle(slot), &self.particles[slot]))
    }

    /// Store freshly computed densities and re-rank the live particles by
    /// composite score, highest first. Ties keep ascending identity order.
    pub fn set_densities<I>(&mut self, densities: I)
    where
        I: IntoIterator<Item = (ParticleHandle, ProjectedDensity)>,
    {
        for (handle, d) in densities {
            self.density[handle.0] = d;
        }

        let alive = &self.alive;
        self.order.retain(|&slot| alive[slot]);

        let density = &self.density;
        let particles = &self.particles;
        self.order.sort_by(|&a, &b| {
            density[b]
                .sum()
                .total_cmp(&density[a].sum())
                .then_with(|| particles[a].id.cmp(&particles[b].id))
        });
    }

    /// Highest-ranked live particle
    pub fn peak(&self) -> Option<ParticleHandle> {
        self.order
            .iter()
            .find(|&&slot| self.alive[slot])
            .map(|&slot| ParticleHandle(slot))
    }

    /// Tombstone a particle. Returns `None` if the id is unknown or already
    /// removed; callers treat that as a no-op.
    pub fn remove(&mut self, id: ParticleId) -> Option<(Particle, ProjectedDensity)> {
        let slot = self.lookup.remove(&id)?;
        self.alive[slot] = false;
        self.live -= 1;
        Some((self.particles[slot].clone(), self.density[slot]))
    }
}

/// A particle moved out of the catalog, with the halo that claimed it
#[derive(Debug, Clone)]
pub struct ClaimedParticle {
    pub particle: Particle,
    pub density: ProjectedDensity,
    pub halo: usize, // discovery index of the claiming halo
}

/// Every particle claimed during one region run. Grows monotonically.
#[derive(Debug, Clone, Default)]
pub struct UsedParticles {
    entries: Vec<ClaimedParticle>,
}

impl UsedParticles {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn claim(&mut self, particle: Particle, density: ProjectedDensity, halo: usize) {
        self.entries.push(ClaimedParticle { particle, density, halo });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClaimedParticle> {
        self.entries.iter()
    }

    /// Particles claimed by the halo with the given discovery index
    pub fn claimed_by(&self, halo: usize) -> impl Iterator<Item = &ClaimedParticle> {
        self.entries.iter().filter(move |c| c.halo == halo)
    }
}

/// One halo catalog row. Field names double as the CSV header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HaloRecord {
    pub x0: f64, // center, physical units
    pub y0: f64,
    pub z0: f64,
    pub mass: f64,         // mass enclosed at r200 (Msun)
    pub r200: f64,         // physical units
    pub sum_dens: f64,     // composite projected density of the seed ("central sigma")
    pub key_particle: u64, // seed particle identity
    pub n_particles: usize,
}

impl HaloRecord {
    pub fn center(&self) -> NVec3 {
        NVec3::new(self.x0, self.y0, self.z0)
    }
}
