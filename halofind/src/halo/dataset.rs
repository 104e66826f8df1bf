//! Loaded simulation snapshot
//!
//! A `Dataset` owns every particle of one snapshot plus a mass octree over
//! their physical positions. It is read-only once built and shared by
//! reference across region workers.

use crate::halo::cosmology::Cosmology;
use crate::halo::octree::MassOctree;
use crate::halo::partition::BoundingBox;
use crate::halo::query::SphereQuery;
use crate::halo::states::{NVec3, Particle, ParticleId};

pub struct Dataset {
    pub name: String,
    pub omega_matter: f64,
    particles: Vec<Particle>,
    tree: MassOctree,
}

impl Dataset {
    pub fn new(name: impl Into<String>, omega_matter: f64, particles: Vec<Particle>) -> Self {
        let tree = MassOctree::build(&particles);
        Self {
            name: name.into(),
            omega_matter,
            particles,
            tree,
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Particles whose code position lies in `bounds`
    pub fn region(&self, bounds: &BoundingBox) -> Vec<Particle> {
        self.particles
            .iter()
            .filter(|p| bounds.contains(&p.code_x))
            .cloned()
            .collect()
    }

    /// Mean matter density of the box in Msun / Mpc^3
    pub fn box_density(&self, cosmology: &Cosmology) -> f64 {
        cosmology.box_density(self.omega_matter)
    }
}

impl SphereQuery for Dataset {
    fn enclosed_mass(&self, center: &NVec3, radius: f64) -> f64 {
        self.tree.enclosed_mass(center, radius)
    }

    fn members(&self, center: &NVec3, radius: f64) -> Vec<ParticleId> {
        self.tree.members(center, radius)
    }
}
