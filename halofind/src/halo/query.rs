//! Spatial region queries
//!
//! The radius search and the extraction loop only need two things from the
//! particle data: the mass inside a sphere, and the exact particle ids inside
//! a sphere. [`SphereQuery`] is that seam. [`DirectSphereQuery`] answers by
//! scanning every particle (O(N) per query) and serves as the reference the
//! octree is checked against.

use crate::halo::states::{NVec3, Particle, ParticleId};

/// Region query over a fixed particle set. Membership is `|x - c| <= r`.
pub trait SphereQuery {
    /// Total mass within `radius` of `center`
    fn enclosed_mass(&self, center: &NVec3, radius: f64) -> f64;

    /// Ids of every particle within `radius` of `center`
    fn members(&self, center: &NVec3, radius: f64) -> Vec<ParticleId>;
}

/// Brute-force sphere query over a borrowed particle slice
pub struct DirectSphereQuery<'a> {
    pub particles: &'a [Particle],
}

impl<'a> DirectSphereQuery<'a> {
    pub fn new(particles: &'a [Particle]) -> Self {
        Self { particles }
    }
}

impl SphereQuery for DirectSphereQuery<'_> {
    fn enclosed_mass(&self, center: &NVec3, radius: f64) -> f64 {
        let r2 = radius * radius;
        self.particles
            .iter()
            .filter(|p| (p.x - center).norm_squared() <= r2)
            .map(|p| p.m)
            .sum()
    }

    fn members(&self, center: &NVec3, radius: f64) -> Vec<ParticleId> {
        let r2 = radius * radius;
        self.particles
            .iter()
            .filter(|p| (p.x - center).norm_squared() <= r2)
            .map(|p| p.id)
            .collect()
    }
}
