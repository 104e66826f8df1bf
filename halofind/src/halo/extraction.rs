//! Halo extraction loop
//!
//! Turns one region's particle catalog into an ordered halo catalog. Each
//! iteration:
//!
//! 1. recomputes projected densities over the remaining particles,
//! 2. takes the highest composite score as the seed,
//! 3. runs the virial radius search around the seed,
//! 4. queries the exact sphere membership at the converged radius,
//! 5. records a `HaloRecord`,
//! 6. moves every member still in the catalog into the used set.
//!
//! The loop is `Running` until the peak score is at or below `min_sigma`
//! (or the catalog empties, or the per-region budget runs out), then `Done`.
//! The seed is always claimed, so the catalog shrinks on every iteration
//! and the loop cannot run more times than there are particles.

use log::{debug, info, warn};

use crate::halo::density::assign_densities;
use crate::halo::error::HaloError;
use crate::halo::params::FinderParameters;
use crate::halo::query::SphereQuery;
use crate::halo::states::{HaloRecord, ParticleCatalog, UsedParticles};
use crate::halo::virial::{radius_guess, VirialSearch};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Done,
}

/// Why a region's loop went `Done`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StopReason {
    /// Peak composite score fell to `min_sigma` or below
    BelowThreshold,
    /// No particles left
    Exhausted,
    /// `max_halos` iterations were spent
    IterationBudget,
    /// The seed's density could not seed a radius guess
    InvalidSeedDensity(f64),
}

/// Everything a finished loop produced
#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    pub halos: Vec<HaloRecord>,
    pub used: UsedParticles,
    pub remaining: usize,
    pub stop: StopReason,
}

pub struct HaloExtraction<'a, Q: SphereQuery + ?Sized> {
    query: &'a Q,
    params: &'a FinderParameters,
    search: VirialSearch,
    box_density: f64, // Msun per cubic physical unit
    catalog: ParticleCatalog,
    used: UsedParticles,
    halos: Vec<HaloRecord>,
    state: LoopState,
    stop: Option<StopReason>,
}

impl<'a, Q: SphereQuery + ?Sized> HaloExtraction<'a, Q> {
    /// `box_density` must already be in Msun per cubic physical unit
    pub fn new(query: &'a Q, catalog: ParticleCatalog, params: &'a FinderParameters, box_density: f64) -> Self {
        let search = VirialSearch::new(params.overdensity, params.max_search_iterations, params.search);
        Self {
            query,
            params,
            search,
            box_density,
            catalog,
            used: UsedParticles::new(),
            halos: Vec::new(),
            state: LoopState::Running,
            stop: None,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn catalog(&self) -> &ParticleCatalog {
        &self.catalog
    }

    pub fn halos(&self) -> &[HaloRecord] {
        &self.halos
    }

    pub fn used(&self) -> &UsedParticles {
        &self.used
    }

    fn finish(&mut self, stop: StopReason) {
        self.state = LoopState::Done;
        self.stop = Some(stop);
    }

    /// Run one iteration. Returns the halo found, or `None` once `Done`.
    pub fn step(&mut self) -> Result<Option<&HaloRecord>, HaloError> {
        if self.state == LoopState::Done {
            return Ok(None);
        }
        if self.catalog.is_empty() {
            self.finish(StopReason::Exhausted);
            return Ok(None);
        }
        if self.halos.len() >= self.params.max_halos {
            self.finish(StopReason::IterationBudget);
            return Ok(None);
        }

        assign_densities(&mut self.catalog, &self.params.projection);

        let Some(seed) = self.catalog.peak() else {
            self.finish(StopReason::Exhausted);
            return Ok(None);
        };
        let sigma = self.catalog.density(seed).sum();
        if sigma <= self.params.min_sigma {
            self.finish(StopReason::BelowThreshold);
            return Ok(None);
        }

        let seed_particle = self.catalog.particle(seed).clone();
        let r0 = match radius_guess(sigma, &self.params.radius_guess, self.params.length_unit_mpc) {
            Ok(r0) => r0,
            Err(HaloError::InvalidSeedDensity(s)) => {
                warn!("seed particle {} has density {s}, stopping region", seed_particle.id.0);
                self.finish(StopReason::InvalidSeedDensity(s));
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        debug!("seed {} sigma {sigma:.4e} guess radius {r0:.6}", seed_particle.id.0);

        let sphere = self.search.find(self.query, &seed_particle.x, r0, self.box_density)?;

        // Membership at the converged radius is authoritative
        let mut members = self.query.members(&seed_particle.x, sphere.radius);
        if !members.contains(&seed_particle.id) {
            members.push(seed_particle.id);
        }

        let halo_index = self.halos.len();
        let mut claimed = 0;
        for id in &members {
            if let Some((p, d)) = self.catalog.remove(*id) {
                self.used.claim(p, d, halo_index);
                claimed += 1;
            }
        }

        let record = HaloRecord {
            x0: seed_particle.x.x,
            y0: seed_particle.x.y,
            z0: seed_particle.x.z,
            mass: sphere.mass,
            r200: sphere.radius,
            sum_dens: sigma,
            key_particle: seed_particle.id.0,
            n_particles: members.len(),
        };
        info!(
            "halo {halo_index}: mass {:.4e} r200 {:.4} with {} particles ({} claimed, {} left)",
            record.mass,
            record.r200,
            record.n_particles,
            claimed,
            self.catalog.len()
        );

        self.halos.push(record);
        Ok(self.halos.last())
    }

    /// Iterate until `Done`
    pub fn run(mut self) -> Result<ExtractionOutcome, HaloError> {
        while self.state == LoopState::Running {
            self.step()?;
        }

        Ok(ExtractionOutcome {
            remaining: self.catalog.len(),
            stop: self.stop.unwrap_or(StopReason::Exhausted),
            halos: self.halos,
            used: self.used,
        })
    }
}
