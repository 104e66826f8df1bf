//! Virial radius search
//!
//! Finds the radius around a seed at which the mean enclosed density is
//! `target` (200) times the box density. Two policies are available:
//!
//! - [`SearchMethod::Damped`]: multiplicative steps of 1.1 outward / 0.9
//!   inward, damped to 1.05 / 0.95 once the overdensity is within 20 of the
//!   target. It stops on the first step that crosses the target and can
//!   overshoot by up to one step.
//! - [`SearchMethod::Bracketed`]: expands or shrinks by factors of two until
//!   the target is bracketed, then bisects. A bracket whose midpoint falls
//!   outside its end values means the profile is not monotonic there; the
//!   search then scans the bracket in fixed steps for the innermost crossing
//!   before bisecting on.
//!
//! Both count every overdensity evaluation against `max_iterations` and
//! return [`HaloError::NonConvergence`] when it runs out. A sphere with no
//! mass in it never reaches the target, so this is also how zero local
//! density surfaces.

use std::f64::consts::PI;

use log::{debug, warn};
use serde::Deserialize;

use crate::halo::error::HaloError;
use crate::halo::params::RadiusGuess;
use crate::halo::query::SphereQuery;
use crate::halo::states::NVec3;

/// Overdensity distance from the target inside which damped steps shrink
const DAMPING_WINDOW: f64 = 20.0;
/// Relative bracket width at which bisection stops
const DEFAULT_TOLERANCE: f64 = 1.0e-6;
/// Fixed steps used to rescan a non-monotonic bracket
const SCAN_STEPS: usize = 32;

/// Radius search policy
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMethod {
    #[serde(rename = "damped")]
    Damped,
    #[serde(rename = "bracketed")]
    Bracketed,
}

/// Converged sphere
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirialResult {
    pub mass: f64,        // enclosed mass at `radius`
    pub radius: f64,      // physical units
    pub overdensity: f64, // mean enclosed density over box density
    pub iterations: usize,
}

/// Power-law R200 guess from a composite projected density, in physical
/// units. Zero, negative and non-finite densities have no guess.
pub fn radius_guess(sigma: f64, guess: &RadiusGuess, length_unit_mpc: f64) -> Result<f64, HaloError> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(HaloError::InvalidSeedDensity(sigma));
    }
    let r_mpc = 10f64.powf(guess.slope * sigma.log10() + guess.intercept) * guess.scale_mpc;
    Ok(r_mpc / length_unit_mpc)
}

/// Enclosed mass and mean overdensity of a sphere
pub fn overdensity_at<Q: SphereQuery + ?Sized>(
    query: &Q,
    center: &NVec3,
    radius: f64,
    box_density: f64,
) -> (f64, f64) {
    let mass = query.enclosed_mass(center, radius);
    let volume = 4.0 / 3.0 * PI * radius.powi(3);
    (mass, mass / volume / box_density)
}

#[derive(Debug, Clone, Copy)]
pub struct VirialSearch {
    pub target: f64,
    pub max_iterations: usize,
    pub method: SearchMethod,
    pub tolerance: f64,
}

/// Two radii with the target overdensity between them:
/// `od_lo > target >= od_hi`
#[derive(Debug, Clone, Copy)]
struct Bracket {
    lo: f64,
    od_lo: f64,
    hi: f64,
    od_hi: f64,
    mass_hi: f64,
}

impl VirialSearch {
    pub fn new(target: f64, max_iterations: usize, method: SearchMethod) -> Self {
        Self {
            target,
            max_iterations,
            method,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    /// Search outward/inward from `r0` around `center`
    pub fn find<Q: SphereQuery + ?Sized>(
        &self,
        query: &Q,
        center: &NVec3,
        r0: f64,
        box_density: f64,
    ) -> Result<VirialResult, HaloError> {
        if !r0.is_finite() || r0 <= 0.0 {
            return Err(HaloError::InvalidParameter(format!("initial radius {r0} must be positive")));
        }
        if !box_density.is_finite() || box_density <= 0.0 {
            return Err(HaloError::InvalidParameter(format!("box density {box_density} must be positive")));
        }

        match self.method {
            SearchMethod::Damped => self.damped(query, center, r0, box_density),
            SearchMethod::Bracketed => self.bracketed(query, center, r0, box_density),
        }
    }

    fn non_convergence(&self, radius: f64, overdensity: f64) -> HaloError {
        HaloError::NonConvergence {
            iterations: self.max_iterations,
            radius,
            overdensity,
        }
    }

    fn damped<Q: SphereQuery + ?Sized>(
        &self,
        query: &Q,
        center: &NVec3,
        r0: f64,
        box_density: f64,
    ) -> Result<VirialResult, HaloError> {
        let target = self.target;
        let mut radius = r0;
        let (mut mass, mut od) = overdensity_at(query, center, radius, box_density);
        let mut iterations = 0;
        debug!("initial overdensity {od:.3} at guess radius {radius:.6}");

        if od > target {
            while od > target {
                if iterations >= self.max_iterations {
                    return Err(self.non_convergence(radius, od));
                }
                let step = if (od - target).abs() < DAMPING_WINDOW { 1.05 } else { 1.1 };
                radius *= step;
                (mass, od) = overdensity_at(query, center, radius, box_density);
                iterations += 1;
                debug!("stepping out, radius {radius:.6} overdensity {od:.3}");
            }
        } else if od < target {
            while od < target {
                if iterations >= self.max_iterations {
                    return Err(self.non_convergence(radius, od));
                }
                let step = if (od - target).abs() < DAMPING_WINDOW { 0.95 } else { 0.9 };
                radius *= step;
                (mass, od) = overdensity_at(query, center, radius, box_density);
                iterations += 1;
                debug!("stepping in, radius {radius:.6} overdensity {od:.3}");
            }
        }

        Ok(VirialResult {
            mass,
            radius,
            overdensity: od,
            iterations,
        })
    }

    fn bracketed<Q: SphereQuery + ?Sized>(
        &self,
        query: &Q,
        center: &NVec3,
        r0: f64,
        box_density: f64,
    ) -> Result<VirialResult, HaloError> {
        let target = self.target;
        let (m0, od0) = overdensity_at(query, center, r0, box_density);
        let mut iterations = 0;

        if od0 == target {
            return Ok(VirialResult {
                mass: m0,
                radius: r0,
                overdensity: od0,
                iterations,
            });
        }

        let mut bracket = if od0 > target {
            // Grow until the sphere is no longer overdense enough
            let (mut lo, mut od_lo) = (r0, od0);
            loop {
                if iterations >= self.max_iterations {
                    return Err(self.non_convergence(lo, od_lo));
                }
                let r = lo * 2.0;
                let (m, od) = overdensity_at(query, center, r, box_density);
                iterations += 1;
                if od <= target {
                    break Bracket { lo, od_lo, hi: r, od_hi: od, mass_hi: m };
                }
                (lo, od_lo) = (r, od);
            }
        } else {
            // Shrink until the sphere is overdense enough
            let (mut hi, mut od_hi, mut mass_hi) = (r0, od0, m0);
            loop {
                if iterations >= self.max_iterations {
                    return Err(self.non_convergence(hi, od_hi));
                }
                let r = hi * 0.5;
                let (m, od) = overdensity_at(query, center, r, box_density);
                iterations += 1;
                if od > target {
                    break Bracket { lo: r, od_lo: od, hi, od_hi, mass_hi };
                }
                (hi, od_hi, mass_hi) = (r, od, m);
            }
        };
        debug!("bracketed r200 in [{:.6}, {:.6}] after {iterations} evaluations", bracket.lo, bracket.hi);

        let mut rescanned = false;
        while bracket.hi - bracket.lo > self.tolerance * bracket.hi {
            if iterations >= self.max_iterations {
                return Err(self.non_convergence(bracket.hi, bracket.od_hi));
            }
            let mid = 0.5 * (bracket.lo + bracket.hi);
            let (m, od) = overdensity_at(query, center, mid, box_density);
            iterations += 1;

            if !rescanned && (od > bracket.od_lo || od < bracket.od_hi) {
                warn!("non-monotonic overdensity in [{:.6}, {:.6}], rescanning", bracket.lo, bracket.hi);
                rescanned = true;
                bracket = self.scan(query, center, bracket, box_density, &mut iterations);
                continue;
            }

            if od > target {
                bracket.lo = mid;
                bracket.od_lo = od;
            } else {
                bracket.hi = mid;
                bracket.od_hi = od;
                bracket.mass_hi = m;
            }
        }

        Ok(VirialResult {
            mass: bracket.mass_hi,
            radius: bracket.hi,
            overdensity: bracket.od_hi,
            iterations,
        })
    }

    /// Walk a bracket outward in equal steps and return the first sub-bracket
    /// that crosses the target. The outer end already sits at or below the
    /// target, so a crossing always exists.
    fn scan<Q: SphereQuery + ?Sized>(
        &self,
        query: &Q,
        center: &NVec3,
        bracket: Bracket,
        box_density: f64,
        iterations: &mut usize,
    ) -> Bracket {
        let step = (bracket.hi - bracket.lo) / SCAN_STEPS as f64;
        let (mut prev, mut od_prev) = (bracket.lo, bracket.od_lo);

        for s in 1..SCAN_STEPS {
            let r = bracket.lo + step * s as f64;
            let (m, od) = overdensity_at(query, center, r, box_density);
            *iterations += 1;
            if od <= self.target {
                return Bracket { lo: prev, od_lo: od_prev, hi: r, od_hi: od, mass_hi: m };
            }
            (prev, od_prev) = (r, od);
        }

        Bracket { lo: prev, od_lo: od_prev, ..bracket }
    }
}
