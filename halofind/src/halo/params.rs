//! Numerical parameters for one halo-finding run
//!
//! `FinderParameters` holds runtime settings:
//! - stopping threshold and target overdensity,
//! - radius-search policy and iteration caps,
//! - the power-law radius guess and the physical length unit,
//! - the projection grid used for seed ranking

use crate::halo::density::ProjectionGrid;
use crate::halo::virial::SearchMethod;

/// Initial R200 guess from a seed's composite projected density:
/// `r = 10^(slope * log10(sigma) + intercept) * scale_mpc` in Mpc
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusGuess {
    pub slope: f64,
    pub intercept: f64,
    pub scale_mpc: f64,
}

impl Default for RadiusGuess {
    fn default() -> Self {
        Self {
            slope: 0.4,
            intercept: -2.0,
            scale_mpc: 1.0e-3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FinderParameters {
    pub min_sigma: f64,              // stop once the peak composite score is at or below this
    pub overdensity: f64,            // target mean overdensity, 200
    pub search: SearchMethod,        // damped step or bracketed bisection
    pub max_search_iterations: usize, // cap for a single radius search
    pub max_halos: usize,            // per-region iteration budget
    pub length_unit_mpc: f64,        // one physical position unit in Mpc
    pub radius_guess: RadiusGuess,
    pub projection: ProjectionGrid,
}

impl FinderParameters {
    /// Parameters with the defaults used by the FOGGIE boxes
    pub fn new(min_sigma: f64) -> Self {
        Self {
            min_sigma,
            overdensity: 200.0,
            search: SearchMethod::Bracketed,
            max_search_iterations: 500,
            max_halos: usize::MAX,
            length_unit_mpc: 1.0e-3,
            radius_guess: RadiusGuess::default(),
            projection: ProjectionGrid::default(),
        }
    }
}
