//! Configuration types for loading halo-finding runs from YAML.
//!
//! A run file has five sections:
//!
//! - [`DatasetConfig`]     – where the particles live and the cosmology of the box
//! - [`FinderConfig`]      – stopping threshold, sub-box interval, worker count, search policy
//! - [`ProjectionConfig`]  – the projected density grid (optional)
//! - [`RadiusGuessConfig`] – the power-law R200 guess (optional)
//! - [`OutputConfig`]      – where catalogs are written (optional)
//!
//! # YAML format
//!
//! ```yaml
//! dataset:
//!   name: "RD0020"
//!   particles: "RD0020_particles.csv"
//!   omega_matter: 0.3
//!   length_unit_mpc: 0.001   # positions are in kpc
//!
//! finder:
//!   min_sigma: 3.0e9         # stop once the densest particle is below this
//!   interval: 0.5            # 8 sub-boxes
//!   workers: 8
//!   search: "bracketed"      # or "damped"
//!
//! projection:
//!   extent: 25000.0
//!   bin_count: 2500
//!
//! output:
//!   directory: "halos"
//! ```
//!
//! `run.rs` maps this onto the runtime `FinderParameters`, filling in the
//! defaults for anything left out.

use std::io::Read;

use serde::Deserialize;

use crate::halo::error::HaloError;
use crate::halo::virial::SearchMethod;

/// Particle source and background cosmology
#[derive(Deserialize, Debug, Clone)]
pub struct DatasetConfig {
    pub name: String,              // label for logs
    pub particles: String,         // particle table, relative paths resolve against the run file
    pub omega_matter: f64,         // matter density parameter
    pub hubble: Option<f64>,       // km/s/Mpc, WMAP9 when absent
    pub length_unit_mpc: Option<f64>, // one physical position unit in Mpc, kpc when absent
}

/// Extraction loop and sweep settings
#[derive(Deserialize, Debug, Clone)]
pub struct FinderConfig {
    pub min_sigma: f64,                     // stopping threshold on the composite projected density
    pub interval: f64,                      // sub-box edge in code units, must divide 1
    pub workers: usize,                     // worker pool size
    pub overdensity: Option<f64>,           // target mean overdensity, 200 when absent
    pub search: Option<SearchMethod>,       // radius search policy, bracketed when absent
    pub max_search_iterations: Option<usize>, // cap for one radius search
    pub max_halos: Option<usize>,           // per-region iteration budget
}

#[derive(Deserialize, Debug, Clone)]
pub struct ProjectionConfig {
    pub extent: Option<f64>,       // domain edge, physical units
    pub bin_count: Option<usize>,  // bins per axis
}

/// `r = 10^(slope * log10(sigma) + intercept) * scale_mpc`
#[derive(Deserialize, Debug, Clone)]
pub struct RadiusGuessConfig {
    pub slope: f64,
    pub intercept: f64,
    pub scale_mpc: f64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct OutputConfig {
    pub directory: String, // created if missing
}

/// Top-level run configuration loaded from YAML.
#[derive(Deserialize, Debug, Clone)]
pub struct RunConfig {
    pub dataset: DatasetConfig,
    pub finder: FinderConfig,
    pub projection: Option<ProjectionConfig>,
    pub radius_guess: Option<RadiusGuessConfig>,
    pub output: Option<OutputConfig>,
}

impl RunConfig {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, HaloError> {
        Ok(serde_yaml::from_reader(reader)?)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, HaloError> {
        Ok(serde_yaml::from_str(text)?)
    }
}
