//! Build a runnable halo-finding sweep from configuration
//!
//! Takes a `RunConfig` (YAML-facing) and produces a `HaloRun` holding:
//! - finder parameters (`FinderParameters`) with defaults filled in,
//! - the background cosmology,
//! - sweep settings (interval, workers),
//! - resolved input and output paths
//!
//! Validation happens here so a bad run file fails before any particle is
//! loaded.

use std::path::{Path, PathBuf};

use log::info;

use crate::configuration::config::RunConfig;
use crate::halo::cosmology::{Cosmology, WMAP9};
use crate::halo::dataset::Dataset;
use crate::halo::density::{ProjectionGrid, MAX_MAP_BINS};
use crate::halo::driver::{drive_halo_finding, RegionCatalog};
use crate::halo::error::HaloError;
use crate::halo::params::{FinderParameters, RadiusGuess};
use crate::halo::partition::divisions_for_interval;
use crate::io::particles::load_particles;
use crate::io::sink::{CsvSink, NullSink};

#[derive(Debug, Clone)]
pub struct HaloRun {
    pub dataset_name: String,
    pub particles: PathBuf,
    pub omega_matter: f64,
    pub cosmology: Cosmology,
    pub parameters: FinderParameters,
    pub interval: f64,
    pub workers: usize,
    pub output: Option<PathBuf>,
}

impl HaloRun {
    /// Map a run file onto runtime settings. Relative paths resolve against
    /// `base_dir`.
    pub fn build_run(cfg: RunConfig, base_dir: &Path) -> Result<Self, HaloError> {
        let d_cfg = cfg.dataset;
        let f_cfg = cfg.finder;

        let defaults = FinderParameters::new(f_cfg.min_sigma);

        let projection = match cfg.projection {
            Some(p) => ProjectionGrid {
                extent: p.extent.unwrap_or(defaults.projection.extent),
                bin_count: p.bin_count.unwrap_or(defaults.projection.bin_count),
            },
            None => defaults.projection,
        };

        let radius_guess = match cfg.radius_guess {
            Some(g) => RadiusGuess {
                slope: g.slope,
                intercept: g.intercept,
                scale_mpc: g.scale_mpc,
            },
            None => defaults.radius_guess,
        };

        let parameters = FinderParameters {
            min_sigma: f_cfg.min_sigma,
            overdensity: f_cfg.overdensity.unwrap_or(defaults.overdensity),
            search: f_cfg.search.unwrap_or(defaults.search),
            max_search_iterations: f_cfg.max_search_iterations.unwrap_or(defaults.max_search_iterations),
            max_halos: f_cfg.max_halos.unwrap_or(defaults.max_halos),
            length_unit_mpc: d_cfg.length_unit_mpc.unwrap_or(defaults.length_unit_mpc),
            radius_guess,
            projection,
        };

        let cosmology = d_cfg.hubble.map(Cosmology::with_hubble).unwrap_or(WMAP9);

        let run = Self {
            dataset_name: d_cfg.name,
            particles: base_dir.join(d_cfg.particles),
            omega_matter: d_cfg.omega_matter,
            cosmology,
            parameters,
            interval: f_cfg.interval,
            workers: f_cfg.workers,
            output: cfg.output.map(|o| base_dir.join(o.directory)),
        };
        run.validate()?;
        Ok(run)
    }

    fn validate(&self) -> Result<(), HaloError> {
        let p = &self.parameters;
        divisions_for_interval(self.interval)?;

        let positive = [
            ("omega_matter", self.omega_matter),
            ("hubble", self.cosmology.h0),
            ("overdensity", p.overdensity),
            ("length_unit_mpc", p.length_unit_mpc),
            ("projection extent", p.projection.extent),
            ("radius guess scale", p.radius_guess.scale_mpc),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(HaloError::InvalidParameter(format!("{name} must be positive, got {value}")));
            }
        }
        match p.projection.map_bins() {
            Some(bins) if bins > 0 && bins <= MAX_MAP_BINS => {}
            _ => {
                return Err(HaloError::InvalidParameter(format!(
                    "projection bin_count must be between 1 and {}, got {}",
                    (MAX_MAP_BINS as f64).sqrt() as usize,
                    p.projection.bin_count
                )))
            }
        }
        if self.workers == 0 {
            return Err(HaloError::InvalidParameter("worker count must be at least 1".into()));
        }
        if p.max_search_iterations == 0 {
            return Err(HaloError::InvalidParameter("max_search_iterations must be at least 1".into()));
        }
        Ok(())
    }

    /// Load the particles and sweep every sub-box
    pub fn execute(&self) -> Result<Vec<RegionCatalog>, HaloError> {
        let particles = load_particles(&self.particles)?;
        let dataset = Dataset::new(self.dataset_name.clone(), self.omega_matter, particles);
        info!(
            "dataset {} with {} particles, cosmology {} (H0 = {})",
            dataset.name,
            dataset.len(),
            self.cosmology.name,
            self.cosmology.h0
        );

        match &self.output {
            Some(dir) => {
                let sink = CsvSink::new(dir)?;
                drive_halo_finding(&dataset, &self.parameters, &self.cosmology, self.interval, self.workers, &sink)
            }
            None => drive_halo_finding(&dataset, &self.parameters, &self.cosmology, self.interval, self.workers, &NullSink),
        }
    }
}
