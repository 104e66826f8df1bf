//! Parallel driver
//!
//! Splits the unit domain into sub-boxes and runs one extraction loop per
//! sub-box on a fixed-size worker pool. Workers share only read-only state
//! (the dataset and the parameters); each owns its catalog. A sub-box that
//! fails is reported with an empty halo list and never stops its siblings.
//! Halos whose spheres straddle a sub-box face are not merged.

use log::{info, warn};
use rayon::prelude::*;

use crate::halo::cosmology::{box_density_in_units, Cosmology};
use crate::halo::dataset::Dataset;
use crate::halo::error::HaloError;
use crate::halo::extraction::{ExtractionOutcome, HaloExtraction, StopReason};
use crate::halo::params::FinderParameters;
use crate::halo::partition::{divisions_for_interval, subregions, BoundingBox, SubRegion};
use crate::halo::states::{HaloRecord, ParticleCatalog};
use crate::io::sink::CatalogSink;

#[derive(Debug, Clone, PartialEq)]
pub enum RegionStatus {
    Completed(StopReason),
    Failed(String),
}

/// Result of one sub-box, in sub-box index order within a sweep
#[derive(Debug, Clone)]
pub struct RegionCatalog {
    pub index: usize,
    pub bounds: BoundingBox,
    pub halos: Vec<HaloRecord>,
    pub status: RegionStatus,
}

impl RegionCatalog {
    pub fn is_failed(&self) -> bool {
        matches!(self.status, RegionStatus::Failed(_))
    }
}

/// Run the extraction loop over one sub-box and persist its results.
/// `box_density_mpc` is in Msun / Mpc^3.
pub fn find_halos_in_region<S: CatalogSink + ?Sized>(
    dataset: &Dataset,
    params: &FinderParameters,
    box_density_mpc: f64,
    region: &SubRegion,
    sink: &S,
) -> Result<ExtractionOutcome, HaloError> {
    let particles = dataset.region(&region.bounds);
    info!("analyzing region {} with {} particles", region.index, particles.len());

    let catalog = ParticleCatalog::new(particles)?;
    let box_density = box_density_in_units(box_density_mpc, params.length_unit_mpc);
    let outcome = HaloExtraction::new(dataset, catalog, params, box_density).run()?;

    sink.write_region(region.index, &outcome.halos, &outcome.used)?;
    info!(
        "region {} done: {} halos, {} particles claimed, {} left ({:?})",
        region.index,
        outcome.halos.len(),
        outcome.used.len(),
        outcome.remaining,
        outcome.stop
    );
    Ok(outcome)
}

/// Sweep the whole domain with `workers` threads. Blocks until every
/// sub-box has finished.
pub fn drive_halo_finding<S: CatalogSink + ?Sized>(
    dataset: &Dataset,
    params: &FinderParameters,
    cosmology: &Cosmology,
    interval: f64,
    workers: usize,
    sink: &S,
) -> Result<Vec<RegionCatalog>, HaloError> {
    if workers == 0 {
        return Err(HaloError::InvalidParameter("worker count must be at least 1".into()));
    }
    let regions = subregions(divisions_for_interval(interval)?);
    let box_density_mpc = dataset.box_density(cosmology);
    info!(
        "halo finding on {} over {} regions with {workers} workers, box density {box_density_mpc:.6e} Msun/Mpc^3",
        dataset.name,
        regions.len()
    );

    let pool = rayon::ThreadPoolBuilder::new().num_threads(workers).build()?;
    let catalogs = pool.install(|| {
        regions
            .par_iter()
            .map(|region| match find_halos_in_region(dataset, params, box_density_mpc, region, sink) {
                Ok(outcome) => RegionCatalog {
                    index: region.index,
                    bounds: region.bounds,
                    halos: outcome.halos,
                    status: RegionStatus::Completed(outcome.stop),
                },
                Err(e) => {
                    warn!("region {} failed: {e}", region.index);
                    RegionCatalog {
                        index: region.index,
                        bounds: region.bounds,
                        halos: Vec::new(),
                        status: RegionStatus::Failed(e.to_string()),
                    }
                }
            })
            .collect::<Vec<_>>()
    });

    let failed = catalogs.iter().filter(|c| c.is_failed()).count();
    let found: usize = catalogs.iter().map(|c| c.halos.len()).sum();
    info!("sweep finished: {found} halos, {failed} failed regions");
    Ok(catalogs)
}
