pub mod halo;
pub mod configuration;
pub mod io;
pub mod benchmark;

pub use halo::states::{NVec3, Particle, ParticleId, ParticleHandle, ParticleCatalog, ProjectedDensity, UsedParticles, ClaimedParticle, HaloRecord};
pub use halo::error::{HaloError, ErrorKind};
pub use halo::params::{FinderParameters, RadiusGuess};
pub use halo::cosmology::{Cosmology, WMAP9};
pub use halo::density::{assign_densities, ProjectionGrid, ProjectionMaps, Histogram2D};
pub use halo::query::{SphereQuery, DirectSphereQuery};
pub use halo::octree::MassOctree;
pub use halo::dataset::Dataset;
pub use halo::virial::{radius_guess, SearchMethod, VirialSearch, VirialResult};
pub use halo::extraction::{HaloExtraction, LoopState, StopReason, ExtractionOutcome};
pub use halo::partition::{subregions, divisions_for_interval, BoundingBox, SubRegion};
pub use halo::driver::{find_halos_in_region, drive_halo_finding, RegionCatalog, RegionStatus};
pub use halo::run::HaloRun;

pub use configuration::config::{RunConfig, DatasetConfig, FinderConfig, ProjectionConfig, RadiusGuessConfig, OutputConfig};

pub use io::particles::{load_particles, read_particles, write_particles};
pub use io::sink::{CatalogSink, CsvSink, NullSink, read_halo_catalog};

pub use benchmark::benchmark::{bench_sphere_query, bench_density};
