pub mod states;
pub mod params;
pub mod error;
pub mod cosmology;
pub mod density;
pub mod query;
pub mod octree;
pub mod dataset;
pub mod virial;
pub mod extraction;
pub mod partition;
pub mod driver;
pub mod run;
