//! Projected density estimator
//!
//! Bins the catalog's mass into three 2D histograms over a fixed square
//! domain `[0, extent)^2`, one per axis pair:
//!
//! - XY map -> density along z (`ProjectedDensity::z`)
//! - XZ map -> density along y
//! - YZ map -> density along x
//!
//! Each particle reads back the value of the bin it falls in (nearest bin,
//! no interpolation) and its composite score is the sum of the three. After
//! the pass the catalog is re-ranked so the highest composite score comes
//! first. Particles outside the domain miss the grid and get zero.

use log::debug;

use crate::halo::states::{NVec3, ParticleCatalog, ParticleHandle, ProjectedDensity};

/// Most bins a single projection map may hold (8192 x 8192)
pub const MAX_MAP_BINS: usize = 1 << 26;

/// Fixed binning of the projection domain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionGrid {
    pub extent: f64,      // domain edge length, physical units
    pub bin_count: usize, // bins per axis
}

impl Default for ProjectionGrid {
    fn default() -> Self {
        Self {
            extent: 25_000.0,
            bin_count: 2_500,
        }
    }
}

impl ProjectionGrid {
    /// Bins per map, `None` when `bin_count^2` overflows
    pub fn map_bins(&self) -> Option<usize> {
        self.bin_count.checked_mul(self.bin_count)
    }

    pub fn bin_width(&self) -> f64 {
        self.extent / self.bin_count as f64
    }

    /// Bin index of one coordinate, `None` outside `[0, extent)`
    #[inline]
    pub fn bin_of(&self, coord: f64) -> Option<usize> {
        let i = (coord / self.bin_width()).floor();
        if i >= 0.0 && i < self.bin_count as f64 {
            Some(i as usize)
        } else {
            None
        }
    }
}

/// Mass-summed 2D histogram, row-major (`row * n + col`)
#[derive(Debug, Clone)]
pub struct Histogram2D {
    pub mass: Vec<f64>,
    pub n: usize,
}

impl Histogram2D {
    pub fn zeros(n: usize) -> Self {
        Self {
            mass: vec![0.0; n * n],
            n,
        }
    }

    #[inline]
    pub fn index(&self, col: usize, row: usize) -> usize {
        row * self.n + col
    }

    /// Bin value; empty bins are zero
    pub fn get(&self, col: usize, row: usize) -> Option<f64> {
        if col < self.n && row < self.n {
            Some(self.mass[self.index(col, row)])
        } else {
            None
        }
    }

    pub fn total(&self) -> f64 {
        self.mass.iter().sum()
    }
}

/// The three projections from one density pass
#[derive(Debug, Clone)]
pub struct ProjectionMaps {
    pub xy: Histogram2D,
    pub xz: Histogram2D,
    pub yz: Histogram2D,
}

#[derive(Debug, Clone, Copy)]
enum AxisPair {
    Xy,
    Xz,
    Yz,
}

impl AxisPair {
    #[inline]
    fn coords(self, x: &NVec3) -> (f64, f64) {
        match self {
            AxisPair::Xy => (x.x, x.y),
            AxisPair::Xz => (x.x, x.z),
            AxisPair::Yz => (x.y, x.z),
        }
    }
}

/// Sum particle mass per bin for one axis pair
fn aggregate(catalog: &ParticleCatalog, grid: &ProjectionGrid, pair: AxisPair) -> Histogram2D {
    let mut hist = Histogram2D::zeros(grid.bin_count);
    for (_, p) in catalog.iter() {
        let (a, b) = pair.coords(&p.x);
        if let (Some(col), Some(row)) = (grid.bin_of(a), grid.bin_of(b)) {
            let idx = hist.index(col, row);
            hist.mass[idx] += p.m;
        }
    }
    hist
}

/// Look up the bin a position falls in, zero outside the grid
#[inline]
fn lookup(hist: &Histogram2D, grid: &ProjectionGrid, pair: AxisPair, x: &NVec3) -> f64 {
    let (a, b) = pair.coords(x);
    match (grid.bin_of(a), grid.bin_of(b)) {
        (Some(col), Some(row)) => hist.mass[hist.index(col, row)],
        _ => 0.0,
    }
}

/// Recompute every live particle's projected densities, store them in the
/// catalog and re-rank it. Returns the three maps used.
pub fn assign_densities(catalog: &mut ParticleCatalog, grid: &ProjectionGrid) -> ProjectionMaps {
    let xy = aggregate(catalog, grid, AxisPair::Xy);
    let xz = aggregate(catalog, grid, AxisPair::Xz);
    let yz = aggregate(catalog, grid, AxisPair::Yz);

    let densities: Vec<(ParticleHandle, ProjectedDensity)> = catalog
        .iter()
        .map(|(h, p)| {
            let d = ProjectedDensity {
                x: lookup(&yz, grid, AxisPair::Yz, &p.x),
                y: lookup(&xz, grid, AxisPair::Xz, &p.x),
                z: lookup(&xy, grid, AxisPair::Xy, &p.x),
            };
            (h, d)
        })
        .collect();

    catalog.set_densities(densities);

    debug!(
        "density pass over {} particles, projected mass {:.4e}",
        catalog.len(),
        xy.total()
    );

    ProjectionMaps { xy, xz, yz }
}
