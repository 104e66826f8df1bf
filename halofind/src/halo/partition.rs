//! Region partitioner
//!
//! Carves the unit code-space cube into `n^3` axis-aligned sub-boxes that
//! tile it exactly. Boxes are half-open `[lo, hi)` except on the upper face
//! of the domain, so every point of `[0, 1]^3` lands in exactly one box.
//! Indices run with x outermost and z innermost: `i * n^2 + j * n + k`.

use crate::halo::error::HaloError;
use crate::halo::states::NVec3;

/// Upper edge of the code-space domain
pub const DOMAIN_MAX: f64 = 1.0;
/// Most sub-boxes one sweep may be split into (100 per axis)
pub const MAX_SUBREGIONS: usize = 1_000_000;

/// Axis-aligned box in code units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub lo: NVec3,
    pub hi: NVec3,
}

impl BoundingBox {
    pub fn new(lo: NVec3, hi: NVec3) -> Self {
        Self { lo, hi }
    }

    /// The whole unit domain
    pub fn unit() -> Self {
        Self {
            lo: NVec3::zeros(),
            hi: NVec3::repeat(DOMAIN_MAX),
        }
    }

    pub fn volume(&self) -> f64 {
        let d = self.hi - self.lo;
        d.x.max(0.0) * d.y.max(0.0) * d.z.max(0.0)
    }

    /// Half-open containment, closed on faces that touch the domain edge
    pub fn contains(&self, p: &NVec3) -> bool {
        (0..3).all(|axis| {
            let (lo, hi, x) = (self.lo[axis], self.hi[axis], p[axis]);
            x >= lo && (x < hi || (hi >= DOMAIN_MAX && x <= hi))
        })
    }

    /// Volume shared with another box
    pub fn intersection_volume(&self, other: &BoundingBox) -> f64 {
        BoundingBox {
            lo: self.lo.sup(&other.lo),
            hi: self.hi.inf(&other.hi),
        }
        .volume()
    }
}

/// One sub-box and its position in the sweep
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubRegion {
    pub index: usize,
    pub bounds: BoundingBox,
}

/// Number of divisions per axis for a sub-box edge length. The interval has
/// to divide the unit edge a whole number of times, and the resulting
/// `n^3` sub-boxes may not exceed `MAX_SUBREGIONS`.
pub fn divisions_for_interval(interval: f64) -> Result<usize, HaloError> {
    if !interval.is_finite() || interval <= 0.0 || interval > DOMAIN_MAX {
        return Err(HaloError::InvalidInterval(interval));
    }
    let n = (DOMAIN_MAX / interval).round();
    if ((DOMAIN_MAX / interval) - n).abs() > 1.0e-9 * n.max(1.0) {
        return Err(HaloError::InvalidInterval(interval));
    }
    let n = n as usize;
    match n.checked_mul(n).and_then(|n2| n2.checked_mul(n)) {
        Some(count) if count <= MAX_SUBREGIONS => Ok(n),
        _ => Err(HaloError::InvalidInterval(interval)),
    }
}

/// All `n^3` sub-boxes of the unit domain. `divisions` should come from
/// [`divisions_for_interval`].
pub fn subregions(divisions: usize) -> Vec<SubRegion> {
    let n = divisions;
    let edge = |i: usize| i as f64 / n as f64 * DOMAIN_MAX;

    let capacity = n.checked_pow(3).unwrap_or(0).min(MAX_SUBREGIONS);
    let mut regions = Vec::with_capacity(capacity);
    for i in 0..n {
        for j in 0..n {
            for k in 0..n {
                regions.push(SubRegion {
                    index: regions.len(),
                    bounds: BoundingBox::new(
                        NVec3::new(edge(i), edge(j), edge(k)),
                        NVec3::new(edge(i + 1), edge(j + 1), edge(k + 1)),
                    ),
                });
            }
        }
    }
    regions
}
