//! # Mass octree (3D)
//!
//! An arena-allocated octree over particle positions that answers sphere
//! queries without visiting every particle. The radius search evaluates the
//! enclosed mass many times per halo, so this is the hot path of a run.
//!
//! ## Layout
//!
//! - The root covers a cube enclosing all particles.
//! - Each node is split into 8 octants once it holds more than
//!   `LEAF_CAPACITY` particles. Nodes at `MAX_DEPTH` never split, so
//!   coincident particles cannot recurse forever.
//! - Every node stores the total mass and particle count of its subtree.
//!
//! ## Queries
//!
//! For a sphere `(c, r)` a node is
//! - skipped when its box lies entirely outside the sphere,
//! - taken whole (its aggregate mass, or all of its particles) when its box
//!   lies entirely inside,
//! - otherwise opened: leaves test their particles one by one, internal
//!   nodes recurse.

use crate::halo::query::SphereQuery;
use crate::halo::states::{NVec3, Particle, ParticleId};

const LEAF_CAPACITY: usize = 16;
const MAX_DEPTH: usize = 24;

/// A single octree node covering an axis-aligned cube.
pub struct OctreeNode {
    pub mass: f64,
    pub count: usize,
    pub bbox_min: NVec3,
    pub bbox_max: NVec3,
    pub children: [Option<usize>; 8], // indices into MassOctree::nodes
    pub bucket: Vec<usize>,           // particles held directly by a leaf
}

impl OctreeNode {
    fn empty(bbox_min: NVec3, bbox_max: NVec3) -> Self {
        Self {
            mass: 0.0,
            count: 0,
            bbox_min,
            bbox_max,
            children: [None; 8],
            bucket: Vec::new(),
        }
    }

    fn is_leaf(&self) -> bool {
        self.children.iter().all(|c| c.is_none())
    }
}

/// Octree built once over a particle set. Owns compact copies of the
/// positions, masses and ids it needs.
pub struct MassOctree {
    pub nodes: Vec<OctreeNode>,
    pub root: usize,
    positions: Vec<NVec3>,
    masses: Vec<f64>,
    ids: Vec<ParticleId>,
}

impl MassOctree {
    /// Build the tree:
    /// 1. cubic bounding box around all particles,
    /// 2. insert each particle, splitting full leaves,
    /// 3. aggregate mass and count bottom-up.
    pub fn build(particles: &[Particle]) -> Self {
        let positions: Vec<NVec3> = particles.iter().map(|p| p.x).collect();
        let masses: Vec<f64> = particles.iter().map(|p| p.m).collect();
        let ids: Vec<ParticleId> = particles.iter().map(|p| p.id).collect();

        let (bbox_min, bbox_max) = compute_global_bbox(&positions);

        let mut tree = MassOctree {
            nodes: vec![OctreeNode::empty(bbox_min, bbox_max)],
            root: 0,
            positions,
            masses,
            ids,
        };

        for i in 0..tree.positions.len() {
            tree.insert(tree.root, i, 0);
        }

        tree.compute_mass(tree.root);
        tree
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Total mass held by the tree
    pub fn total_mass(&self) -> f64 {
        self.nodes[self.root].mass
    }

    // helpers ==============================================================================

    fn insert(&mut self, node_idx: usize, p_idx: usize, depth: usize) {
        if self.nodes[node_idx].is_leaf() {
            if self.nodes[node_idx].bucket.len() < LEAF_CAPACITY || depth >= MAX_DEPTH {
                self.nodes[node_idx].bucket.push(p_idx);
                return;
            }

            // Full leaf: push its particles down a level before adding the new one
            let held = std::mem::take(&mut self.nodes[node_idx].bucket);
            for existing in held {
                self.insert_into_child(node_idx, existing, depth);
            }
        }

        self.insert_into_child(node_idx, p_idx, depth);
    }

    fn insert_into_child(&mut self, node_idx: usize, p_idx: usize, depth: usize) {
        let bbox_min = self.nodes[node_idx].bbox_min;
        let bbox_max = self.nodes[node_idx].bbox_max;
        let octant = child_index_for_point(&self.positions[p_idx], &bbox_min, &bbox_max);

        let child_idx = match self.nodes[node_idx].children[octant] {
            Some(idx) => idx,
            None => {
                let (cmin, cmax) = child_bbox(&bbox_min, &bbox_max, octant);
                let new_idx = self.nodes.len();
                self.nodes.push(OctreeNode::empty(cmin, cmax));
                self.nodes[node_idx].children[octant] = Some(new_idx);
                new_idx
            }
        };

        self.insert(child_idx, p_idx, depth + 1);
    }

    fn compute_mass(&mut self, node_idx: usize) {
        let mut mass = 0.0;
        let mut count = self.nodes[node_idx].bucket.len();
        for &p in &self.nodes[node_idx].bucket {
            mass += self.masses[p];
        }

        let children = self.nodes[node_idx].children;
        for child_idx in children.iter().flatten() {
            self.compute_mass(*child_idx);
            mass += self.nodes[*child_idx].mass;
            count += self.nodes[*child_idx].count;
        }

        let node = &mut self.nodes[node_idx];
        node.mass = mass;
        node.count = count;
    }

    fn mass_in_node(&self, node_idx: usize, c: &NVec3, r2: f64) -> f64 {
        let node = &self.nodes[node_idx];
        if node.count == 0 || min_dist2(node, c) > r2 {
            return 0.0;
        }
        if max_dist2(node, c) <= r2 {
            return node.mass;
        }

        let mut mass: f64 = node
            .bucket
            .iter()
            .filter(|&&p| (self.positions[p] - c).norm_squared() <= r2)
            .map(|&p| self.masses[p])
            .sum();

        for child_idx in node.children.iter().flatten() {
            mass += self.mass_in_node(*child_idx, c, r2);
        }
        mass
    }

    fn members_in_node(&self, node_idx: usize, c: &NVec3, r2: f64, out: &mut Vec<ParticleId>) {
        let node = &self.nodes[node_idx];
        if node.count == 0 || min_dist2(node, c) > r2 {
            return;
        }
        if max_dist2(node, c) <= r2 {
            self.collect_all(node_idx, out);
            return;
        }

        for &p in &node.bucket {
            if (self.positions[p] - c).norm_squared() <= r2 {
                out.push(self.ids[p]);
            }
        }
        for child_idx in node.children.iter().flatten() {
            self.members_in_node(*child_idx, c, r2, out);
        }
    }

    fn collect_all(&self, node_idx: usize, out: &mut Vec<ParticleId>) {
        let node = &self.nodes[node_idx];
        out.extend(node.bucket.iter().map(|&p| self.ids[p]));
        for child_idx in node.children.iter().flatten() {
            self.collect_all(*child_idx, out);
        }
    }
}

impl SphereQuery for MassOctree {
    fn enclosed_mass(&self, center: &NVec3, radius: f64) -> f64 {
        if self.is_empty() || radius < 0.0 {
            return 0.0;
        }
        self.mass_in_node(self.root, center, radius * radius)
    }

    fn members(&self, center: &NVec3, radius: f64) -> Vec<ParticleId> {
        let mut out = Vec::new();
        if self.is_empty() || radius < 0.0 {
            return out;
        }
        self.members_in_node(self.root, center, radius * radius, &mut out);
        out
    }
}

// helpers ===========================================================================

/// Cubic bounding box enclosing every position. Expanded to a cube so the
/// octants stay cubes; an empty set gets a degenerate box at the origin.
fn compute_global_bbox(positions: &[NVec3]) -> (NVec3, NVec3) {
    if positions.is_empty() {
        return (NVec3::zeros(), NVec3::zeros());
    }

    let mut min = NVec3::repeat(f64::INFINITY);
    let mut max = NVec3::repeat(f64::NEG_INFINITY);
    for x in positions {
        min = min.inf(x);
        max = max.sup(x);
    }

    let center = (min + max) * 0.5;
    let half = (max - min) * 0.5;
    let max_half = half.x.max(half.y).max(half.z);
    let half = NVec3::repeat(max_half);

    (center - half, center + half)
}

/// Octant of `p` within a box, bit 0 = x, bit 1 = y, bit 2 = z (1 = upper half)
fn child_index_for_point(p: &NVec3, bbox_min: &NVec3, bbox_max: &NVec3) -> usize {
    let center = (bbox_min + bbox_max) * 0.5;
    let mut idx = 0;

    if p.x >= center.x { idx |= 1; }
    if p.y >= center.y { idx |= 2; }
    if p.z >= center.z { idx |= 4; }

    idx
}

/// Box of one octant, same bit layout as `child_index_for_point`
fn child_bbox(parent_min: &NVec3, parent_max: &NVec3, child_idx: usize) -> (NVec3, NVec3) {
    let center = (parent_min + parent_max) * 0.5;

    let mut min = *parent_min;
    let mut max = *parent_max;

    for axis in 0..3 {
        if (child_idx >> axis) & 1 == 0 {
            max[axis] = center[axis];
        } else {
            min[axis] = center[axis];
        }
    }

    (min, max)
}

/// Squared distance from `c` to the nearest point of the node's box
#[inline]
fn min_dist2(node: &OctreeNode, c: &NVec3) -> f64 {
    let mut d2 = 0.0;
    for axis in 0..3 {
        let d = (node.bbox_min[axis] - c[axis]).max(c[axis] - node.bbox_max[axis]).max(0.0);
        d2 += d * d;
    }
    d2
}

/// Squared distance from `c` to the farthest corner of the node's box
#[inline]
fn max_dist2(node: &OctreeNode, c: &NVec3) -> f64 {
    let mut d2 = 0.0;
    for axis in 0..3 {
        let d = (c[axis] - node.bbox_min[axis]).abs().max((c[axis] - node.bbox_max[axis]).abs());
        d2 += d * d;
    }
    d2
}
