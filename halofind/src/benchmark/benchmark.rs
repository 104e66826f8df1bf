use std::time::Instant;

use crate::halo::density::{assign_densities, ProjectionGrid};
use crate::halo::octree::MassOctree;
use crate::halo::query::{DirectSphereQuery, SphereQuery};
use crate::halo::states::{NVec3, Particle, ParticleCatalog, ParticleId};

/// Helper to build a deterministic particle box of size `n`
fn make_particles(n: usize, extent: f64) -> Vec<Particle> {
    let half = 0.5 * extent;
    (0..n)
        .map(|i| {
            let i_f = i as f64;
            // deterministic positions
            let x = NVec3::new(
                half + (i_f * 0.37).sin() * 0.45 * extent,
                half + (i_f * 0.13).cos() * 0.45 * extent,
                half + (i_f * 0.07).sin() * 0.45 * extent,
            );
            Particle {
                id: ParticleId(i as u64),
                x,
                code_x: x / extent,
                m: 1.0,
            }
        })
        .collect()
}

/// Time direct vs octree sphere queries for a range of n
/// Paste output directly into a spreadsheet to graph
pub fn bench_sphere_query() {
    let extent = 25_000.0;
    let ns = [1_000, 4_000, 16_000, 64_000, 256_000];
    let queries = 200;

    println!("N,direct_ms,octree_build_ms,octree_ms");

    for n in ns {
        let particles = make_particles(n, extent);
        let direct = DirectSphereQuery::new(&particles);

        let t0 = Instant::now();
        let tree = MassOctree::build(&particles);
        let build_ms = t0.elapsed().as_secs_f64() * 1000.0;

        let centers: Vec<NVec3> = particles.iter().step_by((n / queries).max(1)).map(|p| p.x).collect();
        let radius = 0.02 * extent;

        let t1 = Instant::now();
        let mut direct_mass = 0.0;
        for c in &centers {
            direct_mass += direct.enclosed_mass(c, radius);
        }
        let direct_ms = t1.elapsed().as_secs_f64() * 1000.0 / centers.len() as f64;

        let t2 = Instant::now();
        let mut tree_mass = 0.0;
        for c in &centers {
            tree_mass += tree.enclosed_mass(c, radius);
        }
        let tree_ms = t2.elapsed().as_secs_f64() * 1000.0 / centers.len() as f64;

        // both should see the same particles
        debug_assert!((direct_mass - tree_mass).abs() <= 1e-9 * direct_mass.max(1.0));

        println!("{},{:.6},{:.6},{:.6}", n, direct_ms, build_ms, tree_ms);
    }
}

/// Time one projected density pass for a range of n
pub fn bench_density() {
    let grid = ProjectionGrid::default();
    let ns = [10_000, 40_000, 160_000, 640_000];

    println!("N,density_ms");

    for n in ns {
        let particles = make_particles(n, grid.extent);
        let Ok(mut catalog) = ParticleCatalog::new(particles) else {
            continue;
        };

        let t0 = Instant::now();
        assign_densities(&mut catalog, &grid);
        let ms = t0.elapsed().as_secs_f64() * 1000.0;

        println!("{},{:.6}", n, ms);
    }
}
