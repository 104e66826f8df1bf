//! One dense clump in a uniform background, at full projection resolution.

use std::f64::consts::PI;

use approx::assert_relative_eq;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaChaRng;

use halofind::{Dataset, FinderParameters, HaloExtraction, NVec3, Particle, ParticleCatalog, ParticleId, StopReason};

const EXTENT: f64 = 25_000.0;
const CENTER: f64 = 12_500.0;
const N_BACKGROUND: usize = 10_000;
const N_CLUMP: usize = 500;

fn make_particle(id: u64, x: NVec3) -> Particle {
    Particle {
        id: ParticleId(id),
        x,
        code_x: x / EXTENT,
        m: 1.0,
    }
}

fn scenario() -> Vec<Particle> {
    let mut rng = ChaChaRng::seed_from_u64(2024);
    let mut particles = Vec::with_capacity(N_BACKGROUND + N_CLUMP);

    for i in 0..N_BACKGROUND {
        let x = NVec3::new(
            rng.random_range(0.0..EXTENT),
            rng.random_range(0.0..EXTENT),
            rng.random_range(0.0..EXTENT),
        );
        particles.push(make_particle(i as u64, x));
    }

    // r = 100 u^3 piles most of the clump up near its center
    for i in 0..N_CLUMP {
        let u: f64 = rng.random_range(0.0..1.0);
        let r = 100.0 * u * u * u;
        let cos_t: f64 = rng.random_range(-1.0..1.0);
        let sin_t = (1.0 - cos_t * cos_t).sqrt();
        let phi: f64 = rng.random_range(0.0..2.0 * PI);
        let x = NVec3::new(
            CENTER + r * sin_t * phi.cos(),
            CENTER + r * sin_t * phi.sin(),
            CENTER + r * cos_t,
        );
        particles.push(make_particle((N_BACKGROUND + i) as u64, x));
    }
    particles
}

#[test]
fn single_clump_is_found_once() {
    let _ = env_logger::builder().is_test(true).try_init();

    let ds = Dataset::new("clump", 0.3, scenario());
    let mut params = FinderParameters::new(6.5);
    params.length_unit_mpc = 1.0;
    let bin_width = params.projection.bin_width();
    assert_relative_eq!(bin_width, 10.0);

    // overdensity is measured against the mean background density
    let box_density = N_BACKGROUND as f64 / EXTENT.powi(3);
    let catalog = ParticleCatalog::new(ds.particles().to_vec()).unwrap();

    let outcome = HaloExtraction::new(&ds, catalog, &params, box_density).run().unwrap();

    assert_eq!(outcome.stop, StopReason::BelowThreshold);
    assert_eq!(outcome.halos.len(), 1, "halos: {:?}", outcome.halos);

    let halo = &outcome.halos[0];
    let offset = halo.center() - NVec3::repeat(CENTER);
    for axis in 0..3 {
        assert!(offset[axis].abs() <= bin_width, "axis {axis} center offset {} too large", offset[axis]);
    }

    // 500 / (4/3 pi R^3) = 200 * background  =>  R ~ 976
    assert!(halo.r200 > 900.0 && halo.r200 < 1_100.0, "r200 = {}", halo.r200);
    assert!(
        halo.n_particles >= 475 && halo.n_particles <= 525,
        "n_particles = {}",
        halo.n_particles
    );
    assert!(halo.mass >= N_CLUMP as f64);
    assert!(halo.key_particle >= N_BACKGROUND as u64, "seed should come from the clump");

    let clump_claimed = outcome
        .used
        .claimed_by(0)
        .filter(|c| c.particle.id.0 >= N_BACKGROUND as u64)
        .count();
    assert_eq!(clump_claimed, N_CLUMP);
    assert_eq!(outcome.remaining + outcome.used.len(), N_BACKGROUND + N_CLUMP);
}
