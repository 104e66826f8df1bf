//! Reference density of the simulation volume
//!
//! The halo finder measures overdensity against the mean matter density of
//! the box, `rho_crit(z = 0) * omega_matter`, expressed in Msun / Mpc^3.

use std::f64::consts::PI;

/// Newtonian constant in cgs (CODATA 2018)
const G_CGS: f64 = 6.6743e-8;
/// One megaparsec in cm, used to turn H0 into s^-1
const MPC_CM: f64 = 3.085_677_581_491_367_3e24;
/// Rounded Mpc and solar mass used for the Msun / Mpc^3 conversion
const MPC_CM_ROUNDED: f64 = 3.086e24;
const MSUN_G: f64 = 1.989e33;

/// Flat background cosmology, only the Hubble constant matters here
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cosmology {
    pub name: &'static str,
    pub h0: f64, // km / s / Mpc
}

/// WMAP nine-year parameters
pub const WMAP9: Cosmology = Cosmology {
    name: "WMAP9",
    h0: 69.32,
};

impl Cosmology {
    pub fn with_hubble(h0: f64) -> Self {
        Self { name: "custom", h0 }
    }

    /// Critical density today in g / cm^3: 3 H0^2 / (8 pi G)
    pub fn critical_density_cgs(&self) -> f64 {
        let h0_per_s = self.h0 * 1.0e5 / MPC_CM;
        3.0 * h0_per_s * h0_per_s / (8.0 * PI * G_CGS)
    }

    /// Mean matter density of the box in Msun / Mpc^3
    pub fn box_density(&self, omega_matter: f64) -> f64 {
        self.critical_density_cgs() * MPC_CM_ROUNDED.powi(3) / MSUN_G * omega_matter
    }
}

/// Box density converted to Msun per cubic physical length unit
pub fn box_density_in_units(box_density_mpc: f64, length_unit_mpc: f64) -> f64 {
    box_density_mpc * length_unit_mpc.powi(3)
}
