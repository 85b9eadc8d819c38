// SPDX-License-Identifier: AGPL-3.0-only

//! Centralized constants for lattice field modules.
//!
//! Collects the complex unit constants, colour/spin counts, LCG PRNG
//! parameters, and numerical guards used across `su3.rs`, `gauge.rs`,
//! `wilson.rs`, `smearing.rs`, and `cg.rs`.

use num_complex::Complex64;

/// Number of colors in QCD (SU(3)).
pub const N_COLORS: usize = 3;

/// Number of Dirac spin components.
pub const N_SPINS: usize = 4;

/// Number of spacetime dimensions of the Wilson operator.
pub const N_DIM: usize = 4;

/// Lattice dimensions treated as spatial by smearing kernels.
pub const SPATIAL_DIMS: [usize; 3] = [0, 1, 2];

/// Complex zero.
pub const C_ZERO: Complex64 = Complex64::new(0.0, 0.0);

/// Complex one.
pub const C_ONE: Complex64 = Complex64::new(1.0, 0.0);

/// Imaginary unit.
pub const C_I: Complex64 = Complex64::new(0.0, 1.0);

/// LCG multiplier (Knuth MMIX).
///
/// Used for deterministic pseudo-random gauge links and test fields.
pub const LCG_MULTIPLIER: u64 = 6_364_136_223_846_793_005;

/// LCG increment (Knuth MMIX).
pub const LCG_INCREMENT: u64 = 1_442_695_040_888_963_407;

/// Mantissa divisor for LCG → uniform [0, 1) conversion (53 bits).
pub const LCG_53_DIVISOR: f64 = (1u64 << 53) as f64;

/// Division guard for CG and reunitarization.
///
/// Prevents division by zero in vector norms and Gram-Schmidt
/// orthonormalization. Well below any physical lattice scale.
pub const LATTICE_DIVISION_GUARD: f64 = 1e-30;

/// Hot-start perturbation scale for SU(3) link matrices.
pub const HOT_START_EPSILON: f64 = 1.5;

/// Advance the LCG state by one step.
#[inline]
pub fn lcg_step(seed: &mut u64) {
    *seed = seed
        .wrapping_mul(LCG_MULTIPLIER)
        .wrapping_add(LCG_INCREMENT);
}

/// Generate a uniform f64 in [0, 1) from 53 bits of LCG state.
#[inline]
pub fn lcg_uniform_f64(seed: &mut u64) -> f64 {
    lcg_step(seed);
    (*seed >> 11) as f64 / LCG_53_DIVISOR
}

/// Box-Muller Gaussian deviate N(0, 1) from two LCG draws.
///
/// The `ln` argument is clamped to `LATTICE_DIVISION_GUARD` to avoid ln(0).
#[inline]
pub fn lcg_gaussian(seed: &mut u64) -> f64 {
    let u1 = lcg_uniform_f64(seed);
    let u2 = lcg_uniform_f64(seed);
    (-2.0 * u1.max(LATTICE_DIVISION_GUARD).ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Complex deviate with independent uniform parts in [-0.5, 0.5).
#[inline]
pub fn lcg_complex(seed: &mut u64) -> Complex64 {
    let re = lcg_uniform_f64(seed) - 0.5;
    let im = lcg_uniform_f64(seed) - 0.5;
    Complex64::new(re, im)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lcg_step_deterministic() {
        let mut a = 42u64;
        let mut b = 42u64;
        lcg_step(&mut a);
        lcg_step(&mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn lcg_uniform_in_range() {
        let mut seed = 12345u64;
        for _ in 0..1000 {
            let v = lcg_uniform_f64(&mut seed);
            assert!((0.0..1.0).contains(&v), "out of range: {v}");
        }
    }

    #[test]
    fn lcg_complex_parts_centered() {
        let mut seed = 7u64;
        for _ in 0..1000 {
            let z = lcg_complex(&mut seed);
            assert!((-0.5..0.5).contains(&z.re));
            assert!((-0.5..0.5).contains(&z.im));
        }
    }

    #[test]
    fn complex_units() {
        assert_eq!(C_I * C_I, -C_ONE);
        assert_eq!(C_ONE + C_ZERO, C_ONE);
    }

    #[test]
    #[allow(clippy::assertions_on_constants)]
    fn spatial_dims_inside_spacetime() {
        assert!(SPATIAL_DIMS.iter().all(|&d| d < N_DIM));
        assert_eq!(N_COLORS * N_SPINS, 12);
    }

    #[test]
    fn lcg_gaussian_mean_near_zero() {
        let mut seed = 42u64;
        let n = 10_000;
        let sum: f64 = (0..n).map(|_| lcg_gaussian(&mut seed)).sum();
        let mean = sum / f64::from(n);
        assert!(mean.abs() < 0.1, "mean should be near 0, got {mean}");
    }
}
