// SPDX-License-Identifier: AGPL-3.0-only

//! Integration tests: FFT, phase, smearing and correlator operators composed
//! through the operator algebra.

use std::f64::consts::PI;
use std::sync::Arc;

use lattice_fields::lattice::correlator::{correlate, slice_sum};
use lattice_fields::lattice::fft::fft;
use lattice_fields::lattice::field::{Lattice, ObjectType};
use lattice_fields::lattice::grid::{Grid, GridSpec, Precision};
use lattice_fields::lattice::phase::{exp_ixp, ExpIxp};
use lattice_fields::lattice::smearing::{
    boosted_gaussian_kernel, masked_gaussian_kernel, SmearingKernel,
};
use lattice_fields::tolerances;
use num_complex::Complex64;

fn grid() -> Arc<Grid> {
    Arc::new(Grid::new(&[4, 4, 4, 4]).unwrap())
}

fn max_abs_diff(a: &Lattice, b: &Lattice) -> f64 {
    a.data()
        .iter()
        .zip(b.data())
        .map(|(x, y)| (x - y).norm())
        .fold(0.0, f64::max)
}

#[test]
fn plane_wave_phase_shifts_momentum() {
    let g = grid();
    let mut seed = 4u64;
    let f = Lattice::random(&g, ObjectType::WilsonSpinor, &mut seed);
    let n = 1;
    let phase = exp_ixp(&[2.0 * PI * f64::from(n) / 4.0], None);
    let transform = fft(None);
    let lhs = (&transform * &phase).apply(&f);
    let rhs = transform.apply(&f).cshift(0, -i64::from(n));
    assert!(max_abs_diff(&lhs, &rhs) < tolerances::FFT_ROUND_TRIP_ABS);
}

#[test]
fn composed_inverse_undoes_composition() {
    let g = grid();
    let mut seed = 8u64;
    let f = Lattice::random(&g, ObjectType::ColorMatrix, &mut seed);
    let op = &fft(Some([1, 3].as_slice())) * &exp_ixp(&[0.3, -0.7, 1.1], Some(&[2, 2, 2, 2][..]));
    assert!(op.is_invertible());
    let back = op.inv().apply(&op.apply(&f));
    assert!(max_abs_diff(&back, &f) < tolerances::FFT_ROUND_TRIP_ABS);
}

#[test]
fn smearing_operator_adjoint_is_true_adjoint() {
    let g = grid();
    let kernel = SmearingKernel::boosted_gaussian(&g, 1.3, [0.4, 0.0, -0.2]);
    let op = kernel.operator();
    let mut seed = 15u64;
    let a = Lattice::random(&g, ObjectType::WilsonSpinor, &mut seed);
    let b = Lattice::random(&g, ObjectType::WilsonSpinor, &mut seed);
    let lhs = a.inner_product(&op.apply(&b));
    let rhs = op.adj().apply(&a).inner_product(&b);
    assert!((lhs - rhs).norm() < tolerances::EXACT_F64 * lhs.norm().max(1.0));
}

#[test]
fn smearing_is_translation_covariant() {
    let g = grid();
    let kernel = SmearingKernel::masked_gaussian(&g, 0.9);
    let mut seed = 21u64;
    let f = Lattice::random(&g, ObjectType::Complex, &mut seed);
    let mut smeared = f.like();
    kernel.convolve(&mut smeared, &f);
    let shifted = f.cshift(2, 1);
    let mut smeared_shifted = f.like();
    kernel.convolve(&mut smeared_shifted, &shifted);
    assert!(max_abs_diff(&smeared_shifted, &smeared.cshift(2, 1)) < tolerances::EXACT_F64);
}

#[test]
fn point_source_smears_to_masked_kernel() {
    let g = grid();
    let mut delta = Lattice::complex(&g);
    delta.set(&[0, 0, 0, 2], &[Complex64::new(1.0, 0.0)]);
    let kernel = SmearingKernel::masked_gaussian(&g, 1.0);
    let mut out = delta.like();
    kernel.convolve(&mut out, &delta);
    let expected = masked_gaussian_kernel(&g, 1.0);
    for i in 0..out.sites() {
        let x = out.site_coordinate(i);
        let want = if x[3] == 2 {
            expected.site(i)[0]
        } else {
            Complex64::new(0.0, 0.0)
        };
        assert!((out.site(i)[0] - want).norm() < tolerances::SMEARING_CONVOLUTION_ABS);
    }
}

#[test]
fn single_precision_kernel_is_f32_exact() {
    let g = Arc::new(
        GridSpec::new(&[4, 4, 4, 2])
            .with_precision(Precision::Single)
            .build()
            .unwrap(),
    );
    let k = boosted_gaussian_kernel(&g, 1.7, [0.3, 0.1, 0.0]);
    for z in k.data() {
        assert_eq!(f64::from(z.re as f32), z.re);
        assert_eq!(f64::from(z.im as f32), z.im);
    }
    let d = Arc::new(Grid::new(&[4, 4, 4, 2]).unwrap());
    let kd = boosted_gaussian_kernel(&d, 1.7, [0.3, 0.1, 0.0]);
    for (a, b) in k.data().iter().zip(kd.data()) {
        assert!((a - b).norm() < tolerances::SINGLE_PRECISION_ROUNDING);
    }
}

#[test]
fn shared_phase_cache_across_operator_views() {
    let g = grid();
    let phase = Arc::new(ExpIxp::new(&[0.25, 0.5], None));
    let op = phase.operator();
    let f = Lattice::complex(&g);
    let _ = op.apply(&f);
    let _ = op.inv().adj().apply(&f);
    assert_eq!(phase.cached(), 1);
    let _ = op.inv().apply(&f);
    assert_eq!(phase.cached(), 2);
}

#[test]
fn autocorrelation_at_zero_is_mean_square() {
    let g = grid();
    let mut seed = 77u64;
    let a = Lattice::random(&g, ObjectType::Complex, &mut seed);
    let c = correlate(&a, &a.adjoint(), None);
    let c0 = c.get(&[0, 0, 0, 0])[0];
    let expected = a.norm2() / g.global_volume() as f64;
    assert!((c0 - expected).norm() < tolerances::EXACT_F64);
}

#[test]
fn spatial_correlator_time_slices() {
    let g = grid();
    let mut a = Lattice::complex(&g);
    for i in 0..a.sites() {
        let t = a.site_coordinate(i)[3];
        a.site_mut(i)[0] = Complex64::new((t + 1) as f64, 0.0);
    }
    let c = correlate(&a, &a, Some([0, 1, 2].as_slice()));
    let slices = slice_sum(&c, 3);
    // Constant in space: c(x, t) = (t+1)² for every x, summed over 64 sites.
    for (t, s) in slices.iter().enumerate() {
        let v = (t + 1) as f64;
        assert!((s - Complex64::new(64.0 * v * v, 0.0)).norm() < tolerances::EXACT_F64);
    }
}
