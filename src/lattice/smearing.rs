// SPDX-License-Identifier: AGPL-3.0-only

//! Gaussian convolution kernels for quark source smearing.
//!
//! Kernels are evaluated on the minimal-image spatial displacement r of each
//! site from the origin (dimensions 0, 1, 2; further dimensions are
//! spectators):
//!
//! | Kernel | K(r) |
//! |--------|------|
//! | boosted Gaussian (1S) | exp(−\|r\|²/(2w²)) · exp(−i k·r) |
//! | masked Gaussian | 0 where any \|r_i\| ≥ L_i/2, Gaussian elsewhere |
//! | polynomial Gaussian (2S) | (1 − b\|r\|²) · exp(−\|r\|²/(2w²)) |
//!
//! w = 0 is the Kronecker-delta limit. A [`SmearingKernel`] stores the
//! momentum-space kernel K̂(p) = Σ_r K(r) exp(−i p·r), i.e. V_s times the
//! forward FFT, so that
//!
//!   B(K̂ · F(ψ))(x) = Σ_y K(y) ψ(x − y)
//!
//! is the real-space convolution (convolution theorem).
//!
//! # References
//!
//! - Güsken et al., PLB 227, 266 (1989): Gaussian source smearing
//! - Alexandrou et al., NPB 414, 815 (1994): wave-function smeared sources

use std::sync::Arc;

use num_complex::Complex64;
use rayon::prelude::*;
use tracing::instrument;

use super::constants::{C_ONE, C_ZERO, SPATIAL_DIMS};
use super::coordinates::{coordinates, minimal_image, Order};
use super::fft::{fft_field, FftSign};
use super::field::Lattice;
use super::grid::{Checkerboard, Grid};
use super::operator::MatrixOperator;

/// Minimal-image spatial displacement from the origin.
type Displacement = [i64; 3];

fn r2(r: &Displacement) -> f64 {
    r.iter().map(|&v| (v * v) as f64).sum()
}

/// exp(−|r|²/(2w²)); the Kronecker delta for w = 0.
fn gauss_envelope(r: &Displacement, width: f64) -> f64 {
    if width == 0.0 {
        if r2(r) == 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        (-r2(r) / (2.0 * width * width)).exp()
    }
}

fn boosted_gauss(r: &Displacement, width: f64, boost: &[f64; 3]) -> Complex64 {
    let kr: f64 = r.iter().zip(boost).map(|(&ri, &ki)| ri as f64 * ki).sum();
    Complex64::from_polar(gauss_envelope(r, width), -kr)
}

/// Evaluate a scalar kernel of the spatial displacement at every site.
#[instrument(skip_all, level = "debug", fields(dims = ?grid.fdimensions()))]
fn kernel_field<K>(grid: &Arc<Grid>, value: K) -> Lattice
where
    K: Fn(&Displacement) -> Complex64 + Sync,
{
    assert!(
        !grid.is_checkerboarded(),
        "smearing kernels live on full grids"
    );
    assert!(grid.nd() >= SPATIAL_DIMS.len(), "smearing needs three spatial dimensions");
    let x = coordinates(&**grid, Order::Lexicographic);
    let extent = grid.fdimensions();
    let precision = grid.precision();
    let values: Vec<Complex64> = (0..x.len())
        .into_par_iter()
        .map(|i| {
            let row = x.row(i);
            let r = SPATIAL_DIMS.map(|d| minimal_image(row[d], 0, extent[d] as i64));
            precision.round(value(&r))
        })
        .collect();
    let mut field = Lattice::complex(grid);
    field.set_coordinates(&x, &values);
    field
}

/// Real-space boosted Gaussian exp(−|r|²/(2w²)) exp(−i k·r).
#[must_use]
pub fn boosted_gaussian_kernel(grid: &Arc<Grid>, width: f64, boost: [f64; 3]) -> Lattice {
    kernel_field(grid, |r| boosted_gauss(r, width, &boost))
}

/// Real-space indicator of the half-lattice boundary: 1 where any spatial
/// |r_i| ≥ L_i/2, else 0.
#[must_use]
pub fn half_lattice_mask(grid: &Arc<Grid>) -> Lattice {
    let half = SPATIAL_DIMS.map(|d| (grid.fdimensions()[d] / 2) as i64);
    kernel_field(grid, |r| {
        if r.iter().zip(&half).any(|(&ri, &h)| ri.abs() >= h) {
            C_ONE
        } else {
            C_ZERO
        }
    })
}

/// Real-space Gaussian with the half-lattice boundary zeroed.
#[must_use]
pub fn masked_gaussian_kernel(grid: &Arc<Grid>, width: f64) -> Lattice {
    let gauss = boosted_gaussian_kernel(grid, width, [0.0; 3]);
    let mask = half_lattice_mask(grid);
    let zero = gauss.like();
    Lattice::select(&mask, |m| m.re > 0.0, &zero, &gauss)
}

/// Real-space (1 − b|r|²) exp(−|r|²/(2w²)).
#[must_use]
pub fn polynomial_gaussian_kernel(grid: &Arc<Grid>, width: f64, b: f64) -> Lattice {
    kernel_field(grid, |r| {
        Complex64::new((1.0 - b * r2(r)) * gauss_envelope(r, width), 0.0)
    })
}

/// Momentum-space convolution kernel over the spatial dimensions.
#[derive(Clone, Debug)]
pub struct SmearingKernel {
    momentum: Arc<Lattice>,
}

impl SmearingKernel {
    /// Transform a real-space `Complex` kernel to momentum space.
    ///
    /// # Panics
    ///
    /// If `kernel` is checkerboarded or lives on a multi-process grid.
    #[must_use]
    #[instrument(skip_all, level = "debug")]
    pub fn from_real_space(kernel: &Lattice) -> Self {
        let mut momentum = kernel.like();
        fft_field(&mut momentum, kernel, Some(SPATIAL_DIMS.as_slice()), FftSign::Forward);
        let volume: usize = SPATIAL_DIMS.iter().map(|&d| kernel.grid().fdimensions()[d]).product();
        let momentum = momentum.scale(Complex64::new(volume as f64, 0.0));
        Self {
            momentum: Arc::new(momentum),
        }
    }

    /// Boosted Gaussian kernel of width `width` and boost `k`.
    #[must_use]
    pub fn boosted_gaussian(grid: &Arc<Grid>, width: f64, boost: [f64; 3]) -> Self {
        Self::from_real_space(&boosted_gaussian_kernel(grid, width, boost))
    }

    /// Gaussian kernel restricted inside the half-lattice boundary.
    #[must_use]
    pub fn masked_gaussian(grid: &Arc<Grid>, width: f64) -> Self {
        Self::from_real_space(&masked_gaussian_kernel(grid, width))
    }

    /// Polynomial-Gaussian kernel (1 − b|r|²) exp(−|r|²/(2w²)).
    #[must_use]
    pub fn polynomial_gaussian(grid: &Arc<Grid>, width: f64, b: f64) -> Self {
        Self::from_real_space(&polynomial_gaussian_kernel(grid, width, b))
    }

    /// K̂(p) as a `Complex` field.
    #[must_use]
    pub fn momentum_space(&self) -> &Lattice {
        &self.momentum
    }

    /// `dst = K̂ · src` for a source already in momentum space.
    ///
    /// # Panics
    ///
    /// If `src` lives on another grid or checkerboard.
    pub fn apply_momentum_space(&self, dst: &mut Lattice, src: &Lattice) {
        dst.assign(&(&*self.momentum * src));
    }

    /// Real-space convolution `dst(x) = Σ_y K(y) src(x − y)`.
    pub fn convolve(&self, dst: &mut Lattice, src: &Lattice) {
        convolve_with(&self.momentum, dst, src);
    }

    /// The convolution as an operator; the adjoint convolves with K(−y)*.
    #[must_use]
    pub fn operator(&self) -> MatrixOperator {
        let forward = Arc::clone(&self.momentum);
        let adjoint = Arc::new(self.momentum.adjoint());
        MatrixOperator::new(
            move |dst, src| convolve_with(&forward, dst, src),
            move |dst, src| convolve_with(&adjoint, dst, src),
        )
    }
}

fn convolve_with(kernel: &Lattice, dst: &mut Lattice, src: &Lattice) {
    assert_eq!(src.checkerboard(), Checkerboard::None, "convolution needs a full field");
    let mut ft = src.like();
    fft_field(&mut ft, src, Some(SPATIAL_DIMS.as_slice()), FftSign::Forward);
    let product = kernel * &ft;
    fft_field(dst, &product, Some(SPATIAL_DIMS.as_slice()), FftSign::Backward);
}

/// `dst = K̂_boosted · src` with a freshly built boosted Gaussian kernel.
pub fn apply_boosted_1s(dst: &mut Lattice, src: &Lattice, width: f64, boost: [f64; 3]) {
    SmearingKernel::boosted_gaussian(src.grid(), width, boost).apply_momentum_space(dst, src);
}

/// `dst = K̂_masked · src` with a freshly built masked Gaussian kernel.
pub fn apply_1s(dst: &mut Lattice, src: &Lattice, width: f64) {
    SmearingKernel::masked_gaussian(src.grid(), width).apply_momentum_space(dst, src);
}

/// `dst = K̂_2S · src` with a freshly built polynomial-Gaussian kernel.
pub fn apply_2s(dst: &mut Lattice, src: &Lattice, width: f64, b: f64) {
    SmearingKernel::polynomial_gaussian(src.grid(), width, b).apply_momentum_space(dst, src);
}
