// SPDX-License-Identifier: AGPL-3.0-only

//! Two-point correlation via the FFT.
//!
//! With F the normalized forward transform over D and B = F†:
//!
//!   c(x) = F( F(a) · B(b) )(x) = (1/V_D) Σ_y a(y) b(y + x)
//!
//! the factor 1/V_D following from the transform normalization.
//! `slice_sum` reduces a field to one value per coordinate along a
//! dimension, the usual last step of a time-slice correlator.
//!
//! # References
//!
//! - Gattringer & Lang, "QCD on the Lattice" (2010), Ch. 6.1

use num_complex::Complex64;
use tracing::instrument;

use super::constants::C_ZERO;
use super::fft::fft;
use super::field::Lattice;

/// c(x) = (1/V) Σ_y a(y) b(y + x) over `dims` (all dimensions when `None`).
///
/// # Panics
///
/// If the fields are not conformable or their product is unsupported.
#[must_use]
#[instrument(skip_all, level = "debug")]
pub fn correlate(a: &Lattice, b: &Lattice, dims: Option<&[usize]>) -> Lattice {
    let f = fft(dims);
    let g = f.adj();
    let fa = f.apply(a);
    let gb = g.apply(b);
    f.apply(&(&fa * &gb))
}

/// Σ over all sites with coordinate `t` along `dim` and all components.
///
/// # Panics
///
/// If `dim` is out of range.
#[must_use]
pub fn slice_sum(field: &Lattice, dim: usize) -> Vec<Complex64> {
    let grid = field.grid();
    assert!(dim < grid.nd(), "slice dimension {dim} out of range");
    let mut sums = vec![C_ZERO; grid.fdimensions()[dim]];
    for i in 0..field.sites() {
        let t = field.site_coordinate(i)[dim] as usize;
        sums[t] += field.site(i).iter().sum::<Complex64>();
    }
    sums
}
