// SPDX-License-Identifier: AGPL-3.0-only

//! Multi-dimensional discrete Fourier transform as a matrix operator.
//!
//! Forward (sign +1) and backward (sign −1) transforms over a set of
//! dimensions D with V_D = Π_{d∈D} L_d:
//!
//!   F f(k) = (1/V_D) Σ_x f(x) exp(−2πi k·x / L)
//!   B f̃(x) = Σ_k f̃(k) exp(+2πi k·x / L)
//!
//! B∘F is the identity, and F† = B, F⁻¹ = B as operators. Each internal
//! component of a field is transformed independently.

use rayon::prelude::*;
use rustfft::{FftDirection, FftPlanner};
use tracing::instrument;

use super::constants::C_ZERO;
use super::field::Lattice;
use super::grid::Checkerboard;
use super::operator::MatrixOperator;

/// Transform direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FftSign {
    /// Sign +1: `exp(−2πi k·x/L)`, normalized by 1/V.
    Forward,
    /// Sign −1: `exp(+2πi k·x/L)`, unnormalized.
    Backward,
}

impl FftSign {
    /// Signed integer form (+1 forward, −1 backward).
    #[must_use]
    pub const fn sign(self) -> i32 {
        match self {
            Self::Forward => 1,
            Self::Backward => -1,
        }
    }
}

/// FFT operator over `dims` (all dimensions when `None`).
///
/// Forward and adjoint-inverse apply the forward transform; adjoint and
/// inverse apply the backward transform.
#[must_use]
pub fn fft(dims: Option<&[usize]>) -> MatrixOperator {
    let dims: Option<Vec<usize>> = dims.map(<[usize]>::to_vec);
    let fwd = dims.clone();
    let bwd = dims.clone();
    let inv = dims.clone();
    let adj_inv = dims;
    MatrixOperator::new(
        move |dst, src| fft_field(dst, src, fwd.as_deref(), FftSign::Forward),
        move |dst, src| fft_field(dst, src, bwd.as_deref(), FftSign::Backward),
    )
    .with_inverse(
        move |dst, src| fft_field(dst, src, inv.as_deref(), FftSign::Backward),
        move |dst, src| fft_field(dst, src, adj_inv.as_deref(), FftSign::Forward),
    )
}

/// Transform `src` into `dst` along `dims` (all dimensions when `None`).
///
/// # Panics
///
/// If the object types differ, the field is checkerboarded, the grid spans
/// several processes, or a dimension is out of range.
#[instrument(skip_all, level = "debug", fields(sign = sign.sign()))]
pub fn fft_field(dst: &mut Lattice, src: &Lattice, dims: Option<&[usize]>, sign: FftSign) {
    assert_eq!(dst.otype(), src.otype(), "fft source and destination types differ");
    assert_eq!(
        src.checkerboard(),
        Checkerboard::None,
        "fft needs a full (non-checkerboarded) field"
    );
    let grid = src.grid();
    assert!(grid.is_single_process(), "fft needs a single-process grid");
    let nd = grid.nd();
    let all: Vec<usize> = (0..nd).collect();
    let dims = dims.unwrap_or(&all);

    dst.assign(src);
    let extents = grid.ldimensions().to_vec();
    let nc = src.components();
    let volume = src.sites();
    let direction = match sign {
        FftSign::Forward => FftDirection::Forward,
        FftSign::Backward => FftDirection::Inverse,
    };
    let mut planner = FftPlanner::<f64>::new();
    let mut buffer = vec![C_ZERO; volume * nc];

    for &d in dims {
        assert!(d < nd, "fft dimension {d} out of range");
        let len = extents[d];
        let stride: usize = extents[..d].iter().product();
        let lines = volume / len;
        let plan = planner.plan_fft(len, direction);
        let norm = match sign {
            FftSign::Forward => 1.0 / len as f64,
            FftSign::Backward => 1.0,
        };

        let site_of = |line: usize, j: usize| {
            let lower = line % stride;
            let upper = line / stride;
            lower + j * stride + upper * stride * len
        };

        // gather: component-major, one contiguous run per line
        let data = dst.data();
        buffer.par_chunks_mut(len).enumerate().for_each(|(run, out)| {
            let c = run / lines;
            let line = run % lines;
            for (j, z) in out.iter_mut().enumerate() {
                *z = data[site_of(line, j) * nc + c];
            }
        });

        buffer.par_chunks_mut(len).for_each(|run| plan.process(run));

        let data = dst.data_mut();
        for (run, values) in buffer.chunks(len).enumerate() {
            let c = run / lines;
            let line = run % lines;
            for (j, z) in values.iter().enumerate() {
                data[site_of(line, j) * nc + c] = z.scale(norm);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;
    use std::sync::Arc;

    use num_complex::Complex64;

    use super::*;
    use crate::lattice::field::ObjectType;
    use crate::lattice::grid::Grid;

    #[test]
    fn plane_wave_maps_to_single_mode() {
        let g = Arc::new(Grid::new(&[8, 4]).unwrap());
        let mut f = Lattice::complex(&g);
        for i in 0..f.sites() {
            let x = f.site_coordinate(i);
            let phase = 2.0 * PI * (3.0 * x[0] as f64 / 8.0 + x[1] as f64 / 4.0);
            f.site_mut(i)[0] = Complex64::from_polar(1.0, phase);
        }
        let ft = fft(None).apply(&f);
        for i in 0..ft.sites() {
            let k = ft.site_coordinate(i);
            let expected = if k == [3, 1] { 1.0 } else { 0.0 };
            assert!((ft.site(i)[0] - expected).norm() < 1e-12, "mode {k:?}");
        }
    }

    #[test]
    fn round_trip_one_and_three_dims() {
        let g = Arc::new(Grid::new(&[4, 2, 6, 3]).unwrap());
        let mut seed = 21u64;
        let f = Lattice::random(&g, ObjectType::ColorMatrix, &mut seed);
        for dims in [vec![2], vec![0, 1, 3]] {
            let op = fft(Some(dims.as_slice()));
            let back = op.adj().apply(&op.apply(&f));
            for (a, b) in back.data().iter().zip(f.data()) {
                assert!((a - b).norm() < 1e-13);
            }
            let back = op.inv().apply(&op.apply(&f));
            assert!((back.norm2() - f.norm2()).abs() < 1e-10);
        }
    }

    #[test]
    fn forward_is_normalized_parseval() {
        let g = Arc::new(Grid::new(&[4, 4]).unwrap());
        let mut seed = 8u64;
        let f = Lattice::random(&g, ObjectType::Complex, &mut seed);
        let ft = fft(None).apply(&f);
        assert!((ft.norm2() * 16.0 - f.norm2()).abs() < 1e-12);
    }

    #[test]
    #[should_panic(expected = "types differ")]
    fn mismatched_types_panic() {
        let g = Arc::new(Grid::new(&[4]).unwrap());
        let src = Lattice::complex(&g);
        let mut dst = Lattice::wilson_spinor(&g);
        fft_field(&mut dst, &src, None, FftSign::Forward);
    }

    #[test]
    #[should_panic(expected = "non-checkerboarded")]
    fn checkerboarded_field_panics() {
        let g = Arc::new(Grid::new(&[4, 4]).unwrap().red_black().unwrap());
        let src = Lattice::complex(&g);
        let mut dst = src.like();
        fft_field(&mut dst, &src, None, FftSign::Forward);
    }
}
