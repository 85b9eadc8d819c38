// SPDX-License-Identifier: AGPL-3.0-only

//! SU(3) colour matrices for gauge links.
//!
//! A link `U_μ`(x) is the parallel transporter from x + μ̂ to x: a 3×3
//! unitary matrix with unit determinant. [`Su3Matrix`] stores its nine
//! entries row-major, exactly as one site of a `ColorMatrix` field, so
//! reading and writing field sites is a plain copy.
//!
//! # References
//!
//! - Gattringer & Lang, "QCD on the Lattice" (2010), Ch. 2
//! - Creutz, "Quarks, Gluons and Lattices" (1983), Ch. 8

use std::ops::{Index, IndexMut, Mul};

use num_complex::Complex64;

use super::constants::{lcg_gaussian, C_I, C_ONE, C_ZERO, LATTICE_DIVISION_GUARD, N_COLORS};

/// Colour vector: 3 complex components.
pub type ColorVector = [Complex64; N_COLORS];

const N: usize = N_COLORS;

/// 3×3 complex matrix, indexed `u[(row, col)]`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[must_use]
pub struct Su3Matrix([Complex64; N * N]);

impl Index<(usize, usize)> for Su3Matrix {
    type Output = Complex64;
    fn index(&self, (row, col): (usize, usize)) -> &Complex64 {
        &self.0[row * N + col]
    }
}

impl IndexMut<(usize, usize)> for Su3Matrix {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut Complex64 {
        &mut self.0[row * N + col]
    }
}

impl Mul for Su3Matrix {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self::from_fn(|i, j| (0..N).map(|k| self[(i, k)] * rhs[(k, j)]).sum())
    }
}

impl Su3Matrix {
    pub const IDENTITY: Self = Self([
        C_ONE, C_ZERO, C_ZERO, //
        C_ZERO, C_ONE, C_ZERO, //
        C_ZERO, C_ZERO, C_ONE,
    ]);

    fn from_fn(f: impl Fn(usize, usize) -> Complex64) -> Self {
        Self(std::array::from_fn(|k| f(k / N, k % N)))
    }

    /// Read nine row-major components (one `ColorMatrix` site).
    ///
    /// # Panics
    ///
    /// If `c` does not hold exactly nine values.
    pub fn from_components(c: &[Complex64]) -> Self {
        let mut u = Self([C_ZERO; N * N]);
        u.0.copy_from_slice(c);
        u
    }

    /// Write into nine row-major components.
    pub fn write_components(&self, out: &mut [Complex64]) {
        out.copy_from_slice(&self.0);
    }

    /// U†
    pub fn adjoint(self) -> Self {
        Self::from_fn(|i, j| self[(j, i)].conj())
    }

    #[must_use]
    pub fn trace(self) -> Complex64 {
        (0..N).map(|i| self[(i, i)]).sum()
    }

    #[must_use]
    pub fn re_trace(self) -> f64 {
        self.trace().re
    }

    /// Cofactor expansion along the first row.
    #[must_use]
    pub fn det(self) -> Complex64 {
        let cross = self.row_cross(1, 2);
        (0..N).map(|j| self[(0, j)] * cross[j]).sum()
    }

    /// `(U v)_c = Σ_c' U_{c c'} v_c'`
    #[must_use]
    pub fn mul_vec(&self, v: &ColorVector) -> ColorVector {
        std::array::from_fn(|c| (0..N).map(|k| self[(c, k)] * v[k]).sum())
    }

    /// Plain cross product of rows `a` and `b` (no conjugation).
    fn row_cross(&self, a: usize, b: usize) -> ColorVector {
        std::array::from_fn(|j| {
            let (k, l) = ((j + 1) % N, (j + 2) % N);
            self[(a, k)] * self[(b, l)] - self[(a, l)] * self[(b, k)]
        })
    }

    fn normalize_row(&mut self, row: usize) {
        let norm = (0..N).map(|j| self[(row, j)].norm_sqr()).sum::<f64>().sqrt();
        if norm > LATTICE_DIVISION_GUARD {
            for j in 0..N {
                self[(row, j)] /= norm;
            }
        }
    }

    /// Nearest SU(3) matrix by Gram-Schmidt on rows 0 and 1, with row 2
    /// rebuilt as conj(row0 × row1) so that det U = 1.
    pub fn reunitarize(self) -> Self {
        let mut u = self;
        u.normalize_row(0);
        let overlap: Complex64 = (0..N).map(|j| u[(0, j)].conj() * u[(1, j)]).sum();
        for j in 0..N {
            let along = u[(0, j)] * overlap;
            u[(1, j)] -= along;
        }
        u.normalize_row(1);
        let third = u.row_cross(0, 1);
        for (j, z) in third.iter().enumerate() {
            u[(2, j)] = z.conj();
        }
        u
    }

    /// exp(iεH) ≈ 1 + iεH − ε²H²/2, reunitarized, for a traceless Hermitian
    /// H built from eight LCG Gaussians (Gell-Mann coefficients).
    pub fn random_near_identity(seed: &mut u64, epsilon: f64) -> Self {
        let a: [f64; 8] = std::array::from_fn(|_| lcg_gaussian(seed) * epsilon);
        let s3 = 3.0_f64.sqrt();
        let mut h = Self([C_ZERO; N * N]);
        h[(0, 0)] = Complex64::new(a[2] + a[7] / s3, 0.0);
        h[(1, 1)] = Complex64::new(-a[2] + a[7] / s3, 0.0);
        h[(2, 2)] = Complex64::new(-2.0 * a[7] / s3, 0.0);
        for (i, j, re, im) in [(0, 1, a[0], a[1]), (0, 2, a[3], a[4]), (1, 2, a[5], a[6])] {
            h[(i, j)] = Complex64::new(re, im);
            h[(j, i)] = Complex64::new(re, -im);
        }
        let h2 = h * h;
        Self::from_fn(|i, j| Self::IDENTITY[(i, j)] + C_I * h[(i, j)] - h2[(i, j)] * 0.5).reunitarize()
    }
}
