// SPDX-License-Identifier: AGPL-3.0-only

//! Euclidean Dirac matrices in the chiral basis.
//!
//! Every γ has exactly one non-zero entry per row, a power of i, so it is
//! stored as a signed permutation: row `s` of `γ ψ` is `coef[s] · ψ[col[s]]`.
//!
//! | Index | Matrix | Non-zero entries (row → col: coef) |
//! |-------|--------|------------------------------------|
//! | 0 | γ_x | 0→3: i, 1→2: i, 2→1: −i, 3→0: −i |
//! | 1 | γ_y | 0→3: −1, 1→2: 1, 2→1: 1, 3→0: −1 |
//! | 2 | γ_z | 0→2: i, 1→3: −i, 2→0: −i, 3→1: i |
//! | 3 | γ_t | 0→2: 1, 1→3: 1, 2→0: 1, 3→1: 1 |
//! | 5 | γ5 = γ_x γ_y γ_z γ_t | diag(1, 1, −1, −1) |
//!
//! They satisfy {γ_μ, γ_ν} = 2δ_μν and γ_μ† = γ_μ.
//!
//! # References
//!
//! - Gattringer & Lang, "QCD on the Lattice" (2010), App. A.2

use num_complex::Complex64;
use rayon::prelude::*;

use super::constants::{N_COLORS, N_SPINS};
use super::field::{Lattice, ObjectType};

const P1: Complex64 = Complex64::new(1.0, 0.0);
const M1: Complex64 = Complex64::new(-1.0, 0.0);
const PI: Complex64 = Complex64::new(0.0, 1.0);
const MI: Complex64 = Complex64::new(0.0, -1.0);

/// A Dirac matrix acting on the spin index.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Gamma {
    col: [usize; N_SPINS],
    coef: [Complex64; N_SPINS],
}

/// γ_x
pub const GAMMA_X: Gamma = Gamma {
    col: [3, 2, 1, 0],
    coef: [PI, PI, MI, MI],
};

/// γ_y
pub const GAMMA_Y: Gamma = Gamma {
    col: [3, 2, 1, 0],
    coef: [M1, P1, P1, M1],
};

/// γ_z
pub const GAMMA_Z: Gamma = Gamma {
    col: [2, 3, 0, 1],
    coef: [PI, MI, MI, PI],
};

/// γ_t
pub const GAMMA_T: Gamma = Gamma {
    col: [2, 3, 0, 1],
    coef: [P1, P1, P1, P1],
};

/// γ5 = γ_x γ_y γ_z γ_t
pub const GAMMA_5: Gamma = Gamma {
    col: [0, 1, 2, 3],
    coef: [P1, P1, M1, M1],
};

/// γ by index: 0..=3 are the directions, 5 is γ5.
///
/// # Panics
///
/// For any other index.
#[must_use]
pub const fn gamma(mu: usize) -> Gamma {
    match mu {
        0 => GAMMA_X,
        1 => GAMMA_Y,
        2 => GAMMA_Z,
        3 => GAMMA_T,
        5 => GAMMA_5,
        _ => panic!("gamma index must be 0..=3 or 5"),
    }
}

impl Gamma {
    /// Dense 4×4 form.
    #[must_use]
    pub fn matrix(&self) -> [[Complex64; N_SPINS]; N_SPINS] {
        let mut m = [[Complex64::new(0.0, 0.0); N_SPINS]; N_SPINS];
        for s in 0..N_SPINS {
            m[s][self.col[s]] = self.coef[s];
        }
        m
    }

    /// Apply to one 12-component spinor site.
    #[inline]
    pub fn apply_site(&self, out: &mut [Complex64], psi: &[Complex64]) {
        for s in 0..N_SPINS {
            let from = self.col[s] * N_COLORS;
            for c in 0..N_COLORS {
                out[s * N_COLORS + c] = self.coef[s] * psi[from + c];
            }
        }
    }

    /// `γ ψ` for a spinor field.
    ///
    /// # Panics
    ///
    /// If `psi` is not a `WilsonSpinor` field.
    #[must_use]
    pub fn apply(&self, psi: &Lattice) -> Lattice {
        assert_eq!(
            psi.otype(),
            ObjectType::WilsonSpinor,
            "gamma matrices act on spinor fields"
        );
        let mut out = psi.like();
        let nc = psi.components();
        out.data_mut()
            .par_chunks_mut(nc)
            .zip(psi.data().par_chunks(nc))
            .for_each(|(o, p)| self.apply_site(o, p));
        out
    }

    /// `ψ ← γ ψ` in place.
    pub fn apply_in_place(&self, psi: &mut Lattice) {
        assert_eq!(
            psi.otype(),
            ObjectType::WilsonSpinor,
            "gamma matrices act on spinor fields"
        );
        let nc = psi.components();
        psi.data_mut().par_chunks_mut(nc).for_each(|site| {
            let mut tmp = [Complex64::new(0.0, 0.0); N_SPINS * N_COLORS];
            self.apply_site(&mut tmp, site);
            site.copy_from_slice(&tmp);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type M4 = [[Complex64; 4]; 4];

    fn mul(a: &M4, b: &M4) -> M4 {
        let mut r = [[Complex64::new(0.0, 0.0); 4]; 4];
        for i in 0..4 {
            for j in 0..4 {
                for k in 0..4 {
                    r[i][j] += a[i][k] * b[k][j];
                }
            }
        }
        r
    }

    #[test]
    fn index_selects_named_matrices() {
        assert_eq!(gamma(0), GAMMA_X);
        assert_eq!(gamma(3), GAMMA_T);
        assert_eq!(gamma(5), GAMMA_5);
        assert_ne!(GAMMA_X, GAMMA_Y);
        let copy = GAMMA_Z;
        assert_eq!(copy, gamma(2));
    }

    #[test]
    fn clifford_algebra() {
        for mu in 0..4 {
            for nu in 0..4 {
                let a = gamma(mu).matrix();
                let b = gamma(nu).matrix();
                let ab = mul(&a, &b);
                let ba = mul(&b, &a);
                for i in 0..4 {
                    for j in 0..4 {
                        let expected = if mu == nu && i == j { 2.0 } else { 0.0 };
                        let anti = ab[i][j] + ba[i][j];
                        assert!(
                            (anti.re - expected).abs() < 1e-15 && anti.im.abs() < 1e-15,
                            "{{γ{mu}, γ{nu}}} wrong at ({i},{j})"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn gammas_are_hermitian() {
        for mu in [0, 1, 2, 3, 5] {
            let m = gamma(mu).matrix();
            for i in 0..4 {
                for j in 0..4 {
                    assert_eq!(m[i][j], m[j][i].conj(), "γ{mu} not Hermitian");
                }
            }
        }
    }

    #[test]
    fn gamma5_is_product_of_directions() {
        let xy = mul(&GAMMA_X.matrix(), &GAMMA_Y.matrix());
        let zt = mul(&GAMMA_Z.matrix(), &GAMMA_T.matrix());
        assert_eq!(mul(&xy, &zt), GAMMA_5.matrix());
    }

    #[test]
    fn apply_site_matches_dense() {
        let psi: Vec<Complex64> = (0..12)
            .map(|k| Complex64::new(f64::from(k), -0.5 * f64::from(k)))
            .collect();
        let mut out = [Complex64::new(0.0, 0.0); 12];
        GAMMA_Z.apply_site(&mut out, &psi);
        let m = GAMMA_Z.matrix();
        for s in 0..4 {
            for c in 0..3 {
                let dense: Complex64 = (0..4).map(|t| m[s][t] * psi[3 * t + c]).sum();
                assert_eq!(out[3 * s + c], dense);
            }
        }
    }
}
