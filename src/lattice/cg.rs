// SPDX-License-Identifier: AGPL-3.0-only

//! Conjugate Gradient solver for (γ5 M)² x = b.
//!
//! γ5 M is Hermitian, so A = (γ5 M)² = M†M is Hermitian positive definite
//! whenever M is non-singular (m > 0 on a free background).
//!
//! # Algorithm
//!
//! Standard CG with relative residual convergence criterion:
//!   ||r||² / ||b||² < tol²
//!
//! # References
//!
//! - Hestenes & Stiefel (1952), conjugate gradient
//! - Gattringer & Lang, "QCD on the Lattice" (2010), Ch. 8.4

use num_complex::Complex64;
use serde::Serialize;
use tracing::{debug, instrument};

use super::constants::LATTICE_DIVISION_GUARD;
use super::field::Lattice;
use super::wilson::WilsonFermion;

/// CG solver result.
#[derive(Clone, Debug, Serialize)]
pub struct CgResult {
    pub converged: bool,
    pub iterations: usize,
    pub final_residual: f64,
    pub initial_residual: f64,
}

/// A x = γ5 M γ5 M x.
#[must_use]
pub fn apply_normal(w: &WilsonFermion, x: &Lattice) -> Lattice {
    let mut t = x.like();
    let mut out = x.like();
    w.g5m(x, &mut t);
    w.g5m(&t, &mut out);
    out
}

/// Solve (γ5 M)² x = b using Conjugate Gradient.
///
/// `x` holds the initial guess and is overwritten with the solution.
/// `tol` is the relative residual tolerance.
#[instrument(skip_all, level = "debug", fields(tol = tol, max_iter = max_iter))]
pub fn cg_solve(
    w: &WilsonFermion,
    x: &mut Lattice,
    b: &Lattice,
    tol: f64,
    max_iter: usize,
) -> CgResult {
    let b_norm_sq = b.norm2();
    if b_norm_sq < LATTICE_DIVISION_GUARD {
        x.zero();
        return CgResult {
            converged: true,
            iterations: 0,
            final_residual: 0.0,
            initial_residual: 0.0,
        };
    }

    // r = b - A x
    let mut r = b - &apply_normal(w, x);
    let mut r_norm_sq = r.norm2();
    let initial_residual = (r_norm_sq / b_norm_sq).sqrt();
    let tol_sq = tol * tol * b_norm_sq;

    if r_norm_sq < tol_sq {
        return CgResult {
            converged: true,
            iterations: 0,
            final_residual: initial_residual,
            initial_residual,
        };
    }

    let mut p = r.clone();
    let mut iterations = 0;

    for iter in 0..max_iter {
        iterations = iter + 1;

        let ap = apply_normal(w, &p);

        // alpha = <r|r> / <p|Ap>
        let p_ap = p.inner_product(&ap).re;
        if p_ap.abs() < LATTICE_DIVISION_GUARD {
            break;
        }
        let alpha = r_norm_sq / p_ap;

        x.axpy(Complex64::new(alpha, 0.0), &p);
        r.axpy(Complex64::new(-alpha, 0.0), &ap);

        let r_norm_sq_new = r.norm2();
        if r_norm_sq_new < tol_sq {
            r_norm_sq = r_norm_sq_new;
            break;
        }

        // p = r + beta * p
        let beta = r_norm_sq_new / r_norm_sq;
        r_norm_sq = r_norm_sq_new;
        p = &r + &(&p * beta);
    }

    let final_residual = (r_norm_sq / b_norm_sq).sqrt();
    debug!(iterations, final_residual, "cg finished");

    CgResult {
        converged: final_residual < tol,
        iterations,
        final_residual,
        initial_residual,
    }
}
