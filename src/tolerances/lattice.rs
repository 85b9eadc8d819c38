// SPDX-License-Identifier: AGPL-3.0-only

//! Lattice operator tolerances.

use super::core::{EXACT_F64, ITERATIVE_F64};

/// Cold plaquette: absolute error (exactly 1.0 for unit links).
///
/// Products of identity matrices are exact; only the trace average rounds.
pub const COLD_PLAQUETTE_ABS: f64 = 1e-12;

/// FFT forward-then-backward round trip, per component.
///
/// Radix-2/4 transforms of length ≤ 64 lose ~log₂(N) ulps per pass.
pub const FFT_ROUND_TRIP_ABS: f64 = 1e-12;

/// Phase operator: |exp(ip·x)| = 1 and inverse∘forward = identity.
pub const PHASE_UNITARITY_ABS: f64 = 1e-12;

/// FFT convolution against the direct real-space sum.
pub const SMEARING_CONVOLUTION_ABS: f64 = EXACT_F64;

/// Free-field Wilson stencil coefficients.
///
/// With unit links every coefficient is a sum of at most eight terms
/// of ±½, so the result is exact up to a few ulps.
pub const WILSON_FREE_STENCIL_ABS: f64 = 1e-14;

/// γ5-Hermiticity ⟨a, γ5M b⟩ = ⟨γ5M a, b⟩, relative to |⟨a, γ5M b⟩|.
///
/// Both sides sum V·12 products in different orders.
pub const GAMMA5_HERMITICITY_REL: f64 = EXACT_F64;

/// CG relative residual for (γ5 M)² x = b.
pub const CG_TOLERANCE: f64 = ITERATIVE_F64;

/// CG iteration cap.
///
/// A 4⁴ lattice at m = 0.5 converges in well under 200 iterations; 2000
/// only trips on a broken operator.
pub const CG_MAX_ITER: usize = 2000;
