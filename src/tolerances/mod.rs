// SPDX-License-Identifier: AGPL-3.0-only

//! Centralized validation tolerances.
//!
//! Every threshold used by the validation binary and the integration tests
//! is defined here with its origin. No ad-hoc magic numbers.
//!
//! # Tolerance categories
//!
//! | Category | Basis | Example |
//! |----------|-------|---------|
//! | Machine precision | IEEE 754 f64 | 1e-12 for FFT round trips |
//! | Numerical method | Algorithm convergence | 1e-8 for CG |
//! | Storage width | IEEE 754 f32 | 1e-6 for single-precision kernels |

/// Machine-precision and storage-width tolerances.
pub mod core;
/// Lattice operators: FFT, phases, smearing, Wilson matrix, CG.
pub mod lattice;

pub use self::core::{EXACT_F64, ITERATIVE_F64, NEAR_ZERO_EXPECTED, SINGLE_PRECISION_ROUNDING};

pub use lattice::{
    CG_MAX_ITER, CG_TOLERANCE, COLD_PLAQUETTE_ABS, FFT_ROUND_TRIP_ABS, GAMMA5_HERMITICITY_REL,
    PHASE_UNITARITY_ABS, SMEARING_CONVOLUTION_ABS, WILSON_FREE_STENCIL_ABS,
};
