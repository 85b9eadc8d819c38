// SPDX-License-Identifier: AGPL-3.0-only

//! Core numerical tolerances: machine precision and storage width.

// ═══════════════════════════════════════════════════════════════════
// Machine-precision tolerances (IEEE 754 f64)
// ═══════════════════════════════════════════════════════════════════

/// Tolerance for operations that should be exact in f64 arithmetic.
///
/// f64 has ~15.9 significant digits; 1e-10 allows 5 digits of accumulated
/// rounding in compositions of exact operations.
pub const EXACT_F64: f64 = 1e-10;

/// Tolerance for f64 operations with moderate accumulation.
///
/// Used for iterative algorithms where O(n) rounding steps accumulate.
pub const ITERATIVE_F64: f64 = 1e-8;

/// Expected values below this magnitude are compared absolutely.
///
/// 1e-14 is just above f64 machine epsilon (~2.2e-16), leaving ~2 digits
/// of headroom for rounding in the expected value itself.
pub const NEAR_ZERO_EXPECTED: f64 = 1e-14;

// ═══════════════════════════════════════════════════════════════════
// Storage-width tolerances (IEEE 754 f32)
// ═══════════════════════════════════════════════════════════════════

/// Agreement between single-precision-rounded and f64 values of O(1).
///
/// f32 carries a 24-bit mantissa, so one rounding step is at most
/// 2⁻²⁴ ≈ 6e-8 relative. 1e-6 covers a handful of such steps.
pub const SINGLE_PRECISION_ROUNDING: f64 = 1e-6;
