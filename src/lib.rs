// SPDX-License-Identifier: AGPL-3.0-only

//! Lattice fields: checkerboarded coordinates and operator algebra for lattice QCD.
//!
//! Distributed-index arithmetic for cartesian grids with even/odd
//! decomposition, a composable four-map linear operator, FFT-based smearing
//! and momentum-phase operators, and the even-odd split Wilson fermion matrix.
//!
//! ## Active modules
//!   - `lattice`: grids, coordinates, fields, operators, Wilson fermion
//!   - `config`: JSON run configuration (grid layout, mass, smearing)
//!   - `tolerances`: named numerical acceptance thresholds
//!   - `validation`: pass/fail harness shared by validation binaries
//!
//! ## Validation binaries
//!   - `validate_lattice_operators`: coordinate coverage, FFT round trip,
//!     phase unitarity, free-field Wilson stencil, γ5-Hermiticity, CG

pub mod config;
pub mod error;
pub mod lattice;
pub mod tolerances;
pub mod validation;

pub use error::LatticeError;
