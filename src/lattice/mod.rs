// SPDX-License-Identifier: AGPL-3.0-only

//! Lattice fields on checkerboarded cartesian grids.
//!
//! Data flow from topology to physics:
//!
//! | Stage | Input | Output |
//! |-------|-------|--------|
//! | Topology | `GridSpec` | `Grid` (global/local extents, red-black split) |
//! | Enumeration | grid + checkerboard | `LocalCoordinates` |
//! | Construction | coordinates | kernel, phase and source fields |
//! | Algebra | `MatrixOperator` values | composed FFT/phase/smearing maps |
//! | Stencil | gauge links | Wilson fermion matrix `M = Meooe + Mooee` |
//!
//! Coordinates and views are pure index arithmetic and work for any process
//! layout. Operations that read neighbour data or transform globally
//! (`cshift`, FFT) run on single-process grids.
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `constants` | Colour/spin counts, complex units, LCG PRNG |
//! | `grid` | Grid topology, checkerboard tags, precision |
//! | `coordinates` | Cartesian views, coordinate enumeration, minimal image |
//! | `field` | Site-major complex field storage and elementwise algebra |
//! | `su3` | SU(3) 3×3 complex matrix operations |
//! | `gamma` | Chiral-basis Dirac gamma matrices |
//! | `operator` | Four-map composable linear operator |
//! | `fft` | Multi-dimensional FFT operator |
//! | `smearing` | Gaussian and polynomial-Gaussian convolution kernels |
//! | `phase` | Cached momentum phase operator exp(i p·x) |
//! | `correlator` | FFT two-point correlation |
//! | `gauge` | Gauge link fields: cold/hot start, plaquette |
//! | `wilson` | Wilson fermion matrix (hopping + diagonal) |
//! | `cg` | Conjugate gradient on (γ5 M)² |
//!
//! # References
//!
//! - Gattringer & Lang, "Quantum Chromodynamics on the Lattice" (2010)
//! - `DeGrand` & `DeTar`, "Lattice Methods for Quantum Chromodynamics" (2006)

/// Conjugate gradient on the Hermitian Wilson normal operator.
pub mod cg;
/// LCG PRNG, lattice constants, and shared numerical guards.
pub mod constants;
/// Cartesian views, coordinate enumeration, relative coordinates.
pub mod coordinates;
/// Two-point correlation via FFT.
pub mod correlator;
/// Multi-dimensional FFT as a matrix operator.
pub mod fft;
/// Complex lattice fields and their elementwise algebra.
pub mod field;
/// Dirac gamma matrices acting on Wilson spinor fields.
pub mod gamma;
/// Gauge link fields and the average plaquette.
pub mod gauge;
/// Grid topology and checkerboard tags.
pub mod grid;
/// Composable linear operators (forward, adjoint, inverse, adjoint-inverse).
pub mod operator;
/// Momentum phase operator with per-key cache.
pub mod phase;
/// FFT convolution kernels for quark source smearing.
pub mod smearing;
/// SU(3) 3x3 complex matrix operations.
pub mod su3;
/// Wilson fermion matrix.
pub mod wilson;
