// SPDX-License-Identifier: AGPL-3.0-only

//! Wilson fermion matrix, split into hopping and diagonal parts.
//!
//!   M = Meooe + Mooee
//!
//!   (Meooe ψ)(x) = Σ_μ [ (½γ_μ − ½) `U_μ`(x) ψ(x+μ)
//!                      + (−½γ_μ − ½) `U_μ`†(x−μ) ψ(x−μ) ]
//!
//!   (Mooee ψ)(x) = ψ(x) / (2κ),  κ = 1 / (2(m + 4))
//!
//! M is γ5-Hermitian, (γ5 M)† = γ5 M, which makes γ5 M the natural
//! operator for Krylov solvers. `Meooe` couples only nearest neighbours and
//! `Mooee` is site-local.
//!
//! Arguments follow the `(src, dst)` order. The destination is borrowed
//! mutably while the source is borrowed shared, so passing the same field
//! for both is rejected at compile time:
//!
//! ```compile_fail
//! use std::sync::Arc;
//! use lattice_fields::lattice::gauge::GaugeField;
//! use lattice_fields::lattice::grid::Grid;
//! use lattice_fields::lattice::field::Lattice;
//! use lattice_fields::lattice::wilson::{FermionMass, WilsonFermion};
//!
//! let grid = Arc::new(Grid::new(&[4, 4, 4, 4]).unwrap());
//! let links = Arc::new(GaugeField::cold_start(&grid));
//! let w = WilsonFermion::new(&links, FermionMass::Mass(0.0));
//! let mut psi = Lattice::wilson_spinor(&grid);
//! w.m(&psi, &mut psi);
//! ```
//!
//! Each of the other maps rejects aliasing the same way:
//!
//! ```compile_fail
//! # use std::sync::Arc;
//! # use lattice_fields::lattice::gauge::GaugeField;
//! # use lattice_fields::lattice::grid::Grid;
//! # use lattice_fields::lattice::field::Lattice;
//! # use lattice_fields::lattice::wilson::{FermionMass, WilsonFermion};
//! # let grid = Arc::new(Grid::new(&[4, 4, 4, 4]).unwrap());
//! # let links = Arc::new(GaugeField::cold_start(&grid));
//! # let w = WilsonFermion::new(&links, FermionMass::Mass(0.0));
//! let mut psi = Lattice::wilson_spinor(&grid);
//! w.meooe(&psi, &mut psi);
//! ```
//!
//! ```compile_fail
//! # use std::sync::Arc;
//! # use lattice_fields::lattice::gauge::GaugeField;
//! # use lattice_fields::lattice::grid::Grid;
//! # use lattice_fields::lattice::field::Lattice;
//! # use lattice_fields::lattice::wilson::{FermionMass, WilsonFermion};
//! # let grid = Arc::new(Grid::new(&[4, 4, 4, 4]).unwrap());
//! # let links = Arc::new(GaugeField::cold_start(&grid));
//! # let w = WilsonFermion::new(&links, FermionMass::Mass(0.0));
//! let mut psi = Lattice::wilson_spinor(&grid);
//! w.mooee(&psi, &mut psi);
//! ```
//!
//! ```compile_fail
//! # use std::sync::Arc;
//! # use lattice_fields::lattice::gauge::GaugeField;
//! # use lattice_fields::lattice::grid::Grid;
//! # use lattice_fields::lattice::field::Lattice;
//! # use lattice_fields::lattice::wilson::{FermionMass, WilsonFermion};
//! # let grid = Arc::new(Grid::new(&[4, 4, 4, 4]).unwrap());
//! # let links = Arc::new(GaugeField::cold_start(&grid));
//! # let w = WilsonFermion::new(&links, FermionMass::Mass(0.0));
//! let mut psi = Lattice::wilson_spinor(&grid);
//! w.g5m(&psi, &mut psi);
//! ```
//!
//! # References
//!
//! - Wilson, "Quarks and strings on a lattice" (1975)
//! - Gattringer & Lang, "QCD on the Lattice" (2010), Ch. 5.2

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::constants::{C_ONE, C_ZERO, N_COLORS, N_DIM, N_SPINS};
use super::field::{Lattice, ObjectType};
use super::gamma::{gamma, GAMMA_5};
use super::gauge::GaugeField;
use super::grid::Grid;
use super::operator::MatrixOperator;

/// Bare mass or hopping parameter; exactly one defines the operator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FermionMass {
    /// Bare quark mass m.
    Mass(f64),
    /// Hopping parameter κ.
    Kappa(f64),
}

impl FermionMass {
    /// Pick the one given option.
    ///
    /// # Panics
    ///
    /// Unless exactly one of `mass` and `kappa` is `Some`.
    #[must_use]
    pub fn from_options(mass: Option<f64>, kappa: Option<f64>) -> Self {
        match (mass, kappa) {
            (Some(m), None) => Self::Mass(m),
            (None, Some(k)) => Self::Kappa(k),
            _ => panic!("give exactly one of mass and kappa"),
        }
    }

    /// κ = 1 / (2(m + 4)).
    #[must_use]
    pub fn kappa(self) -> f64 {
        match self {
            Self::Mass(m) => 1.0 / (2.0 * (m + 4.0)),
            Self::Kappa(k) => k,
        }
    }

    /// m = 1/(2κ) − 4.
    #[must_use]
    pub fn mass(self) -> f64 {
        match self {
            Self::Mass(m) => m,
            Self::Kappa(k) => 1.0 / (2.0 * k) - 4.0,
        }
    }
}

/// Wilson fermion matrix over a fixed gauge background.
#[derive(Debug)]
pub struct WilsonFermion {
    gauge: Arc<GaugeField>,
    udag: Vec<Lattice>,
    kappa: f64,
}

impl WilsonFermion {
    /// Bind to `gauge`; the link daggers are computed once here.
    #[must_use]
    #[instrument(skip_all, level = "debug", fields(kappa = mass.kappa()))]
    pub fn new(gauge: &Arc<GaugeField>, mass: FermionMass) -> Self {
        let udag = gauge.links().iter().map(Lattice::adjoint).collect();
        Self {
            gauge: Arc::clone(gauge),
            udag,
            kappa: mass.kappa(),
        }
    }

    /// Hopping parameter κ.
    #[must_use]
    pub const fn kappa(&self) -> f64 {
        self.kappa
    }

    /// Gauge background.
    #[must_use]
    pub const fn gauge(&self) -> &Arc<GaugeField> {
        &self.gauge
    }

    fn check(&self, src: &Lattice, dst: &Lattice) {
        assert_eq!(src.otype(), ObjectType::WilsonSpinor, "Wilson matrix acts on spinor fields");
        assert!(
            src.grid().same_as(self.gauge.grid()),
            "spinor and gauge links live on different grids"
        );
        assert!(
            dst.grid().same_as(src.grid())
                && dst.otype() == src.otype()
                && dst.checkerboard() == src.checkerboard(),
            "destination does not match the source field"
        );
    }

    /// Nearest-neighbour hopping term.
    ///
    /// # Panics
    ///
    /// If `src` is not a spinor on the links' grid or `dst` differs in shape.
    pub fn meooe(&self, src: &Lattice, dst: &mut Lattice) {
        self.check(src, dst);
        dst.zero();
        for mu in 0..N_DIM {
            let g = gamma(mu);
            let u = self.gauge.link_field(mu);

            let sp = u * &src.cshift(mu, 1);
            let gsp = g.apply(&sp);
            *dst += &(&(&gsp * 0.5) - &(&sp * 0.5));

            let sm = (&self.udag[mu] * src).cshift(mu, -1);
            let gsm = g.apply(&sm);
            *dst += &(&(&gsm * -0.5) - &(&sm * 0.5));
        }
    }

    /// Site-local diagonal term `src / (2κ)`.
    ///
    /// # Panics
    ///
    /// As for [`Self::meooe`].
    pub fn mooee(&self, src: &Lattice, dst: &mut Lattice) {
        self.check(src, dst);
        dst.assign(&(src * (1.0 / (2.0 * self.kappa))));
    }

    /// Full matrix `Mooee + Meooe`.
    ///
    /// # Panics
    ///
    /// As for [`Self::meooe`].
    pub fn m(&self, src: &Lattice, dst: &mut Lattice) {
        let mut hop = src.like();
        self.mooee(src, dst);
        self.meooe(src, &mut hop);
        *dst += &hop;
    }

    /// Hermitian form γ5 M.
    ///
    /// # Panics
    ///
    /// As for [`Self::meooe`].
    pub fn g5m(&self, src: &Lattice, dst: &mut Lattice) {
        self.m(src, dst);
        GAMMA_5.apply_in_place(dst);
    }

    /// M as an operator on spinor fields, with adjoint γ5 M γ5.
    #[must_use]
    pub fn operator(self: &Arc<Self>) -> MatrixOperator {
        let fwd = Arc::clone(self);
        let adj = Arc::clone(self);
        MatrixOperator::new(
            move |dst, src| fwd.m(src, dst),
            move |dst, src| {
                let g5src = GAMMA_5.apply(src);
                adj.m(&g5src, dst);
                GAMMA_5.apply_in_place(dst);
            },
        )
        .with_types(Some(ObjectType::WilsonSpinor), Some(ObjectType::WilsonSpinor))
    }
}

/// Point source: unit value at `spin`, `color` of site `x`.
///
/// # Panics
///
/// If `x` is not a stored site of the field's grid and checkerboard.
#[must_use]
pub fn point_source(grid: &Arc<Grid>, x: &[i64], spin: usize, color: usize) -> Lattice {
    let mut src = Lattice::wilson_spinor(grid);
    let mut site = [C_ZERO; N_SPINS * N_COLORS];
    site[spin * N_COLORS + color] = C_ONE;
    src.set(x, &site);
    src
}

#[cfg(test)]
mod tests {
    use num_complex::Complex64;

    use super::*;

    fn grid() -> Arc<Grid> {
        Arc::new(Grid::new(&[4, 4, 4, 4]).unwrap())
    }

    fn hot(seed: u64) -> (Arc<Grid>, Arc<GaugeField>) {
        let g = grid();
        let u = Arc::new(GaugeField::hot_start(&g, seed));
        (g, u)
    }

    #[test]
    fn kappa_mass_conversion() {
        assert!((FermionMass::Mass(0.0).kappa() - 0.125).abs() < 1e-15);
        assert!((FermionMass::Kappa(0.1).mass() - 1.0).abs() < 1e-14);
        let m = FermionMass::Mass(0.3);
        assert!((FermionMass::Kappa(m.kappa()).mass() - 0.3).abs() < 1e-14);
    }

    #[test]
    fn from_options_picks_one() {
        assert_eq!(FermionMass::from_options(Some(0.2), None), FermionMass::Mass(0.2));
        assert_eq!(FermionMass::from_options(None, Some(0.12)), FermionMass::Kappa(0.12));
    }

    #[test]
    #[should_panic(expected = "exactly one")]
    fn from_options_rejects_both() {
        let _ = FermionMass::from_options(Some(0.2), Some(0.12));
    }

    #[test]
    fn serde_rejects_both_keys() {
        let one: FermionMass = serde_json::from_str(r#"{"kappa": 0.125}"#).unwrap();
        assert_eq!(one, FermionMass::Kappa(0.125));
        assert!(serde_json::from_str::<FermionMass>(r#"{"mass": 0.0, "kappa": 0.1}"#).is_err());
    }

    #[test]
    fn free_field_stencil() {
        let g = grid();
        let u = Arc::new(GaugeField::cold_start(&g));
        let w = WilsonFermion::new(&u, FermionMass::Mass(0.0));
        let src = point_source(&g, &[0, 0, 0, 0], 0, 0);
        let mut dst = src.like();
        w.m(&src, &mut dst);

        let mut e0 = [Complex64::new(0.0, 0.0); 12];
        e0[0] = Complex64::new(1.0, 0.0);
        let mut expected = vec![vec![Complex64::new(0.0, 0.0); 12]; dst.sites()];
        expected[dst.site_index(&[0, 0, 0, 0])] = e0.iter().map(|&z| z * 4.0).collect();
        for mu in 0..4 {
            let mut ge0 = [Complex64::new(0.0, 0.0); 12];
            gamma(mu).apply_site(&mut ge0, &e0);
            let mut back = [0i64; 4];
            back[mu] = 3;
            let mut fwd = [0i64; 4];
            fwd[mu] = 1;
            expected[dst.site_index(&back)] =
                (0..12).map(|k| ge0[k] * 0.5 - e0[k] * 0.5).collect();
            expected[dst.site_index(&fwd)] =
                (0..12).map(|k| ge0[k] * -0.5 - e0[k] * 0.5).collect();
        }
        for (i, want) in expected.iter().enumerate() {
            for (got, w) in dst.site(i).iter().zip(want) {
                assert!((got - w).norm() < 1e-15, "site {:?}", dst.site_coordinate(i));
            }
        }
    }

    #[test]
    fn m_is_sum_of_parts_bitwise() {
        let (g, u) = hot(5);
        let w = WilsonFermion::new(&u, FermionMass::Kappa(0.12));
        let mut seed = 17u64;
        let src = Lattice::random(&g, ObjectType::WilsonSpinor, &mut seed);
        let mut full = src.like();
        let mut hop = src.like();
        let mut diag = src.like();
        w.m(&src, &mut full);
        w.meooe(&src, &mut hop);
        w.mooee(&src, &mut diag);
        assert_eq!(full.data(), (&diag + &hop).data());
    }

    #[test]
    fn g5m_is_hermitian() {
        let (g, u) = hot(11);
        let w = WilsonFermion::new(&u, FermionMass::Mass(0.1));
        let mut seed = 23u64;
        let a = Lattice::random(&g, ObjectType::WilsonSpinor, &mut seed);
        let b = Lattice::random(&g, ObjectType::WilsonSpinor, &mut seed);
        let mut ga = a.like();
        let mut gb = b.like();
        w.g5m(&a, &mut ga);
        w.g5m(&b, &mut gb);
        let lhs = a.inner_product(&gb);
        let rhs = ga.inner_product(&b);
        assert!((lhs - rhs).norm() < 1e-10 * lhs.norm().max(1.0), "{lhs} vs {rhs}");
    }

    #[test]
    fn operator_adjoint_is_dagger() {
        let (g, u) = hot(3);
        let w = Arc::new(WilsonFermion::new(&u, FermionMass::Mass(0.2)));
        let op = w.operator();
        let mut seed = 2u64;
        let a = Lattice::random(&g, ObjectType::WilsonSpinor, &mut seed);
        let b = Lattice::random(&g, ObjectType::WilsonSpinor, &mut seed);
        let lhs = a.inner_product(&op.apply(&b));
        let rhs = op.adj().apply(&a).inner_product(&b);
        assert!((lhs - rhs).norm() < 1e-10 * lhs.norm().max(1.0));
    }

    #[test]
    fn free_constant_spinor_sees_only_mass() {
        let g = grid();
        let u = Arc::new(GaugeField::cold_start(&g));
        let w = WilsonFermion::new(&u, FermionMass::Mass(0.25));
        let mut src = Lattice::wilson_spinor(&g);
        for i in 0..src.sites() {
            src.site_mut(i)[7] = Complex64::new(1.0, -2.0);
        }
        let mut dst = src.like();
        w.m(&src, &mut dst);
        for (a, b) in dst.data().iter().zip(src.data()) {
            assert!((a - *b * 0.25).norm() < 1e-14);
        }
    }

    #[test]
    #[should_panic(expected = "does not match")]
    fn mismatched_destination_panics() {
        let (g, u) = hot(1);
        let w = WilsonFermion::new(&u, FermionMass::Mass(0.0));
        let src = Lattice::wilson_spinor(&g);
        let mut dst = Lattice::complex(&g);
        w.mooee(&src, &mut dst);
    }

    #[test]
    #[should_panic(expected = "different grids")]
    fn foreign_grid_panics() {
        let (_, u) = hot(1);
        let w = WilsonFermion::new(&u, FermionMass::Mass(0.0));
        let other = grid();
        let src = Lattice::wilson_spinor(&other);
        let mut dst = src.like();
        w.meooe(&src, &mut dst);
    }
}
