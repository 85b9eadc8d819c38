// SPDX-License-Identifier: AGPL-3.0-only

//! Complex lattice fields and their elementwise algebra.
//!
//! A [`Lattice`] holds the local sites of one process, site-major, with a
//! fixed number of complex components per site set by its [`ObjectType`].
//! The storage index of a site is the lexicographic index (dimension 0
//! fastest) of its reduced local coordinate `(x_i − top_i) / cbf_i`, so a
//! checkerboarded field stores exactly its own parity and storage order
//! equals [`Order::Lexicographic`](super::coordinates::Order) enumeration.
//!
//! | Object type | Components | Layout |
//! |-------------|-----------|--------|
//! | `Complex` | 1 | scalar |
//! | `ColorMatrix` | 9 | row-major 3×3 |
//! | `WilsonSpinor` | 12 | spin-major, `s × 3 + c` |
//!
//! Binary operations require the same grid identity, checkerboard and
//! (where relevant) object type; violations are caller bugs and panic.

use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use std::sync::Arc;

use num_complex::Complex64;
use rayon::prelude::*;

use super::constants::{lcg_complex, C_ZERO, N_COLORS, N_SPINS};
use super::coordinates::LocalCoordinates;
use super::grid::{Checkerboard, Grid};
use super::su3::Su3Matrix;

/// Element type of a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectType {
    /// One complex number per site.
    Complex,
    /// A 3×3 colour matrix per site.
    ColorMatrix,
    /// A 4-spin × 3-colour spinor per site.
    WilsonSpinor,
}

impl ObjectType {
    /// Complex components per site.
    #[must_use]
    pub const fn components(self) -> usize {
        match self {
            Self::Complex => 1,
            Self::ColorMatrix => N_COLORS * N_COLORS,
            Self::WilsonSpinor => N_SPINS * N_COLORS,
        }
    }
}

/// Index arithmetic of one grid and checkerboard.
#[derive(Clone, Copy)]
struct SiteLayout<'a> {
    grid: &'a Grid,
    cb: Checkerboard,
}

impl SiteLayout<'_> {
    fn top(&self, d: usize) -> i64 {
        (self.grid.processor_coor()[d] * self.grid.ldimensions()[d] * self.grid.cb_factor(d)) as i64
    }

    fn index_of(&self, x: &[i64]) -> usize {
        let g = self.grid;
        assert_eq!(x.len(), g.nd(), "coordinate rank differs from grid");
        let mut idx = 0;
        let mut stride = 1;
        for (d, &xd) in x.iter().enumerate() {
            let l = g.ldimensions()[d];
            let cbf = g.cb_factor(d);
            let off = xd - self.top(d);
            assert!(
                off >= 0 && (off as usize) < l * cbf,
                "coordinate {x:?} outside the local box"
            );
            idx += (off as usize / cbf) * stride;
            stride *= l;
        }
        if let Some(p) = self.cb.parity() {
            let s: i64 = x
                .iter()
                .zip(g.cb_mask())
                .filter(|(_, &m)| m)
                .map(|(&v, _)| v)
                .sum();
            assert_eq!(s.rem_euclid(2), p, "coordinate {x:?} on the wrong checkerboard");
        }
        idx
    }

    fn coordinate_of(&self, mut idx: usize) -> Vec<i64> {
        let g = self.grid;
        let nd = g.nd();
        let mut x = Vec::with_capacity(nd);
        for d in 0..nd {
            let l = g.ldimensions()[d];
            x.push(self.top(d) + ((idx % l) * g.cb_factor(d)) as i64);
            idx /= l;
        }
        if let Some(p) = self.cb.parity() {
            let s: i64 = x
                .iter()
                .zip(g.cb_mask())
                .filter(|(_, &m)| m)
                .map(|(&v, _)| v)
                .sum();
            if s.rem_euclid(2) != p {
                if let Some(d) = (0..nd).find(|&d| g.cb_factor(d) == 2) {
                    x[d] += 1;
                }
            }
        }
        x
    }
}

/// Complex field over the local sites of a grid.
#[derive(Clone, Debug)]
pub struct Lattice {
    grid: Arc<Grid>,
    cb: Checkerboard,
    otype: ObjectType,
    data: Vec<Complex64>,
}

fn assert_checkerboard_fits(grid: &Grid, cb: Checkerboard) {
    if grid.is_checkerboarded() {
        assert_ne!(cb, Checkerboard::None, "red-black grid field needs a parity");
    } else {
        assert_eq!(cb, Checkerboard::None, "full grid field cannot carry a parity");
    }
}

impl Lattice {
    /// Zero field; red-black grids start on the even checkerboard.
    #[must_use]
    pub fn new(grid: &Arc<Grid>, otype: ObjectType) -> Self {
        let cb = if grid.is_checkerboarded() {
            Checkerboard::Even
        } else {
            Checkerboard::None
        };
        Self::with_checkerboard(grid, otype, cb)
    }

    /// Zero field on an explicit checkerboard.
    ///
    /// # Panics
    ///
    /// If `cb` does not fit the grid's checkerboarding.
    #[must_use]
    pub fn with_checkerboard(grid: &Arc<Grid>, otype: ObjectType, cb: Checkerboard) -> Self {
        assert_checkerboard_fits(grid, cb);
        Self {
            grid: Arc::clone(grid),
            cb,
            otype,
            data: vec![C_ZERO; grid.local_volume() * otype.components()],
        }
    }

    /// Zero `Complex` field.
    #[must_use]
    pub fn complex(grid: &Arc<Grid>) -> Self {
        Self::new(grid, ObjectType::Complex)
    }

    /// Zero `ColorMatrix` field.
    #[must_use]
    pub fn color_matrix(grid: &Arc<Grid>) -> Self {
        Self::new(grid, ObjectType::ColorMatrix)
    }

    /// Zero `WilsonSpinor` field.
    #[must_use]
    pub fn wilson_spinor(grid: &Arc<Grid>) -> Self {
        Self::new(grid, ObjectType::WilsonSpinor)
    }

    /// Field of uniform LCG components in [−0.5, 0.5) + i[−0.5, 0.5).
    #[must_use]
    pub fn random(grid: &Arc<Grid>, otype: ObjectType, seed: &mut u64) -> Self {
        let mut f = Self::new(grid, otype);
        for z in &mut f.data {
            *z = lcg_complex(seed);
        }
        f
    }

    /// Zero field with this field's grid, checkerboard and type.
    #[must_use]
    pub fn like(&self) -> Self {
        Self::with_checkerboard(&self.grid, self.otype, self.cb)
    }

    /// Zero field like this one but of another element type.
    #[must_use]
    pub fn like_typed(&self, otype: ObjectType) -> Self {
        Self::with_checkerboard(&self.grid, otype, self.cb)
    }

    /// Grid the field lives on.
    #[must_use]
    pub const fn grid(&self) -> &Arc<Grid> {
        &self.grid
    }

    /// Checkerboard of the stored sites.
    #[must_use]
    pub const fn checkerboard(&self) -> Checkerboard {
        self.cb
    }

    /// Relabel the stored parity.
    ///
    /// # Panics
    ///
    /// If `cb` does not fit the grid's checkerboarding.
    pub fn set_checkerboard(&mut self, cb: Checkerboard) {
        assert_checkerboard_fits(&self.grid, cb);
        self.cb = cb;
    }

    /// Element type.
    #[must_use]
    pub const fn otype(&self) -> ObjectType {
        self.otype
    }

    /// Complex components per site.
    #[must_use]
    pub const fn components(&self) -> usize {
        self.otype.components()
    }

    /// Number of stored sites.
    #[must_use]
    pub fn sites(&self) -> usize {
        self.data.len() / self.components()
    }

    /// Site-major storage.
    #[must_use]
    pub fn data(&self) -> &[Complex64] {
        &self.data
    }

    /// Mutable site-major storage.
    pub fn data_mut(&mut self) -> &mut [Complex64] {
        &mut self.data
    }

    /// Components of storage site `idx`.
    #[must_use]
    pub fn site(&self, idx: usize) -> &[Complex64] {
        let nc = self.components();
        &self.data[idx * nc..(idx + 1) * nc]
    }

    /// Mutable components of storage site `idx`.
    pub fn site_mut(&mut self, idx: usize) -> &mut [Complex64] {
        let nc = self.components();
        &mut self.data[idx * nc..(idx + 1) * nc]
    }

    fn layout(&self) -> SiteLayout<'_> {
        SiteLayout {
            grid: &self.grid,
            cb: self.cb,
        }
    }

    /// Storage index of global coordinate `x`.
    ///
    /// # Panics
    ///
    /// If `x` is outside this process's box or on the other parity.
    #[must_use]
    pub fn site_index(&self, x: &[i64]) -> usize {
        self.layout().index_of(x)
    }

    /// Global coordinate of storage site `idx`.
    #[must_use]
    pub fn site_coordinate(&self, idx: usize) -> Vec<i64> {
        self.layout().coordinate_of(idx)
    }

    /// Components at global coordinate `x`.
    #[must_use]
    pub fn get(&self, x: &[i64]) -> &[Complex64] {
        self.site(self.site_index(x))
    }

    /// Overwrite the components at global coordinate `x`.
    pub fn set(&mut self, x: &[i64], values: &[Complex64]) {
        let idx = self.site_index(x);
        self.site_mut(idx).copy_from_slice(values);
    }

    /// Set every listed site from `values`, `components()` values per site.
    ///
    /// # Panics
    ///
    /// If the value count does not match the coordinate count.
    pub fn set_coordinates(&mut self, x: &LocalCoordinates, values: &[Complex64]) {
        let nc = self.components();
        assert_eq!(values.len(), x.len() * nc, "value count differs from site count");
        for (row, v) in x.iter().zip(values.chunks_exact(nc)) {
            self.set(row, v);
        }
    }

    /// Components of every listed site, concatenated.
    #[must_use]
    pub fn get_coordinates(&self, x: &LocalCoordinates) -> Vec<Complex64> {
        x.iter().flat_map(|row| self.get(row).iter().copied()).collect()
    }

    /// Set every component to zero.
    pub fn zero(&mut self) {
        self.data.fill(C_ZERO);
    }

    /// Overwrite with `src` (grid and type must match; parity is copied).
    pub fn assign(&mut self, src: &Self) {
        assert!(self.grid.same_as(&src.grid), "assignment across grids");
        assert_eq!(self.otype, src.otype, "assignment across object types");
        self.cb = src.cb;
        self.data.copy_from_slice(&src.data);
    }

    fn assert_conformable(&self, other: &Self) {
        assert!(self.grid.same_as(&other.grid), "fields live on different grids");
        assert_eq!(self.cb, other.cb, "fields live on different checkerboards");
    }

    fn assert_same_shape(&self, other: &Self) {
        self.assert_conformable(other);
        assert_eq!(self.otype, other.otype, "fields differ in object type");
    }

    /// `self += a · x`
    pub fn axpy(&mut self, a: Complex64, x: &Self) {
        self.assert_same_shape(x);
        self.data
            .par_iter_mut()
            .zip(x.data.par_iter())
            .for_each(|(y, &xv)| *y += a * xv);
    }

    /// Every component multiplied by `s`.
    #[must_use]
    pub fn scale(&self, s: Complex64) -> Self {
        let mut out = self.clone();
        out.data.par_iter_mut().for_each(|z| *z *= s);
        out
    }

    /// Per-site adjoint: conjugate for `Complex`, dagger for `ColorMatrix`.
    ///
    /// # Panics
    ///
    /// For spinor fields, which have no site-local adjoint.
    #[must_use]
    pub fn adjoint(&self) -> Self {
        let mut out = self.clone();
        match self.otype {
            ObjectType::Complex => out.data.par_iter_mut().for_each(|z| *z = z.conj()),
            ObjectType::ColorMatrix => out.data.par_chunks_mut(9).for_each(|site| {
                Su3Matrix::from_components(site)
                    .adjoint()
                    .write_components(site);
            }),
            ObjectType::WilsonSpinor => panic!("spinor fields have no site-local adjoint"),
        }
        out
    }

    /// Where-style select: `if_true` at sites whose `mask` value satisfies
    /// `predicate`, `if_false` elsewhere.
    ///
    /// # Panics
    ///
    /// If `mask` is not `Complex` or the fields are not conformable.
    #[must_use]
    pub fn select<P>(mask: &Self, predicate: P, if_true: &Self, if_false: &Self) -> Self
    where
        P: Fn(Complex64) -> bool + Sync,
    {
        assert_eq!(mask.otype, ObjectType::Complex, "select mask must be complex");
        mask.assert_conformable(if_true);
        if_true.assert_same_shape(if_false);
        let nc = if_true.components();
        let mut out = if_true.like();
        out.data
            .par_chunks_mut(nc)
            .zip(mask.data.par_iter())
            .zip(if_true.data.par_chunks(nc).zip(if_false.data.par_chunks(nc)))
            .for_each(|((o, &m), (t, f))| {
                o.copy_from_slice(if predicate(m) { t } else { f });
            });
        out
    }

    /// Periodic shift: `result(x) = self(x + offset ê_dim)`.
    ///
    /// Odd shifts along a masked dimension of a red-black grid land on the
    /// opposite checkerboard.
    ///
    /// # Panics
    ///
    /// On multi-process grids, whose neighbour data is not local.
    #[must_use]
    pub fn cshift(&self, dim: usize, offset: i64) -> Self {
        assert!(self.grid.is_single_process(), "cshift needs a single-process grid");
        assert!(dim < self.grid.nd(), "shift dimension {dim} out of range");
        let extent = self.grid.fdimensions()[dim] as i64;
        let flips =
            self.grid.is_checkerboarded() && self.grid.cb_mask()[dim] && offset.rem_euclid(2) == 1;
        let cb = if flips { self.cb.inverse() } else { self.cb };

        let nc = self.components();
        let src = self.layout();
        let dst = SiteLayout {
            grid: &self.grid,
            cb,
        };
        let mut data = vec![C_ZERO; self.data.len()];
        data.par_chunks_mut(nc).enumerate().for_each(|(idx, site)| {
            let mut x = dst.coordinate_of(idx);
            x[dim] = (x[dim] + offset).rem_euclid(extent);
            let from = src.index_of(&x);
            site.copy_from_slice(&self.data[from * nc..(from + 1) * nc]);
        });
        Self {
            grid: Arc::clone(&self.grid),
            cb,
            otype: self.otype,
            data,
        }
    }

    /// ⟨self, other⟩ = Σ conj(self) · other over all components.
    #[must_use]
    pub fn inner_product(&self, other: &Self) -> Complex64 {
        self.assert_same_shape(other);
        self.data
            .par_iter()
            .zip(other.data.par_iter())
            .map(|(a, b)| a.conj() * b)
            .sum()
    }

    /// Σ |component|².
    #[must_use]
    pub fn norm2(&self) -> f64 {
        self.data.par_iter().map(Complex64::norm_sqr).sum()
    }

    fn zip_sites<K>(&self, rhs: &Self, otype: ObjectType, kernel: K) -> Self
    where
        K: Fn(&mut [Complex64], &[Complex64], &[Complex64]) + Sync + Send,
    {
        self.assert_conformable(rhs);
        let mut out = self.like_typed(otype);
        out.data
            .par_chunks_mut(otype.components())
            .zip(self.data.par_chunks(self.components()))
            .zip(rhs.data.par_chunks(rhs.components()))
            .for_each(|((o, a), b)| kernel(o, a, b));
        out
    }

    /// Site-local product `self · rhs`.
    ///
    /// Supported: `Complex` × any, any × `Complex`, `ColorMatrix` ×
    /// `ColorMatrix`, `ColorMatrix` × `WilsonSpinor`.
    ///
    /// # Panics
    ///
    /// For any other type pair or non-conformable fields.
    #[must_use]
    pub fn product(&self, rhs: &Self) -> Self {
        match (self.otype, rhs.otype) {
            (ObjectType::Complex, t) => self.zip_sites(rhs, t, |o, a, b| {
                for (oc, bc) in o.iter_mut().zip(b) {
                    *oc = a[0] * bc;
                }
            }),
            (t, ObjectType::Complex) => self.zip_sites(rhs, t, |o, a, b| {
                for (oc, ac) in o.iter_mut().zip(a) {
                    *oc = ac * b[0];
                }
            }),
            (ObjectType::ColorMatrix, ObjectType::ColorMatrix) => {
                self.zip_sites(rhs, ObjectType::ColorMatrix, |o, a, b| {
                    (Su3Matrix::from_components(a) * Su3Matrix::from_components(b))
                        .write_components(o);
                })
            }
            (ObjectType::ColorMatrix, ObjectType::WilsonSpinor) => {
                self.zip_sites(rhs, ObjectType::WilsonSpinor, |o, a, b| {
                    let u = Su3Matrix::from_components(a);
                    for s in 0..N_SPINS {
                        let v = [b[3 * s], b[3 * s + 1], b[3 * s + 2]];
                        o[3 * s..3 * s + 3].copy_from_slice(&u.mul_vec(&v));
                    }
                })
            }
            (a, b) => panic!("unsupported field product {a:?} × {b:?}"),
        }
    }

    fn zip_elements<K>(&self, rhs: &Self, kernel: K) -> Self
    where
        K: Fn(Complex64, Complex64) -> Complex64 + Sync + Send,
    {
        self.assert_same_shape(rhs);
        let mut out = self.like();
        out.data
            .par_iter_mut()
            .zip(self.data.par_iter().zip(rhs.data.par_iter()))
            .for_each(|(o, (&a, &b))| *o = kernel(a, b));
        out
    }
}

impl Add for &Lattice {
    type Output = Lattice;
    fn add(self, rhs: Self) -> Lattice {
        self.zip_elements(rhs, |a, b| a + b)
    }
}

impl Sub for &Lattice {
    type Output = Lattice;
    fn sub(self, rhs: Self) -> Lattice {
        self.zip_elements(rhs, |a, b| a - b)
    }
}

impl Mul for &Lattice {
    type Output = Lattice;
    fn mul(self, rhs: Self) -> Lattice {
        self.product(rhs)
    }
}

impl Mul<Complex64> for &Lattice {
    type Output = Lattice;
    fn mul(self, s: Complex64) -> Lattice {
        self.scale(s)
    }
}

impl Mul<f64> for &Lattice {
    type Output = Lattice;
    fn mul(self, s: f64) -> Lattice {
        self.scale(Complex64::new(s, 0.0))
    }
}

impl Neg for &Lattice {
    type Output = Lattice;
    fn neg(self) -> Lattice {
        self.scale(Complex64::new(-1.0, 0.0))
    }
}

impl AddAssign<&Lattice> for Lattice {
    fn add_assign(&mut self, rhs: &Lattice) {
        self.assert_same_shape(rhs);
        self.data
            .par_iter_mut()
            .zip(rhs.data.par_iter())
            .for_each(|(a, &b)| *a += b);
    }
}

impl SubAssign<&Lattice> for Lattice {
    fn sub_assign(&mut self, rhs: &Lattice) {
        self.assert_same_shape(rhs);
        self.data
            .par_iter_mut()
            .zip(rhs.data.par_iter())
            .for_each(|(a, &b)| *a -= b);
    }
}
