// SPDX-License-Identifier: AGPL-3.0-only

//! Local coordinate enumeration under checkerboarding.
//!
//! A process owns the box `[top, bottom)` of the full lattice, with
//!
//!   `top_i = processor_coor_i × ldim_i × cbf_i`,  `bottom_i = top_i + ldim_i × cbf_i`
//!
//! where `cbf_i = fdim_i / gdim_i` undoes the red-black halving. A
//! checkerboarded subject keeps only the sites whose masked coordinate sum
//! has the tag's parity, so each local box holds `ldim` sites per parity.
//!
//! Enumeration order is deterministic for a given `(view, order)`: field
//! values set from a coordinate set are matched positionally.
//!
//! Relative coordinates use the periodic minimal image
//!
//!   `r_i = ((x_i + L_i − o_i + ⌊L_i/2⌋) mod L_i) − ⌊L_i/2⌋`
//!
//! evaluated in integer arithmetic with a Euclidean modulo.

use num_complex::Complex64;
use tracing::instrument;

use super::field::{Lattice, ObjectType};
use super::grid::{Checkerboard, Grid};

/// Enumeration order of a coordinate set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Order {
    /// Dimension 0 varies fastest.
    #[default]
    Lexicographic,
    /// The last dimension varies fastest.
    ReverseLexicographic,
}

/// Rectangular region of the full lattice plus checkerboard selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CartesianView {
    /// Inclusive lower corner.
    pub top: Vec<i64>,
    /// Exclusive upper corner.
    pub bottom: Vec<i64>,
    /// Dimensions entering the parity sum.
    pub checker_dim_mask: Vec<bool>,
    /// Parity selection.
    pub cb: Checkerboard,
}

impl CartesianView {
    /// View from explicit corners.
    ///
    /// # Panics
    ///
    /// If the corner and mask lengths differ or `bottom < top` anywhere.
    #[must_use]
    pub fn new(top: &[i64], bottom: &[i64], checker_dim_mask: &[bool], cb: Checkerboard) -> Self {
        assert_eq!(top.len(), bottom.len(), "view corners differ in rank");
        assert_eq!(top.len(), checker_dim_mask.len(), "view mask differs in rank");
        assert!(
            top.iter().zip(bottom).all(|(t, b)| t <= b),
            "view bottom corner below top corner"
        );
        Self {
            top: top.to_vec(),
            bottom: bottom.to_vec(),
            checker_dim_mask: checker_dim_mask.to_vec(),
            cb,
        }
    }

    /// The local box this process owns on `grid`, restricted to `cb`.
    #[must_use]
    pub fn from_grid(grid: &Grid, cb: Checkerboard) -> Self {
        let nd = grid.nd();
        let mut top = Vec::with_capacity(nd);
        let mut bottom = Vec::with_capacity(nd);
        for d in 0..nd {
            let span = (grid.ldimensions()[d] * grid.cb_factor(d)) as i64;
            let t = grid.processor_coor()[d] as i64 * span;
            top.push(t);
            bottom.push(t + span);
        }
        Self {
            top,
            bottom,
            checker_dim_mask: grid.cb_mask().to_vec(),
            cb,
        }
    }

    /// Number of dimensions.
    #[must_use]
    pub fn nd(&self) -> usize {
        self.top.len()
    }

    /// Sum of the masked components of `x`.
    #[inline]
    #[must_use]
    pub fn masked_sum(&self, x: &[i64]) -> i64 {
        x.iter()
            .zip(&self.checker_dim_mask)
            .filter(|(_, &m)| m)
            .map(|(&v, _)| v)
            .sum()
    }

    /// Whether `x` lies in the box and has the selected parity.
    #[must_use]
    pub fn contains(&self, x: &[i64]) -> bool {
        x.len() == self.nd()
            && x.iter()
                .zip(self.top.iter().zip(&self.bottom))
                .all(|(&v, (&t, &b))| t <= v && v < b)
            && self.cb.contains(self.masked_sum(x))
    }

    /// Enumerate the sites of this view.
    #[must_use]
    pub fn coordinates(&self, order: Order) -> LocalCoordinates {
        enumerate_view(self, order)
    }
}

/// Ordered coordinate tuples owned by this process.
///
/// Stored flat, `nd` integers per site.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalCoordinates {
    nd: usize,
    data: Vec<i64>,
}

impl LocalCoordinates {
    /// Wrap `nd`-tuples stored back to back.
    ///
    /// # Panics
    ///
    /// If `nd` is zero or does not divide `data.len()`.
    #[must_use]
    pub fn from_flat(nd: usize, data: Vec<i64>) -> Self {
        assert!(nd > 0, "coordinates need at least one dimension");
        assert_eq!(data.len() % nd, 0, "flat coordinate data is ragged");
        Self { nd, data }
    }

    /// Number of dimensions per tuple.
    #[must_use]
    pub const fn nd(&self) -> usize {
        self.nd
    }

    /// Number of sites.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len() / self.nd
    }

    /// Whether no site is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Coordinate tuple of site `i`.
    #[must_use]
    pub fn row(&self, i: usize) -> &[i64] {
        &self.data[i * self.nd..(i + 1) * self.nd]
    }

    /// Iterate over coordinate tuples in order.
    pub fn iter(&self) -> std::slice::ChunksExact<'_, i64> {
        self.data.chunks_exact(self.nd)
    }

    /// Backing storage.
    #[must_use]
    pub fn as_flat(&self) -> &[i64] {
        &self.data
    }
}

impl std::ops::Index<usize> for LocalCoordinates {
    type Output = [i64];
    fn index(&self, i: usize) -> &[i64] {
        self.row(i)
    }
}

impl<'a> IntoIterator for &'a LocalCoordinates {
    type Item = &'a [i64];
    type IntoIter = std::slice::ChunksExact<'a, i64>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// What coordinates can be generated from.
#[derive(Clone, Copy, Debug)]
pub enum CoordinateSubject<'a> {
    /// A grid without checkerboarding.
    Grid(&'a Grid),
    /// A grid restricted to one checkerboard.
    GridCheckerboard(&'a Grid, Checkerboard),
    /// A field: its grid and its own checkerboard.
    Field(&'a Lattice),
    /// An explicit view.
    View(&'a CartesianView),
}

impl<'a> From<&'a Grid> for CoordinateSubject<'a> {
    fn from(g: &'a Grid) -> Self {
        Self::Grid(g)
    }
}

impl<'a> From<(&'a Grid, Checkerboard)> for CoordinateSubject<'a> {
    fn from((g, cb): (&'a Grid, Checkerboard)) -> Self {
        Self::GridCheckerboard(g, cb)
    }
}

impl<'a> From<&'a Lattice> for CoordinateSubject<'a> {
    fn from(f: &'a Lattice) -> Self {
        Self::Field(f)
    }
}

impl<'a> From<&'a CartesianView> for CoordinateSubject<'a> {
    fn from(v: &'a CartesianView) -> Self {
        Self::View(v)
    }
}

impl CoordinateSubject<'_> {
    /// The view this subject describes.
    ///
    /// # Panics
    ///
    /// A bare red-black grid has no parity of its own and is rejected.
    #[must_use]
    pub fn view(&self) -> CartesianView {
        match *self {
            Self::Grid(g) => {
                assert!(
                    !g.is_checkerboarded(),
                    "red-black grid needs an explicit checkerboard"
                );
                CartesianView::from_grid(g, Checkerboard::None)
            }
            Self::GridCheckerboard(g, cb) => CartesianView::from_grid(g, cb),
            Self::Field(f) => CartesianView::from_grid(f.grid(), f.checkerboard()),
            Self::View(v) => v.clone(),
        }
    }
}

/// Local coordinates of `subject` in the requested order.
#[must_use]
pub fn coordinates<'a>(subject: impl Into<CoordinateSubject<'a>>, order: Order) -> LocalCoordinates {
    enumerate_view(&subject.into().view(), order)
}

#[instrument(skip_all, level = "debug", fields(nd = view.nd(), cb = ?view.cb))]
fn enumerate_view(view: &CartesianView, order: Order) -> LocalCoordinates {
    let nd = view.nd();
    let extent: Vec<usize> = view
        .top
        .iter()
        .zip(&view.bottom)
        .map(|(&t, &b)| (b - t) as usize)
        .collect();
    let total: usize = extent.iter().product();
    let dims: Vec<usize> = match order {
        Order::Lexicographic => (0..nd).collect(),
        Order::ReverseLexicographic => (0..nd).rev().collect(),
    };

    let mut data = Vec::with_capacity(if view.cb == Checkerboard::None {
        total * nd
    } else {
        total * nd / 2 + nd
    });
    let mut x = vec![0_i64; nd];
    for mut idx in 0..total {
        for &d in &dims {
            x[d] = view.top[d] + (idx % extent[d]) as i64;
            idx /= extent[d];
        }
        if view.cb.contains(view.masked_sum(&x)) {
            data.extend_from_slice(&x);
        }
    }
    LocalCoordinates { nd: nd.max(1), data }
}

/// Minimal-image displacement of one component.
#[inline]
#[must_use]
pub const fn minimal_image(x: i64, origin: i64, extent: i64) -> i64 {
    let half = extent / 2;
    (x + extent - origin + half).rem_euclid(extent) - half
}

/// Minimal-image displacement of every tuple in `x` from `origin`.
///
/// # Panics
///
/// If `origin` or `extent` differ from the tuple rank.
#[must_use]
pub fn relative_coordinates(x: &LocalCoordinates, origin: &[i64], extent: &[usize]) -> LocalCoordinates {
    assert_eq!(origin.len(), x.nd(), "origin rank differs from coordinates");
    assert_eq!(extent.len(), x.nd(), "extent rank differs from coordinates");
    let nd = x.nd();
    let data = x
        .as_flat()
        .iter()
        .enumerate()
        .map(|(k, &v)| minimal_image(v, origin[k % nd], extent[k % nd] as i64))
        .collect();
    LocalCoordinates { nd, data }
}

/// Write a real per-site mask into a `Complex` field in coordinate order.
///
/// # Panics
///
/// If the field is not `Complex` or `mask` does not hold one value per site.
pub fn coordinate_mask(field: &mut Lattice, mask: &[f64]) {
    assert_eq!(
        field.otype(),
        ObjectType::Complex,
        "coordinate mask needs a complex field"
    );
    let x = coordinates(&*field, Order::Lexicographic);
    assert_eq!(mask.len(), x.len(), "mask length differs from site count");
    let precision = field.grid().precision();
    let values: Vec<Complex64> = mask
        .iter()
        .map(|&m| precision.round(Complex64::new(m, 0.0)))
        .collect();
    field.set_coordinates(&x, &values);
}
