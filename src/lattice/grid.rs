// SPDX-License-Identifier: AGPL-3.0-only

//! Cartesian grid topology: global shape, process layout, checkerboarding.
//!
//! A grid describes the full lattice (`fdimensions`), how it is split over a
//! process layout (`mpi`, `processor_coor`), and whether fields on it hold
//! every site (`Full`) or one parity class (`RedBlack`). For red-black grids
//! the first dimension participating in the checkerboard mask is halved:
//!
//! | Quantity | Full | Red-black |
//! |----------|------|-----------|
//! | `gdimensions[d]` | `fdim[d]` | `fdim[d] / 2` on the first masked `d` |
//! | `ldimensions[d]` | `gdim[d] / mpi[d]` | same |
//! | `cb_factor(d)` | 1 | 2 on the halved dimension |
//!
//! Grids are immutable after construction. Each constructed grid gets a
//! process-unique [`GridId`]; clones share it.

use std::sync::atomic::{AtomicU64, Ordering};

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::LatticeError;

static NEXT_GRID_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a constructed grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridId(u64);

/// Numeric width used when materializing coordinate-derived data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    /// Complex values stored as two `f32`.
    Single,
    /// Complex values stored as two `f64`.
    #[default]
    Double,
}

impl Precision {
    /// Round a value to this storage width.
    #[inline]
    #[must_use]
    pub fn round(self, z: Complex64) -> Complex64 {
        match self {
            Self::Single => Complex64::new(f64::from(z.re as f32), f64::from(z.im as f32)),
            Self::Double => z,
        }
    }
}

/// Checkerboard tag of a field or coordinate set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Checkerboard {
    /// Every site.
    #[default]
    None,
    /// Sites with even masked coordinate sum.
    Even,
    /// Sites with odd masked coordinate sum.
    Odd,
}

impl Checkerboard {
    /// Required value of (Σ masked coordinates) mod 2, if any.
    #[must_use]
    pub const fn parity(self) -> Option<i64> {
        match self {
            Self::None => None,
            Self::Even => Some(0),
            Self::Odd => Some(1),
        }
    }

    /// The opposite parity (`None` stays `None`).
    #[must_use]
    pub const fn inverse(self) -> Self {
        match self {
            Self::None => Self::None,
            Self::Even => Self::Odd,
            Self::Odd => Self::Even,
        }
    }

    /// Whether a site with the given masked coordinate sum belongs here.
    #[inline]
    #[must_use]
    pub const fn contains(self, masked_sum: i64) -> bool {
        match self.parity() {
            None => true,
            Some(p) => masked_sum.rem_euclid(2) == p,
        }
    }
}

/// Whether fields on a grid store all sites or one parity class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Checkerboarding {
    /// One field holds every site.
    #[default]
    Full,
    /// One field holds either the even or the odd sites.
    RedBlack,
}

/// Serializable description of a grid layout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Global lattice extent per dimension.
    pub fdimensions: Vec<usize>,
    /// Full or red-black storage.
    #[serde(default)]
    pub checkerboarding: Checkerboarding,
    /// Dimensions participating in the even/odd split (default: all).
    #[serde(default)]
    pub cb_mask: Option<Vec<bool>>,
    /// Process layout (default: one process per dimension).
    #[serde(default)]
    pub mpi: Option<Vec<usize>>,
    /// This process's coordinate in the layout (default: origin).
    #[serde(default)]
    pub processor_coor: Option<Vec<usize>>,
    /// Storage width for coordinate-derived data.
    #[serde(default)]
    pub precision: Precision,
}

impl GridSpec {
    /// Full single-process layout of the given extent.
    #[must_use]
    pub fn new(fdimensions: &[usize]) -> Self {
        Self {
            fdimensions: fdimensions.to_vec(),
            checkerboarding: Checkerboarding::Full,
            cb_mask: None,
            mpi: None,
            processor_coor: None,
            precision: Precision::Double,
        }
    }

    /// Switch to red-black storage.
    #[must_use]
    pub fn red_black(mut self) -> Self {
        self.checkerboarding = Checkerboarding::RedBlack;
        self
    }

    /// Restrict the checkerboard to the masked dimensions.
    #[must_use]
    pub fn with_cb_mask(mut self, mask: &[bool]) -> Self {
        self.cb_mask = Some(mask.to_vec());
        self
    }

    /// Place this process at `processor_coor` of the `mpi` layout.
    #[must_use]
    pub fn with_layout(mut self, mpi: &[usize], processor_coor: &[usize]) -> Self {
        self.mpi = Some(mpi.to_vec());
        self.processor_coor = Some(processor_coor.to_vec());
        self
    }

    /// Change the storage width.
    #[must_use]
    pub const fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    /// Validate the layout and construct the grid.
    pub fn build(&self) -> Result<Grid, LatticeError> {
        let nd = self.fdimensions.len();
        if nd == 0 {
            return Err(LatticeError::InvalidGrid("grid has no dimensions".into()));
        }
        if let Some(d) = self.fdimensions.iter().position(|&n| n == 0) {
            return Err(LatticeError::InvalidGrid(format!(
                "dimension {d} has zero extent"
            )));
        }

        let cb_mask = self.cb_mask.clone().unwrap_or_else(|| vec![true; nd]);
        let mpi = self.mpi.clone().unwrap_or_else(|| vec![1; nd]);
        let processor_coor = self.processor_coor.clone().unwrap_or_else(|| vec![0; nd]);
        for (name, len) in [
            ("cb_mask", cb_mask.len()),
            ("mpi", mpi.len()),
            ("processor_coor", processor_coor.len()),
        ] {
            if len != nd {
                return Err(LatticeError::InvalidGrid(format!(
                    "{name} has {len} entries for a {nd}-dimensional grid"
                )));
            }
        }

        let mut gdimensions = self.fdimensions.clone();
        if self.checkerboarding == Checkerboarding::RedBlack {
            let Some(cb_dim) = cb_mask.iter().position(|&m| m) else {
                return Err(LatticeError::InvalidGrid(
                    "red-black grid needs at least one masked dimension".into(),
                ));
            };
            for d in (0..nd).filter(|&d| cb_mask[d]) {
                if self.fdimensions[d] % 2 != 0 {
                    return Err(LatticeError::InvalidGrid(format!(
                        "checkerboarded dimension {d} has odd extent {}",
                        self.fdimensions[d]
                    )));
                }
            }
            gdimensions[cb_dim] /= 2;
        }

        let mut ldimensions = Vec::with_capacity(nd);
        for d in 0..nd {
            if mpi[d] == 0 || gdimensions[d] % mpi[d] != 0 {
                return Err(LatticeError::InvalidGrid(format!(
                    "dimension {d} of extent {} cannot be split over {} processes",
                    gdimensions[d], mpi[d]
                )));
            }
            if processor_coor[d] >= mpi[d] {
                return Err(LatticeError::InvalidGrid(format!(
                    "processor coordinate {} outside layout {} in dimension {d}",
                    processor_coor[d], mpi[d]
                )));
            }
            ldimensions.push(gdimensions[d] / mpi[d]);
        }

        Ok(Grid {
            id: GridId(NEXT_GRID_ID.fetch_add(1, Ordering::Relaxed)),
            fdimensions: self.fdimensions.clone(),
            gdimensions,
            ldimensions,
            cb_mask,
            checkerboarding: self.checkerboarding,
            mpi,
            processor_coor,
            precision: self.precision,
        })
    }
}

/// Immutable grid topology for this process.
#[derive(Clone, Debug)]
pub struct Grid {
    id: GridId,
    fdimensions: Vec<usize>,
    gdimensions: Vec<usize>,
    ldimensions: Vec<usize>,
    cb_mask: Vec<bool>,
    checkerboarding: Checkerboarding,
    mpi: Vec<usize>,
    processor_coor: Vec<usize>,
    precision: Precision,
}

impl Grid {
    /// Full, double precision, single-process grid.
    pub fn new(fdimensions: &[usize]) -> Result<Self, LatticeError> {
        GridSpec::new(fdimensions).build()
    }

    /// Red-black grid with the same shape, mask, layout and precision.
    pub fn red_black(&self) -> Result<Self, LatticeError> {
        self.respec(Checkerboarding::RedBlack).build()
    }

    /// Full grid with the same shape, mask, layout and precision.
    pub fn full(&self) -> Result<Self, LatticeError> {
        self.respec(Checkerboarding::Full).build()
    }

    fn respec(&self, checkerboarding: Checkerboarding) -> GridSpec {
        GridSpec {
            fdimensions: self.fdimensions.clone(),
            checkerboarding,
            cb_mask: Some(self.cb_mask.clone()),
            mpi: Some(self.mpi.clone()),
            processor_coor: Some(self.processor_coor.clone()),
            precision: self.precision,
        }
    }

    /// Identity shared by clones of this grid.
    #[must_use]
    pub const fn id(&self) -> GridId {
        self.id
    }

    /// Number of dimensions.
    #[must_use]
    pub fn nd(&self) -> usize {
        self.fdimensions.len()
    }

    /// Global full extent per dimension.
    #[must_use]
    pub fn fdimensions(&self) -> &[usize] {
        &self.fdimensions
    }

    /// Global extent per dimension after checkerboard halving.
    #[must_use]
    pub fn gdimensions(&self) -> &[usize] {
        &self.gdimensions
    }

    /// Local extent per dimension after checkerboard halving.
    #[must_use]
    pub fn ldimensions(&self) -> &[usize] {
        &self.ldimensions
    }

    /// Dimensions participating in the even/odd split.
    #[must_use]
    pub fn cb_mask(&self) -> &[bool] {
        &self.cb_mask
    }

    /// Full or red-black storage.
    #[must_use]
    pub const fn checkerboarding(&self) -> Checkerboarding {
        self.checkerboarding
    }

    /// Whether fields on this grid hold one parity class.
    #[must_use]
    pub fn is_checkerboarded(&self) -> bool {
        self.checkerboarding == Checkerboarding::RedBlack
    }

    /// Process layout.
    #[must_use]
    pub fn mpi(&self) -> &[usize] {
        &self.mpi
    }

    /// This process's coordinate in the layout.
    #[must_use]
    pub fn processor_coor(&self) -> &[usize] {
        &self.processor_coor
    }

    /// Whether the whole lattice lives on this process.
    #[must_use]
    pub fn is_single_process(&self) -> bool {
        self.mpi.iter().all(|&n| n == 1)
    }

    /// Storage width for coordinate-derived data.
    #[must_use]
    pub const fn precision(&self) -> Precision {
        self.precision
    }

    /// Ratio of full to checkerboarded extent in dimension `d`.
    #[must_use]
    pub fn cb_factor(&self, d: usize) -> usize {
        self.fdimensions[d] / self.gdimensions[d]
    }

    /// Number of sites one field stores on this process.
    #[must_use]
    pub fn local_volume(&self) -> usize {
        self.ldimensions.iter().product()
    }

    /// Number of sites of the full global lattice.
    #[must_use]
    pub fn global_volume(&self) -> usize {
        self.fdimensions.iter().product()
    }

    /// Same grid identity.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_grid_dimensions() {
        let g = Grid::new(&[4, 4, 4, 8]).unwrap();
        assert_eq!(g.gdimensions(), &[4, 4, 4, 8]);
        assert_eq!(g.ldimensions(), &[4, 4, 4, 8]);
        assert_eq!(g.local_volume(), 512);
        assert_eq!(g.global_volume(), 512);
        assert!(g.is_single_process());
        assert!(!g.is_checkerboarded());
        assert!((0..4).all(|d| g.cb_factor(d) == 1));
    }

    #[test]
    fn red_black_halves_first_masked_dimension() {
        let g = GridSpec::new(&[8, 4, 4, 4])
            .red_black()
            .with_cb_mask(&[false, true, true, true])
            .build()
            .unwrap();
        assert_eq!(g.gdimensions(), &[8, 2, 4, 4]);
        assert_eq!(g.cb_factor(1), 2);
        assert_eq!(g.cb_factor(0), 1);
        assert_eq!(g.local_volume(), 8 * 2 * 4 * 4);
    }

    #[test]
    fn layout_splits_local_dimensions() {
        let g = GridSpec::new(&[8, 8, 4, 4])
            .red_black()
            .with_layout(&[2, 1, 1, 2], &[1, 0, 0, 1])
            .build()
            .unwrap();
        assert_eq!(g.gdimensions(), &[4, 8, 4, 4]);
        assert_eq!(g.ldimensions(), &[2, 8, 4, 2]);
        assert!(!g.is_single_process());
    }

    #[test]
    fn invalid_layouts_are_rejected() {
        assert!(GridSpec::new(&[]).build().is_err());
        assert!(GridSpec::new(&[4, 0]).build().is_err());
        assert!(GridSpec::new(&[5, 4]).red_black().build().is_err());
        assert!(GridSpec::new(&[4, 4])
            .with_layout(&[3, 1], &[0, 0])
            .build()
            .is_err());
        assert!(GridSpec::new(&[4, 4])
            .with_layout(&[2, 1], &[2, 0])
            .build()
            .is_err());
        assert!(GridSpec::new(&[4, 4])
            .red_black()
            .with_cb_mask(&[false, false])
            .build()
            .is_err());
        assert!(GridSpec::new(&[4, 4]).with_cb_mask(&[true]).build().is_err());
    }

    #[test]
    fn clones_share_identity_rebuilds_do_not() {
        let g = Grid::new(&[4, 4]).unwrap();
        let c = g.clone();
        assert!(g.same_as(&c));
        let rb = g.red_black().unwrap();
        assert!(!g.same_as(&rb));
        assert_eq!(rb.full().unwrap().gdimensions(), g.gdimensions());
    }

    #[test]
    fn checkerboard_parity() {
        assert!(Checkerboard::Even.contains(4));
        assert!(Checkerboard::Odd.contains(-1));
        assert!(Checkerboard::None.contains(3));
        assert_eq!(Checkerboard::Even.inverse(), Checkerboard::Odd);
        assert_eq!(Checkerboard::None.inverse(), Checkerboard::None);
    }

    #[test]
    fn single_precision_rounds() {
        let z = Complex64::new(0.1, -1.0 / 3.0);
        let r = Precision::Single.round(z);
        assert_ne!(r, z);
        assert!((r - z).norm() < 1e-7);
        assert_eq!(Precision::Double.round(z), z);
    }

    #[test]
    fn spec_round_trips_through_json() {
        let spec = GridSpec::new(&[4, 4, 4, 8]).red_black();
        let json = serde_json::to_string(&spec).unwrap();
        let back: GridSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, spec);
        let minimal: GridSpec = serde_json::from_str(r#"{"fdimensions":[2,2]}"#).unwrap();
        assert_eq!(minimal, GridSpec::new(&[2, 2]));
    }
}
