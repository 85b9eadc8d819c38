// SPDX-License-Identifier: AGPL-3.0-only

//! Momentum phase operator `ψ(x) → exp(i p·x) ψ(x)`.
//!
//! With an origin o the phase uses the minimal-image displacement x − o,
//! otherwise raw coordinates. Only the first `p.len()` dimensions enter
//! p·x. The operator is unitary: adjoint and inverse apply the phase of −p.
//!
//! Phase fields are built lazily and kept per (grid, checkerboard, origin,
//! momentum) for the lifetime of the owning [`ExpIxp`]. Entries are never
//! evicted, so memory grows with the number of distinct grids and
//! checkerboards a single operator is applied to.

use std::collections::HashMap;
use std::sync::Arc;

use num_complex::Complex64;
use parking_lot::Mutex;
use rayon::prelude::*;
use tracing::debug;

use super::coordinates::{coordinates, relative_coordinates, Order};
use super::field::{Lattice, ObjectType};
use super::grid::{Checkerboard, GridId};
use super::operator::MatrixOperator;

/// Cache key of one phase field.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PhaseKey {
    grid: GridId,
    cb: Checkerboard,
    origin: Option<Vec<i64>>,
    momentum: Vec<u64>,
}

/// Exact bit pattern of a momentum vector, with −0 folded onto +0.
fn momentum_bits(p: &[f64]) -> Vec<u64> {
    p.iter().map(|&v| (v + 0.0).to_bits()).collect()
}

/// Momentum phase operator owning its phase-field cache.
#[derive(Debug)]
pub struct ExpIxp {
    momentum: Vec<f64>,
    origin: Option<Vec<i64>>,
    cache: Mutex<HashMap<PhaseKey, Arc<Lattice>>>,
}

impl ExpIxp {
    /// Phase exp(i p·(x − origin)) (raw x when `origin` is `None`).
    #[must_use]
    pub fn new(momentum: &[f64], origin: Option<&[i64]>) -> Self {
        Self {
            momentum: momentum.to_vec(),
            origin: origin.map(<[i64]>::to_vec),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Momentum vector.
    #[must_use]
    pub fn momentum(&self) -> &[f64] {
        &self.momentum
    }

    /// Number of cached phase fields.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.cache.lock().len()
    }

    /// `dst = exp(+i p·x) src`
    pub fn forward(&self, dst: &mut Lattice, src: &Lattice) {
        self.apply_phase(dst, src, &self.momentum);
    }

    /// `dst = exp(−i p·x) src`
    pub fn backward(&self, dst: &mut Lattice, src: &Lattice) {
        let negated: Vec<f64> = self.momentum.iter().map(|v| -v).collect();
        self.apply_phase(dst, src, &negated);
    }

    fn apply_phase(&self, dst: &mut Lattice, src: &Lattice, p: &[f64]) {
        let phase = self.phase_field(src, p);
        dst.assign(&(&*phase * src));
    }

    fn phase_field(&self, src: &Lattice, p: &[f64]) -> Arc<Lattice> {
        let key = PhaseKey {
            grid: src.grid().id(),
            cb: src.checkerboard(),
            origin: self.origin.clone(),
            momentum: momentum_bits(p),
        };
        if let Some(hit) = self.cache.lock().get(&key) {
            return Arc::clone(hit);
        }
        debug!(grid = ?key.grid, cb = ?key.cb, momentum = ?p, "building phase field");
        let phase = Arc::new(build_phase(src, p, self.origin.as_deref()));
        Arc::clone(self.cache.lock().entry(key).or_insert(phase))
    }

    /// Wrap as a unitary operator sharing this cache.
    #[must_use]
    pub fn operator(self: &Arc<Self>) -> MatrixOperator {
        let fwd = Arc::clone(self);
        let adj = Arc::clone(self);
        let inv = Arc::clone(self);
        let adj_inv = Arc::clone(self);
        MatrixOperator::new(
            move |dst, src| fwd.forward(dst, src),
            move |dst, src| adj.backward(dst, src),
        )
        .with_inverse(
            move |dst, src| inv.backward(dst, src),
            move |dst, src| adj_inv.forward(dst, src),
        )
    }
}

fn build_phase(src: &Lattice, p: &[f64], origin: Option<&[i64]>) -> Lattice {
    let grid = src.grid();
    assert!(p.len() <= grid.nd(), "momentum has more components than the grid");
    let sites = coordinates(src, Order::Lexicographic);
    let relative = origin.map(|o| relative_coordinates(&sites, o, grid.fdimensions()));
    let x = relative.as_ref().unwrap_or(&sites);
    let precision = grid.precision();
    let values: Vec<Complex64> = (0..x.len())
        .into_par_iter()
        .map(|i| {
            let px: f64 = p.iter().zip(x.row(i)).map(|(&pi, &xi)| pi * xi as f64).sum();
            precision.round(Complex64::from_polar(1.0, px))
        })
        .collect();
    let mut phase = src.like_typed(ObjectType::Complex);
    phase.set_coordinates(&sites, &values);
    phase
}

/// Phase operator for one momentum.
#[must_use]
pub fn exp_ixp(p: &[f64], origin: Option<&[i64]>) -> MatrixOperator {
    Arc::new(ExpIxp::new(p, origin)).operator()
}

/// Phase operators for several momenta, in order.
#[must_use]
pub fn exp_ixp_many(momenta: &[Vec<f64>], origin: Option<&[i64]>) -> Vec<MatrixOperator> {
    momenta.iter().map(|p| exp_ixp(p, origin)).collect()
}
