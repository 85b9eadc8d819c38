// SPDX-License-Identifier: AGPL-3.0-only

//! SU(3) gauge link fields.
//!
//! Four `ColorMatrix` fields U_μ(x), μ ∈ {0,1,2,3}, on a full 4D grid. The
//! plaquette is built from field shifts:
//!
//!   `P_μν`(x) = `U_μ`(x) `U_ν`(x+μ) `U_μ`†(x+ν) `U_ν`†(x)
//!
//! and ⟨P⟩ = ⟨Re Tr P / 3⟩ over all sites and the 6 planes μ < ν.
//!
//! # References
//!
//! - Wilson, PRD 10, 2445 (1974)
//! - Gattringer & Lang, "QCD on the Lattice" (2010), Ch. 3

use std::sync::Arc;

use rayon::prelude::*;
use tracing::instrument;

use super::constants::{HOT_START_EPSILON, N_COLORS, N_DIM};
use super::field::{Lattice, ObjectType};
use super::grid::Grid;
use super::su3::Su3Matrix;

/// Gauge links U_μ(x) for the four lattice directions.
#[derive(Clone, Debug)]
pub struct GaugeField {
    links: Vec<Lattice>,
}

fn assert_gauge_grid(grid: &Grid) {
    assert_eq!(grid.nd(), N_DIM, "gauge fields live on 4D grids");
    assert!(!grid.is_checkerboarded(), "gauge fields live on full grids");
}

impl GaugeField {
    /// Cold start: every link is the identity.
    #[must_use]
    pub fn cold_start(grid: &Arc<Grid>) -> Self {
        assert_gauge_grid(grid);
        let links = (0..N_DIM)
            .map(|_| {
                let mut u = Lattice::color_matrix(grid);
                u.data_mut()
                    .par_chunks_mut(N_COLORS * N_COLORS)
                    .for_each(|site| Su3Matrix::IDENTITY.write_components(site));
                u
            })
            .collect();
        Self { links }
    }

    /// Hot start: random SU(3) links near the identity, LCG-seeded.
    #[must_use]
    #[instrument(skip_all, level = "debug", fields(seed = seed))]
    pub fn hot_start(grid: &Arc<Grid>, seed: u64) -> Self {
        assert_gauge_grid(grid);
        let mut rng = seed;
        let links = (0..N_DIM)
            .map(|_| {
                let mut u = Lattice::color_matrix(grid);
                for site in u.data_mut().chunks_exact_mut(N_COLORS * N_COLORS) {
                    Su3Matrix::random_near_identity(&mut rng, HOT_START_EPSILON)
                        .write_components(site);
                }
                u
            })
            .collect();
        Self { links }
    }

    /// Wrap four existing `ColorMatrix` fields.
    ///
    /// # Panics
    ///
    /// Unless there are four conformable colour-matrix fields on a full 4D grid.
    #[must_use]
    pub fn from_links(links: Vec<Lattice>) -> Self {
        assert_eq!(links.len(), N_DIM, "gauge field needs one link field per direction");
        assert_gauge_grid(links[0].grid());
        for u in &links {
            assert_eq!(
                u.otype(),
                ObjectType::ColorMatrix,
                "links must be colour matrices"
            );
            assert!(u.grid().same_as(links[0].grid()), "links live on different grids");
        }
        Self { links }
    }

    /// Grid of the links.
    #[must_use]
    pub fn grid(&self) -> &Arc<Grid> {
        self.links[0].grid()
    }

    /// Link field U_μ.
    #[must_use]
    pub fn link_field(&self, mu: usize) -> &Lattice {
        &self.links[mu]
    }

    /// All four link fields.
    #[must_use]
    pub fn links(&self) -> &[Lattice] {
        &self.links
    }

    /// Link U_μ(x).
    #[must_use]
    pub fn link(&self, x: &[i64], mu: usize) -> Su3Matrix {
        Su3Matrix::from_components(self.links[mu].get(x))
    }

    /// Overwrite link U_μ(x).
    pub fn set_link(&mut self, x: &[i64], mu: usize, u: Su3Matrix) {
        let mut c = [num_complex::Complex64::new(0.0, 0.0); 9];
        u.write_components(&mut c);
        self.links[mu].set(x, &c);
    }

    /// Plaquette field `P_μν`(x).
    #[must_use]
    pub fn plaquette(&self, mu: usize, nu: usize) -> Lattice {
        let u_mu = &self.links[mu];
        let u_nu = &self.links[nu];
        let a = u_mu * &u_nu.cshift(mu, 1);
        let b = &a * &u_mu.cshift(nu, 1).adjoint();
        &b * &u_nu.adjoint()
    }

    /// ⟨Re Tr P / 3⟩ over all sites and planes.
    #[must_use]
    #[instrument(skip_all, level = "debug")]
    pub fn average_plaquette(&self) -> f64 {
        let mut sum = 0.0;
        let mut count = 0usize;
        for mu in 0..N_DIM {
            for nu in (mu + 1)..N_DIM {
                let p = self.plaquette(mu, nu);
                sum += p
                    .data()
                    .par_chunks(N_COLORS * N_COLORS)
                    .map(|site| Su3Matrix::from_components(site).re_trace() / 3.0)
                    .sum::<f64>();
                count += p.sites();
            }
        }
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Arc<Grid> {
        Arc::new(Grid::new(&[4, 4, 4, 4]).unwrap())
    }

    #[test]
    fn cold_start_plaquette_is_one() {
        let u = GaugeField::cold_start(&grid());
        let p = u.average_plaquette();
        assert!((p - 1.0).abs() < 1e-14, "cold start plaquette should be 1.0, got {p}");
    }

    #[test]
    fn hot_start_plaquette_below_one() {
        let u = GaugeField::hot_start(&grid(), 42);
        let p = u.average_plaquette();
        assert!(p < 1.0, "hot start plaquette should be < 1.0, got {p}");
        assert!(p > -1.0, "plaquette should be > -1.0, got {p}");
    }

    #[test]
    fn hot_start_is_deterministic() {
        let g = grid();
        let a = GaugeField::hot_start(&g, 7);
        let b = GaugeField::hot_start(&g, 7);
        assert_eq!(a.link(&[1, 2, 3, 0], 2), b.link(&[1, 2, 3, 0], 2));
    }

    #[test]
    fn plaquette_matches_link_product() {
        let u = GaugeField::hot_start(&grid(), 99);
        let x = [3, 1, 0, 2];
        let (mu, nu) = (0, 2);
        let mut x_mu = x;
        x_mu[mu] = (x_mu[mu] + 1) % 4;
        let mut x_nu = x;
        x_nu[nu] = (x_nu[nu] + 1) % 4;
        let expected = u.link(&x, mu)
            * u.link(&x_mu, nu)
            * u.link(&x_nu, mu).adjoint()
            * u.link(&x, nu).adjoint();
        let got = Su3Matrix::from_components(u.plaquette(mu, nu).get(&x));
        for i in 0..3 {
            for j in 0..3 {
                assert!((got[(i, j)] - expected[(i, j)]).norm() < 1e-12);
            }
        }
    }

    #[test]
    fn set_link_round_trip() {
        let mut u = GaugeField::cold_start(&grid());
        let mut seed = 3u64;
        let m = Su3Matrix::random_near_identity(&mut seed, 0.5);
        u.set_link(&[0, 1, 2, 3], 3, m);
        assert_eq!(u.link(&[0, 1, 2, 3], 3), m);
        assert_eq!(u.link(&[0, 1, 2, 3], 2), Su3Matrix::IDENTITY);
    }
}
