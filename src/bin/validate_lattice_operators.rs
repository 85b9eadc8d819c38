// SPDX-License-Identifier: AGPL-3.0-only

//! Lattice operator validation.
//!
//! Exercises the coordinate system, the operator algebra and the Wilson
//! matrix against analytically known results.
//!
//! # Validation targets
//!
//! | Observable | Expected | Tolerance | Basis |
//! |-----------|----------|-----------|-------|
//! | Coordinate coverage | every site once | exact | Partition of the lattice |
//! | FFT round trip | identity | 1e-12 | B∘F = 1 |
//! | Phase operators | unitary | 1e-12 | \|exp(ip·x)\| = 1 |
//! | Point-source smearing | kernel | 1e-10 | Convolution with δ |
//! | Cold plaquette | 1.0 | 1e-12 | Unit links |
//! | Free Wilson stencil | m+4, ½γ_μ−½, −½γ_μ−½ | 1e-14 | Definition |
//! | M = Meooe + Mooee | bitwise | exact | Definition |
//! | γ5-Hermiticity | ⟨a,γ5Mb⟩ = ⟨γ5Ma,b⟩ | 1e-10 rel | (γ5M)† = γ5M |
//! | CG on (γ5M)² | residual < 1e-8 | upper bound | Algorithm correctness |
//!
//! Exit code 0 = all checks pass, exit code 1 = any check fails.

use std::collections::HashSet;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use lattice_fields::config::RunConfig;
use lattice_fields::lattice::cg::cg_solve;
use lattice_fields::lattice::constants::{N_DIM, SPATIAL_DIMS};
use lattice_fields::lattice::coordinates::{coordinates, Order};
use lattice_fields::lattice::fft::fft;
use lattice_fields::lattice::field::{Lattice, ObjectType};
use lattice_fields::lattice::gamma::gamma;
use lattice_fields::lattice::gauge::GaugeField;
use lattice_fields::lattice::grid::{Checkerboard, Checkerboarding, Grid, GridSpec};
use lattice_fields::lattice::phase::exp_ixp_many;
use lattice_fields::lattice::smearing::{boosted_gaussian_kernel, SmearingKernel};
use lattice_fields::lattice::wilson::{point_source, WilsonFermion};
use lattice_fields::tolerances;
use lattice_fields::validation::ValidationHarness;
use lattice_fields::LatticeError;
use num_complex::Complex64;
use tracing::{error, info, info_span, warn};
use tracing_forest::{util::LevelFilter, ForestLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON run configuration (defaults to the free 4^4 massless setup).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the LCG seed.
    #[arg(short, long)]
    seed: Option<u64>,

    /// Print the check report as JSON instead of the text summary.
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    Registry::default()
        .with(env_filter)
        .with(ForestLayer::default())
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(harness) if args.json => match serde_json::to_string_pretty(&harness) {
            Ok(report) => {
                println!("{report}");
                harness.exit_code()
            }
            Err(e) => {
                error!("report serialization failed: {e}");
                ExitCode::FAILURE
            }
        },
        Ok(harness) => harness.finish(),
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<ValidationHarness, LatticeError> {
    let mut cfg = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    if let Some(seed) = args.seed {
        cfg.seed = seed;
    }
    validate(&cfg)
}

fn validate(cfg: &RunConfig) -> Result<ValidationHarness, LatticeError> {
    info!(dims = ?cfg.grid.fdimensions, mass = ?cfg.mass, seed = cfg.seed, "configuration");
    let nd = cfg.grid.fdimensions.len();
    if nd != N_DIM {
        return Err(LatticeError::InvalidGrid(format!(
            "the Wilson checks need a {N_DIM}-dimensional grid, got {nd}"
        )));
    }

    let mut harness = ValidationHarness::new("lattice_operators");

    // Neighbour access and FFTs need the whole lattice in one process.
    let grid = Arc::new(
        GridSpec {
            checkerboarding: Checkerboarding::Full,
            mpi: None,
            processor_coor: None,
            ..cfg.grid.clone()
        }
        .build()?,
    );

    check_coordinates(&mut harness, &cfg.grid.fdimensions)?;
    check_fft(&mut harness, &grid, cfg.seed);
    check_phases(&mut harness, &grid, cfg);
    check_smearing(&mut harness, &grid, cfg.smearing_width);
    check_wilson(&mut harness, &grid, cfg);

    Ok(harness)
}

/// Every site appears exactly once across all processes and both parities.
///
/// The checkerboard runs over the even extents; the lattice is split in two
/// along the last dimension that still has an even extent after halving.
fn check_coordinates(harness: &mut ValidationHarness, fdims: &[usize]) -> Result<(), LatticeError> {
    let _span = info_span!("coordinates").entered();
    let nd = fdims.len();
    let cb_mask: Vec<bool> = fdims.iter().map(|&n| n % 2 == 0).collect();
    let Some(cb_dim) = cb_mask.iter().position(|&m| m) else {
        warn!(dims = ?fdims, "no even extent to checkerboard, coverage check skipped");
        return Ok(());
    };
    let split = (0..nd).rev().find(|&d| {
        let extent = if d == cb_dim { fdims[d] / 2 } else { fdims[d] };
        extent % 2 == 0
    });
    let mut mpi = vec![1_usize; nd];
    if let Some(d) = split {
        mpi[d] = 2;
    }
    let ranks = mpi.iter().product::<usize>();

    let mut seen = HashSet::new();
    let mut total = 0;
    for rank in 0..ranks {
        let mut coor = vec![0_usize; nd];
        if let Some(d) = split {
            coor[d] = rank;
        }
        let grid = GridSpec::new(fdims)
            .red_black()
            .with_cb_mask(&cb_mask)
            .with_layout(&mpi, &coor)
            .build()?;
        for cb in [Checkerboard::Even, Checkerboard::Odd] {
            let x = coordinates((&grid, cb), Order::Lexicographic);
            total += x.len();
            seen.extend(x.iter().map(<[i64]>::to_vec));
        }
    }
    let volume: usize = fdims.iter().product();
    harness.check_abs("coordinate count", total as f64, volume as f64, 0.5);
    harness.check_bool("coordinates distinct", seen.len() == total);
    Ok(())
}

fn max_abs_diff(a: &Lattice, b: &Lattice) -> f64 {
    a.data()
        .iter()
        .zip(b.data())
        .map(|(x, y)| (x - y).norm())
        .fold(0.0, f64::max)
}

fn check_fft(harness: &mut ValidationHarness, grid: &Arc<Grid>, seed: u64) {
    let _span = info_span!("fft").entered();
    let mut rng = seed;
    let f = Lattice::random(grid, ObjectType::WilsonSpinor, &mut rng);
    let op = fft(None);
    let back = op.inv().apply(&op.apply(&f));
    harness.check_upper(
        "fft round trip",
        max_abs_diff(&back, &f),
        tolerances::FFT_ROUND_TRIP_ABS,
    );
    let spatial = fft(Some([0, 1, 2].as_slice()));
    let back = spatial.adj().apply(&spatial.apply(&f));
    harness.check_upper(
        "spatial fft round trip",
        max_abs_diff(&back, &f),
        tolerances::FFT_ROUND_TRIP_ABS,
    );
}

fn check_phases(harness: &mut ValidationHarness, grid: &Arc<Grid>, cfg: &RunConfig) {
    let _span = info_span!("phases").entered();
    let mut rng = cfg.seed;
    let f = Lattice::random(grid, ObjectType::WilsonSpinor, &mut rng);
    let origin = vec![1_i64; grid.nd()];
    for (k, op) in exp_ixp_many(&cfg.momenta, Some(origin.as_slice()))
        .iter()
        .enumerate()
    {
        let g = op.apply(&f);
        harness.check_upper(
            &format!("phase {k} norm"),
            (g.norm2() - f.norm2()).abs() / f.norm2(),
            tolerances::PHASE_UNITARITY_ABS,
        );
        harness.check_upper(
            &format!("phase {k} inverse"),
            max_abs_diff(&op.inv().apply(&g), &f),
            tolerances::PHASE_UNITARITY_ABS,
        );
    }
}

/// A point source on the t = 0 slice smears to the kernel on that slice
/// and stays zero on every other slice.
fn check_smearing(harness: &mut ValidationHarness, grid: &Arc<Grid>, width: f64) {
    let _span = info_span!("smearing", width).entered();
    let mut delta = Lattice::complex(grid);
    delta.set(&vec![0_i64; grid.nd()], &[Complex64::new(1.0, 0.0)]);
    let kernel = SmearingKernel::boosted_gaussian(grid, width, [0.0; 3]);
    let mut smeared = delta.like();
    kernel.convolve(&mut smeared, &delta);

    let mut expected = boosted_gaussian_kernel(grid, width, [0.0; 3]);
    for i in 0..expected.sites() {
        let x = expected.site_coordinate(i);
        if x[SPATIAL_DIMS.len()..].iter().any(|&v| v != 0) {
            expected.site_mut(i).fill(Complex64::new(0.0, 0.0));
        }
    }
    harness.check_upper(
        "point source smears to kernel",
        max_abs_diff(&smeared, &expected),
        tolerances::SMEARING_CONVOLUTION_ABS,
    );
}

fn check_wilson(harness: &mut ValidationHarness, grid: &Arc<Grid>, cfg: &RunConfig) {
    let _span = info_span!("wilson").entered();
    let cold = Arc::new(GaugeField::cold_start(grid));
    harness.check_abs(
        "cold plaquette",
        cold.average_plaquette(),
        1.0,
        tolerances::COLD_PLAQUETTE_ABS,
    );

    let w = WilsonFermion::new(&cold, cfg.mass);
    let origin = vec![0_i64; grid.nd()];
    let src = point_source(grid, &origin, 0, 0);
    let mut dst = src.like();
    w.m(&src, &mut dst);
    let e0 = src.get(&origin).to_vec();
    let diagonal: Vec<Complex64> = e0.iter().map(|&e| e * (cfg.mass.mass() + 4.0)).collect();
    let mut expected = src.like();
    expected.set(&origin, &diagonal);
    for mu in 0..grid.nd() {
        let mut ge0 = vec![Complex64::new(0.0, 0.0); e0.len()];
        gamma(mu).apply_site(&mut ge0, &e0);
        let l = grid.fdimensions()[mu] as i64;
        let mut back = origin.clone();
        back[mu] = l - 1;
        let mut fwd = origin.clone();
        fwd[mu] = 1;
        let b: Vec<Complex64> = ge0.iter().zip(&e0).map(|(&g, &e)| g * 0.5 - e * 0.5).collect();
        let f: Vec<Complex64> = ge0.iter().zip(&e0).map(|(&g, &e)| -g * 0.5 - e * 0.5).collect();
        expected.set(&back, &b);
        expected.set(&fwd, &f);
    }
    harness.check_upper(
        "free Wilson stencil",
        max_abs_diff(&dst, &expected),
        tolerances::WILSON_FREE_STENCIL_ABS,
    );

    let hot = Arc::new(GaugeField::hot_start(grid, cfg.seed));
    let w = WilsonFermion::new(&hot, cfg.mass);
    let mut rng = cfg.seed;
    let a = Lattice::random(grid, ObjectType::WilsonSpinor, &mut rng);
    let b = Lattice::random(grid, ObjectType::WilsonSpinor, &mut rng);

    let mut full = a.like();
    let mut hop = a.like();
    let mut diag = a.like();
    w.m(&a, &mut full);
    w.meooe(&a, &mut hop);
    w.mooee(&a, &mut diag);
    harness.check_bool("M = Meooe + Mooee", full.data() == (&diag + &hop).data());

    let mut ga = a.like();
    let mut gb = b.like();
    w.g5m(&a, &mut ga);
    w.g5m(&b, &mut gb);
    let lhs = a.inner_product(&gb);
    let rhs = ga.inner_product(&b);
    harness.check_rel(
        "gamma5 hermiticity",
        (lhs - rhs).norm() / lhs.norm(),
        0.0,
        tolerances::GAMMA5_HERMITICITY_REL,
    );

    let mut x = b.like();
    let result = cg_solve(&w, &mut x, &b, tolerances::CG_TOLERANCE, tolerances::CG_MAX_ITER);
    info!(iterations = result.iterations, "cg on hot links");
    harness.check_bool("cg converged", result.converged);
    harness.check_upper(
        "cg residual",
        result.final_residual,
        tolerances::CG_TOLERANCE,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passed(harness: &ValidationHarness, label: &str) -> bool {
        harness
            .checks
            .iter()
            .any(|c| c.label == label && c.passed)
    }

    #[test]
    fn default_configuration_passes() {
        let harness = validate(&RunConfig::default()).unwrap();
        assert!(passed(&harness, "point source smears to kernel"));
        assert!(harness.all_passed(), "{harness}");
    }

    #[test]
    fn smeared_point_source_vanishes_off_its_time_slice() {
        let grid = Arc::new(Grid::new(&[4, 4, 6, 3]).unwrap());
        let mut harness = ValidationHarness::new("smearing");
        check_smearing(&mut harness, &grid, 1.3);
        assert!(harness.all_passed(), "{harness}");
    }

    #[test]
    fn non_four_dimensional_grid_is_an_error() {
        let cfg = RunConfig {
            grid: GridSpec::new(&[4, 4, 4]),
            ..RunConfig::default()
        };
        assert!(matches!(validate(&cfg), Err(LatticeError::InvalidGrid(_))));
    }

    #[test]
    fn odd_extent_keeps_coordinate_coverage() {
        let mut harness = ValidationHarness::new("coordinates");
        check_coordinates(&mut harness, &[4, 4, 4, 3]).unwrap();
        assert!(passed(&harness, "coordinate count"));
        assert!(passed(&harness, "coordinates distinct"));

        let cfg = RunConfig {
            grid: GridSpec::new(&[4, 4, 4, 3]),
            ..RunConfig::default()
        };
        let harness = validate(&cfg).unwrap();
        assert!(passed(&harness, "coordinate count"));
        assert!(passed(&harness, "free Wilson stencil"));
    }

    #[test]
    fn all_odd_extents_skip_coverage() {
        let mut harness = ValidationHarness::new("coordinates");
        check_coordinates(&mut harness, &[3, 3, 3, 5]).unwrap();
        assert!(harness.checks.is_empty());
    }
}
