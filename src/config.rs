// SPDX-License-Identifier: AGPL-3.0-only

//! JSON run configuration.
//!
//! ```json
//! {
//!   "grid": { "fdimensions": [4, 4, 4, 4] },
//!   "mass": { "mass": 0.0 },
//!   "smearing_width": 1.0,
//!   "momenta": [[0.0, 0.0, 0.0], [1.5707963267948966, 0.0, 0.0]],
//!   "seed": 42
//! }
//! ```
//!
//! Missing keys fall back to [`RunConfig::default`]. `mass` is externally
//! tagged, so `{"mass": ..., "kappa": ...}` is a parse error.

use std::f64::consts::PI;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::LatticeError;
use crate::lattice::grid::GridSpec;
use crate::lattice::wilson::FermionMass;

/// Parameters of one validation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Grid layout.
    pub grid: GridSpec,
    /// Wilson mass or hopping parameter.
    pub mass: FermionMass,
    /// Gaussian smearing width in lattice units.
    pub smearing_width: f64,
    /// Momenta for the phase operators.
    pub momenta: Vec<Vec<f64>>,
    /// LCG seed for hot starts and random fields.
    pub seed: u64,
}

impl Default for RunConfig {
    /// 4⁴ periodic lattice, massless Wilson fermion.
    fn default() -> Self {
        Self {
            grid: GridSpec::new(&[4, 4, 4, 4]),
            mass: FermionMass::Mass(0.0),
            smearing_width: 1.0,
            momenta: vec![vec![0.0, 0.0, 0.0], vec![2.0 * PI / 4.0, 0.0, 0.0]],
            seed: 42,
        }
    }
}

impl RunConfig {
    /// Parse a JSON document.
    pub fn from_json(text: &str) -> Result<Self, LatticeError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read and parse a JSON file.
    pub fn load(path: &Path) -> Result<Self, LatticeError> {
        let file = std::fs::File::open(path).map_err(|source| LatticeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::grid::Checkerboarding;

    #[test]
    fn default_is_free_massless_4d() {
        let c = RunConfig::default();
        assert_eq!(c.grid.fdimensions, vec![4, 4, 4, 4]);
        assert!((c.mass.kappa() - 0.125).abs() < 1e-15);
        assert!(c.grid.build().is_ok());
    }

    #[test]
    fn partial_document_keeps_defaults() {
        let c = RunConfig::from_json(
            r#"{"grid": {"fdimensions": [8, 4, 4, 4], "checkerboarding": "red_black"},
                "mass": {"kappa": 0.12}}"#,
        )
        .unwrap();
        assert_eq!(c.grid.checkerboarding, Checkerboarding::RedBlack);
        assert_eq!(c.mass, FermionMass::Kappa(0.12));
        assert_eq!(c.seed, 42);
        assert_eq!(c.momenta.len(), 2);
    }

    #[test]
    fn mass_and_kappa_together_rejected() {
        let err = RunConfig::from_json(r#"{"mass": {"mass": 0.1, "kappa": 0.12}}"#);
        assert!(matches!(err, Err(LatticeError::Parse(_))));
    }

    #[test]
    fn json_round_trip() {
        let c = RunConfig::default();
        let text = serde_json::to_string(&c).unwrap();
        assert_eq!(RunConfig::from_json(&text).unwrap(), c);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = RunConfig::load(Path::new("/nonexistent/run.json"));
        assert!(matches!(err, Err(LatticeError::Io { .. })));
    }
}
