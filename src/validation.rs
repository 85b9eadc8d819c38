// SPDX-License-Identifier: AGPL-3.0-only

//! Pass/fail bookkeeping for the validation binaries.
//!
//! A run records named observables against analytic expectations, each
//! under a [`Tolerance`]. The binary prints the report (text or JSON) and
//! exits 0 only when every check passed.

use std::fmt;
use std::process::ExitCode;

use serde::Serialize;
use tracing::{info, warn};

use crate::tolerances::NEAR_ZERO_EXPECTED;

/// Acceptance rule for one observable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "mode", content = "bound", rename_all = "snake_case")]
pub enum Tolerance {
    /// |observed − expected| < bound
    Absolute(f64),
    /// |observed − expected| / |expected| < bound; absolute when expected ≈ 0
    Relative(f64),
    /// observed < bound
    Below(f64),
    /// observed == expected
    Exact,
}

impl Tolerance {
    fn accepts(self, observed: f64, expected: f64) -> bool {
        match self {
            Self::Absolute(tol) => (observed - expected).abs() < tol,
            Self::Relative(tol) if expected.abs() > NEAR_ZERO_EXPECTED => {
                ((observed - expected) / expected).abs() < tol
            }
            Self::Relative(tol) => observed.abs() < tol,
            Self::Below(bound) => observed < bound,
            Self::Exact => observed == expected,
        }
    }
}

impl fmt::Display for Tolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absolute(tol) => write!(f, "abs {tol:.1e}"),
            Self::Relative(tol) => write!(f, "rel {tol:.1e}"),
            Self::Below(bound) => write!(f, "< {bound:.1e}"),
            Self::Exact => write!(f, "exact"),
        }
    }
}

/// One recorded observable.
#[derive(Debug, Clone, Serialize)]
pub struct Check {
    pub label: String,
    pub observed: f64,
    pub expected: f64,
    pub tolerance: Tolerance,
    pub passed: bool,
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.passed { "PASS" } else { "FAIL" };
        write!(f, "[{mark}] {}: {:.6e} ", self.label, self.observed)?;
        match self.tolerance {
            Tolerance::Below(_) => write!(f, "({})", self.tolerance),
            _ => write!(f, "(expected {:.6e}, {})", self.expected, self.tolerance),
        }
    }
}

/// Checks recorded by one validation run.
#[derive(Debug, Default, Serialize)]
#[must_use]
pub struct ValidationHarness {
    pub name: String,
    pub checks: Vec<Check>,
}

impl ValidationHarness {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            checks: Vec::new(),
        }
    }

    /// Record `observed` against `expected` and return whether it passed.
    pub fn record(&mut self, label: &str, observed: f64, expected: f64, tolerance: Tolerance) -> bool {
        let passed = tolerance.accepts(observed, expected);
        if passed {
            info!(label, observed, "pass");
        } else {
            warn!(label, observed, expected, %tolerance, "FAIL");
        }
        self.checks.push(Check {
            label: label.to_owned(),
            observed,
            expected,
            tolerance,
            passed,
        });
        passed
    }

    pub fn check_abs(&mut self, label: &str, observed: f64, expected: f64, tolerance: f64) {
        self.record(label, observed, expected, Tolerance::Absolute(tolerance));
    }

    pub fn check_rel(&mut self, label: &str, observed: f64, expected: f64, tolerance: f64) {
        self.record(label, observed, expected, Tolerance::Relative(tolerance));
    }

    /// Residual-style check: `observed` ideally 0, accepted below `bound`.
    pub fn check_upper(&mut self, label: &str, observed: f64, bound: f64) {
        self.record(label, observed, 0.0, Tolerance::Below(bound));
    }

    pub fn check_bool(&mut self, label: &str, holds: bool) {
        self.record(label, f64::from(u8::from(holds)), 1.0, Tolerance::Exact);
    }

    /// Checks that did not pass, in recording order.
    pub fn failures(&self) -> impl Iterator<Item = &Check> {
        self.checks.iter().filter(|c| !c.passed)
    }

    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.checks.len() - self.failures().count()
    }

    /// Vacuously true for an empty run.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failures().next().is_none()
    }

    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        if self.all_passed() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }

    /// Print the text report and return the exit code.
    pub fn finish(&self) -> ExitCode {
        println!("\n{self}");
        self.exit_code()
    }
}

impl fmt::Display for ValidationHarness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}: {}/{} checks passed",
            self.name,
            self.passed_count(),
            self.checks.len()
        )?;
        for check in &self.checks {
            writeln!(f, "  {check}")?;
        }
        let failed: Vec<&str> = self.failures().map(|c| c.label.as_str()).collect();
        if failed.is_empty() {
            writeln!(f, "all checks passed")
        } else {
            writeln!(f, "failed: {}", failed.join(", "))
        }
    }
}
