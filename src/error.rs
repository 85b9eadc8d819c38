// SPDX-License-Identifier: AGPL-3.0-only

//! Typed errors for grid construction and configuration loading.
//!
//! Only recoverable input errors live here. Caller bugs (aliasing, mismatched
//! element types, unsupported coordinate subjects) are assertion failures.

use std::path::PathBuf;

use thiserror::Error;

/// Errors arising from invalid grid layouts or unreadable configuration.
#[derive(Debug, Error)]
pub enum LatticeError {
    /// The requested grid layout cannot be realized.
    #[error("invalid grid layout: {0}")]
    InvalidGrid(String),

    /// Reading a configuration file failed.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A configuration document did not parse.
    #[error("configuration parse failed: {0}")]
    Parse(#[from] serde_json::Error),
}
