//! Error types for the ripple field boundary.
//!
//! The simulation and compositing math never fails; only kernel resolution
//! and configuration I/O return [`RippleError`].

use std::path::PathBuf;

/// Errors surfaced at the crate boundary.
#[derive(Debug, thiserror::Error)]
pub enum RippleError {
    /// A kernel source was loaded but lacks a required entry point.
    #[error("expected computation kernel `{expected}` not found among available names {available:?}")]
    KernelNotFound {
        /// Entry point that was required.
        expected: String,
        /// Entry points the candidate actually declares.
        available: Vec<String>,
    },

    /// A kernel source failed to parse or validate.
    #[error("kernel {origin} is not valid WGSL: {message}")]
    KernelInvalid {
        /// Candidate the source came from.
        origin: String,
        /// Parser or validator diagnostic.
        message: String,
    },

    /// No candidate kernel source could be loaded.
    #[error("no kernel source available ({tried} candidates tried)")]
    NoKernelSource {
        /// Number of candidates attempted.
        tried: usize,
    },

    /// Reading a kernel source file failed.
    #[error("failed to read kernel source {path}: {source}")]
    KernelIo {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Reading or writing a configuration file failed.
    #[error("config I/O error at {path}: {source}")]
    ConfigIo {
        /// Offending file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Configuration JSON was malformed.
    #[error("invalid config: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, RippleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_not_found_message() {
        let err = RippleError::KernelNotFound {
            expected: "fs_prismatic".into(),
            available: vec!["vs_main".into(), "fs_distortion".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("expected computation kernel `fs_prismatic`"));
        assert!(msg.contains("fs_distortion"));
    }
}
