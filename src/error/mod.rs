//! Error type shared by the sweep runner and the report analyzers.
//!
//! A missing benchmark output file is not an error (the summary just omits
//! the row). Everything in here aborts the current sweep or summary.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for sweep and analysis operations
pub type Result<T> = std::result::Result<T, SweepError>;

#[derive(Error, Debug)]
pub enum SweepError {
    /// Reading or writing a file failed.
    #[error("I/O error for '{path}': {message}")]
    Io {
        path: PathBuf,
        message: String,
    },

    /// The external program could not be started at all.
    #[error("failed to launch '{program}': {message}")]
    CommandSpawn {
        program: String,
        message: String,
    },

    /// The external program ran but exited abnormally.
    #[error("'{program}' exited abnormally ({status}), output in '{output}'")]
    CommandFailed {
        program: String,
        status: String,
        output: PathBuf,
    },

    /// No line of the file contains the expected marker.
    #[error("'{path}': no line contains marker '{marker}'")]
    MarkerNotFound {
        path: PathBuf,
        marker: String,
    },

    /// A line at a fixed offset from an anchor does not carry the expected pattern.
    /// `line` is 1-based.
    #[error("'{path}': line {line} does not match pattern '{pattern}'")]
    OffsetPatternMissing {
        path: PathBuf,
        line: usize,
        pattern: String,
    },

    /// The marker was found but fewer counter sections than expected follow it.
    #[error("'{path}': found {found} counter sections for '{marker}', expected {expected}")]
    IncompleteCounters {
        path: PathBuf,
        marker: String,
        found: usize,
        expected: usize,
    },

    /// The token after a marker is not a number.
    #[error("'{path}': could not parse '{token}' after marker '{marker}'")]
    UnparsableToken {
        path: PathBuf,
        marker: String,
        token: String,
    },

    /// A derived ratio would divide by zero.
    #[error("'{path}': cannot compute {metric}: {denominator} is zero")]
    ZeroDenominator {
        path: PathBuf,
        metric: &'static str,
        denominator: &'static str,
    },

    #[error("invalid configuration for '{parameter}': {reason}")]
    InvalidConfig {
        parameter: String,
        reason: String,
    },

    #[error("failed to pin to core {core_id}: {message}")]
    Affinity {
        core_id: usize,
        message: String,
    },

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl SweepError {
    pub fn io(path: impl AsRef<Path>, err: io::Error) -> Self {
        SweepError::Io {
            path: path.as_ref().to_path_buf(),
            message: err.to_string(),
        }
    }

    pub fn invalid_config(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        SweepError::InvalidConfig {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for SweepError {
    fn from(err: serde_json::Error) -> Self {
        SweepError::Serialization(err.to_string())
    }
}
