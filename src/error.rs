//! # Error Types
//!
//! This module defines all error types for the incipit generator.
//!
//! Generation itself draws only from fixed, valid ranges, so the generation
//! errors here mark programming defects (an empty palette, a non-positive beat
//! length) rather than bad input. Everything else comes from the batch surface:
//! configuration, file I/O and the external rendering tools.
//!
//! ## Error Types
//! - `ContractViolation` - A generation precondition was broken
//! - `InvalidMeasure` - A finished score failed validation, with measure number
//! - `ConfigError` - Invalid batch configuration (YAML or flags)
//! - `Io` - File system failure, with the offending path
//! - `RenderError` - An external rendering tool failed
//! - `Serialization` - JSON encoding failed
//!
//! ## Usage
//! ```rust
//! use incipit::{generate, IncipitError};
//!
//! match generate(7) {
//!     Ok(score) => println!("{} measures", score.measures.len()),
//!     Err(IncipitError::InvalidMeasure { measure, message }) => {
//!         eprintln!("Measure {} is broken: {}", measure, message);
//!     }
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IncipitError {
    /// A generation precondition was broken.
    ///
    /// # Example
    /// ```
    /// # use incipit::IncipitError;
    /// let err = IncipitError::ContractViolation("duration palette is empty".to_string());
    /// assert_eq!(err.to_string(), "Contract violation: duration palette is empty");
    /// ```
    #[error("Contract violation: {0}")]
    ContractViolation(String),

    /// Validation error with measure information.
    ///
    /// Occurs when a measure's durations don't add up to the time signature or
    /// an event falls outside the allowed pitch pool.
    ///
    /// # Example
    /// ```
    /// # use incipit::IncipitError;
    /// let err = IncipitError::InvalidMeasure {
    ///     measure: 2,
    ///     message: "Measure duration (3.5 beats) doesn't match time signature (4/4 = 4 beats)".to_string(),
    /// };
    /// assert_eq!(
    ///     err.to_string(),
    ///     "Invalid score at measure 2: Measure duration (3.5 beats) doesn't match time signature (4/4 = 4 beats)"
    /// );
    /// ```
    #[error("Invalid score at measure {measure}: {message}")]
    InvalidMeasure { measure: usize, message: String },

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Renderer `{tool}` failed: {message}")]
    RenderError { tool: String, message: String },

    #[error("Serialization failed: {0}")]
    Serialization(String),
}

impl IncipitError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IncipitError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for IncipitError {
    fn from(e: serde_json::Error) -> Self {
        IncipitError::Serialization(e.to_string())
    }
}
