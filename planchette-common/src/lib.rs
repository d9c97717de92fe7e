//! Common types and utilities shared across planchette crates.
//!
//! This crate defines the shared error type, observability helpers, and a
//! couple of small collection/string utilities used throughout the
//! planchette workspace. It is intentionally lightweight so that all crates
//! can depend on it without introducing heavy transitive costs.
//!
//! # Overview
//!
//! - [`PlanchetteError`] and [`Result`]: shared error handling
//! - [`observability`]: centralised tracing/logging initialisation
//! - [`util`]: mapping inversion and log-friendly truncation
use std::time::Duration;

pub mod observability;
pub mod util;

/// Error types used across the planchette workspace.
#[derive(thiserror::Error, Debug)]
pub enum PlanchetteError {
    /// A locator resolved to zero elements after the wait budget elapsed.
    #[error("no element found matching {0}")]
    NotFound(String),

    /// A locator that had to identify exactly one element matched several.
    #[error("{target} matches {count} elements; refine the locator or use find_all")]
    Ambiguous { target: String, count: usize },

    /// The WebDriver backend rejected or failed a command.
    #[error("webdriver command failed: {0}")]
    Driver(#[from] fantoccini::error::CmdError),

    /// A browser session could not be established.
    #[error("could not start a browser session: {0}")]
    NewSession(#[from] fantoccini::error::NewSessionError),

    /// Launch options or browser selection were invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// An injected browser script returned something unexpected.
    #[error("browser script returned an unexpected value: {0}")]
    Script(String),

    /// Marshalling a value to or from the driver's JSON wire format failed.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// A wait condition did not become true within its budget.
    #[error("condition not met within {waited:?}")]
    Timeout { waited: Duration },
}

/// Convenient alias for results that use [`PlanchetteError`].
pub type Result<T> = std::result::Result<T, PlanchetteError>;
