//! Plugin manager error types.

use std::path::PathBuf;

use crate::installer::{PackageManager, PackageOperation};

/// Errors from plugin manager operations.
///
/// Only conditions that stop an operation live here. Heuristic
/// classification and per-file artifact failures are reported through
/// [`ClassificationResult`](crate::ClassificationResult) and
/// [`ScaffoldReport`](crate::ScaffoldReport) instead.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// The plugin catalog is missing or malformed.
    #[error("plugin catalog error ({source_name}): {message}")]
    Catalog {
        /// Where the catalog was read from.
        source_name: String,
        /// Description of the problem.
        message: String,
    },

    /// An explicitly named plugin is not in the catalog.
    #[error("unknown plugin: {0}")]
    UnknownPlugin(String),

    /// The project manifest (`package.json`) could not be read or parsed.
    #[error("project manifest error at {path}: {message}")]
    ProjectManifest {
        /// Path to the manifest.
        path: PathBuf,
        /// Description of the problem.
        message: String,
    },

    /// A batch operation was requested with no identities.
    #[error("no plugins given for {0}")]
    EmptyBatch(PackageOperation),

    /// None of the configured package managers is on `PATH`.
    #[error("no package manager found (tried: {tried})")]
    PackageManagerNotFound {
        /// Comma-separated list of the executables searched for.
        tried: String,
    },

    /// The package manager could not be spawned.
    #[error("failed to run {manager}: {source}")]
    Spawn {
        /// The manager that failed to start.
        manager: PackageManager,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The package manager exited unsuccessfully. The whole batch is aborted.
    #[error("{manager} {operation} failed (exit {}): {stderr}", exit_label(.exit_code))]
    InstallFailed {
        /// The manager that ran.
        manager: PackageManager,
        /// The batch operation.
        operation: PackageOperation,
        /// Exit code, `None` when terminated by a signal.
        exit_code: Option<i32>,
        /// Captured standard error.
        stderr: String,
    },

    /// The interactive selection prompt failed.
    #[error("selection failed: {0}")]
    Selection(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn exit_label(code: &Option<i32>) -> String {
    code.map_or_else(|| "signal".to_owned(), |c| c.to_string())
}

/// Result type for plugin manager operations.
pub type PluginResult<T> = Result<T, PluginError>;
