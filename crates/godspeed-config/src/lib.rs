#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Layered configuration for the Godspeed plugin manager.
//!
//! # Usage
//!
//! ```rust,no_run
//! use godspeed_config::Config;
//!
//! let loaded = Config::load(Some(std::path::Path::new("."))).unwrap();
//! println!("Plugin namespace: {}", loaded.config.plugins.namespace);
//! ```
//!
//! # Configuration Precedence
//!
//! From highest to lowest priority:
//!
//! 1. **Environment variables** (`GODSPEED_LOG_LEVEL`, `GODSPEED_PACKAGE_MANAGER`,
//!    `GODSPEED_CATALOG`)
//! 2. **Project** (`{project}/.godspeed/config.toml`)
//! 3. **User** (`~/.godspeed/config.toml`, or `$GODSPEED_HOME/config.toml`)
//! 4. **Embedded defaults** (`defaults.toml` compiled into binary)

/// Environment variable overrides.
pub mod env;
/// Configuration error types.
pub mod error;
/// Configuration file discovery and loading.
pub mod loader;
/// Deep merging of TOML layers.
pub mod merge;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::LoadedConfig;
pub use types::*;

impl Config {
    /// Load configuration with the full precedence chain.
    ///
    /// See [`loader::load`] for the algorithm.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any config file is malformed or the final
    /// configuration fails validation.
    pub fn load(project_root: Option<&std::path::Path>) -> ConfigResult<LoadedConfig> {
        loader::load(project_root, None)
    }
}
