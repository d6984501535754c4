//! Post-merge configuration validation.

use std::path::Path;

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Package managers the installer knows how to drive.
pub const KNOWN_PACKAGE_MANAGERS: &[&str] = &["pnpm", "npm", "yarn", "bun"];

/// Validate a fully-merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_plugins(config)?;
    validate_project(config)?;
    validate_logging(config)?;
    Ok(())
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_owned(),
        message: message.into(),
    }
}

fn validate_plugins(config: &Config) -> ConfigResult<()> {
    let p = &config.plugins;

    if p.namespace.trim().is_empty() {
        return Err(invalid("plugins.namespace", "namespace must not be empty"));
    }

    if p.package_managers.is_empty() {
        return Err(invalid(
            "plugins.package_managers",
            "at least one package manager is required",
        ));
    }
    if let Some(unknown) = p
        .package_managers
        .iter()
        .find(|m| !KNOWN_PACKAGE_MANAGERS.contains(&m.trim().to_ascii_lowercase().as_str()))
    {
        return Err(invalid(
            "plugins.package_managers",
            format!(
                "unsupported package manager '{unknown}'; expected one of: {}",
                KNOWN_PACKAGE_MANAGERS.join(", ")
            ),
        ));
    }

    if p.node_binary.trim().is_empty() {
        return Err(invalid("plugins.node_binary", "node binary must not be empty"));
    }

    if p.prisma_loader.trim().is_empty() {
        return Err(invalid("plugins.prisma_loader", "prisma loader token must not be empty"));
    }

    Ok(())
}

fn validate_project(config: &Config) -> ConfigResult<()> {
    let dir = config.project.source_dir.trim();
    if dir.is_empty() {
        return Err(invalid("project.source_dir", "source directory must not be empty"));
    }
    if Path::new(dir).is_absolute() {
        return Err(invalid(
            "project.source_dir",
            format!("source directory '{dir}' must be relative to the project root"),
        ));
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.logging.level.to_ascii_lowercase().as_str()) {
        return Err(invalid(
            "logging.level",
            format!(
                "unsupported log level '{}'; expected one of: {}",
                config.logging.level,
                valid_levels.join(", ")
            ),
        ));
    }

    let valid_formats = ["pretty", "compact", "json", "full"];
    if !valid_formats.contains(&config.logging.format.as_str()) {
        return Err(invalid(
            "logging.format",
            format!(
                "unsupported log format '{}'; expected one of: {}",
                config.logging.format,
                valid_formats.join(", ")
            ),
        ));
    }

    Ok(())
}
