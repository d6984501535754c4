//! Environment variable overrides.
//!
//! Unlike file layers, these are applied last and win over every file.
//! Empty values are ignored.

use std::collections::HashMap;

use tracing::debug;

use crate::merge::set_path;

/// How an environment variable's value lands in the config tree.
#[derive(Clone, Copy)]
enum EnvShape {
    /// Stored as a string.
    String,
    /// Stored as a one-element string array.
    SingleItemList,
}

/// Mapping from environment variable name to config field path.
struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
    shape: EnvShape,
}

/// All supported `GODSPEED_*` overrides.
const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "GODSPEED_LOG_LEVEL",
        field_path: "logging.level",
        shape: EnvShape::String,
    },
    // Pins a single package manager instead of the preference list.
    EnvMapping {
        var_name: "GODSPEED_PACKAGE_MANAGER",
        field_path: "plugins.package_managers",
        shape: EnvShape::SingleItemList,
    },
    EnvMapping {
        var_name: "GODSPEED_CATALOG",
        field_path: "plugins.catalog_path",
        shape: EnvShape::String,
    },
];

/// Environment variable naming an alternate user config directory.
pub const HOME_ENV: &str = "GODSPEED_HOME";

/// Snapshot the `GODSPEED_*` environment.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars()
        .filter(|(k, _)| k.starts_with("GODSPEED_"))
        .collect()
}

/// Apply overrides from `env_vars` to `merged`. Returns how many were applied.
pub fn apply_env_overrides<S: ::std::hash::BuildHasher>(
    merged: &mut toml::Value,
    env_vars: &HashMap<String, String, S>,
) -> usize {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        let Some(raw) = env_vars.get(mapping.var_name) else {
            continue;
        };
        let val = raw.trim();
        if val.is_empty() {
            continue;
        }

        debug!(
            var = mapping.var_name,
            field = mapping.field_path,
            "applying env var override"
        );
        let value = match mapping.shape {
            EnvShape::String => toml::Value::String(val.to_owned()),
            EnvShape::SingleItemList => {
                toml::Value::Array(vec![toml::Value::String(val.to_owned())])
            },
        };
        set_path(merged, mapping.field_path, value);
        count = count.saturating_add(1);
    }

    count
}
