//! Configuration struct definitions.
//!
//! Every section uses `#[serde(default)]` so a partial file only overrides
//! the keys it names.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Plugin discovery and installation.
    pub plugins: PluginsSection,
    /// Host project layout.
    pub project: ProjectSection,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
}

// ---------------------------------------------------------------------------
// PluginsSection
// ---------------------------------------------------------------------------

/// Plugin manager settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginsSection {
    /// Package name prefix identifying plugins.
    pub namespace: String,
    /// Package managers in order of preference (`pnpm`, `npm`, `yarn`, `bun`).
    pub package_managers: Vec<String>,
    /// Executable used to load installed plugin modules.
    pub node_binary: String,
    /// Catalog file replacing the built-in catalog. Empty keeps the built-in one.
    pub catalog_path: String,
    /// Loader token whose datasource config is never generated.
    pub prisma_loader: String,
}

impl Default for PluginsSection {
    fn default() -> Self {
        Self {
            namespace: "@godspeedsystems/plugins-".to_owned(),
            package_managers: vec!["pnpm".to_owned(), "npm".to_owned()],
            node_binary: "node".to_owned(),
            catalog_path: String::new(),
            prisma_loader: "prisma".to_owned(),
        }
    }
}

impl PluginsSection {
    /// The configured catalog file, if any.
    #[must_use]
    pub fn catalog_file(&self) -> Option<PathBuf> {
        let trimmed = self.catalog_path.trim();
        (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
    }
}

// ---------------------------------------------------------------------------
// ProjectSection
// ---------------------------------------------------------------------------

/// Host project layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSection {
    /// Source directory relative to the project root.
    pub source_dir: String,
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            source_dir: "src".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"`, or `"full"`.
    pub format: String,
    /// Per-crate tracing directives (e.g. `["godspeed_plugins=debug"]`).
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "warn".to_owned(),
            format: "compact".to_owned(),
            directives: vec!["godspeed::package_manager=info".to_owned()],
        }
    }
}
