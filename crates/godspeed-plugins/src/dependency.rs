//! Project dependency index: which plugins `package.json` already declares.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::catalog::{PluginCatalog, PluginDescriptor};
use crate::error::{PluginError, PluginResult};

/// Name of the project manifest.
pub const MANIFEST_FILE: &str = "package.json";

/// A plugin dependency declared by the project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRecord {
    /// Package name.
    pub identity: String,
    /// Version spec as written in the manifest.
    pub version_spec: String,
}

#[derive(Deserialize)]
struct ProjectManifest {
    #[serde(default)]
    dependencies: BTreeMap<String, serde_json::Value>,
}

/// Read-only view of the project's plugin dependencies.
///
/// The manifest is read again on every call so the view reflects whatever
/// the package manager last wrote.
#[derive(Debug, Clone)]
pub struct ProjectDependencyIndex {
    project_root: PathBuf,
    namespace: String,
}

impl ProjectDependencyIndex {
    /// Index for the project at `project_root`, keeping dependencies whose
    /// name starts with `namespace`.
    #[must_use]
    pub fn new(project_root: impl Into<PathBuf>, namespace: impl Into<String>) -> Self {
        Self {
            project_root: project_root.into(),
            namespace: namespace.into(),
        }
    }

    /// Path to `package.json`.
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.project_root.join(MANIFEST_FILE)
    }

    /// The plugin namespace prefix.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Plugin dependency records, sorted by identity.
    ///
    /// # Errors
    ///
    /// Returns `ProjectManifest` if `package.json` is missing or not valid JSON.
    pub fn records(&self) -> PluginResult<Vec<DependencyRecord>> {
        let path = self.manifest_path();
        let manifest = read_manifest(&path)?;
        Ok(manifest
            .dependencies
            .into_iter()
            .filter(|(name, _)| name.starts_with(&self.namespace))
            .map(|(identity, version)| DependencyRecord {
                identity,
                version_spec: match version {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                },
            })
            .collect())
    }

    /// Identities of installed plugins.
    ///
    /// # Errors
    ///
    /// Returns `ProjectManifest` if `package.json` is missing or not valid JSON.
    pub fn installed(&self) -> PluginResult<BTreeSet<String>> {
        Ok(self.records()?.into_iter().map(|r| r.identity).collect())
    }

    /// Catalog entries the project does not depend on yet.
    ///
    /// # Errors
    ///
    /// Returns `ProjectManifest` if `package.json` is missing or not valid JSON.
    pub fn missing<'c>(
        &self,
        catalog: &'c PluginCatalog,
    ) -> PluginResult<Vec<&'c PluginDescriptor>> {
        let installed = self.installed()?;
        Ok(catalog
            .iter()
            .filter(|d| !installed.contains(&d.identity))
            .collect())
    }

    /// Catalog entries the project already depends on.
    ///
    /// # Errors
    ///
    /// Returns `ProjectManifest` if `package.json` is missing or not valid JSON.
    pub fn common<'c>(
        &self,
        catalog: &'c PluginCatalog,
    ) -> PluginResult<Vec<&'c PluginDescriptor>> {
        let installed = self.installed()?;
        Ok(catalog
            .iter()
            .filter(|d| installed.contains(&d.identity))
            .collect())
    }
}

fn read_manifest(path: &Path) -> PluginResult<ProjectManifest> {
    let manifest_err = |message: String| PluginError::ProjectManifest {
        path: path.to_path_buf(),
        message,
    };
    let contents = std::fs::read_to_string(path).map_err(|e| manifest_err(e.to_string()))?;
    serde_json::from_str(&contents).map_err(|e| manifest_err(e.to_string()))
}
