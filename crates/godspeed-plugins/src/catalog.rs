//! Plugin catalog: the fixed registry of known plugin identities.
//!
//! The built-in catalog ships inside the binary and is parsed once per
//! process. A catalog read from disk replaces it when configured.

use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::{PluginError, PluginResult};

const BUILTIN_CATALOG: &str = include_str!("catalog.json");

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginDescriptor {
    /// Package name, unique within the catalog.
    pub identity: String,
    /// Short human-readable name.
    pub display_name: String,
    /// One-line description.
    #[serde(default)]
    pub description: String,
}

/// An immutable, validated list of [`PluginDescriptor`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginCatalog {
    entries: Vec<PluginDescriptor>,
}

impl PluginCatalog {
    /// The catalog embedded in the binary.
    ///
    /// # Errors
    ///
    /// Returns `PluginError::Catalog` if the embedded catalog is malformed.
    pub fn builtin() -> PluginResult<&'static Self> {
        static CATALOG: OnceLock<Result<PluginCatalog, String>> = OnceLock::new();
        CATALOG
            .get_or_init(|| {
                Self::from_json(BUILTIN_CATALOG, "builtin").map_err(|e| match e {
                    PluginError::Catalog { message, .. } => message,
                    other => other.to_string(),
                })
            })
            .as_ref()
            .map_err(|message| PluginError::Catalog {
                source_name: "builtin".into(),
                message: message.clone(),
            })
    }

    /// Parse a catalog from a JSON array. `source_name` labels errors.
    ///
    /// # Errors
    ///
    /// Returns `PluginError::Catalog` on invalid JSON, an empty list, an
    /// empty identity, or a duplicate identity.
    pub fn from_json(json: &str, source_name: &str) -> PluginResult<Self> {
        let catalog_err = |message: String| PluginError::Catalog {
            source_name: source_name.to_owned(),
            message,
        };

        let entries: Vec<PluginDescriptor> =
            serde_json::from_str(json).map_err(|e| catalog_err(e.to_string()))?;

        if entries.is_empty() {
            return Err(catalog_err("catalog is empty".into()));
        }

        let mut seen = HashSet::new();
        for entry in &entries {
            let identity = entry.identity.trim();
            if identity.is_empty() {
                return Err(catalog_err("entry with empty identity".into()));
            }
            if !seen.insert(identity) {
                return Err(catalog_err(format!("duplicate identity: {identity}")));
            }
        }

        Ok(Self { entries })
    }

    /// Read a catalog file.
    ///
    /// # Errors
    ///
    /// Returns `PluginError::Catalog` if the file is absent, unreadable or malformed.
    pub fn from_path(path: &Path) -> PluginResult<Self> {
        let source_name = path.display().to_string();
        let json = std::fs::read_to_string(path).map_err(|e| PluginError::Catalog {
            source_name: source_name.clone(),
            message: e.to_string(),
        })?;
        Self::from_json(&json, &source_name)
    }

    /// All entries, in catalog order.
    #[must_use]
    pub fn list(&self) -> &[PluginDescriptor] {
        &self.entries
    }

    /// Iterate over entries.
    pub fn iter(&self) -> impl Iterator<Item = &PluginDescriptor> {
        self.entries.iter()
    }

    /// Look up an entry by identity.
    #[must_use]
    pub fn get(&self, identity: &str) -> Option<&PluginDescriptor> {
        self.entries.iter().find(|d| d.identity == identity)
    }

    /// Whether `identity` is in the catalog.
    #[must_use]
    pub fn contains(&self, identity: &str) -> bool {
        self.get(identity).is_some()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false` for a validated catalog.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_loads() {
        let catalog = PluginCatalog::builtin().unwrap();
        assert!(!catalog.is_empty());
        assert!(catalog.contains("@godspeedsystems/plugins-kafka-as-datasource-as-eventsource"));
        assert!(
            catalog
                .iter()
                .all(|d| d.identity.starts_with("@godspeedsystems/plugins-"))
        );
    }

    #[test]
    fn builtin_is_cached() {
        let a = PluginCatalog::builtin().unwrap();
        let b = PluginCatalog::builtin().unwrap();
        assert!(std::ptr::eq(a, b));
    }

    #[test]
    fn parses_camel_case_fields() {
        let catalog = PluginCatalog::from_json(
            r#"[{"identity":"@scope/plugins-x","displayName":"X","description":"the x"}]"#,
            "test",
        )
        .unwrap();
        let entry = catalog.get("@scope/plugins-x").unwrap();
        assert_eq!(entry.display_name, "X");
        assert_eq!(entry.description, "the x");
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn description_is_optional() {
        let catalog =
            PluginCatalog::from_json(r#"[{"identity":"a","displayName":"A"}]"#, "test").unwrap();
        assert_eq!(catalog.list()[0].description, "");
    }

    #[test]
    fn rejects_empty_catalog() {
        let err = PluginCatalog::from_json("[]", "test").unwrap_err();
        assert!(err.to_string().contains("catalog is empty"));
    }

    #[test]
    fn rejects_duplicates() {
        let json = r#"[
            {"identity":"a","displayName":"A"},
            {"identity":"a","displayName":"A again"}
        ]"#;
        let err = PluginCatalog::from_json(json, "test").unwrap_err();
        assert!(err.to_string().contains("duplicate identity: a"));
    }

    #[test]
    fn rejects_blank_identity() {
        let err = PluginCatalog::from_json(r#"[{"identity":"  ","displayName":"A"}]"#, "test")
            .unwrap_err();
        assert!(matches!(err, PluginError::Catalog { .. }));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = PluginCatalog::from_json("{not json", "broken.json").unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn missing_file_is_catalog_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = PluginCatalog::from_path(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, PluginError::Catalog { .. }));
    }

    #[test]
    fn from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, r#"[{"identity":"@s/plugins-y","displayName":"Y"}]"#).unwrap();
        let catalog = PluginCatalog::from_path(&path).unwrap();
        assert!(catalog.contains("@s/plugins-y"));
    }
}
