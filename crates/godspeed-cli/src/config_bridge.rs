//! Conversions from the unified [`Config`] into domain types.

use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use godspeed_config::Config;
use godspeed_plugins::installer::OUTPUT_TARGET;
use godspeed_plugins::{ManagerSettings, PackageManager, PluginCatalog};
use godspeed_telemetry::{LogConfig, LogFormat};

/// Convert config to [`LogConfig`]. `verbose` forces the `debug` level.
pub(crate) fn to_log_config(cfg: &Config, verbose: bool) -> LogConfig {
    let format = cfg.logging.format.parse::<LogFormat>().unwrap_or_default();
    let level = if verbose { "debug" } else { cfg.logging.level.as_str() };

    LogConfig::new(level)
        .with_format(format)
        .with_directives(cfg.logging.directives.iter().cloned())
}

/// Logging used when the config itself could not be loaded.
pub(crate) fn fallback_log_config(verbose: bool) -> LogConfig {
    let level = if verbose { "debug" } else { "warn" };
    LogConfig::new(level)
        .with_format(LogFormat::Compact)
        .with_directive(format!("{OUTPUT_TARGET}=info"))
}

/// Convert config to [`ManagerSettings`] for the project at `project_root`.
pub(crate) fn to_manager_settings(
    cfg: &Config,
    project_root: &Path,
) -> anyhow::Result<ManagerSettings> {
    let package_managers = cfg
        .plugins
        .package_managers
        .iter()
        .map(|name| name.parse::<PackageManager>().map_err(|e| anyhow!(e)))
        .collect::<anyhow::Result<Vec<_>>>()
        .context("invalid plugins.package_managers")?;

    Ok(ManagerSettings {
        project_root: project_root.to_path_buf(),
        namespace: cfg.plugins.namespace.clone(),
        source_dir: PathBuf::from(cfg.project.source_dir.trim()),
        prisma_loader: cfg.plugins.prisma_loader.clone(),
        node_binary: cfg.plugins.node_binary.clone(),
        package_managers,
    })
}

/// Load the configured catalog, or the built-in one.
pub(crate) fn load_catalog(cfg: &Config) -> anyhow::Result<PluginCatalog> {
    match cfg.plugins.catalog_file() {
        Some(path) => PluginCatalog::from_path(&path)
            .with_context(|| format!("failed to load plugin catalog {}", path.display())),
        None => Ok(PluginCatalog::builtin()
            .context("failed to load the built-in plugin catalog")?
            .clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_from_defaults() {
        let lc = to_log_config(&Config::default(), false);
        assert_eq!(lc.level, "warn");
        assert_eq!(lc.format, LogFormat::Compact);
        assert_eq!(lc.directives, vec![format!("{OUTPUT_TARGET}=info")]);
    }

    #[test]
    fn test_fallback_keeps_package_manager_output() {
        let lc = fallback_log_config(false);
        assert_eq!(lc.level, "warn");
        assert_eq!(lc.directives, vec![format!("{OUTPUT_TARGET}=info")]);
    }

    #[test]
    fn test_verbose_forces_debug() {
        let mut cfg = Config::default();
        cfg.logging.level = "error".into();
        cfg.logging.format = "json".into();
        cfg.logging.directives = vec!["godspeed_plugins=trace".into()];

        let lc = to_log_config(&cfg, true);
        assert_eq!(lc.level, "debug");
        assert_eq!(lc.format, LogFormat::Json);
        assert_eq!(lc.directives, vec!["godspeed_plugins=trace"]);
    }

    #[test]
    fn test_manager_settings() {
        let mut cfg = Config::default();
        cfg.plugins.package_managers = vec!["Yarn".into(), "npm".into()];
        cfg.project.source_dir = "app".into();

        let settings = to_manager_settings(&cfg, Path::new("/work/project")).unwrap();
        assert_eq!(settings.project_root, PathBuf::from("/work/project"));
        assert_eq!(settings.source_dir, PathBuf::from("app"));
        assert_eq!(
            settings.package_managers,
            vec![PackageManager::Yarn, PackageManager::Npm]
        );
        assert_eq!(settings.namespace, "@godspeedsystems/plugins-");
    }

    #[test]
    fn test_manager_settings_rejects_unknown_manager() {
        let mut cfg = Config::default();
        cfg.plugins.package_managers = vec!["cargo".into()];
        assert!(to_manager_settings(&cfg, Path::new(".")).is_err());
    }

    #[test]
    fn test_builtin_catalog() {
        let catalog = load_catalog(&Config::default()).unwrap();
        assert!(catalog.contains("@godspeedsystems/plugins-redis-as-datasource"));
    }

    #[test]
    fn test_catalog_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(
            &path,
            r#"[{"identity": "@acme/plugins-queue-as-eventsource", "displayName": "Queue"}]"#,
        )
        .unwrap();

        let mut cfg = Config::default();
        cfg.plugins.catalog_path = path.display().to_string();
        let catalog = load_catalog(&cfg).unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.contains("@acme/plugins-queue-as-eventsource"));
    }

    #[test]
    fn test_missing_catalog_file() {
        let mut cfg = Config::default();
        cfg.plugins.catalog_path = "/nonexistent/catalog.json".into();
        assert!(load_catalog(&cfg).is_err());
    }
}
