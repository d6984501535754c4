//! Plugin manager: the add / remove / update lifecycle over a project.
//!
//! Every operation resolves its targets (a named identity or an interactive
//! selection), then drives the installer, classifier and scaffold generator.
//! Installer failures abort the operation; classification fallbacks and
//! per-file artifact failures are collected into the report.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use crate::catalog::{PluginCatalog, PluginDescriptor};
use crate::classify::{ClassificationResult, ContractLoader, ModuleClassifier, NodeContractLoader};
use crate::dependency::ProjectDependencyIndex;
use crate::error::{PluginError, PluginResult};
use crate::installer::{
    InstallOutcome, PackageInstaller, PackageManager, PackageOperation, PackageRunner,
};
use crate::scaffold::{ScaffoldGenerator, ScaffoldReport};
use crate::selection::Selector;

/// Settings the manager is built from.
#[derive(Debug, Clone)]
pub struct ManagerSettings {
    /// Project root holding `package.json`.
    pub project_root: PathBuf,
    /// Package name prefix identifying plugins.
    pub namespace: String,
    /// Source directory, relative to the project root.
    pub source_dir: PathBuf,
    /// Loader token whose datasource config is never generated.
    pub prisma_loader: String,
    /// Executable used to introspect installed modules.
    pub node_binary: String,
    /// Package managers in order of preference.
    pub package_managers: Vec<PackageManager>,
}

impl ManagerSettings {
    /// Settings for `project_root` with the stock Godspeed values.
    #[must_use]
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            namespace: "@godspeedsystems/plugins-".into(),
            source_dir: PathBuf::from("src"),
            prisma_loader: "prisma".into(),
            node_binary: "node".into(),
            package_managers: vec![PackageManager::Pnpm, PackageManager::Npm],
        }
    }
}

/// What happened to one plugin during an operation.
#[derive(Debug, Clone)]
pub struct PluginOutcome {
    /// Package name.
    pub identity: String,
    /// Contract used for the artifacts. After an update this is the new one.
    pub classification: ClassificationResult,
    /// Artifacts removed. Set by remove, and by update when tokens changed.
    pub erased: Option<ScaffoldReport>,
    /// Artifacts written. Set by add, and by update when tokens changed.
    pub written: Option<ScaffoldReport>,
}

impl PluginOutcome {
    /// Whether the contract came from the name heuristic.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.classification.is_fallback()
    }

    /// Whether any artifact write or removal failed.
    #[must_use]
    pub fn has_artifact_failures(&self) -> bool {
        [&self.erased, &self.written]
            .into_iter()
            .flatten()
            .any(|r| !r.is_clean())
    }
}

/// Result of one lifecycle operation.
#[derive(Debug, Clone)]
pub struct OperationReport {
    /// The operation.
    pub operation: PackageOperation,
    /// Per-plugin results, in selection order.
    pub plugins: Vec<PluginOutcome>,
    /// The package manager run, absent when nothing was selected.
    pub install: Option<InstallOutcome>,
}

impl OperationReport {
    fn nothing(operation: PackageOperation) -> Self {
        Self {
            operation,
            plugins: Vec::new(),
            install: None,
        }
    }

    /// Whether the selection was empty and nothing ran.
    #[must_use]
    pub fn nothing_selected(&self) -> bool {
        self.install.is_none() && self.plugins.is_empty()
    }

    /// Number of plugins whose contract came from the name heuristic.
    #[must_use]
    pub fn fallback_count(&self) -> usize {
        self.plugins.iter().filter(|p| p.is_fallback()).count()
    }

    /// Number of plugins with at least one failed artifact.
    #[must_use]
    pub fn artifact_failure_count(&self) -> usize {
        self.plugins
            .iter()
            .filter(|p| p.has_artifact_failures())
            .count()
    }
}

/// A catalog entry with its installed version, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginListing {
    /// The catalog entry.
    pub descriptor: PluginDescriptor,
    /// Version spec from `package.json` when the plugin is a dependency.
    pub installed: Option<String>,
}

/// Orchestrates plugin operations for one project.
#[derive(Clone)]
pub struct PluginManager {
    catalog: PluginCatalog,
    index: ProjectDependencyIndex,
    runner: Arc<dyn PackageRunner>,
    classifier: ModuleClassifier,
    scaffold: ScaffoldGenerator,
}

impl std::fmt::Debug for PluginManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginManager")
            .field("catalog_len", &self.catalog.len())
            .field("index", &self.index)
            .field("scaffold", &self.scaffold)
            .finish_non_exhaustive()
    }
}

impl PluginManager {
    /// Manager using the real package manager and Node.js introspection.
    #[must_use]
    pub fn new(settings: &ManagerSettings, catalog: PluginCatalog) -> Self {
        let root = &settings.project_root;
        Self {
            catalog,
            index: ProjectDependencyIndex::new(root, settings.namespace.clone()),
            runner: Arc::new(PackageInstaller::new(root, settings.package_managers.clone())),
            classifier: ModuleClassifier::new(Arc::new(NodeContractLoader::new(
                root,
                settings.node_binary.clone(),
            ))),
            scaffold: ScaffoldGenerator::new(
                root.join(&settings.source_dir),
                settings.prisma_loader.clone(),
            ),
        }
    }

    /// Replace the package runner.
    #[must_use]
    pub fn with_runner(mut self, runner: Arc<dyn PackageRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Replace the contract loader.
    #[must_use]
    pub fn with_contract_loader(mut self, loader: Arc<dyn ContractLoader>) -> Self {
        self.classifier = ModuleClassifier::new(loader);
        self
    }

    /// The catalog in use.
    #[must_use]
    pub fn catalog(&self) -> &PluginCatalog {
        &self.catalog
    }

    /// The project's dependency index.
    #[must_use]
    pub fn index(&self) -> &ProjectDependencyIndex {
        &self.index
    }

    /// Directory artifacts are generated under.
    #[must_use]
    pub fn source_root(&self) -> &Path {
        self.scaffold.source_root()
    }

    /// Every catalog entry with its installed version.
    ///
    /// # Errors
    ///
    /// Returns `ProjectManifest` if `package.json` cannot be read.
    pub fn list(&self) -> PluginResult<Vec<PluginListing>> {
        let records = self.index.records()?;
        Ok(self
            .catalog
            .iter()
            .map(|descriptor| PluginListing {
                installed: records
                    .iter()
                    .find(|r| r.identity == descriptor.identity)
                    .map(|r| r.version_spec.clone()),
                descriptor: descriptor.clone(),
            })
            .collect())
    }

    /// Install plugins and scaffold their artifacts.
    ///
    /// `name` bypasses selection but must be in the catalog. Otherwise the
    /// selector is offered the catalog entries not yet installed.
    ///
    /// # Errors
    ///
    /// Returns `UnknownPlugin` for a name outside the catalog (before anything
    /// runs), `ProjectManifest` when offering a selection without a readable
    /// `package.json`, and installer errors when the batch fails. A failed
    /// batch writes no artifacts.
    pub async fn add(
        &self,
        name: Option<&str>,
        selector: &dyn Selector,
    ) -> PluginResult<OperationReport> {
        let identities = match name {
            Some(identity) => {
                if !self.catalog.contains(identity) {
                    return Err(PluginError::UnknownPlugin(identity.to_owned()));
                }
                vec![identity.to_owned()]
            },
            None => {
                let rows = self.index.missing(&self.catalog)?;
                selector.choose(&rows, PackageOperation::Add)?
            },
        };
        if identities.is_empty() {
            info!("No plugins selected to add");
            return Ok(OperationReport::nothing(PackageOperation::Add));
        }

        let install = self
            .runner
            .run(PackageOperation::Add, &identities)
            .await?
            .into_result()?;

        let plugins = join_all(identities.iter().map(|identity| async move {
            let classification = self.classifier.classify(identity).await;
            let written = self.scaffold.write(identity, classification.contract()).await;
            PluginOutcome {
                identity: identity.clone(),
                classification,
                erased: None,
                written: Some(written),
            }
        }))
        .await;

        Ok(OperationReport {
            operation: PackageOperation::Add,
            plugins,
            install: Some(install),
        })
    }

    /// Remove plugin artifacts, then uninstall the packages.
    ///
    /// Artifacts are located by classifying the still-installed module, so
    /// every deletion finishes before the uninstall command starts.
    ///
    /// # Errors
    ///
    /// Returns `ProjectManifest` when offering a selection without a readable
    /// `package.json`, and installer errors when the batch fails.
    pub async fn remove(
        &self,
        name: Option<&str>,
        selector: &dyn Selector,
    ) -> PluginResult<OperationReport> {
        let identities = self.installed_targets(name, selector, PackageOperation::Remove)?;
        if identities.is_empty() {
            info!("No plugins selected to remove");
            return Ok(OperationReport::nothing(PackageOperation::Remove));
        }

        let plugins = join_all(identities.iter().map(|identity| async move {
            let classification = self.classifier.classify(identity).await;
            let erased = self.scaffold.erase(identity, classification.contract()).await;
            PluginOutcome {
                identity: identity.clone(),
                classification,
                erased: Some(erased),
                written: None,
            }
        }))
        .await;

        let install = self
            .runner
            .run(PackageOperation::Remove, &identities)
            .await?
            .into_result()?;

        Ok(OperationReport {
            operation: PackageOperation::Remove,
            plugins,
            install: Some(install),
        })
    }

    /// Upgrade plugins, rescaffolding only those whose contract tokens changed.
    ///
    /// # Errors
    ///
    /// Returns `ProjectManifest` when offering a selection without a readable
    /// `package.json`, and installer errors when the batch fails.
    pub async fn update(
        &self,
        name: Option<&str>,
        selector: &dyn Selector,
    ) -> PluginResult<OperationReport> {
        let identities = self.installed_targets(name, selector, PackageOperation::Update)?;
        if identities.is_empty() {
            info!("No plugins selected to update");
            return Ok(OperationReport::nothing(PackageOperation::Update));
        }

        let before = join_all(identities.iter().map(|id| self.classifier.classify(id))).await;

        let install = self
            .runner
            .run(PackageOperation::Update, &identities)
            .await?
            .into_result()?;

        let plugins = join_all(identities.iter().zip(before).map(|(identity, previous)| async move {
            let classification = self.classifier.classify(identity).await;
            let changed = previous.contract().tokens_differ(classification.contract());
            let (erased, written) = if changed {
                info!(identity = %identity, "Plugin contract changed, regenerating artifacts");
                let erased = self.scaffold.erase(identity, previous.contract()).await;
                let written = self.scaffold.write(identity, classification.contract()).await;
                (Some(erased), Some(written))
            } else {
                (None, None)
            };
            PluginOutcome {
                identity: identity.clone(),
                classification,
                erased,
                written,
            }
        }))
        .await;

        Ok(OperationReport {
            operation: PackageOperation::Update,
            plugins,
            install: Some(install),
        })
    }

    fn installed_targets(
        &self,
        name: Option<&str>,
        selector: &dyn Selector,
        operation: PackageOperation,
    ) -> PluginResult<Vec<String>> {
        match name {
            Some(identity) => {
                if !self.catalog.contains(identity) {
                    warn!(identity, %operation, "Plugin is not in the catalog");
                }
                Ok(vec![identity.to_owned()])
            },
            None => {
                let rows = self.index.common(&self.catalog)?;
                selector.choose(&rows, operation)
            },
        }
    }
}
