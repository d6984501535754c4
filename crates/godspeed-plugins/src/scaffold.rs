//! Scaffold generation: the loader stubs and declarative configs a plugin
//! contract implies inside the project source tree.
//!
//! Layout, per side of the contract's role:
//!
//! ```text
//! <src>/datasources/types/<loaderName>.ts
//! <src>/datasources/<configName>.yaml
//! <src>/eventsources/types/<loaderName>.ts
//! <src>/eventsources/<configName>.yaml
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::contract::{IntegrationContract, Side};

/// Directory holding loader stubs inside each side's directory.
const TYPES_DIR: &str = "types";

/// What a generated file is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// TypeScript module re-exporting the plugin's class.
    LoaderStub,
    /// YAML config seeded with `type` and the default config.
    Config,
}

/// One generated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaffoldArtifact {
    /// Integration side it belongs to.
    pub side: Side,
    /// Stub or config.
    pub kind: ArtifactKind,
    /// Absolute or project-relative path, as given to the generator.
    pub path: PathBuf,
}

/// The files one contract materializes, datasource side first.
pub type ScaffoldArtifactSet = Vec<ScaffoldArtifact>;

/// A file that could not be written or removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactFailure {
    /// The file.
    pub path: PathBuf,
    /// What went wrong.
    pub error: String,
}

/// What a write or erase pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScaffoldReport {
    /// Files written, or removed when erasing.
    pub touched: Vec<PathBuf>,
    /// Files that failed. Other files in the set were still attempted.
    pub failures: Vec<ArtifactFailure>,
}

impl ScaffoldReport {
    /// Whether every file succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn fail(&mut self, path: &Path, error: impl ToString) {
        self.failures.push(ArtifactFailure {
            path: path.to_path_buf(),
            error: error.to_string(),
        });
    }
}

/// Writes and removes plugin artifacts under a project's source directory.
#[derive(Debug, Clone)]
pub struct ScaffoldGenerator {
    source_root: PathBuf,
    prisma_loader: String,
}

impl ScaffoldGenerator {
    /// Generator rooted at `source_root` (usually `<project>/src`).
    ///
    /// `prisma_loader` is the loader token whose datasource config is
    /// managed by the plugin itself and never generated.
    #[must_use]
    pub fn new(source_root: impl Into<PathBuf>, prisma_loader: impl Into<String>) -> Self {
        Self {
            source_root: source_root.into(),
            prisma_loader: prisma_loader.into(),
        }
    }

    /// The source directory artifacts live under.
    #[must_use]
    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Files `contract` materializes. Touches nothing.
    ///
    /// # Errors
    ///
    /// Returns a message when a token would place a file outside its side
    /// directory.
    pub fn artifacts(&self, contract: &IntegrationContract) -> Result<ScaffoldArtifactSet, String> {
        contract.check_tokens()?;
        let mut set = Vec::with_capacity(4);
        for &side in contract.role.sides() {
            let side_dir = self.source_root.join(side.dir_name());
            set.push(ScaffoldArtifact {
                side,
                kind: ArtifactKind::LoaderStub,
                path: side_dir
                    .join(TYPES_DIR)
                    .join(format!("{}.ts", contract.loader_name)),
            });
            if side == Side::DataSource && contract.loader_name == self.prisma_loader {
                continue;
            }
            set.push(ScaffoldArtifact {
                side,
                kind: ArtifactKind::Config,
                path: side_dir.join(format!("{}.yaml", contract.config_name)),
            });
        }
        Ok(set)
    }

    /// Artifact set for `contract`, or a failure recorded against the source
    /// root when the contract's tokens are unusable.
    fn planned(
        &self,
        identity: &str,
        contract: &IntegrationContract,
        report: &mut ScaffoldReport,
    ) -> ScaffoldArtifactSet {
        self.artifacts(contract).unwrap_or_else(|e| {
            warn!(identity, error = %e, "Refusing to touch artifacts");
            report.fail(&self.source_root, e);
            Vec::new()
        })
    }

    /// Write every artifact of `contract`, overwriting existing files.
    pub async fn write(&self, identity: &str, contract: &IntegrationContract) -> ScaffoldReport {
        let mut report = ScaffoldReport::default();
        for artifact in self.planned(identity, contract, &mut report) {
            let contents = match artifact.kind {
                ArtifactKind::LoaderStub => Ok(loader_stub(identity, artifact.side)),
                ArtifactKind::Config => config_yaml(contract),
            };
            let result = match contents {
                Ok(contents) => write_file(&artifact.path, &contents).await,
                Err(e) => Err(e),
            };
            let path = artifact.path;
            match result {
                Ok(()) => {
                    debug!(identity, path = %path.display(), "Wrote artifact");
                    report.touched.push(path);
                },
                Err(e) => {
                    warn!(identity, path = %path.display(), error = %e, "Failed to write artifact");
                    report.fail(&path, e);
                },
            }
        }
        info!(
            identity,
            written = report.touched.len(),
            failed = report.failures.len(),
            "Scaffolded plugin"
        );
        report
    }

    /// Remove every artifact of `contract`. Missing files are skipped.
    pub async fn erase(&self, identity: &str, contract: &IntegrationContract) -> ScaffoldReport {
        let mut report = ScaffoldReport::default();
        for artifact in self.planned(identity, contract, &mut report) {
            let path = artifact.path;
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    debug!(identity, path = %path.display(), "Removed artifact");
                    report.touched.push(path);
                },
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!(identity, path = %path.display(), "Artifact already absent");
                },
                Err(e) => {
                    warn!(
                        identity,
                        path = %path.display(),
                        error = %e,
                        "Failed to remove artifact"
                    );
                    report.fail(&path, e);
                },
            }
        }
        info!(
            identity,
            removed = report.touched.len(),
            failed = report.failures.len(),
            "Erased plugin artifacts"
        );
        report
    }
}

/// Loader stub re-exporting the side's class from `identity`.
#[must_use]
pub fn loader_stub(identity: &str, side: Side) -> String {
    let class = side.export_name();
    format!("import {{ {class} }} from '{identity}';\nexport default {class};\n")
}

/// Declarative config: `type` first, then the default config keys.
///
/// A `type` key in the default config replaces the seeded one.
///
/// # Errors
///
/// Returns a message if the default config cannot be represented as YAML.
pub fn config_yaml(contract: &IntegrationContract) -> Result<String, String> {
    let mut mapping = serde_yaml::Mapping::new();
    mapping.insert(
        serde_yaml::Value::String("type".into()),
        serde_yaml::Value::String(contract.loader_name.clone()),
    );
    for (key, value) in &contract.default_config {
        let value = serde_yaml::to_value(value).map_err(|e| e.to_string())?;
        mapping.insert(serde_yaml::Value::String(key.clone()), value);
    }
    serde_yaml::to_string(&mapping).map_err(|e| e.to_string())
}

async fn write_file(path: &Path, contents: &str) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| format!("failed to create {}: {e}", parent.display()))?;
    }
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| e.to_string())
}
