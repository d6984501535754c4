//! Module classification: find out what an installed plugin integrates as.
//!
//! The primary path loads the installed package and reads its exported
//! contract bindings. When that is not possible the contract is derived from
//! the package name, which never fails.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::contract::{IntegrationContract, Role};

/// Upper bound on one introspection run.
const INTROSPECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment variable carrying the package name into the script.
const IDENTITY_ENV: &str = "GODSPEED_PLUGIN_IDENTITY";

/// Resolves the package from the project, loads it as CommonJS or ESM, and
/// prints its four contract bindings as one JSON object.
const INTROSPECTION_SCRIPT: &str = r"
const id = process.env.GODSPEED_PLUGIN_IDENTITY;
const pick = (m) => {
  const src = m && m.SourceType === undefined && m.default ? m.default : m;
  return {
    SourceType: src.SourceType ?? null,
    Type: src.Type ?? null,
    CONFIG_FILE_NAME: src.CONFIG_FILE_NAME ?? null,
    DEFAULT_CONFIG: src.DEFAULT_CONFIG ?? null,
  };
};
(async () => {
  const resolved = require.resolve(id, { paths: [process.cwd()] });
  let mod;
  try {
    mod = require(resolved);
  } catch (err) {
    mod = await import(require('url').pathToFileURL(resolved).href);
  }
  process.stdout.write(JSON.stringify(pick(mod)));
})().catch((err) => {
  process.stderr.write(String((err && err.message) || err));
  process.exit(1);
});
";

/// Why the declared contract could not be read.
#[derive(Debug, thiserror::Error)]
pub enum ContractLoadError {
    /// The module runtime is not on `PATH`.
    #[error("{0} not found in PATH")]
    RuntimeNotFound(String),

    /// The runtime could not be started.
    #[error("failed to start {runtime}: {source}")]
    Spawn {
        /// Runtime executable.
        runtime: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Loading the module failed.
    #[error("module load failed: {0}")]
    LoadFailed(String),

    /// Introspection did not finish in time.
    #[error("module load timed out after {0}s")]
    Timeout(u64),

    /// The module loaded but its bindings are missing or invalid.
    #[error("invalid contract bindings: {0}")]
    InvalidBindings(String),
}

/// Capability that reads a plugin's declared contract.
#[async_trait]
pub trait ContractLoader: Send + Sync {
    /// Load `identity` and return the contract it declares.
    ///
    /// # Errors
    ///
    /// Returns a [`ContractLoadError`] when the module cannot be loaded or
    /// does not declare a usable contract.
    async fn load(&self, identity: &str) -> Result<IntegrationContract, ContractLoadError>;
}

/// Outcome of classifying one plugin.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassificationResult {
    /// The module declared its own contract.
    Declared(IntegrationContract),
    /// The contract was derived from the package name.
    Fallback {
        /// Heuristic contract.
        contract: IntegrationContract,
        /// Why the declared contract was not used.
        reason: String,
    },
}

impl ClassificationResult {
    /// The contract, whichever path produced it.
    #[must_use]
    pub fn contract(&self) -> &IntegrationContract {
        match self {
            Self::Declared(contract) | Self::Fallback { contract, .. } => contract,
        }
    }

    /// Consume into the contract.
    #[must_use]
    pub fn into_contract(self) -> IntegrationContract {
        match self {
            Self::Declared(contract) | Self::Fallback { contract, .. } => contract,
        }
    }

    /// Whether the heuristic path was taken.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Classifies installed plugins through a [`ContractLoader`].
#[derive(Clone)]
pub struct ModuleClassifier {
    loader: Arc<dyn ContractLoader>,
}

impl std::fmt::Debug for ModuleClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleClassifier").finish_non_exhaustive()
    }
}

impl ModuleClassifier {
    /// Create a classifier over `loader`.
    #[must_use]
    pub fn new(loader: Arc<dyn ContractLoader>) -> Self {
        Self { loader }
    }

    /// Classify `identity`. Never fails; a load error yields the fallback.
    pub async fn classify(&self, identity: &str) -> ClassificationResult {
        match self.loader.load(identity).await {
            Ok(contract) => {
                debug!(
                    identity,
                    role = %contract.role,
                    loader = %contract.loader_name,
                    "Classified plugin"
                );
                ClassificationResult::Declared(contract)
            },
            Err(e) => {
                let contract = fallback_contract(identity);
                warn!(
                    identity,
                    error = %e,
                    role = %contract.role,
                    loader = %contract.loader_name,
                    "Could not read plugin contract, deriving it from the package name"
                );
                ClassificationResult::Fallback {
                    contract,
                    reason: e.to_string(),
                }
            },
        }
    }
}

/// Derive a contract from a package name.
///
/// The token is the text after the last `/`, without a leading `plugins-`,
/// cut at the first `-as-`. `as-datasource` and `as-eventsource` markers pick
/// the role; both give [`Role::Both`], neither gives [`Role::EventSource`].
#[must_use]
pub fn fallback_contract(identity: &str) -> IntegrationContract {
    let base = identity.rsplit('/').next().unwrap_or(identity);
    let stripped = base.strip_prefix("plugins-").unwrap_or(base);
    let token = stripped
        .split_once("-as-")
        .map_or(stripped, |(head, _)| head);
    let loader_name = if token.is_empty() { base } else { token };

    let datasource = base.contains("as-datasource");
    let eventsource = base.contains("as-eventsource");
    let role = match (datasource, eventsource) {
        (true, true) => Role::Both,
        (true, false) => Role::DataSource,
        (false, _) => Role::EventSource,
    };

    IntegrationContract::new(role, loader_name)
}

// ---------------------------------------------------------------------------
// Node.js loader
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ModuleBindings {
    #[serde(rename = "SourceType")]
    source_type: Option<Role>,
    #[serde(rename = "Type")]
    loader_name: Option<String>,
    #[serde(rename = "CONFIG_FILE_NAME")]
    config_name: Option<String>,
    #[serde(rename = "DEFAULT_CONFIG")]
    default_config: Option<serde_json::Value>,
}

impl ModuleBindings {
    fn into_contract(self) -> Result<IntegrationContract, ContractLoadError> {
        let role = self.source_type.ok_or_else(|| {
            ContractLoadError::InvalidBindings("SourceType is not exported".into())
        })?;
        let loader_name = self
            .loader_name
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ContractLoadError::InvalidBindings("Type is not exported".into()))?;
        let config_name = self
            .config_name
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| loader_name.clone());
        let default_config = match self.default_config {
            None | Some(serde_json::Value::Null) => serde_json::Map::new(),
            Some(serde_json::Value::Object(map)) => map,
            Some(other) => {
                return Err(ContractLoadError::InvalidBindings(format!(
                    "DEFAULT_CONFIG is not an object: {other}"
                )));
            },
        };

        let contract = IntegrationContract::new(role, loader_name)
            .with_config_name(config_name)
            .with_default_config(default_config);
        contract
            .check_tokens()
            .map_err(ContractLoadError::InvalidBindings)?;
        Ok(contract)
    }
}

/// Parse the JSON printed by the introspection script.
///
/// # Errors
///
/// Returns `InvalidBindings` when the output is not the expected object or a
/// required binding is absent.
pub fn parse_bindings(output: &str) -> Result<IntegrationContract, ContractLoadError> {
    let bindings: ModuleBindings = serde_json::from_str(output.trim())
        .map_err(|e| ContractLoadError::InvalidBindings(e.to_string()))?;
    bindings.into_contract()
}

/// [`ContractLoader`] that asks Node.js to load the installed package.
#[derive(Debug, Clone)]
pub struct NodeContractLoader {
    project_root: PathBuf,
    node_binary: String,
}

impl NodeContractLoader {
    /// Loader resolving packages from `project_root` with `node_binary`.
    #[must_use]
    pub fn new(project_root: impl Into<PathBuf>, node_binary: impl Into<String>) -> Self {
        Self {
            project_root: project_root.into(),
            node_binary: node_binary.into(),
        }
    }
}

#[async_trait]
impl ContractLoader for NodeContractLoader {
    async fn load(&self, identity: &str) -> Result<IntegrationContract, ContractLoadError> {
        which::which(&self.node_binary)
            .map_err(|_| ContractLoadError::RuntimeNotFound(self.node_binary.clone()))?;

        let child = Command::new(&self.node_binary)
            .arg("-e")
            .arg(INTROSPECTION_SCRIPT)
            .env(IDENTITY_ENV, identity)
            .current_dir(&self.project_root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ContractLoadError::Spawn {
                runtime: self.node_binary.clone(),
                source,
            })?;

        let output = tokio::time::timeout(INTROSPECTION_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| ContractLoadError::Timeout(INTROSPECTION_TIMEOUT.as_secs()))?
            .map_err(|source| ContractLoadError::Spawn {
                runtime: self.node_binary.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ContractLoadError::LoadFailed(stderr.trim().to_owned()));
        }

        parse_bindings(&String::from_utf8_lossy(&output.stdout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_datasource() {
        let c = fallback_contract("@scope/plugins-redis-as-datasource");
        assert_eq!(c.role, Role::DataSource);
        assert_eq!(c.loader_name, "redis");
        assert_eq!(c.config_name, "redis");
        assert!(c.default_config.is_empty());
    }

    #[test]
    fn fallback_both() {
        let c = fallback_contract("@godspeedsystems/plugins-kafka-as-datasource-as-eventsource");
        assert_eq!(c.role, Role::Both);
        assert_eq!(c.loader_name, "kafka");
    }

    #[test]
    fn fallback_eventsource() {
        let c = fallback_contract("@godspeedsystems/plugins-cron-as-eventsource");
        assert_eq!(c.role, Role::EventSource);
        assert_eq!(c.loader_name, "cron");
    }

    #[test]
    fn fallback_without_markers_is_eventsource() {
        let c = fallback_contract("@godspeedsystems/plugins-express-as-http");
        assert_eq!(c.role, Role::EventSource);
        assert_eq!(c.loader_name, "express");

        let c = fallback_contract("plugins-prisma-as-datastore");
        assert_eq!(c.role, Role::EventSource);
        assert_eq!(c.loader_name, "prisma");
    }

    #[test]
    fn fallback_unscoped_without_suffix() {
        let c = fallback_contract("webhook");
        assert_eq!(c.loader_name, "webhook");
        assert_eq!(c.role, Role::EventSource);
    }

    #[test]
    fn parse_full_bindings() {
        let c = parse_bindings(
            r#"{"SourceType":"BOTH","Type":"kafka","CONFIG_FILE_NAME":"kafka-cluster",
                "DEFAULT_CONFIG":{"brokers":["localhost:9092"]}}"#,
        )
        .unwrap();
        assert_eq!(c.role, Role::Both);
        assert_eq!(c.loader_name, "kafka");
        assert_eq!(c.config_name, "kafka-cluster");
        assert_eq!(c.default_config["brokers"][0], "localhost:9092");
    }

    #[test]
    fn parse_defaults_config_name_and_mapping() {
        let c = parse_bindings(
            r#"{"SourceType":"DS","Type":"axios","CONFIG_FILE_NAME":null,"DEFAULT_CONFIG":null}"#,
        )
        .unwrap();
        assert_eq!(c.role, Role::DataSource);
        assert_eq!(c.config_name, "axios");
        assert!(c.default_config.is_empty());
    }

    #[test]
    fn parse_rejects_missing_role() {
        let err = parse_bindings(r#"{"SourceType":null,"Type":"x"}"#).unwrap_err();
        assert!(matches!(err, ContractLoadError::InvalidBindings(_)));
    }

    #[test]
    fn parse_rejects_unknown_role() {
        assert!(parse_bindings(r#"{"SourceType":"Cache","Type":"x"}"#).is_err());
    }

    #[test]
    fn parse_rejects_non_object_default() {
        let output = r#"{"SourceType":"ES","Type":"cron","DEFAULT_CONFIG":[1]}"#;
        let err = parse_bindings(output).unwrap_err();
        assert!(err.to_string().contains("DEFAULT_CONFIG"));
    }

    #[test]
    fn parse_rejects_path_like_tokens() {
        for output in [
            r#"{"SourceType":"ES","Type":"../../../escaped"}"#,
            r#"{"SourceType":"DS","Type":"redis","CONFIG_FILE_NAME":"/etc/redis"}"#,
            r#"{"SourceType":"DS","Type":"redis","CONFIG_FILE_NAME":"..\\cfg"}"#,
        ] {
            let err = parse_bindings(output).unwrap_err();
            assert!(matches!(err, ContractLoadError::InvalidBindings(_)), "{output}");
        }
    }

    struct Escaping;

    #[async_trait]
    impl ContractLoader for Escaping {
        async fn load(&self, _identity: &str) -> Result<IntegrationContract, ContractLoadError> {
            parse_bindings(r#"{"SourceType":"ES","Type":"../../../escaped"}"#)
        }
    }

    #[tokio::test]
    async fn path_like_tokens_fall_back_to_the_name() {
        let classifier = ModuleClassifier::new(Arc::new(Escaping));
        let result = classifier.classify("@scope/plugins-cron-as-eventsource").await;
        assert!(result.is_fallback());
        assert_eq!(result.contract().loader_name, "cron");
    }

    struct Failing;

    #[async_trait]
    impl ContractLoader for Failing {
        async fn load(&self, _identity: &str) -> Result<IntegrationContract, ContractLoadError> {
            Err(ContractLoadError::LoadFailed("Cannot find module".into()))
        }
    }

    #[tokio::test]
    async fn load_failure_falls_back() {
        let classifier = ModuleClassifier::new(Arc::new(Failing));
        let result = classifier
            .classify("@scope/plugins-redis-as-datasource")
            .await;
        assert!(result.is_fallback());
        let ClassificationResult::Fallback { contract, reason } = result else {
            unreachable!()
        };
        assert_eq!(contract.loader_name, "redis");
        assert!(reason.contains("Cannot find module"));
    }

    #[tokio::test]
    async fn missing_runtime_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let loader = NodeContractLoader::new(dir.path(), "godspeed-no-such-node-binary");
        let err = loader.load("@scope/plugins-x").await.unwrap_err();
        assert!(matches!(err, ContractLoadError::RuntimeNotFound(_)));
    }
}
