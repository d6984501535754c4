//! Shared fakes and fixtures for plugin manager tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use godspeed_plugins::{
    ContractLoadError, ContractLoader, InstallOutcome, IntegrationContract, ManagerSettings,
    PackageManager, PackageOperation, PackageRunner, PluginCatalog, PluginDescriptor,
    PluginManager, PluginResult, Selector,
};

pub const NAMESPACE: &str = "@scope/plugins-";

/// A recorded package manager call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunCall {
    pub operation: PackageOperation,
    pub identities: Vec<String>,
    /// Which of the watched paths existed when the call was made.
    pub existing: Vec<PathBuf>,
}

/// Package runner that records calls instead of spawning anything.
#[derive(Debug, Clone, Default)]
pub struct RecordingRunner {
    calls: Arc<Mutex<Vec<RunCall>>>,
    watch: Arc<Mutex<Vec<PathBuf>>>,
    exit_code: Option<i32>,
}

impl RecordingRunner {
    pub fn succeeding() -> Self {
        Self {
            exit_code: Some(0),
            ..Self::default()
        }
    }

    pub fn failing(code: i32) -> Self {
        Self {
            exit_code: Some(code),
            ..Self::default()
        }
    }

    /// Record whether `paths` exist at each call.
    pub fn watching(self, paths: Vec<PathBuf>) -> Self {
        *self.watch.lock().unwrap() = paths;
        self
    }

    pub fn calls(&self) -> Vec<RunCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PackageRunner for RecordingRunner {
    async fn run(
        &self,
        operation: PackageOperation,
        identities: &[String],
    ) -> PluginResult<InstallOutcome> {
        let existing = self
            .watch
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.exists())
            .cloned()
            .collect();
        self.calls.lock().unwrap().push(RunCall {
            operation,
            identities: identities.to_vec(),
            existing,
        });
        Ok(InstallOutcome {
            manager: PackageManager::Npm,
            operation,
            exit_code: self.exit_code,
            stderr: if self.exit_code == Some(0) {
                String::new()
            } else {
                "npm ERR! 404 Not Found\n".into()
            },
        })
    }
}

/// Contract loader backed by a map. Unknown identities fail to load.
#[derive(Debug, Clone, Default)]
pub struct MapLoader {
    contracts: Arc<Mutex<HashMap<String, IntegrationContract>>>,
    loads: Arc<Mutex<Vec<String>>>,
}

impl MapLoader {
    pub fn with(self, identity: &str, contract: IntegrationContract) -> Self {
        self.set(identity, contract);
        self
    }

    /// Change what `identity` declares, as an upgraded package would.
    pub fn set(&self, identity: &str, contract: IntegrationContract) {
        self.contracts
            .lock()
            .unwrap()
            .insert(identity.to_owned(), contract);
    }

    pub fn loads(&self) -> Vec<String> {
        self.loads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContractLoader for MapLoader {
    async fn load(&self, identity: &str) -> Result<IntegrationContract, ContractLoadError> {
        self.loads.lock().unwrap().push(identity.to_owned());
        self.contracts
            .lock()
            .unwrap()
            .get(identity)
            .cloned()
            .ok_or_else(|| {
                ContractLoadError::LoadFailed(format!("Cannot find module '{identity}'"))
            })
    }
}

/// Selector returning a fixed answer and recording what it was offered.
#[derive(Debug, Default)]
pub struct FixedSelector {
    answer: Vec<String>,
    offered: Mutex<Vec<Vec<String>>>,
}

impl FixedSelector {
    pub fn picking(identities: &[&str]) -> Self {
        Self {
            answer: identities.iter().map(|s| (*s).to_owned()).collect(),
            offered: Mutex::new(Vec::new()),
        }
    }

    pub fn nothing() -> Self {
        Self::default()
    }

    pub fn offered(&self) -> Vec<Vec<String>> {
        self.offered.lock().unwrap().clone()
    }
}

impl Selector for FixedSelector {
    fn choose(
        &self,
        rows: &[&PluginDescriptor],
        _operation: PackageOperation,
    ) -> PluginResult<Vec<String>> {
        self.offered
            .lock()
            .unwrap()
            .push(rows.iter().map(|d| d.identity.clone()).collect());
        Ok(self.answer.clone())
    }
}

/// Temporary project with a `package.json`.
pub struct Project {
    pub dir: tempfile::TempDir,
}

impl Project {
    pub fn new(dependencies: &[(&str, &str)]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let deps: serde_json::Map<String, serde_json::Value> = dependencies
            .iter()
            .map(|(k, v)| ((*k).to_owned(), serde_json::Value::String((*v).to_owned())))
            .collect();
        let manifest = serde_json::json!({ "name": "demo", "dependencies": deps });
        std::fs::write(
            dir.path().join("package.json"),
            serde_json::to_string_pretty(&manifest).unwrap(),
        )
        .unwrap();
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.path(relative)).unwrap()
    }

    /// Every file under `src`, relative to the project root, sorted.
    pub fn source_files(&self) -> Vec<String> {
        let mut files = Vec::new();
        collect_files(&self.path("src"), self.root(), &mut files);
        files.sort();
        files
    }
}

fn collect_files(dir: &Path, root: &Path, out: &mut Vec<String>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries {
        let path = entry.unwrap().path();
        if path.is_dir() {
            collect_files(&path, root, out);
        } else {
            out.push(
                path.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/"),
            );
        }
    }
}

pub fn catalog(identities: &[&str]) -> PluginCatalog {
    let entries: Vec<_> = identities
        .iter()
        .map(|id| serde_json::json!({ "identity": id, "displayName": id, "description": "" }))
        .collect();
    PluginCatalog::from_json(&serde_json::to_string(&entries).unwrap(), "test").unwrap()
}

pub fn manager(
    project: &Project,
    catalog: PluginCatalog,
    runner: &RecordingRunner,
    loader: &MapLoader,
) -> PluginManager {
    let mut settings = ManagerSettings::new(project.root());
    settings.namespace = NAMESPACE.into();
    PluginManager::new(&settings, catalog)
        .with_runner(Arc::new(runner.clone()))
        .with_contract_loader(Arc::new(loader.clone()))
}
