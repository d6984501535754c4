//! Plugin integration manager for Godspeed projects.
//!
//! Plugins are npm packages under a shared namespace that integrate into a
//! project as datasources, eventsources, or both. This crate manages their
//! lifecycle:
//!
//! - [`PluginCatalog`]: the fixed registry of known plugins
//! - [`ProjectDependencyIndex`]: which plugins `package.json` already declares
//! - [`PackageInstaller`]: one package manager batch per operation
//! - [`ModuleClassifier`]: reads the [`IntegrationContract`] an installed
//!   module declares, deriving it from the package name when it cannot
//! - [`ScaffoldGenerator`]: writes and removes the loader stubs and configs
//!   a contract implies
//! - [`PluginManager`]: the `add`, `remove` and `update` operations
//!
//! # Generated layout
//!
//! ```text
//! src/datasources/types/<loader>.ts     src/eventsources/types/<loader>.ts
//! src/datasources/<config>.yaml         src/eventsources/<config>.yaml
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod catalog;
pub mod classify;
pub mod contract;
pub mod dependency;
pub mod error;
pub mod installer;
pub mod manager;
pub mod scaffold;
pub mod selection;

pub use catalog::{PluginCatalog, PluginDescriptor};
pub use classify::{
    ClassificationResult, ContractLoadError, ContractLoader, ModuleClassifier, NodeContractLoader,
    fallback_contract,
};
pub use contract::{IntegrationContract, Role, Side};
pub use dependency::{DependencyRecord, ProjectDependencyIndex};
pub use error::{PluginError, PluginResult};
pub use installer::{
    InstallOutcome, PackageInstaller, PackageManager, PackageOperation, PackageRunner,
};
pub use manager::{ManagerSettings, OperationReport, PluginListing, PluginManager, PluginOutcome};
pub use scaffold::{
    ArtifactFailure, ArtifactKind, ScaffoldArtifact, ScaffoldArtifactSet, ScaffoldGenerator,
    ScaffoldReport,
};
pub use selection::{Selector, filter_rows};
