//! Integration contract: what a plugin declares about how it wires into a project.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which integration side(s) a plugin provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Outbound integration (the project calls it).
    #[serde(alias = "DS")]
    DataSource,
    /// Inbound integration (it calls into the project).
    #[serde(alias = "ES")]
    EventSource,
    /// Both a datasource and an eventsource.
    #[serde(alias = "BOTH")]
    Both,
}

/// A single integration side. `Role::Both` expands into both of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// The datasource side.
    DataSource,
    /// The eventsource side.
    EventSource,
}

impl Role {
    /// The sides this role materializes, datasource first.
    #[must_use]
    pub fn sides(self) -> &'static [Side] {
        match self {
            Self::DataSource => &[Side::DataSource],
            Self::EventSource => &[Side::EventSource],
            Self::Both => &[Side::DataSource, Side::EventSource],
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DataSource => write!(f, "datasource"),
            Self::EventSource => write!(f, "eventsource"),
            Self::Both => write!(f, "datasource+eventsource"),
        }
    }
}

impl Side {
    /// Directory under the project source root holding this side's artifacts.
    #[must_use]
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::DataSource => "datasources",
            Self::EventSource => "eventsources",
        }
    }

    /// Name of the class a plugin package exports for this side.
    #[must_use]
    pub fn export_name(self) -> &'static str {
        match self {
            Self::DataSource => "DataSource",
            Self::EventSource => "EventSource",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DataSource => write!(f, "datasource"),
            Self::EventSource => write!(f, "eventsource"),
        }
    }
}

/// The declared shape of an installed plugin module.
///
/// Never persisted: an upgraded package may declare different tokens, so
/// every operation that needs a contract classifies the module again.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegrationContract {
    /// Which side(s) the plugin provides.
    pub role: Role,
    /// Token used for loader stub basenames and as the config `type`.
    pub loader_name: String,
    /// Token naming the generated declarative config file.
    pub config_name: String,
    /// Mapping merged into the generated config after `type`.
    pub default_config: serde_json::Map<String, serde_json::Value>,
}

impl IntegrationContract {
    /// Contract with `config_name == loader_name` and no default config.
    #[must_use]
    pub fn new(role: Role, loader_name: impl Into<String>) -> Self {
        let loader_name = loader_name.into();
        Self {
            role,
            config_name: loader_name.clone(),
            loader_name,
            default_config: serde_json::Map::new(),
        }
    }

    /// Set the config token.
    #[must_use]
    pub fn with_config_name(mut self, config_name: impl Into<String>) -> Self {
        self.config_name = config_name.into();
        self
    }

    /// Set the default config mapping.
    #[must_use]
    pub fn with_default_config(
        mut self,
        default_config: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        self.default_config = default_config;
        self
    }

    /// Check that both tokens are usable as single file name components.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first offending token.
    pub fn check_tokens(&self) -> Result<(), String> {
        for (label, token) in [("loader", &self.loader_name), ("config", &self.config_name)] {
            if !is_file_token(token) {
                return Err(format!("{label} token '{token}' is not a plain file name"));
            }
        }
        Ok(())
    }

    /// Whether two contracts would produce different artifact paths.
    ///
    /// Only the role and the two tokens decide file locations; a changed
    /// default config alone does not move anything.
    #[must_use]
    pub fn tokens_differ(&self, other: &Self) -> bool {
        self.role != other.role
            || self.loader_name != other.loader_name
            || self.config_name != other.config_name
    }
}

/// Whether `token` names a file inside its directory: non-empty, no path
/// separators, no drive prefix, no `..`.
#[must_use]
pub fn is_file_token(token: &str) -> bool {
    !token.trim().is_empty()
        && token != "."
        && !token.contains("..")
        && !token.contains(['/', '\\', ':', '\0'])
}
