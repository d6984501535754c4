//! Package manager invocation for plugin batches.
//!
//! One call issues exactly one child process covering every identity in the
//! batch. The first configured manager found on `PATH` wins.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::str::FromStr;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{PluginError, PluginResult};

/// Tracing target for lines the package manager prints.
pub const OUTPUT_TARGET: &str = "godspeed::package_manager";

/// A supported JavaScript package manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageManager {
    /// `pnpm`
    Pnpm,
    /// `npm`
    Npm,
    /// `yarn`
    Yarn,
    /// `bun`
    Bun,
}

/// The batch operation to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageOperation {
    /// Install packages.
    Add,
    /// Uninstall packages.
    Remove,
    /// Upgrade packages.
    Update,
}

impl PackageManager {
    /// Every supported manager.
    pub const ALL: [Self; 4] = [Self::Pnpm, Self::Npm, Self::Yarn, Self::Bun];

    /// Executable name looked up on `PATH`.
    #[must_use]
    pub fn executable(self) -> &'static str {
        match self {
            Self::Pnpm => "pnpm",
            Self::Npm => "npm",
            Self::Yarn => "yarn",
            Self::Bun => "bun",
        }
    }

    /// Subcommand this manager uses for `operation`.
    #[must_use]
    pub fn subcommand(self, operation: PackageOperation) -> &'static str {
        match (self, operation) {
            (Self::Npm, PackageOperation::Add) => "install",
            (Self::Npm, PackageOperation::Remove) => "uninstall",
            (Self::Yarn, PackageOperation::Update) => "upgrade",
            (_, PackageOperation::Add) => "add",
            (_, PackageOperation::Remove) => "remove",
            (_, PackageOperation::Update) => "update",
        }
    }

    /// Full argument vector (without the executable) for a batch.
    #[must_use]
    pub fn args(self, operation: PackageOperation, identities: &[String]) -> Vec<String> {
        std::iter::once(self.subcommand(operation).to_owned())
            .chain(identities.iter().cloned())
            .collect()
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.executable())
    }
}

impl FromStr for PackageManager {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.executable().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown package manager: {s}"))
    }
}

impl fmt::Display for PackageOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => write!(f, "add"),
            Self::Remove => write!(f, "remove"),
            Self::Update => write!(f, "update"),
        }
    }
}

/// Result of a finished package manager child process.
#[derive(Debug, Clone)]
pub struct InstallOutcome {
    /// The manager that ran.
    pub manager: PackageManager,
    /// The batch operation.
    pub operation: PackageOperation,
    /// Exit code, `None` when terminated by a signal.
    pub exit_code: Option<i32>,
    /// Captured standard error.
    pub stderr: String,
}

impl InstallOutcome {
    /// Whether the child exited with status zero.
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Turn a non-zero exit into [`PluginError::InstallFailed`].
    ///
    /// # Errors
    ///
    /// Returns `InstallFailed` when the child did not exit with status zero.
    pub fn into_result(self) -> PluginResult<Self> {
        if self.success() {
            return Ok(self);
        }
        Err(PluginError::InstallFailed {
            manager: self.manager,
            operation: self.operation,
            exit_code: self.exit_code,
            stderr: self.stderr.trim().to_owned(),
        })
    }
}

/// Runs one package manager batch.
#[async_trait]
pub trait PackageRunner: Send + Sync {
    /// Run `operation` over `identities` as a single child process.
    ///
    /// A non-zero exit is reported in the returned outcome, not as an error.
    ///
    /// # Errors
    ///
    /// Returns `EmptyBatch` for an empty identity list, and
    /// `PackageManagerNotFound` or `Spawn` when no child could be started.
    async fn run(
        &self,
        operation: PackageOperation,
        identities: &[String],
    ) -> PluginResult<InstallOutcome>;
}

/// [`PackageRunner`] that shells out to a real package manager.
#[derive(Debug, Clone)]
pub struct PackageInstaller {
    project_root: PathBuf,
    preference: Vec<PackageManager>,
    search_path: Option<OsString>,
}

impl PackageInstaller {
    /// Create an installer for the project at `project_root`, probing managers
    /// in `preference` order.
    #[must_use]
    pub fn new(project_root: impl Into<PathBuf>, preference: Vec<PackageManager>) -> Self {
        Self {
            project_root: project_root.into(),
            preference,
            search_path: None,
        }
    }

    /// Probe `search_path` (a `PATH`-style list) instead of the process `PATH`.
    #[must_use]
    pub fn with_search_path(mut self, search_path: impl Into<OsString>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }

    /// The project directory the child runs in.
    #[must_use]
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// First preferred manager found on the search path, with the resolved
    /// executable.
    ///
    /// # Errors
    ///
    /// Returns `PackageManagerNotFound` when none of them is installed.
    pub fn detect(&self) -> PluginResult<(PackageManager, PathBuf)> {
        let paths = self
            .search_path
            .clone()
            .or_else(|| std::env::var_os("PATH"));
        self.preference
            .iter()
            .copied()
            .find_map(|m| {
                which::which_in(m.executable(), paths.as_ref(), &self.project_root)
                    .ok()
                    .map(|path| (m, path))
            })
            .ok_or_else(|| PluginError::PackageManagerNotFound {
                tried: self
                    .preference
                    .iter()
                    .map(|m| m.executable())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

/// Read `reader` to EOF line by line, handing each decoded line to `on_line`.
///
/// Invalid UTF-8 is replaced rather than ending the read, so the child never
/// sees its pipe closed early.
async fn drain_lines<R, F>(reader: R, mut on_line: F)
where
    R: AsyncRead + Unpin,
    F: FnMut(&str),
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                on_line(line.trim_end_matches(['\n', '\r']));
            },
            Err(e) => {
                debug!(error = %e, "Package manager output unreadable, discarding the rest");
                let _ = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await;
                break;
            },
        }
    }
}

#[async_trait]
impl PackageRunner for PackageInstaller {
    async fn run(
        &self,
        operation: PackageOperation,
        identities: &[String],
    ) -> PluginResult<InstallOutcome> {
        if identities.is_empty() {
            return Err(PluginError::EmptyBatch(operation));
        }
        let (manager, executable) = self.detect()?;
        let args = manager.args(operation, identities);
        info!(%manager, %operation, count = identities.len(), "Running package manager");
        debug!(
            executable = %executable.display(),
            args = ?args,
            cwd = %self.project_root.display(),
            "Spawning"
        );

        let mut child = Command::new(&executable)
            .args(&args)
            .current_dir(&self.project_root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| PluginError::Spawn { manager, source })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let stream_stdout = async {
            if let Some(out) = stdout {
                drain_lines(out, |line| {
                    info!(target: OUTPUT_TARGET, %manager, "{line}");
                })
                .await;
            }
        };
        let capture_stderr = async {
            let mut captured = String::new();
            if let Some(err) = stderr {
                drain_lines(err, |line| {
                    debug!(target: OUTPUT_TARGET, %manager, "{line}");
                    captured.push_str(line);
                    captured.push('\n');
                })
                .await;
            }
            captured
        };

        let ((), stderr) = tokio::join!(stream_stdout, capture_stderr);
        let status = child
            .wait()
            .await
            .map_err(|source| PluginError::Spawn { manager, source })?;

        debug!(%manager, %operation, status = %status, "Package manager exited");
        Ok(InstallOutcome {
            manager,
            operation,
            exit_code: status.code(),
            stderr,
        })
    }
}
