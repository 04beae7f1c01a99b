//! Resolver strategies - independent sources of tool candidates.
//!
//! Each strategy answers "where might this tool live?" for one class of
//! install location. A strategy that finds nothing contributes an empty
//! list; it never fails. The chain in [`super::chain`] unions the results.

use std::path::PathBuf;

use crate::util::process::ProcessBuilder;

use super::tool::{ToolId, ToolInstance};

/// Produce zero or more candidate instances for a tool identity.
///
/// The strategy set is fixed at build time; the chain is a plain fold over
/// a list of these.
pub trait ResolverStrategy: Send + Sync {
    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// All candidates this strategy knows about, in preference order.
    fn find(&self, id: ToolId) -> Vec<ToolInstance>;
}

/// Search the ambient PATH for the tool's executable names.
#[derive(Debug, Default)]
pub struct PathStrategy;

impl ResolverStrategy for PathStrategy {
    fn name(&self) -> &'static str {
        "path"
    }

    fn find(&self, id: ToolId) -> Vec<ToolInstance> {
        let mut found = Vec::new();
        for name in id.executable_names() {
            if let Ok(matches) = which::which_all(name) {
                found.extend(matches.map(|p| ToolInstance::new(id, p)));
            }
        }
        found
    }
}

/// Probe directories that package managers install into but that are not
/// always on PATH (Homebrew, per-user pip installs, Scoop/Chocolatey).
#[derive(Debug)]
pub struct InstallDirStrategy {
    dirs: Vec<PathBuf>,
}

impl InstallDirStrategy {
    pub fn new() -> Self {
        let mut dirs = Vec::new();

        if cfg!(target_os = "windows") {
            if let Ok(choco) = std::env::var("ChocolateyInstall") {
                dirs.push(PathBuf::from(choco).join("bin"));
            }
            if let Ok(home) = std::env::var("USERPROFILE") {
                dirs.push(PathBuf::from(home).join("scoop").join("shims"));
            }
        } else {
            if cfg!(target_os = "macos") {
                dirs.push(PathBuf::from("/opt/homebrew/bin"));
            }
            dirs.push(PathBuf::from("/usr/local/bin"));
            if let Ok(home) = std::env::var("HOME") {
                dirs.push(PathBuf::from(home).join(".local").join("bin"));
            }
        }

        InstallDirStrategy { dirs }
    }

    /// Build a strategy over an explicit directory list (for tests).
    pub fn with_dirs(dirs: Vec<PathBuf>) -> Self {
        InstallDirStrategy { dirs }
    }
}

impl Default for InstallDirStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolverStrategy for InstallDirStrategy {
    fn name(&self) -> &'static str {
        "install-dirs"
    }

    fn find(&self, id: ToolId) -> Vec<ToolInstance> {
        let mut found = Vec::new();
        for dir in &self.dirs {
            if !dir.is_dir() {
                continue;
            }
            for name in id.executable_names() {
                let candidate = if cfg!(target_os = "windows") {
                    dir.join(format!("{}.exe", name))
                } else {
                    dir.join(name)
                };
                if candidate.is_file() {
                    found.push(ToolInstance::new(id, candidate));
                }
            }
        }
        found
    }
}

/// Ask the Python interpreter where pip installs console scripts.
///
/// Meson and Ninja are commonly pip-installed into a scripts directory
/// that is absent from PATH; `sysconfig` knows where that is.
#[derive(Debug, Default)]
pub struct PythonScriptsStrategy;

impl PythonScriptsStrategy {
    fn scripts_dir() -> Option<PathBuf> {
        let python = which::which("python3")
            .or_else(|_| which::which("python"))
            .ok()?;
        let output = ProcessBuilder::new(python)
            .arg("-c")
            .arg("import sysconfig; print(sysconfig.get_path('scripts'))")
            .exec()
            .ok()?;
        if !output.status.success() {
            return None;
        }
        let dir = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if dir.is_empty() {
            None
        } else {
            Some(PathBuf::from(dir))
        }
    }
}

impl ResolverStrategy for PythonScriptsStrategy {
    fn name(&self) -> &'static str {
        "python-scripts"
    }

    fn find(&self, id: ToolId) -> Vec<ToolInstance> {
        // Only interpreter-hosted tools live there.
        if !matches!(id, ToolId::Meson | ToolId::Ninja) {
            return Vec::new();
        }
        let Some(dir) = Self::scripts_dir() else {
            return Vec::new();
        };
        let mut found = Vec::new();
        for name in id.executable_names() {
            for candidate in [dir.join(name), dir.join(format!("{}.exe", name))] {
                if candidate.is_file() {
                    found.push(ToolInstance::new(id, candidate));
                    break;
                }
            }
        }
        found
    }
}
