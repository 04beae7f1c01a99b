//! Tool identity and resolved tool instances.

use std::fmt;
use std::path::PathBuf;

use semver::Version;

/// Identity of a discoverable external tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolId {
    Meson,
    Ninja,
    Clang,
    AppleClang,
    Gcc,
    /// MSVC compiler driver (cl.exe)
    Cl,
    /// Clang bundled with the Android NDK
    NdkClang,
    Ar,
    LlvmAr,
    /// MSVC librarian (lib.exe)
    Lib,
    Strip,
    LlvmStrip,
    Ld,
    Lld,
    /// MSVC linker (link.exe)
    Link,
    Xcrun,
}

impl ToolId {
    /// Executable names to probe for, in preference order.
    pub fn executable_names(&self) -> &'static [&'static str] {
        match self {
            ToolId::Meson => &["meson"],
            ToolId::Ninja => &["ninja"],
            ToolId::Clang | ToolId::AppleClang | ToolId::NdkClang => &["clang"],
            ToolId::Gcc => &["gcc", "cc"],
            ToolId::Cl => &["cl"],
            ToolId::Ar => &["ar"],
            ToolId::LlvmAr => &["llvm-ar"],
            ToolId::Lib => &["lib"],
            ToolId::Strip => &["strip"],
            ToolId::LlvmStrip => &["llvm-strip"],
            ToolId::Ld => &["ld"],
            ToolId::Lld => &["ld.lld", "lld"],
            ToolId::Link => &["link"],
            ToolId::Xcrun => &["xcrun"],
        }
    }

    /// Human-readable name used in tool-not-found errors.
    pub fn display_name(&self) -> &'static str {
        match self {
            ToolId::Meson => "Meson build system",
            ToolId::Ninja => "Ninja",
            ToolId::Clang => "Clang",
            ToolId::AppleClang => "Apple Clang",
            ToolId::Gcc => "GCC",
            ToolId::Cl => "MSVC cl.exe",
            ToolId::NdkClang => "Android NDK Clang",
            ToolId::Ar => "ar archiver",
            ToolId::LlvmAr => "llvm-ar archiver",
            ToolId::Lib => "MSVC lib.exe",
            ToolId::Strip => "strip",
            ToolId::LlvmStrip => "llvm-strip",
            ToolId::Ld => "ld linker",
            ToolId::Lld => "LLD linker",
            ToolId::Link => "MSVC link.exe",
            ToolId::Xcrun => "xcrun",
        }
    }

    /// Arguments that make the tool print its version, if it has any.
    ///
    /// cl.exe and ld print banners instead and are left unprobed.
    pub fn version_args(&self) -> Option<&'static [&'static str]> {
        match self {
            ToolId::Meson | ToolId::Ninja => Some(&["--version"]),
            ToolId::Clang | ToolId::AppleClang | ToolId::NdkClang | ToolId::Gcc => {
                Some(&["--version"])
            }
            _ => None,
        }
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A located external tool.
///
/// Created by a resolver strategy, consumed by the orchestrator within one
/// build invocation; never cached across builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInstance {
    pub id: ToolId,
    pub path: PathBuf,
    pub version: Option<Version>,
}

impl ToolInstance {
    pub fn new(id: ToolId, path: impl Into<PathBuf>) -> Self {
        ToolInstance {
            id,
            path: path.into(),
            version: None,
        }
    }

    pub fn with_version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }
}

/// Parse the leading version out of a `--version` output line.
///
/// Meson prints a bare version (`1.3.0`, sometimes `1.3.0.dev1`); compilers
/// embed it in a banner (`clang version 17.0.6`). Versions with fewer than
/// three components are zero-padded.
pub fn parse_version_output(output: &str) -> Option<Version> {
    for token in output.split_whitespace() {
        let clean = token
            .split(|c: char| !c.is_ascii_digit() && c != '.')
            .next()
            .unwrap_or("");
        if clean.is_empty() || !clean.contains(|c: char| c.is_ascii_digit()) {
            continue;
        }
        let parts: Vec<&str> = clean.split('.').collect();
        let major: u64 = match parts.first().and_then(|s| s.parse().ok()) {
            Some(v) => v,
            None => continue,
        };
        let minor = parts.get(1).and_then(|s| s.parse().ok()).unwrap_or(0);
        let patch = parts.get(2).and_then(|s| s.parse().ok()).unwrap_or(0);
        return Some(Version::new(major, minor, patch));
    }
    None
}
