//! Compiler toolchain resolution.
//!
//! Selects compiler, linker, archiver, and strip tool for a target,
//! honoring per-slot caller overrides. Selection prefers the vendor-native
//! compiler for each (OS, architecture) pair: NDK Clang for Android, Apple
//! Clang for Apple OSes, cl.exe for Windows; generic Clang/GCC otherwise.

use std::path::{Path, PathBuf};

use crate::core::error::{Error, Result};
use crate::core::spec::ToolOverrides;
use crate::core::target::{Arch, Os, Target};
use crate::util::process::ProcessBuilder;

use super::chain::ToolResolver;
use super::tool::{ToolId, ToolInstance};

/// Toolchain-environment script plus the arguments it needs.
///
/// Required side channel on the MSVC platform family; consumed later by
/// environment derivation.
#[derive(Debug, Clone)]
pub struct MsvcEnvScript {
    pub script: PathBuf,
    pub args: Vec<String>,
}

/// A fully-resolved compiler toolchain for one target.
#[derive(Debug, Clone)]
pub struct ResolvedToolchain {
    pub compiler: ToolInstance,
    pub linker: ToolInstance,
    pub archiver: ToolInstance,
    /// Absent on MSVC, where no strip tool exists.
    pub strip: Option<ToolInstance>,
    /// Present only when the compiler needs shell-level environment
    /// initialization (MSVC).
    pub env_script: Option<MsvcEnvScript>,
}

/// Resolve the toolchain for a target.
///
/// An override supplied for a slot skips discovery for that slot.
pub fn resolve_toolchain(
    resolver: &ToolResolver,
    target: Target,
    overrides: &ToolOverrides,
) -> Result<ResolvedToolchain> {
    let ndk = if target.os == Os::Android {
        NdkToolchain::locate()
    } else {
        None
    };

    let (compiler, env_script) = match &overrides.cc {
        Some(path) => (
            ToolInstance::new(classify_compiler(path), path),
            None,
        ),
        None => default_compiler(resolver, target, ndk.as_ref())?,
    };

    let linker = match &overrides.ld {
        Some(path) => ToolInstance::new(linker_id(target), path),
        None => default_linker(resolver, target, ndk.as_ref(), &compiler)?,
    };

    let archiver = match &overrides.ar {
        Some(path) => ToolInstance::new(ToolId::Ar, path),
        None => default_archiver(resolver, target, ndk.as_ref(), &compiler)?,
    };

    let strip = match &overrides.strip {
        Some(path) => Some(ToolInstance::new(ToolId::Strip, path)),
        None => default_strip(resolver, target, ndk.as_ref(), &compiler),
    };

    tracing::debug!(
        target = %target,
        compiler = %compiler.path.display(),
        linker = %linker.path.display(),
        "resolved toolchain"
    );

    Ok(ResolvedToolchain {
        compiler,
        linker,
        archiver,
        strip,
        env_script,
    })
}

fn default_compiler(
    resolver: &ToolResolver,
    target: Target,
    ndk: Option<&NdkToolchain>,
) -> Result<(ToolInstance, Option<MsvcEnvScript>)> {
    match target.os {
        Os::Android => {
            if let Some(clang) = ndk.and_then(|n| n.tool("clang")) {
                return Ok((ToolInstance::new(ToolId::NdkClang, clang), None));
            }
            // No NDK installed: fall back to a generic clang.
            let generic = resolver.require(ToolId::Clang).map_err(|_| {
                Error::ToolNotFound {
                    tool: format!("C compiler for {} (Android NDK Clang)", target),
                }
            })?;
            Ok((generic, None))
        }
        Os::MacOs | Os::Ios => {
            if let Some(clang) = resolver.resolve(ToolId::Clang).into_iter().next() {
                let id = classify_compiler(&clang.path);
                return Ok((ToolInstance { id, ..clang }, None));
            }
            let gcc = resolver.require(ToolId::Gcc).map_err(|_| {
                Error::ToolNotFound {
                    tool: format!("C compiler for {} (Apple Clang)", target),
                }
            })?;
            Ok((gcc, None))
        }
        Os::Windows => default_windows_compiler(resolver, target),
        Os::Linux => {
            if let Some(clang) = resolver.resolve(ToolId::Clang).into_iter().next() {
                return Ok((clang, None));
            }
            if let Some(gcc) = resolver.resolve(ToolId::Gcc).into_iter().next() {
                return Ok((gcc, None));
            }
            Err(Error::ToolNotFound {
                tool: format!("C compiler for {} (clang or gcc)", target),
            })
        }
    }
}

fn default_windows_compiler(
    resolver: &ToolResolver,
    target: Target,
) -> Result<(ToolInstance, Option<MsvcEnvScript>)> {
    // Already inside a Developer Command Prompt: cl on PATH with the
    // environment configured.
    if let Some(cl) = resolver.resolve(ToolId::Cl).into_iter().next() {
        if std::env::var("INCLUDE").is_ok() && std::env::var("LIB").is_ok() {
            return Ok((cl, None));
        }
    }

    if let Some((cl, script)) = locate_msvc_via_vswhere(target)? {
        return Ok((ToolInstance::new(ToolId::Cl, cl), Some(script)));
    }

    // MinGW-style fallback.
    if let Some(clang) = resolver.resolve(ToolId::Clang).into_iter().next() {
        return Ok((clang, None));
    }
    if let Some(gcc) = resolver.resolve(ToolId::Gcc).into_iter().next() {
        return Ok((gcc, None));
    }

    Err(Error::ToolNotFound {
        tool: format!("C compiler for {} (MSVC cl.exe)", target),
    })
}

fn default_linker(
    resolver: &ToolResolver,
    target: Target,
    ndk: Option<&NdkToolchain>,
    compiler: &ToolInstance,
) -> Result<ToolInstance> {
    match target.os {
        Os::Android => {
            if let Some(lld) = ndk.and_then(|n| n.tool("ld.lld")) {
                return Ok(ToolInstance::new(ToolId::Lld, lld));
            }
            first_of(resolver, &[ToolId::Lld, ToolId::Ld]).ok_or_else(|| {
                Error::ToolNotFound {
                    tool: format!("linker for {}", target),
                }
            })
        }
        Os::MacOs | Os::Ios => resolver.require(ToolId::Ld),
        Os::Windows => {
            if compiler.id == ToolId::Cl {
                resolver.require(ToolId::Link)
            } else {
                first_of(resolver, &[ToolId::Lld, ToolId::Ld]).ok_or_else(|| {
                    Error::ToolNotFound {
                        tool: format!("linker for {}", target),
                    }
                })
            }
        }
        Os::Linux => first_of(resolver, &[ToolId::Lld, ToolId::Ld]).ok_or_else(|| {
            Error::ToolNotFound {
                tool: format!("linker for {}", target),
            }
        }),
    }
}

fn default_archiver(
    resolver: &ToolResolver,
    target: Target,
    ndk: Option<&NdkToolchain>,
    compiler: &ToolInstance,
) -> Result<ToolInstance> {
    if target.os == Os::Android {
        if let Some(ar) = ndk.and_then(|n| n.tool("llvm-ar")) {
            return Ok(ToolInstance::new(ToolId::LlvmAr, ar));
        }
    }
    if compiler.id == ToolId::Cl {
        return resolver.require(ToolId::Lib);
    }
    first_of(resolver, &[ToolId::Ar, ToolId::LlvmAr]).ok_or_else(|| Error::ToolNotFound {
        tool: "ar archiver".to_string(),
    })
}

fn default_strip(
    resolver: &ToolResolver,
    target: Target,
    ndk: Option<&NdkToolchain>,
    compiler: &ToolInstance,
) -> Option<ToolInstance> {
    if compiler.id == ToolId::Cl {
        return None;
    }
    if target.os == Os::Android {
        if let Some(strip) = ndk.and_then(|n| n.tool("llvm-strip")) {
            return Some(ToolInstance::new(ToolId::LlvmStrip, strip));
        }
    }
    let found = first_of(resolver, &[ToolId::Strip, ToolId::LlvmStrip]);
    if found.is_none() {
        tracing::debug!("no strip tool found; omitting from descriptor");
    }
    found
}

fn first_of(resolver: &ToolResolver, ids: &[ToolId]) -> Option<ToolInstance> {
    ids.iter()
        .find_map(|id| resolver.resolve(*id).into_iter().next())
}

fn linker_id(target: Target) -> ToolId {
    match target.os {
        Os::Windows => ToolId::Link,
        Os::MacOs | Os::Ios => ToolId::Ld,
        _ => ToolId::Lld,
    }
}

/// Detect whether a compiler binary is Clang, Apple Clang, or GCC.
///
/// Checks the binary name first, then falls back to `--version` output.
pub fn classify_compiler(cc: &Path) -> ToolId {
    let name = cc
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_lowercase();

    if name.contains("gcc") {
        return ToolId::Gcc;
    }
    if name == "cl" || name == "cl.exe" {
        return ToolId::Cl;
    }

    let output = ProcessBuilder::new(cc).arg("--version").exec();
    if let Ok(output) = output {
        let stdout = String::from_utf8_lossy(&output.stdout).to_lowercase();
        if stdout.contains("apple") {
            return ToolId::AppleClang;
        }
        if stdout.contains("clang") {
            return ToolId::Clang;
        }
        if stdout.contains("gcc") || stdout.contains("free software foundation") {
            return ToolId::Gcc;
        }
    }

    ToolId::Clang
}

/// Locate `vcvarsall.bat` through vswhere, returning the cl.exe path and
/// the environment script for later derivation.
#[cfg(target_os = "windows")]
fn locate_msvc_via_vswhere(target: Target) -> Result<Option<(PathBuf, MsvcEnvScript)>> {
    let Some(vswhere) = find_vswhere() else {
        tracing::debug!("vswhere.exe not found, cannot auto-detect MSVC");
        return Ok(None);
    };

    let output = ProcessBuilder::new(&vswhere)
        .args([
            "-latest",
            "-requires",
            "Microsoft.VisualStudio.Component.VC.Tools.x86.x64",
            "-property",
            "installationPath",
            "-format",
            "value",
        ])
        .exec();

    let vs_path = match output {
        Ok(out) if out.status.success() => {
            let path = String::from_utf8_lossy(&out.stdout).trim().to_string();
            if path.is_empty() {
                return Ok(None);
            }
            PathBuf::from(path)
        }
        _ => return Ok(None),
    };

    let vcvarsall = vs_path
        .join("VC")
        .join("Auxiliary")
        .join("Build")
        .join("vcvarsall.bat");
    if !vcvarsall.exists() {
        tracing::debug!("vcvarsall.bat not found at {}", vcvarsall.display());
        return Ok(None);
    }

    let arch_arg = vcvars_arch(target.arch);
    let script = MsvcEnvScript {
        script: vcvarsall,
        args: vec![arch_arg.to_string()],
    };

    // Run the script once now to find cl.exe; the script itself is handed
    // onward so the build environment is derived from the same source.
    let captured = crate::build::env::capture_script_env(
        &script.script,
        &script.args,
        &crate::util::process::ExecRunner,
    )
    .map_err(|e| {
        tracing::warn!("vcvarsall.bat failed: {e:#}");
        e
    })
    .ok();

    let Some(captured) = captured else {
        return Ok(None);
    };
    let Some(path_value) = captured.get("PATH") else {
        return Ok(None);
    };

    for dir in path_value.split(';') {
        let candidate = PathBuf::from(dir).join("cl.exe");
        if candidate.exists() {
            return Ok(Some((candidate, script)));
        }
    }
    Ok(None)
}

#[cfg(not(target_os = "windows"))]
fn locate_msvc_via_vswhere(_target: Target) -> Result<Option<(PathBuf, MsvcEnvScript)>> {
    Ok(None)
}

/// Find vswhere.exe in its standard install location or on PATH.
#[cfg(target_os = "windows")]
fn find_vswhere() -> Option<PathBuf> {
    let program_files_x86 = std::env::var("ProgramFiles(x86)")
        .unwrap_or_else(|_| "C:\\Program Files (x86)".to_string());

    let standard = PathBuf::from(&program_files_x86)
        .join("Microsoft Visual Studio")
        .join("Installer")
        .join("vswhere.exe");
    if standard.exists() {
        return Some(standard);
    }

    which::which("vswhere").ok()
}

/// vcvarsall.bat architecture argument for a target architecture.
fn vcvars_arch(arch: Arch) -> &'static str {
    match arch {
        Arch::X64 => "x64",
        Arch::Ia32 => "x86",
        Arch::Arm64 => "arm64",
        Arch::Arm => "arm",
    }
}

/// The Android NDK's bundled LLVM toolchain.
#[derive(Debug, Clone)]
pub struct NdkToolchain {
    bin: PathBuf,
}

impl NdkToolchain {
    /// Locate the NDK through the conventional environment variables.
    pub fn locate() -> Option<NdkToolchain> {
        let root = ["ANDROID_NDK_HOME", "ANDROID_NDK_ROOT", "ANDROID_NDK"]
            .iter()
            .find_map(|var| std::env::var(var).ok())
            .map(PathBuf::from)?;
        Self::from_root(&root)
    }

    /// Build from an explicit NDK root directory.
    pub fn from_root(root: &Path) -> Option<NdkToolchain> {
        let host_tag = if cfg!(target_os = "windows") {
            "windows-x86_64"
        } else if cfg!(target_os = "macos") {
            // Apple-silicon NDKs ship x86_64-named prebuilts.
            "darwin-x86_64"
        } else {
            "linux-x86_64"
        };
        let bin = root
            .join("toolchains")
            .join("llvm")
            .join("prebuilt")
            .join(host_tag)
            .join("bin");
        if bin.is_dir() {
            Some(NdkToolchain { bin })
        } else {
            None
        }
    }

    /// Path of a tool inside the NDK bin directory, if present.
    pub fn tool(&self, name: &str) -> Option<PathBuf> {
        let candidate = if cfg!(target_os = "windows") {
            self.bin.join(format!("{}.exe", name))
        } else {
            self.bin.join(name)
        };
        candidate.is_file().then_some(candidate)
    }
}
