//! Cross-compilation descriptor assembly.
//!
//! A [`CrossDescriptor`] is constructed once per build from fully-resolved
//! inputs and never mutated afterwards; there is no half-populated builder
//! object to leak. Unset fields are omitted at serialization time.

use std::path::{Path, PathBuf};

use crate::core::error::Result;
use crate::core::spec::{LinkMode, OutputKind};
use crate::core::target::{Os, Target};
use crate::resolver::compiler::ResolvedToolchain;
use crate::resolver::tool::ToolId;

use super::maps;

/// `[host_machine]` section: the target platform in Meson's terms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostMachineSpec {
    pub system: Option<String>,
    pub subsystem: Option<String>,
    pub kernel: Option<String>,
    pub cpu_family: Option<String>,
    pub cpu: Option<String>,
    pub endian: Option<String>,
}

/// `[binaries]` section: per-language compilers and linkers, plus the
/// archiver and strip tool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BinariesSpec {
    pub c: Option<PathBuf>,
    pub cpp: Option<PathBuf>,
    pub objc: Option<PathBuf>,
    pub c_ld: Option<PathBuf>,
    pub cpp_ld: Option<PathBuf>,
    pub objc_ld: Option<PathBuf>,
    pub ar: Option<PathBuf>,
    pub strip: Option<PathBuf>,
}

/// `[built-in options]` section: per-language compile and link argument
/// lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuiltInOptionsSpec {
    pub c_args: Vec<String>,
    pub c_link_args: Vec<String>,
    pub cpp_args: Vec<String>,
    pub cpp_link_args: Vec<String>,
    pub objc_args: Vec<String>,
    pub objc_link_args: Vec<String>,
}

/// `[properties]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertiesSpec {
    /// True when the target differs from the build host, so the produced
    /// binary cannot be executed in place.
    pub needs_exe_wrapper: Option<bool>,
}

/// The full cross-compilation descriptor handed to Meson.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrossDescriptor {
    pub host_machine: HostMachineSpec,
    pub binaries: BinariesSpec,
    pub options: BuiltInOptionsSpec,
    pub properties: PropertiesSpec,
}

impl CrossDescriptor {
    /// Assemble a descriptor from a target and a resolved toolchain.
    ///
    /// `sdk_root` is the Apple SDK path when one applies; callers resolve
    /// it beforehand so assembly itself spawns nothing. An unmapped
    /// target fails here with `UnsupportedTarget` rather than producing a
    /// partial descriptor.
    pub fn assemble(
        target: Target,
        kind: OutputKind,
        api_level: u32,
        toolchain: &ResolvedToolchain,
        sdk_root: Option<&Path>,
    ) -> Result<CrossDescriptor> {
        let hm = maps::host_machine(target)?;
        let triple = maps::target_triple(target, api_level)?;

        let host_machine = HostMachineSpec {
            system: Some(hm.system.to_string()),
            subsystem: Some(hm.subsystem.to_string()),
            kernel: Some(hm.kernel.to_string()),
            cpu_family: Some(hm.cpu_family.to_string()),
            cpu: Some(hm.cpu.to_string()),
            endian: Some(hm.endian.to_string()),
        };

        // C is always populated; C++ mirrors it verbatim since this
        // toolchain has no independent C++ front end.
        let mut args = Vec::new();
        if let Some(ref triple) = triple {
            args.push(format!("--target={}", triple));
        }
        if let Some(sdk) = sdk_root {
            args.push("-isysroot".to_string());
            args.push(sdk.display().to_string());
        }

        let mut link_args = args.clone();
        // A shared object for Android must not pull in an executable's
        // startup sequence.
        if target.os == Os::Android && kind == OutputKind::Library(LinkMode::Dynamic) {
            link_args.push("-nostartfiles".to_string());
        }

        let cc = toolchain.compiler.path.clone();
        let ld = toolchain.linker.path.clone();

        let objc_capable = matches!(
            toolchain.compiler.id,
            ToolId::Clang | ToolId::AppleClang | ToolId::Gcc
        );

        let binaries = BinariesSpec {
            c: Some(cc.clone()),
            cpp: Some(cc.clone()),
            objc: objc_capable.then(|| cc.clone()),
            c_ld: Some(ld.clone()),
            cpp_ld: Some(ld.clone()),
            objc_ld: objc_capable.then(|| ld.clone()),
            ar: Some(toolchain.archiver.path.clone()),
            strip: toolchain.strip.as_ref().map(|t| t.path.clone()),
        };

        let options = BuiltInOptionsSpec {
            c_args: args.clone(),
            c_link_args: link_args.clone(),
            cpp_args: args.clone(),
            cpp_link_args: link_args.clone(),
            objc_args: if objc_capable { args } else { Vec::new() },
            objc_link_args: if objc_capable { link_args } else { Vec::new() },
        };

        let properties = PropertiesSpec {
            needs_exe_wrapper: Some(target != Target::host()),
        };

        Ok(CrossDescriptor {
            host_machine,
            binaries,
            options,
            properties,
        })
    }
}
