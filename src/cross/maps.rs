//! Static target-mapping tables.
//!
//! Plain lookup tables over the closed target set: Meson host-machine
//! identity, compiler target triples, and Apple SDK names. A combination
//! absent from these tables is a hard configuration error, never a
//! silent default. Any new `Target` variant must be threaded through every
//! match below.

use crate::core::error::{Error, Result};
use crate::core::target::{AppleSdk, Arch, Os, Target};

/// Host-machine identity as Meson's cross-file `[host_machine]` section
/// wants it. "Host" is Meson terminology for the machine the artifact
/// runs on, not the build host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostMachine {
    pub system: &'static str,
    pub subsystem: &'static str,
    pub kernel: &'static str,
    pub cpu_family: &'static str,
    pub cpu: &'static str,
    pub endian: &'static str,
}

/// Look up the host-machine identity for a target.
pub fn host_machine(target: Target) -> Result<HostMachine> {
    let unsupported = || Error::UnsupportedTarget { target };

    // SDK variants exist only for iOS.
    if target.sdk.is_some() && target.os != Os::Ios {
        return Err(unsupported());
    }

    let (cpu_family, cpu) = match target.arch {
        Arch::Arm => ("arm", "armv7a"),
        Arch::Arm64 => ("aarch64", "aarch64"),
        Arch::Ia32 => ("x86", "i686"),
        Arch::X64 => ("x86_64", "x86_64"),
    };

    let (system, subsystem, kernel) = match target.os {
        Os::Android => ("android", "android", "linux"),
        Os::Ios => match target.sdk {
            Some(AppleSdk::Device) => ("darwin", "ios", "xnu"),
            Some(AppleSdk::Simulator) => ("darwin", "ios-simulator", "xnu"),
            None => return Err(unsupported()),
        },
        Os::Linux => ("linux", "linux", "linux"),
        Os::MacOs => ("darwin", "macos", "xnu"),
        Os::Windows => ("windows", "windows", "nt"),
    };

    // Per-OS architecture coverage. Anything else has no table entry.
    let arch_supported = match target.os {
        Os::Android => true,
        Os::Ios => matches!(
            (target.arch, target.sdk),
            (Arch::Arm64, Some(_)) | (Arch::X64, Some(AppleSdk::Simulator))
        ),
        Os::Linux | Os::MacOs | Os::Windows => {
            matches!(target.arch, Arch::Arm64 | Arch::X64)
        }
    };
    if !arch_supported {
        return Err(unsupported());
    }

    Ok(HostMachine {
        system,
        subsystem,
        kernel,
        cpu_family,
        cpu,
        endian: "little",
    })
}

/// Compiler target triple for a target, if one applies.
///
/// Android triples carry the API level as a bare decimal suffix. OSes
/// without an entry build natively and get no `--target` flag.
pub fn target_triple(target: Target, api_level: u32) -> Result<Option<String>> {
    // Reject unmapped combinations up front; triple derivation shares the
    // host-machine table's notion of support.
    host_machine(target)?;

    let triple = match target.os {
        Os::MacOs => match target.arch {
            Arch::Arm64 => Some("aarch64-apple-darwin".to_string()),
            Arch::X64 => Some("x86_64-apple-darwin".to_string()),
            _ => return Err(Error::UnsupportedTarget { target }),
        },
        Os::Ios => match (target.arch, target.sdk) {
            (Arch::Arm64, Some(AppleSdk::Device)) => Some("aarch64-apple-ios".to_string()),
            (Arch::Arm64, Some(AppleSdk::Simulator)) => {
                Some("aarch64-apple-ios-simulator".to_string())
            }
            (Arch::X64, Some(AppleSdk::Simulator)) => {
                Some("x86_64-apple-ios-simulator".to_string())
            }
            _ => return Err(Error::UnsupportedTarget { target }),
        },
        Os::Android => {
            let prefix = match target.arch {
                Arch::Arm => "armv7a-linux-androideabi",
                Arch::Arm64 => "aarch64-linux-android",
                Arch::Ia32 => "i686-linux-android",
                Arch::X64 => "x86_64-linux-android",
            };
            Some(format!("{}{}", prefix, api_level))
        }
        Os::Linux | Os::Windows => None,
    };
    Ok(triple)
}

/// The `xcrun` SDK name for a target needing an Apple SDK root.
pub fn apple_sdk_name(target: Target) -> Option<&'static str> {
    match target.os {
        Os::MacOs => Some("macosx"),
        Os::Ios => match target.sdk {
            Some(AppleSdk::Device) => Some("iphoneos"),
            Some(AppleSdk::Simulator) => Some("iphonesimulator"),
            None => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_supported_target_fully_mapped() {
        // No table entry may leave a required field unset.
        for target in Target::all() {
            let hm = host_machine(*target)
                .unwrap_or_else(|_| panic!("no host_machine entry for {target}"));
            assert!(!hm.system.is_empty());
            assert!(!hm.subsystem.is_empty());
            assert!(!hm.kernel.is_empty());
            assert!(!hm.cpu_family.is_empty());
            assert!(!hm.cpu.is_empty());
            assert_eq!(hm.endian, "little");

            target_triple(*target, 21)
                .unwrap_or_else(|_| panic!("no triple entry for {target}"));
        }
    }

    #[test]
    fn test_unmapped_combinations_rejected() {
        let bad = [
            Target::new(Arch::Ia32, Os::MacOs),
            Target::new(Arch::Arm, Os::Linux),
            Target::new(Arch::Ia32, Os::Windows),
            // iOS without an SDK variant
            Target::new(Arch::Arm64, Os::Ios),
            // x64 iOS has no device variant
            Target::with_sdk(Arch::X64, Os::Ios, AppleSdk::Device),
            // SDK variant on a non-Apple OS
            Target::with_sdk(Arch::Arm64, Os::Android, AppleSdk::Device),
        ];
        for target in bad {
            assert!(
                matches!(
                    host_machine(target),
                    Err(Error::UnsupportedTarget { .. })
                ),
                "{target} should be unsupported"
            );
        }
    }

    #[test]
    fn test_android_triple_appends_api_level_without_separator() {
        let target = Target::new(Arch::Arm64, Os::Android);
        assert_eq!(
            target_triple(target, 26).unwrap().as_deref(),
            Some("aarch64-linux-android26")
        );
        assert_eq!(
            target_triple(Target::new(Arch::Arm, Os::Android), 21)
                .unwrap()
                .as_deref(),
            Some("armv7a-linux-androideabi21")
        );
    }

    #[test]
    fn test_apple_triples() {
        assert_eq!(
            target_triple(Target::new(Arch::Arm64, Os::MacOs), 0)
                .unwrap()
                .as_deref(),
            Some("aarch64-apple-darwin")
        );
        assert_eq!(
            target_triple(
                Target::with_sdk(Arch::X64, Os::Ios, AppleSdk::Simulator),
                0
            )
            .unwrap()
            .as_deref(),
            Some("x86_64-apple-ios-simulator")
        );
    }

    #[test]
    fn test_native_oses_have_no_triple() {
        assert_eq!(
            target_triple(Target::new(Arch::X64, Os::Linux), 0).unwrap(),
            None
        );
        assert_eq!(
            target_triple(Target::new(Arch::X64, Os::Windows), 0).unwrap(),
            None
        );
    }

    #[test]
    fn test_sdk_names() {
        assert_eq!(
            apple_sdk_name(Target::new(Arch::Arm64, Os::MacOs)),
            Some("macosx")
        );
        assert_eq!(
            apple_sdk_name(Target::with_sdk(Arch::Arm64, Os::Ios, AppleSdk::Device)),
            Some("iphoneos")
        );
        assert_eq!(
            apple_sdk_name(Target::with_sdk(Arch::Arm64, Os::Ios, AppleSdk::Simulator)),
            Some("iphonesimulator")
        );
        assert_eq!(apple_sdk_name(Target::new(Arch::X64, Os::Linux)), None);
    }

    #[test]
    fn test_android_subsystem_and_kernel() {
        let hm = host_machine(Target::new(Arch::Arm64, Os::Android)).unwrap();
        assert_eq!(hm.system, "android");
        assert_eq!(hm.kernel, "linux");
        assert_eq!(hm.cpu_family, "aarch64");
    }
}
