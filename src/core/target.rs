//! Target definitions - where the built artifact runs.
//!
//! A [`Target`] is an (architecture, OS, optional Apple SDK) triple drawn
//! from a closed set. Everything downstream (triple derivation, host-machine
//! tables, SDK lookup) matches exhaustively over these enums, so adding a
//! variant forces a review of every match site.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// CPU architecture of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    /// 32-bit ARM (armv7a)
    Arm,
    /// 64-bit ARM (aarch64)
    Arm64,
    /// 32-bit x86
    Ia32,
    /// 64-bit x86
    X64,
}

impl Arch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::Arm => "arm",
            Arch::Arm64 => "arm64",
            Arch::Ia32 => "ia32",
            Arch::X64 => "x64",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operating system of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    Android,
    Ios,
    Linux,
    MacOs,
    Windows,
}

impl Os {
    pub fn as_str(&self) -> &'static str {
        match self {
            Os::Android => "android",
            Os::Ios => "ios",
            Os::Linux => "linux",
            Os::MacOs => "macos",
            Os::Windows => "windows",
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which iOS SDK a target is built against.
///
/// Device and simulator builds use different SDK roots and different
/// compiler triples, so this is part of target identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppleSdk {
    Device,
    Simulator,
}

impl AppleSdk {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppleSdk::Device => "device",
            AppleSdk::Simulator => "simulator",
        }
    }
}

/// An (architecture, OS, optional SDK variant) triple.
///
/// Equality is by value; targets are used as comparison keys throughout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    pub arch: Arch,
    pub os: Os,
    /// SDK variant, only meaningful for iOS targets.
    pub sdk: Option<AppleSdk>,
}

impl Target {
    pub fn new(arch: Arch, os: Os) -> Self {
        Target {
            arch,
            os,
            sdk: None,
        }
    }

    pub fn with_sdk(arch: Arch, os: Os, sdk: AppleSdk) -> Self {
        Target {
            arch,
            os,
            sdk: Some(sdk),
        }
    }

    /// The full closed set of supported targets.
    pub fn all() -> &'static [Target] {
        use AppleSdk::*;
        static ALL: &[Target] = &[
            Target { arch: Arch::Arm, os: Os::Android, sdk: None },
            Target { arch: Arch::Arm64, os: Os::Android, sdk: None },
            Target { arch: Arch::Ia32, os: Os::Android, sdk: None },
            Target { arch: Arch::X64, os: Os::Android, sdk: None },
            Target { arch: Arch::Arm64, os: Os::Ios, sdk: Some(Device) },
            Target { arch: Arch::Arm64, os: Os::Ios, sdk: Some(Simulator) },
            // x64 iOS exists only as a simulator target.
            Target { arch: Arch::X64, os: Os::Ios, sdk: Some(Simulator) },
            Target { arch: Arch::Arm64, os: Os::Linux, sdk: None },
            Target { arch: Arch::X64, os: Os::Linux, sdk: None },
            Target { arch: Arch::Arm64, os: Os::MacOs, sdk: None },
            Target { arch: Arch::X64, os: Os::MacOs, sdk: None },
            Target { arch: Arch::Arm64, os: Os::Windows, sdk: None },
            Target { arch: Arch::X64, os: Os::Windows, sdk: None },
        ];
        ALL
    }

    /// All supported variants of one OS, in declaration order.
    pub fn variants_of(os: Os) -> Vec<Target> {
        Target::all()
            .iter()
            .copied()
            .filter(|t| t.os == os)
            .collect()
    }

    /// The build host's own target.
    pub fn host() -> Target {
        let arch = match std::env::consts::ARCH {
            "x86_64" => Arch::X64,
            "aarch64" => Arch::Arm64,
            "x86" => Arch::Ia32,
            "arm" => Arch::Arm,
            // Unknown host arch: report as x64, the tables will reject
            // any actual cross decisions that depend on it.
            _ => Arch::X64,
        };
        let os = match std::env::consts::OS {
            "android" => Os::Android,
            "ios" => Os::Ios,
            "macos" => Os::MacOs,
            "windows" => Os::Windows,
            _ => Os::Linux,
        };
        Target::new(arch, os)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sdk {
            Some(sdk) => write!(f, "{}-{}-{}", self.os, self.arch, sdk.as_str()),
            None => write!(f, "{}-{}", self.os, self.arch),
        }
    }
}

impl FromStr for Target {
    type Err = String;

    /// Parse `os-arch` or `os-arch-sdk` (e.g. `android-arm64`,
    /// `ios-arm64-simulator`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('-');
        let os = match parts.next() {
            Some("android") => Os::Android,
            Some("ios") => Os::Ios,
            Some("linux") => Os::Linux,
            Some("macos") => Os::MacOs,
            Some("windows") => Os::Windows,
            _ => return Err(format!("unknown target `{}`", s)),
        };
        let arch = match parts.next() {
            Some("arm") => Arch::Arm,
            Some("arm64") => Arch::Arm64,
            Some("ia32") => Arch::Ia32,
            Some("x64") => Arch::X64,
            _ => return Err(format!("unknown target `{}`", s)),
        };
        let sdk = match parts.next() {
            Some("device") => Some(AppleSdk::Device),
            Some("simulator") => Some(AppleSdk::Simulator),
            Some(other) => return Err(format!("unknown SDK variant `{}`", other)),
            None => None,
        };
        if parts.next().is_some() {
            return Err(format!("unknown target `{}`", s));
        }
        Ok(Target { arch, os, sdk })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_equality_is_by_value() {
        let a = Target::new(Arch::Arm64, Os::Android);
        let b = Target::new(Arch::Arm64, Os::Android);
        assert_eq!(a, b);
        assert_ne!(a, Target::new(Arch::X64, Os::Android));
        assert_ne!(
            Target::with_sdk(Arch::Arm64, Os::Ios, AppleSdk::Device),
            Target::with_sdk(Arch::Arm64, Os::Ios, AppleSdk::Simulator),
        );
    }

    #[test]
    fn test_display_round_trip() {
        for target in Target::all() {
            let parsed: Target = target.to_string().parse().unwrap();
            assert_eq!(parsed, *target);
        }
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("freebsd-x64".parse::<Target>().is_err());
        assert!("android".parse::<Target>().is_err());
        assert!("ios-arm64-watch".parse::<Target>().is_err());
        assert!("android-arm64-extra-junk".parse::<Target>().is_err());
    }

    #[test]
    fn test_variants_of_filters_by_os() {
        let ios = Target::variants_of(Os::Ios);
        assert_eq!(ios.len(), 3);
        assert!(ios.iter().all(|t| t.os == Os::Ios));

        let android = Target::variants_of(Os::Android);
        assert_eq!(android.len(), 4);
        assert!(android.iter().all(|t| t.sdk.is_none()));
    }

    #[test]
    fn test_host_is_in_closed_set() {
        // The host target of any machine running the test suite must be
        // part of the supported set.
        assert!(Target::all().contains(&Target::host()));
    }
}
