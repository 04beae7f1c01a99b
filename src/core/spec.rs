//! Build specification - what one build invocation produces.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::target::{Os, Target};

/// How a library artifact is linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkMode {
    /// Statically-linked archive (.a / .lib)
    Static,
    /// Dynamically-loadable shared object (.so / .dylib / .dll)
    Dynamic,
}

impl LinkMode {
    /// Value for Meson's `default_library` option.
    pub fn default_library(&self) -> &'static str {
        match self {
            LinkMode::Static => "static",
            LinkMode::Dynamic => "shared",
        }
    }
}

/// The kind of artifact a build produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Executable,
    Library(LinkMode),
}

impl OutputKind {
    /// Meson target-type suffix, appended to the target name as
    /// `name:suffix` for `meson compile`.
    pub fn meson_suffix(&self) -> &'static str {
        match self {
            OutputKind::Executable => "executable",
            OutputKind::Library(LinkMode::Static) => "static_library",
            OutputKind::Library(LinkMode::Dynamic) => "shared_library",
        }
    }

    /// File extension of the produced artifact on the given OS.
    pub fn extension(&self, os: Os) -> &'static str {
        match self {
            OutputKind::Executable => {
                if os == Os::Windows {
                    "exe"
                } else {
                    ""
                }
            }
            OutputKind::Library(LinkMode::Static) => {
                if os == Os::Windows {
                    "lib"
                } else {
                    "a"
                }
            }
            OutputKind::Library(LinkMode::Dynamic) => match os {
                Os::Windows => "dll",
                Os::MacOs | Os::Ios => "dylib",
                _ => "so",
            },
        }
    }

    /// File prefix of the produced artifact on the given OS.
    pub fn prefix(&self, os: Os) -> &'static str {
        match self {
            OutputKind::Executable => "",
            OutputKind::Library(_) => {
                if os == Os::Windows {
                    ""
                } else {
                    "lib"
                }
            }
        }
    }

    /// The artifact file name for a target named `name`.
    pub fn file_name(&self, name: &str, os: Os) -> String {
        let prefix = self.prefix(os);
        let ext = self.extension(os);
        if ext.is_empty() {
            format!("{}{}", prefix, name)
        } else {
            format!("{}{}.{}", prefix, name, ext)
        }
    }
}

/// Insertion-ordered string map for `-D` options.
///
/// A repeated insert replaces the value in place, so the flag order handed
/// to the configure step stays stable and never contains duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionMap {
    entries: Vec<(String, String)>,
}

impl OptionMap {
    pub fn new() -> Self {
        OptionMap::default()
    }

    /// Insert a key/value pair. If the key exists, the value is replaced
    /// at its original position (last write wins).
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for OptionMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = OptionMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// Explicit tool overrides supplied by the caller.
///
/// A populated slot skips discovery for that tool entirely.
#[derive(Debug, Clone, Default)]
pub struct ToolOverrides {
    pub cc: Option<PathBuf>,
    pub ld: Option<PathBuf>,
    pub ar: Option<PathBuf>,
    pub strip: Option<PathBuf>,
}

/// Everything one build invocation needs. Immutable for its duration.
#[derive(Debug, Clone)]
pub struct BuildSpec {
    /// Where the artifact will run.
    pub target: Target,
    /// Meson target name inside the project.
    pub target_name: String,
    /// Executable or library (+ link mode).
    pub kind: OutputKind,
    /// User-supplied `-D` options, forwarded verbatim.
    pub options: OptionMap,
    /// Android API level, appended to the NDK triple.
    pub api_level: u32,
    /// Directory containing `meson.build`.
    pub project_dir: PathBuf,
    /// Exclusively-owned output directory, wiped at build start.
    pub output_dir: PathBuf,
    /// Debug/release, feeds the reserved `buildtype` option.
    pub release: bool,
    /// Report artifact records without invoking any external process.
    pub dry_run: bool,
    /// Per-slot toolchain overrides.
    pub overrides: ToolOverrides,
}

impl BuildSpec {
    /// Reserved options merged under the user map.
    ///
    /// `buildtype` and (for libraries) `default_library` are injected
    /// first; user-supplied values for the same keys win.
    pub fn effective_options(&self) -> OptionMap {
        let mut merged = OptionMap::new();
        merged.insert("buildtype", if self.release { "release" } else { "debug" });
        if let OutputKind::Library(mode) = self.kind {
            merged.insert("default_library", mode.default_library());
        }
        for (key, value) in self.options.iter() {
            merged.insert(key, value);
        }
        merged
    }

    /// Deterministic path of the artifact this spec produces.
    pub fn artifact_path(&self) -> PathBuf {
        self.output_dir
            .join(self.kind.file_name(&self.target_name, self.target.os))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::target::Arch;

    fn spec(kind: OutputKind) -> BuildSpec {
        BuildSpec {
            target: Target::new(Arch::Arm64, Os::Android),
            target_name: "add".to_string(),
            kind,
            options: OptionMap::new(),
            api_level: 30,
            project_dir: PathBuf::from("proj"),
            output_dir: PathBuf::from("out"),
            release: false,
            dry_run: false,
            overrides: ToolOverrides::default(),
        }
    }

    #[test]
    fn test_option_map_preserves_insertion_order() {
        let mut map = OptionMap::new();
        map.insert("b_lto", "true");
        map.insert("cpp_std", "c++17");
        map.insert("warning_level", "3");
        let keys: Vec<&str> = map.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b_lto", "cpp_std", "warning_level"]);
    }

    #[test]
    fn test_option_map_replaces_in_place() {
        let mut map = OptionMap::new();
        map.insert("a", "1");
        map.insert("b", "2");
        map.insert("a", "3");
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("a"), Some("3"));
        let keys: Vec<&str> = map.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_reserved_options_injected_for_libraries() {
        let spec = spec(OutputKind::Library(LinkMode::Dynamic));
        let opts = spec.effective_options();
        assert_eq!(opts.get("buildtype"), Some("debug"));
        assert_eq!(opts.get("default_library"), Some("shared"));
    }

    #[test]
    fn test_no_default_library_for_executables() {
        let spec = spec(OutputKind::Executable);
        let opts = spec.effective_options();
        assert_eq!(opts.get("buildtype"), Some("debug"));
        assert_eq!(opts.get("default_library"), None);
    }

    #[test]
    fn test_user_options_win_over_reserved() {
        let mut spec = spec(OutputKind::Library(LinkMode::Static));
        spec.release = true;
        spec.options.insert("buildtype", "minsize");
        let opts = spec.effective_options();
        assert_eq!(opts.get("buildtype"), Some("minsize"));
        assert_eq!(opts.get("default_library"), Some("static"));
    }

    #[test]
    fn test_meson_suffix() {
        assert_eq!(OutputKind::Executable.meson_suffix(), "executable");
        assert_eq!(
            OutputKind::Library(LinkMode::Static).meson_suffix(),
            "static_library"
        );
        assert_eq!(
            OutputKind::Library(LinkMode::Dynamic).meson_suffix(),
            "shared_library"
        );
    }

    #[test]
    fn test_artifact_file_names() {
        let dylib = OutputKind::Library(LinkMode::Dynamic);
        assert_eq!(dylib.file_name("add", Os::Linux), "libadd.so");
        assert_eq!(dylib.file_name("add", Os::Android), "libadd.so");
        assert_eq!(dylib.file_name("add", Os::MacOs), "libadd.dylib");
        assert_eq!(dylib.file_name("add", Os::Windows), "add.dll");

        let staticlib = OutputKind::Library(LinkMode::Static);
        assert_eq!(staticlib.file_name("add", Os::Linux), "libadd.a");
        assert_eq!(staticlib.file_name("add", Os::Windows), "add.lib");

        assert_eq!(OutputKind::Executable.file_name("tool", Os::Linux), "tool");
        assert_eq!(
            OutputKind::Executable.file_name("tool", Os::Windows),
            "tool.exe"
        );
    }
}
