//! The resolver chain: union strategies, dedupe, probe, sort.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::core::error::{Error, Result};
use crate::util::process::ProcessBuilder;

use super::strategy::{
    InstallDirStrategy, PathStrategy, PythonScriptsStrategy, ResolverStrategy,
};
use super::tool::{parse_version_output, ToolId, ToolInstance};

/// Ordered chain of resolver strategies.
///
/// Strategies run independently in a fixed priority order; their results
/// are unioned and deduplicated. The chain itself never fails - "not
/// found" is an empty list, which [`ToolResolver::require`] maps to
/// [`Error::ToolNotFound`].
pub struct ToolResolver {
    strategies: Vec<Box<dyn ResolverStrategy>>,
}

impl ToolResolver {
    /// The default chain: PATH, then package-manager install dirs, then
    /// the Python scripts directory.
    pub fn new() -> Self {
        ToolResolver {
            strategies: vec![
                Box::new(PathStrategy),
                Box::new(InstallDirStrategy::new()),
                Box::new(PythonScriptsStrategy),
            ],
        }
    }

    /// Build a chain over explicit strategies (for tests).
    pub fn with_strategies(strategies: Vec<Box<dyn ResolverStrategy>>) -> Self {
        ToolResolver { strategies }
    }

    /// All instances of a tool, deduplicated and sorted descending by
    /// version. Instances sharing a version keep strategy priority order;
    /// unversioned instances sort last.
    pub fn resolve(&self, id: ToolId) -> Vec<ToolInstance> {
        let mut seen: HashSet<PathBuf> = HashSet::new();
        let mut instances = Vec::new();

        for strategy in &self.strategies {
            for instance in strategy.find(id) {
                let key = instance
                    .path
                    .canonicalize()
                    .unwrap_or_else(|_| instance.path.clone());
                if seen.insert(key) {
                    instances.push(instance);
                }
            }
            tracing::trace!(
                strategy = strategy.name(),
                tool = %id,
                total = instances.len(),
                "resolver strategy finished"
            );
        }

        for instance in &mut instances {
            if instance.version.is_none() {
                instance.version = probe_version(instance);
            }
        }

        // Stable sort keeps first-strategy-wins for equal versions.
        instances.sort_by(|a, b| b.version.cmp(&a.version));
        instances
    }

    /// Best instance of a tool, or a fatal tool-not-found error.
    pub fn require(&self, id: ToolId) -> Result<ToolInstance> {
        self.resolve(id)
            .into_iter()
            .next()
            .ok_or_else(|| Error::ToolNotFound {
                tool: id.display_name().to_string(),
            })
    }
}

impl Default for ToolResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Ask a tool for its version, if it supports a version flag.
fn probe_version(instance: &ToolInstance) -> Option<semver::Version> {
    let args = instance.id.version_args()?;
    let output = ProcessBuilder::new(&instance.path).args(args).exec().ok()?;
    if !output.status.success() {
        return None;
    }
    parse_version_output(&String::from_utf8_lossy(&output.stdout))
}

#[cfg(test)]
mod tests {
    use super::*;
    use semver::Version;

    /// Canned strategy returning fixed, pre-versioned instances.
    struct Canned {
        name: &'static str,
        instances: Vec<ToolInstance>,
    }

    impl ResolverStrategy for Canned {
        fn name(&self) -> &'static str {
            self.name
        }

        fn find(&self, id: ToolId) -> Vec<ToolInstance> {
            self.instances
                .iter()
                .filter(|i| i.id == id)
                .cloned()
                .collect()
        }
    }

    fn meson_at(path: &str, version: (u64, u64, u64)) -> ToolInstance {
        ToolInstance::new(ToolId::Meson, path)
            .with_version(Version::new(version.0, version.1, version.2))
    }

    #[test]
    fn test_results_sorted_descending_by_version() {
        let resolver = ToolResolver::with_strategies(vec![Box::new(Canned {
            name: "canned",
            instances: vec![
                meson_at("/a/meson", (1, 1, 0)),
                meson_at("/b/meson", (1, 4, 2)),
                meson_at("/c/meson", (1, 2, 0)),
            ],
        })]);

        let found = resolver.resolve(ToolId::Meson);
        let versions: Vec<_> = found.iter().map(|i| i.version.clone().unwrap()).collect();
        assert_eq!(
            versions,
            vec![
                Version::new(1, 4, 2),
                Version::new(1, 2, 0),
                Version::new(1, 1, 0)
            ]
        );
    }

    #[test]
    fn test_equal_versions_keep_strategy_priority() {
        let resolver = ToolResolver::with_strategies(vec![
            Box::new(Canned {
                name: "first",
                instances: vec![meson_at("/first/meson", (1, 3, 0))],
            }),
            Box::new(Canned {
                name: "second",
                instances: vec![meson_at("/second/meson", (1, 3, 0))],
            }),
        ]);

        let found = resolver.resolve(ToolId::Meson);
        assert_eq!(found[0].path, PathBuf::from("/first/meson"));
    }

    #[test]
    fn test_duplicate_paths_deduplicated() {
        let resolver = ToolResolver::with_strategies(vec![
            Box::new(Canned {
                name: "first",
                instances: vec![meson_at("/dup/meson", (1, 3, 0))],
            }),
            Box::new(Canned {
                name: "second",
                instances: vec![meson_at("/dup/meson", (1, 3, 0))],
            }),
        ]);

        assert_eq!(resolver.resolve(ToolId::Meson).len(), 1);
    }

    #[test]
    fn test_empty_strategy_contributes_nothing() {
        let resolver = ToolResolver::with_strategies(vec![
            Box::new(Canned {
                name: "empty",
                instances: vec![],
            }),
            Box::new(Canned {
                name: "full",
                instances: vec![meson_at("/x/meson", (1, 0, 0))],
            }),
        ]);

        assert_eq!(resolver.resolve(ToolId::Meson).len(), 1);
    }

    #[test]
    fn test_require_maps_empty_to_tool_not_found() {
        let resolver = ToolResolver::with_strategies(vec![Box::new(Canned {
            name: "empty",
            instances: vec![],
        })]);

        let err = resolver.require(ToolId::Meson).unwrap_err();
        match err {
            Error::ToolNotFound { tool } => assert_eq!(tool, "Meson build system"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unversioned_instances_sort_last() {
        let resolver = ToolResolver::with_strategies(vec![Box::new(Canned {
            name: "canned",
            instances: vec![
                ToolInstance::new(ToolId::Meson, "/unversioned/meson"),
                meson_at("/versioned/meson", (1, 0, 0)),
            ],
        })]);

        let found = resolver.resolve(ToolId::Meson);
        assert_eq!(found[0].path, PathBuf::from("/versioned/meson"));
        assert!(found[1].version.is_none());
    }
}
