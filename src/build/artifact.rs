//! Artifact records: what a build produced (or would produce).

use std::path::PathBuf;

use serde::Serialize;

use crate::core::target::Target;

/// One produced (or predicted, in dry-run mode) artifact.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactRecord {
    /// Where the artifact runs.
    pub target: Target,
    /// Deterministic path of the artifact file.
    pub path: PathBuf,
    /// Project files the artifact depends on.
    pub dependencies: Vec<PathBuf>,
}

/// Result of one build invocation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildOutput {
    pub artifacts: Vec<ArtifactRecord>,
}
