//! Build error taxonomy.
//!
//! Every condition here is fatal to the current build invocation; nothing
//! is retried and nothing is downgraded to a warning. Callers render these
//! through `anyhow` context chains.

use std::fmt;

use thiserror::Error;

use crate::core::target::Target;

/// Which orchestration phase an external process belonged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
    EnvironmentSetup,
    Configure,
    Compile,
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildPhase::EnvironmentSetup => "environment setup",
            BuildPhase::Configure => "configure",
            BuildPhase::Compile => "compile",
        };
        f.write_str(name)
    }
}

/// Fatal build errors.
#[derive(Debug, Error)]
pub enum Error {
    /// A required external tool could not be located by any resolver
    /// strategy.
    #[error("required tool not found: {tool}")]
    ToolNotFound { tool: String },

    /// A resolved tool's version is outside the supported range.
    #[error("unsupported {tool} version {found}: required {required}")]
    UnsupportedVersion {
        tool: String,
        found: String,
        required: String,
    },

    /// No mapping-table entry exists for the requested target.
    #[error("unsupported target: {target}")]
    UnsupportedTarget { target: Target },

    /// An external configure/compile process exited non-zero.
    ///
    /// Meson reports most configure and compile diagnostics on stdout, so
    /// the rendered message carries both captured streams.
    #[error("{phase} failed: `{command}` exited with {status:?}\n{}", captured_output(.stdout, .stderr))]
    ExternalProcessFailed {
        phase: BuildPhase,
        command: String,
        status: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// A descriptor field required for the target was never populated.
    ///
    /// This indicates a gap in the mapping tables and is a defect, not a
    /// runtime condition.
    #[error("descriptor field `{key}` in [{section}] was never populated")]
    MissingField {
        section: &'static str,
        key: &'static str,
    },
}

fn captured_output(stdout: &str, stderr: &str) -> String {
    match (stdout.trim().is_empty(), stderr.trim().is_empty()) {
        (false, false) => format!("{}\n{}", stdout.trim_end(), stderr.trim_end()),
        (false, true) => stdout.trim_end().to_string(),
        _ => stderr.trim_end().to_string(),
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::target::{Arch, Os};

    #[test]
    fn test_unsupported_target_names_the_target() {
        let err = Error::UnsupportedTarget {
            target: Target::new(Arch::Ia32, Os::MacOs),
        };
        assert!(err.to_string().contains("macos-ia32"));
    }

    #[test]
    fn test_process_failure_carries_captured_output() {
        let err = Error::ExternalProcessFailed {
            phase: BuildPhase::Configure,
            command: "meson setup out".to_string(),
            status: Some(1),
            stdout: String::new(),
            stderr: "meson.build:1:0: ERROR".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("configure"));
        assert!(msg.contains("meson setup out"));
        assert!(msg.contains("ERROR"));
    }

    #[test]
    fn test_process_failure_surfaces_stdout_diagnostics() {
        // Meson writes configure errors to stdout, not stderr.
        let err = Error::ExternalProcessFailed {
            phase: BuildPhase::Configure,
            command: "meson setup out".to_string(),
            status: Some(1),
            stdout: "meson.build:3:0: ERROR: Unknown compiler".to_string(),
            stderr: String::new(),
        };
        assert!(err.to_string().contains("Unknown compiler"));
    }

    #[test]
    fn test_process_failure_carries_both_streams() {
        let err = Error::ExternalProcessFailed {
            phase: BuildPhase::Compile,
            command: "meson compile -C out".to_string(),
            status: Some(2),
            stdout: "ninja: build stopped".to_string(),
            stderr: "add.c:1:1: error: expected identifier".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("ninja: build stopped"));
        assert!(msg.contains("expected identifier"));
    }
}
