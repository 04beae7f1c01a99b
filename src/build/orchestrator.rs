//! Build orchestration.
//!
//! One invocation walks a fixed sequence: validate the target, fan out
//! tool resolution and the output-directory reset, gate on the Meson
//! version, generate the cross file, derive the environment, then run
//! `meson setup` and `meson compile` strictly one after the other.
//! Every failure is fatal; nothing is retried.

use std::path::PathBuf;

use anyhow::{Context, Result};
use semver::VersionReq;

use crate::core::error::{BuildPhase, Error};
use crate::core::spec::BuildSpec;
use crate::core::target::Target;
use crate::cross::descriptor::CrossDescriptor;
use crate::cross::{maps, serialize};
use crate::resolver::chain::ToolResolver;
use crate::resolver::compiler::resolve_toolchain;
use crate::resolver::tool::{ToolId, ToolInstance};
use crate::util::process::{ExecRunner, ProcessBuilder, ProcessRunner};
use crate::util::fs as cfs;

use super::artifact::{ArtifactRecord, BuildOutput};
use super::deps;
use super::env::{derive_environment, prepend_path, EnvOverlay};

/// Meson versions this driver knows how to talk to.
const MESON_VERSION_REQ: &str = ">=1.0.0, <2.0.0";

/// Drives one build invocation end to end.
pub struct BuildOrchestrator {
    resolver: ToolResolver,
    runner: Box<dyn ProcessRunner>,
}

impl BuildOrchestrator {
    pub fn new() -> Self {
        BuildOrchestrator {
            resolver: ToolResolver::new(),
            runner: Box::new(ExecRunner),
        }
    }

    /// Build with an explicit resolver and process runner (for tests).
    pub fn with_parts(resolver: ToolResolver, runner: Box<dyn ProcessRunner>) -> Self {
        BuildOrchestrator { resolver, runner }
    }

    /// Run a build to completion, or report the build the spec describes
    /// in dry-run mode.
    pub fn build(&self, spec: &BuildSpec) -> Result<BuildOutput> {
        // The target must be mapped before anything is spawned or wiped.
        maps::host_machine(spec.target)?;
        maps::target_triple(spec.target, spec.api_level)?;

        let dependencies = deps::scan_project(&spec.project_dir)
            .with_context(|| format!("failed to scan {}", spec.project_dir.display()))?;

        if spec.dry_run {
            return Ok(dry_run_output(spec, dependencies));
        }

        tracing::info!(target = %spec.target, name = %spec.target_name, "starting build");

        // Fan out the independent preparation steps; all branches finish
        // before the first error wins.
        let ((clean, meson), (ninja, toolchain)) = rayon::join(
            || {
                rayon::join(
                    || cfs::reset_dir(&spec.output_dir),
                    || self.resolver.require(ToolId::Meson),
                )
            },
            || {
                rayon::join(
                    || self.resolver.require(ToolId::Ninja),
                    || resolve_toolchain(&self.resolver, spec.target, &spec.overrides),
                )
            },
        );
        clean?;
        let meson = meson?;
        let ninja = ninja?;
        let toolchain = toolchain?;

        check_meson_version(&meson)?;

        let sdk_root = self.resolve_sdk_root(spec.target)?;
        let descriptor = CrossDescriptor::assemble(
            spec.target,
            spec.kind,
            spec.api_level,
            &toolchain,
            sdk_root.as_deref(),
        )?;
        let cross_file = spec.output_dir.join("cross.ini");
        std::fs::write(&cross_file, serialize::render(&descriptor))
            .with_context(|| format!("failed to write {}", cross_file.display()))?;
        tracing::debug!(path = %cross_file.display(), "wrote cross file");

        let base_env = derive_environment(&toolchain, self.runner.as_ref())?;

        self.configure(spec, &meson, &cross_file, &base_env)?;

        // Only the compile step sees Ninja's directory on PATH.
        let mut compile_env = base_env;
        if let Some(dir) = ninja.path.parent() {
            prepend_path(&mut compile_env, dir);
        }
        self.compile(spec, &meson, &compile_env)?;

        let record = ArtifactRecord {
            target: spec.target,
            path: spec.artifact_path(),
            dependencies,
        };
        tracing::info!(artifact = %record.path.display(), "build finished");
        Ok(BuildOutput {
            artifacts: vec![record],
        })
    }

    /// `meson setup --backend ninja --cross-file <file> -D... <outDir>`,
    /// run in the project directory.
    fn configure(
        &self,
        spec: &BuildSpec,
        meson: &ToolInstance,
        cross_file: &std::path::Path,
        env: &EnvOverlay,
    ) -> Result<()> {
        let mut cmd = ProcessBuilder::new(&meson.path)
            .arg("setup")
            .args(["--backend", "ninja"])
            .arg("--cross-file")
            .arg(cross_file);
        for (key, value) in spec.effective_options().iter() {
            cmd = cmd.arg(format!("-D{}={}", key, value));
        }
        cmd = cmd
            .arg(&spec.output_dir)
            .cwd(&spec.project_dir)
            .envs(env.iter());

        self.run_checked(BuildPhase::Configure, &cmd)
    }

    /// `meson compile -C <outDir> <name>:<type>`, run in the project
    /// directory.
    fn compile(&self, spec: &BuildSpec, meson: &ToolInstance, env: &EnvOverlay) -> Result<()> {
        let qualified = format!("{}:{}", spec.target_name, spec.kind.meson_suffix());
        let cmd = ProcessBuilder::new(&meson.path)
            .arg("compile")
            .arg("-C")
            .arg(&spec.output_dir)
            .arg(&qualified)
            .cwd(&spec.project_dir)
            .envs(env.iter());

        self.run_checked(BuildPhase::Compile, &cmd)
    }

    fn run_checked(&self, phase: BuildPhase, cmd: &ProcessBuilder) -> Result<()> {
        tracing::debug!(%phase, command = %cmd.display_command(), "running");
        let output = self.runner.run(cmd)?;
        if !output.status.success() {
            return Err(Error::ExternalProcessFailed {
                phase,
                command: cmd.display_command(),
                status: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }
            .into());
        }
        Ok(())
    }

    /// Resolve the Apple SDK root via xcrun, when the target needs one.
    fn resolve_sdk_root(&self, target: Target) -> Result<Option<PathBuf>> {
        let Some(sdk) = maps::apple_sdk_name(target) else {
            return Ok(None);
        };
        let xcrun = self.resolver.require(ToolId::Xcrun)?;
        let cmd = ProcessBuilder::new(&xcrun.path).args(["--sdk", sdk, "--show-sdk-path"]);
        let output = self.runner.run(&cmd)?;
        if !output.status.success() {
            return Err(Error::ExternalProcessFailed {
                phase: BuildPhase::EnvironmentSetup,
                command: cmd.display_command(),
                status: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }
            .into());
        }
        let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(Some(PathBuf::from(path)))
    }
}

impl Default for BuildOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

/// Gate the resolved Meson instance on the supported version range.
pub fn check_meson_version(meson: &ToolInstance) -> crate::core::error::Result<()> {
    let req = VersionReq::parse(MESON_VERSION_REQ).expect("static version requirement");
    let found = meson
        .version
        .as_ref()
        .ok_or_else(|| Error::UnsupportedVersion {
            tool: ToolId::Meson.display_name().to_string(),
            found: "unknown".to_string(),
            required: MESON_VERSION_REQ.to_string(),
        })?;
    if !req.matches(found) {
        return Err(Error::UnsupportedVersion {
            tool: ToolId::Meson.display_name().to_string(),
            found: found.to_string(),
            required: MESON_VERSION_REQ.to_string(),
        });
    }
    Ok(())
}

/// Artifact records for every variant of the requested OS, without
/// touching the filesystem beyond the dependency scan. Each variant gets
/// its own path component so the records stay distinguishable by path.
fn dry_run_output(spec: &BuildSpec, dependencies: Vec<PathBuf>) -> BuildOutput {
    let artifacts = Target::variants_of(spec.target.os)
        .into_iter()
        .map(|variant| ArtifactRecord {
            target: variant,
            path: spec
                .output_dir
                .join(variant.to_string())
                .join(spec.kind.file_name(&spec.target_name, variant.os)),
            dependencies: dependencies.clone(),
        })
        .collect();
    BuildOutput { artifacts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::spec::{LinkMode, OptionMap, OutputKind, ToolOverrides};
    use crate::core::target::{Arch, Os};
    use semver::Version;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Runner that counts invocations and refuses to produce output.
    struct CountingRunner {
        count: Arc<AtomicUsize>,
    }

    impl ProcessRunner for CountingRunner {
        fn run(&self, _cmd: &ProcessBuilder) -> anyhow::Result<std::process::Output> {
            self.count.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("no external process expected in this test");
        }
    }

    fn spec_for(target: Target, project_dir: PathBuf, output_dir: PathBuf) -> BuildSpec {
        BuildSpec {
            target,
            target_name: "add".to_string(),
            kind: OutputKind::Library(LinkMode::Dynamic),
            options: OptionMap::new(),
            api_level: 26,
            project_dir,
            output_dir,
            release: false,
            dry_run: false,
            overrides: ToolOverrides::default(),
        }
    }

    fn tiny_project() -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("meson.build"), "project('add', 'c')").unwrap();
        std::fs::write(
            tmp.path().join("add.c"),
            "int add(int a, int b) { return a + b; }",
        )
        .unwrap();
        tmp
    }

    fn counting_orchestrator() -> (BuildOrchestrator, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let orchestrator = BuildOrchestrator::with_parts(
            ToolResolver::with_strategies(vec![]),
            Box::new(CountingRunner {
                count: Arc::clone(&count),
            }),
        );
        (orchestrator, count)
    }

    #[test]
    fn test_unsupported_target_raised_before_any_process_spawns() {
        let tmp = tiny_project();
        let (orchestrator, count) = counting_orchestrator();
        let spec = spec_for(
            Target::new(Arch::Ia32, Os::MacOs),
            tmp.path().to_path_buf(),
            tmp.path().join("out"),
        );

        let err = orchestrator.build(&spec).unwrap_err();
        let err = err.downcast::<Error>().unwrap();
        assert!(matches!(err, Error::UnsupportedTarget { .. }));
        assert_eq!(count.load(Ordering::SeqCst), 0);
        // The output directory must not have been wiped or created either.
        assert!(!spec.output_dir.exists());
    }

    #[test]
    fn test_meson_below_range_is_unsupported_version() {
        let meson = ToolInstance::new(ToolId::Meson, "/usr/bin/meson")
            .with_version(Version::new(0, 61, 5));
        let err = check_meson_version(&meson).unwrap_err();
        match err {
            Error::UnsupportedVersion {
                found, required, ..
            } => {
                assert_eq!(found, "0.61.5");
                assert_eq!(required, ">=1.0.0, <2.0.0");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_meson_2x_rejected_and_1x_accepted() {
        let accepted = ToolInstance::new(ToolId::Meson, "meson")
            .with_version(Version::new(1, 4, 1));
        assert!(check_meson_version(&accepted).is_ok());

        let rejected = ToolInstance::new(ToolId::Meson, "meson")
            .with_version(Version::new(2, 0, 0));
        assert!(check_meson_version(&rejected).is_err());
    }

    #[test]
    fn test_meson_with_unknown_version_rejected() {
        let meson = ToolInstance::new(ToolId::Meson, "meson");
        let err = check_meson_version(&meson).unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion { .. }));
    }

    #[test]
    fn test_dry_run_spawns_nothing_and_reports_all_variants() {
        let tmp = tiny_project();
        let (orchestrator, count) = counting_orchestrator();
        let host = Target::host();
        let mut spec = spec_for(host, tmp.path().to_path_buf(), tmp.path().join("out"));
        spec.dry_run = true;

        let output = orchestrator.build(&spec).unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(!spec.output_dir.exists());

        let variants = Target::variants_of(host.os);
        assert_eq!(output.artifacts.len(), variants.len());
        for (record, variant) in output.artifacts.iter().zip(&variants) {
            assert_eq!(record.target, *variant);
            assert_eq!(record.target.os, host.os);
            assert!(!record.path.exists());
            // The variant appears in the path, keeping records distinct
            // even when the file name collides across architectures.
            assert!(record
                .path
                .components()
                .any(|c| c.as_os_str() == variant.to_string().as_str()));
            assert!(record
                .dependencies
                .iter()
                .any(|d| d.ends_with("meson.build")));
        }

        let mut paths: Vec<_> = output.artifacts.iter().map(|r| &r.path).collect();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), variants.len());
    }

    #[test]
    fn test_tool_not_found_surfaces_before_processes_run() {
        let tmp = tiny_project();
        let (orchestrator, count) = counting_orchestrator();
        let spec = spec_for(
            Target::new(Arch::Arm64, Os::Android),
            tmp.path().to_path_buf(),
            tmp.path().join("out"),
        );

        // Empty resolver chain: meson/ninja/compiler all unresolvable.
        let err = orchestrator.build(&spec).unwrap_err();
        let err = err.downcast::<Error>().unwrap();
        assert!(matches!(err, Error::ToolNotFound { .. }));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
