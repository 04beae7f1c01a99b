//! Build environment derivation.
//!
//! MSVC compilers cannot be invoked without the environment produced by
//! `vcvarsall.bat`; every other toolchain uses the ambient environment.
//! The compile step additionally gets Ninja's directory prepended to PATH
//! so Meson's backend can find it; the configure step runs on the base
//! environment.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::resolver::compiler::ResolvedToolchain;
use crate::util::process::{ProcessBuilder, ProcessRunner};

/// Environment variable overlay applied on top of the ambient process
/// environment.
pub type EnvOverlay = HashMap<String, String>;

/// Variables worth carrying out of a toolchain environment script.
const MSVC_ENV_VARS: &[&str] = &["PATH", "INCLUDE", "LIB", "LIBPATH", "VSCMD_ARG_TGT_ARCH"];

/// Derive the base environment for the external build tool.
///
/// With an MSVC environment script present, the script is executed and its
/// resulting variables captured; otherwise the overlay is empty and the
/// ambient environment is used unmodified.
pub fn derive_environment(
    toolchain: &ResolvedToolchain,
    runner: &dyn ProcessRunner,
) -> Result<EnvOverlay> {
    match &toolchain.env_script {
        Some(script) => {
            let captured = capture_script_env(&script.script, &script.args, runner)?;
            Ok(captured
                .into_iter()
                .filter(|(key, _)| MSVC_ENV_VARS.contains(&key.as_str()))
                .collect())
        }
        None => Ok(EnvOverlay::new()),
    }
}

/// Prepend a directory to the PATH entry of an overlay, falling back to
/// the ambient PATH when the overlay has none.
pub fn prepend_path(overlay: &mut EnvOverlay, dir: &Path) {
    let base = overlay
        .get("PATH")
        .cloned()
        .or_else(|| std::env::var("PATH").ok())
        .unwrap_or_default();
    let sep = if cfg!(target_os = "windows") { ';' } else { ':' };
    let value = if base.is_empty() {
        dir.display().to_string()
    } else {
        format!("{}{}{}", dir.display(), sep, base)
    };
    overlay.insert("PATH".to_string(), value);
}

/// Run an environment-initialization script and capture the variable set
/// it produces.
///
/// The script is called from a wrapper batch file to sidestep cmd.exe
/// quoting, then `set` dumps the resulting environment.
pub fn capture_script_env(
    script: &Path,
    args: &[String],
    runner: &dyn ProcessRunner,
) -> Result<HashMap<String, String>> {
    let temp_dir = std::env::temp_dir();
    let temp_batch = temp_dir.join("crossdock_env.bat");

    let batch_content = format!(
        "@echo off\r\ncall \"{}\" {} >nul 2>&1\r\nif errorlevel 1 exit /b 1\r\nset\r\n",
        script.display(),
        args.join(" ")
    );
    std::fs::write(&temp_batch, &batch_content)
        .with_context(|| format!("failed to write {}", temp_batch.display()))?;

    let cmd = ProcessBuilder::new("cmd").arg("/c").arg(&temp_batch);
    let output = runner.run(&cmd);
    let _ = std::fs::remove_file(&temp_batch);

    let output = output.with_context(|| {
        format!("failed to run environment script {}", script.display())
    })?;
    if !output.status.success() {
        bail!(
            "environment script `{}` exited with {:?}",
            script.display(),
            output.status.code()
        );
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(parse_env_dump(&stdout))
}

/// Parse `KEY=value` lines from a `set` dump.
fn parse_env_dump(dump: &str) -> HashMap<String, String> {
    let mut vars = HashMap::new();
    for line in dump.lines() {
        if let Some((key, value)) = line.split_once('=') {
            if !key.is_empty() {
                vars.insert(key.to_uppercase(), value.to_string());
            }
        }
    }
    vars
}
