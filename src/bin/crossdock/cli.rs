//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "crossdock",
    version,
    about = "Native toolchain resolution and Meson cross-build driver"
)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a Meson target for a platform
    Build(BuildArgs),
    /// List the supported targets
    Targets,
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct BuildArgs {
    /// Meson target name inside the project
    pub name: String,

    /// Target platform, e.g. `android-arm64` or `ios-arm64-simulator`
    /// (defaults to the build host)
    #[arg(long)]
    pub target: Option<String>,

    /// Library link mode
    #[arg(long, value_parser = ["static", "shared"], default_value = "shared")]
    pub link: String,

    /// Build an executable instead of a library
    #[arg(long, conflicts_with = "link")]
    pub exe: bool,

    /// Build with optimizations
    #[arg(long)]
    pub release: bool,

    /// Meson project options, forwarded as -Dkey=value
    #[arg(short = 'D', value_name = "KEY=VALUE")]
    pub define: Vec<String>,

    /// Android API level appended to the NDK triple
    #[arg(long, default_value_t = 21)]
    pub api_level: u32,

    /// Report artifact records without running any external tool
    #[arg(long)]
    pub dry_run: bool,

    /// Directory containing meson.build
    #[arg(long, default_value = ".")]
    pub project_dir: PathBuf,

    /// Build output directory (wiped on every build)
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Write artifact records as JSON to this path
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Override the C compiler
    #[arg(long, env = "CC")]
    pub cc: Option<PathBuf>,

    /// Override the linker
    #[arg(long, env = "LD")]
    pub ld: Option<PathBuf>,

    /// Override the archiver
    #[arg(long, env = "AR")]
    pub ar: Option<PathBuf>,

    /// Override the strip tool
    #[arg(long, env = "STRIP")]
    pub strip: Option<PathBuf>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
