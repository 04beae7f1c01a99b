//! `crossdock build` command

use anyhow::{bail, Context, Result};
use crossdock::{
    BuildOrchestrator, BuildSpec, LinkMode, OptionMap, OutputKind, Target, ToolOverrides,
};

use crate::cli::BuildArgs;

pub fn execute(args: BuildArgs) -> Result<()> {
    let target = match &args.target {
        Some(s) => s
            .parse::<Target>()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| "run `crossdock targets` for the supported set")?,
        None => Target::host(),
    };

    let kind = if args.exe {
        OutputKind::Executable
    } else if args.link == "static" {
        OutputKind::Library(LinkMode::Static)
    } else {
        OutputKind::Library(LinkMode::Dynamic)
    };

    let mut options = OptionMap::new();
    for define in &args.define {
        let Some((key, value)) = define.split_once('=') else {
            bail!("invalid -D option `{}`: expected KEY=VALUE", define);
        };
        if options.get(key).is_some() {
            bail!("duplicate -D option `{}`", key);
        }
        options.insert(key, value);
    }

    let project_dir = args
        .project_dir
        .canonicalize()
        .with_context(|| format!("project directory {}", args.project_dir.display()))?;
    let output_dir = args
        .out_dir
        .unwrap_or_else(|| project_dir.join("builddir"));

    let spec = BuildSpec {
        target,
        target_name: args.name,
        kind,
        options,
        api_level: args.api_level,
        project_dir,
        output_dir,
        release: args.release,
        dry_run: args.dry_run,
        overrides: ToolOverrides {
            cc: args.cc,
            ld: args.ld,
            ar: args.ar,
            strip: args.strip,
        },
    };

    let output = BuildOrchestrator::new().build(&spec)?;

    for record in &output.artifacts {
        println!("{}  {}", record.target, record.path.display());
    }

    if let Some(manifest) = &args.manifest {
        let json = serde_json::to_string_pretty(&output)?;
        std::fs::write(manifest, json)
            .with_context(|| format!("failed to write {}", manifest.display()))?;
        tracing::info!(path = %manifest.display(), "wrote artifact manifest");
    }

    Ok(())
}
