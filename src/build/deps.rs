//! Project dependency scanning.
//!
//! Thin glob-based wrapper that lists the files a build depends on, for
//! the dependency manifest accompanying each artifact. Incremental-build
//! tracking itself lives with the caller.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::Pattern;
use walkdir::WalkDir;

/// Files every Meson project build depends on.
const DEFAULT_INCLUDE: &[&str] = &[
    "meson.build",
    "**/meson.build",
    "meson_options.txt",
    "**/*.c",
    "**/*.cc",
    "**/*.cpp",
    "**/*.cxx",
    "**/*.h",
    "**/*.hh",
    "**/*.hpp",
    "**/*.m",
    "**/*.mm",
];

/// Scan a project directory with the default source patterns.
pub fn scan_project(project_dir: &Path) -> Result<Vec<PathBuf>> {
    scan_with_patterns(project_dir, DEFAULT_INCLUDE, &[])
}

/// Scan a directory for files matching any include pattern and no exclude
/// pattern. Patterns match paths relative to `dir`; hidden directories and
/// build output are skipped. Results are sorted for determinism.
pub fn scan_with_patterns(
    dir: &Path,
    include: &[&str],
    exclude: &[&str],
) -> Result<Vec<PathBuf>> {
    let include: Vec<Pattern> = include
        .iter()
        .map(|p| Pattern::new(p).with_context(|| format!("bad include pattern `{}`", p)))
        .collect::<Result<_>>()?;
    let exclude: Vec<Pattern> = exclude
        .iter()
        .map(|p| Pattern::new(p).with_context(|| format!("bad exclude pattern `{}`", p)))
        .collect::<Result<_>>()?;

    let mut files = Vec::new();
    let walker = WalkDir::new(dir).into_iter().filter_entry(|entry| {
        // Never filter the scan root; its own name is irrelevant.
        if entry.depth() == 0 {
            return true;
        }
        let name = entry.file_name().to_string_lossy();
        !(entry.file_type().is_dir() && (name.starts_with('.') || name == "builddir"))
    });

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(dir) else {
            continue;
        };
        let matched = include.iter().any(|p| p.matches_path(rel))
            && !exclude.iter().any(|p| p.matches_path(rel));
        if matched {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn project() -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("meson.build"), "project('add', 'c')").unwrap();
        fs::write(tmp.path().join("add.c"), "int add(int a, int b);").unwrap();
        fs::write(tmp.path().join("README.md"), "docs").unwrap();
        fs::create_dir(tmp.path().join("src")).unwrap();
        fs::write(tmp.path().join("src").join("impl.c"), "").unwrap();
        tmp
    }

    #[test]
    fn test_default_scan_picks_sources_and_meson_files() {
        let tmp = project();
        let files = scan_project(tmp.path()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| {
                p.strip_prefix(tmp.path())
                    .unwrap()
                    .display()
                    .to_string()
            })
            .collect();
        assert!(names.contains(&"meson.build".to_string()));
        assert!(names.contains(&"add.c".to_string()));
        assert!(names.iter().any(|n| n.ends_with("impl.c")));
        assert!(!names.contains(&"README.md".to_string()));
    }

    #[test]
    fn test_exclude_patterns_win() {
        let tmp = project();
        let files = scan_with_patterns(tmp.path(), &["**/*.c"], &["src/**"]).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["add.c"]);
    }

    #[test]
    fn test_output_is_sorted() {
        let tmp = project();
        let files = scan_project(tmp.path()).unwrap();
        let mut sorted = files.clone();
        sorted.sort();
        assert_eq!(files, sorted);
    }
}
