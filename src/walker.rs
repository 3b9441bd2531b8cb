// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! Directory walker: rewrites every .rs file directly inside one directory.
//!
//! Each file is read whole, rewritten in memory, and only then written back
//! through a temp file in the same directory that is renamed over the original.

use anyhow::{bail, Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::report::{Reporter, RunStats};
use crate::rewriter::{rewrite_source, Rewrite};

/// Extension of the files that get rewritten
pub const SOURCE_EXTENSION: &str = "rs";

/// Run options that do not affect the rewrite itself
#[derive(Debug, Clone, Copy, Default)]
pub struct FixOptions {
    pub dry_run: bool,
    pub verbose: bool,
    pub keep_going: bool,
}

/// What happened to one file
#[derive(Debug)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub rewrite: Rewrite,
    pub written: bool,
}

/// List the .rs files directly inside `dir`, sorted by path. Subdirectories are not entered.
pub fn find_source_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("Failed to list {}", dir.display()))?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|e| e == SOURCE_EXTENSION) {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

/// Replace `path` with `text` via a sibling temp file and a rename.
///
/// Symlinks are resolved first so the link stays a link and its target gets the new text.
pub fn write_atomic(path: &Path, text: &str) -> Result<()> {
    let target = fs::canonicalize(path)
        .with_context(|| format!("Failed to resolve {}", path.display()))?;
    let dir = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let permissions = fs::metadata(&target)
        .with_context(|| format!("Failed to stat {}", path.display()))?
        .permissions();

    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file for {} in {}", path.display(), dir.display()))?;
    tmp.write_all(text.as_bytes())
        .with_context(|| format!("Failed to write temp file for {}", path.display()))?;
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("Failed to sync temp file for {}", path.display()))?;
    fs::set_permissions(tmp.path(), permissions)
        .with_context(|| format!("Failed to set permissions on temp file for {}", path.display()))?;
    tmp.persist(&target)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Read, rewrite and (unless dry run or unchanged) write back one file
pub fn process_file(path: &Path, options: &FixOptions) -> Result<FileOutcome> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let rewrite = rewrite_source(&content)
        .with_context(|| format!("Failed to rewrite {}", path.display()))?;

    let written = rewrite.text != content && !options.dry_run;
    if written {
        write_atomic(path, &rewrite.text)?;
    }

    Ok(FileOutcome {
        path: path.to_path_buf(),
        rewrite,
        written,
    })
}

fn report_outcome(outcome: &FileOutcome, options: &FixOptions, reporter: &mut Reporter) {
    for span in outcome.rewrite.rewritten() {
        reporter.line(format!("  Line {}: ADD async - fn {}", span.start_line, span.name));
        if options.verbose {
            reporter.line(format!("    - {}", span.original_signature));
            if let Some(ref new) = span.rewritten_signature {
                reporter.line(format!("    + {}", new));
            }
        }
    }
}

/// Rewrite every .rs file in `dir`.
///
/// Stops at the first failing file unless `keep_going` is set, in which case failures
/// are reported, counted in `files_failed`, and the remaining files are still processed.
pub fn process_dir(dir: &Path, options: &FixOptions, reporter: &mut Reporter) -> Result<RunStats> {
    let files = find_source_files(dir)?;
    let mut stats = RunStats {
        dry_run: options.dry_run,
        ..RunStats::default()
    };

    for file in &files {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file.display().to_string());
        reporter.line(format!("Processing {}...", name));
        stats.files_scanned += 1;

        match process_file(file, options) {
            Ok(outcome) => {
                report_outcome(&outcome, options, reporter);
                stats.functions_scanned += outcome.rewrite.spans.len();
                stats.functions_made_async += outcome.rewrite.rewritten_count();
                stats.functions_already_async += outcome.rewrite.already_async_count();
                if outcome.rewrite.is_changed() {
                    stats.files_modified += 1;
                }
            }
            Err(e) if options.keep_going => {
                reporter.error(format!("  FAILED: {:#}", e));
                stats.files_failed += 1;
            }
            Err(e) => return Err(e),
        }
    }

    reporter.line("Done fixing async functions");
    Ok(stats)
}

/// Fail the run if any file failed under `keep_going`
pub fn check_failures(stats: &RunStats) -> Result<()> {
    if stats.files_failed > 0 {
        bail!("{} file(s) could not be processed", stats.files_failed);
    }
    Ok(())
}
