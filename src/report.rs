// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! Run statistics and reporting.
//!
//! Every report line goes to stdout and, when a log file was requested, to the log.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::args::format_number;

/// Counters for one run
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub files_scanned: usize,
    pub files_modified: usize,
    pub functions_scanned: usize,
    pub functions_made_async: usize,
    pub functions_already_async: usize,
    pub files_failed: usize,
    pub dry_run: bool,
}

/// Line-oriented reporter with an optional log file
pub struct Reporter {
    log: Option<(PathBuf, fs::File)>,
    log_failed: bool,
    quiet: bool,
}

impl Reporter {
    /// Reporter that prints to stdout only
    pub fn stdout() -> Self {
        Self { log: None, log_failed: false, quiet: false }
    }

    /// Reporter that prints nothing to stdout; errors and the log file still get lines
    pub fn quiet() -> Self {
        Self { log: None, log_failed: false, quiet: true }
    }

    pub fn with_log_file(mut self, path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
        }
        let file = fs::File::create(path)
            .with_context(|| format!("Failed to create log file {}", path.display()))?;
        self.log = Some((path.to_path_buf(), file));
        Ok(self)
    }

    pub fn log_path(&self) -> Option<&Path> {
        self.log.as_ref().map(|(p, _)| p.as_path())
    }

    /// True once a write to the log file has failed
    pub fn log_failed(&self) -> bool {
        self.log_failed
    }

    /// Emit one line
    pub fn line(&mut self, msg: impl AsRef<str>) {
        let msg = msg.as_ref();
        if !self.quiet {
            println!("{}", msg);
        }
        self.log_only(msg);
    }

    /// Emit an error line on stderr (and the log)
    pub fn error(&mut self, msg: impl AsRef<str>) {
        let msg = msg.as_ref();
        eprintln!("{}", msg);
        self.log_only(msg);
    }

    /// Write only to the log file, if any. The first failure is reported on stderr.
    pub fn log_only(&mut self, msg: impl AsRef<str>) {
        if let Some((path, log)) = self.log.as_mut() {
            if let Err(e) = writeln!(log, "{}", msg.as_ref()) {
                if !self.log_failed {
                    eprintln!("Warning: failed to write log file {}: {}", path.display(), e);
                    self.log_failed = true;
                }
            }
        }
    }

    pub fn header(&mut self, dir: &Path, dry_run: bool) {
        let start_time = chrono::Local::now().format("%Y-%m-%d %H:%M:%S %Z");
        self.log_only("asyncify-fix-async-fns");
        self.log_only("======================");
        self.log_only(format!("Command: {}", std::env::args().collect::<Vec<_>>().join(" ")));
        self.log_only(format!("Started: {}", start_time));
        self.line(format!("Directory: {}", dir.display()));
        if dry_run {
            self.line("Mode: DRY RUN (no files will be modified)");
        } else {
            self.line("Mode: APPLY FIXES");
        }
        self.line("");
    }

    pub fn summary(&mut self, stats: &RunStats, elapsed_secs: f64) {
        let end_time = chrono::Local::now().format("%Y-%m-%d %H:%M:%S %Z");
        self.line("");
        self.line("Summary");
        self.line("-------");
        self.line(format!("Files scanned:           {}", format_number(stats.files_scanned)));
        self.line(format!("Files modified:          {}", format_number(stats.files_modified)));
        self.line(format!("Functions scanned:       {}", format_number(stats.functions_scanned)));
        self.line(format!("Functions made async:    {}", format_number(stats.functions_made_async)));
        self.line(format!("Functions already async: {}", format_number(stats.functions_already_async)));
        if stats.files_failed > 0 {
            self.line(format!("Files failed:            {}", format_number(stats.files_failed)));
        }
        if stats.dry_run && stats.functions_made_async > 0 {
            self.line("");
            self.line("Run without --dry-run to apply fixes.");
        }
        self.log_only(format!("\nTOTAL TIME: {:.2} seconds", elapsed_secs));
        self.log_only(format!("Ended: {}", end_time));
        if let Some((path, log)) = self.log.as_mut() {
            if let Err(e) = log.flush() {
                if !self.log_failed {
                    eprintln!("Warning: failed to write log file {}: {}", path.display(), e);
                    self.log_failed = true;
                }
            }
        }
    }
}

/// Render stats as pretty JSON
pub fn stats_json(stats: &RunStats) -> Result<String> {
    serde_json::to_string_pretty(stats).context("Failed to serialize run summary")
}
