// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! Argument parsing for the asyncify tools
//!
//! The only required input is the directory to scan, given as DIR or through
//! the ASYNCIFY_DIR environment variable.

use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};

/// Mark functions whose bodies use `.await` as `async`
#[derive(Parser, Debug, Clone)]
#[command(name = "asyncify-fix-async-fns")]
#[command(about = "Insert `async` into fn signatures whose bodies contain .await")]
pub struct FixArgs {
    /// Directory whose .rs files are rewritten in place (not recursive)
    #[arg(env = "ASYNCIFY_DIR")]
    pub dir: PathBuf,

    /// Show what would change without modifying files
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Show old and new signature lines
    #[arg(short, long)]
    pub verbose: bool,

    /// Continue with remaining files after a file fails
    #[arg(long)]
    pub keep_going: bool,

    /// Also write the run report to this file
    #[arg(long, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Print the final summary as JSON
    #[arg(long)]
    pub json: bool,
}

impl FixArgs {
    /// Parse from the process command line and validate the directory
    pub fn parse_and_validate() -> Result<Self> {
        let args = Self::parse();
        args.validate()?;
        Ok(args)
    }

    /// Check that the target directory exists and is a directory
    pub fn validate(&self) -> Result<()> {
        validate_dir(&self.dir)
    }
}

pub fn validate_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        return Err(anyhow::anyhow!("Directory not found: {}", dir.display()));
    }
    if !dir.is_dir() {
        return Err(anyhow::anyhow!("Not a directory: {}", dir.display()));
    }
    Ok(())
}

/// Format a number with comma separators for readability
///
/// Examples:
/// - 1234 -> "1,234"
/// - 1000000 -> "1,000,000"
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();

    for (count, c) in s.chars().rev().enumerate() {
        if count > 0 && count % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    result.chars().rev().collect()
}
