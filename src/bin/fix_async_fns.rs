// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! Fix: Async Functions
//!
//! Scans the .rs files directly inside one directory and inserts `async` into
//! every fn signature whose body contains `.await` and is not already async.
//!
//! Usage:
//!   asyncify-fix-async-fns src/logic            # Fix a directory
//!   ASYNCIFY_DIR=src/logic asyncify-fix-async-fns
//!   asyncify-fix-async-fns src/logic -n -v      # Show what would change
//!   asyncify-fix-async-fns src/logic --json     # Summary as JSON
//!
//! Binary: asyncify-fix-async-fns

use anyhow::Result;
use asyncify::report::stats_json;
use asyncify::walker::check_failures;
use asyncify::{process_dir, FixArgs, FixOptions, Reporter};

fn main() -> Result<()> {
    let start = std::time::Instant::now();
    let args = FixArgs::parse_and_validate()?;

    let options = FixOptions {
        dry_run: args.dry_run,
        verbose: args.verbose,
        keep_going: args.keep_going,
    };

    let mut reporter = if args.json { Reporter::quiet() } else { Reporter::stdout() };
    if let Some(ref log) = args.log {
        reporter = reporter.with_log_file(log)?;
    }

    reporter.line("Async Function Fixer");
    reporter.line("====================");
    reporter.line("");
    reporter.header(&args.dir, args.dry_run);

    let stats = process_dir(&args.dir, &options, &mut reporter)?;
    reporter.summary(&stats, start.elapsed().as_secs_f64());

    if args.json {
        println!("{}", stats_json(&stats)?);
    } else if let Some(path) = reporter.log_path() {
        println!();
        println!("Log: {}", path.display());
    }

    check_failures(&stats)
}
