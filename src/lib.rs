// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! Asyncify - mark Rust functions that use `.await` as `async`
//!
//! A line-oriented source fixer: functions are found with a signature pattern
//! and brace counting, not a parser, and rewritten in place one directory at a time.

pub mod args;
pub mod report;
pub mod rewriter;
pub mod walker;

// Re-export commonly used items
pub use args::{format_number, FixArgs};
pub use report::{Reporter, RunStats};
pub use rewriter::{fix_async_functions, rewrite_source, FunctionSpan, Rewrite, SignatureMatch};
pub use walker::{find_source_files, process_dir, process_file, FixOptions};
