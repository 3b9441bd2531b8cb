// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! Function rewriter: marks functions that use `.await` as `async`.
//!
//! Works purely on lines and brace counts:
//! - A function starts on a line matching the signature pattern, opening brace included
//! - Its span ends on the first line where the running brace depth (starting at 1) hits 0
//! - If the span body contains `.await` and the signature lacks `async fn`, `async `
//!   is inserted before the first `fn` keyword on the signature line
//!
//! Nothing else is parsed: `.await` inside strings or comments still counts, braces in
//! literals still count, and signatures whose `{` is on a later line are never seen.

use anyhow::{bail, Result};
use regex::Regex;

/// Literal that marks a suspend point inside a function body
pub const AWAIT_MARKER: &str = ".await";

/// Qualifier inserted before the `fn` keyword
pub const ASYNC_QUALIFIER: &str = "async";

/// Signature pattern, anchored at line start: indent, optional `pub`, optional `async`,
/// `fn name`, optional generics, parameter list, optional return type, then `{`.
///
/// `async fn` lines must match too, otherwise a fixed function would stop owning its
/// body on the next run and nested signatures inside it would be picked up.
fn signature_re() -> &'static Regex {
    static SIGNATURE_RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    SIGNATURE_RE.get_or_init(|| {
        Regex::new(
            r"^(\s*)(pub\s+)?(async\s+)?(fn\s+(\w+)(?:<[^>]+>)?(?:\([^)]*\))(?:\s*->\s*[^{]+)?)\s*\{",
        )
        .unwrap()
    })
}

fn already_async_re() -> &'static Regex {
    static ASYNC_RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    ASYNC_RE.get_or_init(|| Regex::new(r"async\s+fn\s").unwrap())
}

fn fn_keyword_re() -> &'static Regex {
    static FN_RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    FN_RE.get_or_init(|| Regex::new(r"fn\s").unwrap())
}

/// Fields captured from a signature line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureMatch {
    /// Leading whitespace
    pub indent: String,
    /// `pub ` (with its trailing whitespace) if present
    pub visibility: Option<String>,
    /// `async` sat between the visibility and `fn`
    pub is_async: bool,
    /// `fn name<..>(..) -> Ret`, up to but not including the opening brace
    pub signature: String,
    /// Function name
    pub name: String,
}

/// One function definition found by the scanner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSpan {
    /// 1-based line of the signature
    pub start_line: usize,
    /// 1-based line where the brace depth returned to zero
    pub end_line: usize,
    pub name: String,
    /// Body (signature line excluded) contains `.await`
    pub has_marker: bool,
    /// Signature line already carried `async fn`
    pub already_async: bool,
    /// Signature line as it was read
    pub original_signature: String,
    /// Replacement signature line, when the qualifier was inserted
    pub rewritten_signature: Option<String>,
}

impl FunctionSpan {
    pub fn is_rewritten(&self) -> bool {
        self.rewritten_signature.is_some()
    }
}

/// Result of rewriting one source text
#[derive(Debug, Clone)]
pub struct Rewrite {
    pub text: String,
    pub spans: Vec<FunctionSpan>,
}

impl Rewrite {
    /// Spans whose signature was changed
    pub fn rewritten(&self) -> impl Iterator<Item = &FunctionSpan> {
        self.spans.iter().filter(|s| s.is_rewritten())
    }

    pub fn rewritten_count(&self) -> usize {
        self.rewritten().count()
    }

    /// Marker present but the signature was already async
    pub fn already_async_count(&self) -> usize {
        self.spans
            .iter()
            .filter(|s| s.has_marker && s.already_async)
            .count()
    }

    pub fn is_changed(&self) -> bool {
        self.rewritten_count() > 0
    }
}

/// Match a line against the signature pattern
pub fn match_signature(line: &str) -> Option<SignatureMatch> {
    let caps = signature_re().captures(line)?;
    Some(SignatureMatch {
        indent: caps[1].to_string(),
        visibility: caps.get(2).map(|m| m.as_str().to_string()),
        is_async: caps.get(3).is_some(),
        signature: caps[4].trim_end().to_string(),
        name: caps[5].to_string(),
    })
}

/// True if the line already has `async` directly before a `fn` keyword
pub fn has_async_qualifier(line: &str) -> bool {
    already_async_re().is_match(line)
}

/// Insert `async ` before the first `fn` keyword occurrence on the line.
///
/// The first occurrence wins even if it sits inside an earlier token; callers only
/// pass lines that matched the signature pattern, where that is the introducer.
pub fn insert_async_qualifier(line: &str) -> Option<String> {
    let m = fn_keyword_re().find(line)?;
    let mut out = String::with_capacity(line.len() + ASYNC_QUALIFIER.len() + 1);
    out.push_str(&line[..m.start()]);
    out.push_str(ASYNC_QUALIFIER);
    out.push(' ');
    out.push_str(&line[m.start()..]);
    Some(out)
}

/// Net brace change for one line: +1 per `{`, -1 per `}`
fn brace_delta(line: &str) -> i64 {
    line.chars().fold(0, |acc, c| match c {
        '{' => acc + 1,
        '}' => acc - 1,
        _ => acc,
    })
}

/// Find where the span starting at `start` closes.
///
/// Returns the index of the closing line and whether any body line holds the marker.
fn scan_span(lines: &[&str], start: usize) -> Option<(usize, bool)> {
    let mut depth: i64 = 1;
    let mut has_marker = false;
    let mut j = start + 1;

    while j < lines.len() {
        let line = lines[j];
        has_marker |= line.contains(AWAIT_MARKER);
        depth += brace_delta(line);
        if depth <= 0 {
            return Some((j, has_marker));
        }
        j += 1;
    }
    None
}

/// Rewrite a whole source text, returning the new text and every span found
pub fn rewrite_source(content: &str) -> Result<Rewrite> {
    let lines: Vec<&str> = content.split('\n').collect();
    let mut output: Vec<String> = Vec::with_capacity(lines.len());
    let mut spans = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];

        let Some(sig) = match_signature(line) else {
            output.push(line.to_string());
            i += 1;
            continue;
        };

        let Some((end, has_marker)) = scan_span(&lines, i) else {
            bail!(
                "Unterminated function '{}' starting at line {}: {}",
                sig.name,
                i + 1,
                line.trim()
            );
        };

        let already_async = sig.is_async || has_async_qualifier(line);
        let rewritten_signature = if has_marker && !already_async {
            insert_async_qualifier(line)
        } else {
            None
        };

        output.push(rewritten_signature.clone().unwrap_or_else(|| line.to_string()));
        output.extend(lines[i + 1..=end].iter().map(|l| l.to_string()));

        spans.push(FunctionSpan {
            start_line: i + 1,
            end_line: end + 1,
            name: sig.name,
            has_marker,
            already_async,
            original_signature: line.to_string(),
            rewritten_signature,
        });

        i = end + 1;
    }

    Ok(Rewrite {
        text: output.join("\n"),
        spans,
    })
}

/// Rewrite a source text and return only the new text
pub fn fix_async_functions(content: &str) -> Result<String> {
    Ok(rewrite_source(content)?.text)
}
