// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! Tests for rewriting a directory of source files.

use asyncify::report::Reporter;
use asyncify::walker::{check_failures, process_dir, FixOptions};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const NEEDS_ASYNC: &str = "pub fn fetch(url: &str) -> Result<Body> {\n    let resp = get(url).await?;\n    Ok(resp.body)\n}\n";
const FIXED: &str = "pub async fn fetch(url: &str) -> Result<Body> {\n    let resp = get(url).await?;\n    Ok(resp.body)\n}\n";
const PLAIN: &str = "fn sum(xs: &[u32]) -> u32 {\n    xs.iter().sum()\n}\n";
const UNTERMINATED: &str = "fn broken() {\n    x.await;\n";

fn write(dir: &Path, name: &str, text: &str) {
    fs::write(dir.join(name), text).unwrap();
}

fn read(dir: &Path, name: &str) -> String {
    fs::read_to_string(dir.join(name)).unwrap()
}

fn run(dir: &Path, options: FixOptions) -> anyhow::Result<asyncify::RunStats> {
    let mut reporter = Reporter::quiet();
    process_dir(dir, &options, &mut reporter)
}

#[test]
fn test_directory_rewrite_in_place() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "net.rs", NEEDS_ASYNC);
    write(tmp.path(), "math.rs", PLAIN);
    write(tmp.path(), "README.md", NEEDS_ASYNC);

    let stats = run(tmp.path(), FixOptions::default()).unwrap();

    assert_eq!(read(tmp.path(), "net.rs"), FIXED);
    assert_eq!(read(tmp.path(), "math.rs"), PLAIN);
    assert_eq!(read(tmp.path(), "README.md"), NEEDS_ASYNC);
    assert_eq!(stats.files_scanned, 2);
    assert_eq!(stats.files_modified, 1);
    assert_eq!(stats.functions_scanned, 2);
    assert_eq!(stats.functions_made_async, 1);
    assert_eq!(stats.files_failed, 0);
}

#[test]
fn test_subdirectories_are_not_entered() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir(tmp.path().join("sub")).unwrap();
    write(&tmp.path().join("sub"), "deep.rs", NEEDS_ASYNC);

    let stats = run(tmp.path(), FixOptions::default()).unwrap();

    assert_eq!(stats.files_scanned, 0);
    assert_eq!(read(&tmp.path().join("sub"), "deep.rs"), NEEDS_ASYNC);
}

#[test]
fn test_second_run_changes_nothing() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "net.rs", NEEDS_ASYNC);

    run(tmp.path(), FixOptions::default()).unwrap();
    let stats = run(tmp.path(), FixOptions::default()).unwrap();

    assert_eq!(read(tmp.path(), "net.rs"), FIXED);
    assert_eq!(stats.files_modified, 0);
    assert_eq!(stats.functions_made_async, 0);
}

#[test]
fn test_empty_directory_completes() {
    let tmp = TempDir::new().unwrap();
    let log_path = tmp.path().join("run.log");
    let mut reporter = Reporter::quiet().with_log_file(&log_path).unwrap();

    let stats = process_dir(tmp.path(), &FixOptions::default(), &mut reporter).unwrap();
    drop(reporter);

    assert_eq!(stats.files_scanned, 0);
    let log = fs::read_to_string(&log_path).unwrap();
    assert!(log.contains("Done fixing async functions"));
}

#[test]
fn test_dry_run_leaves_files_alone() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "net.rs", NEEDS_ASYNC);

    let options = FixOptions { dry_run: true, ..FixOptions::default() };
    let stats = run(tmp.path(), options).unwrap();

    assert_eq!(read(tmp.path(), "net.rs"), NEEDS_ASYNC);
    assert!(stats.dry_run);
    assert_eq!(stats.functions_made_async, 1);
}

#[test]
fn test_unterminated_function_aborts_run() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "a_broken.rs", UNTERMINATED);
    write(tmp.path(), "b_net.rs", NEEDS_ASYNC);

    let err = run(tmp.path(), FixOptions::default()).unwrap_err();
    let msg = format!("{:#}", err);

    assert!(msg.contains("a_broken.rs"), "{msg}");
    assert!(msg.contains("starting at line 1"), "{msg}");
    assert_eq!(read(tmp.path(), "a_broken.rs"), UNTERMINATED);
    // Sorted order: the failing file comes first, so the sibling is never reached.
    assert_eq!(read(tmp.path(), "b_net.rs"), NEEDS_ASYNC);
}

#[test]
fn test_keep_going_processes_siblings() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "a_broken.rs", UNTERMINATED);
    write(tmp.path(), "b_net.rs", NEEDS_ASYNC);

    let options = FixOptions { keep_going: true, ..FixOptions::default() };
    let stats = run(tmp.path(), options).unwrap();

    assert_eq!(stats.files_scanned, 2);
    assert_eq!(stats.files_failed, 1);
    assert_eq!(read(tmp.path(), "a_broken.rs"), UNTERMINATED);
    assert_eq!(read(tmp.path(), "b_net.rs"), FIXED);
    assert!(check_failures(&stats).is_err());
}

#[test]
fn test_unreadable_file_is_read_error() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("bad.rs"), [0xff, 0xfe, 0x00, 0x80]).unwrap();

    let err = run(tmp.path(), FixOptions::default()).unwrap_err();
    let msg = format!("{:#}", err);
    assert!(msg.contains("Failed to read"), "{msg}");
    assert!(msg.contains("bad.rs"), "{msg}");
}

#[cfg(unix)]
#[test]
fn test_permissions_survive_rewrite() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "net.rs", NEEDS_ASYNC);
    let path = tmp.path().join("net.rs");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

    run(tmp.path(), FixOptions::default()).unwrap();

    let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o640);
    assert_eq!(read(tmp.path(), "net.rs"), FIXED);
}

#[cfg(unix)]
#[test]
fn test_symlinked_source_rewrites_target() {
    let tmp = TempDir::new().unwrap();
    let real = tmp.path().join("real");
    let scan = tmp.path().join("scan");
    fs::create_dir(&real).unwrap();
    fs::create_dir(&scan).unwrap();
    write(&real, "net.rs", NEEDS_ASYNC);
    std::os::unix::fs::symlink(real.join("net.rs"), scan.join("net.rs")).unwrap();

    let stats = run(&scan, FixOptions::default()).unwrap();

    assert_eq!(stats.functions_made_async, 1);
    assert_eq!(read(&real, "net.rs"), FIXED);
    let meta = fs::symlink_metadata(scan.join("net.rs")).unwrap();
    assert!(meta.file_type().is_symlink());
    assert_eq!(fs::read_dir(&scan).unwrap().count(), 1);
    assert_eq!(fs::read_dir(&real).unwrap().count(), 1);
}

#[cfg(unix)]
#[test]
fn test_unwritable_directory_is_write_error() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "net.rs", NEEDS_ASYNC);
    fs::set_permissions(tmp.path(), fs::Permissions::from_mode(0o555)).unwrap();

    // Permission bits do not stop root; nothing to check there.
    let check = tmp.path().join("check");
    if fs::write(&check, "").is_ok() {
        fs::remove_file(&check).unwrap();
        fs::set_permissions(tmp.path(), fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let result = run(tmp.path(), FixOptions::default());
    fs::set_permissions(tmp.path(), fs::Permissions::from_mode(0o755)).unwrap();

    let msg = format!("{:#}", result.unwrap_err());
    assert!(msg.contains("Failed to create temp file"), "{msg}");
    assert!(msg.contains("net.rs"), "{msg}");
    assert_eq!(read(tmp.path(), "net.rs"), NEEDS_ASYNC);
    assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 1);
}
