//! Integration tests for archive creation and listing

use ferrozip_core::archive::EntryMethod;
use ferrozip_core::{create_archive, extract_archive, list_entries, Discard};
use ferrozip_core::{Error, ExtractOptions, PackOptions};
use ferrozip_testing::assertions::{assert_files_reproduced, collect_files};
use ferrozip_testing::fixtures::{
    compressible_text, create_project_structure, create_test_files, random_bytes,
};
use ferrozip_testing::helpers::{write_raw_archive, write_stored_archive, RawEntry};
use ferrozip_testing::TestDir;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tempfile::TempDir;

/// Where an absolute source path ends up after extraction under `root`
fn under(root: &Path, source: &Path) -> PathBuf {
    source
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .fold(root.to_path_buf(), |acc, c| acc.join(c))
}

fn recursive() -> PackOptions {
    PackOptions {
        recursive: true,
        ..Default::default()
    }
}

fn names(archive: &Path) -> Vec<String> {
    list_entries(archive)
        .unwrap()
        .into_iter()
        .map(|e| e.name)
        .collect()
}

#[test]
fn test_round_trip_reproduces_files() {
    let src = TestDir::new().unwrap();
    create_project_structure(&src).unwrap();
    let work = TempDir::new().unwrap();
    let archive = work.path().join("roundtrip.zip");
    let extract_dir = work.path().join("out");

    create_archive(&archive, &[src.path()], &recursive(), &mut Discard).unwrap();

    let options = ExtractOptions {
        output_dir: extract_dir.clone(),
        overwrite: true,
        ..Default::default()
    };
    extract_archive(&archive, &options, &mut Discard).unwrap();

    assert_files_reproduced(src.path(), &under(&extract_dir, src.path())).unwrap();
}

#[test]
fn test_every_level_round_trips() {
    let src = TestDir::new().unwrap();
    src.create_file("random.bin", &random_bytes(64 * 1024, 7))
        .unwrap();
    src.create_file("text.txt", &compressible_text(256 * 1024))
        .unwrap();
    src.create_file("empty.txt", b"").unwrap();

    for level in [-1, 0, 1, 5, 9] {
        let work = TempDir::new().unwrap();
        let archive = work.path().join("level.zip");
        let options = PackOptions {
            recursive: true,
            level,
            ..Default::default()
        };
        create_archive(&archive, &[src.path()], &options, &mut Discard).unwrap();

        let extract = ExtractOptions {
            output_dir: work.path().join("out"),
            ..Default::default()
        };
        extract_archive(&archive, &extract, &mut Discard).unwrap();

        assert_files_reproduced(src.path(), &under(&extract.output_dir, src.path()))
            .unwrap_or_else(|e| panic!("level {}: {}", level, e));
    }
}

#[test]
fn test_level_zero_stores_entries() {
    let src = TestDir::new().unwrap();
    let file = src
        .create_file("random.bin", &random_bytes(4096, 1))
        .unwrap();
    let archive = src.join("stored.zip");

    let options = PackOptions {
        level: 0,
        ..Default::default()
    };
    create_archive(&archive, &[&file], &options, &mut Discard).unwrap();

    let entries = list_entries(&archive).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].method, EntryMethod::Stored);
    assert_eq!(entries[0].compressed_size, entries[0].size);
    assert_eq!(entries[0].size, 4096);
}

#[test]
fn test_deflate_shrinks_compressible_content() {
    let src = TestDir::new().unwrap();
    let file = src
        .create_file("text.txt", &compressible_text(100_000))
        .unwrap();
    let archive = src.join("deflated.zip");

    let options = PackOptions {
        level: 9,
        ..Default::default()
    };
    create_archive(&archive, &[&file], &options, &mut Discard).unwrap();

    let entry = &list_entries(&archive).unwrap()[0];
    assert_eq!(entry.method, EntryMethod::Deflated);
    assert!(entry.compressed_size < entry.size / 10);
}

#[test]
fn test_out_of_range_level_uses_default() {
    let src = TestDir::new().unwrap();
    let file = src.create_file("hello.txt", b"hello world\n").unwrap();
    let archive = src.join("odd.zip");

    let options = PackOptions {
        level: 42,
        ..Default::default()
    };
    create_archive(&archive, &[&file], &options, &mut Discard).unwrap();

    assert_eq!(list_entries(&archive).unwrap()[0].method, EntryMethod::Deflated);
}

#[test]
fn test_non_recursive_skips_directory() {
    let src = TestDir::new().unwrap();
    create_test_files(&src).unwrap();
    let archive = src.join("nonrec.zip");

    let mut out = Vec::new();
    create_archive(
        &archive,
        &[src.join("sub"), src.join("hello.txt")],
        &PackOptions::default(),
        &mut out,
    )
    .unwrap();

    let output = String::from_utf8(out).unwrap();
    assert!(output.contains("(skipped, not recursive)"), "{}", output);

    let names = names(&archive);
    assert_eq!(names.len(), 1);
    assert!(names[0].ends_with("/hello.txt"));
    assert!(names.iter().all(|n| !n.contains("nested")));
}

#[test]
fn test_recursive_walks_in_name_order() {
    let src = TestDir::new().unwrap();
    create_test_files(&src).unwrap();
    let work = TempDir::new().unwrap();
    let archive = work.path().join("recursive.zip");

    create_archive(&archive, &[src.path()], &recursive(), &mut Discard).unwrap();

    let names = names(&archive);
    let suffixes: Vec<&str> = names
        .iter()
        .map(|n| n.rsplit_once(src.path().file_name().unwrap().to_str().unwrap()).unwrap().1)
        .collect();
    assert_eq!(suffixes, vec!["/foo.go", "/hello.txt", "/sub/nested.txt"]);
}

#[test]
fn test_directories_are_not_entries() {
    let src = TestDir::new().unwrap();
    create_test_files(&src).unwrap();
    src.create_dir("empty").unwrap();
    let work = TempDir::new().unwrap();
    let archive = work.path().join("dirs.zip");

    create_archive(&archive, &[src.path()], &recursive(), &mut Discard).unwrap();

    let entries = list_entries(&archive).unwrap();
    assert_eq!(entries.len(), 3);
    assert!(entries.iter().all(|e| !e.is_dir));
    assert!(entries.iter().all(|e| !e.name.ends_with("/empty")));
}

#[test]
fn test_exclude_patterns_skip_files() {
    let src = TestDir::new().unwrap();
    create_test_files(&src).unwrap();
    let work = TempDir::new().unwrap();
    let archive = work.path().join("exclude.zip");

    let options = PackOptions {
        recursive: true,
        exclude: vec!["*.go".to_string()],
        ..Default::default()
    };
    create_archive(&archive, &[src.path()], &options, &mut Discard).unwrap();

    let names = names(&archive);
    assert_eq!(names.len(), 2);
    assert!(names.iter().all(|n| !n.ends_with(".go")));
}

#[test]
fn test_excluded_directory_prunes_subtree() {
    let src = TestDir::new().unwrap();
    create_project_structure(&src).unwrap();
    let work = TempDir::new().unwrap();
    let archive = work.path().join("project.zip");

    let options = PackOptions {
        recursive: true,
        exclude: vec![".git".to_string(), "*.o".to_string()],
        ..Default::default()
    };
    create_archive(&archive, &[src.path()], &options, &mut Discard).unwrap();

    let names = names(&archive);
    assert!(names.iter().all(|n| !n.contains("/.git/")));
    assert!(names.iter().all(|n| !n.ends_with("utils.o")));
    assert!(names.iter().any(|n| n.ends_with("/src/lib/mod.rs")));
    assert!(names.iter().any(|n| n.ends_with("/src/main.rs")));
}

#[test]
fn test_excluded_walk_root_yields_nothing() {
    let src = TestDir::new().unwrap();
    let project = src.create_dir("project").unwrap();
    src.create_file("project/a.txt", b"a").unwrap();
    let archive = src.join("root.zip");

    let options = PackOptions {
        recursive: true,
        exclude: vec!["proj*".to_string()],
        ..Default::default()
    };
    create_archive(&archive, &[&project], &options, &mut Discard).unwrap();

    assert!(list_entries(&archive).unwrap().is_empty());
}

#[test]
fn test_excluded_file_source_skipped_silently() {
    let src = TestDir::new().unwrap();
    let go = src.create_file("foo.go", b"package foo\n").unwrap();
    let txt = src.create_file("hello.txt", b"hello\n").unwrap();
    let archive = src.join("files.zip");

    let options = PackOptions {
        exclude: vec!["*.go".to_string()],
        ..Default::default()
    };
    let mut out = Vec::new();
    create_archive(&archive, &[&go, &txt], &options, &mut out).unwrap();

    let output = String::from_utf8(out).unwrap();
    assert_eq!(output.lines().count(), 1);
    assert!(!output.contains("foo.go"));
    assert_eq!(names(&archive).len(), 1);
}

#[test]
fn test_status_line_per_entry() {
    let src = TestDir::new().unwrap();
    create_test_files(&src).unwrap();
    let work = TempDir::new().unwrap();
    let archive = work.path().join("status.zip");

    let mut out = Vec::new();
    create_archive(&archive, &[src.path()], &recursive(), &mut out).unwrap();

    let output = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines.iter().all(|l| l.starts_with("  adding: ")));
    assert!(lines[2].ends_with("/sub/nested.txt"));
}

#[test]
fn test_same_source_twice_is_stored_twice() {
    let src = TestDir::new().unwrap();
    let file = src.create_file("twice.txt", b"twice\n").unwrap();
    let archive = src.join("twice.zip");

    let mut out = Vec::new();
    create_archive(&archive, &[&file, &file], &PackOptions::default(), &mut out).unwrap();

    let names = names(&archive);
    assert_eq!(names.len(), 2);
    assert_eq!(names[0], names[1]);
    let output = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], lines[1]);

    let dest = TempDir::new().unwrap();
    let options = ExtractOptions {
        output_dir: dest.path().to_path_buf(),
        ..Default::default()
    };
    let err = extract_archive(&archive, &options, &mut Discard).unwrap_err();
    assert!(matches!(err, Error::FileExists(_)), "{:?}", err);

    let options = ExtractOptions {
        overwrite: true,
        ..options
    };
    extract_archive(&archive, &options, &mut Discard).unwrap();
    assert_eq!(fs::read(under(dest.path(), &file)).unwrap(), b"twice\n");
}

#[test]
fn test_nonexistent_source_fails() {
    let work = TempDir::new().unwrap();
    let archive = work.path().join("bad.zip");
    let missing = work.path().join("nonexistent/file.txt");

    let err = create_archive(&archive, &[&missing], &PackOptions::default(), &mut Discard)
        .unwrap_err();
    match err {
        Error::NotFound(path) => assert_eq!(path, missing),
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[test]
fn test_missing_source_stops_processing() {
    let src = TestDir::new().unwrap();
    let a = src.create_file("a.txt", b"a").unwrap();
    let b = src.create_file("b.txt", b"b").unwrap();
    let archive = src.join("partial.zip");

    let mut out = Vec::new();
    let result = create_archive(
        &archive,
        &[a.clone(), src.join("missing.txt"), b],
        &PackOptions::default(),
        &mut out,
    );

    assert!(result.is_err());
    let output = String::from_utf8(out).unwrap();
    assert!(output.contains("a.txt"));
    assert!(!output.contains("b.txt"));
}

#[test]
#[cfg(unix)]
fn test_permissions_and_mtime_recorded() {
    use std::os::unix::fs::PermissionsExt;

    let src = TestDir::new().unwrap();
    let script = src.create_file("run.sh", b"#!/bin/sh\n").unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    let archive = src.join("meta.zip");

    create_archive(&archive, &[&script], &PackOptions::default(), &mut Discard).unwrap();

    let entry = &list_entries(&archive).unwrap()[0];
    assert_eq!(entry.mode.map(|m| m & 0o777), Some(0o755));
    assert!(entry.modified.is_some());
}

#[test]
fn test_list_reports_directories_in_order() {
    let work = TempDir::new().unwrap();
    let archive = work.path().join("dirs.zip");
    write_raw_archive(
        &archive,
        &[
            RawEntry::dir("docs/"),
            RawEntry::file("docs/guide.md", b"# Guide\n"),
            RawEntry::file("README", b"readme"),
        ],
    )
    .unwrap();

    let entries = list_entries(&archive).unwrap();
    let summary: Vec<(&str, bool)> = entries
        .iter()
        .map(|e| (e.name.as_str(), e.is_dir))
        .collect();
    assert_eq!(
        summary,
        vec![("docs/", true), ("docs/guide.md", false), ("README", false)]
    );
    assert_eq!(entries[1].size, 8);
}

#[test]
fn test_list_keeps_repeated_names() {
    let work = TempDir::new().unwrap();
    let archive = work.path().join("repeated.zip");
    write_stored_archive(
        &archive,
        &[("x.txt", &b"first"[..]), ("y.txt", &b"middle"[..]), ("x.txt", &b"second!"[..])],
    )
    .unwrap();

    let entries = list_entries(&archive).unwrap();
    let summary: Vec<(&str, u64)> = entries.iter().map(|e| (e.name.as_str(), e.size)).collect();
    assert_eq!(summary, vec![("x.txt", 5), ("y.txt", 6), ("x.txt", 7)]);
    assert!(entries.iter().all(|e| e.method == EntryMethod::Stored));
}

#[test]
fn test_list_writes_nothing() {
    let work = TempDir::new().unwrap();
    let archive = work.path().join("listed.zip");
    write_raw_archive(
        &archive,
        &[RawEntry::dir("a/"), RawEntry::file("a/b.txt", b"b")],
    )
    .unwrap();

    let before = collect_files(work.path()).unwrap();
    list_entries(&archive).unwrap();
    let after = collect_files(work.path()).unwrap();

    assert_eq!(before, after);
    assert!(!work.path().join("a").exists());
}

#[test]
fn test_list_nonexistent_archive() {
    let err = list_entries("/nonexistent/file.zip").unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn test_list_invalid_archive() {
    let work = TempDir::new().unwrap();
    let bad = work.path().join("notazip.zip");
    fs::write(&bad, b"this is not a zip").unwrap();

    let err = list_entries(&bad).unwrap_err();
    assert!(matches!(err, Error::InvalidArchive { .. }), "{:?}", err);
}
