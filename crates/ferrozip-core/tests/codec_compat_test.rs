//! Archives written by create_archive, read back with the zip crate

use ferrozip_core::{create_archive, Discard, PackOptions};
use ferrozip_testing::fixtures::{compressible_text, create_test_files};
use ferrozip_testing::TestDir;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use zip::{CompressionMethod, ZipArchive};

fn open(path: &Path) -> ZipArchive<File> {
    ZipArchive::new(File::open(path).unwrap()).unwrap()
}

fn contents(archive: &mut ZipArchive<File>, index: usize) -> Vec<u8> {
    let mut data = Vec::new();
    archive.by_index(index).unwrap().read_to_end(&mut data).unwrap();
    data
}

#[test]
fn test_deflated_tree_reads_back() {
    let src = TestDir::new().unwrap();
    create_test_files(&src).unwrap();
    let work = TestDir::new().unwrap();
    let archive = work.join("tree.zip");
    let options = PackOptions {
        recursive: true,
        level: 9,
        ..Default::default()
    };

    create_archive(&archive, &[src.path()], &options, &mut Discard).unwrap();

    let mut zip = open(&archive);
    let ours = ferrozip_core::list_entries(&archive).unwrap();
    assert_eq!(zip.len(), 3);
    assert_eq!(zip.len(), ours.len());

    for (i, entry) in ours.iter().enumerate() {
        let file = zip.by_index(i).unwrap();
        assert_eq!(file.name(), entry.name);
        assert_eq!(file.compression(), CompressionMethod::Deflated);
        assert_eq!(file.size(), entry.size);
        drop(file);

        // Walked names are the absolute source paths
        let expected = fs::read(Path::new(&entry.name)).unwrap();
        assert_eq!(contents(&mut zip, i), expected);
    }
}

#[test]
fn test_stored_entry_reads_back() {
    let src = TestDir::new().unwrap();
    let text = compressible_text(50_000);
    let file = src.create_file("big.txt", &text).unwrap();
    let archive = src.join("stored.zip");
    let options = PackOptions {
        level: 0,
        ..Default::default()
    };

    create_archive(&archive, &[&file], &options, &mut Discard).unwrap();

    let mut zip = open(&archive);
    let entry = zip.by_index(0).unwrap();
    assert_eq!(entry.compression(), CompressionMethod::Stored);
    assert_eq!(entry.compressed_size(), text.len() as u64);
    drop(entry);
    assert_eq!(contents(&mut zip, 0), text);
}

#[test]
#[cfg(unix)]
fn test_mode_and_time_read_back() {
    use std::os::unix::fs::PermissionsExt;

    let src = TestDir::new().unwrap();
    let script = src.create_file("run.sh", b"#!/bin/sh\n").unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o750)).unwrap();
    let archive = src.join("meta.zip");

    create_archive(&archive, &[&script], &PackOptions::default(), &mut Discard).unwrap();

    let mut zip = open(&archive);
    let entry = zip.by_index(0).unwrap();
    assert_eq!(entry.unix_mode().map(|m| m & 0o777), Some(0o750));
    assert!(entry.last_modified().is_some_and(|t| t.year() >= 2020));
}
