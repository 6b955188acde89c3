//! Common test fixtures for ferrozip testing

use crate::TestDir;
use anyhow::Result;
use rand::{RngCore, SeedableRng};

/// Creates the small tree most tests start from:
///
/// ```text
/// hello.txt        "hello world\n"
/// foo.go           "package foo\n"
/// sub/nested.txt   "nested content\n"
/// ```
pub fn create_test_files(test_dir: &TestDir) -> Result<()> {
    test_dir.create_file("hello.txt", b"hello world\n")?;
    test_dir.create_file("foo.go", b"package foo\n")?;
    test_dir.create_dir("sub")?;
    test_dir.create_file("sub/nested.txt", b"nested content\n")?;
    Ok(())
}

/// Creates a deeper tree with build artifacts and a VCS directory, for
/// exclusion tests
pub fn create_project_structure(test_dir: &TestDir) -> Result<()> {
    create_test_files(test_dir)?;

    test_dir.create_file("README.md", b"# Test Project\n")?;
    test_dir.create_file("src/main.rs", b"fn main() {}\n")?;
    test_dir.create_file("src/lib/mod.rs", b"pub mod utils;\n")?;
    test_dir.create_file("src/lib/utils.o", &[0x7f, b'E', b'L', b'F'])?;
    test_dir.create_file(".git/HEAD", b"ref: refs/heads/main\n")?;
    test_dir.create_file(".git/objects/ab/cdef", b"blob")?;

    Ok(())
}

/// Deterministic incompressible bytes
pub fn random_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let mut data = vec![0u8; len];
    rng.fill_bytes(&mut data);
    data
}

/// Highly compressible text of roughly `len` bytes
pub fn compressible_text(len: usize) -> Vec<u8> {
    let pattern = b"Lorem ipsum dolor sit amet, consectetur adipiscing elit. ";
    pattern.iter().copied().cycle().take(len).collect()
}
