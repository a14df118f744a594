//! Shared test helpers, factored out so each crate's test suite doesn't
//! reimplement `hex_to_id`/`fixture_path` (the pattern is already visible in
//! the teacher's `git-odb/tests/compound/mod.rs`, which calls both).

use gk_hash::ObjectId;
use std::path::{Path, PathBuf};

pub fn hex_to_id(hex: &str) -> ObjectId {
    ObjectId::from_hex(hex).expect("valid test fixture hex id")
}

/// Resolves a path under a crate's `tests/fixtures/` directory. Callers pass
/// their own `env!("CARGO_MANIFEST_DIR")` since that macro expands at the
/// call site, not inside this crate.
pub fn fixture_path(manifest_dir: impl AsRef<Path>, name: impl AsRef<Path>) -> PathBuf {
    manifest_dir.as_ref().join("tests/fixtures").join(name)
}

/// A scratch directory that is removed on drop, for tests that need a real
/// `.git`-shaped tree on disk.
pub fn scratch_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("can create a temp dir")
}
