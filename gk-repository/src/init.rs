//! On-disk repository initialization (spec §6): the `.git` directory layout,
//! initial `HEAD`, and initial `config`.

use crate::Error;
use std::fs;
use std::path::Path;

pub const INITIAL_HEAD: &str = "ref: refs/heads/master\n";

const INITIAL_CONFIG: &str = "[core]\n\
    \trepositoryformatversion = 0\n\
    \tfilemode = true\n\
    \tbare = false\n\
    \tlogallrefupdates = true\n";

/// Creates `.git/{HEAD, config, description, branches/, hooks/, info/exclude,
/// objects/{info,pack}/, refs/{heads,tags}/}` under `git_dir` (spec §6).
/// Idempotent: re-running against an already-initialized `git_dir` leaves
/// existing files untouched (`HEAD`/`config` are written only if absent).
pub fn layout(git_dir: &Path) -> Result<(), Error> {
    for dir in [
        "branches",
        "hooks",
        "info",
        "objects/info",
        "objects/pack",
        "refs/heads",
        "refs/tags",
    ] {
        fs::create_dir_all(git_dir.join(dir))?;
    }

    write_if_absent(&git_dir.join("HEAD"), INITIAL_HEAD)?;
    write_if_absent(&git_dir.join("config"), INITIAL_CONFIG)?;
    write_if_absent(&git_dir.join("description"), "Unnamed repository\n")?;
    write_if_absent(&git_dir.join("info/exclude"), "")?;

    Ok(())
}

fn write_if_absent(path: &Path, content: &str) -> Result<(), Error> {
    match fs::OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(mut file) => {
            use std::io::Write as _;
            file.write_all(content.as_bytes())?;
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gk_testtools::scratch_dir;

    #[test]
    fn creates_expected_tree_and_head() {
        let dir = scratch_dir();
        let git_dir = dir.path().join(".git");
        layout(&git_dir).unwrap();

        assert!(git_dir.join("refs/heads").is_dir());
        assert!(git_dir.join("refs/tags").is_dir());
        assert!(git_dir.join("objects/pack").is_dir());
        assert_eq!(fs::read_to_string(git_dir.join("HEAD")).unwrap(), INITIAL_HEAD);
        assert!(fs::read_to_string(git_dir.join("config")).unwrap().contains("repositoryformatversion = 0"));
    }

    #[test]
    fn is_idempotent() {
        let dir = scratch_dir();
        let git_dir = dir.path().join(".git");
        layout(&git_dir).unwrap();
        fs::write(git_dir.join("HEAD"), "ref: refs/heads/custom\n").unwrap();
        layout(&git_dir).unwrap();
        assert_eq!(fs::read_to_string(git_dir.join("HEAD")).unwrap(), "ref: refs/heads/custom\n");
    }
}
