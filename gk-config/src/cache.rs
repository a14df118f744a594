//! The racy-git file-observation cache (spec §4.7, §9 "Racy-git detection"):
//! a cache is safe to trust only if the gap between the last time we looked
//! and the file's mtime is at least the filesystem's timestamp resolution.
//! Below that gap (here: 3 seconds) a write could have landed in the same
//! tick we last observed, so we must re-read unconditionally.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

const RACY_WINDOW: Duration = Duration::from_secs(3);

pub struct FileCache<T> {
    path: PathBuf,
    last_check: Option<SystemTime>,
    last_mtime: Option<SystemTime>,
    cached: Option<T>,
}

impl<T> FileCache<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileCache {
            path: path.into(),
            last_check: None,
            last_mtime: None,
            cached: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the cached value, reparsing via `parse` when required: on
    /// first use, when mtime changed since the last check, or when the
    /// previous check happened within the racy window of the current mtime.
    pub fn get<E>(&mut self, parse: impl FnOnce(&str) -> Result<T, E>) -> Result<&T, E>
    where
        E: From<std::io::Error>,
    {
        let text = std::fs::read_to_string(&self.path)?;
        let mtime = std::fs::metadata(&self.path)?.modified()?;
        let now = SystemTime::now();

        let racy = match self.last_check {
            Some(last_check) => elapsed_abs(last_check, mtime) < RACY_WINDOW,
            None => true,
        };
        let mtime_changed = self.last_mtime != Some(mtime);

        if self.cached.is_none() || racy || mtime_changed {
            self.cached = Some(parse(&text)?);
        }
        self.last_check = Some(now);
        self.last_mtime = Some(mtime);
        Ok(self.cached.as_ref().expect("just populated if absent"))
    }

    /// Forces the next `get` to reparse, regardless of mtime (used right
    /// after this cache's own writer mutates the file).
    pub fn invalidate(&mut self) {
        self.last_check = None;
        self.last_mtime = None;
    }
}

fn elapsed_abs(a: SystemTime, b: SystemTime) -> Duration {
    a.duration_since(b).unwrap_or_else(|e| e.duration())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn first_get_always_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");
        fs::write(&path, "a").unwrap();
        let mut cache: FileCache<String> = FileCache::new(&path);
        let calls = AtomicU32::new(0);
        let value = cache
            .get::<std::io::Error>(|text| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(text.to_string())
            })
            .unwrap()
            .clone();
        assert_eq!(value, "a");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn within_racy_window_always_reparses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");
        fs::write(&path, "a").unwrap();
        let mut cache: FileCache<String> = FileCache::new(&path);
        let calls = AtomicU32::new(0);
        for _ in 0..3 {
            cache
                .get::<std::io::Error>(|text| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(text.to_string())
                })
                .unwrap();
        }
        // mtime is "now" every time in this fast test loop, so every
        // check falls inside the 3-second racy window.
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
