//! The dir-cache/index codec (spec §4.4) and tree conversion.

mod codec;
mod entry;
mod error;
mod tree_convert;

pub use entry::{Entry, Stage};
pub use error::Error;

use std::cmp::Ordering;

pub const MAX_ENTRIES: usize = 100_000;
pub const VERSION: u32 = 2;

/// `{version=2, entries, entry_count}` (spec §3). Entries are sorted by
/// `(name ascending, stage ascending)`; no two entries share `(name, stage)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirCache {
    entries: Vec<Entry>,
}

impl DirCache {
    pub fn empty() -> Self {
        DirCache { entries: Vec::new() }
    }

    pub fn from_sorted_entries(entries: Vec<Entry>) -> Result<Self, Error> {
        let cache = DirCache { entries };
        cache.validate()?;
        Ok(cache)
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_fully_merged(&self) -> bool {
        self.entries.iter().all(|e| e.stage() == Stage::Normal)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, Error> {
        codec::decode(bytes)
    }

    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        self.validate()?;
        Ok(codec::encode(self))
    }

    fn validate(&self) -> Result<(), Error> {
        if self.entries.len() > MAX_ENTRIES {
            return Err(Error::TooManyEntries(self.entries.len()));
        }
        for w in self.entries.windows(2) {
            let order = compare_entries(&w[0], &w[1]);
            if order != Ordering::Less {
                return Err(Error::NotSorted);
            }
        }
        for entry in &self.entries {
            if entry.object_id.is_null() {
                return Err(Error::InvalidEntry("object id is all-zero"));
            }
            if entry.name.is_empty() {
                return Err(Error::InvalidEntry("empty name"));
            }
        }
        Ok(())
    }

    /// Merges `new_entries` into this cache, replacing any existing entry
    /// that shares `(name, stage)`, then re-sorts (spec §4.4 `add`).
    pub fn add(&mut self, new_entries: impl IntoIterator<Item = Entry>) {
        for incoming in new_entries {
            self.entries.retain(|e| !(e.name == incoming.name && e.stage() == incoming.stage()));
            self.entries.push(incoming);
        }
        self.entries.sort_by(compare_entries);
    }

    /// Removes entries matching `paths`; each target is `(name, stage_or_all)`
    /// where `stage` of `None` means the `:all` sentinel (spec §4.4 `remove`).
    pub fn remove(&mut self, paths: &[(Vec<u8>, Option<Stage>)]) {
        self.entries.retain(|e| {
            !paths.iter().any(|(name, stage)| {
                e.name == *name
                    && match stage {
                        Some(s) => e.stage() == *s,
                        None => true,
                    }
            })
        });
    }
}

fn compare_entries(a: &Entry, b: &Entry) -> Ordering {
    a.name.cmp(&b.name).then_with(|| (a.stage() as u8).cmp(&(b.stage() as u8)))
}

pub use tree_convert::{from_tree, to_tree, ToTreeOutcome};
