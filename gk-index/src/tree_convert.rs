//! `to_tree`/`from_tree` (spec §4.4): converting between the flat, sorted
//! dir-cache representation and the nested tree-object representation.

use crate::{DirCache, Entry, Error, Stage};
use gk_hash::ObjectId;
use gk_object::{mode, Tree, TreeEntry};
use gk_odb::Find;
use std::collections::BTreeMap;

pub struct ToTreeOutcome {
    /// Every tree object produced, keyed by its path from the root (empty
    /// for the root tree itself), in no particular write order.
    pub trees: Vec<(Vec<u8>, Tree, ObjectId)>,
    pub root_id: ObjectId,
}

/// Walks the sorted entries, grouping by directory prefix, recursively
/// emitting a `Tree` object per directory encountered (spec §4.4).
pub fn to_tree(cache: &DirCache, prefix: Option<&[u8]>) -> Result<ToTreeOutcome, Error> {
    if !cache.is_fully_merged() {
        return Err(Error::IncompleteMerge);
    }
    let items = cache
        .entries()
        .iter()
        .map(|e| (e.name.clone(), e.mode, e.object_id))
        .collect();

    let mut trees = Vec::new();
    let root_id = build_level(items, &[], &mut trees);

    let root_id = match prefix {
        None | Some([]) => root_id,
        Some(p) => {
            trees
                .iter()
                .find(|(path, _, _)| path.as_slice() == p)
                .map(|(_, _, id)| *id)
                .ok_or(Error::PrefixNotFound)?
        }
    };

    Ok(ToTreeOutcome { trees, root_id })
}

fn build_level(
    items: Vec<(Vec<u8>, u32, ObjectId)>,
    path_prefix: &[u8],
    out: &mut Vec<(Vec<u8>, Tree, ObjectId)>,
) -> ObjectId {
    let mut direct = Vec::new();
    let mut subdirs: BTreeMap<Vec<u8>, Vec<(Vec<u8>, u32, ObjectId)>> = BTreeMap::new();

    for (name, entry_mode, object_id) in items {
        match name.iter().position(|&b| b == b'/') {
            Some(slash) => {
                let dir = name[..slash].to_vec();
                let rest = name[slash + 1..].to_vec();
                subdirs.entry(dir).or_default().push((rest, entry_mode, object_id));
            }
            None => direct.push(TreeEntry {
                name,
                mode: entry_mode,
                object_id,
            }),
        }
    }

    for (dir_name, sub_items) in subdirs {
        let mut child_prefix = path_prefix.to_vec();
        if !child_prefix.is_empty() {
            child_prefix.push(b'/');
        }
        child_prefix.extend_from_slice(&dir_name);
        let sub_id = build_level(sub_items, &child_prefix, out);
        direct.push(TreeEntry {
            name: dir_name,
            mode: mode::TREE,
            object_id: sub_id,
        });
    }

    let tree = Tree::new(direct);
    let body = tree.encode();
    let id = ObjectId::compute_from_data("tree", &body);
    out.push((path_prefix.to_vec(), tree, id));
    id
}

/// The inverse of `to_tree`: recursively walks tree objects, emitting
/// flat-prefixed stage-0 dir-cache entries.
pub fn from_tree<D: Find>(db: &D, root_id: ObjectId) -> Result<DirCache, Error> {
    let mut entries = Vec::new();
    walk(db, root_id, &[], &mut entries)?;
    DirCache::from_sorted_entries(entries)
}


fn walk<D: Find>(db: &D, tree_id: ObjectId, prefix: &[u8], out: &mut Vec<Entry>) -> Result<(), Error> {
    let object = db.get(tree_id.as_oid()).map_err(|_| Error::ObjectsMissing)?;
    let tree = Tree::decode(object.bytes())?;
    for entry in tree.entries {
        let mut full_name = prefix.to_vec();
        if !full_name.is_empty() {
            full_name.push(b'/');
        }
        full_name.extend_from_slice(&entry.name);

        if entry.mode == mode::TREE {
            walk(db, entry.object_id, &full_name, out)?;
        } else {
            out.push(Entry::new(full_name, entry.mode, entry.object_id, Stage::Normal));
        }
    }
    Ok(())
}
