//! `compare` and `compare_same_name` (spec §4.9): lexicographic byte compare
//! where each path is conceptually extended with `/` if its mode is a tree,
//! `\0` otherwise, with a gitlink-vs-tree special case.

use std::cmp::Ordering;

/// File mode bits as found in tree entries and dir-cache entries.
const MODE_TREE: u32 = 0o040000;
const MODE_GITLINK: u32 = 0o160000;

fn is_tree(mode: u32) -> bool {
    mode == MODE_TREE
}

fn extension_byte(mode: u32) -> u8 {
    if is_tree(mode) {
        b'/'
    } else {
        0
    }
}

/// Compares two entries the way git orders tree entries: byte-wise, with
/// each name conceptually suffixed by `/` when its mode is a tree (so `"a"`
/// as a tree sorts after `"a-b"` as a blob, matching git's "trees sort as if
/// name/" rule). A gitlink (submodule, mode 160000) compares equal to a tree
/// at the same name, since from a naming perspective both occupy a directory
/// slot.
pub fn compare(path1: &[u8], mode1: u32, path2: &[u8], mode2: u32) -> Ordering {
    let common_len = path1.len().min(path2.len());
    match path1[..common_len].cmp(&path2[..common_len]) {
        Ordering::Equal => {}
        other => return other,
    }
    match path1.len().cmp(&path2.len()) {
        Ordering::Equal => tie_break_on_mode(mode1, mode2),
        other @ (Ordering::Less | Ordering::Greater) => {
            // One name is a prefix of the other; the shorter one's
            // extension byte (`/` for a tree, NUL otherwise) decides.
            let (shorter_mode, shorter_is_path1) = if path1.len() < path2.len() {
                (mode1, true)
            } else {
                (mode2, false)
            };
            let longer = if shorter_is_path1 { path2 } else { path1 };
            let next_byte_of_longer = longer[common_len];
            let ext = extension_byte(shorter_mode);
            let ordering = ext.cmp(&next_byte_of_longer);
            if shorter_is_path1 {
                ordering
            } else {
                ordering.reverse()
            }
        }
    }
}

fn tie_break_on_mode(mode1: u32, mode2: u32) -> Ordering {
    if gitlink_matches_tree(mode1, mode2) {
        return Ordering::Equal;
    }
    extension_byte(mode1).cmp(&extension_byte(mode2))
}

fn gitlink_matches_tree(mode1: u32, mode2: u32) -> bool {
    (mode1 == MODE_GITLINK && is_tree(mode2)) || (is_tree(mode1) && mode2 == MODE_GITLINK)
}

/// The form used when inserting an entry into an already-sorted list: `path1`
/// is always treated as a tree for the tie-break, since the caller is asking
/// "where would this directory prefix go".
pub fn compare_same_name(path1: &[u8], path2: &[u8], mode2: u32) -> Ordering {
    compare(path1, MODE_TREE, path2, mode2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_sorts_after_dash_suffixed_blob() {
        // "a-b" (blob) < "a" (tree), because "a" extends to "a/" and '/' (0x2f) > '-' (0x2d)
        assert_eq!(compare(b"a-b", 0o100644, b"a", MODE_TREE), Ordering::Less);
    }

    #[test]
    fn blob_sorts_before_tree_of_same_prefix() {
        // "a" (blob) vs "a" (tree): blob's extension is NUL, tree's is '/', NUL < '/'
        assert_eq!(compare(b"a", 0o100644, b"a", MODE_TREE), Ordering::Less);
    }

    #[test]
    fn gitlink_equals_tree_at_same_name() {
        assert_eq!(compare(b"sub", MODE_GITLINK, b"sub", MODE_TREE), Ordering::Equal);
    }

    #[test]
    fn single_byte_tree_path_compares_equal_to_plain_name() {
        assert_eq!(compare(b"a", MODE_TREE, b"a", MODE_TREE), Ordering::Equal);
    }

    #[test]
    fn compare_same_name_treats_left_as_tree() {
        assert_eq!(
            compare_same_name(b"a", b"a-b", 0o100644),
            compare(b"a", MODE_TREE, b"a-b", 0o100644)
        );
    }
}
