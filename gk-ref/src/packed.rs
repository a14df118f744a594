//! A read-only `packed-refs` file parser, folded into [`crate::LooseRefStore`]
//! lookups with loose-ref precedence (spec §4.5, §9 Open Questions: we fold
//! packed-refs in at the loose-ref-store layer rather than as a separate
//! [`crate::Backend`], since a ref store has exactly one on-disk shape per
//! repository).
//!
//! Format: one `{sha1} {refname}` line per ref, an optional leading
//! `# pack-refs with: peeled` header comment, and an optional `^{sha1}`
//! line right after an annotated tag's entry giving its peeled commit id.

use crate::Target;
use gk_hash::ObjectId;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct PackedRefs {
    entries: BTreeMap<String, Target>,
    peeled: BTreeMap<String, ObjectId>,
}

impl PackedRefs {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn parse(content: &str) -> Result<Self, ParseError> {
        let mut entries = BTreeMap::new();
        let mut peeled = BTreeMap::new();
        let mut last_name: Option<String> = None;

        for line in content.lines() {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some(rest) = line.strip_prefix('^') {
                let id = ObjectId::from_hex(rest).map_err(|_| ParseError)?;
                let name = last_name.as_ref().ok_or(ParseError)?;
                peeled.insert(name.clone(), id);
                continue;
            }
            let mut parts = line.splitn(2, ' ');
            let hex = parts.next().ok_or(ParseError)?;
            let name = parts.next().ok_or(ParseError)?;
            let id = ObjectId::from_hex(hex).map_err(|_| ParseError)?;
            entries.insert(name.to_string(), Target::Object(id));
            last_name = Some(name.to_string());
        }

        Ok(PackedRefs { entries, peeled })
    }

    pub fn get(&self, name: &str) -> Option<&Target> {
        self.entries.get(name)
    }

    pub fn peeled(&self, name: &str) -> Option<&ObjectId> {
        self.peeled.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

#[derive(Debug)]
pub struct ParseError;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_header_and_entries() {
        let content = "# pack-refs with: peeled fully-peeled sorted\n\
                        d670460b4b4aece5915caf5c68d12f560a9fe3e4 refs/heads/main\n";
        let packed = PackedRefs::parse(content).unwrap();
        assert_eq!(packed.names().collect::<Vec<_>>(), vec!["refs/heads/main"]);
        assert!(matches!(packed.get("refs/heads/main"), Some(Target::Object(_))));
    }

    #[test]
    fn parses_peeled_tag_line() {
        let content = "d670460b4b4aece5915caf5c68d12f560a9fe3e4 refs/tags/v1\n\
                        ^0123456789abcdef0123456789abcdef01234567\n";
        let packed = PackedRefs::parse(content).unwrap();
        assert!(packed.peeled("refs/tags/v1").is_some());
    }

    #[test]
    fn empty_file_parses_to_no_entries() {
        let packed = PackedRefs::parse("").unwrap();
        assert_eq!(packed.names().count(), 0);
    }

    #[test]
    fn peeled_line_without_preceding_ref_is_an_error() {
        assert!(PackedRefs::parse("^0123456789abcdef0123456789abcdef01234567\n").is_err());
    }
}
