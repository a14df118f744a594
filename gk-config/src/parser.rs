//! The git-config grammar (spec §4.7): physical-line continuation folding,
//! section headers, variable assignments, quoted value segments.

use crate::Error;

/// One `(section, subsection?, name, value)` record, as returned by
/// [`ConfigFile::get_entries`] or accepted by [`ConfigFile::add_entries`].
/// `section` and `name` are compared case-insensitively but stored as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub section: String,
    pub subsection: Option<String>,
    pub name: String,
    pub value: String,
}

/// A filter for [`ConfigFile::get_entries`]; `None` fields match anything.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub section: Option<String>,
    pub subsection: Option<String>,
    pub name: Option<String>,
}

/// Mutation mode for [`ConfigFile::add_entries`]. `add` and `replace_all`
/// are mutually exclusive (a caller contract violation, not a runtime error
/// — spec §7 "programmer misuse ... may abort").
#[derive(Debug, Clone, Copy, Default)]
pub struct AddOptions {
    pub add: bool,
    pub replace_all: bool,
}

#[derive(Debug, Clone)]
enum Line {
    /// Blank lines, comment-only lines, and anything we didn't need to
    /// understand structurally — preserved verbatim for the unrelated-lines
    /// requirement.
    Other(String),
    Section {
        section: String,
        subsection: Option<String>,
        raw: String,
    },
    Variable {
        section: String,
        subsection: Option<String>,
        name: String,
        value: String,
        raw: String,
    },
}

/// A parsed config file: an ordered list of lines, re-emitted verbatim
/// except where [`ConfigFile::add_entries`] rewrote them.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    lines: Vec<Line>,
}

impl ConfigFile {
    pub fn parse(text: &str) -> Result<Self, Error> {
        let mut lines = Vec::new();
        let mut current_section: Option<(String, Option<String>)> = None;

        for logical in fold_continuations(text) {
            let trimmed = logical.trim_start();
            if trimmed.is_empty() || trimmed.starts_with(';') || trimmed.starts_with('#') {
                lines.push(Line::Other(logical));
                continue;
            }
            if trimmed.starts_with('[') {
                let (section, subsection) = parse_section_header(trimmed)?;
                current_section = Some((section.clone(), subsection.clone()));
                lines.push(Line::Section {
                    section,
                    subsection,
                    raw: logical,
                });
                continue;
            }
            let (section, subsection) = current_section
                .clone()
                .ok_or(Error::MissingSectionHeader)?;
            let (name, value) = parse_variable(trimmed)?;
            lines.push(Line::Variable {
                section,
                subsection,
                name,
                value,
                raw: logical,
            });
        }

        Ok(ConfigFile { lines })
    }

    pub fn get_entries(&self, query: &Query) -> Vec<Entry> {
        self.lines
            .iter()
            .filter_map(|line| match line {
                Line::Variable {
                    section,
                    subsection,
                    name,
                    value,
                    ..
                } if matches(query, section, subsection, name) => Some(Entry {
                    section: section.clone(),
                    subsection: subsection.clone(),
                    name: name.clone(),
                    value: value.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    /// Mutates in place per spec §4.7. `add` appends without removing any
    /// existing occurrence; `replace_all` removes every existing occurrence
    /// and emits one; the default (neither flag) replaces exactly one
    /// existing occurrence, failing `replacing_multivar` if more than one
    /// matches.
    pub fn add_entries(&mut self, entries: &[Entry], opts: AddOptions) -> Result<(), Error> {
        assert!(
            !(opts.add && opts.replace_all),
            "add and replace_all are mutually exclusive"
        );

        for entry in entries {
            let matching: Vec<usize> = self
                .lines
                .iter()
                .enumerate()
                .filter_map(|(i, line)| match line {
                    Line::Variable {
                        section,
                        subsection,
                        name,
                        ..
                    } if same_section(section, subsection, &entry.section, &entry.subsection)
                        && name.eq_ignore_ascii_case(&entry.name) =>
                    {
                        Some(i)
                    }
                    _ => None,
                })
                .collect();

            if opts.add {
                self.insert_variable(entry);
            } else if opts.replace_all {
                for &i in matching.iter().rev() {
                    self.lines.remove(i);
                }
                self.insert_variable(entry);
            } else {
                match matching.len() {
                    0 => self.insert_variable(entry),
                    1 => self.replace_variable(matching[0], entry),
                    _ => return Err(Error::ReplacingMultivar),
                }
            }
        }
        Ok(())
    }

    fn replace_variable(&mut self, index: usize, entry: &Entry) {
        self.lines[index] = Line::Variable {
            section: entry.section.clone(),
            subsection: entry.subsection.clone(),
            name: entry.name.clone(),
            value: entry.value.clone(),
            raw: format_variable_line(&entry.name, &entry.value),
        };
    }

    /// Inserts `entry` after the last existing variable of its section, or
    /// creates the section (appended at the end of the file) if absent.
    fn insert_variable(&mut self, entry: &Entry) {
        let new_line = Line::Variable {
            section: entry.section.clone(),
            subsection: entry.subsection.clone(),
            name: entry.name.clone(),
            value: entry.value.clone(),
            raw: format_variable_line(&entry.name, &entry.value),
        };

        let last_var_in_section = self.lines.iter().rposition(|line| match line {
            Line::Variable { section, subsection, .. } => {
                same_section(section, subsection, &entry.section, &entry.subsection)
            }
            _ => false,
        });

        if let Some(pos) = last_var_in_section {
            self.lines.insert(pos + 1, new_line);
            return;
        }

        let section_exists = self.lines.iter().any(|line| match line {
            Line::Section { section, subsection, .. } => {
                same_section(section, subsection, &entry.section, &entry.subsection)
            }
            _ => false,
        });

        if section_exists {
            let header_pos = self
                .lines
                .iter()
                .rposition(|line| match line {
                    Line::Section { section, subsection, .. } => {
                        same_section(section, subsection, &entry.section, &entry.subsection)
                    }
                    _ => false,
                })
                .expect("checked above");
            self.lines.insert(header_pos + 1, new_line);
        } else {
            self.lines.push(Line::Section {
                section: entry.section.clone(),
                subsection: entry.subsection.clone(),
                raw: format_section_line(&entry.section, entry.subsection.as_deref()),
            });
            self.lines.push(new_line);
        }
    }

    /// Re-serializes the file. Lines untouched by `add_entries` are emitted
    /// byte-for-byte from their original text (spec §8: "parse+emit+parse is
    /// fixed-point for files that contain no updates").
    pub fn emit(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            let raw = match line {
                Line::Other(raw) => raw,
                Line::Section { raw, .. } => raw,
                Line::Variable { raw, .. } => raw,
            };
            out.push_str(raw);
            out.push('\n');
        }
        out
    }
}

fn matches(query: &Query, section: &str, subsection: &Option<String>, name: &str) -> bool {
    if let Some(q) = &query.section {
        if !section.eq_ignore_ascii_case(q) {
            return false;
        }
        // A section query without a subsection matches only the
        // unqualified section (spec §4.7).
        if query.subsection.is_none() && subsection.is_some() {
            return false;
        }
    }
    if let Some(q) = &query.subsection {
        if subsection.as_deref() != Some(q.as_str()) {
            return false;
        }
    }
    if let Some(q) = &query.name {
        if !name.eq_ignore_ascii_case(q) {
            return false;
        }
    }
    true
}

fn same_section(a_section: &str, a_sub: &Option<String>, b_section: &str, b_sub: &Option<String>) -> bool {
    a_section.eq_ignore_ascii_case(b_section) && a_sub.as_deref() == b_sub.as_deref()
}

fn format_variable_line(name: &str, value: &str) -> String {
    format!("\t{name} = {value}")
}

fn format_section_line(section: &str, subsection: Option<&str>) -> String {
    match subsection {
        Some(sub) => format!("[{section} \"{}\"]", escape_subsection(sub)),
        None => format!("[{section}]"),
    }
}

fn escape_subsection(sub: &str) -> String {
    sub.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Joins physical lines where a line ends in an odd number of trailing
/// backslashes into one logical line, removing the final backslash and
/// inserting a literal newline in its place (spec §4.7).
fn fold_continuations(text: &str) -> Vec<String> {
    let physical: Vec<&str> = text.lines().collect();
    let mut logical = Vec::new();
    let mut i = 0;
    while i < physical.len() {
        let mut current = physical[i].to_string();
        while trailing_backslash_count(&current) % 2 == 1 {
            current.pop();
            i += 1;
            if i >= physical.len() {
                break;
            }
            current.push('\n');
            current.push_str(physical[i]);
        }
        logical.push(current);
        i += 1;
    }
    logical
}

fn trailing_backslash_count(s: &str) -> usize {
    s.chars().rev().take_while(|&c| c == '\\').count()
}

fn parse_section_header(trimmed: &str) -> Result<(String, Option<String>), Error> {
    let rest = trimmed
        .strip_prefix('[')
        .ok_or(Error::InvalidFormat("section header missing '['"))?;
    let name_end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '.'))
        .unwrap_or(rest.len());
    let name = &rest[..name_end];
    if name.is_empty() {
        return Err(Error::InvalidFormat("empty section name"));
    }
    let after_name = rest[name_end..].trim_start();

    if let Some(closed) = after_name.strip_prefix(']') {
        let _ = closed;
        return Ok((name.to_ascii_lowercase(), None));
    }

    let quoted = after_name
        .strip_prefix('"')
        .ok_or(Error::InvalidFormat("expected subsection or ']'"))?;
    let mut out = String::new();
    let mut chars = quoted.chars();
    loop {
        match chars.next() {
            Some('\\') => match chars.next() {
                Some('\\') => out.push('\\'),
                Some('"') => out.push('"'),
                Some(other) => return Err(Error::UnknownEscapeSequence(other)),
                None => return Err(Error::InvalidFormat("unterminated escape in subsection")),
            },
            Some('"') => break,
            Some(c) => out.push(c),
            None => return Err(Error::InvalidFormat("unterminated subsection string")),
        }
    }
    let remainder = chars.as_str().trim_start();
    if !remainder.starts_with(']') {
        return Err(Error::InvalidFormat("expected ']' after subsection"));
    }
    Ok((name.to_ascii_lowercase(), Some(out)))
}

fn parse_variable(trimmed: &str) -> Result<(String, String), Error> {
    let name_end = trimmed
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
        .unwrap_or(trimmed.len());
    let name = &trimmed[..name_end];
    if name.is_empty() || !name.chars().next().unwrap().is_ascii_alphabetic() {
        return Err(Error::InvalidFormat("variable name must start with a letter"));
    }
    let rest = trimmed[name_end..].trim_start();
    let value = match rest.strip_prefix('=') {
        Some(after_eq) => parse_value(after_eq)?,
        None if rest.is_empty() || rest.starts_with(';') || rest.starts_with('#') => "true".to_string(),
        None => return Err(Error::InvalidFormat("expected '=' after variable name")),
    };
    Ok((name.to_string(), value))
}

/// Parses a value: strips an unquoted trailing comment, trims outer
/// whitespace, then resolves quoted segments and escapes.
fn parse_value(raw: &str) -> Result<String, Error> {
    let without_comment = strip_unquoted_comment(raw);
    let trimmed = without_comment.trim();

    let mut out = String::new();
    let mut in_quotes = false;
    let mut chars = trimmed.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => in_quotes = !in_quotes,
            '\\' => match chars.next() {
                Some('\\') => out.push('\\'),
                Some('"') => out.push('"'),
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('b') => out.push('\u{8}'),
                Some(other) => return Err(Error::UnknownEscapeSequence(other)),
                None => return Err(Error::InvalidFormat("trailing backslash in value")),
            },
            c => out.push(c),
        }
    }
    Ok(out)
}

fn strip_unquoted_comment(s: &str) -> &str {
    let mut in_quotes = false;
    let mut chars = s.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => in_quotes = !in_quotes,
            '\\' => {
                chars.next();
            }
            ';' | '#' if !in_quotes => return &s[..i],
            _ => {}
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_section_and_variable() {
        let cfg = ConfigFile::parse("[core]\n\trepositoryformatversion = 0\n").unwrap();
        let entries = cfg.get_entries(&Query::default());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].section, "core");
        assert_eq!(entries[0].name, "repositoryformatversion");
        assert_eq!(entries[0].value, "0");
    }

    #[test]
    fn bare_name_is_boolean_true() {
        let cfg = ConfigFile::parse("[core]\n\tbare\n").unwrap();
        let entries = cfg.get_entries(&Query::default());
        assert_eq!(entries[0].value, "true");
    }

    #[test]
    fn quoted_value_preserves_whitespace_and_escapes() {
        let cfg = ConfigFile::parse("[user]\n\tname = \"  A\\tB  \"\n").unwrap();
        let entries = cfg.get_entries(&Query::default());
        assert_eq!(entries[0].value, "  A\tB  ");
    }

    #[test]
    fn unknown_escape_is_an_error() {
        let result = ConfigFile::parse("[user]\n\tname = \"\\q\"\n");
        assert!(matches!(result, Err(Error::UnknownEscapeSequence('q'))));
    }

    #[test]
    fn variable_without_section_header_errors() {
        let result = ConfigFile::parse("name = value\n");
        assert!(matches!(result, Err(Error::MissingSectionHeader)));
    }

    #[test]
    fn section_query_without_subsection_excludes_subsections() {
        let cfg = ConfigFile::parse("[remote \"origin\"]\n\turl = x\n[remote]\n\tpushdefault = origin\n").unwrap();
        let entries = cfg.get_entries(&Query {
            section: Some("remote".to_string()),
            subsection: None,
            name: None,
        });
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "pushdefault");
    }

    #[test]
    fn continuation_line_folds_into_value() {
        let cfg = ConfigFile::parse("[user]\n\tname = a\\\nb\n").unwrap();
        let entries = cfg.get_entries(&Query::default());
        assert_eq!(entries[0].value, "a\nb");
    }

    #[test]
    fn add_entries_default_replaces_single_occurrence() {
        let mut cfg = ConfigFile::parse("[core]\n\tbare = false\n").unwrap();
        cfg.add_entries(
            &[Entry {
                section: "core".to_string(),
                subsection: None,
                name: "bare".to_string(),
                value: "true".to_string(),
            }],
            AddOptions::default(),
        )
        .unwrap();
        let entries = cfg.get_entries(&Query::default());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].value, "true");
    }

    #[test]
    fn add_entries_default_fails_on_multivar() {
        let mut cfg = ConfigFile::parse("[remote \"origin\"]\n\tfetch = a\n\tfetch = b\n").unwrap();
        let result = cfg.add_entries(
            &[Entry {
                section: "remote".to_string(),
                subsection: Some("origin".to_string()),
                name: "fetch".to_string(),
                value: "c".to_string(),
            }],
            AddOptions::default(),
        );
        assert!(matches!(result, Err(Error::ReplacingMultivar)));
    }

    #[test]
    fn add_entries_with_add_flag_appends() {
        let mut cfg = ConfigFile::parse("[remote \"origin\"]\n\tfetch = a\n").unwrap();
        cfg.add_entries(
            &[Entry {
                section: "remote".to_string(),
                subsection: Some("origin".to_string()),
                name: "fetch".to_string(),
                value: "b".to_string(),
            }],
            AddOptions { add: true, replace_all: false },
        )
        .unwrap();
        let entries = cfg.get_entries(&Query::default());
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn add_entries_with_replace_all_removes_all_then_adds_one() {
        let mut cfg = ConfigFile::parse("[remote \"origin\"]\n\tfetch = a\n\tfetch = b\n").unwrap();
        cfg.add_entries(
            &[Entry {
                section: "remote".to_string(),
                subsection: Some("origin".to_string()),
                name: "fetch".to_string(),
                value: "c".to_string(),
            }],
            AddOptions { add: false, replace_all: true },
        )
        .unwrap();
        let entries = cfg.get_entries(&Query::default());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].value, "c");
    }

    #[test]
    fn add_entries_creates_section_when_absent() {
        let mut cfg = ConfigFile::parse("[core]\n\tbare = false\n").unwrap();
        cfg.add_entries(
            &[Entry {
                section: "user".to_string(),
                subsection: None,
                name: "name".to_string(),
                value: "A U Thor".to_string(),
            }],
            AddOptions::default(),
        )
        .unwrap();
        let entries = cfg.get_entries(&Query {
            section: Some("user".to_string()),
            subsection: None,
            name: None,
        });
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn parse_emit_parse_is_fixed_point_with_no_updates() {
        let original = "[core]\n\trepositoryformatversion = 0\n\tfilemode = true\n\tbare = false\n";
        let cfg = ConfigFile::parse(original).unwrap();
        let emitted = cfg.emit();
        assert_eq!(emitted, original);
        let reparsed = ConfigFile::parse(&emitted).unwrap();
        assert_eq!(reparsed.get_entries(&Query::default()), cfg.get_entries(&Query::default()));
    }
}
