use crate::Error;

/// `{name, email, when, tz_offset}`, serialized as `Name <email> <epoch> ±HHMM`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonIdent {
    pub name: String,
    pub email: String,
    pub when: i64,
    /// Minutes east of UTC (negative for west).
    pub tz_offset: i32,
}

impl PersonIdent {
    pub fn new(name: impl Into<String>, email: impl Into<String>, when: i64, tz_offset: i32) -> Self {
        PersonIdent {
            name: name.into(),
            email: email.into(),
            when,
            tz_offset,
        }
    }

    pub fn serialize(&self) -> String {
        let sign = if self.tz_offset < 0 { '-' } else { '+' };
        let abs = self.tz_offset.unsigned_abs();
        format!(
            "{} <{}> {} {}{:02}{:02}",
            self.name,
            self.email,
            self.when,
            sign,
            abs / 60,
            abs % 60
        )
    }

    /// Parses `Name <email> epoch ±HHMM`. Liberal: an anomalous line that
    /// still contains a bracketed email is accepted (spec §4.8, "tagger"
    /// liberal parse note applies equally to author/committer).
    pub fn parse(line: &[u8], field: Field) -> Result<Self, Error> {
        let line = std::str::from_utf8(line).map_err(|_| invalid(field, "not valid UTF-8"))?;
        let open = line.find('<').ok_or_else(|| invalid(field, "missing '<'"))?;
        let close = line[open..].find('>').map(|i| i + open).ok_or_else(|| invalid(field, "missing '>'"))?;
        let name = line[..open].trim_end().to_string();
        let email = line[open + 1..close].to_string();
        let rest = line[close + 1..].trim();
        let mut parts = rest.split_whitespace();
        let when: i64 = parts
            .next()
            .ok_or_else(|| invalid(field, "missing timestamp"))?
            .parse()
            .map_err(|_| invalid(field, "timestamp not an integer"))?;
        let tz = parts.next().ok_or_else(|| invalid(field, "missing timezone"))?;
        let tz_offset = parse_tz_offset(tz).ok_or_else(|| invalid(field, "malformed timezone"))?;
        Ok(PersonIdent {
            name,
            email,
            when,
            tz_offset,
        })
    }

    /// Whether this identity is acceptable as the final name on a tag
    /// (spec §4.8: "names must be non-empty for the tag itself to be valid").
    pub fn has_non_empty_name(&self) -> bool {
        !self.name.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Field {
    Author,
    Committer,
    Tagger,
}

fn invalid(field: Field, why: &'static str) -> Error {
    match field {
        Field::Author => Error::InvalidAuthor(why),
        Field::Committer => Error::InvalidCommitter(why),
        Field::Tagger => Error::InvalidTag(why),
    }
}

fn parse_tz_offset(raw: &str) -> Option<i32> {
    let (sign, digits) = match raw.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, raw.strip_prefix('+').unwrap_or(raw)),
    };
    if digits.len() != 4 {
        return None;
    }
    let hours: i32 = digits[0..2].parse().ok()?;
    let minutes: i32 = digits[2..4].parse().ok()?;
    Some(sign * (hours * 60 + minutes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let pi = PersonIdent::new("A U Thor", "author@example.com", 1_142_878_501, -420);
        let line = pi.serialize();
        assert_eq!(line, "A U Thor <author@example.com> 1142878501 -0700");
        let parsed = PersonIdent::parse(line.as_bytes(), Field::Author).unwrap();
        assert_eq!(parsed, pi);
    }

    #[test]
    fn positive_offset() {
        let pi = PersonIdent::new("A", "a@b.c", 0, 330);
        assert_eq!(pi.serialize(), "A <a@b.c> 0 +0530");
    }

    #[test]
    fn missing_angle_bracket_errors() {
        assert!(PersonIdent::parse(b"no email here", Field::Author).is_err());
    }
}
