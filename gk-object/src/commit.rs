use crate::person::Field;
use crate::{Error, PersonIdent};
use gk_hash::ObjectId;

/// `{tree_id, parent_ids, author, committer, encoding?, message}` (spec §3).
/// Additional headers are preserved but not interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub tree_id: ObjectId,
    pub parent_ids: Vec<ObjectId>,
    pub author: PersonIdent,
    pub committer: PersonIdent,
    pub encoding: Option<String>,
    pub extra_headers: Vec<(String, String)>,
    pub message: Vec<u8>,
}

impl Commit {
    pub fn decode(body: &[u8]) -> Result<Self, Error> {
        let (header_block, message) = split_headers_and_body(body).ok_or(Error::InvalidCommit("missing blank line"))?;
        let headers = unfold_headers(header_block)?;

        let mut tree_id = None;
        let mut parent_ids = Vec::new();
        let mut author = None;
        let mut committer = None;
        let mut encoding = None;
        let mut extra_headers = Vec::new();

        for (key, value) in headers {
            match key.as_str() {
                "tree" => {
                    tree_id = Some(ObjectId::from_hex(&value).map_err(|_| Error::InvalidCommit("bad tree id"))?);
                }
                "parent" => {
                    parent_ids.push(ObjectId::from_hex(&value).map_err(|_| Error::InvalidParentIds)?);
                }
                "author" => {
                    author = Some(PersonIdent::parse(value.as_bytes(), Field::Author)?);
                }
                "committer" => {
                    committer = Some(PersonIdent::parse(value.as_bytes(), Field::Committer)?);
                }
                "encoding" => {
                    encoding = Some(value);
                }
                other => extra_headers.push((other.to_string(), value)),
            }
        }

        Ok(Commit {
            tree_id: tree_id.ok_or(Error::InvalidCommit("missing tree header"))?,
            parent_ids,
            author: author.ok_or(Error::InvalidCommit("missing author header"))?,
            committer: committer.ok_or(Error::InvalidCommit("missing committer header"))?,
            encoding,
            extra_headers,
            message: message.to_vec(),
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        push_header(&mut out, "tree", &self.tree_id.to_hex());
        for parent in &self.parent_ids {
            push_header(&mut out, "parent", &parent.to_hex());
        }
        push_header(&mut out, "author", &self.author.serialize());
        push_header(&mut out, "committer", &self.committer.serialize());
        if let Some(encoding) = &self.encoding {
            push_header(&mut out, "encoding", encoding);
        }
        for (key, value) in &self.extra_headers {
            push_header(&mut out, key, value);
        }
        out.push(b'\n');
        out.extend_from_slice(&self.message);
        out
    }
}

fn push_header(out: &mut Vec<u8>, key: &str, value: &str) {
    out.extend_from_slice(key.as_bytes());
    out.push(b' ');
    for (i, line) in value.split('\n').enumerate() {
        if i > 0 {
            out.push(b'\n');
            out.push(b' ');
        }
        out.extend_from_slice(line.as_bytes());
    }
    out.push(b'\n');
}

/// Splits `headers\n\nmessage` on the first blank line.
fn split_headers_and_body(body: &[u8]) -> Option<(&[u8], &[u8])> {
    let pos = find_blank_line(body)?;
    Some((&body[..pos], &body[pos + 1..]))
}

fn find_blank_line(body: &[u8]) -> Option<usize> {
    body.windows(2).position(|w| w == b"\n\n")
}

/// Joins continuation lines (leading space) back into their header's value.
fn unfold_headers(block: &[u8]) -> Result<Vec<(String, String)>, Error> {
    let text = std::str::from_utf8(block).map_err(|_| Error::InvalidCommit("headers not UTF-8"))?;
    let mut headers = Vec::new();
    for line in text.split('\n') {
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix(' ') {
            let (_, last_value) = headers.last_mut().ok_or(Error::InvalidCommit("continuation with no header"))?;
            let last_value: &mut String = last_value;
            last_value.push('\n');
            last_value.push_str(rest);
        } else {
            let space = line.find(' ').ok_or(Error::InvalidCommit("header missing value"))?;
            headers.push((line[..space].to_string(), line[space + 1..].to_string()));
        }
    }
    Ok(headers)
}
