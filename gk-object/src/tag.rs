use crate::person::Field;
use crate::{Error, Kind, PersonIdent};
use gk_hash::ObjectId;

/// `{object_id, target_type, name, tagger?, message}` (spec §3/§4.8).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub object_id: ObjectId,
    pub target_type: Kind,
    pub name: Vec<u8>,
    pub tagger: Option<PersonIdent>,
    pub message: Vec<u8>,
}

impl Tag {
    pub fn decode(body: &[u8]) -> Result<Self, Error> {
        let pos = body.windows(2).position(|w| w == b"\n\n").ok_or(Error::InvalidTag("missing blank line"))?;
        let (header_block, message) = (&body[..pos], &body[pos + 2..]);
        let text = std::str::from_utf8(header_block).map_err(|_| Error::InvalidTag("headers not UTF-8"))?;

        let mut object_id = None;
        let mut target_type = None;
        let mut name = None;
        let mut tagger = None;

        for line in text.split('\n') {
            if line.is_empty() {
                continue;
            }
            let space = line.find(' ').ok_or(Error::InvalidTag("header missing value"))?;
            let (key, value) = (&line[..space], &line[space + 1..]);
            match key {
                "object" => {
                    object_id = Some(ObjectId::from_hex(value).map_err(|_| Error::InvalidTag("bad object id"))?);
                }
                "type" => {
                    target_type = Some(value.parse::<Kind>().map_err(|_| Error::InvalidTag("unknown target type"))?);
                }
                "tag" => name = Some(value.as_bytes().to_vec()),
                "tagger" => {
                    // Liberal parse: accept any line that contains <email>, even if
                    // otherwise malformed, per spec §4.8.
                    tagger = PersonIdent::parse(value.as_bytes(), Field::Tagger).ok();
                }
                _ => {}
            }
        }

        Ok(Tag {
            object_id: object_id.ok_or(Error::InvalidTag("missing object header"))?,
            target_type: target_type.ok_or(Error::InvalidTag("missing type header"))?,
            name: name.ok_or(Error::InvalidTag("missing tag header"))?,
            tagger,
            message: message.to_vec(),
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"object ");
        out.extend_from_slice(self.object_id.to_hex().as_bytes());
        out.push(b'\n');
        out.extend_from_slice(b"type ");
        out.extend_from_slice(self.target_type.as_str().as_bytes());
        out.push(b'\n');
        out.extend_from_slice(b"tag ");
        out.extend_from_slice(&self.name);
        out.push(b'\n');
        if let Some(tagger) = &self.tagger {
            out.extend_from_slice(b"tagger ");
            out.extend_from_slice(tagger.serialize().as_bytes());
            out.push(b'\n');
        }
        out.push(b'\n');
        out.extend_from_slice(&self.message);
        out
    }

    /// A tag is `valid?` only once a tagger is present with a non-empty name
    /// (spec §4.8 anomalous-tagger liberal-parse note).
    pub fn is_valid(&self) -> bool {
        self.tagger.as_ref().map(|t| t.has_non_empty_name()).unwrap_or(false)
    }
}
