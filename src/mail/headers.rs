//! Splitting of fetched header blocks into [`HeaderRecord`]s.
//!
//! Grammar of a header block, one field per logical line:
//!
//! ```text
//! field  = name ":" value CRLF *( WSP continuation CRLF )
//! name   = 1*( %x21-39 / %x3B-7E )   ; printable ASCII except ":"
//! ```
//!
//! A line starting with a space or tab continues the previous field. The
//! first empty line ends the block. When a field occurs more than once the
//! first occurrence wins.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use log::{debug, warn};
use regex::Regex;

use crate::domain::{HeaderRecord, RawMessage};
use crate::error::HeaderError;
use crate::mail::decoders::{decode_header, unfold};

static FIELD_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([\x21-\x39\x3B-\x7E]+):(.*)$").unwrap());

/// The header fields requested from the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderField {
    MessageId,
    From,
    Sender,
    Subject,
    References,
}

impl HeaderField {
    pub const ALL: [HeaderField; 5] = [
        HeaderField::MessageId,
        HeaderField::From,
        HeaderField::Sender,
        HeaderField::Subject,
        HeaderField::References,
    ];

    pub fn name(self) -> &'static str {
        match self {
            HeaderField::MessageId => "Message-ID",
            HeaderField::From => "From",
            HeaderField::Sender => "Sender",
            HeaderField::Subject => "Subject",
            HeaderField::References => "References",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for HeaderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parenthesised field list for `BODY.PEEK[HEADER.FIELDS (...)]`.
pub fn fields_query(fields: &[HeaderField]) -> String {
    let names: Vec<String> = fields.iter().map(|f| f.name().to_uppercase()).collect();
    format!("({})", names.join(" "))
}

/// Parse one fetched header block.
///
/// From, Subject and Sender are decoded; a value whose decoding fails is
/// kept raw (unfolded) and a warning is logged.
pub fn extract(raw: &RawMessage) -> Result<HeaderRecord, HeaderError> {
    let fields = split_fields(&String::from_utf8_lossy(raw.as_bytes()))?;
    let value = |field: HeaderField| fields.get(&field).map(String::as_str);

    let from = value(HeaderField::From)
        .map(|v| decode_or_raw(HeaderField::From, v))
        .unwrap_or_default();
    let subject = value(HeaderField::Subject)
        .map(|v| decode_or_raw(HeaderField::Subject, v))
        .unwrap_or_default();
    let sender = value(HeaderField::Sender)
        .map(|v| decode_or_raw(HeaderField::Sender, v))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| from.clone());

    let message_id = value(HeaderField::MessageId)
        .map(unfold)
        .filter(|s| !s.is_empty());
    let references = value(HeaderField::References)
        .map(|v| v.split_whitespace().map(str::to_string).collect::<Vec<_>>())
        .filter(|refs| !refs.is_empty());

    Ok(HeaderRecord {
        subject,
        from,
        sender,
        message_id,
        references,
    })
}

fn split_fields(text: &str) -> Result<HashMap<HeaderField, String>, HeaderError> {
    let mut fields: HashMap<HeaderField, String> = HashMap::new();
    // (field, is first occurrence)
    let mut current: Option<(HeaderField, bool)> = None;

    for line in text.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l)) {
        if line.is_empty() {
            break;
        }

        if line.starts_with([' ', '\t']) {
            match current {
                Some((field, true)) => {
                    if let Some(v) = fields.get_mut(&field) {
                        v.push('\n');
                        v.push_str(line);
                    }
                }
                Some((_, false)) => {}
                None => debug!("ignoring continuation line before any field"),
            }
            continue;
        }

        let Some(caps) = FIELD_START.captures(line) else {
            warn!("ignoring malformed header line {line:?}");
            current = None;
            continue;
        };
        let name = &caps[1];
        let field = HeaderField::parse(name).ok_or_else(|| HeaderError::UnknownHeader {
            name: name.to_string(),
        })?;
        let first = !fields.contains_key(&field);
        if first {
            fields.insert(field, caps[2].to_string());
        }
        current = Some((field, first));
    }

    Ok(fields)
}

fn decode_or_raw(field: HeaderField, value: &str) -> String {
    match decode_header(value) {
        Ok(decoded) => decoded,
        Err(e) => {
            warn!("keeping {field} header undecoded: {e}");
            unfold(value)
        }
    }
}
