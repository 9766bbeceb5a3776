/// One message's selected header fields, exactly as the transport returned them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    bytes: Vec<u8>,
}

impl RawMessage {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<&str> for RawMessage {
    fn from(s: &str) -> Self {
        Self::new(s.as_bytes())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderRecord {
    pub subject: String,
    pub from: String,
    /// Falls back to `from` when the message carries no Sender header.
    pub sender: String,
    pub message_id: Option<String>,
    pub references: Option<Vec<String>>,
}

impl HeaderRecord {
    /// Root message id of the conversation: the first References entry,
    /// otherwise the message's own id.
    pub fn thread_root(&self) -> Option<&str> {
        self.references
            .as_ref()
            .and_then(|refs| refs.first())
            .or(self.message_id.as_ref())
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_root_prefers_first_reference() {
        let rec = HeaderRecord {
            message_id: Some("<c@x>".into()),
            references: Some(vec!["<a@x>".into(), "<b@x>".into()]),
            ..Default::default()
        };
        assert_eq!(rec.thread_root(), Some("<a@x>"));
    }

    #[test]
    fn thread_root_falls_back_to_message_id() {
        let rec = HeaderRecord {
            message_id: Some("<d@x>".into()),
            ..Default::default()
        };
        assert_eq!(rec.thread_root(), Some("<d@x>"));
        assert_eq!(HeaderRecord::default().thread_root(), None);
    }
}
