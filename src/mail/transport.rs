use crate::domain::{Quota, RawMessage};
use crate::error::TransportError;
use crate::mail::headers::HeaderField;

/// Read-only view of a mail account. One command at a time.
pub trait MailTransport {
    /// Mailbox names, sorted.
    fn list_mailboxes(&mut self) -> Result<Vec<String>, TransportError>;

    /// Open `mailbox` read-only and return its message count.
    fn select_mailbox(&mut self, mailbox: &str) -> Result<u32, TransportError>;

    /// Header blocks of every message in `mailbox`, restricted to `fields`.
    /// Must not mark anything as seen.
    fn fetch_all_headers(
        &mut self,
        mailbox: &str,
        fields: &[HeaderField],
    ) -> Result<Vec<RawMessage>, TransportError>;

    /// Storage quota for `scope`, `None` when the server has none to report.
    fn quota(&mut self, scope: &str) -> Result<Option<Quota>, TransportError>;

    fn logout(&mut self) -> Result<(), TransportError>;
}
