use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::LazyLock;

use log::{debug, info, warn};
use native_tls::{TlsConnector, TlsStream};
use regex::Regex;

use crate::domain::{Quota, RawMessage};
use crate::error::TransportError;
use crate::mail::headers::{HeaderField, fields_query};
use crate::mail::transport::MailTransport;

static STORAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(STORAGE (\d+) (\d+)\)").unwrap());

pub const IMAPS_PORT: u16 = 993;
pub const IMAP_PORT: u16 = 143;

/// [`MailTransport`] over a logged-in `imap` session.
pub struct ImapTransport<T: Read + Write> {
    session: imap::Session<T>,
    /// Examined mailbox and its message count.
    selected: Option<(String, u32)>,
}

impl ImapTransport<TlsStream<TcpStream>> {
    pub fn connect_tls(
        server: &str,
        port: u16,
        user: &str,
        password: &str,
    ) -> Result<Self, TransportError> {
        info!("connecting to {server}:{port} (TLS)");
        let tls = TlsConnector::builder().build()?;
        let client = imap::connect((server, port), server, &tls)?;
        Self::login(client, user, password)
    }
}

impl ImapTransport<TcpStream> {
    pub fn connect_plain(
        server: &str,
        port: u16,
        user: &str,
        password: &str,
    ) -> Result<Self, TransportError> {
        info!("connecting to {server}:{port} (plain)");
        let stream = TcpStream::connect((server, port))?;
        let mut client = imap::Client::new(stream);
        client.read_greeting()?;
        Self::login(client, user, password)
    }
}

impl<T: Read + Write> ImapTransport<T> {
    fn login(client: imap::Client<T>, user: &str, password: &str) -> Result<Self, TransportError> {
        match client.login(user, password) {
            Ok(session) => {
                info!("logged in as {user}");
                Ok(Self {
                    session,
                    selected: None,
                })
            }
            // the unauthenticated connection is dropped with the client
            Err((e, _client)) => Err(e.into()),
        }
    }

    fn ensure_selected(&mut self, mailbox: &str) -> Result<u32, TransportError> {
        match &self.selected {
            Some((name, exists)) if name == mailbox => Ok(*exists),
            _ => self.select_mailbox(mailbox),
        }
    }

    /// One response line, CRLF stripped, straight off the connection.
    ///
    /// The imap parser has no grammar for some extension responses (QUOTA
    /// among them) and gives up on the first such line, leaving the rest of
    /// the answer unread. `read_greeting` is the only public way to take a
    /// single raw line through the session's buffer; its flag only guards
    /// against reading the greeting twice.
    fn read_raw_line(&mut self) -> Result<String, TransportError> {
        self.session.greeting_read = false;
        let line = self.session.read_greeting()?;
        Ok(String::from_utf8_lossy(&line).trim_end().to_string())
    }

    /// Send `command` and collect the untagged lines up to its tagged
    /// completion, which is returned separately.
    fn run_raw_command(&mut self, command: &str) -> Result<(Vec<String>, String), TransportError> {
        self.session.run_command(command)?;
        let mut untagged = Vec::new();
        loop {
            let line = self.read_raw_line()?;
            if line.starts_with('*') {
                untagged.push(line);
            } else {
                return Ok((untagged, line));
            }
        }
    }
}

impl<T: Read + Write> MailTransport for ImapTransport<T> {
    fn list_mailboxes(&mut self) -> Result<Vec<String>, TransportError> {
        let names = self.session.list(Some(""), Some("*"))?;
        let mut boxes: Vec<String> = names.iter().map(|n| n.name().to_string()).collect();
        boxes.sort();
        Ok(boxes)
    }

    fn select_mailbox(&mut self, mailbox: &str) -> Result<u32, TransportError> {
        // EXAMINE keeps the mailbox read-only
        let mb = self.session.examine(mailbox)?;
        self.selected = Some((mailbox.to_string(), mb.exists));
        debug!("{mailbox} has {} messages", mb.exists);
        Ok(mb.exists)
    }

    fn fetch_all_headers(
        &mut self,
        mailbox: &str,
        fields: &[HeaderField],
    ) -> Result<Vec<RawMessage>, TransportError> {
        if self.ensure_selected(mailbox)? == 0 {
            return Ok(vec![]);
        }

        // PEEK leaves \Seen alone
        let query = format!("(UID BODY.PEEK[HEADER.FIELDS {}])", fields_query(fields));
        let fetches = self.session.fetch("1:*", query)?;
        let out: Vec<RawMessage> = fetches
            .iter()
            .filter_map(|f| f.header().or_else(|| f.body()))
            .map(RawMessage::new)
            .collect();

        info!("fetched {} header blocks from {mailbox}", out.len());
        Ok(out)
    }

    fn quota(&mut self, scope: &str) -> Result<Option<Quota>, TransportError> {
        if !self.session.capabilities()?.has_str("QUOTA") {
            info!("server does not advertise QUOTA");
            return Ok(None);
        }

        let (untagged, done) = self.run_raw_command(&format!("GETQUOTAROOT {}", quote(scope)))?;
        match done.split_whitespace().nth(1) {
            Some(status) if status.eq_ignore_ascii_case("OK") => {
                let quota = untagged.iter().find_map(|line| parse_quota(line));
                if quota.is_none() {
                    warn!("no STORAGE quota in answer for {scope}");
                }
                Ok(quota)
            }
            Some(status) if status.eq_ignore_ascii_case("NO") || status.eq_ignore_ascii_case("BAD") => {
                info!("quota unavailable for {scope}: {done}");
                Ok(None)
            }
            _ => Err(imap::Error::Parse(imap::error::ParseError::Invalid(done.into_bytes())).into()),
        }
    }

    fn logout(&mut self) -> Result<(), TransportError> {
        if self.selected.take().is_some() {
            self.session.close()?;
        }
        self.session.logout()?;
        Ok(())
    }
}

/// First `(STORAGE used total)` triple of a quota response.
pub fn parse_quota(response: &str) -> Option<Quota> {
    let caps = STORAGE.captures(response)?;
    Some(Quota {
        used: caps[1].parse().ok()?,
        total: caps[2].parse().ok()?,
    })
}

/// IMAP quoted string.
fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}
