pub mod aggregator;
pub mod ranking;
pub mod report;

use log::{debug, info, warn};

use crate::domain::{Quota, StatsResult};
use crate::error::{StatsError, TransportError};
use crate::mail::headers::{self, HeaderField};
use crate::mail::transport::MailTransport;

use self::aggregator::{Aggregator, SubjectFilter};

#[derive(Debug, Clone)]
pub struct StatsQuery {
    pub mailboxes: Vec<String>,
    /// Regex the whole (reply-marker stripped) subject must match.
    pub subject_filter: String,
    /// How many threads and senders to report.
    pub top: usize,
}

impl StatsQuery {
    pub fn validate(&self) -> Result<SubjectFilter, StatsError> {
        if self.top == 0 {
            return Err(StatsError::Validation("top must be at least 1".into()));
        }
        SubjectFilter::new(&self.subject_filter).map_err(|e| {
            StatsError::Validation(format!("bad subject filter {:?}: {e}", self.subject_filter))
        })
    }
}

/// Thread and sender statistics over one read-only mail session.
pub struct EmailStats<T: MailTransport> {
    transport: T,
}

impl<T: MailTransport> EmailStats<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn compute_stats(&mut self, query: &StatsQuery) -> Result<StatsResult, StatsError> {
        let filter = query.validate()?;
        let mut aggregator = Aggregator::new(filter);

        for mailbox in &query.mailboxes {
            let count = self.transport.select_mailbox(mailbox)?;
            info!("scanning {mailbox} ({count} messages)");
            for raw in self
                .transport
                .fetch_all_headers(mailbox, &HeaderField::ALL)?
            {
                let record = headers::extract(&raw)?;
                let admission = aggregator.push(&record);
                debug!("{:?}: {admission:?}", record.message_id);
            }
        }

        info!("{} messages counted", aggregator.total());
        Ok(ranking::rank(&aggregator, query.top))
    }

    pub fn list_mailboxes(&mut self) -> Result<Vec<String>, TransportError> {
        self.transport.list_mailboxes()
    }

    pub fn mailbox_count(&mut self, mailbox: &str) -> Result<u32, TransportError> {
        self.transport.select_mailbox(mailbox)
    }

    /// Every mailbox with its message count. A mailbox the server refuses to
    /// open (`\Noselect` containers and the like) is listed without a count.
    pub fn mailbox_counts(&mut self) -> Result<Vec<(String, Option<u32>)>, TransportError> {
        let mut out = Vec::new();
        for name in self.list_mailboxes()? {
            let count = match self.transport.select_mailbox(&name) {
                Ok(count) => Some(count),
                Err(TransportError::Imap(imap::Error::No(msg))) => {
                    warn!("cannot open {name}: {msg}");
                    None
                }
                Err(e) => return Err(e),
            };
            out.push((name, count));
        }
        Ok(out)
    }

    pub fn mailbox_quota(&mut self, mailbox: &str) -> Result<Option<Quota>, TransportError> {
        self.transport.select_mailbox(mailbox)?;
        self.transport.quota(mailbox)
    }

    pub fn logout(mut self) -> Result<(), TransportError> {
        self.transport.logout()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}
