use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use crate::domain::HeaderRecord;

static REPLY_MARKERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:(?:re|fwd):\s*)+").unwrap());

/// Drop any run of leading `Re:` / `Fwd:` markers.
pub fn strip_reply_markers(subject: &str) -> &str {
    match REPLY_MARKERS.find(subject) {
        Some(m) => &subject[m.end()..],
        None => subject,
    }
}

/// Full-string subject match. The empty pattern accepts everything.
#[derive(Debug, Clone, Default)]
pub struct SubjectFilter(Option<Regex>);

impl SubjectFilter {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        if pattern.is_empty() {
            return Ok(Self(None));
        }
        Regex::new(&format!("^(?:{pattern})$")).map(|re| Self(Some(re)))
    }

    pub fn matches(&self, subject: &str) -> bool {
        self.0.as_ref().is_none_or(|re| re.is_match(subject))
    }
}

/// A thread or sender bucket: its key, the distinct variants seen and
/// how many messages landed in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub id: String,
    pub variants: BTreeSet<String>,
    pub count: usize,
}

/// Groups kept in first-seen order.
#[derive(Debug, Default)]
pub(crate) struct GroupMap {
    groups: Vec<Group>,
    index: HashMap<String, usize>,
}

impl GroupMap {
    fn record(&mut self, id: &str, variant: &str) {
        let idx = match self.index.get(id) {
            Some(&idx) => idx,
            None => {
                self.groups.push(Group {
                    id: id.to_string(),
                    variants: BTreeSet::new(),
                    count: 0,
                });
                self.index.insert(id.to_string(), self.groups.len() - 1);
                self.groups.len() - 1
            }
        };
        let group = &mut self.groups[idx];
        group.count += 1;
        if !group.variants.contains(variant) {
            group.variants.insert(variant.to_string());
        }
    }

    pub(crate) fn as_slice(&self) -> &[Group] {
        &self.groups
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accepted,
    MissingFrom,
    Filtered,
}

/// Per-query thread and sender counters.
#[derive(Debug, Default)]
pub struct Aggregator {
    filter: SubjectFilter,
    threads: GroupMap,
    senders: GroupMap,
    seen: usize,
    total: usize,
}

impl Aggregator {
    pub fn new(filter: SubjectFilter) -> Self {
        Self {
            filter,
            ..Default::default()
        }
    }

    /// Count one message, unless it has no From or its subject is filtered out.
    pub fn push(&mut self, record: &HeaderRecord) -> Admission {
        self.seen += 1;

        if record.from.is_empty() {
            debug!("skipping message #{} without From", self.seen);
            return Admission::MissingFrom;
        }

        let subject = strip_reply_markers(&record.subject);
        if !self.filter.matches(subject) {
            return Admission::Filtered;
        }

        let thread_id = match record.thread_root() {
            Some(id) => id.to_string(),
            // nothing to thread on: the message stands alone
            None => format!("<no-message-id:{}>", self.seen),
        };

        self.threads.record(&thread_id, subject);
        self.senders.record(&record.sender, &record.from);
        self.total += 1;
        Admission::Accepted
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn threads(&self) -> &[Group] {
        self.threads.as_slice()
    }

    pub fn senders(&self) -> &[Group] {
        self.senders.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(from: &str, subject: &str, mid: Option<&str>, refs: &[&str]) -> HeaderRecord {
        HeaderRecord {
            subject: subject.into(),
            from: from.into(),
            sender: from.into(),
            message_id: mid.map(str::to_string),
            references: (!refs.is_empty()).then(|| refs.iter().map(|r| r.to_string()).collect()),
        }
    }

    #[test]
    fn strips_reply_markers() {
        assert_eq!(strip_reply_markers("Re: Re: Fwd: X"), "X");
        assert_eq!(strip_reply_markers("re: X"), "X");
        assert_eq!(strip_reply_markers("FWD:RE:  X"), "X");
        assert_eq!(strip_reply_markers("Regarding: X"), "Regarding: X");
        assert_eq!(strip_reply_markers("X Re: Y"), "X Re: Y");
    }

    #[test]
    fn stripping_is_idempotent() {
        for s in ["Re: Fwd: Re: plan", "plan", "re:", "Fwd: "] {
            let once = strip_reply_markers(s);
            assert_eq!(strip_reply_markers(once), once);
        }
    }

    #[test]
    fn filter_is_full_match() {
        let f = SubjectFilter::new(r".*\[WORK\].*").unwrap();
        assert!(f.matches("[WORK] deploy"));
        assert!(f.matches("about [WORK]"));
        assert!(!f.matches("[HOME] garden"));

        let prefix_only = SubjectFilter::new("deploy").unwrap();
        assert!(!prefix_only.matches("deploy today"));
        assert!(prefix_only.matches("deploy"));
    }

    #[test]
    fn empty_filter_matches_everything() {
        let f = SubjectFilter::new("").unwrap();
        assert!(f.matches(""));
        assert!(f.matches("anything at all"));
    }

    #[test]
    fn alternation_is_anchored_as_a_whole() {
        let f = SubjectFilter::new("a|b").unwrap();
        assert!(f.matches("a"));
        assert!(!f.matches("ab"));
    }

    #[test]
    fn groups_by_first_reference() {
        let mut agg = Aggregator::default();
        agg.push(&record("a@x", "Plan", Some("<c@x>"), &["<a@x>", "<b@x>"]));
        agg.push(&record("b@x", "Other", Some("<d@x>"), &[]));

        let ids: Vec<&str> = agg.threads().iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["<a@x>", "<d@x>"]);
    }

    #[test]
    fn reply_subjects_collapse_within_thread() {
        let mut agg = Aggregator::default();
        agg.push(&record("a@x", "Plan", Some("<root@x>"), &[]));
        agg.push(&record("b@x", "Re: Plan", Some("<r1@x>"), &["<root@x>"]));
        agg.push(&record("a@x", "RE: Re: Plan v2", Some("<r2@x>"), &["<root@x>", "<r1@x>"]));

        let thread = &agg.threads()[0];
        assert_eq!(thread.count, 3);
        assert_eq!(
            thread.variants,
            BTreeSet::from(["Plan".to_string(), "Plan v2".to_string()])
        );
    }

    #[test]
    fn messages_without_from_are_skipped() {
        let mut agg = Aggregator::default();
        assert_eq!(
            agg.push(&record("", "Hi", Some("<m@x>"), &[])),
            Admission::MissingFrom
        );
        assert_eq!(agg.total(), 0);
        assert!(agg.threads().is_empty());
    }

    #[test]
    fn filter_applies_after_stripping() {
        let mut agg = Aggregator::new(SubjectFilter::new(r"\[WORK\].*").unwrap());
        assert_eq!(
            agg.push(&record("a@x", "Re: [WORK] ship it", Some("<1@x>"), &[])),
            Admission::Accepted
        );
        assert_eq!(
            agg.push(&record("a@x", "lunch?", Some("<2@x>"), &[])),
            Admission::Filtered
        );
        assert_eq!(agg.total(), 1);
        assert_eq!(agg.threads()[0].variants.first().map(String::as_str), Some("[WORK] ship it"));
    }

    #[test]
    fn messages_without_ids_get_their_own_thread() {
        let mut agg = Aggregator::default();
        agg.push(&record("a@x", "one", None, &[]));
        agg.push(&record("a@x", "two", None, &[]));

        let ids: Vec<&str> = agg.threads().iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["<no-message-id:1>", "<no-message-id:2>"]);
    }

    #[test]
    fn sender_groups_collect_from_variants() {
        let mut agg = Aggregator::default();
        let mut rec = record("Alice <a@x>", "s", Some("<1@x>"), &[]);
        rec.sender = "a@x".into();
        agg.push(&rec);
        rec.from = "\"Alice B.\" <a@x>".into();
        rec.message_id = Some("<2@x>".into());
        agg.push(&rec);

        assert_eq!(agg.senders().len(), 1);
        let alice = &agg.senders()[0];
        assert_eq!(alice.id, "a@x");
        assert_eq!(alice.count, 2);
        assert_eq!(alice.variants.len(), 2);
    }

    #[test]
    fn counts_add_up_to_total() {
        let mut agg = Aggregator::new(SubjectFilter::new("(?i).*report.*").unwrap());
        let messages = [
            record("a@x", "Report 1", Some("<1@x>"), &[]),
            record("b@x", "Re: Report 1", Some("<2@x>"), &["<1@x>"]),
            record("c@x", "Party", Some("<3@x>"), &[]),
            record("", "report", Some("<4@x>"), &[]),
            record("a@x", "weekly report", None, &[]),
        ];
        for m in &messages {
            agg.push(m);
        }

        let thread_sum: usize = agg.threads().iter().map(|g| g.count).sum();
        let sender_sum: usize = agg.senders().iter().map(|g| g.count).sum();
        assert_eq!(agg.total(), 3);
        assert_eq!(thread_sum, agg.total());
        assert_eq!(sender_sum, agg.total());
    }
}
