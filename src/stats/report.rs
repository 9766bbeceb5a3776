use std::collections::BTreeSet;
use std::fmt::Write as _;

use crate::domain::{Quota, StatsResult};

pub fn render_mailboxes(boxes: &[(String, Option<u32>)]) -> String {
    let mut out = String::new();
    for (name, count) in boxes {
        match count {
            Some(count) => {
                let _ = writeln!(out, "{name:<40} {count:>7}");
            }
            None => {
                let _ = writeln!(out, "{name:<40} {:>7}", "-");
            }
        }
    }
    out
}

pub fn render_quota(mailbox: &str, quota: Option<Quota>) -> String {
    match quota {
        Some(q) => format!(
            "{mailbox}: {} KiB used of {} KiB ({}%)\n",
            q.used,
            q.total,
            q.percent()
        ),
        None => format!("{mailbox}: quota unavailable\n"),
    }
}

pub fn render_stats(mailboxes: &[String], stats: &StatsResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} messages in {}",
        stats.total,
        mailboxes.join(", ")
    );

    let _ = writeln!(out, "\nTop threads:");
    for t in &stats.top_threads {
        let _ = writeln!(
            out,
            "{:>5} {:>3}%  {}",
            t.count,
            stats.percent(t.count),
            variants(&t.subjects)
        );
    }

    let _ = writeln!(out, "\nTop senders:");
    for s in &stats.top_senders {
        let _ = writeln!(
            out,
            "{:>5} {:>3}%  {}",
            s.count,
            stats.percent(s.count),
            variants(&s.froms)
        );
    }
    out
}

fn variants(set: &BTreeSet<String>) -> String {
    let shown: Vec<&str> = set
        .iter()
        .map(|s| if s.is_empty() { "(no subject)" } else { s.as_str() })
        .collect();
    shown.join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SenderStat, ThreadStat};
    use pretty_assertions::assert_eq;

    #[test]
    fn renders_stats_with_percentages() {
        let stats = StatsResult {
            total: 3,
            top_threads: vec![ThreadStat {
                thread_id: "<hi@x>".into(),
                subjects: BTreeSet::from(["Hi".to_string(), String::new()]),
                count: 2,
            }],
            top_senders: vec![SenderStat {
                sender: "a@x".into(),
                froms: BTreeSet::from(["a@x".to_string()]),
                count: 1,
            }],
        };
        let text = render_stats(&["INBOX".to_string()], &stats);
        assert_eq!(
            text,
            "3 messages in INBOX\n\
             \n\
             Top threads:\n    \
             2  67%  (no subject) | Hi\n\
             \n\
             Top senders:\n    \
             1  33%  a@x\n"
        );
    }

    #[test]
    fn unopenable_mailbox_has_no_count() {
        let boxes = vec![("INBOX".to_string(), Some(12)), ("[Gmail]".to_string(), None)];
        assert_eq!(
            render_mailboxes(&boxes),
            format!("{:<40} {:>7}\n{:<40} {:>7}\n", "INBOX", 12, "[Gmail]", "-")
        );
    }

    #[test]
    fn renders_missing_quota() {
        assert_eq!(render_quota("INBOX", None), "INBOX: quota unavailable\n");
        assert_eq!(
            render_quota("INBOX", Some(Quota { used: 10, total: 40 })),
            "INBOX: 10 KiB used of 40 KiB (25%)\n"
        );
    }
}
