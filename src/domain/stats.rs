use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreadStat {
    pub thread_id: String,
    pub subjects: BTreeSet<String>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SenderStat {
    pub sender: String,
    pub froms: BTreeSet<String>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsResult {
    pub total: usize,
    pub top_threads: Vec<ThreadStat>,
    pub top_senders: Vec<SenderStat>,
}

impl StatsResult {
    pub fn percent(&self, count: usize) -> usize {
        percentage(count, self.total)
    }
}

/// `count / total * 100`, rounded half up. Zero when `total` is zero.
pub fn percentage(count: usize, total: usize) -> usize {
    if total == 0 {
        return 0;
    }
    (200 * count + total) / (2 * total)
}

/// Storage usage as reported by the server, in KiB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Quota {
    pub used: u64,
    pub total: u64,
}

impl Quota {
    pub fn percent(&self) -> usize {
        percentage(self.used as usize, self.total as usize)
    }
}
