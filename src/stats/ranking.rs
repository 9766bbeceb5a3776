use crate::domain::{SenderStat, StatsResult, ThreadStat};
use crate::stats::aggregator::{Aggregator, Group};

/// The `n` largest groups, biggest first. Equal counts keep first-seen order.
pub fn top_groups(groups: &[Group], n: usize) -> Vec<&Group> {
    let mut ranked: Vec<&Group> = groups.iter().collect();
    // stable sort
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(n);
    ranked
}

pub fn rank(aggregator: &Aggregator, n: usize) -> StatsResult {
    let top_threads = top_groups(aggregator.threads(), n)
        .into_iter()
        .map(|g| ThreadStat {
            thread_id: g.id.clone(),
            subjects: g.variants.clone(),
            count: g.count,
        })
        .collect();
    let top_senders = top_groups(aggregator.senders(), n)
        .into_iter()
        .map(|g| SenderStat {
            sender: g.id.clone(),
            froms: g.variants.clone(),
            count: g.count,
        })
        .collect();

    StatsResult {
        total: aggregator.total(),
        top_threads,
        top_senders,
    }
}
