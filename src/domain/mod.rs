pub mod message;
pub mod stats;

pub use message::{HeaderRecord, RawMessage};
pub use stats::{Quota, SenderStat, StatsResult, ThreadStat};
