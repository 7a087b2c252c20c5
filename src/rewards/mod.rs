//! Reward ledger and child stats projection.

pub mod ledger;
pub mod stats;
pub mod types;

pub use ledger::RewardLedger;
pub use stats::{StatsProjection, StatsSink};
pub use types::{
    ChildStats, CourseGrantResult, GrantResult, RewardLedgerEntry, RewardType, StatsDelta,
};
