//! Statistics over merged activity streams.

pub mod extended;
pub mod summary;

pub use extended::{
    summarize_extended, summarize_extended_at, ExtendedOptions, ExtendedSummary, StreakStats,
    TrendPoint,
};
pub use summary::{
    summarize, summarize_at, CommitStats, IssueFunnel, PullRequestFunnel, RankedEntry, Summary,
};
