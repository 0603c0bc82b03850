//! Canonical activity stream: merge/dedup and filtering stages.

pub mod merge;
pub mod relevance;

pub use merge::merge_sources;
pub use relevance::{apply_filters, apply_filters_at, filter_received, is_relevant};
