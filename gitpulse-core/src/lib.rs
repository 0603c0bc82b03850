//! # gitpulse-core
//!
//! Core library for gitpulse - a GitHub activity aggregation and
//! statistics engine.
//!
//! This library provides:
//! - Domain types for raw events and canonical activities
//! - Event normalization across heterogeneous event kinds
//! - Multi-source merge with dedup and relevance filtering
//! - TTL-based result caching
//! - Summary and extended statistics (funnels, streaks, histograms,
//!   rankings)
//!
//! ## Architecture
//!
//! Data flows through three stages:
//! - **Ingest:** Raw feed events and repository scans become canonical
//!   [`Activity`] values
//! - **Stream:** Per-source activity streams are relevance-filtered,
//!   deduplicated, and merged newest-first
//! - **Analytics:** Merged streams are reduced to summaries
//!
//! ## Example
//!
//! ```rust,no_run
//! use gitpulse_core::{Cache, Config, FetchCoordinator};
//!
//! # async fn run() -> gitpulse_core::Result<()> {
//! let config = Config::load()?;
//! let cache = Cache::from_config(&config.cache);
//! let coordinator = FetchCoordinator::new("octocat", config.fetch, cache);
//!
//! let activities = coordinator.aggregate(&[], &[]).await?;
//! let summary = gitpulse_core::analytics::summarize(&activities, 7, 5, 5);
//! println!("{} activities this week", summary.total_activities);
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use cache::Cache;
pub use config::Config;
pub use error::{Error, Result};
pub use ingest::{EventSource, FetchCoordinator, RepoScanSource, SourceScope};
pub use types::*;

// Public modules
pub mod analytics;
pub mod cache;
pub mod config;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod stream;
pub mod types;
