//! Event ingestion: normalization, sourcing, and fetch coordination.

pub mod normalize;
pub mod source;

pub use normalize::normalize;
pub use source::{
    synthesize_pseudo_events, EventSource, NaturalKeys, RawCommit, RawIssue, RawPullRequest,
    RepoScan, RepoScanSource, SourceScope,
};

use crate::cache::Cache;
use crate::config::FetchConfig;
use crate::stream::{filter_received, merge_sources};
use crate::types::Activity;
use crate::Result;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::time::Duration;

/// Drives one fetch cycle: cache check, concurrent source fetches,
/// normalization, relevance filtering, pseudo-event synthesis, and merge.
///
/// The coordinator owns the fetch policy, not the transport: sources plug in
/// through [`EventSource`] and [`RepoScanSource`]. A single source failing
/// degrades to an empty contribution from that source; a rate-limit error
/// halts the whole cycle because every source shares the same quota.
pub struct FetchCoordinator {
    username: String,
    config: FetchConfig,
    cache: Cache,
}

impl FetchCoordinator {
    pub fn new(username: impl Into<String>, config: FetchConfig, cache: Cache) -> Self {
        Self {
            username: username.into(),
            config,
            cache,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    fn cache_key(&self) -> String {
        format!("events:{}", self.username)
    }

    /// Drop the cached activity set so the next cycle refetches.
    pub fn invalidate(&self) {
        self.cache.delete(&self.cache_key());
    }

    /// Run one fetch cycle and return the merged activity stream, newest
    /// first. Served from the cache when a fresh entry exists.
    pub async fn aggregate(
        &self,
        sources: &[Box<dyn EventSource>],
        scans: &[Box<dyn RepoScanSource>],
    ) -> Result<Vec<Activity>> {
        self.aggregate_at(sources, scans, Utc::now()).await
    }

    /// [`Self::aggregate`] with an explicit `now` for the pseudo-event
    /// window, for determinism.
    pub async fn aggregate_at(
        &self,
        sources: &[Box<dyn EventSource>],
        scans: &[Box<dyn RepoScanSource>],
        now: DateTime<Utc>,
    ) -> Result<Vec<Activity>> {
        let key = self.cache_key();
        if let Some(cached) = self.cache.get_as::<Vec<Activity>>(&key) {
            tracing::debug!(count = cached.len(), "Serving activities from cache");
            return Ok(cached);
        }

        let fetches = join_all(sources.iter().map(|source| source.fetch())).await;

        // Per-source contributions, in the caller's source order. Primary
        // activities are tracked separately to gate pseudo-event synthesis.
        let mut streams: Vec<Vec<Activity>> = Vec::with_capacity(sources.len() + 1);
        let mut primary: Vec<Activity> = Vec::new();

        for (source, outcome) in sources.iter().zip(fetches) {
            let events = match outcome {
                Ok(events) => events,
                Err(e) if e.is_rate_limited() => return Err(e),
                Err(e) => {
                    tracing::warn!(source = source.name(), error = %e, "Source fetch failed, skipping");
                    Vec::new()
                }
            };

            let mut activities: Vec<Activity> = events.iter().map(normalize).collect();
            if source.scope().requires_relevance_filter() {
                activities = filter_received(activities, &self.username);
            }
            if source.scope() == SourceScope::Primary {
                primary.extend(activities.iter().cloned());
            }
            streams.push(activities);
        }

        let scanned = self.scan_repositories(scans).await?;
        let keys = NaturalKeys::from_activities(&primary);
        streams.push(synthesize_pseudo_events(
            &scanned,
            &keys,
            self.config.pseudo_event_window_days,
            now,
        ));

        let merged = merge_sources(streams);
        tracing::info!(
            username = %self.username,
            count = merged.len(),
            "Fetch cycle complete"
        );

        self.cache.set(&key, &merged, None);
        Ok(merged)
    }

    async fn scan_repositories(&self, scans: &[Box<dyn RepoScanSource>]) -> Result<Vec<RepoScan>> {
        let outcomes = join_all(scans.iter().map(|scan| scan.scan())).await;

        let mut scanned = Vec::with_capacity(scans.len());
        for (source, outcome) in scans.iter().zip(outcomes) {
            match outcome {
                Ok(scan) => scanned.push(scan),
                Err(e) if e.is_rate_limited() => return Err(e),
                Err(e) => {
                    tracing::warn!(repo = source.repo(), error = %e, "Repository scan failed, skipping");
                }
            }
        }
        Ok(scanned)
    }

    /// Fetch repeatedly at the configured interval, invoking `on_cycle`
    /// after each successful cycle. Returning `false` from the callback
    /// stops the loop.
    ///
    /// Rate-limit errors pause the loop until the reported reset time (or
    /// one interval when the source did not report one); other errors log
    /// and retry at the next tick.
    pub async fn watch<F>(
        &self,
        sources: &[Box<dyn EventSource>],
        scans: &[Box<dyn RepoScanSource>],
        mut on_cycle: F,
    ) -> Result<()>
    where
        F: FnMut(&[Activity]) -> bool,
    {
        let interval = Duration::from_secs(self.config.watch_interval_secs);

        loop {
            // Each tick must observe fresh data, not the previous tick's
            // cache entry.
            self.invalidate();

            let pause = match self.aggregate(sources, scans).await {
                Ok(activities) => {
                    if !on_cycle(&activities) {
                        return Ok(());
                    }
                    interval
                }
                Err(crate::Error::RateLimited { reset_at }) => {
                    let pause = reset_at
                        .and_then(|t| (t - Utc::now()).to_std().ok())
                        .unwrap_or(interval);
                    tracing::warn!(pause_secs = pause.as_secs(), "Rate limited, pausing watch");
                    pause
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Fetch cycle failed, retrying next tick");
                    interval
                }
            };

            tokio::time::sleep(pause).await;
        }
    }
}
