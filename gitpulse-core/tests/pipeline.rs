//! Integration tests for the gitpulse aggregation pipeline
//!
//! These tests drive the public API end to end: stub event sources and
//! repository scans feed the coordinator, and the merged stream flows into
//! the analytics layer.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use gitpulse_core::analytics::{summarize_at, summarize_extended_at, ExtendedOptions};
use gitpulse_core::config::FetchConfig;
use gitpulse_core::ingest::{RawCommit, RepoScan};
use gitpulse_core::stream::apply_filters_at;
use gitpulse_core::{
    Cache, Error, EventSource, FetchCoordinator, FilterOptions, RawActor, RawEvent, RawRepo,
    RepoScanSource, Result, SourceScope,
};
use serde_json::json;
use tempfile::TempDir;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 5, 12, 0, 0).unwrap()
}

fn raw_event(
    id: &str,
    kind: &str,
    actor: &str,
    repo: &str,
    ts: DateTime<Utc>,
    payload: serde_json::Value,
) -> RawEvent {
    RawEvent {
        id: id.to_string(),
        kind: kind.to_string(),
        actor: RawActor {
            login: actor.to_string(),
        },
        repo: RawRepo {
            name: repo.to_string(),
        },
        public: true,
        created_at: ts,
        payload,
    }
}

struct StubSource {
    name: &'static str,
    scope: SourceScope,
    events: Vec<RawEvent>,
    rate_limited: bool,
}

#[async_trait]
impl EventSource for StubSource {
    fn name(&self) -> &str {
        self.name
    }

    fn scope(&self) -> SourceScope {
        self.scope
    }

    async fn fetch(&self) -> Result<Vec<RawEvent>> {
        if self.rate_limited {
            return Err(Error::RateLimited {
                reset_at: Some(now() + Duration::minutes(10)),
            });
        }
        Ok(self.events.clone())
    }
}

struct StubScan {
    scan: RepoScan,
}

#[async_trait]
impl RepoScanSource for StubScan {
    fn repo(&self) -> &str {
        &self.scan.repo
    }

    async fn scan(&self) -> Result<RepoScan> {
        Ok(self.scan.clone())
    }
}

fn primary_events() -> Vec<RawEvent> {
    vec![
        raw_event(
            "1001",
            "PushEvent",
            "alice",
            "alice/engine",
            now() - Duration::hours(1),
            json!({
                "ref": "refs/heads/main",
                "size": 3,
                "commits": [
                    {"sha": "aaa111", "message": "fix parser"},
                    {"sha": "bbb222", "message": "add tests"},
                    {"sha": "ccc333", "message": "tidy docs"},
                ],
            }),
        ),
        raw_event(
            "1002",
            "PullRequestEvent",
            "alice",
            "alice/engine",
            now() - Duration::hours(2),
            json!({
                "action": "closed",
                "pull_request": {
                    "number": 7,
                    "title": "Faster merge path",
                    "state": "closed",
                    "merged": true,
                    "user": {"login": "alice"},
                },
            }),
        ),
    ]
}

fn coordinator(cache: Cache) -> FetchCoordinator {
    FetchCoordinator::new("alice", FetchConfig::default(), cache)
}

// ============================================
// End-to-End Aggregation
// ============================================

#[tokio::test]
async fn test_pipeline_from_raw_events_to_summary() {
    let sources: Vec<Box<dyn EventSource>> = vec![Box::new(StubSource {
        name: "primary",
        scope: SourceScope::Primary,
        events: primary_events(),
        rate_limited: false,
    })];

    let activities = coordinator(Cache::new())
        .aggregate_at(&sources, &[], now())
        .await
        .unwrap();

    assert_eq!(activities.len(), 2);
    // Newest first.
    assert_eq!(activities[0].id, "1001");
    assert_eq!(
        activities[0].description,
        "Pushed 3 commits to main in alice/engine"
    );
    assert_eq!(activities[1].action, "closed");
    assert_eq!(activities[1].details().merged, Some(true));

    let summary = summarize_at(&activities, 7, 5, 5, now());
    assert_eq!(summary.total_activities, 2);
    assert_eq!(summary.commits.total, 3);
    assert_eq!(summary.pull_requests.merged, 1);
    assert_eq!(summary.by_repo.get("alice/engine"), Some(&2));
}

#[tokio::test]
async fn test_received_feed_is_filtered_and_merged() {
    let sources: Vec<Box<dyn EventSource>> = vec![
        Box::new(StubSource {
            name: "primary",
            scope: SourceScope::Primary,
            events: primary_events(),
            rate_limited: false,
        }),
        Box::new(StubSource {
            name: "received",
            scope: SourceScope::Received,
            events: vec![
                // Relevant: comment mentioning alice.
                raw_event(
                    "2001",
                    "IssueCommentEvent",
                    "bob",
                    "bob/tools",
                    now() - Duration::minutes(30),
                    json!({
                        "issue": {"number": 9, "title": "CI flake"},
                        "comment": {"body": "@alice can you look at this?"},
                    }),
                ),
                // Irrelevant: a stranger starring a foreign repo.
                raw_event(
                    "2002",
                    "WatchEvent",
                    "carol",
                    "carol/misc",
                    now() - Duration::minutes(20),
                    json!({}),
                ),
            ],
            rate_limited: false,
        }),
    ];

    let activities = coordinator(Cache::new())
        .aggregate_at(&sources, &[], now())
        .await
        .unwrap();

    let ids: Vec<_> = activities.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["2001", "1001", "1002"]);
    assert!(activities[0].details().mentions.contains(&"alice".to_string()));
}

#[tokio::test]
async fn test_duplicate_events_last_source_wins() {
    let mut updated = primary_events();
    updated[1].payload["action"] = json!("reopened");

    let sources: Vec<Box<dyn EventSource>> = vec![
        Box::new(StubSource {
            name: "primary",
            scope: SourceScope::Primary,
            events: primary_events(),
            rate_limited: false,
        }),
        Box::new(StubSource {
            name: "repo",
            scope: SourceScope::Repository,
            events: updated,
            rate_limited: false,
        }),
    ];

    let activities = coordinator(Cache::new())
        .aggregate_at(&sources, &[], now())
        .await
        .unwrap();

    assert_eq!(activities.len(), 2);
    let pr = activities.iter().find(|a| a.id == "1002").unwrap();
    assert_eq!(pr.action, "reopened");
}

#[tokio::test]
async fn test_rate_limit_halts_whole_cycle() {
    let sources: Vec<Box<dyn EventSource>> = vec![
        Box::new(StubSource {
            name: "primary",
            scope: SourceScope::Primary,
            events: primary_events(),
            rate_limited: false,
        }),
        Box::new(StubSource {
            name: "received",
            scope: SourceScope::Received,
            events: vec![],
            rate_limited: true,
        }),
    ];

    let err = coordinator(Cache::new())
        .aggregate_at(&sources, &[], now())
        .await
        .unwrap_err();
    assert!(err.is_rate_limited());
}

// ============================================
// Pseudo-Event Synthesis
// ============================================

#[tokio::test]
async fn test_repo_scan_fills_feed_gaps_without_duplicating() {
    let sources: Vec<Box<dyn EventSource>> = vec![Box::new(StubSource {
        name: "primary",
        scope: SourceScope::Primary,
        events: primary_events(),
        rate_limited: false,
    })];

    let scans: Vec<Box<dyn RepoScanSource>> = vec![Box::new(StubScan {
        scan: RepoScan {
            repo: "alice/engine".to_string(),
            language: Some("Rust".to_string()),
            commits: vec![
                // Already in the primary feed by sha: must not reappear.
                RawCommit {
                    sha: "aaa111".to_string(),
                    message: "fix parser".to_string(),
                    author: "alice".to_string(),
                    timestamp: now() - Duration::hours(1),
                    url: None,
                },
                // Missed by the feed: synthesized.
                RawCommit {
                    sha: "ddd444".to_string(),
                    message: "hotfix release".to_string(),
                    author: "alice".to_string(),
                    timestamp: now() - Duration::hours(3),
                    url: None,
                },
            ],
            pulls: vec![],
            issues: vec![],
        },
    })];

    let activities = coordinator(Cache::new())
        .aggregate_at(&sources, &scans, now())
        .await
        .unwrap();

    assert_eq!(activities.len(), 3);
    let pseudo = activities.iter().find(|a| a.id == "commit-ddd444").unwrap();
    assert_eq!(pseudo.details().commit_count, Some(1));
    assert!(!activities.iter().any(|a| a.id == "commit-aaa111"));
}

// ============================================
// Caching Across Coordinators
// ============================================

#[tokio::test]
async fn test_disk_cache_survives_coordinator_restart() {
    let dir = TempDir::new().unwrap();
    let sources: Vec<Box<dyn EventSource>> = vec![Box::new(StubSource {
        name: "primary",
        scope: SourceScope::Primary,
        events: primary_events(),
        rate_limited: false,
    })];

    let cache = Cache::new()
        .with_dir(dir.path())
        .with_default_ttl(std::time::Duration::from_secs(600));
    let first = coordinator(cache)
        .aggregate_at(&sources, &[], now())
        .await
        .unwrap();

    // A fresh coordinator over the same directory, with sources that would
    // return nothing, still sees the cached stream.
    let cache = Cache::new().with_dir(dir.path());
    let empty: Vec<Box<dyn EventSource>> = vec![Box::new(StubSource {
        name: "primary",
        scope: SourceScope::Primary,
        events: vec![],
        rate_limited: false,
    })];
    let second = coordinator(cache)
        .aggregate_at(&empty, &[], now())
        .await
        .unwrap();

    assert_eq!(first.len(), second.len());
    assert_eq!(second[0].id, "1001");
}

// ============================================
// Filters and Extended Analytics
// ============================================

#[tokio::test]
async fn test_filters_and_extended_summary_over_merged_stream() {
    let sources: Vec<Box<dyn EventSource>> = vec![Box::new(StubSource {
        name: "primary",
        scope: SourceScope::Primary,
        events: primary_events(),
        rate_limited: false,
    })];

    let activities = coordinator(Cache::new())
        .aggregate_at(&sources, &[], now())
        .await
        .unwrap();

    let options = FilterOptions {
        search_query: Some("merge".to_string()),
        ..Default::default()
    };
    let filtered = apply_filters_at(&activities, &options, now());
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].id, "1002");

    let extended = summarize_extended_at(&activities, "alice", ExtendedOptions::default(), now());
    assert_eq!(extended.last_24h, 2);
    assert_eq!(extended.streak.current_days, 1);
    assert_eq!(extended.top_repositories[0].name, "alice/engine");
    assert_eq!(extended.top_repositories[0].count, 2);
}
