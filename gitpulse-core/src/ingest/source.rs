//! Event sources and pseudo-event synthesis
//!
//! The network collaborator (paginated HTTP/GraphQL client) lives outside
//! this crate; it plugs in through the [`EventSource`] and [`RepoScanSource`]
//! traits. The core only sees the data shapes: arrays of [`RawEvent`]s, and
//! raw commit/PR/issue records for repositories scanned directly.

use crate::types::{Activity, ActivityDetails, EventKind, RawEvent};
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;

/// Which feed a source draws from.
///
/// Primary and repository feeds are inherently scoped to the tracked user;
/// received and organization feeds are broad and go through the relevance
/// filter before merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceScope {
    /// The tracked user's own event feed
    Primary,
    /// Events received by the tracked user (broad)
    Received,
    /// Organization-wide events (broad)
    Organization,
    /// Events of an explicitly tracked repository
    Repository,
}

impl SourceScope {
    /// Whether activities from this scope must pass the relevance filter.
    pub fn requires_relevance_filter(&self) -> bool {
        matches!(self, SourceScope::Received | SourceScope::Organization)
    }
}

/// A provider of raw activity events.
///
/// Implementations are expected to enforce their own timeout and pagination
/// caps; the coordinator only fault-isolates and joins them.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Human-readable source name, used in warnings
    fn name(&self) -> &str;

    /// Which feed this source draws from
    fn scope(&self) -> SourceScope;

    /// Fetch raw events. A [`crate::Error::RateLimited`] return halts the
    /// whole fetch cycle; any other error degrades to an empty contribution.
    async fn fetch(&self) -> Result<Vec<RawEvent>>;
}

/// A provider of per-repository commit/PR/issue records, used to synthesize
/// pseudo-events the primary feed missed.
#[async_trait]
pub trait RepoScanSource: Send + Sync {
    /// Full name of the repository being scanned
    fn repo(&self) -> &str;

    /// Scan the repository for recent commits, pull requests, and issues.
    async fn scan(&self) -> Result<RepoScan>;
}

/// Raw commit record from a repository scan.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct RawCommit {
    pub sha: String,
    pub message: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Raw pull request record from a repository scan.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct RawPullRequest {
    pub id: u64,
    pub number: u64,
    pub title: String,
    pub state: String,
    #[serde(default)]
    pub merged: bool,
    pub author: String,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Raw issue record from a repository scan.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct RawIssue {
    pub id: u64,
    pub number: u64,
    pub title: String,
    pub state: String,
    pub author: String,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// One repository's worth of scanned records.
#[derive(Debug, Clone, Default)]
pub struct RepoScan {
    /// Full name of the scanned repository
    pub repo: String,
    /// Primary language of the repository, if known
    pub language: Option<String>,
    pub commits: Vec<RawCommit>,
    pub pulls: Vec<RawPullRequest>,
    pub issues: Vec<RawIssue>,
}

/// Natural keys of events already present in the primary feed.
///
/// A pseudo-event is only synthesized when no primary-feed event with a
/// matching key exists, so history the feed already supplies is not
/// re-derived.
#[derive(Debug, Default)]
pub struct NaturalKeys {
    commit_shas: HashSet<String>,
    /// (repo, number) pairs; numbers identify PRs/issues within a repository
    pull_requests: HashSet<(String, u64)>,
    issues: HashSet<(String, u64)>,
}

impl NaturalKeys {
    /// Collect natural keys from already-normalized primary activities.
    pub fn from_activities(activities: &[Activity]) -> Self {
        let mut keys = NaturalKeys::default();
        for activity in activities {
            let details = activity.details();
            match &activity.kind {
                EventKind::Push => {
                    keys.commit_shas
                        .extend(details.commit_shas.iter().cloned());
                }
                EventKind::PullRequest => {
                    if let Some(number) = details.number {
                        keys.pull_requests.insert((activity.repo.clone(), number));
                    }
                }
                EventKind::Issues => {
                    if let Some(number) = details.number {
                        keys.issues.insert((activity.repo.clone(), number));
                    }
                }
                _ => {}
            }
        }
        keys
    }
}

/// Synthesize pseudo-events from repository scans.
///
/// Only records absent from the primary feed (by natural key) and newer
/// than `now - window_days` are included; the short window fills the gaps
/// the feed misses due to its own pagination limits without re-deriving
/// history it already supplies.
pub fn synthesize_pseudo_events(
    scans: &[RepoScan],
    keys: &NaturalKeys,
    window_days: i64,
    now: DateTime<Utc>,
) -> Vec<Activity> {
    let cutoff = now - Duration::days(window_days);
    let mut pseudo = Vec::new();

    for scan in scans {
        for commit in &scan.commits {
            if commit.timestamp < cutoff || keys.commit_shas.contains(&commit.sha) {
                continue;
            }
            pseudo.push(commit_activity(commit, scan));
        }

        for pr in &scan.pulls {
            let key = (scan.repo.clone(), pr.number);
            if pr.updated_at < cutoff || keys.pull_requests.contains(&key) {
                continue;
            }
            pseudo.push(pull_request_activity(pr, scan));
        }

        for issue in &scan.issues {
            let key = (scan.repo.clone(), issue.number);
            if issue.updated_at < cutoff || keys.issues.contains(&key) {
                continue;
            }
            pseudo.push(issue_activity(issue, scan));
        }
    }

    tracing::debug!(count = pseudo.len(), "Synthesized pseudo-events");
    pseudo
}

fn commit_activity(commit: &RawCommit, scan: &RepoScan) -> Activity {
    let summary = commit.message.lines().next().unwrap_or("").to_string();
    Activity {
        id: format!("commit-{}", commit.sha),
        kind: EventKind::Push,
        action: "pushed".to_string(),
        actor: commit.author.clone(),
        repo: scan.repo.clone(),
        timestamp: commit.timestamp,
        description: format!("Pushed 1 commit to {}: {}", scan.repo, summary),
        url: commit.url.clone(),
        public: true,
        details: Some(ActivityDetails {
            commit_count: Some(1),
            commit_messages: vec![commit.message.clone()],
            commit_shas: vec![commit.sha.clone()],
            language: scan.language.clone(),
            ..Default::default()
        }),
    }
}

fn pull_request_activity(pr: &RawPullRequest, scan: &RepoScan) -> Activity {
    let action = if pr.state == "closed" { "closed" } else { "opened" };
    Activity {
        id: format!("pr-{}", pr.id),
        kind: EventKind::PullRequest,
        action: action.to_string(),
        actor: pr.author.clone(),
        repo: scan.repo.clone(),
        timestamp: pr.updated_at,
        description: format!("Pull request #{}: {}", pr.number, pr.title),
        url: pr.url.clone(),
        public: true,
        details: Some(ActivityDetails {
            number: Some(pr.number),
            title: Some(pr.title.clone()),
            state: Some(pr.state.clone()),
            merged: Some(pr.merged),
            author: Some(pr.author.clone()),
            language: scan.language.clone(),
            ..Default::default()
        }),
    }
}

fn issue_activity(issue: &RawIssue, scan: &RepoScan) -> Activity {
    let action = if issue.state == "closed" { "closed" } else { "opened" };
    Activity {
        id: format!("issue-{}", issue.id),
        kind: EventKind::Issues,
        action: action.to_string(),
        actor: issue.author.clone(),
        repo: scan.repo.clone(),
        timestamp: issue.updated_at,
        description: format!("Issue #{}: {}", issue.number, issue.title),
        url: issue.url.clone(),
        public: true,
        details: Some(ActivityDetails {
            number: Some(issue.number),
            title: Some(issue.title.clone()),
            state: Some(issue.state.clone()),
            author: Some(issue.author.clone()),
            labels: issue.labels.clone(),
            language: scan.language.clone(),
            ..Default::default()
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 5, 12, 0, 0).unwrap()
    }

    fn push_activity(sha: &str, repo: &str) -> Activity {
        Activity {
            id: "100".to_string(),
            kind: EventKind::Push,
            action: "pushed".to_string(),
            actor: "alice".to_string(),
            repo: repo.to_string(),
            timestamp: now(),
            description: "Pushed 1 commit".to_string(),
            url: None,
            public: true,
            details: Some(ActivityDetails {
                commit_count: Some(1),
                commit_shas: vec![sha.to_string()],
                ..Default::default()
            }),
        }
    }

    fn scan_with_commit(sha: &str, ts: DateTime<Utc>) -> RepoScan {
        RepoScan {
            repo: "alice/proj".to_string(),
            language: Some("Rust".to_string()),
            commits: vec![RawCommit {
                sha: sha.to_string(),
                message: "fix parser".to_string(),
                author: "alice".to_string(),
                timestamp: ts,
                url: None,
            }],
            pulls: vec![],
            issues: vec![],
        }
    }

    #[test]
    fn test_pseudo_commit_skipped_when_primary_has_sha() {
        let primary = vec![push_activity("abc123", "alice/proj")];
        let keys = NaturalKeys::from_activities(&primary);
        let scans = vec![scan_with_commit("abc123", now())];

        let pseudo = synthesize_pseudo_events(&scans, &keys, 3, now());
        assert!(pseudo.is_empty());
    }

    #[test]
    fn test_pseudo_commit_synthesized_when_missing() {
        let keys = NaturalKeys::default();
        let scans = vec![scan_with_commit("abc123", now())];

        let pseudo = synthesize_pseudo_events(&scans, &keys, 3, now());
        assert_eq!(pseudo.len(), 1);
        assert_eq!(pseudo[0].id, "commit-abc123");
        assert_eq!(pseudo[0].kind, EventKind::Push);
        assert_eq!(pseudo[0].details().language.as_deref(), Some("Rust"));
    }

    #[test]
    fn test_pseudo_commit_outside_window_dropped() {
        let keys = NaturalKeys::default();
        let old = now() - Duration::days(5);
        let scans = vec![scan_with_commit("abc123", old)];

        let pseudo = synthesize_pseudo_events(&scans, &keys, 3, now());
        assert!(pseudo.is_empty());
    }

    #[test]
    fn test_pseudo_pull_request_and_issue() {
        let keys = NaturalKeys::default();
        let scans = vec![RepoScan {
            repo: "alice/proj".to_string(),
            language: None,
            commits: vec![],
            pulls: vec![RawPullRequest {
                id: 900,
                number: 4,
                title: "Speed up merge".to_string(),
                state: "closed".to_string(),
                merged: true,
                author: "alice".to_string(),
                updated_at: now(),
                url: None,
            }],
            issues: vec![RawIssue {
                id: 901,
                number: 5,
                title: "Crash on empty input".to_string(),
                state: "open".to_string(),
                author: "bob".to_string(),
                updated_at: now(),
                labels: vec!["bug".to_string()],
                url: None,
            }],
        }];

        let pseudo = synthesize_pseudo_events(&scans, &keys, 3, now());
        assert_eq!(pseudo.len(), 2);

        let pr = pseudo.iter().find(|a| a.id == "pr-900").unwrap();
        assert_eq!(pr.action, "closed");
        assert_eq!(pr.details().merged, Some(true));

        let issue = pseudo.iter().find(|a| a.id == "issue-901").unwrap();
        assert_eq!(issue.action, "opened");
        assert_eq!(issue.details().labels, vec!["bug"]);
    }

    #[test]
    fn test_pseudo_skips_pr_already_in_primary() {
        let mut primary = push_activity("zzz", "alice/proj");
        primary.kind = EventKind::PullRequest;
        primary.details = Some(ActivityDetails {
            number: Some(4),
            ..Default::default()
        });
        let keys = NaturalKeys::from_activities(&[primary]);

        let scans = vec![RepoScan {
            repo: "alice/proj".to_string(),
            language: None,
            commits: vec![],
            pulls: vec![RawPullRequest {
                id: 900,
                number: 4,
                title: "Speed up merge".to_string(),
                state: "open".to_string(),
                merged: false,
                author: "alice".to_string(),
                updated_at: now(),
                url: None,
            }],
            issues: vec![],
        }];

        let pseudo = synthesize_pseudo_events(&scans, &keys, 3, now());
        assert!(pseudo.is_empty());
    }

    #[test]
    fn test_scope_relevance_requirements() {
        assert!(!SourceScope::Primary.requires_relevance_filter());
        assert!(SourceScope::Received.requires_relevance_filter());
        assert!(SourceScope::Organization.requires_relevance_filter());
        assert!(!SourceScope::Repository.requires_relevance_filter());
    }
}
