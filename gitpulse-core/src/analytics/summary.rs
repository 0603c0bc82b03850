//! Basic activity summary
//!
//! Aggregates the canonical activity sequence over a bounded trailing
//! window into counts, funnels, and a commit aggregate. Aggregation is
//! pure and total: it never fails for any well-typed input, and an empty
//! activity list yields a zero-valued summary. A missing or partial
//! `details` field degrades that single metric contribution to zero.

use crate::types::{Activity, EventKind};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Pull request funnel counters.
///
/// `opened`, `closed`, and `merged` are mutually exclusive per activity;
/// `reviewed` counts review events independently and does not affect the
/// other three.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestFunnel {
    pub opened: u64,
    pub closed: u64,
    pub merged: u64,
    pub reviewed: u64,
}

/// Issue funnel counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueFunnel {
    pub opened: u64,
    pub closed: u64,
    pub commented: u64,
}

/// Commit aggregate across push activities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitStats {
    /// Sum of per-push commit counts
    pub total: u64,
    /// Repositories touched by any push, deduplicated, first-seen order
    pub repos: Vec<String>,
}

/// One ranked entry of a top-N list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub name: String,
    pub count: u64,
}

/// Statistical summary of an activity sequence over a trailing window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Summary {
    /// Number of activities inside the window
    pub total_activities: usize,
    /// Count per event type tag
    pub by_type: BTreeMap<String, u64>,
    /// Count per repository full name
    pub by_repo: BTreeMap<String, u64>,
    /// Count per ISO date (YYYY-MM-DD)
    pub by_day: BTreeMap<String, u64>,
    /// The `top_n` busiest repositories in the window, ties broken by name
    pub top_repositories: Vec<RankedEntry>,
    /// First N activities by recency
    pub recent_activities: Vec<Activity>,
    /// Pull request funnel
    pub pull_requests: PullRequestFunnel,
    /// Issue funnel
    pub issues: IssueFunnel,
    /// Commit aggregate
    pub commits: CommitStats,
}

/// Summarize activities over the trailing `window_days` ending now.
pub fn summarize(
    activities: &[Activity],
    window_days: i64,
    recent_limit: usize,
    top_n: usize,
) -> Summary {
    summarize_at(activities, window_days, recent_limit, top_n, Utc::now())
}

/// [`summarize`] with an explicit `now`, for deterministic aggregation.
pub fn summarize_at(
    activities: &[Activity],
    window_days: i64,
    recent_limit: usize,
    top_n: usize,
    now: DateTime<Utc>,
) -> Summary {
    let window_start = now - Duration::days(window_days);

    let mut summary = Summary::default();
    let mut windowed: Vec<&Activity> = Vec::new();

    for activity in activities {
        if activity.timestamp < window_start || activity.timestamp > now {
            continue;
        }
        windowed.push(activity);

        // Each in-window activity contributes to exactly one bucket per axis.
        *summary
            .by_type
            .entry(activity.kind.tag().to_string())
            .or_insert(0) += 1;
        *summary.by_repo.entry(activity.repo.clone()).or_insert(0) += 1;
        *summary
            .by_day
            .entry(activity.timestamp.format("%Y-%m-%d").to_string())
            .or_insert(0) += 1;

        tally_funnels(&mut summary, activity);
    }

    summary.total_activities = windowed.len();

    // by_repo iterates name-ascending, and the sort is stable, so equal
    // counts come out in name order.
    summary.top_repositories = summary
        .by_repo
        .iter()
        .map(|(name, &count)| RankedEntry {
            name: name.clone(),
            count,
        })
        .collect();
    summary.top_repositories.sort_by(|a, b| b.count.cmp(&a.count));
    summary.top_repositories.truncate(top_n);

    windowed.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    summary.recent_activities = windowed
        .into_iter()
        .take(recent_limit)
        .cloned()
        .collect();

    summary
}

fn tally_funnels(summary: &mut Summary, activity: &Activity) {
    let details = activity.details();

    match &activity.kind {
        EventKind::PullRequest => match activity.action.as_str() {
            "opened" => summary.pull_requests.opened += 1,
            // A closed PR counts as merged when the payload said so,
            // otherwise as closed; never both.
            "closed" => {
                if details.merged == Some(true) {
                    summary.pull_requests.merged += 1;
                } else {
                    summary.pull_requests.closed += 1;
                }
            }
            _ => {}
        },
        EventKind::PullRequestReview => summary.pull_requests.reviewed += 1,
        EventKind::Issues => match activity.action.as_str() {
            "opened" => summary.issues.opened += 1,
            "closed" => summary.issues.closed += 1,
            _ => {}
        },
        EventKind::IssueComment => summary.issues.commented += 1,
        EventKind::Push => {
            summary.commits.total += details.commit_count.unwrap_or(0);
            if !summary.commits.repos.contains(&activity.repo) {
                summary.commits.repos.push(activity.repo.clone());
            }
        }
        _ => {}
    }
}
