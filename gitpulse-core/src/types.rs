//! Core domain types for gitpulse
//!
//! These types represent the canonical data model that normalizes activity
//! from all event sources on the hosting platform.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **RawEvent** | A heterogeneous, source-specific event record before normalization |
//! | **Activity** | The canonical, immutable representation of one event |
//! | **Pseudo-event** | An Activity synthesized from a commit/PR/issue record the primary feed missed |
//! | **Funnel** | opened/closed/merged (or commented) counters for pull requests and issues |
//! | **Relevance filter** | The ownership/mention/assignment allow-list for broad event feeds |
//!
//! A RawEvent is produced by an external network collaborator; the normalizer
//! ([`crate::ingest::normalize`]) turns each one into exactly one [`Activity`],
//! which is immutable thereafter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ============================================
// Raw events (external input)
// ============================================

/// The actor attached to a raw event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawActor {
    /// Login of the user who performed the event
    pub login: String,
}

/// The repository attached to a raw event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRepo {
    /// Full name of the repository ("owner/name")
    pub name: String,
}

/// A raw activity event as delivered by the upstream event feed.
///
/// The `id` is unique per upstream source, but the same logical event can
/// appear under the same id from two overlapping feeds; dedup happens later
/// in [`crate::stream::merge_sources`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEvent {
    /// Upstream event id
    pub id: String,
    /// Event type tag (e.g. "PushEvent"); open-ended vocabulary
    #[serde(rename = "type")]
    pub kind: String,
    /// Who performed the event
    pub actor: RawActor,
    /// Repository the event happened on
    pub repo: RawRepo,
    /// Whether the event is on a public repository
    #[serde(default = "default_public")]
    pub public: bool,
    /// When the event happened
    pub created_at: DateTime<Utc>,
    /// Type-dependent, loosely structured payload
    #[serde(default)]
    pub payload: serde_json::Value,
}

fn default_public() -> bool {
    true
}

// ============================================
// Event kinds
// ============================================

/// Known event type tags, plus an explicit unknown case.
///
/// The upstream vocabulary is open-ended, so unrecognized tags are carried
/// verbatim in [`EventKind::Unknown`] rather than rejected. This preserves
/// the "normalization never fails" contract while keeping exhaustiveness
/// checking for the kinds the funnels depend on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    Push,
    PullRequest,
    Issues,
    IssueComment,
    Create,
    Delete,
    Fork,
    Watch,
    Release,
    PullRequestReview,
    PullRequestReviewComment,
    /// Unrecognized type tag, carried verbatim
    Unknown(String),
}

impl EventKind {
    /// Parse an upstream type tag. Never fails; unknown tags become
    /// [`EventKind::Unknown`].
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "PushEvent" => EventKind::Push,
            "PullRequestEvent" => EventKind::PullRequest,
            "IssuesEvent" => EventKind::Issues,
            "IssueCommentEvent" => EventKind::IssueComment,
            "CreateEvent" => EventKind::Create,
            "DeleteEvent" => EventKind::Delete,
            "ForkEvent" => EventKind::Fork,
            "WatchEvent" => EventKind::Watch,
            "ReleaseEvent" => EventKind::Release,
            "PullRequestReviewEvent" => EventKind::PullRequestReview,
            "PullRequestReviewCommentEvent" => EventKind::PullRequestReviewComment,
            other => EventKind::Unknown(other.to_string()),
        }
    }

    /// The upstream type tag this kind corresponds to.
    pub fn tag(&self) -> &str {
        match self {
            EventKind::Push => "PushEvent",
            EventKind::PullRequest => "PullRequestEvent",
            EventKind::Issues => "IssuesEvent",
            EventKind::IssueComment => "IssueCommentEvent",
            EventKind::Create => "CreateEvent",
            EventKind::Delete => "DeleteEvent",
            EventKind::Fork => "ForkEvent",
            EventKind::Watch => "WatchEvent",
            EventKind::Release => "ReleaseEvent",
            EventKind::PullRequestReview => "PullRequestReviewEvent",
            EventKind::PullRequestReviewComment => "PullRequestReviewCommentEvent",
            EventKind::Unknown(tag) => tag,
        }
    }

    /// Lowercased tag with the "Event" suffix stripped.
    ///
    /// Used as the fallback action and in fallback descriptions
    /// ("gollum on owner/repo").
    pub fn short_name(&self) -> String {
        let tag = self.tag();
        tag.strip_suffix("Event").unwrap_or(tag).to_lowercase()
    }
}

impl From<String> for EventKind {
    fn from(tag: String) -> Self {
        EventKind::from_tag(&tag)
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        kind.tag().to_string()
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

// ============================================
// Canonical activities
// ============================================

/// Type-specific fields extracted from an event payload.
///
/// All fields are optional: a malformed payload degrades to partial
/// extraction, never to a failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityDetails {
    /// Branch a push landed on ("refs/heads/" prefix already stripped)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Number of commits in a push
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_count: Option<u64>,
    /// Commit messages in a push
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commit_messages: Vec<String>,
    /// Commit SHAs in a push (natural keys for pseudo-event gating)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commit_shas: Vec<String>,
    /// PR or issue number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<u64>,
    /// PR or issue title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// PR or issue state ("open", "closed")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Whether a closed PR was merged (drives the merged funnel counter)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merged: Option<bool>,
    /// PR or issue author login
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Assignee logins on a PR or issue
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assignees: Vec<String>,
    /// Requested reviewer logins on a PR
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requested_reviewers: Vec<String>,
    /// Label names on a PR or issue
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    /// Truncated comment body (first 100 characters)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_preview: Option<String>,
    /// Logins @-mentioned in a comment body (scanned before truncation)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mentions: Vec<String>,
    /// Created/deleted ref kind ("branch", "tag", "repository")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_type: Option<String>,
    /// Created/deleted ref name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_name: Option<String>,
    /// Full name of the fork created by a ForkEvent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fork_name: Option<String>,
    /// Release tag name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Release display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_name: Option<String>,
    /// Review state ("approved", "changes_requested", ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_state: Option<String>,
    /// Primary language of the repository (from repo scans)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Canonical, normalized representation of one event.
///
/// Created once by the normalizer from exactly one [`RawEvent`]; immutable
/// thereafter. Invariants: `action` and `repo` are always non-empty and
/// `timestamp` is always a valid instant (enforced by the type).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Event id (pseudo-events use a natural-key derived id)
    pub id: String,
    /// Normalized event kind
    pub kind: EventKind,
    /// Normalized verb: pushed/opened/closed/merged/commented/...
    pub action: String,
    /// Login of the user who performed the event
    pub actor: String,
    /// Owning repository full name
    pub repo: String,
    /// When the event happened
    pub timestamp: DateTime<Utc>,
    /// Human-readable one-line description
    pub description: String,
    /// Link to the event target, when the payload carries one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Whether the event is on a public repository
    #[serde(default = "default_public")]
    pub public: bool,
    /// Type-specific extracted fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ActivityDetails>,
}

impl Activity {
    /// Borrow the details, or a static empty value when absent.
    ///
    /// Keeps aggregation code total: a missing `details` degrades that
    /// metric contribution to zero instead of aborting the pass.
    pub fn details(&self) -> &ActivityDetails {
        static EMPTY: ActivityDetails = ActivityDetails {
            branch: None,
            commit_count: None,
            commit_messages: Vec::new(),
            commit_shas: Vec::new(),
            number: None,
            title: None,
            state: None,
            merged: None,
            author: None,
            assignees: Vec::new(),
            requested_reviewers: Vec::new(),
            labels: Vec::new(),
            comment_preview: None,
            mentions: Vec::new(),
            ref_type: None,
            ref_name: None,
            fork_name: None,
            tag: None,
            release_name: None,
            review_state: None,
            language: None,
        };
        self.details.as_ref().unwrap_or(&EMPTY)
    }
}

// ============================================
// Filter options
// ============================================

/// Date range for the narrowing stage of [`FilterOptions`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateRange {
    /// Since local midnight (UTC)
    Today,
    /// Trailing 7 days
    Last7Days,
    /// Trailing 30 days
    Last30Days,
    /// Trailing 90 days
    Last90Days,
    /// Trailing 365 days
    Year,
    /// No date restriction
    #[default]
    All,
    /// Explicit inclusive start / exclusive end
    Between {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl DateRange {
    /// Resolve to concrete inclusive-start / exclusive-end bounds.
    pub fn bounds(&self, now: DateTime<Utc>) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        let days_back = |days: i64| Some(now - chrono::Duration::days(days));
        match self {
            DateRange::Today => {
                let midnight = now
                    .date_naive()
                    .and_hms_opt(0, 0, 0)
                    .map(|dt| dt.and_utc());
                (midnight, None)
            }
            DateRange::Last7Days => (days_back(7), None),
            DateRange::Last30Days => (days_back(30), None),
            DateRange::Last90Days => (days_back(90), None),
            DateRange::Year => (days_back(365), None),
            DateRange::All => (None, None),
            DateRange::Between { start, end } => (Some(*start), Some(*end)),
        }
    }
}

/// User-selected narrowing options, applied after relevance filtering.
///
/// Empty sets mean "no restriction". This stage is distinct from the
/// ownership-relevance step, which always applies to non-primary sources
/// regardless of these options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterOptions {
    /// Date window to keep
    #[serde(default)]
    pub date_range: DateRange,
    /// Event type tags to keep (tag or short name, case-insensitive)
    #[serde(default)]
    pub activity_types: HashSet<String>,
    /// Repository full names to keep
    #[serde(default)]
    pub repositories: HashSet<String>,
    /// Free-text search over description, repo, and title
    #[serde(default)]
    pub search_query: Option<String>,
    /// Keep only activities involving this login
    #[serde(default)]
    pub collaborator: Option<String>,
    /// Keep only activities on repositories in this language
    #[serde(default)]
    pub language: Option<String>,
    /// Whether activities on private repositories are kept
    #[serde(default = "default_public")]
    pub show_private: bool,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            date_range: DateRange::All,
            activity_types: HashSet::new(),
            repositories: HashSet::new(),
            search_query: None,
            collaborator: None,
            language: None,
            show_private: true,
        }
    }
}
