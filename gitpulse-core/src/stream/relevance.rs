//! Relevance filtering and user-selected narrowing
//!
//! Two distinct stages:
//!
//! 1. The **relevance filter** is a hard allow-list applied to event sources
//!    not inherently scoped to the tracked user (received and organization
//!    feeds). It is not configurable.
//! 2. **[`FilterOptions`] narrowing** is the later, user-selected stage
//!    (date range, types, repositories, free text, collaborator, language,
//!    private visibility).

use crate::types::{Activity, DateRange, EventKind, FilterOptions};
use chrono::{DateTime, Utc};

/// Whether an activity from a broad feed is relevant to the tracked user.
///
/// Retained if ANY of: the actor is the user; the repository is owned by
/// the user; the event is a comment mentioning `@user`; the event is a
/// PR/issue where the user is the author, an assignee, or (for PRs) a
/// requested reviewer. Everything else — notably stars and forks by other
/// actors on repositories the user does not own — is dropped.
pub fn is_relevant(activity: &Activity, username: &str) -> bool {
    if activity.actor.eq_ignore_ascii_case(username) {
        return true;
    }

    if repo_owner(&activity.repo).is_some_and(|owner| owner.eq_ignore_ascii_case(username)) {
        return true;
    }

    let details = activity.details();

    let is_comment = matches!(
        activity.kind,
        EventKind::IssueComment | EventKind::PullRequestReviewComment
    );
    if is_comment
        && details
            .mentions
            .iter()
            .any(|m| m.eq_ignore_ascii_case(username))
    {
        return true;
    }

    match activity.kind {
        EventKind::PullRequest => {
            involves(details.author.as_deref(), username)
                || contains_login(&details.assignees, username)
                || contains_login(&details.requested_reviewers, username)
        }
        EventKind::Issues => {
            involves(details.author.as_deref(), username)
                || contains_login(&details.assignees, username)
        }
        _ => false,
    }
}

/// Apply the relevance filter to a broad-feed activity sequence.
pub fn filter_received(activities: Vec<Activity>, username: &str) -> Vec<Activity> {
    let before = activities.len();
    let kept: Vec<Activity> = activities
        .into_iter()
        .filter(|a| is_relevant(a, username))
        .collect();

    tracing::debug!(
        username,
        before,
        after = kept.len(),
        "Applied relevance filter"
    );
    kept
}

/// Apply user-selected narrowing options to an activity sequence.
pub fn apply_filters(activities: &[Activity], options: &FilterOptions) -> Vec<Activity> {
    apply_filters_at(activities, options, Utc::now())
}

/// [`apply_filters`] with an explicit `now`, for deterministic date ranges.
pub fn apply_filters_at(
    activities: &[Activity],
    options: &FilterOptions,
    now: DateTime<Utc>,
) -> Vec<Activity> {
    let (start, end) = options.date_range.bounds(now);

    activities
        .iter()
        .filter(|a| matches_options(a, options, start, end))
        .cloned()
        .collect()
}

fn matches_options(
    activity: &Activity,
    options: &FilterOptions,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> bool {
    if start.is_some_and(|s| activity.timestamp < s) {
        return false;
    }
    if end.is_some_and(|e| activity.timestamp >= e) {
        return false;
    }

    if !options.show_private && !activity.public {
        return false;
    }

    if !options.activity_types.is_empty() {
        let tag = activity.kind.tag();
        let short = activity.kind.short_name();
        let matched = options
            .activity_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(tag) || t.eq_ignore_ascii_case(&short));
        if !matched {
            return false;
        }
    }

    if !options.repositories.is_empty() && !options.repositories.contains(&activity.repo) {
        return false;
    }

    let details = activity.details();

    if let Some(query) = options.search_query.as_deref().filter(|q| !q.is_empty()) {
        let query = query.to_lowercase();
        let haystacks = [
            Some(activity.description.as_str()),
            Some(activity.repo.as_str()),
            details.title.as_deref(),
        ];
        if !haystacks
            .iter()
            .flatten()
            .any(|h| h.to_lowercase().contains(&query))
        {
            return false;
        }
    }

    if let Some(collaborator) = options.collaborator.as_deref() {
        let involved = activity.actor.eq_ignore_ascii_case(collaborator)
            || involves(details.author.as_deref(), collaborator)
            || contains_login(&details.assignees, collaborator)
            || contains_login(&details.requested_reviewers, collaborator)
            || contains_login(&details.mentions, collaborator);
        if !involved {
            return false;
        }
    }

    if let Some(language) = options.language.as_deref() {
        let matched = details
            .language
            .as_deref()
            .is_some_and(|l| l.eq_ignore_ascii_case(language));
        if !matched {
            return false;
        }
    }

    true
}

fn repo_owner(repo: &str) -> Option<&str> {
    repo.split_once('/').map(|(owner, _)| owner)
}

fn involves(login: Option<&str>, username: &str) -> bool {
    login.is_some_and(|l| l.eq_ignore_ascii_case(username))
}

fn contains_login(logins: &[String], username: &str) -> bool {
    logins.iter().any(|l| l.eq_ignore_ascii_case(username))
}
