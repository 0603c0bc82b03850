//! Event normalization
//!
//! Maps one [`RawEvent`] into one [`Activity`], branching on the event's
//! type tag. Normalization is a pure, total function: unrecognized types
//! fall back to a generic description, and malformed payloads degrade to
//! partial detail extraction. It never fails.

use crate::types::{Activity, ActivityDetails, EventKind, RawEvent};
use serde_json::Value;

/// How many characters of a comment body the preview keeps.
const COMMENT_PREVIEW_CHARS: usize = 100;

/// Normalize one raw event into one canonical activity.
pub fn normalize(event: &RawEvent) -> Activity {
    let kind = EventKind::from_tag(&event.kind);
    let repo = event.repo.name.clone();
    let payload = &event.payload;

    let (action, description, url, details) = match &kind {
        EventKind::Push => normalize_push(payload, &repo),
        EventKind::PullRequest => normalize_pull_request(payload, &kind),
        EventKind::Issues => normalize_issue(payload, &kind),
        EventKind::IssueComment => normalize_issue_comment(payload),
        EventKind::Create => normalize_ref_change(payload, "created", &repo),
        EventKind::Delete => normalize_ref_change(payload, "deleted", &repo),
        EventKind::Fork => normalize_fork(payload, &repo),
        EventKind::Watch => ("starred".to_string(), format!("Starred {}", repo), None, None),
        EventKind::Release => normalize_release(payload),
        EventKind::PullRequestReview => normalize_review(payload),
        EventKind::PullRequestReviewComment => normalize_review_comment(payload),
        EventKind::Unknown(_) => {
            let short = kind.short_name();
            (short.clone(), format!("{} on {}", short, repo), None, None)
        }
    };

    Activity {
        id: event.id.clone(),
        kind,
        action,
        actor: event.actor.login.clone(),
        repo,
        timestamp: event.created_at,
        description,
        url,
        public: event.public,
        details,
    }
}

type Normalized = (String, String, Option<String>, Option<ActivityDetails>);

fn normalize_push(payload: &Value, repo: &str) -> Normalized {
    let branch = payload["ref"]
        .as_str()
        .map(|r| r.strip_prefix("refs/heads/").unwrap_or(r).to_string());

    let commits = payload["commits"].as_array();
    let commit_count = payload["size"]
        .as_u64()
        .or_else(|| commits.map(|c| c.len() as u64))
        .unwrap_or(0);

    let commit_messages = commits
        .map(|c| {
            c.iter()
                .filter_map(|commit| commit["message"].as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let commit_shas = commits
        .map(|c| {
            c.iter()
                .filter_map(|commit| commit["sha"].as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let plural = if commit_count == 1 { "" } else { "s" };
    let description = match &branch {
        Some(branch) => format!("Pushed {} commit{} to {} in {}", commit_count, plural, branch, repo),
        None => format!("Pushed {} commit{} to {}", commit_count, plural, repo),
    };

    let details = ActivityDetails {
        branch,
        commit_count: Some(commit_count),
        commit_messages,
        commit_shas,
        ..Default::default()
    };

    ("pushed".to_string(), description, None, Some(details))
}

fn normalize_pull_request(payload: &Value, kind: &EventKind) -> Normalized {
    let pr = &payload["pull_request"];
    let action = payload_action(payload, kind);
    let number = pr["number"].as_u64();
    let title = pr["title"].as_str().map(str::to_string);

    let description = format!(
        "{} pull request #{}: {}",
        capitalize(&action),
        number.unwrap_or(0),
        title.as_deref().unwrap_or("(untitled)")
    );

    let details = ActivityDetails {
        number,
        title,
        state: pr["state"].as_str().map(str::to_string),
        merged: pr["merged"].as_bool(),
        author: pr["user"]["login"].as_str().map(str::to_string),
        assignees: login_list(&pr["assignees"]),
        requested_reviewers: login_list(&pr["requested_reviewers"]),
        labels: name_list(&pr["labels"]),
        ..Default::default()
    };

    (action, description, url_of(pr), Some(details))
}

fn normalize_issue(payload: &Value, kind: &EventKind) -> Normalized {
    let issue = &payload["issue"];
    let action = payload_action(payload, kind);
    let number = issue["number"].as_u64();
    let title = issue["title"].as_str().map(str::to_string);

    let description = format!(
        "{} issue #{}: {}",
        capitalize(&action),
        number.unwrap_or(0),
        title.as_deref().unwrap_or("(untitled)")
    );

    let details = ActivityDetails {
        number,
        title,
        state: issue["state"].as_str().map(str::to_string),
        author: issue["user"]["login"].as_str().map(str::to_string),
        assignees: login_list(&issue["assignees"]),
        labels: name_list(&issue["labels"]),
        ..Default::default()
    };

    (action, description, url_of(issue), Some(details))
}

fn normalize_issue_comment(payload: &Value) -> Normalized {
    let issue = &payload["issue"];
    let number = issue["number"].as_u64();
    let title = issue["title"].as_str().map(str::to_string);
    let body = payload["comment"]["body"].as_str().unwrap_or("");

    let description = format!(
        "Commented on issue #{}: {}",
        number.unwrap_or(0),
        title.as_deref().unwrap_or("(untitled)")
    );

    let details = ActivityDetails {
        number,
        title,
        // Mentions are scanned over the full body before truncation so the
        // relevance filter still sees mentions past the preview cutoff.
        mentions: scan_mentions(body),
        comment_preview: Some(preview(body)),
        ..Default::default()
    };

    ("commented".to_string(), description, url_of(&payload["comment"]), Some(details))
}

fn normalize_ref_change(payload: &Value, action: &str, repo: &str) -> Normalized {
    let ref_type = payload["ref_type"].as_str().map(str::to_string);
    let ref_name = payload["ref"].as_str().map(str::to_string);

    let description = match (&ref_type, &ref_name) {
        (Some(ref_type), Some(ref_name)) => {
            format!("{} {} {}", capitalize(action), ref_type, ref_name)
        }
        (Some(ref_type), None) => format!("{} {} {}", capitalize(action), ref_type, repo),
        _ => format!("{} {}", capitalize(action), repo),
    };

    let details = ActivityDetails {
        ref_type,
        ref_name,
        ..Default::default()
    };

    (action.to_string(), description, None, Some(details))
}

fn normalize_fork(payload: &Value, repo: &str) -> Normalized {
    let forkee = &payload["forkee"];
    let fork_name = forkee["full_name"].as_str().map(str::to_string);

    let description = match &fork_name {
        Some(name) => format!("Forked {} to {}", repo, name),
        None => format!("Forked {}", repo),
    };

    let details = ActivityDetails {
        fork_name,
        ..Default::default()
    };

    ("forked".to_string(), description, url_of(forkee), Some(details))
}

fn normalize_release(payload: &Value) -> Normalized {
    let release = &payload["release"];
    let raw_action = payload["action"].as_str().unwrap_or("published");
    let tag = release["tag_name"].as_str().map(str::to_string);
    let name = release["name"].as_str().map(str::to_string);

    let description = format!(
        "{} release {}: {}",
        capitalize(raw_action),
        tag.as_deref().unwrap_or("(untagged)"),
        name.as_deref().or(tag.as_deref()).unwrap_or("(unnamed)")
    );

    let details = ActivityDetails {
        tag,
        release_name: name,
        ..Default::default()
    };

    ("released".to_string(), description, url_of(release), Some(details))
}

fn normalize_review(payload: &Value) -> Normalized {
    let pr = &payload["pull_request"];
    let review = &payload["review"];
    let number = pr["number"].as_u64();

    let description = format!(
        "Reviewed pull request #{}: {}",
        number.unwrap_or(0),
        pr["title"].as_str().unwrap_or("(untitled)")
    );

    let details = ActivityDetails {
        number,
        title: pr["title"].as_str().map(str::to_string),
        review_state: review["state"].as_str().map(str::to_string),
        author: pr["user"]["login"].as_str().map(str::to_string),
        ..Default::default()
    };

    ("reviewed".to_string(), description, url_of(review), Some(details))
}

fn normalize_review_comment(payload: &Value) -> Normalized {
    let pr = &payload["pull_request"];
    let number = pr["number"].as_u64();
    let body = payload["comment"]["body"].as_str().unwrap_or("");

    let description = format!(
        "Commented on a review of pull request #{}",
        number.unwrap_or(0)
    );

    let details = ActivityDetails {
        number,
        title: pr["title"].as_str().map(str::to_string),
        mentions: scan_mentions(body),
        comment_preview: Some(preview(body)),
        ..Default::default()
    };

    (
        "review_commented".to_string(),
        description,
        url_of(&payload["comment"]),
        Some(details),
    )
}

/// The raw payload action string, falling back to the kind's short name so
/// the `action` invariant (non-empty) holds for malformed payloads.
fn payload_action(payload: &Value, kind: &EventKind) -> String {
    payload["action"]
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| kind.short_name())
}

fn url_of(value: &Value) -> Option<String> {
    value["html_url"].as_str().map(str::to_string)
}

fn login_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["login"].as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn name_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["name"].as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// First 100 characters of a comment body.
fn preview(body: &str) -> String {
    body.chars().take(COMMENT_PREVIEW_CHARS).collect()
}

/// Collect `@login` mentions from a comment body.
///
/// An `@` embedded in a word (email addresses) does not start a mention.
fn scan_mentions(body: &str) -> Vec<String> {
    let mut mentions = Vec::new();
    let mut prev: Option<char> = None;

    for (i, c) in body.char_indices() {
        let preceded_by_word = prev.is_some_and(|p| p.is_ascii_alphanumeric());
        prev = Some(c);
        if c != '@' || preceded_by_word {
            continue;
        }
        let rest = &body[i + 1..];
        let end = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
            .unwrap_or(rest.len());
        if end > 0 {
            let login = &rest[..end];
            if !mentions.iter().any(|m| m == login) {
                mentions.push(login.to_string());
            }
        }
    }

    mentions
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
