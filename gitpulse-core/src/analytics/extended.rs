//! Extended activity statistics
//!
//! Everything the basic [`Summary`] does not carry: independent trailing
//! time windows, streaks, hourly/daily histograms, weekly/monthly trend
//! series, top-N rankings, and label/mention counts. The extended metrics
//! are computed over the entire supplied activity sequence; only the
//! embedded basic summary is window-bounded.

use super::summary::{summarize_at, RankedEntry, Summary};
use crate::config::FetchConfig;
use crate::types::Activity;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Knobs for extended summary computation.
#[derive(Debug, Clone, Copy)]
pub struct ExtendedOptions {
    /// Trailing window for the embedded basic summary, in days
    pub window_days: i64,
    /// How many recent activities the embedded summary carries
    pub recent_limit: usize,
    /// Ranking size for the embedded summary's top repositories
    pub summary_top_n: usize,
    /// Ranking size for top repositories/collaborators/languages
    pub top_n: usize,
}

impl Default for ExtendedOptions {
    fn default() -> Self {
        Self {
            window_days: 7,
            recent_limit: 5,
            summary_top_n: 5,
            top_n: 15,
        }
    }
}

impl From<&FetchConfig> for ExtendedOptions {
    fn from(config: &FetchConfig) -> Self {
        Self {
            window_days: config.window_days,
            recent_limit: config.recent_limit,
            summary_top_n: config.top_n,
            top_n: config.extended_top_n,
        }
    }
}

/// Consecutive-day activity streaks.
///
/// The current streak walks backward from today and never breaks on today
/// having zero activity; it breaks on the first zero-activity day strictly
/// before yesterday. The longest streak is the maximum run over the full
/// history scanned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakStats {
    pub current_days: u32,
    pub longest_days: u32,
    /// Total distinct days with at least one activity
    pub active_days: u32,
}

/// One point of a weekly or monthly trend series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// "2024-W05" for weeks, "2024-01" for months
    pub label: String,
    pub count: u64,
}

/// Extended statistical summary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtendedSummary {
    /// The window-bounded basic summary
    pub summary: Summary,

    /// Independent trailing counts evaluated against `now` (not nested
    /// subsets of the primary window)
    pub last_24h: u64,
    pub last_7d: u64,
    pub last_30d: u64,

    /// Streak metrics over the full scanned history
    pub streak: StreakStats,

    /// Activity count by hour of day (UTC, 0-23)
    pub hourly_histogram: [u64; 24],
    /// Activity count by day of week (0=Sunday, 6=Saturday)
    pub daily_histogram: [u64; 7],
    /// Argmax of the hourly histogram
    pub most_productive_hour: u8,
    /// Argmax of the daily histogram (0=Sunday)
    pub most_productive_day: u8,

    /// Activity counts for the last 12 ISO weeks, oldest first
    pub weekly_trend: Vec<TrendPoint>,
    /// Activity counts for the last 6 calendar months, oldest first
    pub monthly_trend: Vec<TrendPoint>,

    /// Top repositories by activity count, first-seen tie-break
    pub top_repositories: Vec<RankedEntry>,
    /// Top collaborators (logins other than the tracked user)
    pub top_collaborators: Vec<RankedEntry>,
    /// Top repository languages
    pub top_languages: Vec<RankedEntry>,

    /// Count per label name across PR/issue activities
    pub label_counts: BTreeMap<String, u64>,
    /// Total `@login` mentions across comment activities
    pub mention_count: u64,
}

/// Compute the extended summary for the tracked user.
pub fn summarize_extended(
    activities: &[Activity],
    username: &str,
    options: ExtendedOptions,
) -> ExtendedSummary {
    summarize_extended_at(activities, username, options, Utc::now())
}

/// [`summarize_extended`] with an explicit `now`, for determinism.
pub fn summarize_extended_at(
    activities: &[Activity],
    username: &str,
    options: ExtendedOptions,
    now: DateTime<Utc>,
) -> ExtendedSummary {
    let mut extended = ExtendedSummary {
        summary: summarize_at(
            activities,
            options.window_days,
            options.recent_limit,
            options.summary_top_n,
            now,
        ),
        ..Default::default()
    };

    let mut active_dates: HashSet<NaiveDate> = HashSet::new();
    let mut week_counts: HashMap<(i32, u32), u64> = HashMap::new();
    let mut month_counts: HashMap<(i32, u32), u64> = HashMap::new();
    let mut repos = Ranking::new();
    let mut collaborators = Ranking::new();
    let mut languages = Ranking::new();

    for activity in activities {
        let ts = activity.timestamp;
        if ts > now {
            continue;
        }

        for (window, hours) in [
            (&mut extended.last_24h, 24),
            (&mut extended.last_7d, 24 * 7),
            (&mut extended.last_30d, 24 * 30),
        ] {
            if ts >= now - Duration::hours(hours) {
                *window += 1;
            }
        }

        let date = ts.date_naive();
        active_dates.insert(date);
        let iso = date.iso_week();
        *week_counts.entry((iso.year(), iso.week())).or_insert(0) += 1;
        *month_counts.entry((date.year(), date.month())).or_insert(0) += 1;

        extended.hourly_histogram[ts.hour() as usize] += 1;
        extended.daily_histogram[ts.weekday().num_days_from_sunday() as usize] += 1;

        repos.add(&activity.repo);

        let details = activity.details();
        for login in collaborator_logins(activity, username) {
            collaborators.add(&login);
        }
        if let Some(language) = details.language.as_deref() {
            languages.add(language);
        }
        for label in &details.labels {
            *extended.label_counts.entry(label.clone()).or_insert(0) += 1;
        }
        extended.mention_count += details.mentions.len() as u64;
    }

    extended.streak = compute_streaks(&active_dates, now.date_naive());

    extended.most_productive_hour = argmax(&extended.hourly_histogram) as u8;
    extended.most_productive_day = argmax(&extended.daily_histogram) as u8;

    extended.weekly_trend = weekly_series(&week_counts, now);
    extended.monthly_trend = monthly_series(&month_counts, now);

    extended.top_repositories = repos.into_top(options.top_n);
    extended.top_collaborators = collaborators.into_top(options.top_n);
    extended.top_languages = languages.into_top(options.top_n);

    extended
}

/// Logins involved in an activity other than the tracked user, counted
/// once per activity.
fn collaborator_logins(activity: &Activity, username: &str) -> Vec<String> {
    let details = activity.details();
    let mut seen: Vec<String> = Vec::new();

    let candidates = std::iter::once(activity.actor.as_str())
        .chain(details.author.as_deref())
        .chain(details.assignees.iter().map(String::as_str))
        .chain(details.requested_reviewers.iter().map(String::as_str))
        .chain(details.mentions.iter().map(String::as_str));

    for login in candidates {
        if login.eq_ignore_ascii_case(username) {
            continue;
        }
        if !seen.iter().any(|s| s.eq_ignore_ascii_case(login)) {
            seen.push(login.to_string());
        }
    }
    seen
}

fn compute_streaks(active_dates: &HashSet<NaiveDate>, today: NaiveDate) -> StreakStats {
    // Anchor at today when active, else at yesterday: an empty today is
    // the current edge of the streak, not a gap.
    let mut day = if active_dates.contains(&today) {
        today
    } else {
        today - Duration::days(1)
    };

    let mut current_days = 0u32;
    while active_dates.contains(&day) {
        current_days += 1;
        day = day - Duration::days(1);
    }

    let mut sorted: Vec<NaiveDate> = active_dates.iter().copied().collect();
    sorted.sort_unstable();

    let mut longest_days = 0u32;
    let mut run = 0u32;
    let mut prev: Option<NaiveDate> = None;
    for date in &sorted {
        run = match prev {
            Some(prev) if *date - prev == Duration::days(1) => run + 1,
            _ => 1,
        };
        longest_days = longest_days.max(run);
        prev = Some(*date);
    }

    StreakStats {
        current_days,
        longest_days,
        active_days: sorted.len() as u32,
    }
}

fn argmax(histogram: &[u64]) -> usize {
    histogram
        .iter()
        .enumerate()
        .max_by_key(|(_, &count)| count)
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn weekly_series(counts: &HashMap<(i32, u32), u64>, now: DateTime<Utc>) -> Vec<TrendPoint> {
    (0..12)
        .rev()
        .map(|weeks_back| {
            let iso = (now - Duration::weeks(weeks_back))
                .date_naive()
                .iso_week();
            TrendPoint {
                label: format!("{}-W{:02}", iso.year(), iso.week()),
                count: counts.get(&(iso.year(), iso.week())).copied().unwrap_or(0),
            }
        })
        .collect()
}

fn monthly_series(counts: &HashMap<(i32, u32), u64>, now: DateTime<Utc>) -> Vec<TrendPoint> {
    let mut year = now.year();
    let mut month = now.month();
    let mut points = Vec::with_capacity(6);

    for _ in 0..6 {
        points.push(TrendPoint {
            label: format!("{}-{:02}", year, month),
            count: counts.get(&(year, month)).copied().unwrap_or(0),
        });
        if month == 1 {
            year -= 1;
            month = 12;
        } else {
            month -= 1;
        }
    }

    points.reverse();
    points
}

/// Count accumulator preserving first-seen order for tie-breaks.
struct Ranking {
    entries: Vec<RankedEntry>,
    index: HashMap<String, usize>,
}

impl Ranking {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn add(&mut self, name: &str) {
        match self.index.get(name) {
            Some(&slot) => self.entries[slot].count += 1,
            None => {
                self.index.insert(name.to_string(), self.entries.len());
                self.entries.push(RankedEntry {
                    name: name.to_string(),
                    count: 1,
                });
            }
        }
    }

    fn into_top(mut self, n: usize) -> Vec<RankedEntry> {
        // Stable sort: equal counts keep first-seen order.
        self.entries.sort_by(|a, b| b.count.cmp(&a.count));
        self.entries.truncate(n);
        self.entries
    }
}
