use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use crate::models::{DashboardStats, ResponseTime, ReviewRecord};

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Rounds halves towards positive infinity, so `-12.5` becomes `-12`.
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

pub fn round2(value: f64) -> f64 {
    round_half_up(value * 100.0) / 100.0
}

/// Whole-number percentage of `part` over `whole`, zero when `whole` is zero.
pub fn percent(part: usize, whole: usize) -> i64 {
    if whole == 0 {
        0
    } else {
        round_half_up(part as f64 / whole as f64 * 100.0) as i64
    }
}

pub fn average_rating<'a>(reviews: impl IntoIterator<Item = &'a ReviewRecord>) -> f64 {
    let (count, total) = reviews
        .into_iter()
        .fold((0usize, 0i64), |(count, total), review| {
            (count + 1, total + review.rating as i64)
        });

    if count == 0 {
        0.0
    } else {
        round2(total as f64 / count as f64)
    }
}

pub fn headline_stats(
    reviews: &[ReviewRecord],
    now: DateTime<Utc>,
    ai_responses: i64,
    connected_platforms: i64,
) -> DashboardStats {
    let total = reviews.len();
    let responded = reviews
        .iter()
        .filter(|review| review.answered_at().is_some())
        .count();

    DashboardStats {
        total_reviews: total,
        responded_reviews: responded,
        response_rate: percent(responded, total),
        avg_rating: average_rating(reviews),
        pending_reviews: total - responded,
        weekly_change: weekly_change(reviews, now),
        ai_responses,
        connected_platforms,
    }
}

/// Compares `[now-7d, now)` against `[now-14d, now-7d)`.
///
/// The result is unbounded: a jump from 1 to 9 reviews reads as `800`.
pub fn weekly_change(reviews: &[ReviewRecord], now: DateTime<Utc>) -> i64 {
    let week_ago = now - Duration::days(7);
    let two_weeks_ago = now - Duration::days(14);

    let current = reviews
        .iter()
        .filter(|review| review.reviewed_at >= week_ago && review.reviewed_at < now)
        .count();
    let previous = reviews
        .iter()
        .filter(|review| review.reviewed_at >= two_weeks_ago && review.reviewed_at < week_ago)
        .count();

    if previous == 0 {
        return if current > 0 { 100 } else { 0 };
    }

    round_half_up((current as f64 - previous as f64) / previous as f64 * 100.0) as i64
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Latency in milliseconds for every responded review. Replies stamped
/// before the review itself are clamped to zero.
pub fn response_latencies(reviews: &[ReviewRecord]) -> Vec<i64> {
    let mut clamped = 0usize;
    let latencies: Vec<i64> = reviews
        .iter()
        .filter_map(|review| {
            let responded_at = review.answered_at()?;
            let latency = (responded_at - review.reviewed_at).num_milliseconds();
            if latency < 0 {
                clamped += 1;
                Some(0)
            } else {
                Some(latency)
            }
        })
        .collect();

    if clamped > 0 {
        warn!("{clamped} reviews have a response recorded before the review; latency clamped to zero");
    }

    latencies
}

pub fn response_time(reviews: &[ReviewRecord], same_day_hours: i64) -> ResponseTime {
    let latencies = response_latencies(reviews);
    let as_ms: Vec<f64> = latencies.iter().map(|ms| *ms as f64).collect();

    let median_hours = median(&as_ms).map(|ms| round_half_up(ms / MS_PER_HOUR) as i64);

    let same_day_limit = Duration::hours(same_day_hours).num_milliseconds();
    let same_day = latencies
        .iter()
        .filter(|latency| **latency <= same_day_limit)
        .count();

    ResponseTime {
        median_hours,
        same_day_percent: percent(same_day, latencies.len()),
    }
}
