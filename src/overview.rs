use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::config::DashboardSettings;
use crate::models::{DashboardOverview, DashboardStats, PlatformRecord, ResponseTime, ReviewRecord};
use crate::rollups::{category_breakdown, platform_performance, sentiment_breakdown};
use crate::stats::{headline_stats, response_time};
use crate::trend::review_trend;

/// Everything the fetch boundary hands to the engine for one set of businesses.
#[derive(Debug, Clone, Default)]
pub struct OverviewInput {
    pub reviews: Vec<ReviewRecord>,
    pub platforms: HashMap<Uuid, PlatformRecord>,
    pub ai_responses: i64,
    pub connected_platforms: i64,
}

impl DashboardOverview {
    /// Zero-shaped overview: fixed-length trend and sentiment, everything else empty.
    pub fn empty(now: DateTime<Utc>, settings: &DashboardSettings) -> Self {
        Self {
            stats: DashboardStats {
                total_reviews: 0,
                responded_reviews: 0,
                response_rate: 0,
                avg_rating: 0.0,
                pending_reviews: 0,
                weekly_change: 0,
                ai_responses: 0,
                connected_platforms: 0,
            },
            review_trend: review_trend(&[], now, settings.trend_months),
            sentiment_breakdown: sentiment_breakdown(&[]),
            platform_performance: Vec::new(),
            category_breakdown: Vec::new(),
            latest_reviews: Vec::new(),
            response_time: ResponseTime {
                median_hours: None,
                same_day_percent: 0,
            },
        }
    }
}

pub fn latest_reviews(reviews: &[ReviewRecord], limit: usize) -> Vec<ReviewRecord> {
    let mut recent: Vec<&ReviewRecord> = reviews.iter().collect();
    recent.sort_by(|a, b| b.reviewed_at.cmp(&a.reviewed_at));
    recent.into_iter().take(limit).cloned().collect()
}

pub fn build_overview(
    input: &OverviewInput,
    now: DateTime<Utc>,
    settings: &DashboardSettings,
) -> DashboardOverview {
    let reviews = input.reviews.as_slice();
    debug!(
        reviews = reviews.len(),
        platforms = input.platforms.len(),
        "building dashboard overview"
    );

    DashboardOverview {
        stats: headline_stats(reviews, now, input.ai_responses, input.connected_platforms),
        review_trend: review_trend(reviews, now, settings.trend_months),
        sentiment_breakdown: sentiment_breakdown(reviews),
        platform_performance: platform_performance(reviews, &input.platforms),
        category_breakdown: category_breakdown(reviews, settings.top_categories),
        latest_reviews: latest_reviews(reviews, settings.latest_reviews),
        response_time: response_time(reviews, settings.same_day_hours),
    }
}

/// Short-circuits to the zero-shaped overview when the caller owns no businesses.
pub fn overview_for_businesses(
    business_ids: &[Uuid],
    input: Option<&OverviewInput>,
    now: DateTime<Utc>,
    settings: &DashboardSettings,
) -> DashboardOverview {
    match input {
        Some(input) if !business_ids.is_empty() => build_overview(input, now, settings),
        _ => DashboardOverview::empty(now, settings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{fixed_now, responded, review, with_sentiment};
    use crate::models::Sentiment;
    use chrono::Duration;

    #[test]
    fn zero_businesses_yield_zero_shaped_overview() {
        let settings = DashboardSettings::default();
        let overview = overview_for_businesses(&[], None, fixed_now(), &settings);

        assert_eq!(overview.stats.total_reviews, 0);
        assert_eq!(overview.stats.responded_reviews, 0);
        assert_eq!(overview.stats.response_rate, 0);
        assert_eq!(overview.stats.avg_rating, 0.0);
        assert_eq!(overview.stats.pending_reviews, 0);
        assert_eq!(overview.stats.weekly_change, 0);
        assert_eq!(overview.stats.ai_responses, 0);
        assert_eq!(overview.stats.connected_platforms, 0);

        assert_eq!(overview.review_trend.len(), 6);
        assert!(overview.review_trend.iter().all(|p| p.reviews == 0 && p.avg_rating == 0.0));

        let sentiment: Vec<(Sentiment, usize)> = overview
            .sentiment_breakdown
            .iter()
            .map(|s| (s.sentiment, s.count))
            .collect();
        assert_eq!(
            sentiment,
            vec![
                (Sentiment::Positive, 0),
                (Sentiment::Neutral, 0),
                (Sentiment::Negative, 0),
            ]
        );

        assert!(overview.platform_performance.is_empty());
        assert!(overview.category_breakdown.is_empty());
        assert!(overview.latest_reviews.is_empty());
        assert_eq!(overview.response_time.median_hours, None);
        assert_eq!(overview.response_time.same_day_percent, 0);
    }

    #[test]
    fn empty_input_matches_empty_overview() {
        let settings = DashboardSettings::default();
        let built = build_overview(&OverviewInput::default(), fixed_now(), &settings);
        assert_eq!(built, DashboardOverview::empty(fixed_now(), &settings));
    }

    #[test]
    fn single_responded_review() {
        let now = fixed_now();
        let record = responded(
            with_sentiment(review(now - Duration::days(3), 5), Sentiment::Positive),
            Duration::hours(2),
        );
        let input = OverviewInput {
            reviews: vec![record],
            ..OverviewInput::default()
        };

        let overview = build_overview(&input, now, &DashboardSettings::default());
        assert_eq!(overview.stats.avg_rating, 5.0);
        assert_eq!(overview.stats.response_rate, 100);
        let counts: Vec<usize> = overview.sentiment_breakdown.iter().map(|s| s.count).collect();
        assert_eq!(counts, vec![1, 0, 0]);
        assert_eq!(overview.response_time.median_hours, Some(2));
        assert_eq!(overview.response_time.same_day_percent, 100);
        assert_eq!(overview.platform_performance.len(), 1);
    }

    #[test]
    fn ten_unanswered_reviews() {
        let now = fixed_now();
        let reviews: Vec<ReviewRecord> = (0..10)
            .map(|i| {
                let sentiment = if i % 2 == 0 {
                    Sentiment::Positive
                } else {
                    Sentiment::Negative
                };
                with_sentiment(review(now - Duration::days(i + 1), 3), sentiment)
            })
            .collect();
        let input = OverviewInput {
            reviews,
            ..OverviewInput::default()
        };

        let overview = build_overview(&input, now, &DashboardSettings::default());
        assert_eq!(overview.stats.response_rate, 0);
        assert_eq!(overview.stats.pending_reviews, 10);
        assert_eq!(overview.response_time.median_hours, None);
        let counts: Vec<usize> = overview.sentiment_breakdown.iter().map(|s| s.count).collect();
        assert_eq!(counts, vec![5, 0, 5]);
    }

    #[test]
    fn latest_reviews_are_newest_first_and_capped() {
        let now = fixed_now();
        let reviews: Vec<ReviewRecord> = (0..8)
            .map(|i| review(now - Duration::hours(i * 5), 4))
            .rev()
            .collect();

        let latest = latest_reviews(&reviews, 5);
        assert_eq!(latest.len(), 5);
        assert_eq!(latest[0].reviewed_at, now);
        assert!(latest.windows(2).all(|pair| pair[0].reviewed_at >= pair[1].reviewed_at));
    }

    #[test]
    fn identical_input_serializes_identically() {
        let now = fixed_now();
        let mut tagged = review(now - Duration::days(40), 2);
        tagged.categories = vec!["wait time".to_string(), "staff".to_string()];
        let input = OverviewInput {
            reviews: vec![
                responded(review(now - Duration::days(1), 4), Duration::hours(30)),
                tagged,
                review(now - Duration::days(9), 5),
            ],
            platforms: HashMap::new(),
            ai_responses: 1,
            connected_platforms: 3,
        };
        let settings = DashboardSettings::default();

        let first = serde_json::to_string(&build_overview(&input, now, &settings)).unwrap();
        let second = serde_json::to_string(&build_overview(&input, now, &settings)).unwrap();
        assert_eq!(first, second);
        assert!(first.contains("\"reviewTrend\""));
        assert!(first.contains("\"medianHours\":30"));
    }
}
