//! Sentiment, category and platform rollups.

use std::collections::HashMap;

use uuid::Uuid;

use crate::models::{
    CategoryShare, PlatformPerformance, PlatformRecord, ReviewRecord, Sentiment, SentimentSlice,
};
use crate::stats::percent;

pub const UNKNOWN_PLATFORM_NAME: &str = "Unknown Platform";
pub const UNKNOWN_PLATFORM_SLUG: &str = "default";

const DEFAULT_PLATFORM_ICON: &str = "💬";

pub fn platform_icon(slug: &str) -> &'static str {
    match slug {
        "google" => "🔍",
        "yelp" => "⭐",
        "facebook" => "📘",
        "tripadvisor" => "🦉",
        "trustpilot" => "✅",
        "amazon" => "📦",
        "booking" => "🏨",
        _ => DEFAULT_PLATFORM_ICON,
    }
}

/// Always three slices, positive first. Unanalyzed reviews count nowhere.
pub fn sentiment_breakdown(reviews: &[ReviewRecord]) -> Vec<SentimentSlice> {
    Sentiment::ALL
        .iter()
        .map(|sentiment| SentimentSlice {
            sentiment: *sentiment,
            label: sentiment.label().to_string(),
            count: reviews
                .iter()
                .filter(|review| review.sentiment == Some(*sentiment))
                .count(),
        })
        .collect()
}

/// Counts every category mention, keeping first-encountered order for ties.
pub fn category_breakdown(reviews: &[ReviewRecord], limit: usize) -> Vec<CategoryShare> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(&str, usize)> = Vec::new();

    for category in reviews.iter().flat_map(|review| review.categories.iter()) {
        let index = *positions.entry(category.as_str()).or_insert_with(|| {
            counts.push((category.as_str(), 0));
            counts.len() - 1
        });
        counts[index].1 += 1;
    }

    // sort_by is stable, so equal counts keep insertion order.
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    counts
        .into_iter()
        .take(limit)
        .map(|(category, count)| CategoryShare {
            category: category.to_string(),
            count,
            share: percent(count, reviews.len()),
        })
        .collect()
}

pub fn platform_performance(
    reviews: &[ReviewRecord],
    platforms: &HashMap<Uuid, PlatformRecord>,
) -> Vec<PlatformPerformance> {
    let mut positions: HashMap<Uuid, usize> = HashMap::new();
    let mut groups: Vec<(Uuid, usize, usize)> = Vec::new();

    for review in reviews {
        let index = *positions.entry(review.platform_id).or_insert_with(|| {
            groups.push((review.platform_id, 0, 0));
            groups.len() - 1
        });
        let group = &mut groups[index];
        group.1 += 1;
        if review.has_response {
            group.2 += 1;
        }
    }

    let mut performance: Vec<PlatformPerformance> = groups
        .into_iter()
        .map(|(platform_id, count, responded)| {
            let (name, slug) = match platforms.get(&platform_id) {
                Some(platform) => (platform.name.clone(), platform.slug.clone()),
                None => (
                    UNKNOWN_PLATFORM_NAME.to_string(),
                    UNKNOWN_PLATFORM_SLUG.to_string(),
                ),
            };

            PlatformPerformance {
                platform_id,
                icon: platform_icon(&slug).to_string(),
                name,
                slug,
                reviews: count,
                response_rate: percent(responded, count),
            }
        })
        .collect();

    performance.sort_by(|a, b| b.reviews.cmp(&a.reviews));
    performance
}
