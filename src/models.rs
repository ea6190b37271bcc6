use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RecordError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Neutral, Sentiment::Negative];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Neutral => "Neutral",
            Sentiment::Negative => "Negative",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exact, case-sensitive match on the stored label.
impl FromStr for Sentiment {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(Sentiment::Positive),
            "neutral" => Ok(Sentiment::Neutral),
            "negative" => Ok(Sentiment::Negative),
            other => Err(RecordError::UnknownSentiment(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    pub id: Uuid,
    pub business_id: Uuid,
    pub platform_id: Uuid,
    pub rating: i32,
    pub sentiment: Option<Sentiment>,
    pub sentiment_score: Option<f64>,
    pub reviewed_at: DateTime<Utc>,
    pub has_response: bool,
    pub responded_at: Option<DateTime<Utc>>,
    pub categories: Vec<String>,
    pub author_name: Option<String>,
    pub content: Option<String>,
}

impl ReviewRecord {
    /// Responded for rate and latency purposes: flagged and timestamped.
    pub fn answered_at(&self) -> Option<DateTime<Utc>> {
        if self.has_response {
            self.responded_at
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformRecord {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_reviews: usize,
    pub responded_reviews: usize,
    pub response_rate: i64,
    pub avg_rating: f64,
    pub pending_reviews: usize,
    pub weekly_change: i64,
    pub ai_responses: i64,
    pub connected_platforms: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub month: String,
    pub year: i32,
    pub reviews: usize,
    pub responses: usize,
    pub avg_rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentSlice {
    pub sentiment: Sentiment,
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformPerformance {
    pub platform_id: Uuid,
    pub name: String,
    pub slug: String,
    pub icon: String,
    pub reviews: usize,
    pub response_rate: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryShare {
    pub category: String,
    pub count: usize,
    pub share: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseTime {
    pub median_hours: Option<i64>,
    pub same_day_percent: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOverview {
    pub stats: DashboardStats,
    pub review_trend: Vec<TrendPoint>,
    pub sentiment_breakdown: Vec<SentimentSlice>,
    pub platform_performance: Vec<PlatformPerformance>,
    pub category_breakdown: Vec<CategoryShare>,
    pub latest_reviews: Vec<ReviewRecord>,
    pub response_time: ResponseTime,
}
