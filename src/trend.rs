use chrono::{DateTime, Datelike, Utc};

use crate::models::{ReviewRecord, TrendPoint};
use crate::stats::average_rating;

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// A UTC calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthBucket {
    pub year: i32,
    pub month: u32,
}

impl MonthBucket {
    pub fn of(at: DateTime<Utc>) -> Self {
        Self {
            year: at.year(),
            month: at.month(),
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at.year() == self.year && at.month() == self.month
    }

    pub fn label(&self) -> &'static str {
        MONTH_LABELS[(self.month - 1) as usize]
    }
}

/// `count` contiguous months ending with the month of `now`, oldest first.
pub fn month_buckets(now: DateTime<Utc>, count: usize) -> Vec<MonthBucket> {
    let current = MonthBucket::of(now);
    let current_index = current.year as i64 * 12 + (current.month as i64 - 1);

    (0..count as i64)
        .rev()
        .map(|offset| {
            let index = current_index - offset;
            MonthBucket {
                year: index.div_euclid(12) as i32,
                month: index.rem_euclid(12) as u32 + 1,
            }
        })
        .collect()
}

pub fn review_trend(reviews: &[ReviewRecord], now: DateTime<Utc>, months: usize) -> Vec<TrendPoint> {
    month_buckets(now, months)
        .into_iter()
        .map(|bucket| {
            let in_month: Vec<&ReviewRecord> = reviews
                .iter()
                .filter(|review| bucket.contains(review.reviewed_at))
                .collect();

            TrendPoint {
                month: bucket.label().to_string(),
                year: bucket.year,
                reviews: in_month.len(),
                responses: in_month.iter().filter(|review| review.has_response).count(),
                avg_rating: average_rating(in_month.iter().copied()),
            }
        })
        .collect()
}
