use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::models::DashboardOverview;

fn signed(value: i64) -> String {
    if value > 0 {
        format!("+{value}")
    } else {
        value.to_string()
    }
}

pub fn build_report(scope: &str, generated_at: DateTime<Utc>, overview: &DashboardOverview) -> String {
    let mut output = String::new();
    let stats = &overview.stats;

    let _ = writeln!(output, "# Review Dashboard Report");
    let _ = writeln!(
        output,
        "Generated for {} at {}",
        scope,
        generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Headline");
    let _ = writeln!(
        output,
        "- Reviews: {} ({}% this week vs last)",
        stats.total_reviews,
        signed(stats.weekly_change)
    );
    let _ = writeln!(
        output,
        "- Responded: {} ({}%), pending {}",
        stats.responded_reviews, stats.response_rate, stats.pending_reviews
    );
    let _ = writeln!(output, "- Average rating: {:.2}", stats.avg_rating);
    let _ = writeln!(
        output,
        "- AI responses: {}, connected platforms: {}",
        stats.ai_responses, stats.connected_platforms
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Monthly Trend");
    let _ = writeln!(output, "| Month | Reviews | Responses | Avg rating |");
    let _ = writeln!(output, "|---|---|---|---|");
    for point in &overview.review_trend {
        let _ = writeln!(
            output,
            "| {} {} | {} | {} | {:.2} |",
            point.month, point.year, point.reviews, point.responses, point.avg_rating
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Sentiment");
    for slice in &overview.sentiment_breakdown {
        let _ = writeln!(output, "- {}: {}", slice.label, slice.count);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Platforms");
    if overview.platform_performance.is_empty() {
        let _ = writeln!(output, "No platform activity yet.");
    } else {
        for platform in &overview.platform_performance {
            let _ = writeln!(
                output,
                "- {} {}: {} reviews, {}% responded",
                platform.icon, platform.name, platform.reviews, platform.response_rate
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Top Categories");
    if overview.category_breakdown.is_empty() {
        let _ = writeln!(output, "No categories tagged yet.");
    } else {
        for category in &overview.category_breakdown {
            let _ = writeln!(
                output,
                "- {}: {} mentions ({}% of reviews)",
                category.category, category.count, category.share
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Response Time");
    match overview.response_time.median_hours {
        Some(hours) => {
            let _ = writeln!(output, "- Median: {hours}h");
        }
        None => {
            let _ = writeln!(output, "- Median: n/a");
        }
    }
    let _ = writeln!(
        output,
        "- Within a day: {}%",
        overview.response_time.same_day_percent
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Latest Reviews");
    if overview.latest_reviews.is_empty() {
        let _ = writeln!(output, "No reviews recorded yet.");
    } else {
        for review in &overview.latest_reviews {
            let sentiment = review
                .sentiment
                .map(|s| s.label())
                .unwrap_or("Unanalyzed");
            let _ = writeln!(
                output,
                "- {} ({}★, {}) on {}: {}",
                review.author_name.as_deref().unwrap_or("Anonymous"),
                review.rating,
                sentiment,
                review.reviewed_at.format("%Y-%m-%d"),
                review.content.as_deref().unwrap_or("")
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardSettings;
    use crate::models::fixtures::{fixed_now, review};
    use crate::overview::{build_overview, OverviewInput};

    #[test]
    fn empty_overview_renders_placeholders() {
        let overview = DashboardOverview::empty(fixed_now(), &DashboardSettings::default());
        let report = build_report("all businesses", fixed_now(), &overview);

        assert!(report.contains("Generated for all businesses at 2026-10-19 12:00 UTC"));
        assert!(report.contains("| Oct 2026 | 0 | 0 | 0.00 |"));
        assert!(report.contains("| May 2026 | 0 | 0 | 0.00 |"));
        assert!(report.contains("- Neutral: 0"));
        assert!(report.contains("No platform activity yet."));
        assert!(report.contains("- Median: n/a"));
        assert!(report.contains("No reviews recorded yet."));
    }

    #[test]
    fn populated_overview_lists_reviews() {
        let mut record = review(fixed_now(), 4);
        record.author_name = Some("Maya".to_string());
        record.content = Some("Great bread".to_string());
        record.categories = vec!["pastries".to_string()];
        let input = OverviewInput {
            reviews: vec![record],
            ..OverviewInput::default()
        };
        let overview = build_overview(&input, fixed_now(), &DashboardSettings::default());
        let report = build_report("Harbor Street Bakery", fixed_now(), &overview);

        assert!(report.contains("- Maya (4★, Unanalyzed) on 2026-10-19: Great bread"));
        assert!(report.contains("- pastries: 1 mentions (100% of reviews)"));
        assert!(report.contains("Unknown Platform: 1 reviews, 0% responded"));
    }
}
