use std::collections::HashMap;

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use sqlx::{PgPool, Row};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::RecordError;
use crate::models::{PlatformRecord, ReviewRecord, Sentiment};
use crate::overview::OverviewInput;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub const SEED_OWNER_ID: &str = "6a0e3c55-5f7e-4b7e-9a55-0a8c7f6b1d21";

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let owner_id = Uuid::parse_str(SEED_OWNER_ID)?;
    let business_id = Uuid::parse_str("9b1f2c4e-7d3a-4c1b-8e2f-5a6b7c8d9e01")?;

    sqlx::query(
        r#"
        INSERT INTO review_pulse.businesses (id, owner_id, name)
        VALUES ($1, $2, $3)
        ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name
        "#,
    )
    .bind(business_id)
    .bind(owner_id)
    .bind("Harbor Street Bakery")
    .execute(pool)
    .await?;

    let platforms = vec![
        ("2f8a1d3c-1b2e-4f5a-9c8d-7e6f5a4b3c21", "Google", "google"),
        ("5c3e7a9b-2d4f-4a6c-8e1b-3f5a7c9e1b22", "Yelp", "yelp"),
        ("8e1b3d5f-7a9c-4e2a-b4c6-d8e0f2a4c623", "Facebook", "facebook"),
    ];

    let mut platform_ids = HashMap::new();
    for (id, name, slug) in platforms {
        let id = Uuid::parse_str(id)?;
        let platform_id: Uuid = sqlx::query(
            r#"
            INSERT INTO review_pulse.platforms (id, name, slug)
            VALUES ($1, $2, $3)
            ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(slug)
        .fetch_one(pool)
        .await?
        .get("id");

        sqlx::query(
            r#"
            INSERT INTO review_pulse.platform_connections (id, business_id, platform_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (business_id, platform_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(business_id)
        .bind(platform_id)
        .execute(pool)
        .await?;

        platform_ids.insert(slug, platform_id);
    }

    let now = Utc::now();
    let reviews = vec![
        ("seed-001", "google", 5, Some("positive"), 2, Some(3), vec!["service", "pastries"], "Maya R.", "Best croissants in town, staff were lovely."),
        ("seed-002", "google", 4, Some("positive"), 9, Some(20), vec!["pastries"], "Tom B.", "Great bread, a bit of a queue."),
        ("seed-003", "yelp", 2, Some("negative"), 12, Some(50), vec!["wait time", "service"], "Ines K.", "Waited twenty minutes for a coffee."),
        ("seed-004", "yelp", 3, Some("neutral"), 35, None, vec!["price"], "Sam P.", "Nice enough, pricey for the size."),
        ("seed-005", "facebook", 5, Some("positive"), 64, Some(1), vec!["service"], "Lena W.", "Ordered a birthday cake, turned out perfect."),
        ("seed-006", "google", 1, None, 98, None, vec!["wait time"], "Anonymous", "Closed early without notice."),
        ("seed-007", "yelp", 4, Some("positive"), 130, Some(6), vec!["pastries", "price"], "Jo D.", "Cinnamon buns worth the trip."),
    ];

    for (source_key, slug, rating, sentiment, days_ago, response_hours, categories, author, content) in reviews {
        let reviewed_at = now - Duration::days(days_ago);
        let responded_at = response_hours.map(|hours| reviewed_at + Duration::hours(hours));
        let categories: Vec<String> = categories.into_iter().map(String::from).collect();

        sqlx::query(
            r#"
            INSERT INTO review_pulse.reviews
            (id, business_id, platform_id, rating, sentiment, reviewed_at,
             has_response, responded_at, categories, author_name, content, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(business_id)
        .bind(platform_ids.get(slug).copied().context("seed platform missing")?)
        .bind(rating)
        .bind(sentiment)
        .bind(reviewed_at)
        .bind(responded_at.is_some())
        .bind(responded_at)
        .bind(&categories)
        .bind(author)
        .bind(content)
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    sqlx::query(
        r#"
        INSERT INTO review_pulse.ai_responses (id, review_id, body)
        SELECT $1, r.id, 'Thank you for the kind words, we hope to see you again soon!'
        FROM review_pulse.reviews r
        WHERE r.source_key = 'seed-001'
          AND NOT EXISTS (SELECT 1 FROM review_pulse.ai_responses a WHERE a.review_id = r.id)
        "#,
    )
    .bind(Uuid::new_v4())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn fetch_business_ids(pool: &PgPool, owner_id: Uuid) -> anyhow::Result<Vec<Uuid>> {
    let rows = sqlx::query(
        "SELECT id FROM review_pulse.businesses WHERE owner_id = $1 ORDER BY created_at",
    )
    .bind(owner_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|row| row.get("id")).collect())
}

/// Maps a stored sentiment label, treating anything unrecognized as unanalyzed.
fn stored_sentiment(review_id: Uuid, label: Option<String>) -> Option<Sentiment> {
    let label = label?;
    match label.parse::<Sentiment>() {
        Ok(sentiment) => Some(sentiment),
        Err(err) => {
            warn!(%review_id, "{err}; treating review as unanalyzed");
            None
        }
    }
}

pub async fn fetch_reviews(pool: &PgPool, business_ids: &[Uuid]) -> anyhow::Result<Vec<ReviewRecord>> {
    let rows = sqlx::query(
        "SELECT id, business_id, platform_id, rating, sentiment, sentiment_score, reviewed_at, \
         has_response, responded_at, categories, author_name, content \
         FROM review_pulse.reviews \
         WHERE business_id = ANY($1)",
    )
    .bind(business_ids)
    .fetch_all(pool)
    .await?;

    let mut reviews = Vec::with_capacity(rows.len());

    for row in rows {
        let id: Uuid = row.get("id");
        reviews.push(ReviewRecord {
            id,
            business_id: row.get("business_id"),
            platform_id: row.get("platform_id"),
            rating: row.get("rating"),
            sentiment: stored_sentiment(id, row.get("sentiment")),
            sentiment_score: row.get("sentiment_score"),
            reviewed_at: row.get("reviewed_at"),
            has_response: row.get("has_response"),
            responded_at: row.get("responded_at"),
            categories: row.get("categories"),
            author_name: row.get("author_name"),
            content: row.get("content"),
        });
    }

    Ok(reviews)
}

pub async fn fetch_platforms(pool: &PgPool) -> anyhow::Result<HashMap<Uuid, PlatformRecord>> {
    let rows = sqlx::query("SELECT id, name, slug FROM review_pulse.platforms")
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let platform = PlatformRecord {
                id: row.get("id"),
                name: row.get("name"),
                slug: row.get("slug"),
            };
            (platform.id, platform)
        })
        .collect())
}

pub async fn count_ai_responses(pool: &PgPool, business_ids: &[Uuid]) -> anyhow::Result<i64> {
    let count: i64 = sqlx::query(
        "SELECT COUNT(*) AS count FROM review_pulse.ai_responses a \
         JOIN review_pulse.reviews r ON r.id = a.review_id \
         WHERE r.business_id = ANY($1)",
    )
    .bind(business_ids)
    .fetch_one(pool)
    .await?
    .get("count");

    Ok(count)
}

pub async fn count_connected_platforms(pool: &PgPool, business_ids: &[Uuid]) -> anyhow::Result<i64> {
    let count: i64 = sqlx::query(
        "SELECT COUNT(DISTINCT platform_id) AS count FROM review_pulse.platform_connections \
         WHERE business_id = ANY($1)",
    )
    .bind(business_ids)
    .fetch_one(pool)
    .await?
    .get("count");

    Ok(count)
}

pub async fn fetch_overview_input(pool: &PgPool, business_ids: &[Uuid]) -> anyhow::Result<OverviewInput> {
    let (reviews, platforms, ai_responses, connected_platforms) = tokio::try_join!(
        fetch_reviews(pool, business_ids),
        fetch_platforms(pool),
        count_ai_responses(pool, business_ids),
        count_connected_platforms(pool, business_ids),
    )
    .context("failed to load reviews for the dashboard")?;

    debug!(
        businesses = business_ids.len(),
        reviews = reviews.len(),
        "fetched overview input"
    );

    Ok(OverviewInput {
        reviews,
        platforms,
        ai_responses,
        connected_platforms,
    })
}

/// One line of a review export. Categories are `;`-separated.
#[derive(Debug, Deserialize)]
pub struct ReviewCsvRow {
    pub business_id: Uuid,
    pub platform: String,
    pub rating: i32,
    pub sentiment: Option<String>,
    pub reviewed_at: DateTime<Utc>,
    pub has_response: Option<bool>,
    pub responded_at: Option<DateTime<Utc>>,
    pub categories: Option<String>,
    pub author_name: Option<String>,
    pub content: Option<String>,
    pub source_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedReview {
    pub business_id: Uuid,
    pub platform_slug: String,
    pub rating: i32,
    pub sentiment: Option<Sentiment>,
    pub reviewed_at: DateTime<Utc>,
    pub has_response: bool,
    pub responded_at: Option<DateTime<Utc>>,
    pub categories: Vec<String>,
    pub author_name: Option<String>,
    pub content: Option<String>,
    pub source_key: String,
}

impl ReviewCsvRow {
    pub fn validate(self) -> Result<ValidatedReview, RecordError> {
        let has_response = self.has_response.unwrap_or(false);
        if !(1..=5).contains(&self.rating) {
            return Err(RecordError::RatingOutOfRange(self.rating));
        }
        if self.responded_at.is_some() && !has_response {
            return Err(RecordError::ResponseWithoutFlag);
        }

        let sentiment = match self.sentiment.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(label) => Some(label.parse::<Sentiment>()?),
        };

        let categories = self
            .categories
            .unwrap_or_default()
            .split(';')
            .map(str::trim)
            .filter(|category| !category.is_empty())
            .map(String::from)
            .collect();

        Ok(ValidatedReview {
            business_id: self.business_id,
            platform_slug: self.platform.trim().to_lowercase(),
            rating: self.rating,
            sentiment,
            reviewed_at: self.reviewed_at,
            has_response,
            responded_at: self.responded_at,
            categories,
            author_name: self.author_name,
            content: self.content,
            source_key: self
                .source_key
                .unwrap_or_else(|| format!("import-{}", Uuid::new_v4())),
        })
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ImportSummary {
    pub inserted: usize,
    pub duplicates: usize,
    pub rejected: usize,
}

/// Reads every data row, pairing it with its 1-based file line.
///
/// Rows that fail to deserialize or validate come back as `Err` so one bad
/// row never stops the rest of the file.
pub fn read_review_rows<R: std::io::Read>(
    reader: &mut csv::Reader<R>,
) -> anyhow::Result<Vec<(u64, Result<ValidatedReview, RecordError>)>> {
    let headers = reader.headers()?.clone();
    let mut record = csv::StringRecord::new();
    let mut rows = Vec::new();

    while reader.read_record(&mut record)? {
        let line = record.position().map(|position| position.line()).unwrap_or(0);
        let row = record
            .deserialize::<ReviewCsvRow>(Some(&headers))
            .map_err(|err| RecordError::Malformed(err.to_string()))
            .and_then(ReviewCsvRow::validate);
        rows.push((line, row));
    }

    Ok(rows)
}

async fn platform_id_for_slug(pool: &PgPool, slug: &str) -> anyhow::Result<Uuid> {
    let id: Uuid = sqlx::query(
        r#"
        INSERT INTO review_pulse.platforms (id, name, slug)
        VALUES ($1, $2, $2)
        ON CONFLICT (slug) DO UPDATE SET slug = EXCLUDED.slug
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(slug)
    .fetch_one(pool)
    .await?
    .get("id");

    Ok(id)
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<ImportSummary> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut summary = ImportSummary::default();
    let mut platform_ids: HashMap<String, Uuid> = HashMap::new();

    for (line, row) in read_review_rows(&mut reader)? {
        let review = match row {
            Ok(review) => review,
            Err(err) => {
                warn!(line, "skipping review: {err}");
                summary.rejected += 1;
                continue;
            }
        };

        let platform_id = match platform_ids.get(&review.platform_slug) {
            Some(id) => *id,
            None => {
                let id = platform_id_for_slug(pool, &review.platform_slug).await?;
                platform_ids.insert(review.platform_slug.clone(), id);
                id
            }
        };

        let result = sqlx::query(
            r#"
            INSERT INTO review_pulse.reviews
            (id, business_id, platform_id, rating, sentiment, reviewed_at,
             has_response, responded_at, categories, author_name, content, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(review.business_id)
        .bind(platform_id)
        .bind(review.rating)
        .bind(review.sentiment.map(|s| s.as_str()))
        .bind(review.reviewed_at)
        .bind(review.has_response)
        .bind(review.responded_at)
        .bind(&review.categories)
        .bind(&review.author_name)
        .bind(&review.content)
        .bind(&review.source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            summary.inserted += 1;
        } else {
            summary.duplicates += 1;
        }
    }

    info!(
        inserted = summary.inserted,
        duplicates = summary.duplicates,
        rejected = summary.rejected,
        "review import finished"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "business_id,platform,rating,sentiment,reviewed_at,has_response,responded_at,categories,author_name,content,source_key\n";

    fn parse(lines: &str) -> Vec<ReviewCsvRow> {
        let data = format!("{HEADER}{lines}");
        csv::Reader::from_reader(data.as_bytes())
            .deserialize()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn valid_row_is_normalized() {
        let rows = parse(
            "9b1f2c4e-7d3a-4c1b-8e2f-5a6b7c8d9e01,Google,5,positive,2026-10-01T10:00:00Z,true,2026-10-01T12:00:00Z, service ;price;;,Maya,Lovely,row-1\n",
        );
        let review = rows.into_iter().next().unwrap().validate().unwrap();

        assert_eq!(review.platform_slug, "google");
        assert_eq!(review.sentiment, Some(Sentiment::Positive));
        assert_eq!(review.categories, vec!["service", "price"]);
        assert_eq!(review.source_key, "row-1");
        assert!(review.has_response);
    }

    #[test]
    fn empty_optional_fields_are_absent() {
        let rows = parse(
            "9b1f2c4e-7d3a-4c1b-8e2f-5a6b7c8d9e01,yelp,3,,2026-10-01T10:00:00Z,false,,,,,\n",
        );
        let review = rows.into_iter().next().unwrap().validate().unwrap();

        assert_eq!(review.sentiment, None);
        assert_eq!(review.responded_at, None);
        assert!(review.categories.is_empty());
        assert!(review.source_key.starts_with("import-"));
    }

    #[test]
    fn invalid_rows_are_rejected() {
        let rows = parse(concat!(
            "9b1f2c4e-7d3a-4c1b-8e2f-5a6b7c8d9e01,yelp,6,,2026-10-01T10:00:00Z,false,,,,,a\n",
            "9b1f2c4e-7d3a-4c1b-8e2f-5a6b7c8d9e01,yelp,4,Positive,2026-10-01T10:00:00Z,false,,,,,b\n",
            "9b1f2c4e-7d3a-4c1b-8e2f-5a6b7c8d9e01,yelp,4,,2026-10-01T10:00:00Z,false,2026-10-02T10:00:00Z,,,,c\n",
        ));
        let errors: Vec<RecordError> = rows
            .into_iter()
            .map(|row| row.validate().unwrap_err())
            .collect();

        assert_eq!(
            errors,
            vec![
                RecordError::RatingOutOfRange(6),
                RecordError::UnknownSentiment("Positive".to_string()),
                RecordError::ResponseWithoutFlag,
            ]
        );
    }

    fn read(lines: &str) -> Vec<(u64, Result<ValidatedReview, RecordError>)> {
        let data = format!("{HEADER}{lines}");
        read_review_rows(&mut csv::Reader::from_reader(data.as_bytes())).unwrap()
    }

    #[test]
    fn empty_has_response_cell_means_unanswered() {
        let rows = read(
            "9b1f2c4e-7d3a-4c1b-8e2f-5a6b7c8d9e01,google,4,neutral,2026-10-01T10:00:00Z,,,,,,k1\n",
        );

        assert_eq!(rows.len(), 1);
        let (line, review) = &rows[0];
        assert_eq!(*line, 2);
        let review = review.as_ref().unwrap();
        assert!(!review.has_response);
        assert_eq!(review.sentiment, Some(Sentiment::Neutral));
    }

    #[test]
    fn undecodable_row_is_rejected_without_stopping_the_file() {
        let rows = read(concat!(
            "9b1f2c4e-7d3a-4c1b-8e2f-5a6b7c8d9e01,yelp,4,,last tuesday,false,,,,,bad\n",
            "9b1f2c4e-7d3a-4c1b-8e2f-5a6b7c8d9e01,yelp,5,positive,2026-10-02T10:00:00Z,true,2026-10-02T11:00:00Z,,,,good\n",
        ));

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, 2);
        assert!(matches!(rows[0].1, Err(RecordError::Malformed(_))));
        assert_eq!(rows[1].0, 3);
        let review = rows[1].1.as_ref().unwrap();
        assert_eq!(review.source_key, "good");
        assert!(review.has_response);
    }

    #[test]
    fn unknown_stored_sentiment_becomes_unanalyzed() {
        let id = Uuid::new_v4();
        assert_eq!(stored_sentiment(id, Some("mixed".to_string())), None);
        assert_eq!(stored_sentiment(id, None), None);
        assert_eq!(
            stored_sentiment(id, Some("neutral".to_string())),
            Some(Sentiment::Neutral)
        );
    }
}
