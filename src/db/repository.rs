use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};
use tokio_rusqlite::Connection;

use crate::error::{AppError, Result};
use crate::models::{
    Article, ArticleStatus, Classification, Feedback, NewArticle, ScrapedArticle, Translation,
};

use super::schema::SCHEMA;
use super::store::{
    ClaimStore, DiscoveryStore, FeedbackStore, PreferenceStore, RecommendationStore, StageStore,
};

const ARTICLE_COLUMNS: &str = "id, source_url, category, status, title_raw, content_raw, \
     published_at, title_en, content_en, summary_en, topic, sentiment, urgency, feedback, \
     feedback_at, active, recommended_at, discovered_at";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed article store.
///
/// Several repositories (in one process or many) may point at the same file;
/// the status compare-and-swap is a single `UPDATE ... WHERE status = ?`.
pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;
        Self::init(conn).await
    }

    pub async fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self> {
        conn.call(|conn| {
            conn.busy_timeout(BUSY_TIMEOUT)?;
            conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))?;
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    pub async fn get_articles_by_status(&self, status: ArticleStatus) -> Result<Vec<Article>> {
        let articles = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {ARTICLE_COLUMNS} FROM articles WHERE status = ?1 ORDER BY id"
                ))?;
                let articles = stmt
                    .query_map(params![status.as_str()], article_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(articles)
            })
            .await?;
        Ok(articles)
    }

    async fn update_one(&self, id: i64, sql: &'static str, values: Vec<SqlValue>) -> Result<()> {
        let changed = self
            .conn
            .call(move |conn| {
                let mut bound: Vec<&dyn rusqlite::ToSql> =
                    values.iter().map(|v| v as &dyn rusqlite::ToSql).collect();
                bound.push(&id);
                Ok(conn.execute(sql, bound.as_slice())?)
            })
            .await?;

        if changed == 0 {
            return Err(AppError::ArticleNotFound(id));
        }
        Ok(())
    }
}

type SqlValue = Option<String>;

#[async_trait]
impl ClaimStore for Repository {
    async fn find_one_by_status(&self, status: ArticleStatus) -> Result<Option<Article>> {
        let article = self
            .conn
            .call(move |conn| {
                let article = conn
                    .query_row(
                        &format!(
                            "SELECT {ARTICLE_COLUMNS} FROM articles WHERE status = ?1 LIMIT 1"
                        ),
                        params![status.as_str()],
                        article_from_row,
                    )
                    .optional()?;
                Ok(article)
            })
            .await?;
        Ok(article)
    }

    async fn compare_and_set_status(
        &self,
        id: i64,
        expected: ArticleStatus,
        new: ArticleStatus,
    ) -> Result<bool> {
        let changed = self
            .conn
            .call(move |conn| {
                Ok(conn.execute(
                    "UPDATE articles SET status = ?1 WHERE id = ?2 AND status = ?3",
                    params![new.as_str(), id, expected.as_str()],
                )?)
            })
            .await?;
        Ok(changed == 1)
    }
}

#[async_trait]
impl StageStore for Repository {
    async fn get_article(&self, id: i64) -> Result<Option<Article>> {
        let article = self
            .conn
            .call(move |conn| {
                let article = conn
                    .query_row(
                        &format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = ?1"),
                        params![id],
                        article_from_row,
                    )
                    .optional()?;
                Ok(article)
            })
            .await?;
        Ok(article)
    }

    async fn save_scraped(&self, id: i64, scraped: &ScrapedArticle) -> Result<()> {
        self.update_one(
            id,
            "UPDATE articles SET title_raw = ?1, content_raw = ?2, published_at = ?3, \
             status = 'scraped' WHERE id = ?4",
            vec![
                Some(scraped.title.clone()),
                Some(scraped.content.clone()),
                Some(scraped.published_at.to_rfc3339()),
            ],
        )
        .await
    }

    async fn save_translated(
        &self,
        id: i64,
        translation: &Translation,
        classification: &Classification,
    ) -> Result<()> {
        self.update_one(
            id,
            "UPDATE articles SET title_en = ?1, content_en = ?2, summary_en = ?3, \
             topic = ?4, sentiment = ?5, urgency = ?6, status = 'translated' WHERE id = ?7",
            vec![
                Some(translation.title_en.clone()),
                Some(translation.content_en.clone()),
                Some(translation.summary_en.clone()),
                Some(classification.topic.clone()),
                Some(classification.sentiment.clone()),
                Some(classification.urgency.clone()),
            ],
        )
        .await
    }

    async fn mark_failed(&self, id: i64) -> Result<()> {
        self.update_one(id, "UPDATE articles SET status = 'failed' WHERE id = ?1", vec![])
            .await
    }
}

#[async_trait]
impl FeedbackStore for Repository {
    async fn set_feedback(
        &self,
        id: i64,
        feedback: Feedback,
        at: DateTime<Utc>,
        deactivate: bool,
    ) -> Result<bool> {
        let changed = self
            .conn
            .call(move |conn| {
                Ok(conn.execute(
                    r#"UPDATE articles
                       SET feedback = ?1,
                           feedback_at = ?2,
                           active = CASE WHEN ?3 THEN 0 ELSE active END
                       WHERE id = ?4"#,
                    params![feedback.as_str(), at.to_rfc3339(), deactivate, id],
                )?)
            })
            .await?;
        Ok(changed == 1)
    }

    async fn count_active(&self) -> Result<u64> {
        let count = self
            .conn
            .call(|conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM articles WHERE active = 1",
                    [],
                    |row| row.get(0),
                )?;
                Ok(count)
            })
            .await?;
        Ok(count.max(0) as u64)
    }
}

#[async_trait]
impl PreferenceStore for Repository {
    async fn liked_articles(&self) -> Result<Vec<Article>> {
        let articles = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {ARTICLE_COLUMNS} FROM articles WHERE feedback = 'up' AND active = 1"
                ))?;
                let articles = stmt
                    .query_map([], article_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(articles)
            })
            .await?;
        Ok(articles)
    }
}

#[async_trait]
impl RecommendationStore for Repository {
    async fn eligible_articles(&self) -> Result<Vec<Article>> {
        let articles = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(&format!(
                    r#"SELECT {ARTICLE_COLUMNS} FROM articles
                       WHERE active = 1 AND feedback IS NULL AND recommended_at IS NULL
                       ORDER BY id"#
                ))?;
                let articles = stmt
                    .query_map([], article_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(articles)
            })
            .await?;
        Ok(articles)
    }

    async fn mark_recommended(&self, ids: &[i64], at: DateTime<Utc>) -> Result<()> {
        let ids = ids.to_vec();
        let at = at.to_rfc3339();
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                {
                    let mut stmt = tx.prepare(
                        "UPDATE articles SET recommended_at = ?1 WHERE id = ?2 AND recommended_at IS NULL",
                    )?;
                    for id in ids {
                        stmt.execute(params![at, id])?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl DiscoveryStore for Repository {
    async fn upsert_article(&self, article: NewArticle) -> Result<(Article, bool)> {
        let result = self
            .conn
            .call(move |conn| {
                let created = conn.execute(
                    r#"INSERT INTO articles (source_url, category, discovered_at)
                       VALUES (?1, ?2, ?3)
                       ON CONFLICT(source_url) DO NOTHING"#,
                    params![
                        article.source_url,
                        article.category.as_str(),
                        Utc::now().to_rfc3339()
                    ],
                )? == 1;
                let row = conn.query_row(
                    &format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE source_url = ?1"),
                    params![article.source_url],
                    article_from_row,
                )?;
                Ok((row, created))
            })
            .await?;
        Ok(result)
    }
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC3339 first (e.g., "2026-01-11T12:34:56+00:00")
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Try SQLite datetime format (e.g., "2026-01-11 12:34:56")
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    // Date only, as declared by some sources
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn parse_column<T>(row: &Row, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn optional_datetime(row: &Row, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    Ok(row
        .get::<_, Option<String>>(idx)?
        .and_then(|s| parse_datetime(&s)))
}

fn article_from_row(row: &Row) -> rusqlite::Result<Article> {
    let feedback = match row.get::<_, Option<String>>(13)? {
        Some(_) => Some(parse_column::<Feedback>(row, 13)?),
        None => None,
    };

    Ok(Article {
        id: row.get(0)?,
        source_url: row.get(1)?,
        category: parse_column(row, 2)?,
        status: parse_column(row, 3)?,
        title_raw: row.get(4)?,
        content_raw: row.get(5)?,
        published_at: optional_datetime(row, 6)?,
        title_en: row.get(7)?,
        content_en: row.get(8)?,
        summary_en: row.get(9)?,
        topic: row.get(10)?,
        sentiment: row.get(11)?,
        urgency: row.get(12)?,
        feedback,
        feedback_at: optional_datetime(row, 14)?,
        active: row.get::<_, i64>(15)? != 0,
        recommended_at: optional_datetime(row, 16)?,
        discovered_at: optional_datetime(row, 17)?.unwrap_or_else(Utc::now),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stored_timestamp_formats() {
        assert!(parse_datetime("2026-01-11T12:34:56+00:00").is_some());
        assert!(parse_datetime("2026-01-11 12:34:56").is_some());
        assert_eq!(
            parse_datetime("2026-01-11").map(|d| d.to_rfc3339()),
            Some("2026-01-11T00:00:00+00:00".to_string())
        );
        assert!(parse_datetime("11.01.2026").is_none());
    }

    #[tokio::test]
    async fn scrape_output_lands_on_the_row() {
        let repo = Repository::in_memory().await.unwrap();
        let (article, created) = repo
            .upsert_article(NewArticle {
                source_url: "https://www.tagesschau.de/inland/a-100.html".into(),
                category: crate::models::Category::Inland,
            })
            .await
            .unwrap();
        assert!(created);
        assert_eq!(article.status, ArticleStatus::New);

        let scraped = ScrapedArticle {
            title: "Titel".into(),
            content: "Inhalt".into(),
            published_at: Utc::now(),
        };
        repo.save_scraped(article.id, &scraped).await.unwrap();

        let stored = repo.get_article(article.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ArticleStatus::Scraped);
        assert_eq!(stored.title_raw.as_deref(), Some("Titel"));
        assert_eq!(stored.content_raw.as_deref(), Some("Inhalt"));
    }

    #[tokio::test]
    async fn finalizing_a_missing_article_is_an_error() {
        let repo = Repository::in_memory().await.unwrap();
        let err = repo.mark_failed(42).await.unwrap_err();
        assert!(matches!(err, AppError::ArticleNotFound(42)));
    }
}
