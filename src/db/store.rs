//! Narrow views of the article table.
//!
//! Each component depends only on the operations it needs, so the SQLite
//! [`Repository`](super::Repository) and the in-memory
//! [`MemoryStore`](super::MemoryStore) can be swapped freely.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{
    Article, ArticleStatus, Classification, Feedback, NewArticle, ScrapedArticle, Translation,
};

/// Operations the transition engine is built on.
#[async_trait]
pub trait ClaimStore: Send + Sync {
    /// Any one article currently in `status`.
    async fn find_one_by_status(&self, status: ArticleStatus) -> Result<Option<Article>>;

    /// Set `status = new` on row `id` only if its status is still `expected`.
    /// Returns whether a row was changed. Must be a single atomic store operation.
    async fn compare_and_set_status(
        &self,
        id: i64,
        expected: ArticleStatus,
        new: ArticleStatus,
    ) -> Result<bool>;
}

/// Finalization writes done by a stage runner that already owns the article.
#[async_trait]
pub trait StageStore: ClaimStore {
    async fn get_article(&self, id: i64) -> Result<Option<Article>>;

    /// Persist scrape output and move to `scraped`.
    async fn save_scraped(&self, id: i64, scraped: &ScrapedArticle) -> Result<()>;

    /// Persist translation + classification output and move to `translated`.
    async fn save_translated(
        &self,
        id: i64,
        translation: &Translation,
        classification: &Classification,
    ) -> Result<()>;

    async fn mark_failed(&self, id: i64) -> Result<()>;
}

#[async_trait]
pub trait FeedbackStore: Send + Sync {
    /// Write feedback and its timestamp; `deactivate` also clears `active`.
    /// Returns false when no such article exists.
    async fn set_feedback(
        &self,
        id: i64,
        feedback: Feedback,
        at: DateTime<Utc>,
        deactivate: bool,
    ) -> Result<bool>;

    async fn count_active(&self) -> Result<u64>;
}

#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Articles with `feedback = up` and `active = true`.
    async fn liked_articles(&self) -> Result<Vec<Article>>;
}

#[async_trait]
pub trait RecommendationStore: PreferenceStore {
    /// Active, no feedback, never recommended; in discovery order.
    async fn eligible_articles(&self) -> Result<Vec<Article>>;

    /// Stamp `recommended_at` on rows that do not carry one yet.
    async fn mark_recommended(&self, ids: &[i64], at: DateTime<Utc>) -> Result<()>;
}

#[async_trait]
pub trait DiscoveryStore: Send + Sync {
    /// Insert by `source_url`, or return the existing row untouched.
    /// The flag is true when the row was newly created.
    async fn upsert_article(&self, article: NewArticle) -> Result<(Article, bool)>;
}
