use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::{
    Article, ArticleStatus, Classification, Feedback, NewArticle, ScrapedArticle, Translation,
};

use super::store::{
    ClaimStore, DiscoveryStore, FeedbackStore, PreferenceStore, RecommendationStore, StageStore,
};

/// Article table held in process memory. Every operation takes the lock
/// once, so the status compare-and-swap is atomic like its SQL counterpart.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<Article>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a row directly, bypassing discovery. The id is assigned here.
    pub async fn insert(&self, article: Article) -> Article {
        let mut rows = self.rows.lock().await;
        push_row(&mut rows, article)
    }

    pub async fn snapshot(&self) -> Vec<Article> {
        self.rows.lock().await.clone()
    }

    async fn with_row<T>(&self, id: i64, f: impl FnOnce(&mut Article) -> T) -> Result<T> {
        let mut rows = self.rows.lock().await;
        rows.iter_mut()
            .find(|a| a.id == id)
            .map(f)
            .ok_or(AppError::ArticleNotFound(id))
    }
}

fn push_row(rows: &mut Vec<Article>, mut article: Article) -> Article {
    article.id = rows.last().map(|a| a.id + 1).unwrap_or(1);
    rows.push(article.clone());
    article
}

/// A bare `new` article, as discovery would create it.
pub fn blank_article(source_url: &str, category: crate::models::Category) -> Article {
    Article {
        id: 0,
        source_url: source_url.to_string(),
        category,
        status: ArticleStatus::New,
        title_raw: None,
        content_raw: None,
        published_at: None,
        title_en: None,
        content_en: None,
        summary_en: None,
        topic: None,
        sentiment: None,
        urgency: None,
        feedback: None,
        feedback_at: None,
        active: true,
        recommended_at: None,
        discovered_at: Utc::now(),
    }
}

#[async_trait]
impl ClaimStore for MemoryStore {
    async fn find_one_by_status(&self, status: ArticleStatus) -> Result<Option<Article>> {
        let rows = self.rows.lock().await;
        Ok(rows.iter().find(|a| a.status == status).cloned())
    }

    async fn compare_and_set_status(
        &self,
        id: i64,
        expected: ArticleStatus,
        new: ArticleStatus,
    ) -> Result<bool> {
        let mut rows = self.rows.lock().await;
        match rows.iter_mut().find(|a| a.id == id && a.status == expected) {
            Some(article) => {
                article.status = new;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl StageStore for MemoryStore {
    async fn get_article(&self, id: i64) -> Result<Option<Article>> {
        let rows = self.rows.lock().await;
        Ok(rows.iter().find(|a| a.id == id).cloned())
    }

    async fn save_scraped(&self, id: i64, scraped: &ScrapedArticle) -> Result<()> {
        self.with_row(id, |a| {
            a.title_raw = Some(scraped.title.clone());
            a.content_raw = Some(scraped.content.clone());
            a.published_at = Some(scraped.published_at);
            a.status = ArticleStatus::Scraped;
        })
        .await
    }

    async fn save_translated(
        &self,
        id: i64,
        translation: &Translation,
        classification: &Classification,
    ) -> Result<()> {
        self.with_row(id, |a| {
            a.title_en = Some(translation.title_en.clone());
            a.content_en = Some(translation.content_en.clone());
            a.summary_en = Some(translation.summary_en.clone());
            a.topic = Some(classification.topic.clone());
            a.sentiment = Some(classification.sentiment.clone());
            a.urgency = Some(classification.urgency.clone());
            a.status = ArticleStatus::Translated;
        })
        .await
    }

    async fn mark_failed(&self, id: i64) -> Result<()> {
        self.with_row(id, |a| a.status = ArticleStatus::Failed).await
    }
}

#[async_trait]
impl FeedbackStore for MemoryStore {
    async fn set_feedback(
        &self,
        id: i64,
        feedback: Feedback,
        at: DateTime<Utc>,
        deactivate: bool,
    ) -> Result<bool> {
        let updated = self
            .with_row(id, |a| {
                a.feedback = Some(feedback);
                a.feedback_at = Some(at);
                if deactivate {
                    a.active = false;
                }
            })
            .await;

        match updated {
            Ok(()) => Ok(true),
            Err(AppError::ArticleNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn count_active(&self) -> Result<u64> {
        let rows = self.rows.lock().await;
        Ok(rows.iter().filter(|a| a.active).count() as u64)
    }
}

#[async_trait]
impl PreferenceStore for MemoryStore {
    async fn liked_articles(&self) -> Result<Vec<Article>> {
        let rows = self.rows.lock().await;
        Ok(rows
            .iter()
            .filter(|a| a.feedback == Some(Feedback::Up) && a.active)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RecommendationStore for MemoryStore {
    async fn eligible_articles(&self) -> Result<Vec<Article>> {
        let rows = self.rows.lock().await;
        Ok(rows.iter().filter(|a| a.is_eligible()).cloned().collect())
    }

    async fn mark_recommended(&self, ids: &[i64], at: DateTime<Utc>) -> Result<()> {
        let mut rows = self.rows.lock().await;
        for article in rows.iter_mut().filter(|a| ids.contains(&a.id)) {
            article.recommended_at.get_or_insert(at);
        }
        Ok(())
    }
}

#[async_trait]
impl DiscoveryStore for MemoryStore {
    async fn upsert_article(&self, article: NewArticle) -> Result<(Article, bool)> {
        let mut rows = self.rows.lock().await;
        if let Some(existing) = rows.iter().find(|a| a.source_url == article.source_url) {
            return Ok((existing.clone(), false));
        }
        let row = push_row(&mut rows, blank_article(&article.source_url, article.category));
        Ok((row, true))
    }
}
