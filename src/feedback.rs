use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::db::FeedbackStore;
use crate::error::{AppError, Result};
use crate::models::Feedback;

/// Writes user up/down signals back into the store.
///
/// Last writer wins: nothing stops a `record_up` from overwriting an
/// earlier `record_down` or the other way round.
pub struct FeedbackRecorder<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for FeedbackRecorder<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: FeedbackStore + ?Sized> FeedbackRecorder<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn record_up(&self, article_id: i64) -> Result<()> {
        self.record(article_id, Feedback::Up).await
    }

    /// Negative feedback also retires the article.
    pub async fn record_down(&self, article_id: i64) -> Result<()> {
        self.record(article_id, Feedback::Down).await
    }

    pub async fn record(&self, article_id: i64, feedback: Feedback) -> Result<()> {
        let deactivate = feedback == Feedback::Down;
        if !self
            .store
            .set_feedback(article_id, feedback, Utc::now(), deactivate)
            .await?
        {
            return Err(AppError::ArticleNotFound(article_id));
        }
        info!(id = article_id, %feedback, "Feedback recorded");
        Ok(())
    }

    /// Whether at least `min_count` articles are still active.
    pub async fn has_enough_articles(&self, min_count: u64) -> Result<bool> {
        Ok(self.store.count_active().await? >= min_count)
    }
}
