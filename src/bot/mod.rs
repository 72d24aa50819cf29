//! Chat-side glue: the notifier seam, callback dispatch and the announcement
//! sent after an article is translated.

pub mod messages;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use crate::db::{FeedbackStore, RecommendationStore, StageStore};
use crate::error::{AppError, Result};
use crate::feedback::FeedbackRecorder;
use crate::models::{Article, Feedback};
use crate::recommend::Recommender;

use messages::{article_message, feedback_reply, recommendations_message, RECOMMEND_MORE};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Button {
    pub label: String,
    pub callback_data: String,
}

impl Button {
    pub fn new(label: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            callback_data: callback_data.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMessage {
    pub text: String,
    /// Rows of inline buttons.
    pub buttons: Vec<Vec<Button>>,
}

impl OutgoingMessage {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            buttons: Vec::new(),
        }
    }
}

/// Delivers a message to a chat. Failures are reported, never retried here.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, chat_id: &str, message: &OutgoingMessage) -> Result<()>;
}

/// What a button press asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    Feedback { feedback: Feedback, article_id: i64 },
    RecommendMore,
}

impl CallbackAction {
    /// `feedback:<up|down>:<id>` or `recommend_more`
    pub fn parse(data: &str) -> Result<Self> {
        if data == RECOMMEND_MORE {
            return Ok(CallbackAction::RecommendMore);
        }

        let invalid = || AppError::InvalidCallback(data.to_string());
        let mut parts = data.split(':');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some("feedback"), Some(value), Some(id), None) => Ok(CallbackAction::Feedback {
                feedback: value.parse().map_err(|_| invalid())?,
                article_id: id.parse().map_err(|_| invalid())?,
            }),
            _ => Err(invalid()),
        }
    }
}

/// Sends the announcement for a freshly translated article.
pub struct Announcer {
    notifier: Arc<dyn Notifier>,
    recorder: FeedbackRecorder<dyn FeedbackStore>,
    chat_id: String,
    min_active_articles: u64,
}

impl Announcer {
    pub fn new(
        notifier: Arc<dyn Notifier>,
        store: Arc<dyn FeedbackStore>,
        chat_id: impl Into<String>,
        min_active_articles: u64,
    ) -> Self {
        Self {
            notifier,
            recorder: FeedbackRecorder::new(store),
            chat_id: chat_id.into(),
            min_active_articles,
        }
    }

    /// Fire and forget: errors are logged and swallowed.
    pub async fn announce(&self, article: &Article) {
        let offer_more = match self
            .recorder
            .has_enough_articles(self.min_active_articles)
            .await
        {
            Ok(enough) => enough,
            Err(e) => {
                warn!(error = %e, "Could not count active articles");
                false
            }
        };

        let message = article_message(article, offer_more);
        match self.notifier.deliver(&self.chat_id, &message).await {
            Ok(()) => info!(id = article.id, url = %article.source_url, "Notified chat"),
            Err(e) => warn!(id = article.id, error = %e, "Notification failed"),
        }
    }
}

/// Routes button presses to the feedback recorder and the recommender.
pub struct Bot<S> {
    store: Arc<S>,
    recorder: FeedbackRecorder<S>,
    recommender: Recommender<S>,
    notifier: Arc<dyn Notifier>,
    recommend_limit: usize,
}

impl<S> Bot<S>
where
    S: FeedbackStore + RecommendationStore + StageStore + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<dyn Notifier>, recommend_limit: usize) -> Self {
        Self {
            recorder: FeedbackRecorder::new(Arc::clone(&store)),
            recommender: Recommender::new(Arc::clone(&store)),
            store,
            notifier,
            recommend_limit,
        }
    }

    pub async fn handle_callback(&self, chat_id: &str, data: &str) -> Result<()> {
        info!(data, "Callback received");

        match CallbackAction::parse(data)? {
            CallbackAction::Feedback {
                feedback,
                article_id,
            } => {
                let article = self
                    .store
                    .get_article(article_id)
                    .await?
                    .ok_or(AppError::ArticleNotFound(article_id))?;

                self.recorder.record(article_id, feedback).await?;

                let reply = feedback_reply(feedback == Feedback::Up, article.display_title());
                self.notifier.deliver(chat_id, &reply).await
            }
            CallbackAction::RecommendMore => self.send_recommendations(chat_id).await,
        }
    }

    /// Recommend and deliver in one message. Articles stay marked even if
    /// delivery fails.
    pub async fn send_recommendations(&self, chat_id: &str) -> Result<()> {
        let picked = self.recommender.recommend(self.recommend_limit).await?;
        self.notifier
            .deliver(chat_id, &recommendations_message(&picked))
            .await
    }
}
