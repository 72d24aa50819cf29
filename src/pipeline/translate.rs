use async_trait::async_trait;
use tracing::info;

use crate::bot::Announcer;
use crate::db::StageStore;
use crate::error::{AppError, CollaboratorError, Result};
use crate::models::{Article, ArticleStatus, Classification, Translation};

use super::runner::Stage;

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(
        &self,
        title: &str,
        content: &str,
    ) -> std::result::Result<Translation, CollaboratorError>;
}

#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(
        &self,
        title_en: &str,
        content_en: &str,
    ) -> std::result::Result<Classification, CollaboratorError>;
}

/// `scraped -> translating -> translated | failed`, then announce.
pub struct TranslateStage<T, C> {
    translator: T,
    classifier: C,
    announcer: Option<Announcer>,
}

impl<T: Translator, C: Classifier> TranslateStage<T, C> {
    pub fn new(translator: T, classifier: C) -> Self {
        Self {
            translator,
            classifier,
            announcer: None,
        }
    }

    pub fn with_announcer(mut self, announcer: Announcer) -> Self {
        self.announcer = Some(announcer);
        self
    }
}

#[async_trait]
impl<T: Translator, C: Classifier> Stage for TranslateStage<T, C> {
    type Output = (Translation, Classification);

    fn name(&self) -> &str {
        "translate"
    }

    fn pending(&self) -> ArticleStatus {
        ArticleStatus::Scraped
    }

    fn in_progress(&self) -> ArticleStatus {
        ArticleStatus::Translating
    }

    async fn execute(
        &self,
        article: &Article,
    ) -> std::result::Result<(Translation, Classification), CollaboratorError> {
        let title = article.title_raw.as_deref().unwrap_or_default();
        let content = article.content_raw.as_deref().unwrap_or_default();

        info!(id = article.id, "Translating and classifying article");
        let translation = self.translator.translate(title, content).await?;
        let classification = self
            .classifier
            .classify(&translation.title_en, &translation.content_en)
            .await?;
        Ok((translation, classification))
    }

    async fn commit(
        &self,
        store: &dyn StageStore,
        article: &Article,
        (translation, classification): (Translation, Classification),
    ) -> Result<()> {
        store
            .save_translated(article.id, &translation, &classification)
            .await?;

        if let Some(announcer) = &self.announcer {
            let row = store
                .get_article(article.id)
                .await?
                .ok_or(AppError::ArticleNotFound(article.id))?;
            announcer.announce(&row).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use tokio::sync::Mutex;

    use super::*;
    use crate::bot::{Notifier, OutgoingMessage};
    use crate::db::{blank_article, MemoryStore};
    use crate::models::Category;
    use crate::pipeline::StageRunner;

    struct FakeModel;

    #[async_trait]
    impl Translator for FakeModel {
        async fn translate(
            &self,
            title: &str,
            content: &str,
        ) -> std::result::Result<Translation, CollaboratorError> {
            if content.is_empty() {
                return Err(CollaboratorError::Validation("missing field `content_en`".into()));
            }
            Ok(Translation {
                title_en: format!("EN {title}"),
                content_en: format!("EN {content}"),
                summary_en: "Short summary.".into(),
            })
        }
    }

    #[async_trait]
    impl Classifier for FakeModel {
        async fn classify(
            &self,
            _title_en: &str,
            _content_en: &str,
        ) -> std::result::Result<Classification, CollaboratorError> {
            Ok(Classification {
                topic: "Economy".into(),
                sentiment: "Neutral".into(),
                urgency: "Normal".into(),
            })
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<(String, OutgoingMessage)>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn deliver(&self, chat_id: &str, message: &OutgoingMessage) -> Result<()> {
            if self.fail {
                return Err(AppError::TelegramApi("chat not found".into()));
            }
            self.sent
                .lock()
                .await
                .push((chat_id.to_string(), message.clone()));
            Ok(())
        }
    }

    async fn scraped_article(store: &MemoryStore, content: &str) -> Article {
        let mut article = blank_article("https://www.tagesschau.de/wirtschaft/x-100.html", Category::Wirtschaft);
        article.status = ArticleStatus::Scraped;
        article.title_raw = Some("Zinsen steigen".into());
        article.content_raw = Some(content.into());
        article.published_at = Some(Utc::now());
        store.insert(article).await
    }

    #[tokio::test]
    async fn stores_translation_and_classification() {
        let store = Arc::new(MemoryStore::new());
        let article = scraped_article(&store, "Die EZB erhöht die Zinsen.").await;

        let runner = StageRunner::new(store.clone(), TranslateStage::new(FakeModel, FakeModel));
        let report = runner.run(None).await.unwrap();
        assert_eq!(report.succeeded, 1);

        let stored = store.get_article(article.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ArticleStatus::Translated);
        assert_eq!(stored.title_en.as_deref(), Some("EN Zinsen steigen"));
        assert_eq!(stored.topic.as_deref(), Some("Economy"));
        assert_eq!(stored.urgency.as_deref(), Some("Normal"));
    }

    #[tokio::test]
    async fn validation_error_fails_article_without_output() {
        let store = Arc::new(MemoryStore::new());
        let article = scraped_article(&store, "").await;

        let runner = StageRunner::new(store.clone(), TranslateStage::new(FakeModel, FakeModel));
        let report = runner.run(None).await.unwrap();
        assert_eq!(report.failed, 1);

        let stored = store.get_article(article.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ArticleStatus::Failed);
        assert!(stored.title_en.is_none());
        assert!(stored.topic.is_none());
    }

    #[tokio::test]
    async fn announces_translated_article() {
        let store = Arc::new(MemoryStore::new());
        scraped_article(&store, "Die EZB erhöht die Zinsen.").await;

        let notifier = Arc::new(RecordingNotifier::default());
        let announcer = Announcer::new(notifier.clone(), store.clone(), "4711", 8);
        let stage = TranslateStage::new(FakeModel, FakeModel).with_announcer(announcer);
        StageRunner::new(store.clone(), stage).run(None).await.unwrap();

        let sent = notifier.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "4711");
        assert!(sent[0].1.text.contains("EN Zinsen steigen"));
    }

    #[tokio::test]
    async fn notifier_failure_does_not_fail_article() {
        let store = Arc::new(MemoryStore::new());
        let article = scraped_article(&store, "Die EZB erhöht die Zinsen.").await;

        let notifier = Arc::new(RecordingNotifier {
            fail: true,
            ..Default::default()
        });
        let announcer = Announcer::new(notifier, store.clone(), "4711", 8);
        let stage = TranslateStage::new(FakeModel, FakeModel).with_announcer(announcer);
        let report = StageRunner::new(store.clone(), stage).run(None).await.unwrap();

        assert_eq!(report.succeeded, 1);
        let stored = store.get_article(article.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ArticleStatus::Translated);
    }
}
