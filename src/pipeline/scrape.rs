use async_trait::async_trait;

use crate::db::StageStore;
use crate::error::{CollaboratorError, Result};
use crate::models::{Article, ArticleStatus, ScrapedArticle};

use super::runner::Stage;

/// Extracts the original-language text of an article page.
#[async_trait]
pub trait Scraper: Send + Sync {
    async fn scrape(&self, url: &str) -> std::result::Result<ScrapedArticle, CollaboratorError>;
}

/// `new -> scraping -> scraped | failed`
pub struct ScrapeStage<C> {
    scraper: C,
}

impl<C: Scraper> ScrapeStage<C> {
    pub fn new(scraper: C) -> Self {
        Self { scraper }
    }
}

#[async_trait]
impl<C: Scraper> Stage for ScrapeStage<C> {
    type Output = ScrapedArticle;

    fn name(&self) -> &str {
        "scrape"
    }

    fn pending(&self) -> ArticleStatus {
        ArticleStatus::New
    }

    fn in_progress(&self) -> ArticleStatus {
        ArticleStatus::Scraping
    }

    async fn execute(&self, article: &Article) -> std::result::Result<ScrapedArticle, CollaboratorError> {
        self.scraper.scrape(&article.source_url).await
    }

    async fn commit(&self, store: &dyn StageStore, article: &Article, output: ScrapedArticle) -> Result<()> {
        store.save_scraped(article.id, &output).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;

    use super::*;
    use crate::db::{blank_article, MemoryStore};
    use crate::models::Category;
    use crate::pipeline::StageRunner;

    /// Pages whose URL contains "broken" have no content.
    struct FakeScraper;

    #[async_trait]
    impl Scraper for FakeScraper {
        async fn scrape(&self, url: &str) -> std::result::Result<ScrapedArticle, CollaboratorError> {
            if url.contains("broken") {
                return Err(CollaboratorError::Runtime("No <h1> title found.".into()));
            }
            Ok(ScrapedArticle {
                title: format!("Titel von {url}"),
                content: "Erster Absatz.\n\nZweiter Absatz.".into(),
                published_at: Utc::now(),
            })
        }
    }

    async fn seeded(urls: &[&str]) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        for url in urls {
            store.insert(blank_article(url, Category::Ausland)).await;
        }
        store
    }

    #[tokio::test]
    async fn drains_new_articles() {
        let store = seeded(&[
            "https://www.tagesschau.de/ausland/a-100.html",
            "https://www.tagesschau.de/ausland/b-100.html",
        ])
        .await;
        let runner = StageRunner::new(store.clone(), ScrapeStage::new(FakeScraper));

        let report = runner.run(None).await.unwrap();
        assert_eq!(report.claimed, 2);
        assert_eq!(report.succeeded, 2);

        for article in store.snapshot().await {
            assert_eq!(article.status, ArticleStatus::Scraped);
            assert!(article.title_raw.unwrap().starts_with("Titel von"));
            assert!(article.published_at.is_some());
        }
    }

    #[tokio::test]
    async fn failure_persists_no_partial_output() {
        let store = seeded(&["https://www.tagesschau.de/broken-100.html"]).await;
        let runner = StageRunner::new(store.clone(), ScrapeStage::new(FakeScraper));

        let report = runner.run(None).await.unwrap();
        assert_eq!(report.failed, 1);

        let article = &store.snapshot().await[0];
        assert_eq!(article.status, ArticleStatus::Failed);
        assert!(article.title_raw.is_none());
        assert!(article.content_raw.is_none());
    }

    #[tokio::test]
    async fn limit_bounds_the_run() {
        let store = seeded(&[
            "https://www.tagesschau.de/a-100.html",
            "https://www.tagesschau.de/b-100.html",
            "https://www.tagesschau.de/c-100.html",
        ])
        .await;
        let runner = StageRunner::new(store.clone(), ScrapeStage::new(FakeScraper));

        let report = runner.run(Some(1)).await.unwrap();
        assert_eq!(report.claimed, 1);

        let queued = store
            .snapshot()
            .await
            .iter()
            .filter(|a| a.status == ArticleStatus::New)
            .count();
        assert_eq!(queued, 2);
    }

    #[tokio::test]
    async fn failed_articles_are_not_picked_up_again() {
        let store = seeded(&["https://www.tagesschau.de/broken-100.html"]).await;
        let runner = StageRunner::new(store.clone(), ScrapeStage::new(FakeScraper));

        runner.run(None).await.unwrap();
        let second = runner.run(None).await.unwrap();
        assert_eq!(second.claimed, 0);
    }
}
