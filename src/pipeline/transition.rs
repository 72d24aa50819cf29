use std::sync::Arc;

use futures::stream::{self, Stream};
use tracing::debug;

use crate::db::ClaimStore;
use crate::error::{AppError, Result};
use crate::models::{Article, ArticleStatus};

/// Claims work by compare-and-swap on the `status` column.
///
/// The store's conditional update is the only synchronization between
/// workers; no locks are held across calls.
pub struct TransitionEngine<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for TransitionEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: ClaimStore + ?Sized> TransitionEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Move one article from `from` to `to`.
    ///
    /// Returns the article as it was before the transition, or `None` when
    /// nothing is in `from` or another worker won the race for the row
    /// we picked. Never retries.
    pub async fn claim_and_advance(
        &self,
        from: ArticleStatus,
        to: ArticleStatus,
    ) -> Result<Option<Article>> {
        if !from.can_advance_to(to) {
            return Err(AppError::InvalidTransition { from, to });
        }

        let Some(article) = self.store.find_one_by_status(from).await? else {
            return Ok(None);
        };

        if self
            .store
            .compare_and_set_status(article.id, from, to)
            .await?
        {
            Ok(Some(article))
        } else {
            debug!(id = article.id, %from, %to, "lost claim race");
            Ok(None)
        }
    }

    /// Lazily claim articles one at a time until the first "no work".
    ///
    /// Each poll performs exactly one claim, so `take(n)` bounds the work
    /// and callers may sleep between items. A store error is yielded once
    /// and ends the stream.
    pub fn claims(
        &self,
        from: ArticleStatus,
        to: ArticleStatus,
    ) -> impl Stream<Item = Result<Article>> + '_ {
        stream::unfold(false, move |done| async move {
            if done {
                return None;
            }
            match self.claim_and_advance(from, to).await {
                Ok(Some(article)) => Some((Ok(article), false)),
                Ok(None) => None,
                Err(e) => Some((Err(e), true)),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;
    use crate::db::{blank_article, MemoryStore, StageStore};
    use crate::models::Category;

    async fn store_with(n: usize) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        for i in 0..n {
            store
                .insert(blank_article(
                    &format!("https://www.tagesschau.de/inland/artikel-{i}-100.html"),
                    Category::Inland,
                ))
                .await;
        }
        store
    }

    #[tokio::test]
    async fn empty_queue_yields_no_work() {
        let engine = TransitionEngine::new(store_with(0).await);
        let claimed = engine
            .claim_and_advance(ArticleStatus::New, ArticleStatus::Scraping)
            .await
            .unwrap();
        assert!(claimed.is_none());
    }

    #[tokio::test]
    async fn returns_pre_image_and_advances_row() {
        let store = store_with(1).await;
        let engine = TransitionEngine::new(store.clone());

        let claimed = engine
            .claim_and_advance(ArticleStatus::New, ArticleStatus::Scraping)
            .await
            .unwrap()
            .expect("one article is queued");
        assert_eq!(claimed.status, ArticleStatus::New);

        let stored = store.get_article(claimed.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ArticleStatus::Scraping);
    }

    #[tokio::test]
    async fn rejects_edges_outside_the_graph() {
        let store = store_with(1).await;
        let engine = TransitionEngine::new(store.clone());

        let err = engine
            .claim_and_advance(ArticleStatus::New, ArticleStatus::Translated)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));
        assert_eq!(store.snapshot().await[0].status, ArticleStatus::New);
    }

    /// Hands out a row, then lets a competitor take it before the caller's
    /// conditional update runs.
    struct ContendedStore {
        inner: MemoryStore,
    }

    #[async_trait::async_trait]
    impl ClaimStore for ContendedStore {
        async fn find_one_by_status(&self, status: ArticleStatus) -> Result<Option<Article>> {
            let found = self.inner.find_one_by_status(status).await?;
            if let Some(article) = &found {
                self.inner
                    .compare_and_set_status(article.id, status, ArticleStatus::Scraping)
                    .await?;
            }
            Ok(found)
        }

        async fn compare_and_set_status(
            &self,
            id: i64,
            expected: ArticleStatus,
            new: ArticleStatus,
        ) -> Result<bool> {
            self.inner.compare_and_set_status(id, expected, new).await
        }
    }

    #[tokio::test]
    async fn lost_race_is_not_retried() {
        let inner = MemoryStore::new();
        inner
            .insert(blank_article("https://www.tagesschau.de/a-100.html", Category::Wissen))
            .await;
        inner
            .insert(blank_article("https://www.tagesschau.de/b-100.html", Category::Wissen))
            .await;
        let engine = TransitionEngine::new(Arc::new(ContendedStore { inner }));

        let claimed = engine
            .claim_and_advance(ArticleStatus::New, ArticleStatus::Scraping)
            .await
            .unwrap();
        assert!(claimed.is_none());

        // The second article is still queued: no internal retry happened.
        let remaining = engine.store.inner.snapshot().await;
        assert_eq!(remaining[1].status, ArticleStatus::New);
    }

    #[tokio::test]
    async fn claim_stream_is_lazy_and_bounded() {
        let store = store_with(5).await;
        let engine = TransitionEngine::new(store.clone());

        let taken: Vec<_> = engine
            .claims(ArticleStatus::New, ArticleStatus::Scraping)
            .take(2)
            .collect()
            .await;
        assert_eq!(taken.len(), 2);

        let still_new = store
            .snapshot()
            .await
            .iter()
            .filter(|a| a.status == ArticleStatus::New)
            .count();
        assert_eq!(still_new, 3);
    }

    #[tokio::test]
    async fn concurrent_workers_claim_each_article_once() {
        let store = store_with(50).await;
        let engine = TransitionEngine::new(store.clone());

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let engine = engine.clone();
                tokio::spawn(async move {
                    let mut mine = Vec::new();
                    while let Some(article) = engine
                        .claim_and_advance(ArticleStatus::New, ArticleStatus::Scraping)
                        .await
                        .unwrap()
                    {
                        mine.push(article.id);
                        tokio::task::yield_now().await;
                    }
                    mine
                })
            })
            .collect();

        let mut all = Vec::new();
        for worker in workers {
            all.extend(worker.await.unwrap());
        }
        all.sort_unstable();
        let before = all.len();
        all.dedup();

        assert_eq!(before, all.len(), "an article was claimed twice");
        assert_eq!(all.len(), 50, "an article was never claimed");
    }
}
