use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use rand::seq::IndexedRandom;
use tracing::info;

use crate::db::DiscoveryStore;
use crate::error::{CollaboratorError, Result};
use crate::models::{Article, Category, NewArticle};

/// Lists the article URLs linked from a category page.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    async fn index(&self, category: Category) -> std::result::Result<Vec<String>, CollaboratorError>;
}

/// The only creator of articles.
pub struct Discoverer<S: ?Sized, A> {
    store: Arc<S>,
    source: A,
}

impl<S, A> Discoverer<S, A>
where
    S: DiscoveryStore + ?Sized,
    A: ArticleSource,
{
    pub fn new(store: Arc<S>, source: A) -> Self {
        Self { store, source }
    }

    /// Index a random category and insert its first unseen article.
    pub async fn discover(&self) -> Result<Option<Article>> {
        let category = *Category::ALL
            .choose(&mut rand::rng())
            .unwrap_or(&Category::Inland);
        self.discover_in(category).await
    }

    pub async fn discover_in(&self, category: Category) -> Result<Option<Article>> {
        info!(%category, "Selected category");

        let urls = match self.source.index(category).await {
            Ok(urls) => urls,
            Err(e) => {
                tracing::warn!(%category, error = %e, "Category index failed");
                return Ok(None);
            }
        };
        info!(count = urls.len(), "Found article links");

        let mut seen = HashSet::new();
        for url in urls {
            if !seen.insert(url.clone()) {
                continue;
            }

            let (article, created) = self
                .store
                .upsert_article(NewArticle {
                    source_url: url,
                    category,
                })
                .await?;

            if created {
                info!(url = %article.source_url, "New article added");
                return Ok(Some(article));
            }
            tracing::debug!(url = %article.source_url, "Article already exists, trying next");
        }

        info!(%category, "No new articles found in this category");
        Ok(None)
    }
}
