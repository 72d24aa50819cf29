use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use tracing::{info, warn};

use crate::db::StageStore;
use crate::error::{CollaboratorError, Result};
use crate::models::{Article, ArticleStatus};

use super::transition::TransitionEngine;

/// One phase of the pipeline: which states it moves between and how it
/// turns a claimed article into output.
#[async_trait]
pub trait Stage: Send + Sync {
    type Output: Send;

    fn name(&self) -> &str;

    /// State the stage picks work from.
    fn pending(&self) -> ArticleStatus;

    /// State an article sits in while this stage owns it.
    fn in_progress(&self) -> ArticleStatus;

    /// Call the external collaborator. A declared failure marks the article
    /// `failed`; nothing from it is persisted.
    async fn execute(&self, article: &Article) -> std::result::Result<Self::Output, CollaboratorError>;

    /// Persist the output and move to the success state. The claim already
    /// proved ownership, so this is an unconditional write.
    async fn commit(&self, store: &dyn StageStore, article: &Article, output: Self::Output)
        -> Result<()>;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StageReport {
    pub claimed: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Drains one stage's queue: claim, execute, finalize, repeat.
pub struct StageRunner<S, K> {
    store: Arc<S>,
    engine: TransitionEngine<S>,
    stage: K,
}

impl<S, K> StageRunner<S, K>
where
    S: StageStore + 'static,
    K: Stage,
{
    pub fn new(store: Arc<S>, stage: K) -> Self {
        let engine = TransitionEngine::new(Arc::clone(&store));
        Self {
            store,
            engine,
            stage,
        }
    }

    pub fn stage(&self) -> &K {
        &self.stage
    }

    /// Process claimed articles until the queue is empty or `limit` items
    /// have been claimed. Store errors abort the run; collaborator errors
    /// only fail the article at hand.
    pub async fn run(&self, limit: Option<usize>) -> Result<StageReport> {
        let claims = self
            .engine
            .claims(self.stage.pending(), self.stage.in_progress())
            .take(limit.unwrap_or(usize::MAX));
        futures::pin_mut!(claims);

        let mut report = StageReport::default();
        while let Some(article) = claims.next().await {
            let article = article?;
            report.claimed += 1;
            if self.process(&article).await? {
                report.succeeded += 1;
            } else {
                report.failed += 1;
            }
        }

        if report.claimed == 0 {
            info!(stage = self.stage.name(), "No more articles to process");
        } else {
            info!(
                stage = self.stage.name(),
                claimed = report.claimed,
                succeeded = report.succeeded,
                failed = report.failed,
                "Stage run finished"
            );
        }
        Ok(report)
    }

    async fn process(&self, article: &Article) -> Result<bool> {
        match self.stage.execute(article).await {
            Ok(output) => {
                self.stage
                    .commit(self.store.as_ref(), article, output)
                    .await?;
                info!(stage = self.stage.name(), id = article.id, url = %article.source_url, "Article processed");
                Ok(true)
            }
            Err(e) => {
                warn!(stage = self.stage.name(), id = article.id, url = %article.source_url, error = %e, "Collaborator failure");
                self.store.mark_failed(article.id).await?;
                Ok(false)
            }
        }
    }
}
