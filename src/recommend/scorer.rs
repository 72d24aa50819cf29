use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::db::RecommendationStore;
use crate::error::Result;
use crate::models::{Article, Preferences};

use super::preferences::build_preferences;

/// Points per previous like of the article's topic. Unbounded on purpose:
/// frequency is the dominant signal.
const LIKE_WEIGHT: f64 = 3.0;

/// Recency bonus for the topic's latest like; loses a point per day.
const RECENCY_DAYS: i64 = 5;

/// Freshness bonus for the article itself; loses a point per day.
const FRESHNESS_DAYS: i64 = 3;

pub fn score(article: &Article, prefs: &Preferences) -> f64 {
    score_at(article, prefs, Utc::now())
}

/// Score as of `now`. Higher is more relevant; every term is >= 0.
pub fn score_at(article: &Article, prefs: &Preferences, now: DateTime<Utc>) -> f64 {
    let mut score = 0.0;

    if let Some(pref) = article.topic.as_ref().and_then(|topic| prefs.get(topic)) {
        score += f64::from(pref.count) * LIKE_WEIGHT;

        let days_since_like = (now - pref.latest).num_days().max(0);
        score += (RECENCY_DAYS - days_since_like).max(0) as f64;
    }

    if let Some(published_at) = article.published_at {
        let days_old = (now.date_naive() - published_at.date_naive())
            .num_days()
            .max(0);
        score += (FRESHNESS_DAYS - days_old).max(0) as f64;
    }

    score
}

/// Ranks unseen articles against the affinity profile.
pub struct Recommender<S: ?Sized> {
    store: Arc<S>,
}

impl<S: RecommendationStore + ?Sized> Recommender<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Top `limit` eligible articles, marked as recommended.
    ///
    /// Marking happens before anything is delivered, so an article is
    /// surfaced at most once even if the caller never shows it.
    pub async fn recommend(&self, limit: usize) -> Result<Vec<Article>> {
        let now = Utc::now();

        let prefs = build_preferences(self.store.as_ref()).await?;
        if prefs.is_empty() {
            info!("No liked topics yet, skipping recommendations");
            return Ok(Vec::new());
        }

        let candidates = self.store.eligible_articles().await?;
        if candidates.is_empty() {
            info!("No unseen articles available");
            return Ok(Vec::new());
        }

        let picked = rank(candidates, &prefs, now, limit);

        let ids: Vec<i64> = picked.iter().map(|a| a.id).collect();
        self.store.mark_recommended(&ids, now).await?;

        info!(count = picked.len(), "Recommended articles");
        Ok(picked)
    }
}

/// Sort by score descending, keeping input order among equal scores.
pub fn rank(
    candidates: Vec<Article>,
    prefs: &Preferences,
    now: DateTime<Utc>,
    limit: usize,
) -> Vec<Article> {
    let mut scored: Vec<(f64, Article)> = candidates
        .into_iter()
        .map(|article| (score_at(&article, prefs, now), article))
        .collect();

    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

    scored
        .into_iter()
        .take(limit)
        .map(|(_, article)| article)
        .collect()
}
