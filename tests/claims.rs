use std::collections::HashSet;
use std::sync::Arc;

use futures::StreamExt;
use tagesbrief::db::{ClaimStore, DiscoveryStore, Repository, StageStore};
use tagesbrief::models::{ArticleStatus, Category, NewArticle, ScrapedArticle};
use tagesbrief::pipeline::TransitionEngine;
use tempfile::TempDir;

async fn open(dir: &TempDir) -> Repository {
    let path = dir.path().join("articles.db");
    Repository::new(path.to_str().unwrap()).await.unwrap()
}

async fn seed(repo: &Repository, count: usize) {
    for i in 0..count {
        repo.upsert_article(NewArticle {
            source_url: format!("https://www.tagesschau.de/inland/artikel-{i}-100.html"),
            category: Category::Inland,
        })
        .await
        .unwrap();
    }
}

#[tokio::test]
async fn concurrent_workers_on_one_file_claim_each_article_once() {
    let dir = tempfile::tempdir().unwrap();
    seed(&open(&dir).await, 40).await;

    // Separate connections, like separate worker processes.
    let mut workers = Vec::new();
    for _ in 0..4 {
        let repo = Arc::new(open(&dir).await);
        workers.push(tokio::spawn(async move {
            let engine = TransitionEngine::new(repo);
            let mut claimed = Vec::new();
            let claims = engine.claims(ArticleStatus::New, ArticleStatus::Scraping);
            futures::pin_mut!(claims);
            while let Some(article) = claims.next().await {
                claimed.push(article.unwrap().id);
            }
            claimed
        }));
    }

    let mut all = Vec::new();
    for worker in workers {
        all.extend(worker.await.unwrap());
    }

    let unique: HashSet<i64> = all.iter().copied().collect();
    assert_eq!(all.len(), 40);
    assert_eq!(unique.len(), 40);

    let repo = open(&dir).await;
    assert!(repo
        .get_articles_by_status(ArticleStatus::New)
        .await
        .unwrap()
        .is_empty());
    assert_eq!(
        repo.get_articles_by_status(ArticleStatus::Scraping)
            .await
            .unwrap()
            .len(),
        40
    );
}

#[tokio::test]
async fn stale_compare_and_set_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let repo = open(&dir).await;
    seed(&repo, 1).await;
    let id = repo
        .find_one_by_status(ArticleStatus::New)
        .await
        .unwrap()
        .unwrap()
        .id;

    assert!(repo
        .compare_and_set_status(id, ArticleStatus::New, ArticleStatus::Scraping)
        .await
        .unwrap());
    assert!(!repo
        .compare_and_set_status(id, ArticleStatus::New, ArticleStatus::Scraping)
        .await
        .unwrap());
    assert!(!repo
        .compare_and_set_status(999, ArticleStatus::New, ArticleStatus::Scraping)
        .await
        .unwrap());
}

#[tokio::test]
async fn rediscovery_never_overwrites_scraped_content() {
    let dir = tempfile::tempdir().unwrap();
    let repo = open(&dir).await;
    let url = "https://www.tagesschau.de/wirtschaft/konjunktur-100.html";
    let new = || NewArticle {
        source_url: url.to_string(),
        category: Category::Wirtschaft,
    };

    let (article, created) = repo.upsert_article(new()).await.unwrap();
    assert!(created);

    repo.compare_and_set_status(article.id, ArticleStatus::New, ArticleStatus::Scraping)
        .await
        .unwrap();
    repo.save_scraped(
        article.id,
        &ScrapedArticle {
            title: "Konjunktur".into(),
            content: "Die Wirtschaft wächst.".into(),
            published_at: chrono::Utc::now(),
        },
    )
    .await
    .unwrap();

    let (again, created) = repo.upsert_article(new()).await.unwrap();
    assert!(!created);
    assert_eq!(again.id, article.id);
    assert_eq!(again.status, ArticleStatus::Scraped);
    assert_eq!(again.title_raw.as_deref(), Some("Konjunktur"));
}

#[test]
fn reopening_an_existing_database_keeps_rows() {
    let dir = tempfile::tempdir().unwrap();

    tokio_test::block_on(async {
        seed(&open(&dir).await, 3).await;
    });
    let remaining = tokio_test::block_on(async {
        open(&dir)
            .await
            .get_articles_by_status(ArticleStatus::New)
            .await
            .unwrap()
    });

    assert_eq!(remaining.len(), 3);
}
