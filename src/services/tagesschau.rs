use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

use crate::error::{CollaboratorError, Result};
use crate::models::{Category, ScrapedArticle};
use crate::pipeline::{ArticleSource, Scraper};

const USER_AGENT_STRING: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// Fetches tagesschau.de category and article pages over plain HTTP.
pub struct TagesschauScraper {
    client: Client,
    base_url: Url,
}

impl TagesschauScraper {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT_STRING)
            .build()?;
        let base_url = Url::parse(base_url).map_err(|e| anyhow::anyhow!("Invalid source URL: {e}"))?;
        Ok(Self { client, base_url })
    }

    async fn fetch_html(&self, url: &str) -> std::result::Result<String, CollaboratorError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(CollaboratorError::Runtime(format!(
                "Failed to fetch {url}: HTTP {}",
                response.status()
            )));
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl Scraper for TagesschauScraper {
    async fn scrape(&self, url: &str) -> std::result::Result<ScrapedArticle, CollaboratorError> {
        tracing::info!(url, "Scraping article");
        let html = self.fetch_html(url).await?;
        parse_article(&html, Utc::now())
    }
}

#[async_trait]
impl ArticleSource for TagesschauScraper {
    async fn index(&self, category: Category) -> std::result::Result<Vec<String>, CollaboratorError> {
        let page = self
            .base_url
            .join(&format!("{}/", category.slug()))
            .map_err(|e| CollaboratorError::Runtime(e.to_string()))?;
        let html = self.fetch_html(page.as_str()).await?;
        let links = parse_index(&html, &self.base_url)?;
        if links.is_empty() {
            return Err(CollaboratorError::Runtime("No article links found.".into()));
        }
        Ok(links)
    }
}

fn selector(css: &str) -> std::result::Result<Selector, CollaboratorError> {
    Selector::parse(css).map_err(|e| CollaboratorError::Runtime(format!("Bad selector {css}: {e}")))
}

/// Title from the first `<h1>`, body from the article's paragraphs, date
/// from the "Stand:" marker (falling back to `now`).
pub fn parse_article(
    html: &str,
    now: DateTime<Utc>,
) -> std::result::Result<ScrapedArticle, CollaboratorError> {
    let document = Html::parse_document(html);

    let title = document
        .select(&selector("h1")?)
        .next()
        .map(|h1| h1.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| CollaboratorError::Runtime("No <h1> title found.".into()))?;

    let paragraphs: Vec<String> = document
        .select(&selector("article p")?)
        .map(|p| p.text().collect::<String>().trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    if paragraphs.is_empty() {
        return Err(CollaboratorError::Runtime("No article body found.".into()));
    }

    let text = document.root_element().text().collect::<String>();
    let published_at = parse_stand_date(&text).unwrap_or(now);

    Ok(ScrapedArticle {
        title,
        content: paragraphs.join("\n\n"),
        published_at,
    })
}

/// `Stand: 19.10.2026 14:05 Uhr` -> 2026-10-19T00:00:00Z
fn parse_stand_date(text: &str) -> Option<DateTime<Utc>> {
    let re = Regex::new(r"Stand:\s*(\d{2}\.\d{2}\.\d{4})").ok()?;
    let raw = re.captures(text)?.get(1)?.as_str();
    NaiveDate::parse_from_str(raw, "%d.%m.%Y")
        .ok()?
        .and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
}

/// Absolute article URLs linked from a category page, in page order.
pub fn parse_index(html: &str, base: &Url) -> std::result::Result<Vec<String>, CollaboratorError> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();

    let links = document
        .select(&selector("main a[href*='-100.html']")?)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| base.join(href).ok())
        .map(|url| url.to_string())
        .filter(|url| seen.insert(url.clone()))
        .collect();

    Ok(links)
}
