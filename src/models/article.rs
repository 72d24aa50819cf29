use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ParseEnumError;

/// Pipeline state of an article.
///
/// ```text
/// new -> scraping -> scraped -> translating -> translated
///           |                        |
///           +-> failed               +-> failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    #[default]
    New,
    Scraping,
    Scraped,
    Translating,
    Translated,
    Failed,
}

impl ArticleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleStatus::New => "new",
            ArticleStatus::Scraping => "scraping",
            ArticleStatus::Scraped => "scraped",
            ArticleStatus::Translating => "translating",
            ArticleStatus::Translated => "translated",
            ArticleStatus::Failed => "failed",
        }
    }

    /// Whether `self -> next` is an edge of the pipeline graph.
    pub fn can_advance_to(&self, next: ArticleStatus) -> bool {
        use ArticleStatus::*;
        matches!(
            (self, next),
            (New, Scraping)
                | (Scraping, Scraped)
                | (Scraping, Failed)
                | (Scraped, Translating)
                | (Translating, Translated)
                | (Translating, Failed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ArticleStatus::Translated | ArticleStatus::Failed)
    }
}

impl fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArticleStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(ArticleStatus::New),
            "scraping" => Ok(ArticleStatus::Scraping),
            "scraped" => Ok(ArticleStatus::Scraped),
            "translating" => Ok(ArticleStatus::Translating),
            "translated" => Ok(ArticleStatus::Translated),
            "failed" => Ok(ArticleStatus::Failed),
            other => Err(ParseEnumError::new("status", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    Up,
    Down,
}

impl Feedback {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feedback::Up => "up",
            Feedback::Down => "down",
        }
    }
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Feedback {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Feedback::Up),
            "down" => Ok(Feedback::Down),
            other => Err(ParseEnumError::new("feedback", other)),
        }
    }
}

/// Tagesschau section an article was discovered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "USA")]
    Usa,
    Inland,
    Ausland,
    Wirtschaft,
    Wissen,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Usa,
        Category::Inland,
        Category::Ausland,
        Category::Wirtschaft,
        Category::Wissen,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Usa => "USA",
            Category::Inland => "Inland",
            Category::Ausland => "Ausland",
            Category::Wirtschaft => "Wirtschaft",
            Category::Wissen => "Wissen",
        }
    }

    /// Path segment of the category page on tagesschau.de
    pub fn slug(&self) -> &'static str {
        match self {
            Category::Usa => "ausland/amerika",
            Category::Inland => "inland",
            Category::Ausland => "ausland",
            Category::Wirtschaft => "wirtschaft",
            Category::Wissen => "wissen",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("category", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub source_url: String,
    pub category: Category,
    pub status: ArticleStatus,

    // scrape stage
    pub title_raw: Option<String>,
    pub content_raw: Option<String>,
    pub published_at: Option<DateTime<Utc>>,

    // translate stage
    pub title_en: Option<String>,
    pub content_en: Option<String>,
    pub summary_en: Option<String>,

    // classify stage
    pub topic: Option<String>,
    pub sentiment: Option<String>,
    pub urgency: Option<String>,

    pub feedback: Option<Feedback>,
    pub feedback_at: Option<DateTime<Utc>>,
    pub active: bool,
    pub recommended_at: Option<DateTime<Utc>>,
    pub discovered_at: DateTime<Utc>,
}

impl Article {
    /// Active, no feedback yet, never recommended.
    pub fn is_eligible(&self) -> bool {
        self.active && self.feedback.is_none() && self.recommended_at.is_none()
    }

    /// Best available title for display.
    pub fn display_title(&self) -> &str {
        self.title_en
            .as_deref()
            .or(self.title_raw.as_deref())
            .unwrap_or(&self.source_url)
    }
}

#[derive(Debug, Clone)]
pub struct NewArticle {
    pub source_url: String,
    pub category: Category,
}
