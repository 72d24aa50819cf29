use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Output of the scrape stage.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedArticle {
    pub title: String,
    pub content: String,
    pub published_at: DateTime<Utc>,
}

/// Output of the translation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    pub title_en: String,
    pub content_en: String,
    pub summary_en: String,
}

/// Output of the classification service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub topic: String,
    pub sentiment: String,
    pub urgency: String,
}

pub const TOPICS: [&str; 8] = [
    "Politics",
    "Economy",
    "Society",
    "Technology",
    "Health",
    "Environment",
    "Sports",
    "Other",
];

pub const SENTIMENTS: [&str; 3] = ["Positive", "Neutral", "Negative"];

pub const URGENCIES: [&str; 3] = ["Breaking", "Normal", "Low"];
