pub const SCHEMA: &str = r#"
-- articles table
CREATE TABLE IF NOT EXISTS articles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source_url TEXT NOT NULL UNIQUE,
    category TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'new',
    title_raw TEXT,
    content_raw TEXT,
    published_at TEXT,
    title_en TEXT,
    content_en TEXT,
    summary_en TEXT,
    topic TEXT,
    sentiment TEXT,
    urgency TEXT,
    feedback TEXT CHECK (feedback IN ('up', 'down')),
    feedback_at TEXT,
    active INTEGER NOT NULL DEFAULT 1,
    recommended_at TEXT,
    discovered_at TEXT NOT NULL DEFAULT (datetime('now')),
    CHECK ((feedback IS NULL) = (feedback_at IS NULL))
);

CREATE INDEX IF NOT EXISTS idx_articles_status ON articles(status);
CREATE INDEX IF NOT EXISTS idx_articles_feedback ON articles(feedback, active);
CREATE INDEX IF NOT EXISTS idx_articles_recommended_at ON articles(recommended_at);
"#;
