use crate::db::PreferenceStore;
use crate::error::Result;
use crate::models::{Article, Preferences, TopicPreference};

/// Build the topic affinity profile from every active, liked article.
///
/// Always read fresh: feedback recorded a moment ago must count.
pub async fn build_preferences<S>(store: &S) -> Result<Preferences>
where
    S: PreferenceStore + ?Sized,
{
    let liked = store.liked_articles().await?;
    Ok(aggregate(&liked))
}

pub fn aggregate(liked: &[Article]) -> Preferences {
    let mut prefs = Preferences::new();

    for article in liked {
        // Both should be set on a liked article; tolerate rows that aren't.
        let (Some(topic), Some(liked_at)) = (&article.topic, article.feedback_at) else {
            continue;
        };

        prefs
            .entry(topic.clone())
            .and_modify(|pref| pref.record(liked_at))
            .or_insert(TopicPreference {
                count: 1,
                latest: liked_at,
            });
    }

    prefs
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::db::{blank_article, MemoryStore};
    use crate::models::{Category, Feedback};

    fn liked(topic: Option<&str>, days_ago: i64) -> Article {
        let mut article = blank_article("https://www.tagesschau.de/x-100.html", Category::Inland);
        article.topic = topic.map(str::to_string);
        article.feedback = Some(Feedback::Up);
        article.feedback_at = Some(Utc::now() - Duration::days(days_ago));
        article
    }

    #[test]
    fn counts_likes_and_keeps_most_recent() {
        let rows = vec![
            liked(Some("Economy"), 4),
            liked(Some("Economy"), 1),
            liked(Some("Economy"), 7),
            liked(Some("Health"), 2),
        ];
        let prefs = aggregate(&rows);

        assert_eq!(prefs.len(), 2);
        let economy = prefs["Economy"];
        assert_eq!(economy.count, 3);
        assert_eq!(Some(economy.latest), rows[1].feedback_at);
        assert_eq!(prefs["Health"].count, 1);
    }

    #[test]
    fn skips_rows_missing_topic_or_timestamp() {
        let mut no_time = liked(Some("Sports"), 0);
        no_time.feedback_at = None;
        let rows = vec![liked(None, 0), no_time];

        assert!(aggregate(&rows).is_empty());
    }

    #[tokio::test]
    async fn ignores_dislikes_and_inactive_rows() {
        let store = MemoryStore::new();
        store.insert(liked(Some("Politics"), 0)).await;

        let mut inactive = liked(Some("Politics"), 0);
        inactive.active = false;
        store.insert(inactive).await;

        let mut down = liked(Some("Sports"), 0);
        down.feedback = Some(Feedback::Down);
        store.insert(down).await;

        let prefs = build_preferences(&store).await.unwrap();
        assert_eq!(prefs.len(), 1);
        assert_eq!(prefs["Politics"].count, 1);
    }
}
