use std::collections::HashMap;

use chrono::{DateTime, Utc};

/// Affinity for one topic, derived from positive feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopicPreference {
    pub count: u32,
    pub latest: DateTime<Utc>,
}

impl TopicPreference {
    /// Fold one more like into the preference.
    pub fn record(&mut self, liked_at: DateTime<Utc>) {
        self.count += 1;
        if liked_at > self.latest {
            self.latest = liked_at;
        }
    }
}

/// Topic -> affinity lookup table.
pub type Preferences = HashMap<String, TopicPreference>;
