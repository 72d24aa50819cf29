mod memory;
mod repository;
mod schema;
mod store;

pub use memory::{blank_article, MemoryStore};
pub use repository::Repository;
pub use store::{
    ClaimStore, DiscoveryStore, FeedbackStore, PreferenceStore, RecommendationStore, StageStore,
};
