mod preferences;
mod scorer;

pub use preferences::{aggregate, build_preferences};
pub use scorer::{rank, score, score_at, Recommender};
