mod claude;

pub use claude::{parse_classification, parse_translation, ClaudeClient, DEFAULT_MODEL};
