mod tagesschau;
mod telegram;

pub use tagesschau::{parse_article, parse_index, TagesschauScraper};
pub use telegram::TelegramNotifier;
