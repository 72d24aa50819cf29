//! Article pipeline: discovery, claim-based stage runners and the
//! compare-and-swap transition engine they share.

mod discover;
mod runner;
mod scrape;
mod transition;
mod translate;

pub use discover::{ArticleSource, Discoverer};
pub use runner::{Stage, StageReport, StageRunner};
pub use scrape::{ScrapeStage, Scraper};
pub use transition::TransitionEngine;
pub use translate::{Classifier, TranslateStage, Translator};
