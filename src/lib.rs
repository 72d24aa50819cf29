//! German news pipeline: discovers tagesschau.de articles, scrapes and
//! translates them through claim-based stages, and recommends unseen
//! articles from the reader's likes.

pub mod ai;
pub mod bot;
pub mod config;
pub mod db;
pub mod error;
pub mod feedback;
pub mod models;
pub mod pipeline;
pub mod recommend;
pub mod services;
