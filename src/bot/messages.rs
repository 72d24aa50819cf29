use crate::models::Article;

use super::{Button, OutgoingMessage};

pub const RECOMMEND_MORE: &str = "recommend_more";

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn field(value: &Option<String>) -> String {
    escape(value.as_deref().unwrap_or("-"))
}

/// Freshly translated article with feedback buttons.
pub fn article_message(article: &Article, offer_more: bool) -> OutgoingMessage {
    let text = format!(
        "<b>{title}</b>\n\n\
         <b>Category:</b> {category}\n\
         <b>Topic:</b> {topic}\n\
         <b>Sentiment:</b> {sentiment}\n\
         <b>Urgency:</b> {urgency}\n\n\
         <b>Overview:</b>\n{summary}\n\n\
         <a href=\"{url}\">Read full article here</a>",
        title = escape(article.display_title()),
        category = article.category,
        topic = field(&article.topic),
        sentiment = field(&article.sentiment),
        urgency = field(&article.urgency),
        summary = field(&article.summary_en),
        url = escape(&article.source_url),
    );

    let mut buttons = vec![vec![
        Button::new("Interested!", format!("feedback:up:{}", article.id)),
        Button::new("Not interested", format!("feedback:down:{}", article.id)),
    ]];
    if offer_more {
        buttons.push(vec![Button::new("More recommendations", RECOMMEND_MORE)]);
    }

    OutgoingMessage { text, buttons }
}

/// Compact list, one `[topic] title` link per article.
pub fn recommendations_message(articles: &[Article]) -> OutgoingMessage {
    if articles.is_empty() {
        return OutgoingMessage::plain("No new recommendations yet.");
    }

    let lines: Vec<String> = articles
        .iter()
        .map(|a| {
            format!(
                "<b>[{}]</b> <a href=\"{}\">{}</a>",
                field(&a.topic),
                escape(&a.source_url),
                escape(a.display_title())
            )
        })
        .collect();

    OutgoingMessage::plain(format!("<b>Recommended for you</b>\n\n{}", lines.join("\n")))
}

pub fn feedback_reply(saved: bool, title: &str) -> OutgoingMessage {
    let label = if saved { "Saved:" } else { "Not saved:" };
    OutgoingMessage::plain(format!("<b>{label}</b> {}", escape(title)))
}
