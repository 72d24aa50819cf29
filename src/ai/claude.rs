use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{CollaboratorError, Result};
use crate::models::{Classification, Translation, SENTIMENTS, TOPICS, URGENCIES};
use crate::pipeline::{Classifier, Translator};

const CLAUDE_API_URL: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5";

const TRANSLATE_PROMPT: &str = r#"You translate German news articles into English.
Reply with a single JSON object and nothing else:
{"title_en": "...", "content_en": "...", "summary_en": "..."}
The summary is 2-3 sentences. Keep names and figures exact."#;

const CLASSIFY_PROMPT: &str = r#"You classify English news articles.
Reply with a single JSON object and nothing else:
{"topic": "...", "sentiment": "...", "urgency": "..."}
topic is one of: Politics, Economy, Society, Technology, Health, Environment, Sports, Other.
sentiment is one of: Positive, Neutral, Negative.
urgency is one of: Breaking, Normal, Low."#;

/// Characters of article body sent per request.
const MAX_CONTENT_CHARS: usize = 12_000;

#[derive(Debug, Serialize)]
struct MessageRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
    system: Option<String>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

/// Messages API client used for both translation and classification.
#[derive(Clone)]
pub struct ClaudeClient {
    client: Client,
    api_key: String,
    model: String,
}

impl ClaudeClient {
    pub fn new(api_key: String, model: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            client,
            api_key,
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        system: &str,
        user_message: String,
        max_tokens: u32,
    ) -> std::result::Result<String, CollaboratorError> {
        let request = MessageRequest {
            model: self.model.clone(),
            max_tokens,
            messages: vec![Message {
                role: "user".to_string(),
                content: user_message,
            }],
            system: Some(system.to_string()),
        };

        let response = self
            .client
            .post(CLAUDE_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(CollaboratorError::Runtime(format!(
                "Claude API error: {error_text}"
            )));
        }

        let message_response: MessageResponse = response.json().await?;

        Ok(message_response
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

fn truncate(text: &str) -> &str {
    match text.char_indices().nth(MAX_CONTENT_CHARS) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Models like to wrap JSON in a ```json fence. Take the outermost object.
fn extract_json<T: DeserializeOwned>(reply: &str) -> std::result::Result<T, CollaboratorError> {
    let start = reply.find('{');
    let end = reply.rfind('}');
    match (start, end) {
        (Some(start), Some(end)) if start < end => Ok(serde_json::from_str(&reply[start..=end])?),
        _ => Err(CollaboratorError::Validation(format!(
            "no JSON object in reply: {reply}"
        ))),
    }
}

fn non_empty(field: &str, value: &str) -> std::result::Result<(), CollaboratorError> {
    if value.trim().is_empty() {
        return Err(CollaboratorError::Validation(format!("{field} is empty")));
    }
    Ok(())
}

fn one_of(field: &str, value: &str, allowed: &[&str]) -> std::result::Result<(), CollaboratorError> {
    if !allowed.contains(&value) {
        return Err(CollaboratorError::Validation(format!(
            "{field} {value:?} is not one of {allowed:?}"
        )));
    }
    Ok(())
}

pub fn parse_translation(reply: &str) -> std::result::Result<Translation, CollaboratorError> {
    let translation: Translation = extract_json(reply)?;
    non_empty("title_en", &translation.title_en)?;
    non_empty("content_en", &translation.content_en)?;
    non_empty("summary_en", &translation.summary_en)?;
    Ok(translation)
}

pub fn parse_classification(reply: &str) -> std::result::Result<Classification, CollaboratorError> {
    let classification: Classification = extract_json(reply)?;
    one_of("topic", &classification.topic, &TOPICS)?;
    one_of("sentiment", &classification.sentiment, &SENTIMENTS)?;
    one_of("urgency", &classification.urgency, &URGENCIES)?;
    Ok(classification)
}

#[async_trait]
impl Translator for ClaudeClient {
    async fn translate(
        &self,
        title: &str,
        content: &str,
    ) -> std::result::Result<Translation, CollaboratorError> {
        let user_message = format!(
            "Title: {title}\n\nContent:\n{}",
            truncate(content)
        );
        let reply = self.complete(TRANSLATE_PROMPT, user_message, 4096).await?;
        parse_translation(&reply)
    }
}

#[async_trait]
impl Classifier for ClaudeClient {
    async fn classify(
        &self,
        title_en: &str,
        content_en: &str,
    ) -> std::result::Result<Classification, CollaboratorError> {
        let user_message = format!(
            "Title: {title_en}\n\nContent:\n{}",
            truncate(content_en)
        );
        let reply = self.complete(CLASSIFY_PROMPT, user_message, 256).await?;
        parse_classification(&reply)
    }
}
