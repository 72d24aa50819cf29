use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::bot::{Button, Notifier, OutgoingMessage};
use crate::error::{AppError, Result};

const TELEGRAM_API_URL: &str = "https://api.telegram.org";

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<InlineKeyboard<'a>>,
}

#[derive(Debug, Serialize)]
struct InlineKeyboard<'a> {
    inline_keyboard: Vec<Vec<InlineButton<'a>>>,
}

#[derive(Debug, Serialize)]
struct InlineButton<'a> {
    text: &'a str,
    callback_data: &'a str,
}

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    description: Option<String>,
}

/// Bot API `sendMessage` client.
pub struct TelegramNotifier {
    client: Client,
    token: String,
}

impl TelegramNotifier {
    pub fn new(token: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client, token })
    }
}

fn keyboard(rows: &[Vec<Button>]) -> Option<InlineKeyboard<'_>> {
    if rows.is_empty() {
        return None;
    }
    Some(InlineKeyboard {
        inline_keyboard: rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|b| InlineButton {
                        text: &b.label,
                        callback_data: &b.callback_data,
                    })
                    .collect()
            })
            .collect(),
    })
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn deliver(&self, chat_id: &str, message: &OutgoingMessage) -> Result<()> {
        let request = SendMessageRequest {
            chat_id,
            text: &message.text,
            parse_mode: "HTML",
            disable_web_page_preview: true,
            reply_markup: keyboard(&message.buttons),
        };

        let response = self
            .client
            .post(format!("{}/bot{}/sendMessage", TELEGRAM_API_URL, self.token))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body: TelegramResponse = response.json().await?;
        if !status.is_success() || !body.ok {
            return Err(AppError::TelegramApi(
                body.description
                    .unwrap_or_else(|| format!("HTTP {status}")),
            ));
        }

        Ok(())
    }
}
