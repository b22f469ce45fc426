use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn send(&self, html: &str) -> Result<()>;
}

pub struct StdoutSink;

#[async_trait]
impl AlertSink for StdoutSink {
    async fn send(&self, html: &str) -> Result<()> {
        println!("{html}\n");
        Ok(())
    }
}

pub struct TelegramSink {
    client: Client,
    bot_token: String,
    chat_id: String,
}

impl TelegramSink {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        let client = Client::builder()
            .user_agent("farewatch/0.1")
            .timeout(Duration::from_secs(10))
            .build()
            .expect("failed to build Telegram HTTP client");
        Self {
            client,
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token)
    }
}

#[async_trait]
impl AlertSink for TelegramSink {
    async fn send(&self, html: &str) -> Result<()> {
        self.client
            .post(self.endpoint())
            .json(&serde_json::json!({
                "chat_id": self.chat_id,
                "text": html,
                "parse_mode": "HTML",
                "disable_web_page_preview": false,
            }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
