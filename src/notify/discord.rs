// src/notify/discord.rs
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::Notifier;
use crate::error::NotifyError;

pub const DISCORD_API_BASE: &str = "https://discord.com/api/v10";

/// Discord bot over the REST API.
#[derive(Clone)]
pub struct DiscordNotifier {
    api_base: String,
    token: String,
    client: Client,
    timeout: Duration,
}

#[derive(Serialize)]
struct CreateMessage<'a> {
    content: &'a str,
}

#[derive(Deserialize)]
struct CurrentUser {
    username: String,
}

impl DiscordNotifier {
    pub fn new(token: String) -> Self {
        Self {
            api_base: DISCORD_API_BASE.to_string(),
            token,
            client: Client::new(),
            timeout: Duration::from_secs(5),
        }
    }

    /// Point at another API root (tests, proxies).
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    /// Per-request HTTP timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn auth(&self) -> String {
        format!("Bot {}", self.token)
    }

    /// Readiness check: resolves the bot user. Returns its name.
    pub async fn connect(&self) -> Result<String, NotifyError> {
        let rsp = self
            .client
            .get(format!("{}/users/@me", self.api_base))
            .header("Authorization", self.auth())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        let rsp = check_status(rsp).await?;
        let me: CurrentUser = rsp
            .json()
            .await
            .map_err(|e| NotifyError::Transport(format!("decode /users/@me: {e}")))?;
        Ok(me.username)
    }
}

async fn check_status(rsp: reqwest::Response) -> Result<reqwest::Response, NotifyError> {
    let status = rsp.status();
    if status.is_success() {
        return Ok(rsp);
    }
    let body = rsp.text().await.unwrap_or_default();
    Err(NotifyError::Http {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn send(&self, channel_id: &str, text: &str) -> Result<(), NotifyError> {
        let rsp = self
            .client
            .post(format!("{}/channels/{}/messages", self.api_base, channel_id))
            .header("Authorization", self.auth())
            .timeout(self.timeout)
            .json(&CreateMessage { content: text })
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        check_status(rsp).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "discord"
    }
}
