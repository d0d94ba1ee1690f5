// src/notify/mod.rs
pub mod discord;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::NotifyError;

pub use discord::DiscordNotifier;

/// Chat gateway capability: one plain-text message to one channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, channel_id: &str, text: &str) -> Result<(), NotifyError>;
    fn name(&self) -> &'static str;
}

/// Announcement body for one summarized post.
pub fn format_summary_message(summary: &str) -> String {
    format!("**Summary of Important Post:**\n{summary}")
}

/// Send with a bounded timeout. No retries; the caller logs failures.
pub async fn notify(
    notifier: &dyn Notifier,
    channel_id: &str,
    message: &str,
    timeout: Duration,
) -> Result<(), NotifyError> {
    tokio::time::timeout(timeout, notifier.send(channel_id, message))
        .await
        .map_err(|_| NotifyError::Timeout(timeout))?
}
