use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{info, instrument};

use super::{post_payloads, split_into_chunks, Delivery, PublishError, Publisher};
use crate::config::WebhookConfig;
use crate::report::ReleaseNotes;

const CHANNEL: &str = "discord";
/// Discord rejects message content over 2000 characters.
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Webhook bodies for the document, in order. Discord renders the markdown
/// as-is.
pub fn payloads(markdown: &str) -> Vec<Value> {
    split_into_chunks(markdown, MAX_MESSAGE_CHARS)
        .into_iter()
        .map(|chunk| json!({ "content": chunk }))
        .collect()
}

pub struct DiscordPublisher {
    http: reqwest::Client,
    webhook_url: String,
}

impl DiscordPublisher {
    pub fn from_config(config: &WebhookConfig) -> Result<Self, PublishError> {
        let webhook_url = config.webhook_url.clone().ok_or(PublishError::NotConfigured {
            channel: CHANNEL,
            setting: "discord.webhook_url or DISCORD_WEBHOOK_URL",
        })?;
        Ok(Self {
            http: reqwest::Client::new(),
            webhook_url,
        })
    }
}

#[async_trait]
impl Publisher for DiscordPublisher {
    fn name(&self) -> &'static str {
        CHANNEL
    }

    #[instrument(skip(self, notes), fields(title = %notes.title))]
    async fn publish(&self, notes: &ReleaseNotes) -> Result<Delivery, PublishError> {
        let sent = post_payloads(&self.http, CHANNEL, &self.webhook_url, payloads(&notes.markdown)).await?;
        info!(messages = sent, "posted release notes to Discord");

        Ok(Delivery {
            channel: CHANNEL.to_string(),
            detail: format!("posted {} message(s)", sent),
        })
    }
}
