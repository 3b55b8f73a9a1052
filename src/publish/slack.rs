use async_trait::async_trait;
use serde_json::json;
use tracing::{info, instrument};

use super::{post_payloads, split_into_chunks, Delivery, PublishError, Publisher};
use crate::config::WebhookConfig;
use crate::markdown::{parse_blocks, Block, TextRun};
use crate::report::ReleaseNotes;

const CHANNEL: &str = "slack";
/// Slack truncates message text past 4000 characters.
pub const MAX_MESSAGE_CHARS: usize = 3900;

/// Slack reads `<...>` as links and mentions, so these three are entities.
fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn render_runs(runs: &[TextRun]) -> String {
    runs.iter()
        .map(|run| match run {
            TextRun::Plain(text) => escape(text),
            TextRun::Bold(text) => format!("*{}*", escape(text)),
            TextRun::Code(text) => format!("`{}`", escape(text)),
            TextRun::Link { text, url } => format!("<{}|{}>", url, escape(text)),
            TextRun::BoldLink { text, url } => format!("*<{}|{}>*", url, escape(text)),
        })
        .collect()
}

/// Rewrite markdown as Slack mrkdwn, one output line per block.
pub fn to_mrkdwn(markdown: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut ordinal = 0usize;

    for block in parse_blocks(markdown) {
        if !matches!(block, Block::ListItem { ordered: true, .. }) {
            ordinal = 0;
        }
        match block {
            Block::Heading { runs, .. } => {
                if !lines.is_empty() {
                    lines.push(String::new());
                }
                let text: String = runs.iter().map(|r| r.text()).collect();
                lines.push(format!("*{}*", escape(&text)));
            }
            Block::Paragraph { runs } => lines.push(render_runs(&runs)),
            Block::ListItem { ordered: true, runs } => {
                ordinal += 1;
                lines.push(format!("{}. {}", ordinal, render_runs(&runs)));
            }
            Block::ListItem { ordered: false, runs } => {
                lines.push(format!("• {}", render_runs(&runs)));
            }
            Block::Divider => lines.push("———".to_string()),
            Block::CodeBlock { text, .. } => lines.push(format!("```\n{}\n```", escape(&text))),
        }
    }

    lines.join("\n")
}

pub struct SlackPublisher {
    http: reqwest::Client,
    webhook_url: String,
}

impl SlackPublisher {
    pub fn from_config(config: &WebhookConfig) -> Result<Self, PublishError> {
        let webhook_url = config.webhook_url.clone().ok_or(PublishError::NotConfigured {
            channel: CHANNEL,
            setting: "slack.webhook_url or SLACK_WEBHOOK_URL",
        })?;
        Ok(Self {
            http: reqwest::Client::new(),
            webhook_url,
        })
    }
}

#[async_trait]
impl Publisher for SlackPublisher {
    fn name(&self) -> &'static str {
        CHANNEL
    }

    #[instrument(skip(self, notes), fields(title = %notes.title))]
    async fn publish(&self, notes: &ReleaseNotes) -> Result<Delivery, PublishError> {
        let payloads = split_into_chunks(&to_mrkdwn(&notes.markdown), MAX_MESSAGE_CHARS)
            .into_iter()
            .map(|chunk| json!({ "text": chunk }))
            .collect();
        let sent = post_payloads(&self.http, CHANNEL, &self.webhook_url, payloads).await?;
        info!(messages = sent, "posted release notes to Slack");

        Ok(Delivery {
            channel: CHANNEL.to_string(),
            detail: format!("posted {} message(s)", sent),
        })
    }
}
