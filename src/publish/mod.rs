pub mod chunk;
pub mod discord;
pub mod notion;
pub mod slack;

pub use chunk::split_into_chunks;

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, info_span, warn, Instrument};

use crate::report::ReleaseNotes;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("{channel} request failed: {source}")]
    Http {
        channel: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{channel} is not configured: set {setting}")]
    NotConfigured {
        channel: &'static str,
        setting: &'static str,
    },

    #[error("{channel} rejected the request with status {status}: {body}")]
    Rejected {
        channel: &'static str,
        status: u16,
        body: String,
    },

    #[error("{channel} task did not complete: {reason}")]
    Task { channel: String, reason: String },
}

/// What a channel did with the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub channel: String,
    pub detail: String,
}

/// A destination for generated release notes.
/// Publishers must be Send + Sync to run concurrently.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Channel name used in logs and per-channel results (e.g., "notion")
    fn name(&self) -> &'static str;

    /// Deliver the document. Failures are reported, never retried.
    async fn publish(&self, notes: &ReleaseNotes) -> Result<Delivery, PublishError>;
}

/// Per-channel outcome, in the order the publishers were given.
pub type ChannelResult = (String, Result<Delivery, PublishError>);

/// Run every publisher concurrently. One channel failing does not stop the
/// others.
pub async fn publish_all(publishers: Vec<Arc<dyn Publisher>>, notes: Arc<ReleaseNotes>) -> Vec<ChannelResult> {
    let mut join_set: JoinSet<(usize, ChannelResult)> = JoinSet::new();
    let names: Vec<String> = publishers.iter().map(|p| p.name().to_string()).collect();

    for (index, publisher) in publishers.into_iter().enumerate() {
        let notes = notes.clone();
        let channel = publisher.name();
        join_set.spawn(
            async move {
                let result = publisher.publish(&notes).await;
                (index, (channel.to_string(), result))
            }
            .instrument(info_span!("publish", channel)),
        );
    }

    let mut slots: Vec<Option<ChannelResult>> = names.iter().map(|_| None).collect();
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((index, outcome)) => {
                debug!(channel = %outcome.0, ok = outcome.1.is_ok(), "publisher finished");
                slots[index] = Some(outcome);
            }
            Err(e) => warn!(error = %e, "publisher task panicked"),
        }
    }

    slots
        .into_iter()
        .zip(names)
        .map(|(slot, name)| {
            slot.unwrap_or_else(|| {
                let failure = PublishError::Task {
                    channel: name.clone(),
                    reason: "task aborted".to_string(),
                };
                (name, Err(failure))
            })
        })
        .collect()
}

/// POST each JSON payload in order, stopping at the first failure.
pub(crate) async fn post_payloads(
    http: &reqwest::Client,
    channel: &'static str,
    url: &str,
    payloads: Vec<Value>,
) -> Result<usize, PublishError> {
    let total = payloads.len();
    for (i, payload) in payloads.into_iter().enumerate() {
        let response = http
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(|source| PublishError::Http { channel, source })?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Rejected {
                channel,
                status: status.as_u16(),
                body,
            });
        }
        debug!(channel, part = i + 1, total, "posted message");
    }
    Ok(total)
}
