use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use super::{Delivery, PublishError, Publisher};
use crate::config::NotionConfig;
use crate::markdown::{parse_blocks, Block, TextRun, PLAIN_TEXT_LANGUAGE};
use crate::report::ReleaseNotes;

const CHANNEL: &str = "notion";
const PAGES_URL: &str = "https://api.notion.com/v1/pages";
const NOTION_VERSION: &str = "2022-06-28";

/// Notion rejects pages created with more children than this.
pub const MAX_BLOCKS: usize = 100;
/// Longest content Notion accepts in one rich text object.
pub const MAX_TEXT_CHARS: usize = 2000;

/// Blocks placed above the document body on every page.
fn header_blocks() -> Vec<Value> {
    vec![
        json!({ "object": "block", "type": "table_of_contents", "table_of_contents": {} }),
        json!({ "object": "block", "type": "divider", "divider": {} }),
    ]
}

/// Map common fence tags to the language names Notion accepts.
pub fn normalize_language(tag: &str) -> &'static str {
    match tag.to_lowercase().as_str() {
        "py" | "python" => "python",
        "rs" | "rust" => "rust",
        "js" | "javascript" => "javascript",
        "ts" | "typescript" => "typescript",
        "sh" | "bash" | "shell" | "zsh" => "shell",
        "json" => "json",
        "yaml" | "yml" => "yaml",
        "toml" => "toml",
        "go" | "golang" => "go",
        "sql" => "sql",
        "diff" => "diff",
        "markdown" | "md" => "markdown",
        _ => PLAIN_TEXT_LANGUAGE,
    }
}

/// Cut `text` into pieces of at most MAX_TEXT_CHARS characters.
fn split_content(text: &str) -> Vec<String> {
    if text.chars().count() <= MAX_TEXT_CHARS {
        return vec![text.to_string()];
    }
    text.chars()
        .collect::<Vec<char>>()
        .chunks(MAX_TEXT_CHARS)
        .map(|piece| piece.iter().collect())
        .collect()
}

fn text_object(content: &str, url: Option<&str>, bold: bool, code: bool) -> Value {
    let link = url.map(|u| json!({ "url": u }));
    json!({
        "type": "text",
        "text": { "content": content, "link": link },
        "annotations": { "bold": bold, "code": code },
    })
}

/// Convert runs to Notion rich text, splitting oversized runs.
pub fn rich_text(runs: &[TextRun]) -> Vec<Value> {
    runs.iter()
        .flat_map(|run| {
            split_content(run.text())
                .into_iter()
                .map(move |piece| text_object(&piece, run.url(), run.is_bold(), run.is_code()))
        })
        .collect()
}

pub fn to_notion_block(block: &Block) -> Value {
    match block {
        Block::Heading { level, runs } => {
            let kind = match level {
                1 => "heading_1",
                2 => "heading_2",
                _ => "heading_3",
            };
            json!({ "object": "block", "type": kind, kind: { "rich_text": rich_text(runs) } })
        }
        Block::Paragraph { runs } => {
            json!({ "object": "block", "type": "paragraph", "paragraph": { "rich_text": rich_text(runs) } })
        }
        Block::ListItem { ordered, runs } => {
            let kind = if *ordered {
                "numbered_list_item"
            } else {
                "bulleted_list_item"
            };
            json!({ "object": "block", "type": kind, kind: { "rich_text": rich_text(runs) } })
        }
        Block::Divider => json!({ "object": "block", "type": "divider", "divider": {} }),
        Block::CodeBlock { language, text } => {
            let runs = [TextRun::Plain(text.clone())];
            json!({
                "object": "block",
                "type": "code",
                "code": { "rich_text": rich_text(&runs), "language": normalize_language(language) },
            })
        }
    }
}

/// Header blocks followed by the parsed document, truncated in order so the
/// page never exceeds MAX_BLOCKS children.
pub fn page_children(markdown: &str) -> Vec<Value> {
    let mut children = header_blocks();
    let budget = MAX_BLOCKS.saturating_sub(children.len());
    let blocks = parse_blocks(markdown);
    if blocks.len() > budget {
        warn!(blocks = blocks.len(), kept = budget, "document truncated to fit Notion block limit");
    }
    children.extend(blocks.iter().take(budget).map(to_notion_block));
    children
}

/// Request body for creating the release notes page in a database.
pub fn page_payload(database_id: &str, notes: &ReleaseNotes) -> Value {
    json!({
        "parent": { "database_id": database_id },
        "properties": {
            "Name": { "title": [{ "text": { "content": notes.title } }] },
            "Date Range": { "rich_text": [{ "text": { "content": notes.date_range } }] },
            "Week": { "number": notes.week },
        },
        "children": page_children(&notes.markdown),
    })
}

#[derive(Debug, Deserialize)]
struct CreatedPage {
    id: String,
    #[serde(default)]
    url: Option<String>,
}

pub struct NotionPublisher {
    http: reqwest::Client,
    token: String,
    database_id: String,
}

impl NotionPublisher {
    pub fn from_config(config: &NotionConfig) -> Result<Self, PublishError> {
        let token = config.token.clone().ok_or(PublishError::NotConfigured {
            channel: CHANNEL,
            setting: "notion.token or NOTION_TOKEN",
        })?;
        let database_id = config.database_id.clone().ok_or(PublishError::NotConfigured {
            channel: CHANNEL,
            setting: "notion.database_id or NOTION_DATABASE_ID",
        })?;
        Ok(Self {
            http: reqwest::Client::new(),
            token,
            database_id,
        })
    }
}

#[async_trait]
impl Publisher for NotionPublisher {
    fn name(&self) -> &'static str {
        CHANNEL
    }

    #[instrument(skip(self, notes), fields(title = %notes.title))]
    async fn publish(&self, notes: &ReleaseNotes) -> Result<Delivery, PublishError> {
        let payload = page_payload(&self.database_id, notes);
        let response = self
            .http
            .post(PAGES_URL)
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
            .json(&payload)
            .send()
            .await
            .map_err(|source| PublishError::Http { channel: CHANNEL, source })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Rejected {
                channel: CHANNEL,
                status: status.as_u16(),
                body,
            });
        }

        let page = response
            .json::<CreatedPage>()
            .await
            .map_err(|source| PublishError::Http { channel: CHANNEL, source })?;
        info!(page_id = %page.id, "created Notion page");

        Ok(Delivery {
            channel: CHANNEL.to_string(),
            detail: page.url.unwrap_or(page.id),
        })
    }
}
