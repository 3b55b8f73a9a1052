/// Language recorded for a fenced block without a tag.
pub const PLAIN_TEXT_LANGUAGE: &str = "plain text";

/// One formatted span of a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextRun {
    Plain(String),
    Bold(String),
    Code(String),
    Link { text: String, url: String },
    BoldLink { text: String, url: String },
}

impl TextRun {
    /// The visible text of the run, without markup.
    pub fn text(&self) -> &str {
        match self {
            TextRun::Plain(text) | TextRun::Bold(text) | TextRun::Code(text) => text,
            TextRun::Link { text, .. } | TextRun::BoldLink { text, .. } => text,
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            TextRun::Link { url, .. } | TextRun::BoldLink { url, .. } => Some(url),
            _ => None,
        }
    }

    pub fn is_bold(&self) -> bool {
        matches!(self, TextRun::Bold(_) | TextRun::BoldLink { .. })
    }

    pub fn is_code(&self) -> bool {
        matches!(self, TextRun::Code(_))
    }
}

/// One structural unit of a parsed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Level is 1..=3
    Heading { level: u8, runs: Vec<TextRun> },
    Paragraph { runs: Vec<TextRun> },
    ListItem { ordered: bool, runs: Vec<TextRun> },
    Divider,
    CodeBlock { language: String, text: String },
}
