pub mod inline;
pub mod types;

pub use inline::tokenize;
pub use types::{Block, TextRun, PLAIN_TEXT_LANGUAGE};

/// Parser state between lines.
enum State {
    Normal,
    InCodeBlock { language: String, buffer: String },
}

/// The language tag of a fence line, or None if the line is not a fence.
/// A fence is three backticks optionally followed by a single-word tag.
fn fence_language(line: &str) -> Option<&str> {
    let tag = line.trim().strip_prefix("```")?.trim();
    if tag.contains(|c: char| c == '`' || c.is_whitespace()) {
        return None;
    }
    Some(tag)
}

/// `<digits>. text`
fn ordered_item(line: &str) -> Option<&str> {
    let digits_end = line.find(|c: char| !c.is_ascii_digit())?;
    if digits_end == 0 {
        return None;
    }
    line[digits_end..].strip_prefix(". ")
}

fn unordered_item(line: &str) -> Option<&str> {
    line.strip_prefix("* ").or_else(|| line.strip_prefix("- "))
}

fn is_divider(line: &str) -> bool {
    line.len() >= 3 && line.chars().all(|c| c == '-')
}

/// Classify one trimmed, non-blank line outside a code block.
fn parse_line(line: &str) -> Block {
    if let Some(text) = line.strip_prefix("### ") {
        Block::Heading { level: 3, runs: tokenize(text.trim()) }
    } else if let Some(text) = line.strip_prefix("## ") {
        Block::Heading { level: 2, runs: tokenize(text.trim()) }
    } else if let Some(text) = line.strip_prefix("# ") {
        Block::Heading { level: 1, runs: tokenize(text.trim()) }
    } else if let Some(text) = ordered_item(line) {
        Block::ListItem { ordered: true, runs: tokenize(text.trim()) }
    } else if let Some(text) = unordered_item(line) {
        Block::ListItem { ordered: false, runs: tokenize(text.trim()) }
    } else if is_divider(line) {
        Block::Divider
    } else {
        Block::Paragraph { runs: tokenize(line) }
    }
}

/// Parse markdown into blocks, one physical line at a time.
///
/// Lines are matched after trimming surrounding whitespace, so indented list
/// items come out as flat items. Lines inside a fenced code block are kept
/// verbatim. A fence still open at end of input is dropped with its content.
pub fn parse_blocks(markdown: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut state = State::Normal;

    for line in markdown.lines() {
        if let Some(tag) = fence_language(line) {
            state = match state {
                State::Normal => State::InCodeBlock {
                    language: if tag.is_empty() {
                        PLAIN_TEXT_LANGUAGE.to_string()
                    } else {
                        tag.to_string()
                    },
                    buffer: String::new(),
                },
                State::InCodeBlock { language, buffer } => {
                    let text = buffer.strip_prefix('\n').unwrap_or(buffer.as_str()).to_string();
                    blocks.push(Block::CodeBlock { language, text });
                    State::Normal
                }
            };
            continue;
        }

        match &mut state {
            State::InCodeBlock { buffer, .. } => {
                buffer.push('\n');
                buffer.push_str(line);
            }
            State::Normal => {
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    blocks.push(parse_line(trimmed));
                }
            }
        }
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(s: &str) -> Vec<TextRun> {
        vec![TextRun::Plain(s.to_string())]
    }

    #[test]
    fn test_headings() {
        let blocks = parse_blocks("# One\n## Two\n### Three\n#### Four\n#NoSpace");
        assert_eq!(
            blocks,
            vec![
                Block::Heading { level: 1, runs: plain("One") },
                Block::Heading { level: 2, runs: plain("Two") },
                Block::Heading { level: 3, runs: plain("Three") },
                Block::Paragraph { runs: plain("#### Four") },
                Block::Paragraph { runs: plain("#NoSpace") },
            ]
        );
    }

    #[test]
    fn test_list_items() {
        let blocks = parse_blocks("1. first\n12. twelfth\n* star\n- dash\n  - nested\n-nospace");
        assert_eq!(
            blocks,
            vec![
                Block::ListItem { ordered: true, runs: plain("first") },
                Block::ListItem { ordered: true, runs: plain("twelfth") },
                Block::ListItem { ordered: false, runs: plain("star") },
                Block::ListItem { ordered: false, runs: plain("dash") },
                Block::ListItem { ordered: false, runs: plain("nested") },
                Block::Paragraph { runs: plain("-nospace") },
            ]
        );
    }

    #[test]
    fn test_divider_and_blank_lines() {
        let blocks = parse_blocks("above\n\n---\n   \n-----\n--\nbelow");
        assert_eq!(
            blocks,
            vec![
                Block::Paragraph { runs: plain("above") },
                Block::Divider,
                Block::Divider,
                Block::Paragraph { runs: plain("--") },
                Block::Paragraph { runs: plain("below") },
            ]
        );
    }

    #[test]
    fn test_closed_code_fence() {
        let blocks = parse_blocks("```py\nprint(1)\n```");
        assert_eq!(
            blocks,
            vec![Block::CodeBlock {
                language: "py".to_string(),
                text: "print(1)".to_string()
            }]
        );
    }

    #[test]
    fn test_unterminated_code_fence_is_dropped() {
        assert!(parse_blocks("```py\nprint(1)").is_empty());
        let blocks = parse_blocks("before\n```\n# not a heading");
        assert_eq!(blocks, vec![Block::Paragraph { runs: plain("before") }]);
    }

    #[test]
    fn test_code_block_keeps_lines_verbatim() {
        let blocks = parse_blocks("```\n# heading?\n\n  - item?\n---\n```\nafter");
        assert_eq!(
            blocks,
            vec![
                Block::CodeBlock {
                    language: PLAIN_TEXT_LANGUAGE.to_string(),
                    text: "# heading?\n\n  - item?\n---".to_string()
                },
                Block::Paragraph { runs: plain("after") },
            ]
        );
    }

    #[test]
    fn test_empty_code_block() {
        let blocks = parse_blocks("```rust\n```");
        assert_eq!(
            blocks,
            vec![Block::CodeBlock {
                language: "rust".to_string(),
                text: String::new()
            }]
        );
    }

    #[test]
    fn test_inline_runs_inside_blocks() {
        let blocks = parse_blocks("- **[PR #7](https://x/7)** Add thing");
        assert_eq!(
            blocks,
            vec![Block::ListItem {
                ordered: false,
                runs: vec![
                    TextRun::BoldLink {
                        text: "PR #7".to_string(),
                        url: "https://x/7".to_string()
                    },
                    TextRun::Plain(" Add thing".to_string()),
                ]
            }]
        );
    }

    #[test]
    fn test_fence_with_spaced_text_is_not_a_fence() {
        let blocks = parse_blocks("```not a fence");
        assert_eq!(blocks, vec![Block::Paragraph { runs: plain("```not a fence") }]);
    }
}
