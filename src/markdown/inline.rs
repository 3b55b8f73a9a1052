use super::types::TextRun;

/// A recognized span starting at the scan position.
struct Span {
    run: TextRun,
    /// Bytes consumed, markup included
    len: usize,
}

/// `[text](url)` at the start of `s`. Text must not contain `]`, url must not
/// contain `)`, and neither may be empty.
fn link_parts(s: &str) -> Option<(&str, &str, usize)> {
    let rest = s.strip_prefix('[')?;
    let text_end = rest.find(']')?;
    let text = &rest[..text_end];
    let after = rest[text_end + 1..].strip_prefix('(')?;
    let url_end = after.find(')')?;
    let url = &after[..url_end];
    if text.is_empty() || url.is_empty() {
        return None;
    }
    // '[' + text + "](" + url + ')'
    Some((text, url, 1 + text_end + 2 + url_end + 1))
}

fn bold_link(s: &str) -> Option<Span> {
    let rest = s.strip_prefix("**")?;
    let (text, url, len) = link_parts(rest)?;
    rest[len..].strip_prefix("**")?;
    Some(Span {
        run: TextRun::BoldLink {
            text: text.to_string(),
            url: url.to_string(),
        },
        len: len + 4,
    })
}

fn link(s: &str) -> Option<Span> {
    let (text, url, len) = link_parts(s)?;
    Some(Span {
        run: TextRun::Link {
            text: text.to_string(),
            url: url.to_string(),
        },
        len,
    })
}

/// Text between a pair of single-character delimiters, none inside.
fn delimited(s: &str, open: &str, close: char) -> Option<(String, usize)> {
    let rest = s.strip_prefix(open)?;
    let end = rest.find(close)?;
    if end == 0 {
        return None;
    }
    Some((rest[..end].to_string(), open.len() + end))
}

fn bold(s: &str) -> Option<Span> {
    let (text, consumed) = delimited(s, "**", '*')?;
    s[consumed..].strip_prefix("**")?;
    Some(Span {
        run: TextRun::Bold(text),
        len: consumed + 2,
    })
}

fn code(s: &str) -> Option<Span> {
    let (text, consumed) = delimited(s, "`", '`')?;
    Some(Span {
        run: TextRun::Code(text),
        len: consumed + 1,
    })
}

/// Matchers tried at each position, in priority order. Bold-link must come
/// before both link and bold.
const MATCHERS: &[fn(&str) -> Option<Span>] = &[bold_link, link, bold, code];

/// Split one line into formatted runs.
///
/// A single left-to-right pass: at each position the matchers are tried in
/// order and the first hit is consumed whole; otherwise one character is
/// added to the pending plain text. Recognized spans are never re-scanned, so
/// markup nested inside a span stays literal in that span's text.
pub fn tokenize(line: &str) -> Vec<TextRun> {
    let mut runs = Vec::new();
    let mut plain = String::new();
    let mut pos = 0;

    while pos < line.len() {
        let rest = &line[pos..];
        match MATCHERS.iter().find_map(|m| m(rest)) {
            Some(span) => {
                if !plain.is_empty() {
                    runs.push(TextRun::Plain(std::mem::take(&mut plain)));
                }
                runs.push(span.run);
                pos += span.len;
            }
            None => {
                // rest is non-empty, so a char exists
                let c = rest.chars().next().unwrap_or_default();
                plain.push(c);
                pos += c.len_utf8();
            }
        }
    }

    if !plain.is_empty() || runs.is_empty() {
        runs.push(TextRun::Plain(plain));
    }
    runs
}
