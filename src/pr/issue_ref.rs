/// Extract a referenced issue number from the start of a PR title.
///
/// Heuristics, first match wins, all anchored at position 0:
///   `word(123): ...` or `word(#123): ...`
///   `#123 ...`
///   `123 - ...`, `123: ...`, `123- ...`
///   `123 Text ...`
///
/// A bare `1234` or `#1234` with nothing after it is not a reference.
pub fn extract_issue_number(title: &str) -> Option<u64> {
    conventional_scope(title)
        .or_else(|| hash_prefixed(title))
        .or_else(|| number_with_separator(title))
        .or_else(|| number_with_text(title))
}

/// Split off a leading run of ASCII digits.
fn leading_digits(s: &str) -> Option<(&str, &str)> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    Some(s.split_at(end))
}

fn parse_number(digits: &str) -> Option<u64> {
    digits.parse::<u64>().ok()
}

fn conventional_scope(title: &str) -> Option<u64> {
    let word_end = title
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(title.len());
    if word_end == 0 {
        return None;
    }
    let rest = title[word_end..].strip_prefix('(')?;
    let rest = rest.strip_prefix('#').unwrap_or(rest);
    let (digits, rest) = leading_digits(rest)?;
    rest.strip_prefix("):")?;
    parse_number(digits)
}

fn hash_prefixed(title: &str) -> Option<u64> {
    let rest = title.strip_prefix('#')?;
    let (digits, rest) = leading_digits(rest)?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    parse_number(digits)
}

fn number_with_separator(title: &str) -> Option<u64> {
    let (digits, rest) = leading_digits(title)?;
    let rest = rest.trim_start();
    if !(rest.starts_with('-') || rest.starts_with(':')) {
        return None;
    }
    parse_number(digits)
}

fn number_with_text(title: &str) -> Option<u64> {
    let (digits, rest) = leading_digits(title)?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    if !rest.trim_start().starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    parse_number(digits)
}
