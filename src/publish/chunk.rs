fn flush(current: &mut String, current_len: &mut usize, chunks: &mut Vec<String>) {
    if !current.trim().is_empty() {
        chunks.push(std::mem::take(current));
    }
    current.clear();
    *current_len = 0;
}

/// Split `text` into ordered chunks of at most `max_chars` characters.
///
/// Chunks break between lines. A line longer than `max_chars` on its own is
/// cut on character boundaries. Blank lines at the start of a chunk are
/// dropped and whitespace-only chunks are never emitted.
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for line in text.lines() {
        let line_len = line.chars().count();

        if line_len > max_chars {
            flush(&mut current, &mut current_len, &mut chunks);
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        if current.is_empty() {
            current.push_str(line);
            current_len = line_len;
        } else if current_len + 1 + line_len > max_chars {
            flush(&mut current, &mut current_len, &mut chunks);
            current.push_str(line);
            current_len = line_len;
        } else {
            current.push('\n');
            current.push_str(line);
            current_len += 1 + line_len;
        }
    }
    flush(&mut current, &mut current_len, &mut chunks);

    chunks
}
