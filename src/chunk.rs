use std::borrow::Cow;

/// Turn `\r\n` and lone `\r` into `\n` so every later stage sees one kind of
/// line ending.
pub fn normalize_line_endings(text: &str) -> Cow<'_, str> {
    if !text.contains('\r') {
        return Cow::Borrowed(text);
    }
    Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
}

/// Split normalized text into per-game chunks. A boundary is a blank line
/// directly followed by a line that opens a tag block. Fragments with neither
/// a tag line nor a numbered move are dropped.
pub fn split_chunks(text: &str) -> Vec<&str> {
    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut offset = 0usize;

    for (i, line) in lines.iter().enumerate() {
        offset += line.len();
        let blank = line.trim().is_empty();
        let next_opens_tags = lines
            .get(i + 1)
            .is_some_and(|next| next.trim_start().starts_with('['));
        if blank && next_opens_tags {
            chunks.push(&text[start..offset]);
            start = offset;
        }
    }
    if start < text.len() {
        chunks.push(&text[start..]);
    }

    chunks.retain(|chunk| looks_like_game(chunk));
    chunks
}

fn looks_like_game(chunk: &str) -> bool {
    chunk
        .lines()
        .any(|line| line.trim_start().starts_with('[') || has_move_number(line))
}

/// A digit run directly followed by a dot, e.g. `1.` or `23...`.
fn has_move_number(line: &str) -> bool {
    line.as_bytes()
        .windows(2)
        .any(|pair| pair[0].is_ascii_digit() && pair[1] == b'.')
}
