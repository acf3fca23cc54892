const BREAK_CHARS: &[char] = &['.', '!', '?', ',', ';', ':', '।', '॥', '\n'];

/// Splits `text` into pieces of at most `max_chars` characters, cutting after
/// punctuation when possible, then at whitespace, then mid-word.
pub(crate) fn split_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut rest = text.trim();

    while !rest.is_empty() {
        let limit = match rest.char_indices().nth(max_chars) {
            Some((idx, _)) => idx,
            None => {
                chunks.push(rest.to_string());
                break;
            }
        };
        let window = &rest[..limit];
        let at_word_boundary = rest[limit..].starts_with(char::is_whitespace);
        let cut = window
            .char_indices()
            .rev()
            .find(|(_, ch)| BREAK_CHARS.contains(ch))
            .map(|(idx, ch)| idx + ch.len_utf8())
            .or_else(|| at_word_boundary.then_some(limit))
            .or_else(|| {
                window
                    .char_indices()
                    .rev()
                    .find(|(_, ch)| ch.is_whitespace())
                    .map(|(idx, _)| idx)
            })
            .filter(|idx| *idx > 0)
            .unwrap_or(limit);

        let (head, tail) = rest.split_at(cut);
        let head = head.trim();
        if !head.is_empty() {
            chunks.push(head.to_string());
        }
        rest = tail.trim_start();
    }
    chunks
}
