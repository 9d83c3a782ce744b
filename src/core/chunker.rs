/// Discord rejects messages above 2000 characters; stay clear of it so a short
/// heading can be prepended to the first chunk.
pub const CHUNK_CHARS: usize = 1800;

/// Splits `text` into ordered chunks of at most `max_chars` characters whose
/// concatenation is exactly `text`.
///
/// A chunk prefers to end right after a newline or space found in the last quarter
/// of its window; otherwise it is cut hard at `max_chars`.
#[must_use]
pub fn chunk_message(text: &str, max_chars: usize) -> Vec<String> {
    if text.is_empty() || max_chars == 0 {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    let soft_floor = max_chars - max_chars / 4;
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let remaining = chars.len() - start;
        if remaining <= max_chars {
            chunks.push(chars[start..].iter().collect());
            break;
        }

        let window = &chars[start..start + max_chars];
        let cut = window
            .iter()
            .rposition(|c| *c == '\n')
            .filter(|pos| *pos + 1 >= soft_floor)
            .or_else(|| {
                window
                    .iter()
                    .rposition(|c| c.is_whitespace())
                    .filter(|pos| *pos + 1 >= soft_floor)
            })
            .map(|pos| pos + 1)
            .unwrap_or(max_chars);

        chunks.push(chars[start..start + cut].iter().collect());
        start += cut;
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_has_no_chunks() {
        assert!(chunk_message("", 10).is_empty());
        assert!(chunk_message("abc", 0).is_empty());
    }

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(chunk_message("ciao", 10), vec!["ciao"]);
    }

    #[test]
    fn caption_of_5000_chars_gives_three_ordered_chunks() {
        let caption: String = (0..5000)
            .map(|i| char::from(b'a' + (i % 26) as u8))
            .collect();
        let chunks = chunk_message(&caption, 1800);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chars().count(), 1800);
        assert_eq!(chunks[1].chars().count(), 1800);
        assert_eq!(chunks[2].chars().count(), 1400);
        assert_eq!(chunks.concat(), caption);
    }

    #[test]
    fn prose_of_5000_chars_still_gives_three_chunks() {
        let caption = "Scopri la nuova linea idroponica. ".repeat(148);
        let caption = &caption[..5000];
        let chunks = chunk_message(caption, 1800);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 1800));
        assert_eq!(chunks.concat(), caption);
    }

    #[test]
    fn prefers_breaking_after_newline() {
        let text = format!("{}\n{}", "a".repeat(16), "b".repeat(10));
        let chunks = chunk_message(&text, 20);
        assert_eq!(chunks[0], format!("{}\n", "a".repeat(16)));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn counts_characters_not_bytes() {
        let text = "è".repeat(25);
        let chunks = chunk_message(&text, 10);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
        assert_eq!(chunks.concat(), text);
    }
}
