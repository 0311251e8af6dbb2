/// Split `text` into pieces of at most `max_chars` characters.
///
/// Each split happens at the last newline within reach of the cap, with the
/// newline kept at the start of the remainder. Without such a newline the
/// text is cut hard at the cap. Sizes are counted in `char`s.
pub fn split_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        // Byte offset of the first char past the cap; none means the rest fits.
        let Some((cap, next)) = remaining.char_indices().nth(max_chars) else {
            chunks.push(remaining.to_string());
            break;
        };

        // The char at the cap may itself be the newline: splitting there
        // still yields exactly `max_chars`.
        let window = &remaining[..cap + next.len_utf8()];
        let split_at = window
            .rfind('\n')
            .filter(|&at| at > 0)
            .unwrap_or(cap);

        chunks.push(remaining[..split_at].to_string());
        remaining = &remaining[split_at..];
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> usize {
        s.chars().count()
    }

    #[test]
    fn short_text_is_single_chunk() {
        assert_eq!(split_chunks("Hello, world!", 4096), vec!["Hello, world!"]);
    }

    #[test]
    fn empty_text_has_no_chunks() {
        assert!(split_chunks("", 4096).is_empty());
    }

    #[test]
    fn splits_at_newline_before_cap() {
        let mut text = "a".repeat(4050);
        text.push('\n');
        text.push_str(&"b".repeat(9000 - 4051));
        assert_eq!(chars(&text), 9000);

        let chunks = split_chunks(&text, 4096);
        assert_eq!(chars(&chunks[0]), 4050);
        assert!(chunks[1].starts_with('\n'));
        for c in &chunks {
            assert!(chars(c) <= 4096, "chunk too large: {}", chars(c));
        }
        assert_eq!(chunks.concat(), text);
        // remainder has no newline after its first char, so it is hard-split
        assert_eq!(chars(&chunks[1]), 4096);
        assert_eq!(chunks.len(), 3);
    }

    #[test]
    fn newline_exactly_at_cap_gives_full_chunk() {
        let text = format!("{}\n{}", "a".repeat(10), "b".repeat(5));
        let chunks = split_chunks(&text, 10);
        assert_eq!(chunks, vec!["a".repeat(10), format!("\n{}", "b".repeat(5))]);
    }

    #[test]
    fn no_newline_hard_splits() {
        let text = "x".repeat(9000);
        let chunks = split_chunks(&text, 4096);
        let sizes: Vec<usize> = chunks.iter().map(|c| chars(c)).collect();
        assert_eq!(sizes, vec![4096, 4096, 808]);
    }

    #[test]
    fn multibyte_text_is_counted_in_chars() {
        let text = "\u{00e9}".repeat(25);
        let chunks = split_chunks(&text, 10);
        let sizes: Vec<usize> = chunks.iter().map(|c| chars(c)).collect();
        assert_eq!(sizes, vec![10, 10, 5]);
    }

    #[test]
    fn many_lines_never_start_mid_line() {
        let line = format!("{}\n", "w".repeat(99));
        let text = line.repeat(100);
        let chunks = split_chunks(&text, 4096);
        for c in chunks.iter().skip(1) {
            assert!(c.starts_with('\n'));
        }
        assert_eq!(chunks.concat(), text);
    }
}
