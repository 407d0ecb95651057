//! Message chunking for the webhook's length limit.

/// Maximum length of a single webhook message.
pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// Smallest `max_len` that fits any UTF-8 character.
pub const MIN_SPLIT_LENGTH: usize = 4;

/// Split `content` into chunks no longer than `max_len` bytes.
///
/// Chunks are built from whole lines where possible. A line that is longer
/// than `max_len` on its own is cut into `max_len`-sized pieces, and its
/// remainder starts the next chunk. Joining the chunks in order gives back
/// `content` exactly.
///
/// Content that already fits is returned as a single chunk, including the
/// empty string.
///
/// `max_len` must be at least [`MIN_SPLIT_LENGTH`], otherwise a character
/// wider than `max_len` would need a chunk of its own that exceeds it.
pub fn split_message(content: &str, max_len: usize) -> Vec<String> {
    if content.len() <= max_len {
        return vec![content.to_string()];
    }
    debug_assert!(
        max_len >= MIN_SPLIT_LENGTH,
        "max_len {} is below {}",
        max_len,
        MIN_SPLIT_LENGTH
    );

    let mut chunks = Vec::new();
    let mut current = String::with_capacity(max_len);

    for line in content.split_inclusive('\n') {
        let mut line = line;

        while line.len() > max_len {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            let cut = char_boundary_at_or_before(line, max_len);
            chunks.push(line[..cut].to_string());
            line = &line[cut..];
        }

        if current.len() + line.len() > max_len && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        current.push_str(line);
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Largest char boundary in `s` that is `<= index`, but never zero for a
/// non-empty `s` so that splitting always makes progress.
fn char_boundary_at_or_before(s: &str, index: usize) -> usize {
    let mut cut = index.min(s.len());
    while cut > 0 && !s.is_char_boundary(cut) {
        cut -= 1;
    }
    if cut == 0 {
        // Only reachable below MIN_SPLIT_LENGTH; emit the character whole.
        cut = s.chars().next().map_or(0, char::len_utf8);
    }
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_chunks_valid(content: &str, chunks: &[String], max_len: usize) {
        assert_eq!(chunks.concat(), content);
        for chunk in chunks {
            assert!(
                chunk.len() <= max_len,
                "chunk of {} bytes exceeds {}",
                chunk.len(),
                max_len
            );
        }
    }

    #[test]
    fn short_message_is_single_chunk() {
        assert_eq!(
            split_message("hello world", MAX_MESSAGE_LENGTH),
            vec!["hello world"]
        );
    }

    #[test]
    fn empty_message_is_single_empty_chunk() {
        assert_eq!(split_message("", MAX_MESSAGE_LENGTH), vec![""]);
    }

    #[test]
    fn exact_length_message_is_not_split() {
        let content = "a".repeat(MAX_MESSAGE_LENGTH);
        let chunks = split_message(&content, MAX_MESSAGE_LENGTH);
        assert_eq!(chunks, vec![content]);
    }

    #[test]
    fn batch_of_two_lines_is_one_chunk() {
        let chunks = split_message("hello\nworld\n", MAX_MESSAGE_LENGTH);
        assert_eq!(chunks, vec!["hello\nworld\n"]);
    }

    #[test]
    fn overlong_buffered_line_splits_with_trailing_newline() {
        // A single 2001-character line as it is buffered in batch mode.
        let content = format!("{}\n", "a".repeat(MAX_MESSAGE_LENGTH + 1));
        let chunks = split_message(&content, MAX_MESSAGE_LENGTH);
        assert_eq!(chunks, vec!["a".repeat(MAX_MESSAGE_LENGTH), "a\n".to_string()]);
    }

    #[test]
    fn overlong_line_without_newline_splits_exactly() {
        let content = "a".repeat(MAX_MESSAGE_LENGTH + 1);
        let chunks = split_message(&content, MAX_MESSAGE_LENGTH);
        assert_eq!(chunks, vec!["a".repeat(MAX_MESSAGE_LENGTH), "a".to_string()]);
    }

    #[test]
    fn long_single_line_splits_into_ceiling_pieces() {
        for len in [11, 20, 21, 35, 100] {
            let content = "x".repeat(len);
            let chunks = split_message(&content, 10);
            assert_eq!(chunks.len(), len.div_ceil(10), "len {}", len);
            assert_chunks_valid(&content, &chunks, 10);
        }
    }

    #[test]
    fn short_lines_pack_without_crossing_line_boundaries() {
        let content: String = (0..50).map(|i| format!("line {:02}\n", i)).collect();
        let chunks = split_message(&content, 64);

        assert!(chunks.len() > 1);
        assert_chunks_valid(&content, &chunks, 64);
        for chunk in &chunks {
            assert!(chunk.ends_with('\n'));
        }
        // Each line is 8 bytes, so each chunk packs eight lines.
        assert_eq!(chunks[0].len(), 64);
    }

    #[test]
    fn oversized_line_flushes_pending_buffer_first() {
        let content = format!("short\n{}\ntail\n", "y".repeat(25));
        let chunks = split_message(&content, 10);

        assert_eq!(chunks[0], "short\n");
        assert_eq!(chunks[1], "y".repeat(10));
        assert_eq!(chunks[2], "y".repeat(10));
        assert_chunks_valid(&content, &chunks, 10);
    }

    #[test]
    fn multibyte_characters_are_never_cut() {
        let content = "é".repeat(15);
        let chunks = split_message(&content, 9);

        assert_chunks_valid(&content, &chunks, 9);
        assert!(chunks.iter().all(|c| c.chars().all(|ch| ch == 'é')));
    }

    #[test]
    fn widest_characters_fit_minimum_length() {
        let content = "\u{1F600}".repeat(5);
        let chunks = split_message(&content, MIN_SPLIT_LENGTH);

        assert_eq!(chunks.len(), 5);
        assert_chunks_valid(&content, &chunks, MIN_SPLIT_LENGTH);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "below")]
    fn length_below_minimum_is_rejected() {
        split_message("abcdef", MIN_SPLIT_LENGTH - 1);
    }

    #[test]
    fn mixed_content_reconstructs_exactly() {
        let mut content = String::new();
        for i in 0..200 {
            content.push_str(&"z".repeat(i * 37 % 130));
            if i % 7 != 0 {
                content.push('\n');
            }
        }
        let chunks = split_message(&content, 100);
        assert_chunks_valid(&content, &chunks, 100);
    }
}
