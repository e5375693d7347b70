use super::*;

fn numbered_words(count: usize) -> String {
    (0..count)
        .map(|i| format!("w{}", i))
        .collect::<Vec<_>>()
        .join(" ")
}

#[test]
fn splits_document_into_word_windows() {
    let chunks = chunk_text("alpha beta gamma delta", 2, 0).expect("chunking should succeed");
    assert_eq!(chunks, vec!["alpha beta", "gamma delta"]);
}

#[test]
fn empty_and_whitespace_text_yield_no_chunks() {
    assert!(chunk_text("", 4, 1).expect("empty text is valid").is_empty());
    assert!(
        chunk_text("   \n\t  ", 4, 1)
            .expect("whitespace text is valid")
            .is_empty()
    );
}

#[test]
fn final_chunk_is_not_padded() {
    let chunks = chunk_text("a b c d e", 2, 0).expect("chunking should succeed");
    assert_eq!(chunks, vec!["a b", "c d", "e"]);
}

#[test]
fn consecutive_chunks_share_overlap_tokens() {
    let chunks = chunk_text("a b c d e f", 4, 2).expect("chunking should succeed");
    assert_eq!(chunks, vec!["a b c d", "c d e f", "e f"]);
}

#[test]
fn whitespace_is_collapsed_to_single_spaces() {
    let chunks = chunk_text("one\n\ntwo\tthree   four", 3, 0).expect("chunking should succeed");
    assert_eq!(chunks, vec!["one two three", "four"]);
}

#[test]
fn chunking_is_deterministic() {
    let text = numbered_words(1500);
    let first = chunk_text(&text, 512, 64).expect("chunking should succeed");
    let second = chunk_text(&text, 512, 64).expect("chunking should succeed");
    assert_eq!(first, second);
}

#[test]
fn spans_cover_every_token_with_fixed_overlap() {
    let token_count = 1000;
    let text = numbered_words(token_count);

    for (window, overlap) in [(512, 64), (7, 3), (10, 0), (2, 1)] {
        let spans = chunk_spans(&text, window, overlap).expect("spans should be valid");

        assert_eq!(spans.first().map(|s| s.start), Some(0));
        assert_eq!(spans.last().map(|s| s.end), Some(token_count));

        for (i, pair) in spans.windows(2).enumerate() {
            let (prev, next) = (&pair[0], &pair[1]);
            assert_eq!(next.start, (i + 1) * (window - overlap));
            if next.start < prev.end {
                // full windows overlap by exactly `overlap` tokens
                if prev.len() == window {
                    assert_eq!(prev.end - next.start, overlap);
                }
            } else {
                assert_eq!(next.start, prev.end, "gap between chunks");
            }
        }
    }
}

#[test]
fn chunk_start_offsets_follow_stride() {
    let spans = chunk_spans(&numbered_words(20), 8, 3).expect("spans should be valid");
    let starts: Vec<usize> = spans.iter().map(|s| s.start).collect();
    assert_eq!(starts, vec![0, 5, 10, 15]);
    assert_eq!(spans[3], 15..20);
}

#[test]
fn default_config_matches_window_and_overlap() {
    let config = ChunkingConfig::default();
    assert_eq!(config.window, 512);
    assert_eq!(config.overlap, 64);

    let text = numbered_words(600);
    let chunks = config.chunk(&text).expect("chunking should succeed");
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].split(' ').count(), 512);
    assert_eq!(chunks[1].split(' ').count(), 600 - 448);
}

#[test]
fn overlap_not_smaller_than_window_is_rejected() {
    assert_eq!(
        chunk_text("a b c", 2, 2),
        Err(ChunkingError::OverlapTooLarge {
            window: 2,
            overlap: 2
        })
    );
    assert!(chunk_text("a b c", 2, 5).is_err());
}

#[test]
fn zero_window_is_rejected() {
    assert_eq!(chunk_text("a b c", 0, 0), Err(ChunkingError::ZeroWindow));
    assert_eq!(chunk_spans("", 0, 0), Err(ChunkingError::ZeroWindow));
}

#[test]
fn invalid_config_is_rejected_even_for_empty_text() {
    assert!(chunk_text("", 3, 3).is_err());
}
