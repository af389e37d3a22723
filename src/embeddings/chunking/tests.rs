use super::*;

fn numbered_words(n: usize) -> String {
    (0..n)
        .map(|i| format!("w{}", i))
        .collect::<Vec<_>>()
        .join(" ")
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[test]
fn short_text_is_single_chunk() {
    let text = "one two three four five six seven eight nine ten";
    let chunks = chunk_text(text, &ChunkingConfig::default()).expect("should chunk");

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0], text);
}

#[test]
fn whitespace_is_collapsed() {
    let chunks = chunk_text("  alpha\n\n beta\tgamma  ", &ChunkingConfig::default())
        .expect("should chunk");

    assert_eq!(chunks, vec!["alpha beta gamma".to_string()]);
}

#[test]
fn chunk_count_follows_stride() {
    let config = ChunkingConfig::default();
    for n in [1, 449, 450, 451, 900, 1000, 2345] {
        let chunks = chunk_text(&numbered_words(n), &config).expect("should chunk");
        assert_eq!(chunks.len(), n.div_ceil(450), "word count {}", n);
    }
}

#[test]
fn chunks_never_exceed_chunk_size() {
    let chunks =
        chunk_text(&numbered_words(1800), &ChunkingConfig::default()).expect("should chunk");

    assert!(chunks.iter().all(|c| word_count(c) <= DEFAULT_CHUNK_SIZE));
    assert_eq!(word_count(&chunks[0]), DEFAULT_CHUNK_SIZE);
}

#[test]
fn consecutive_chunks_share_overlap() {
    let config = ChunkingConfig {
        chunk_size: 10,
        overlap: 3,
    };
    let chunks = chunk_text(&numbered_words(30), &config).expect("should chunk");

    for pair in chunks.windows(2) {
        let prev = pair[0].split_whitespace().collect::<Vec<_>>();
        let next = pair[1].split_whitespace().collect::<Vec<_>>();
        if prev.len() == config.chunk_size {
            assert_eq!(&prev[prev.len() - 3..], &next[..3]);
        }
    }
    assert_eq!(chunks[1].split_whitespace().next(), Some("w7"));
}

#[test]
fn trailing_window_inside_predecessor_is_kept() {
    let config = ChunkingConfig {
        chunk_size: 10,
        overlap: 5,
    };
    let chunks = chunk_text(&numbered_words(10), &config).expect("should chunk");

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[1], "w5 w6 w7 w8 w9");
}

#[test]
fn empty_text_is_rejected() {
    assert_eq!(
        chunk_text("", &ChunkingConfig::default()),
        Err(ChunkingError::EmptyDocument)
    );
    assert_eq!(
        chunk_text(" \n\t ", &ChunkingConfig::default()),
        Err(ChunkingError::EmptyDocument)
    );
}

#[test]
fn degenerate_window_is_rejected() {
    let config = ChunkingConfig {
        chunk_size: 50,
        overlap: 50,
    };
    assert!(matches!(
        chunk_text("some words here", &config),
        Err(ChunkingError::InvalidWindow { .. })
    ));

    let config = ChunkingConfig {
        chunk_size: 0,
        overlap: 0,
    };
    assert!(config.stride().is_err());
}

#[test]
fn oversized_window_does_not_overflow() {
    let config = ChunkingConfig {
        chunk_size: usize::MAX,
        overlap: 0,
    };
    let chunks = chunk_text("alpha beta gamma", &config).expect("should chunk");

    assert_eq!(chunks, vec!["alpha beta gamma".to_string()]);
}
