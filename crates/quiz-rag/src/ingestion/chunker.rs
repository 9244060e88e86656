//! Text chunking with character-exact overlap
//!
//! Chunks are windows over the source text. Each window ends at the best cut
//! point within `chunk_size` characters, preferring paragraph breaks, then
//! line breaks, then spaces, and finally a hard cut. The next window starts
//! exactly `overlap` characters before the previous one ended, so the
//! original text can be rebuilt from the chunks.

use crate::config::ChunkingConfig;
use crate::types::Segment;

/// Cut-point separators, most preferred first
const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

/// Text chunker with configurable size and overlap
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Maximum chunk size in characters
    chunk_size: usize,
    /// Characters shared by consecutive chunks
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker. `overlap` is clamped below `chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size - 1),
        }
    }

    /// Create from configuration
    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Effective chunk size
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Effective overlap
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split text into overlapping segments
    pub fn chunk(&self, text: &str) -> Vec<Segment> {
        if text.is_empty() {
            return Vec::new();
        }

        // Byte offset of every character, plus the end of the text
        let offsets: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let total = offsets.len() - 1;

        let mut segments = Vec::new();
        let mut start = 0usize;

        loop {
            let end = if total - start <= self.chunk_size {
                total
            } else {
                self.cut_point(text, &offsets, start)
            };

            segments.push(Segment::new(
                segments.len(),
                &text[offsets[start]..offsets[end]],
                start,
                end,
            ));

            if end == total {
                break;
            }
            start = end - self.overlap;
        }

        segments
    }

    /// Character index where the window starting at `start` should end
    fn cut_point(&self, text: &str, offsets: &[usize], start: usize) -> usize {
        let limit = start + self.chunk_size;
        // A separator cut must keep the chunk near full size and leave
        // room for the window to advance past the overlap.
        let min_len = (self.chunk_size / 2).max(self.overlap + 1);
        let window = &text[offsets[start]..offsets[limit]];

        for separator in SEPARATORS {
            if let Some(pos) = window.rfind(separator) {
                let cut_byte = offsets[start] + pos + separator.len();
                let cut = offsets.binary_search(&cut_byte).unwrap_or_else(|i| i);
                if cut - start >= min_len {
                    return cut;
                }
            }
        }

        limit
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::from_config(&ChunkingConfig::default())
    }
}

/// Split `text` into segments of at most `chunk_size` characters sharing `overlap` characters
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<Segment> {
    TextChunker::new(chunk_size, overlap).chunk(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rebuild(segments: &[Segment], overlap: usize) -> String {
        let mut out = String::new();
        for (i, segment) in segments.iter().enumerate() {
            if i == 0 {
                out.push_str(&segment.text);
            } else {
                out.extend(segment.text.chars().skip(overlap));
            }
        }
        out
    }

    #[test]
    fn test_empty_text() {
        assert!(chunk_text("", 1000, 200).is_empty());
    }

    #[test]
    fn test_short_text_is_single_segment() {
        let segments = chunk_text("Photosynthesis converts light.", 1000, 200);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "Photosynthesis converts light.");
        assert_eq!(segments[0].char_start, 0);
        assert_eq!(segments[0].char_end, 30);
    }

    #[test]
    fn test_prefers_paragraph_break() {
        let text = format!("{}\n\n{}", "a".repeat(600), "b".repeat(600));
        let segments = chunk_text(&text, 1000, 200);

        assert_eq!(segments.len(), 2);
        assert!(segments[0].text.ends_with("\n\n"));
        assert_eq!(segments[0].char_len(), 602);
        assert!(segments[1].text.starts_with(&"a".repeat(198)));
        assert!(segments[1].text.ends_with('b'));
        assert_eq!(rebuild(&segments, 200), text);
    }

    #[test]
    fn test_prefers_space_over_hard_cut() {
        let words = "lorem ipsum dolor sit amet ".repeat(10);
        let segments = chunk_text(&words, 50, 10);

        for segment in &segments[..segments.len() - 1] {
            assert!(segment.text.ends_with(' '), "{:?}", segment.text);
            assert!(segment.char_len() <= 50);
        }
        assert_eq!(rebuild(&segments, 10), words);
    }

    #[test]
    fn test_long_word_is_split_by_characters() {
        let text = "x".repeat(250);
        let segments = chunk_text(&text, 100, 20);

        assert_eq!(segments.len(), 3);
        assert_eq!(
            segments.iter().map(|s| (s.char_start, s.char_end)).collect::<Vec<_>>(),
            vec![(0, 100), (80, 180), (160, 250)]
        );
    }

    #[test]
    fn test_multibyte_text() {
        let text = "éléphant ".repeat(40);
        let segments = chunk_text(&text, 64, 16);

        assert!(segments.len() > 1);
        for segment in &segments {
            assert_eq!(segment.text.chars().count(), segment.char_len());
            assert!(segment.char_len() <= 64);
        }
        assert_eq!(rebuild(&segments, 16), text);
    }

    #[test]
    fn test_overlap_is_clamped() {
        let chunker = TextChunker::new(10, 50);
        assert_eq!(chunker.overlap(), 9);
        let segments = chunker.chunk(&"y".repeat(30));
        assert_eq!(rebuild(&segments, 9), "y".repeat(30));
    }

    #[test]
    fn test_indices_are_sequential() {
        let segments = chunk_text(&"word ".repeat(500), 100, 20);
        for (i, segment) in segments.iter().enumerate() {
            assert_eq!(segment.index, i);
        }
    }

    proptest! {
        #[test]
        fn prop_segments_rebuild_text(
            text in "[a-zé \n]{1,600}",
            chunk_size in 1usize..120,
            overlap_seed in 0usize..120,
        ) {
            let overlap = overlap_seed % chunk_size;
            let segments = chunk_text(&text, chunk_size, overlap);
            prop_assert_eq!(rebuild(&segments, overlap), text);
        }

        #[test]
        fn prop_segments_respect_size(
            text in "[a-zé \n]{1,600}",
            chunk_size in 1usize..120,
            overlap_seed in 0usize..120,
        ) {
            let overlap = overlap_seed % chunk_size;
            for segment in chunk_text(&text, chunk_size, overlap) {
                prop_assert!(segment.char_len() <= chunk_size);
                prop_assert_eq!(segment.text.chars().count(), segment.char_len());
            }
        }

        #[test]
        fn prop_consecutive_segments_share_overlap(
            text in "[a-zé \n]{1,600}",
            chunk_size in 1usize..120,
            overlap_seed in 0usize..120,
        ) {
            let overlap = overlap_seed % chunk_size;
            let segments = chunk_text(&text, chunk_size, overlap);
            for pair in segments.windows(2) {
                let prev: Vec<char> = pair[0].text.chars().collect();
                let next: Vec<char> = pair[1].text.chars().collect();
                prop_assert_eq!(&prev[prev.len() - overlap..], &next[..overlap]);
                prop_assert_eq!(pair[1].char_start, pair[0].char_end - overlap);
            }
        }
    }
}
