//! Text chunking for the ingestion pipeline.
//!
//! Splits a document into overlapping, size-bounded windows prior to
//! embedding. Boundaries prefer the nearest space so words are not split
//! when avoidable.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single chunk of a document, the unit of embedding and retrieval.
///
/// `index` is the chunk's 0-based position within the document and is used
/// downstream to derive a stable point id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub index: usize,
    pub text: String,
}

#[derive(Debug, Error)]
pub enum ChunkerError {
    #[error("chunk_size must be greater than zero")]
    ZeroChunkSize,
    #[error("chunk_overlap ({overlap}) must be strictly less than chunk_size ({size})")]
    OverlapTooLarge { overlap: usize, size: usize },
}

/// Deterministic, stateless text splitter.
///
/// Parameters are validated at construction; `split` itself never fails and
/// produces a (possibly empty) chunk list for any input string.
#[derive(Debug, Clone)]
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Chunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, ChunkerError> {
        if chunk_size == 0 {
            return Err(ChunkerError::ZeroChunkSize);
        }
        if chunk_overlap >= chunk_size {
            return Err(ChunkerError::OverlapTooLarge {
                overlap: chunk_overlap,
                size: chunk_size,
            });
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split `text` into ordered, overlapping chunks.
    ///
    /// Whitespace runs (including newlines) are collapsed to single spaces
    /// and the result is trimmed before windowing, so chunking operates on a
    /// pure character-count budget. Window ends back off to the nearest
    /// space after the window start; when a window contains no space at all
    /// the raw boundary is used and a word may be split.
    pub fn split(&self, text: &str) -> Vec<Chunk> {
        let normalized = normalize_whitespace(text);
        if normalized.is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = normalized.chars().collect();
        let total = chars.len();
        if total <= self.chunk_size {
            return vec![Chunk {
                index: 0,
                text: normalized,
            }];
        }

        let mut chunks = Vec::new();
        let mut start = 0usize;
        while start < total {
            let window_end = start + self.chunk_size;
            if window_end >= total {
                push_chunk(&mut chunks, &chars[start..total]);
                break;
            }

            // Back off to the nearest space strictly after `start` so the
            // window does not end mid-word. No space in the window means the
            // raw boundary is used.
            let end = (start + 1..window_end)
                .rev()
                .find(|&i| chars[i] == ' ')
                .unwrap_or(window_end);

            push_chunk(&mut chunks, &chars[start..end]);

            // The cursor must always move strictly forward; a short
            // word-aligned window combined with a generous overlap would
            // otherwise stall the loop.
            let next_start = end.saturating_sub(self.chunk_overlap);
            start = if next_start > start { next_start } else { end };
        }

        chunks
    }
}

/// Collapse all whitespace runs (including newlines) into single spaces and
/// trim the ends. Idempotent.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn push_chunk(chunks: &mut Vec<Chunk>, window: &[char]) {
    let text: String = window.iter().collect::<String>().trim().to_string();
    if !text.is_empty() {
        chunks.push(Chunk {
            index: chunks.len(),
            text,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(size: usize, overlap: usize) -> Chunker {
        Chunker::new(size, overlap).expect("valid chunker params")
    }

    #[test]
    fn rejects_overlap_not_smaller_than_size() {
        assert!(matches!(
            Chunker::new(100, 100),
            Err(ChunkerError::OverlapTooLarge { .. })
        ));
        assert!(matches!(
            Chunker::new(100, 150),
            Err(ChunkerError::OverlapTooLarge { .. })
        ));
        assert!(matches!(Chunker::new(0, 0), Err(ChunkerError::ZeroChunkSize)));
    }

    #[test]
    fn empty_and_whitespace_only_input_produce_no_chunks() {
        let c = chunker(1000, 200);
        assert!(c.split("").is_empty());
        assert!(c.split("   \n\t  \n").is_empty());
    }

    #[test]
    fn short_input_is_a_single_chunk() {
        let c = chunker(1000, 200);
        let chunks = c.split("word");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[0].text, "word");
    }

    #[test]
    fn normalizes_whitespace_before_windowing() {
        let c = chunker(1000, 200);
        let chunks = c.split("  hello\n\nworld\t again ");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "hello world again");
    }

    #[test]
    fn splitting_is_idempotent_over_normalization() {
        let c = chunker(20, 5);
        let raw = "The  quick\nbrown fox   jumps over\tthe lazy dog";
        let normalized = normalize_whitespace(raw);
        assert_eq!(c.split(raw), c.split(&normalized));
    }

    #[test]
    fn windows_break_at_word_boundaries() {
        let c = chunker(20, 5);
        let chunks = c.split("The quick brown fox jumps over the lazy dog");

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 20, "chunk too long: {:?}", chunk);
            assert!(!chunk.text.is_empty());
        }
        assert_eq!(chunks[0].text, "The quick brown fox");
        assert_eq!(chunks.last().unwrap().text, "over the lazy dog");

        // Order is preserved and consecutive chunks share overlap content.
        let all_words: Vec<&str> = chunks.iter().flat_map(|c| c.text.split(' ')).collect();
        let mut last_seen = 0;
        for word in ["quick", "fox", "jumps", "lazy", "dog"] {
            let pos = all_words
                .iter()
                .rposition(|w| *w == word)
                .expect("word present");
            assert!(pos >= last_seen, "word order not preserved");
            last_seen = pos;
        }
        for pair in chunks.windows(2) {
            let tail_word = pair[0].text.split(' ').last().unwrap();
            assert!(
                pair[1].text.contains(tail_word),
                "no shared content between {:?} and {:?}",
                pair[0].text,
                pair[1].text
            );
        }
    }

    #[test]
    fn indices_are_sequential() {
        let c = chunker(20, 5);
        let chunks = c.split("one two three four five six seven eight nine ten");
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
        }
    }

    #[test]
    fn spaceless_input_falls_back_to_raw_boundaries() {
        let c = chunker(1000, 200);
        let text = "a".repeat(2000);
        let chunks = c.split(&text);

        // No spaces anywhere: raw windows with the cursor stepping by
        // size - overlap. Terminates without the forced-progress fallback
        // ever retreating.
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].text.len(), 1000);
        assert_eq!(chunks[1].text.len(), 1000);
        assert_eq!(chunks[2].text.len(), 400);
    }

    #[test]
    fn forced_forward_progress_terminates_on_pathological_overlap() {
        // Words shorter than the overlap make `end - overlap` land at or
        // before the previous start; the fallback must still advance.
        let c = chunker(8, 6);
        let text = "aa bb cc dd ee ff gg hh ii jj";
        let chunks = c.split(text);
        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 8);
        }
        // Last chunk ends where the document ends.
        assert!(chunks.last().unwrap().text.ends_with("jj"));
    }

    #[test]
    fn multibyte_text_is_counted_in_characters() {
        let c = chunker(10, 2);
        let text = "héllo wörld ünïcödé tëxt hërë";
        let chunks = c.split(text);
        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 10);
        }
    }

    #[test]
    fn exact_boundary_is_a_single_chunk() {
        let c = chunker(5, 2);
        let chunks = c.split("abcde");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "abcde");
    }
}
