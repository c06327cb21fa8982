//! Sentence-aware text chunking with character overlap.

use unicode_segmentation::UnicodeSegmentation;

/// Default chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 800;

/// Default overlap between consecutive chunks in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;

/// Splits text into chunks of whole sentences.
///
/// Consecutive chunks share trailing sentences worth at most `overlap`
/// characters. A single sentence longer than `size` is hard-split on
/// character boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentenceChunker {
    size: usize,
    overlap: usize,
}

impl Default for SentenceChunker {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)
    }
}

impl SentenceChunker {
    /// Creates a chunker. The overlap is clamped below the size.
    #[must_use]
    pub fn new(size: usize, overlap: usize) -> Self {
        let size = size.max(1);
        Self {
            size,
            overlap: overlap.min(size - 1),
        }
    }

    /// Chunk size in characters.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Overlap in characters.
    #[must_use]
    pub const fn overlap(&self) -> usize {
        self.overlap
    }

    /// Splits `text` into chunks. Whitespace-only input yields no chunks.
    #[must_use]
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current: Vec<&str> = Vec::new();

        for sentence in text.unicode_sentences().map(str::trim) {
            if sentence.is_empty() {
                continue;
            }
            let len = char_len(sentence);

            if len > self.size {
                if !current.is_empty() {
                    chunks.push(current.join(" "));
                    current.clear();
                }
                chunks.extend(hard_split(sentence, self.size));
                continue;
            }

            if !current.is_empty() && joined_len(&current) + 1 + len > self.size {
                chunks.push(current.join(" "));
                current = self.carry_over(&current);
                while !current.is_empty() && joined_len(&current) + 1 + len > self.size {
                    current.remove(0);
                }
            }
            current.push(sentence);
        }

        if !current.is_empty() {
            chunks.push(current.join(" "));
        }
        chunks
    }

    /// Trailing sentences of a finished chunk that fit in the overlap.
    fn carry_over<'a>(&self, sentences: &[&'a str]) -> Vec<&'a str> {
        let mut kept = Vec::new();
        let mut total = 0;
        for sentence in sentences.iter().rev() {
            let add = char_len(sentence) + usize::from(!kept.is_empty());
            if total + add > self.overlap {
                break;
            }
            total += add;
            kept.push(*sentence);
        }
        kept.reverse();
        kept
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn joined_len(sentences: &[&str]) -> usize {
    sentences.iter().map(|s| char_len(s)).sum::<usize>() + sentences.len().saturating_sub(1)
}

fn hard_split(sentence: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = sentence.chars().collect();
    chars
        .chunks(size)
        .map(|c| c.iter().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
