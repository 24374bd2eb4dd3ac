//! Recursive character chunking
//!
//! Each chunk is as long as the window allows and ends on the strongest
//! natural boundary found in the back half of the window: paragraph, line,
//! sentence, then word, falling back to a hard cut. The next chunk starts up
//! to `chunk_overlap` characters before the previous end, snapped forward to
//! the start of a word. Chunks are exact substrings of the page with their
//! character offset, so the page can be rebuilt from them.

use docqa_core::{Chunk, Page, Result};

use crate::config::ChunkingConfig;

/// Boundary levels, strongest first
const BOUNDARIES: &[&[&str]] = &[&["\n\n"], &["\n"], &[". ", "! ", "? "], &[" "]];

/// Splits page texts into overlapping chunks
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    config: ChunkingConfig,
}

impl RecursiveChunker {
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Chunk every page in order; chunks never span two pages
    pub fn chunk_pages(&self, pages: &[Page]) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for page in pages {
            let chars: Vec<char> = page.text.chars().collect();
            for (start, end) in self.split_spans(&chars) {
                let text: String = chars[start..end].iter().collect();
                if text.trim().is_empty() {
                    continue;
                }
                chunks.push(Chunk {
                    index: chunks.len(),
                    page: page.number,
                    offset: start,
                    text,
                });
            }
        }

        chunks
    }

    /// Character spans `[start, end)` covering the whole text
    fn split_spans(&self, chars: &[char]) -> Vec<(usize, usize)> {
        let size = self.config.chunk_size;
        let total = chars.len();
        let mut spans = Vec::new();

        if total == 0 {
            return spans;
        }

        let mut start = 0;
        loop {
            if total - start <= size {
                spans.push((start, total));
                break;
            }

            let window_end = start + size;
            let end = find_boundary(chars, start, window_end).unwrap_or(window_end);
            spans.push((start, end));
            start = self.next_start(chars, start, end);
        }

        spans
    }

    fn next_start(&self, chars: &[char], start: usize, end: usize) -> usize {
        let overlap = self.config.chunk_overlap;
        if overlap == 0 || end - start <= overlap {
            return end;
        }

        let candidate = end - overlap;
        (candidate..end)
            .find(|&i| is_word_start(chars, i))
            .unwrap_or(candidate)
    }
}

/// Latest boundary end in the back half of `[start, window_end]`, trying each level in turn
fn find_boundary(chars: &[char], start: usize, window_end: usize) -> Option<usize> {
    let min_end = start + ((window_end - start) / 2).max(1);

    BOUNDARIES.iter().find_map(|level| {
        (min_end..=window_end)
            .rev()
            .find(|&end| level.iter().any(|sep| ends_with(chars, end, sep)))
    })
}

fn ends_with(chars: &[char], end: usize, separator: &str) -> bool {
    let len = separator.chars().count();
    end >= len && chars[end - len..end].iter().copied().eq(separator.chars())
}

fn is_word_start(chars: &[char], i: usize) -> bool {
    !chars[i].is_whitespace() && (i == 0 || chars[i - 1].is_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(number: u32, text: &str) -> Page {
        Page {
            number,
            text: text.to_string(),
        }
    }

    fn chunker(size: usize, overlap: usize) -> RecursiveChunker {
        RecursiveChunker::new(ChunkingConfig::new(size, overlap).unwrap()).unwrap()
    }

    /// Rebuild a page by concatenating chunk texts minus the overlap with the previous chunk
    fn rebuild(chunks: &[&Chunk]) -> String {
        let mut text = String::new();
        let mut covered = 0;
        for chunk in chunks {
            assert!(chunk.offset <= covered, "gap before chunk {}", chunk.index);
            let skip = covered - chunk.offset;
            text.extend(chunk.text.chars().skip(skip));
            covered = covered.max(chunk.end());
        }
        text
    }

    fn lecture_text() -> String {
        let mut text = String::new();
        for section in 0..12 {
            text.push_str(&format!("Section {} covers thermodynamics. ", section));
            for sentence in 0..9 {
                text.push_str(&format!(
                    "Statement {}.{} says heat flows from hot bodies to cold ones unless work is done. ",
                    section, sentence
                ));
            }
            text.push_str("\n\n");
        }
        text
    }

    #[test]
    fn test_empty_input_yields_no_chunks() {
        let chunker = chunker(1000, 200);
        assert!(chunker.chunk_pages(&[]).is_empty());
        assert!(chunker.chunk_pages(&[page(1, "")]).is_empty());
        assert!(chunker.chunk_pages(&[page(1, "   \n\n  ")]).is_empty());
    }

    #[test]
    fn test_short_page_is_one_chunk() {
        let chunks = chunker(1000, 200).chunk_pages(&[page(3, "Short page.")]);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].page, 3);
        assert_eq!(chunks[0].offset, 0);
        assert_eq!(chunks[0].text, "Short page.");
    }

    #[test]
    fn test_reconstruction_is_lossless() {
        let text = lecture_text();
        let chunks = chunker(1000, 200).chunk_pages(&[page(1, &text)]);

        assert!(chunks.len() > 1);
        let refs: Vec<&Chunk> = chunks.iter().collect();
        assert_eq!(rebuild(&refs), text);
    }

    #[test]
    fn test_window_and_overlap_bounds() {
        let text = lecture_text();
        let chunks = chunker(1000, 200).chunk_pages(&[page(1, &text)]);

        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 1000);
        }
        for pair in chunks.windows(2) {
            let overlap = pair[0].end() - pair[1].offset;
            assert!(overlap > 0, "consecutive chunks should overlap");
            assert!(overlap <= 200);
            assert!(pair[1].offset > pair[0].offset);
        }
    }

    #[test]
    fn test_prefers_paragraph_boundaries() {
        let text = lecture_text();
        let chunks = chunker(1000, 200).chunk_pages(&[page(1, &text)]);

        assert!(chunks[0].text.ends_with("\n\n"));
    }

    #[test]
    fn test_overlap_starts_on_a_word() {
        let text = lecture_text();
        let chunks = chunker(1000, 200).chunk_pages(&[page(1, &text)]);

        for chunk in chunks.iter().skip(1) {
            let first = chunk.text.chars().next().unwrap();
            assert!(!first.is_whitespace());
        }
    }

    #[test]
    fn test_hard_cut_without_boundaries() {
        let text = "x".repeat(2500);
        let chunks = chunker(1000, 200).chunk_pages(&[page(1, &text)]);

        assert_eq!(chunks[0].text.len(), 1000);
        assert_eq!(chunks[1].offset, 800);
        let refs: Vec<&Chunk> = chunks.iter().collect();
        assert_eq!(rebuild(&refs), text);
    }

    #[test]
    fn test_multibyte_text_is_split_on_chars() {
        let text = "Été à la plage, où l'eau était très chaude. ".repeat(60);
        let chunks = chunker(1000, 200).chunk_pages(&[page(1, &text)]);

        let refs: Vec<&Chunk> = chunks.iter().collect();
        assert_eq!(rebuild(&refs), text);
    }

    #[test]
    fn test_chunks_stay_on_their_page() {
        let pages = vec![page(1, &lecture_text()), page(2, "Appendix: units and constants.")];
        let chunks = chunker(1000, 200).chunk_pages(&pages);

        let last = chunks.last().unwrap();
        assert_eq!(last.page, 2);
        assert_eq!(last.offset, 0);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
        }

        let first_page: Vec<&Chunk> = chunks.iter().filter(|c| c.page == 1).collect();
        assert_eq!(rebuild(&first_page), pages[0].text);
    }
}
