//! Documents, pages and chunks

use serde::{Deserialize, Serialize};

/// One PDF page worth of extracted text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// 1-based page number
    pub number: u32,
    pub text: String,
}

/// A loaded PDF: where it came from, a fingerprint of its bytes, and its pages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfDocument {
    pub source: String,
    pub fingerprint: String,
    pub pages: Vec<Page>,
}

impl PdfDocument {
    /// Total number of extracted characters across all pages
    pub fn char_count(&self) -> usize {
        self.pages.iter().map(|p| p.text.chars().count()).sum()
    }
}

/// A slice of one page's text used as the unit of embedding and retrieval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position of the chunk in the document-wide sequence
    pub index: usize,
    /// Page the text was taken from
    pub page: u32,
    /// Character offset of `text` within the page
    pub offset: usize,
    pub text: String,
}

impl Chunk {
    /// Character offset one past the end of this chunk within its page
    pub fn end(&self) -> usize {
        self.offset + self.text.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_end_counts_chars() {
        let chunk = Chunk {
            index: 0,
            page: 1,
            offset: 10,
            text: "éàü".to_string(),
        };
        assert_eq!(chunk.end(), 13);
    }

    #[test]
    fn test_char_count_includes_whitespace() {
        let doc = PdfDocument {
            source: "empty.pdf".to_string(),
            fingerprint: "0".to_string(),
            pages: vec![
                Page { number: 1, text: "  \n".to_string() },
                Page { number: 2, text: String::new() },
            ],
        };
        assert_eq!(doc.char_count(), 3);
    }
}
