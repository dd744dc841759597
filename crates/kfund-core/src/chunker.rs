//! Line-accumulating document chunker with trailing-line overlap.
//!
//! Splits a document into bounded-size segments for embedding and retrieval.
//! Lines are accumulated until adding the next line would exceed the
//! character budget; the emitted chunk's last `overlap` lines seed the next
//! buffer so section headers and sentence context survive the boundary.
//!
//! Guarantees:
//! - joining chunk contents (minus overlap prefixes) reconstructs the
//!   original line sequence exactly;
//! - the final chunk is always emitted, however small;
//! - a single line longer than the budget is never split — it lands in the
//!   current buffer and forces the boundary on the line after it;
//! - `chunk_index` is strictly increasing across an ingestion run and is
//!   never reused between documents.

use crate::types::Document;

/// One segment of a document, carrying its source and category tags.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub content: String,
    /// Position within the ingestion run, not within the document.
    pub chunk_index: usize,
    pub source: String,
    pub category: String,
}

/// Run-scoped chunker. Holds the `chunk_index` counter so indices stay
/// monotonic across every document split in one ingestion run.
#[derive(Debug)]
pub struct Chunker {
    max_chars: usize,
    overlap_lines: usize,
    next_index: usize,
}

impl Chunker {
    pub fn new(max_chars: usize, overlap_lines: usize) -> Self {
        Self {
            max_chars,
            overlap_lines,
            next_index: 0,
        }
    }

    /// Total chunks emitted so far in this run.
    pub fn chunks_emitted(&self) -> usize {
        self.next_index
    }

    /// Split a document into overlapping chunks.
    ///
    /// Output depends only on the document text and the two size
    /// parameters. Character length counts Unicode scalar values.
    pub fn split(&mut self, doc: &Document) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut buffer: Vec<&str> = Vec::new();
        let mut buffer_len = 0usize;

        for line in doc.text.split('\n') {
            let line_len = line.chars().count();

            if buffer_len + line_len > self.max_chars && !buffer.is_empty() {
                chunks.push(self.emit(&buffer, doc));

                // Seed the next buffer with the emitted tail.
                let keep = buffer.len().saturating_sub(self.overlap_lines);
                buffer.drain(..keep);
                buffer_len = buffer.iter().map(|l| l.chars().count()).sum();
            }

            buffer.push(line);
            buffer_len += line_len;
        }

        if !buffer.is_empty() {
            chunks.push(self.emit(&buffer, doc));
        }

        chunks
    }

    fn emit(&mut self, buffer: &[&str], doc: &Document) -> Chunk {
        let chunk = Chunk {
            content: buffer.join("\n"),
            chunk_index: self.next_index,
            source: doc.source.clone(),
            category: doc.category.clone(),
        };
        self.next_index += 1;
        chunk
    }
}
