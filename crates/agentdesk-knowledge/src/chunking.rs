use agentdesk_types::{Document, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};

/// Character-window chunker.
///
/// Chunks never exceed `chunk_size` characters, prefer to end on whitespace,
/// and each chunk after the first starts `chunk_overlap` characters before the
/// previous one ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)
    }
}

impl Chunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    pub fn chunk_text(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let len = chars.len();
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < len {
            let mut end = (start + self.chunk_size).min(len);
            if end < len {
                if let Some(offset) = chars[start + 1..end].iter().rposition(|c| c.is_whitespace()) {
                    end = start + 1 + offset;
                }
            }

            let chunk: String = chars[start..end].iter().collect();
            let chunk = chunk.trim();
            if !chunk.is_empty() {
                chunks.push(chunk.to_string());
            }

            if end >= len {
                break;
            }
            let next = end.saturating_sub(self.chunk_overlap);
            start = if next > start { next } else { end };
        }

        chunks
    }

    /// Split a document into `{id}_{n}` chunks carrying the parent's name and metadata
    pub fn chunk_document(&self, document: &Document) -> Vec<Document> {
        self.chunk_text(&document.content)
            .into_iter()
            .enumerate()
            .map(|(index, content)| {
                let mut chunk = Document::chunk(&document.id, &document.name, index, content);
                for (key, value) in &document.meta_data {
                    chunk.meta_data.entry(key.clone()).or_insert_with(|| value.clone());
                }
                chunk
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("word{:03}", i)).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunker = Chunker::default();
        assert_eq!(chunker.chunk_text("  hello world  "), vec!["hello world".to_string()]);
        assert!(chunker.chunk_text("   ").is_empty());
    }

    #[test]
    fn test_chunks_respect_size_and_whitespace() {
        let text = words(200);
        let chunker = Chunker::new(100, 0);
        let chunks = chunker.chunk_text(&text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 100);
            assert!(chunk.starts_with("word"));
            // every word survives intact
            assert!(chunk.split(' ').all(|w| w.len() == 7));
        }
        assert_eq!(chunks.join(" "), text);
    }

    #[test]
    fn test_chunks_overlap() {
        let text = words(200);
        let chunks = Chunker::new(100, 20).chunk_text(&text);

        for pair in chunks.windows(2) {
            let tail: String = pair[0].chars().rev().take(12).collect::<Vec<_>>().into_iter().rev().collect();
            let last_word = tail.split(' ').last().unwrap();
            assert!(pair[1].contains(last_word), "{:?} not in {:?}", last_word, pair[1]);
        }
    }

    #[test]
    fn test_overlap_clamped_below_size() {
        let chunker = Chunker::new(10, 50);
        assert_eq!(chunker.chunk_overlap(), 9);
        // still terminates on text without whitespace
        let chunks = chunker.chunk_text(&"x".repeat(35));
        assert!(chunks.iter().all(|c| c.len() <= 10));
    }

    #[test]
    fn test_chunk_document_ids_and_meta() {
        let doc = Document::new("constitution", words(60))
            .with_id("founding/constitution.txt")
            .with_meta("source", "archives.gov");
        let chunks = Chunker::new(200, 0).chunk_document(&doc);

        assert_eq!(chunks[0].id, "founding/constitution.txt_1");
        assert_eq!(chunks[1].id, "founding/constitution.txt_2");
        assert_eq!(chunks[1].name, "constitution");
        assert_eq!(chunks[1].source_id(), "founding/constitution.txt");
        assert_eq!(chunks[1].meta_data.get("chunk"), Some(&serde_json::json!(2)));
        assert_eq!(chunks[1].meta_data.get("source"), Some(&serde_json::json!("archives.gov")));
    }
}
