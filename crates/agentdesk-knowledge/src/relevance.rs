//! Relevance re-scoring of raw vector-store hits.
//!
//! `relevance = clamp01(0.7 * similarity + 0.3 * term_overlap)` where the term
//! overlap is the share of query terms that also occur in the document.

use std::collections::HashSet;

use agentdesk_types::SearchResult;

pub const SIMILARITY_WEIGHT: f32 = 0.7;
pub const OVERLAP_WEIGHT: f32 = 0.3;

const MIN_TERM_LEN: usize = 3;

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "had", "her", "was",
    "one", "our", "out", "has", "have", "how", "its", "may", "who", "what", "when", "where",
    "which", "with", "this", "that", "from", "they", "them", "their", "there", "about", "into",
    "does", "been", "were", "will", "would", "should", "could", "your", "than", "then", "also",
];

/// Lowercase alphanumeric tokens of at least three characters, minus stop-words
pub fn query_terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().count() >= MIN_TERM_LEN)
        .map(|token| token.to_lowercase())
        .filter(|token| !STOP_WORDS.contains(&token.as_str()))
        .collect()
}

/// Share of `query` terms present in `document_text`; 0 when the query has no terms
pub fn term_overlap(query: &HashSet<String>, document_text: &str) -> f32 {
    if query.is_empty() {
        return 0.0;
    }
    let doc_terms = query_terms(document_text);
    let shared = query.iter().filter(|term| doc_terms.contains(*term)).count();
    shared as f32 / query.len() as f32
}

pub fn relevance_score(similarity: f32, overlap: f32) -> f32 {
    let similarity = similarity.clamp(0.0, 1.0);
    (SIMILARITY_WEIGHT * similarity + OVERLAP_WEIGHT * overlap).clamp(0.0, 1.0)
}

/// Re-score, drop hits below `min_relevance` and sort by relevance, then similarity
pub fn rescore(query: &str, results: Vec<SearchResult>, min_relevance: f32) -> Vec<SearchResult> {
    let terms = query_terms(query);

    let mut rescored: Vec<SearchResult> = results
        .into_iter()
        .map(|mut result| {
            result.similarity = result.similarity.clamp(0.0, 1.0);
            let overlap = term_overlap(&terms, &result.document.content);
            result.relevance = relevance_score(result.similarity, overlap);
            result
        })
        .filter(|result| result.relevance >= min_relevance)
        .collect();

    rescored.sort_by(|a, b| {
        b.relevance
            .total_cmp(&a.relevance)
            .then_with(|| b.similarity.total_cmp(&a.similarity))
    });
    rescored
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentdesk_types::Document;
    use pretty_assertions::assert_eq;

    fn hit(name: &str, content: &str, similarity: f32) -> SearchResult {
        SearchResult::new(Document::new(name, content), similarity)
    }

    #[test]
    fn test_query_terms_filters_short_and_stop_words() {
        let terms = query_terms("What is the Second Amendment's scope on guns?");
        let mut sorted: Vec<_> = terms.into_iter().collect();
        sorted.sort();
        assert_eq!(sorted, vec!["amendment", "guns", "scope", "second"]);
    }

    #[test]
    fn test_term_overlap() {
        let terms = query_terms("expense policy travel");
        assert!((term_overlap(&terms, "The travel policy allows economy fares") - 2.0 / 3.0).abs() < 1e-6);
        assert_eq!(term_overlap(&HashSet::new(), "anything"), 0.0);
    }

    #[test]
    fn test_relevance_score_blend_and_clamp() {
        assert!((relevance_score(0.8, 0.5) - 0.71).abs() < 1e-6);
        assert_eq!(relevance_score(1.5, 1.0), 1.0);
        assert_eq!(relevance_score(-1.0, 0.0), 0.0);
    }

    #[test]
    fn test_rescore_reorders_by_term_overlap() {
        let results = vec![
            hit("a", "Unrelated text about weather", 0.80),
            hit("b", "Travel expense policy for employees", 0.75),
        ];
        let rescored = rescore("travel expense policy", results, 0.0);

        assert_eq!(rescored[0].document.name, "b");
        assert!((rescored[0].relevance - (0.7 * 0.75 + 0.3)).abs() < 1e-6);
        assert!((rescored[1].relevance - 0.56).abs() < 1e-6);
    }

    #[test]
    fn test_rescore_ties_break_on_similarity_and_filters() {
        let results = vec![
            hit("low", "nothing", 0.1),
            hit("x", "nothing shared", 0.5),
            hit("y", "nothing shared", 0.5),
        ];
        let rescored = rescore("", results, 0.2);
        let names: Vec<_> = rescored.iter().map(|r| r.document.name.as_str()).collect();
        assert_eq!(names.len(), 2);
        assert!(!names.contains(&"low"));
        assert!(rescored.iter().all(|r| (r.relevance - 0.35).abs() < 1e-6));
    }
}
