use super::rank;
use crate::embeddings::{cosine_similarity, TermFrequencyEmbedder};
use crate::types::{Filters, Record, ScoredMatch};

/// Minimum similarity for a standalone semantic search
pub const DEFAULT_THRESHOLD: f64 = 0.7;

/// Characters of body text embedded alongside the title
pub const EMBED_BODY_CHARS: usize = 500;

/// Text embedded for a record: the title plus the start of the body
pub fn record_text(record: &Record) -> String {
    let head: String = record.body.chars().take(EMBED_BODY_CHARS).collect();
    format!("{} {}", record.title, head)
}

/// Term-frequency similarity search. A record is kept when its similarity
/// reaches `threshold` (inclusive).
pub fn semantic_search<'a>(
    query: &str,
    corpus: &'a [Record],
    threshold: f64,
    filters: &Filters,
) -> Vec<ScoredMatch<'a>> {
    let embedder = TermFrequencyEmbedder::new();
    let query_vector = embedder.vectorize(query);

    let mut results: Vec<ScoredMatch<'a>> = corpus
        .iter()
        .filter(|record| filters.matches(record))
        .filter_map(|record| {
            let record_vector = embedder.vectorize(&record_text(record));
            let similarity = cosine_similarity(&query_vector, &record_vector);

            (similarity >= threshold).then(|| ScoredMatch {
                record,
                score: similarity,
                breakdown: None,
                matched: Vec::new(),
            })
        })
        .collect();

    rank(&mut results);
    results
}
