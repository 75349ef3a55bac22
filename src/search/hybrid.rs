use super::{keyword_search, rank, semantic_search};
use crate::types::{Filters, Record, ScoreBreakdown, ScoredMatch};
use std::collections::HashMap;

/// Keyword score treated as "full marks" when normalizing.
///
/// Not a ceiling: a record matching in several tags can score above it,
/// and its normalized keyword score then exceeds 1.0. That is kept as is.
pub const KEYWORD_SCORE_CEILING: f64 = 10.0;

/// Weights and semantic cut-off for hybrid search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HybridWeights {
    pub keyword: f64,
    pub semantic: f64,
    /// Threshold for the semantic half of the search
    pub semantic_threshold: f64,
}

impl Default for HybridWeights {
    fn default() -> Self {
        Self {
            keyword: 0.3,
            semantic: 0.7,
            semantic_threshold: 0.5,
        }
    }
}

/// Weighted combination of keyword and semantic search.
///
/// A record found by only one scorer gets 0.0 for the other.
pub fn hybrid_search<'a>(
    query: &str,
    corpus: &'a [Record],
    weights: &HybridWeights,
    filters: &Filters,
) -> Vec<ScoredMatch<'a>> {
    let keyword_results = keyword_search(query, corpus, filters);
    let semantic_results = semantic_search(query, corpus, weights.semantic_threshold, filters);

    // Keyed by identity, in first-seen order
    let mut order: Vec<&'a Record> = Vec::new();
    let mut merged: HashMap<&'a str, (ScoreBreakdown, Vec<_>)> = HashMap::new();

    for m in keyword_results {
        let entry = merged.entry(m.record.identity.as_str()).or_insert_with(|| {
            order.push(m.record);
            (ScoreBreakdown::default(), Vec::new())
        });
        entry.0.keyword = m.score;
        entry.1 = m.matched;
    }

    for m in semantic_results {
        let entry = merged.entry(m.record.identity.as_str()).or_insert_with(|| {
            order.push(m.record);
            (ScoreBreakdown::default(), Vec::new())
        });
        entry.0.semantic = m.score;
    }

    let mut results: Vec<ScoredMatch<'a>> = order
        .into_iter()
        .filter_map(|record| {
            let (breakdown, matched) = merged.remove(record.identity.as_str())?;
            let normalized_keyword = breakdown.keyword / KEYWORD_SCORE_CEILING;
            let score = weights.keyword * normalized_keyword + weights.semantic * breakdown.semantic;

            Some(ScoredMatch {
                record,
                score,
                breakdown: Some(breakdown),
                matched,
            })
        })
        .collect();

    rank(&mut results);
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::fixtures::{postgres_corpus, record};

    #[test]
    fn test_one_sided_matches_are_kept() {
        let corpus = vec![
            // substring hit in the body, but too many other words to pass 0.5
            record(
                "memory/kw.md",
                "Progress",
                "we compared postgresql options with mysql alternatives for reporting workloads today",
                &[],
            ),
            // same tokens as the query, never as one contiguous substring
            record("memory/sem.md", "options", "postgresql", &[]),
        ];

        let results = hybrid_search(
            "postgresql options",
            &corpus,
            &HybridWeights::default(),
            &Filters::default(),
        );
        let ids: Vec<&str> = results.iter().map(|m| m.identity()).collect();
        assert_eq!(ids, vec!["memory/sem.md", "memory/kw.md"]);

        let sem = results[0].breakdown.unwrap();
        assert_eq!(sem.keyword, 0.0);
        assert!((sem.semantic - 1.0).abs() < 1e-6);
        assert!((results[0].score - 0.7).abs() < 1e-6);

        let kw = results[1].breakdown.unwrap();
        assert_eq!(kw.keyword, 5.0);
        assert_eq!(kw.semantic, 0.0);
        assert!((results[1].score - 0.15).abs() < 1e-9);
    }

    #[test]
    fn test_postgres_ranking() {
        let corpus = postgres_corpus();
        let results = hybrid_search("PostgreSQL", &corpus, &HybridWeights::default(), &Filters::default());

        let ids: Vec<&str> = results.iter().map(|m| m.identity()).collect();
        assert_eq!(ids, vec!["memory/r1.md", "memory/r2.md"]);

        // R1: 0.3 * 10/10 + 0.7 * 0.5
        assert!((results[0].score - 0.65).abs() < 1e-6);
        // R2: keyword only, similarity 1/sqrt(5) is under the 0.5 threshold
        assert!((results[1].score - 0.15).abs() < 1e-9);
        assert_eq!(results[1].breakdown.unwrap().semantic, 0.0);
    }

    #[test]
    fn test_multi_tag_match_exceeds_one() {
        let corpus = vec![record("memory/a.md", "api", "api", &["api", "api-v2"])];
        let weights = HybridWeights {
            keyword: 1.0,
            semantic: 0.0,
            semantic_threshold: 0.5,
        };

        let results = hybrid_search("api", &corpus, &weights, &Filters::default());
        // 10 + 5 + 3 + 3 = 21, normalized to 2.1 without clamping
        assert!((results[0].score - 2.1).abs() < 1e-9);
    }

    #[test]
    fn test_filters_apply_to_both_sides() {
        let corpus = postgres_corpus();
        let filters = Filters {
            min_importance: Some(4),
            ..Default::default()
        };
        let results = hybrid_search("PostgreSQL", &corpus, &HybridWeights::default(), &filters);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].identity(), "memory/r1.md");
    }
}
