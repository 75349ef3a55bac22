use super::rank;
use crate::types::{Filters, MatchedField, Record, ScoredMatch};

pub const TITLE_WEIGHT: f64 = 10.0;
pub const BODY_WEIGHT: f64 = 5.0;
/// Added once per matching tag
pub const TAG_WEIGHT: f64 = 3.0;

/// Case-insensitive substring search over title, body and tags.
///
/// Records that match nowhere are left out rather than scored zero.
pub fn keyword_search<'a>(
    query: &str,
    corpus: &'a [Record],
    filters: &Filters,
) -> Vec<ScoredMatch<'a>> {
    let query = query.to_lowercase();

    let mut results: Vec<ScoredMatch<'a>> = corpus
        .iter()
        .filter_map(|record| {
            let mut score = 0.0;
            let mut matched = Vec::new();

            if record.title.to_lowercase().contains(&query) {
                score += TITLE_WEIGHT;
                matched.push(MatchedField::Title);
            }
            if record.body.to_lowercase().contains(&query) {
                score += BODY_WEIGHT;
                matched.push(MatchedField::Body);
            }
            for tag in &record.tags {
                if tag.to_lowercase().contains(&query) {
                    score += TAG_WEIGHT;
                    matched.push(MatchedField::Tag(tag.clone()));
                }
            }

            if score > 0.0 && filters.matches(record) {
                Some(ScoredMatch {
                    record,
                    score,
                    breakdown: None,
                    matched,
                })
            } else {
                None
            }
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
    fn test_title_only_scores_ten() {
        let corpus = vec![record("memory/a.md", "Kubernetes", "nothing relevant", &["ops"])];
        let results = keyword_search("Kubernetes", &corpus, &Filters::default());

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].score, 10.0);
        assert_eq!(results[0].matched, vec![MatchedField::Title]);
    }

    #[test]
    fn test_title_body_and_tag_score_eighteen() {
        let corpus = vec![record(
            "memory/a.md",
            "Kubernetes",
            "we moved to kubernetes last week",
            &["kubernetes", "infra"],
        )];
        let results = keyword_search("kubernetes", &corpus, &Filters::default());

        assert_eq!(results[0].score, 18.0);
        assert_eq!(
            results[0].matched,
            vec![
                MatchedField::Title,
                MatchedField::Body,
                MatchedField::Tag("kubernetes".to_string())
            ]
        );
    }

    #[test]
    fn test_each_matching_tag_adds() {
        let corpus = vec![record("memory/a.md", "x", "y", &["#api", "api-design", "rest"])];
        let results = keyword_search("API", &corpus, &Filters::default());
        assert_eq!(results[0].score, 6.0);
    }

    #[test]
    fn test_postgres_scenario() {
        let corpus = postgres_corpus();
        let results = keyword_search("PostgreSQL", &corpus, &Filters::default());

        let ranked: Vec<(&str, f64)> = results.iter().map(|m| (m.identity(), m.score)).collect();
        assert_eq!(ranked, vec![("memory/r1.md", 10.0), ("memory/r2.md", 5.0)]);
    }

    #[test]
    fn test_zero_scores_never_returned() {
        let corpus = postgres_corpus();
        let results = keyword_search("kubernetes", &corpus, &Filters::default());
        assert!(results.is_empty());
    }

    #[test]
    fn test_importance_filter() {
        let corpus = postgres_corpus();
        let filters = Filters {
            min_importance: Some(4),
            ..Default::default()
        };
        let results = keyword_search("PostgreSQL", &corpus, &filters);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].identity(), "memory/r1.md");
    }

    #[test]
    fn test_type_and_date_filters() {
        let corpus = postgres_corpus();

        let by_type = Filters {
            record_type: Some("meeting".to_string()),
            ..Default::default()
        };
        let results = keyword_search("PostgreSQL", &corpus, &by_type);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].identity(), "memory/r2.md");

        let by_date = Filters {
            date: Some("2026-02-03".to_string()),
            record_type: Some("meeting".to_string()),
            ..Default::default()
        };
        assert!(keyword_search("PostgreSQL", &corpus, &by_date).is_empty());
    }

    #[test]
    fn test_ties_ordered_by_identity() {
        let corpus = vec![
            record("memory/c.md", "rust", "", &[]),
            record("memory/a.md", "rust", "", &[]),
            record("memory/b.md", "rust", "", &[]),
        ];
        let results = keyword_search("rust", &corpus, &Filters::default());
        let ids: Vec<&str> = results.iter().map(|m| m.identity()).collect();
        assert_eq!(ids, vec!["memory/a.md", "memory/b.md", "memory/c.md"]);
    }
}
