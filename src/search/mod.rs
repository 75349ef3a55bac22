//! Scoring records against a query.
//!
//! All three scorers run over an in-memory corpus and return matches
//! ordered by descending score, ties broken by record identity.

mod hybrid;
mod keyword;
mod semantic;

pub use hybrid::{hybrid_search, HybridWeights, KEYWORD_SCORE_CEILING};
pub use keyword::keyword_search;
pub use semantic::{semantic_search, DEFAULT_THRESHOLD};

use crate::types::ScoredMatch;
use std::cmp::Ordering;

/// Sort descending by score, then ascending by identity
pub(crate) fn rank(matches: &mut [ScoredMatch<'_>]) {
    matches.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.identity().cmp(b.identity()))
    });
}
