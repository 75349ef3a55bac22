use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Importance shown for records that never set one
pub const DEFAULT_DISPLAY_IMPORTANCE: u8 = 3;

/// A retrievable memory record, parsed from one note file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    /// Vault-relative path, e.g. `memory/2026-02-03.md`
    pub identity: String,
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    pub importance: Option<u8>,
    pub date: String,
    pub time: String,
    pub record_type: String,
    pub project: String,
    pub status: String,
    /// Frontmatter keys not modelled above
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Record {
    /// Importance used when comparing against a filter threshold
    pub fn importance_rank(&self) -> u8 {
        self.importance.unwrap_or(0)
    }

    pub fn display_importance(&self) -> u8 {
        self.importance.unwrap_or(DEFAULT_DISPLAY_IMPORTANCE)
    }
}

/// Conjunctive search filters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub date: Option<String>,
    pub record_type: Option<String>,
    pub min_importance: Option<u8>,
}

impl Filters {
    pub fn matches(&self, record: &Record) -> bool {
        if let Some(date) = &self.date {
            if &record.date != date {
                return false;
            }
        }
        if let Some(record_type) = &self.record_type {
            if &record.record_type != record_type {
                return false;
            }
        }
        if let Some(min) = self.min_importance {
            if record.importance_rank() < min {
                return false;
            }
        }
        true
    }
}

/// Which part of a record a keyword hit landed in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchedField {
    Title,
    Body,
    Tag(String),
}

impl fmt::Display for MatchedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchedField::Title => write!(f, "title"),
            MatchedField::Body => write!(f, "body"),
            MatchedField::Tag(tag) => write!(f, "tag: {}", tag),
        }
    }
}

/// Sub-scores behind a hybrid score
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreBreakdown {
    /// Raw additive keyword score
    pub keyword: f64,
    pub semantic: f64,
}

/// A record with its score under one of the scorers
#[derive(Debug, Clone)]
pub struct ScoredMatch<'a> {
    pub record: &'a Record,
    pub score: f64,
    pub breakdown: Option<ScoreBreakdown>,
    pub matched: Vec<MatchedField>,
}

impl<'a> ScoredMatch<'a> {
    pub fn identity(&self) -> &str {
        &self.record.identity
    }
}

/// An entry stored in a vector index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub vector: Vec<f32>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// A vector index hit
#[derive(Debug, Clone, PartialEq)]
pub struct IndexMatch {
    pub id: String,
    pub score: f64,
    pub content: String,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Result of writing a memory to the vault and the index
#[derive(Debug, Clone)]
pub struct RememberOutcome {
    pub file: PathBuf,
    pub doc_id: String,
    pub indexed: bool,
}

/// Result of re-indexing every memory file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub files: usize,
    pub entries: usize,
    pub failed: usize,
}
