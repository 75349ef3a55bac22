use crate::config::{find_vault_path, VaultConfig};
use crate::error::Result;
use crate::search::{hybrid_search, keyword_search, semantic_search, KEYWORD_SCORE_CEILING};
use crate::types::{Filters, Record, ScoredMatch};
use crate::vault::load_corpus;
use std::fmt;
use std::path::Path;

const SNIPPET_CHARS: usize = 100;

/// Which scorer produced a result list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    Keyword,
    Semantic,
    Hybrid,
}

impl SearchMode {
    fn label(self) -> &'static str {
        match self {
            SearchMode::Keyword => "Keyword search",
            SearchMode::Semantic => "Semantic search",
            SearchMode::Hybrid => "Hybrid search",
        }
    }
}

fn load(vault: Option<&Path>) -> Result<(VaultConfig, Vec<Record>)> {
    let vault_path = find_vault_path(vault)?;
    let corpus = load_corpus(&vault_path)?;
    Ok((VaultConfig::new(vault_path), corpus))
}

/// Run the search command
pub fn run_search(vault: Option<&Path>, query: &str, filters: &Filters, max: usize) -> Result<()> {
    let (_, corpus) = load(vault)?;
    let results = keyword_search(query, &corpus, filters);
    print!(
        "{}",
        ResultsView {
            mode: SearchMode::Keyword,
            query,
            results: &results,
            max,
        }
    );
    Ok(())
}

/// Run the semantic command
pub fn run_semantic(
    vault: Option<&Path>,
    query: &str,
    threshold: Option<f64>,
    filters: &Filters,
    max: usize,
) -> Result<()> {
    let (config, corpus) = load(vault)?;
    let threshold = threshold.unwrap_or_else(|| config.semantic_threshold());

    let results = semantic_search(query, &corpus, threshold, filters);
    print!(
        "{}",
        ResultsView {
            mode: SearchMode::Semantic,
            query,
            results: &results,
            max,
        }
    );
    Ok(())
}

/// Run the hybrid command
pub fn run_hybrid(
    vault: Option<&Path>,
    query: &str,
    keyword_weight: Option<f64>,
    semantic_weight: Option<f64>,
    filters: &Filters,
    max: usize,
) -> Result<()> {
    let (config, corpus) = load(vault)?;
    let mut weights = config.hybrid_weights();
    if let Some(w) = keyword_weight {
        weights.keyword = w;
    }
    if let Some(w) = semantic_weight {
        weights.semantic = w;
    }

    let results = hybrid_search(query, &corpus, &weights, filters);
    print!(
        "{}",
        ResultsView {
            mode: SearchMode::Hybrid,
            query,
            results: &results,
            max,
        }
    );
    Ok(())
}

fn percent(score: f64) -> i64 {
    (score * 100.0) as i64
}

/// Body text around the first case-insensitive occurrence of `query`:
/// 20 characters before it, up to 100 from where it starts
fn match_snippet(body: &str, query: &str) -> Option<String> {
    if query.is_empty() {
        return None;
    }
    let lowered = body.to_lowercase();
    let byte_pos = lowered.find(&query.to_lowercase())?;
    let pos = lowered[..byte_pos].chars().count();
    let start = pos.saturating_sub(20);

    Some(
        body.chars()
            .skip(start)
            .take(pos + SNIPPET_CHARS - start)
            .collect::<String>()
            .replace('\n', " "),
    )
}

/// Up to `max` results formatted for the terminal
pub struct ResultsView<'a> {
    pub mode: SearchMode,
    pub query: &'a str,
    pub results: &'a [ScoredMatch<'a>],
    pub max: usize,
}

impl fmt::Display for ResultsView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.results.is_empty() {
            return writeln!(f, "No records found for \"{}\"", self.query);
        }

        writeln!(f, "{}: \"{}\"", self.mode.label(), self.query)?;
        writeln!(f, "Found {} records\n", self.results.len())?;

        for (i, m) in self.results.iter().take(self.max).enumerate() {
            self.fmt_match(f, i + 1, m)?;
        }

        if self.results.len() > self.max {
            writeln!(f, "{} more records not shown", self.results.len() - self.max)?;
        }
        Ok(())
    }
}

impl ResultsView<'_> {
    fn fmt_match(&self, f: &mut fmt::Formatter<'_>, rank: usize, m: &ScoredMatch<'_>) -> fmt::Result {
        let record = m.record;
        let title = if record.title.is_empty() {
            "(untitled)"
        } else {
            record.title.as_str()
        };

        writeln!(
            f,
            "[{}] {} {}",
            rank,
            "⭐".repeat(record.display_importance() as usize),
            title
        )?;
        writeln!(f, "    date: {} {}", record.date, record.time)?;
        if !record.tags.is_empty() {
            writeln!(f, "    tags: {}", record.tags.join(" "))?;
        }
        if !record.project.is_empty() {
            writeln!(f, "    project: {}", record.project)?;
        }
        if !record.status.is_empty() {
            writeln!(f, "    status: {}", record.status)?;
        }

        match self.mode {
            SearchMode::Keyword => {
                let fields: Vec<String> = m.matched.iter().map(|field| field.to_string()).collect();
                writeln!(f, "    score: {} ({})", m.score, fields.join(", "))?;
            }
            SearchMode::Semantic => {
                writeln!(f, "    similarity: {}%", percent(m.score))?;
            }
            SearchMode::Hybrid => {
                writeln!(f, "    score: {}%", percent(m.score))?;
                if let Some(breakdown) = m.breakdown {
                    writeln!(
                        f,
                        "      keyword: {}%",
                        percent(breakdown.keyword / KEYWORD_SCORE_CEILING)
                    )?;
                    writeln!(f, "      semantic: {}%", percent(breakdown.semantic))?;
                }
            }
        }

        writeln!(f, "    file: {}", record.identity)?;
        if let Some(updated) = record.metadata.get("updated").and_then(|v| v.as_str()) {
            writeln!(f, "    updated: {}", updated)?;
        }

        if self.mode == SearchMode::Keyword {
            if let Some(snippet) = match_snippet(&record.body, self.query) {
                writeln!(f, "    ...{}...", snippet)?;
            }
        } else if record.body.chars().count() > SNIPPET_CHARS {
            let snippet: String = record.body.chars().take(SNIPPET_CHARS).collect();
            writeln!(f, "    {}...", snippet.replace('\n', " "))?;
        }
        writeln!(f)
    }
}
