use crate::error::{MemoryError, Result};
use crate::memory::Memories;
use crate::types::{IndexMatch, RememberOutcome};
use crate::vault::RecordDraft;
use std::path::Path;

/// Arguments of the `record` command
pub struct RecordArgs {
    pub title: String,
    pub record_type: String,
    pub content: String,
    pub tags: Option<String>,
    pub importance: Option<u8>,
    pub project: Option<String>,
    pub status: Option<String>,
}

/// Split a comma-separated tag list, dropping empty items
pub fn parse_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Run the init command
pub fn run_init(vault: Option<&Path>) -> Result<()> {
    let path = vault.unwrap_or_else(|| Path::new("."));
    let mem = Memories::init(path)?;

    println!("Initialized vault at {}", mem.vault_path().display());
    println!(
        "  index:    {} ({})",
        mem.index_name(),
        mem.config().index_dir().display()
    );
    println!("  embedder: {}", mem.embedder_name());

    Ok(())
}

/// Run the remember command
pub fn run_remember(vault: Option<&Path>, content: &str, importance: u8, tags: &str) -> Result<()> {
    let mut mem = Memories::open(vault)?;
    let tags_vec = parse_tags(tags);

    let outcome = mem.remember(content, importance, &tags_vec)?;
    print_outcome("Remembered", &outcome);
    if !tags_vec.is_empty() {
        println!("  tags: {}", tags_vec.join(", "));
    }

    Ok(())
}

/// Run the record command
pub fn run_record(vault: Option<&Path>, args: RecordArgs) -> Result<()> {
    let mut draft = RecordDraft::new(&args.title, &args.record_type);
    draft.content = args.content;
    if let Some(tags) = args.tags {
        draft.tags = parse_tags(&tags);
    }
    if let Some(importance) = args.importance {
        draft.importance = importance;
    }
    if let Some(project) = args.project {
        draft.project = project;
    }
    if let Some(status) = args.status {
        draft.status = status;
    }

    let mut mem = Memories::open(vault)?;
    let outcome = mem.record(&draft)?;
    print_outcome(&format!("Recorded {}", draft.record_type), &outcome);

    Ok(())
}

/// Run the decide command
pub fn run_decide(
    vault: Option<&Path>,
    content: &str,
    importance: Option<u8>,
    project: Option<&str>,
) -> Result<()> {
    if content.trim().is_empty() {
        return Err(MemoryError::InvalidRecord("decision text is empty".into()));
    }

    let draft = RecordDraft::decision(content, importance, project);
    let mut mem = Memories::open(vault)?;
    let outcome = mem.record(&draft)?;
    print_outcome("Recorded decision", &outcome);

    Ok(())
}

/// Run the recall command
pub fn run_recall(vault: Option<&Path>, query: &str, limit: usize) -> Result<()> {
    let mem = Memories::open(vault)?;
    let results = mem.recall(query, limit)?;

    if results.is_empty() {
        println!("No matching memories.");
        return Ok(());
    }

    for r in &results {
        print_match(r);
    }

    Ok(())
}

/// Run the sync command
pub fn run_sync(vault: Option<&Path>) -> Result<()> {
    let mut mem = Memories::open(vault)?;
    let report = mem.sync()?;

    println!(
        "Synced {} entries from {} files into the {} index",
        report.entries,
        report.files,
        mem.index_name()
    );
    if report.failed > 0 {
        println!("  {} entries failed to index", report.failed);
    }
    println!("  index size: {}", mem.index_len()?);

    Ok(())
}

fn print_outcome(action: &str, outcome: &RememberOutcome) {
    println!("{} [{}]", action, &outcome.doc_id[..8.min(outcome.doc_id.len())]);
    println!("  file: {}", outcome.file.display());
    if !outcome.indexed {
        println!("  (not indexed; run `vault-memory sync` later)");
    }
}

fn print_match(r: &IndexMatch) {
    println!("[{}] score: {:.3}", &r.id[..8.min(r.id.len())], r.score);

    if let Some(source) = r.metadata.get("source_file").and_then(|v| v.as_str()) {
        println!("    source: {}", source);
    }

    let preview: String = r.content.chars().take(200).collect();
    let preview = if r.content.chars().count() > 200 {
        format!("{}...", preview)
    } else {
        preview
    };
    println!("    {}\n", preview.replace('\n', " "));
}
