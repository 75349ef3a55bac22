//! Reading and writing the Markdown side of the vault.
//!
//! Memories live in `<vault>/memory/<YYYY-MM-DD>.md`, one file per day,
//! each starting with a YAML frontmatter block. A file is one searchable
//! record. `<vault>/MEMORY.md` collects long-term decisions and preferences.

use crate::error::{MemoryError, Result};
use crate::types::Record;
use chrono::NaiveDateTime;
use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

pub const MEMORY_DIR: &str = "memory";
pub const CORE_MEMORY_FILE: &str = "MEMORY.md";

const PREFERENCES_HEADING: &str = "## User Preferences";
const DECISIONS_HEADING: &str = "## Key Decisions";

pub const RECORD_TYPES: &[&str] = &[
    "daily-log",
    "decision",
    "task",
    "learning",
    "meeting",
    "preference",
];

pub const RECORD_STATUSES: &[&str] = &["in-progress", "done", "paused", "archived"];

/// Frontmatter keys that map onto `Record` fields
const KNOWN_KEYS: &[&str] = &[
    "date",
    "time",
    "type",
    "title",
    "tags",
    "importance",
    "project",
    "status",
];

pub fn memory_dir(vault: &Path) -> PathBuf {
    vault.join(MEMORY_DIR)
}

// =============================================================================
// Parsing
// =============================================================================

/// Split a note into its frontmatter text and body.
///
/// Only a note starting with `---` has frontmatter; it runs up to the next
/// `---`. With no closing marker everything after the opening one is
/// frontmatter and the body is empty.
pub fn split_frontmatter(content: &str) -> (Option<&str>, &str) {
    match content.strip_prefix("---") {
        Some(rest) => match rest.split_once("---") {
            Some((frontmatter, body)) => (Some(frontmatter), body),
            None => (Some(rest), ""),
        },
        None => (None, content),
    }
}

/// Parse frontmatter YAML into a mapping; empty frontmatter is an empty map
pub fn parse_frontmatter(text: &str) -> std::result::Result<Mapping, String> {
    match serde_yaml::from_str::<Value>(text) {
        Ok(Value::Mapping(map)) => Ok(map),
        Ok(Value::Null) => Ok(Mapping::new()),
        Ok(other) => Err(format!("expected a mapping, found {}", yaml_kind(&other))),
        Err(e) => Err(e.to_string()),
    }
}

fn yaml_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_string(&tagged.value),
        _ => None,
    }
}

fn field(map: &Mapping, key: &str) -> String {
    map.get(key).and_then(scalar_string).unwrap_or_default()
}

fn tags_field(map: &Mapping) -> Vec<String> {
    match map.get("tags") {
        Some(Value::Sequence(items)) => items.iter().filter_map(scalar_string).collect(),
        Some(value) => scalar_string(value).into_iter().collect(),
        None => Vec::new(),
    }
}

fn importance_field(map: &Mapping) -> Option<u8> {
    match map.get("importance")? {
        Value::Number(n) => n.as_u64().map(|v| v.min(u8::MAX as u64) as u8),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Build a record from a note's full text
pub fn parse_record(identity: &str, content: &str) -> std::result::Result<Record, String> {
    let (frontmatter, body) = split_frontmatter(content);
    let map = match frontmatter {
        Some(text) => parse_frontmatter(text)?,
        None => Mapping::new(),
    };

    let mut metadata = BTreeMap::new();
    for (key, value) in &map {
        let Some(key) = key.as_str() else { continue };
        if KNOWN_KEYS.contains(&key) {
            continue;
        }
        if let Ok(json) = serde_json::to_value(value) {
            metadata.insert(key.to_string(), json);
        }
    }

    Ok(Record {
        identity: identity.to_string(),
        title: field(&map, "title"),
        body: body.to_string(),
        tags: tags_field(&map),
        importance: importance_field(&map),
        date: field(&map, "date"),
        time: field(&map, "time"),
        record_type: field(&map, "type"),
        project: field(&map, "project"),
        status: field(&map, "status"),
        metadata,
    })
}

/// Load every note directly under `<vault>/memory/`, sorted by identity.
///
/// Notes that cannot be read or parsed are skipped with a warning.
pub fn load_corpus(vault: &Path) -> Result<Vec<Record>> {
    let folder = memory_dir(vault);
    if !folder.is_dir() {
        return Err(MemoryError::MissingMemoryFolder(folder));
    }

    let mut records = Vec::new();

    for entry in WalkDir::new(&folder)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", folder.display(), e);
                continue;
            }
        };

        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().map_or(true, |ext| ext != "md") {
            continue;
        }

        let identity = format!("{}/{}", MEMORY_DIR, entry.file_name().to_string_lossy());

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Skipping file {}: {}", path.display(), e);
                continue;
            }
        };

        match parse_record(&identity, &content) {
            Ok(record) => records.push(record),
            Err(message) => warn!(
                "Skipping file: {}",
                MemoryError::Frontmatter {
                    path: path.to_path_buf(),
                    message,
                }
            ),
        }
    }

    records.sort_by(|a, b| a.identity.cmp(&b.identity));
    debug!("loaded {} records from {}", records.len(), folder.display());

    Ok(records)
}

/// Split a memory file into entries on `---` separator lines, dropping the
/// frontmatter chunk and blank chunks
pub fn split_entries(content: &str) -> Vec<String> {
    content
        .split("\n---\n")
        .filter(|chunk| !chunk.trim().is_empty() && !chunk.starts_with("---"))
        .map(|chunk| chunk.trim().to_string())
        .collect()
}

/// All `*.md` files directly under `<vault>/memory/`, sorted by name
pub fn list_memory_files(vault: &Path) -> Result<Vec<PathBuf>> {
    let folder = memory_dir(vault);
    if !folder.is_dir() {
        return Err(MemoryError::MissingMemoryFolder(folder));
    }

    Ok(WalkDir::new(&folder)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "md"))
        .collect())
}

// =============================================================================
// Writing
// =============================================================================

fn daily_file(vault: &Path, now: &NaiveDateTime) -> PathBuf {
    memory_dir(vault).join(format!("{}.md", now.format("%Y-%m-%d")))
}

fn stars(importance: u8) -> String {
    "⭐".repeat(importance as usize)
}

fn render_frontmatter(map: &Mapping) -> Result<String> {
    Ok(format!("---\n{}---\n", serde_yaml::to_string(map)?))
}

fn append_to(path: &Path, text: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(|e| MemoryError::io(path, e))?;
    file.write_all(text.as_bytes())
        .map_err(|e| MemoryError::io(path, e))
}

/// Append a free-form entry to today's daily log, creating the file (and
/// the memory folder) if needed. Returns the file written.
pub fn append_entry(
    vault: &Path,
    content: &str,
    importance: u8,
    tags: &[String],
    now: &NaiveDateTime,
) -> Result<PathBuf> {
    let folder = memory_dir(vault);
    fs::create_dir_all(&folder).map_err(|e| MemoryError::io(&folder, e))?;

    let path = daily_file(vault, now);
    if !path.exists() {
        let date = now.format("%Y-%m-%d").to_string();
        let mut map = Mapping::new();
        map.insert("date".into(), date.clone().into());
        map.insert("type".into(), "daily-log".into());
        map.insert("tags".into(), Value::Sequence(vec!["memory".into()]));

        let header = format!("{}\n# Daily Memory: {}\n", render_frontmatter(&map)?, date);
        fs::write(&path, header).map_err(|e| MemoryError::io(&path, e))?;
    }

    let mut entry = format!("\n## {} - Memory Entry\n", now.format("%H:%M"));
    entry.push_str(&format!("**Importance**: {}\n", stars(importance)));
    if !tags.is_empty() {
        entry.push_str(&format!("**Tags**: {}\n", tags.join(" ")));
    }
    entry.push_str(&format!("\n{}\n\n---\n", content));

    append_to(&path, &entry)?;
    Ok(path)
}

/// A structured record to be written to the daily file
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDraft {
    pub title: String,
    pub record_type: String,
    pub content: String,
    pub tags: Vec<String>,
    pub importance: u8,
    pub project: String,
    pub status: String,
}

impl RecordDraft {
    pub fn new(title: &str, record_type: &str) -> Self {
        Self {
            title: title.to_string(),
            record_type: record_type.to_string(),
            content: String::new(),
            tags: vec!["#daily-log".to_string()],
            importance: 3,
            project: String::new(),
            status: "in-progress".to_string(),
        }
    }

    /// A decision record, titled after the first 30 characters of the text
    pub fn decision(content: &str, importance: Option<u8>, project: Option<&str>) -> Self {
        let summary: String = content.chars().take(30).collect();
        Self {
            title: format!("Decision - {}", summary),
            record_type: "decision".to_string(),
            content: content.to_string(),
            tags: vec![
                "#tech".to_string(),
                "#decision".to_string(),
                "#important".to_string(),
            ],
            importance: importance.unwrap_or(4),
            project: project.unwrap_or_default().to_string(),
            status: "done".to_string(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(MemoryError::InvalidRecord("missing required field: title".into()));
        }
        if self.record_type.trim().is_empty() {
            return Err(MemoryError::InvalidRecord("missing required field: type".into()));
        }
        if !(1..=5).contains(&self.importance) {
            return Err(MemoryError::InvalidRecord(
                "importance must be an integer from 1 to 5".into(),
            ));
        }
        if !RECORD_TYPES.contains(&self.record_type.as_str()) {
            return Err(MemoryError::InvalidRecord(format!(
                "invalid type: {} (expected one of {})",
                self.record_type,
                RECORD_TYPES.join(", ")
            )));
        }
        if !RECORD_STATUSES.contains(&self.status.as_str()) {
            return Err(MemoryError::InvalidRecord(format!(
                "invalid status: {} (expected one of {})",
                self.status,
                RECORD_STATUSES.join(", ")
            )));
        }
        Ok(())
    }

    fn frontmatter(&self, now: &NaiveDateTime) -> Mapping {
        let date = now.format("%Y-%m-%d").to_string();
        let time = now.format("%H:%M").to_string();

        let mut map = Mapping::new();
        map.insert("date".into(), date.into());
        map.insert("time".into(), time.into());
        map.insert("type".into(), self.record_type.clone().into());
        map.insert("title".into(), self.title.clone().into());
        map.insert(
            "tags".into(),
            Value::Sequence(self.tags.iter().map(|t| t.clone().into()).collect()),
        );
        map.insert("importance".into(), u64::from(self.importance).into());
        map.insert("project".into(), self.project.clone().into());
        map.insert("status".into(), self.status.clone().into());
        map.insert(
            "updated".into(),
            now.format("%Y-%m-%d %H:%M").to_string().into(),
        );
        map
    }

    /// The Markdown section appended for this record
    pub fn section(&self, now: &NaiveDateTime) -> String {
        format!(
            "\n\n## {} - {}\n\n{}\n\n---\n",
            now.format("%H:%M"),
            self.title,
            self.content
        )
    }
}

/// Write a validated structured record to today's file. The memory folder
/// must already exist. A new file gets the record's frontmatter; an
/// existing one only gets the section appended.
pub fn append_record(vault: &Path, draft: &RecordDraft, now: &NaiveDateTime) -> Result<PathBuf> {
    draft.validate()?;

    let folder = memory_dir(vault);
    if !folder.is_dir() {
        return Err(MemoryError::MissingMemoryFolder(folder));
    }

    let path = daily_file(vault, now);
    if path.exists() {
        append_to(&path, &draft.section(now))?;
    } else {
        let content = format!(
            "{}# {}\n{}",
            render_frontmatter(&draft.frontmatter(now))?,
            now.format("%Y-%m-%d"),
            draft.section(now)
        );
        fs::write(&path, content).map_err(|e| MemoryError::io(&path, e))?;
    }

    Ok(path)
}

/// Insert a summary of a decision or preference under its heading in
/// `MEMORY.md`. Returns whether the file changed; a missing file or
/// heading only logs a warning.
pub fn sync_core_memory(
    vault: &Path,
    draft: &RecordDraft,
    date: &str,
    source_file: &str,
) -> Result<bool> {
    let (heading, insertion) = match draft.record_type.as_str() {
        "preference" => (
            PREFERENCES_HEADING,
            format!("- {} (from [[{}/{}]])\n", draft.title, MEMORY_DIR, source_file),
        ),
        "decision" => {
            let summary: String = draft
                .content
                .trim()
                .lines()
                .next()
                .unwrap_or_default()
                .chars()
                .take(100)
                .collect();
            (
                DECISIONS_HEADING,
                format!(
                    "### {}: {}\n- Decision: {}\n- Source: [[{}/{}]]\n\n",
                    date, draft.title, summary, MEMORY_DIR, source_file
                ),
            )
        }
        _ => return Ok(false),
    };

    let path = vault.join(CORE_MEMORY_FILE);
    if !path.exists() {
        warn!("{} does not exist, skipping core memory sync", path.display());
        return Ok(false);
    }

    let existing = fs::read_to_string(&path).map_err(|e| MemoryError::io(&path, e))?;
    let pattern = Regex::new(&format!(r"{}\s*\n", regex::escape(heading)))
        .map_err(|e| MemoryError::Config(e.to_string()))?;

    let Some(found) = pattern.find(&existing) else {
        warn!("No '{}' section in {}, skipping core memory sync", heading, path.display());
        return Ok(false);
    };

    let mut updated = String::with_capacity(existing.len() + insertion.len());
    updated.push_str(&existing[..found.end()]);
    updated.push_str(&insertion);
    updated.push_str(&existing[found.end()..]);

    fs::write(&path, updated).map_err(|e| MemoryError::io(&path, e))?;
    Ok(true)
}

/// Create `memory/` and a starter `MEMORY.md` if they are missing
pub fn init_vault(vault: &Path, now: &NaiveDateTime) -> Result<()> {
    let folder = memory_dir(vault);
    fs::create_dir_all(&folder).map_err(|e| MemoryError::io(&folder, e))?;

    let core = vault.join(CORE_MEMORY_FILE);
    if !core.exists() {
        let date = now.format("%Y-%m-%d").to_string();
        let mut map = Mapping::new();
        map.insert("date".into(), date.clone().into());
        map.insert("type".into(), "long-term-memory".into());
        map.insert("title".into(), "Long-term Memory".into());
        map.insert(
            "tags".into(),
            Value::Sequence(vec!["#long-term-memory".into(), "#core".into()]),
        );
        map.insert("importance".into(), 5u64.into());
        map.insert("status".into(), "archived".into());

        let content = format!(
            "{}\n# Long-term Memory\n\n{}\n- Placeholder: working preferences and habits\n\n{}\n### {}: Initialize memory system\n- Decision: keep memories as Markdown in this vault\n",
            render_frontmatter(&map)?,
            PREFERENCES_HEADING,
            DECISIONS_HEADING,
            date
        );
        fs::write(&core, content).map_err(|e| MemoryError::io(&core, e))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, 3)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_split_frontmatter() {
        let (fm, body) = split_frontmatter("---\ntitle: x\n---\nbody text");
        assert_eq!(fm, Some("\ntitle: x\n"));
        assert_eq!(body, "\nbody text");

        let (fm, body) = split_frontmatter("no frontmatter");
        assert_eq!(fm, None);
        assert_eq!(body, "no frontmatter");

        let (fm, body) = split_frontmatter("---\ntitle: x\n");
        assert_eq!(fm, Some("\ntitle: x\n"));
        assert_eq!(body, "");
    }

    #[test]
    fn test_parse_record_fields() {
        let content = "---\ndate: 2026-02-03\ntime: \"14:30\"\ntype: decision\ntitle: Use PostgreSQL\ntags: [\"#tech\", \"#db\"]\nimportance: 5\nproject: Acme\nstatus: done\nupdated: 2026-02-03 14:30\n---\n# 2026-02-03\nWe picked PostgreSQL.\n";
        let record = parse_record("memory/2026-02-03.md", content).unwrap();

        assert_eq!(record.identity, "memory/2026-02-03.md");
        assert_eq!(record.title, "Use PostgreSQL");
        assert_eq!(record.date, "2026-02-03");
        assert_eq!(record.time, "14:30");
        assert_eq!(record.record_type, "decision");
        assert_eq!(record.tags, vec!["#tech", "#db"]);
        assert_eq!(record.importance, Some(5));
        assert_eq!(record.project, "Acme");
        assert_eq!(record.status, "done");
        assert!(record.body.contains("We picked PostgreSQL."));
        assert_eq!(
            record.metadata.get("updated"),
            Some(&serde_json::json!("2026-02-03 14:30"))
        );
    }

    #[test]
    fn test_parse_record_tag_string_and_missing_fields() {
        let record = parse_record("memory/a.md", "---\ntags: solo\n---\nbody").unwrap();
        assert_eq!(record.tags, vec!["solo"]);
        assert_eq!(record.importance, None);
        assert_eq!(record.importance_rank(), 0);
        assert_eq!(record.display_importance(), 3);
        assert_eq!(record.title, "");
    }

    #[test]
    fn test_parse_record_without_frontmatter() {
        let record = parse_record("memory/plain.md", "just text").unwrap();
        assert_eq!(record.body, "just text");
        assert!(record.tags.is_empty());
    }

    #[test]
    fn test_parse_record_rejects_bad_yaml() {
        assert!(parse_record("memory/bad.md", "---\ntitle: [unclosed\n---\nbody").is_err());
        assert!(parse_record("memory/list.md", "---\n- a\n- b\n---\nbody").is_err());
    }

    #[test]
    fn test_load_corpus_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        let folder = memory_dir(dir.path());
        fs::create_dir_all(&folder).unwrap();

        fs::write(folder.join("b.md"), "---\ntitle: Second\n---\nbody").unwrap();
        fs::write(folder.join("a.md"), "---\ntitle: First\n---\nbody").unwrap();
        fs::write(folder.join("broken.md"), "---\ntitle: [oops\n---\nbody").unwrap();
        fs::write(folder.join("binary.md"), [0xff, 0xfe, 0x00]).unwrap();
        fs::write(folder.join("notes.txt"), "ignored").unwrap();

        let records = load_corpus(dir.path()).unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.identity.as_str()).collect();
        assert_eq!(ids, vec!["memory/a.md", "memory/b.md"]);
    }

    #[test]
    fn test_load_corpus_missing_folder() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_corpus(dir.path()),
            Err(MemoryError::MissingMemoryFolder(_))
        ));
    }

    #[test]
    fn test_append_entry_creates_then_appends() {
        let dir = tempfile::tempdir().unwrap();

        let path = append_entry(dir.path(), "first thought", 4, &["work".to_string()], &at(9, 5))
            .unwrap();
        append_entry(dir.path(), "second thought", 2, &[], &at(10, 0)).unwrap();

        assert_eq!(path, dir.path().join("memory").join("2026-02-03.md"));
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("---\n"));
        assert!(content.contains("# Daily Memory: 2026-02-03"));
        assert!(content.contains("## 09:05 - Memory Entry\n**Importance**: ⭐⭐⭐⭐\n**Tags**: work\n"));
        assert!(content.contains("## 10:00 - Memory Entry\n**Importance**: ⭐⭐\n\nsecond thought"));

        let record = parse_record("memory/2026-02-03.md", &content).unwrap();
        assert_eq!(record.date, "2026-02-03");
        assert_eq!(record.record_type, "daily-log");
        assert_eq!(record.tags, vec!["memory"]);

        let entries = split_entries(&content);
        assert_eq!(entries.len(), 2);
        assert!(entries[0].contains("first thought"));
        assert!(entries[1].contains("second thought"));
    }

    #[test]
    fn test_append_record_requires_memory_folder() {
        let dir = tempfile::tempdir().unwrap();
        let draft = RecordDraft::new("Title", "task");
        assert!(matches!(
            append_record(dir.path(), &draft, &at(8, 0)),
            Err(MemoryError::MissingMemoryFolder(_))
        ));
    }

    #[test]
    fn test_append_record_roundtrips_frontmatter() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(memory_dir(dir.path())).unwrap();

        let mut draft = RecordDraft::new("Ship: \"v2\" API", "task");
        draft.content = "Finish the API".to_string();
        draft.importance = 5;
        draft.project = "Acme Dashboard".to_string();

        let path = append_record(dir.path(), &draft, &at(11, 30)).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("# 2026-02-03\n\n\n## 11:30 - Ship: \"v2\" API\n\nFinish the API\n"));

        let record = parse_record("memory/2026-02-03.md", &content).unwrap();
        assert_eq!(record.title, "Ship: \"v2\" API");
        assert_eq!(record.time, "11:30");
        assert_eq!(record.importance, Some(5));
        assert_eq!(record.project, "Acme Dashboard");
        assert_eq!(record.status, "in-progress");

        let mut second = RecordDraft::new("Later", "meeting");
        second.content = "Standup".to_string();
        append_record(dir.path(), &second, &at(15, 0)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("\n---\n").count(), 3);
        assert!(content.ends_with("## 15:00 - Later\n\nStandup\n\n---\n"));
    }

    #[test]
    fn test_record_validation() {
        let mut draft = RecordDraft::new("T", "task");
        assert!(draft.validate().is_ok());

        draft.importance = 6;
        assert!(draft.validate().is_err());

        draft.importance = 3;
        draft.record_type = "gossip".to_string();
        assert!(draft.validate().is_err());

        draft.record_type = "task".to_string();
        draft.status = "forgotten".to_string();
        assert!(draft.validate().is_err());

        let untitled = RecordDraft::new("  ", "task");
        assert!(untitled.validate().is_err());
    }

    #[test]
    fn test_decision_draft_defaults() {
        let draft = RecordDraft::decision("Use PostgreSQL as the primary database for billing", None, None);
        assert_eq!(draft.title, "Decision - Use PostgreSQL as the primary ");
        assert_eq!(draft.importance, 4);
        assert_eq!(draft.status, "done");
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_sync_core_memory_inserts_under_heading() {
        let dir = tempfile::tempdir().unwrap();
        init_vault(dir.path(), &at(8, 0)).unwrap();

        let decision = RecordDraft::decision("Use REST for the public API", Some(5), None);
        assert!(sync_core_memory(dir.path(), &decision, "2026-02-03", "2026-02-03.md").unwrap());

        let preference = RecordDraft::new("Prefers dark mode", "preference");
        assert!(sync_core_memory(dir.path(), &preference, "2026-02-03", "2026-02-03.md").unwrap());

        let core = fs::read_to_string(dir.path().join(CORE_MEMORY_FILE)).unwrap();
        assert!(core.contains(
            "## Key Decisions\n### 2026-02-03: Decision - Use REST for the public API\n- Decision: Use REST for the public API\n- Source: [[memory/2026-02-03.md]]\n\n### 2026-02-03: Initialize"
        ));
        assert!(core.contains(
            "## User Preferences\n- Prefers dark mode (from [[memory/2026-02-03.md]])\n- Placeholder"
        ));
    }

    #[test]
    fn test_sync_core_memory_missing_file_or_type() {
        let dir = tempfile::tempdir().unwrap();
        let decision = RecordDraft::decision("x", None, None);
        assert!(!sync_core_memory(dir.path(), &decision, "2026-02-03", "f.md").unwrap());

        init_vault(dir.path(), &at(8, 0)).unwrap();
        let task = RecordDraft::new("t", "task");
        assert!(!sync_core_memory(dir.path(), &task, "2026-02-03", "f.md").unwrap());
    }

    #[test]
    fn test_split_entries_skips_frontmatter() {
        let text = "---\ndate: x\n---\n\n# header\n\n## 10:00 - A\n\nalpha\n\n---\n\n## 11:00 - B\n\nbeta\n\n---\n";
        let entries = split_entries(text);
        assert_eq!(entries.len(), 2);
        assert!(entries[0].ends_with("alpha"));
        assert!(entries[1].ends_with("beta"));
    }
}
