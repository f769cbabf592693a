//! Domain knowledge selection.
//!
//! Knowledge documents are Markdown files describing business rules that the
//! schema alone cannot express. For each question a keyword match picks the
//! relevant documents, which are then rendered into a prompt section.

use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, RwLock};
use tracing::{debug, warn};

/// Document included with every selection when present.
pub const JOINS_DOCUMENT: &str = "_joins.md";

/// Minimum number of distinct keywords a document body must contain to be
/// selected on content alone.
const MIN_CONTENT_MATCHES: usize = 2;

static WORD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-z]+\b").expect("word pattern is valid"));

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "is", "are", "was", "were", "be", "been", "being",
    "have", "has", "had", "do", "does", "did", "will", "would", "could", "should", "may",
    "might", "can", "to", "of", "in", "for", "on", "with", "at", "by", "from", "as", "into",
    "through", "during", "before", "after", "above", "below", "between", "under", "again",
    "further", "then", "once", "all", "each", "few", "more", "most", "other", "some", "such",
    "no", "nor", "not", "only", "own", "same", "so", "than", "too", "very", "just", "what",
    "which", "who", "whom", "this", "that", "these", "those", "am", "show", "me", "list",
    "get", "find", "give", "tell", "how", "many", "much", "when", "where", "why", "total",
    "count", "sum", "average", "avg", "max", "min",
];

/// A source of knowledge documents, addressed by file name.
pub trait KnowledgeSource: Send + Sync {
    /// Returns true if the source is available at all.
    fn exists(&self) -> bool;

    /// Lists document identifiers in enumeration order.
    fn list(&self) -> Vec<String>;

    /// Loads a document's text, or `None` if it is missing or unreadable.
    fn load(&self, id: &str) -> Option<Arc<str>>;
}

/// Knowledge documents stored as `*.md` files in a directory.
///
/// Documents are read on first use and cached for the lifetime of the value.
#[derive(Debug)]
pub struct DirectoryKnowledge {
    dir: PathBuf,
    cache: RwLock<HashMap<String, Arc<str>>>,
}

impl DirectoryKnowledge {
    /// Creates a source over `dir`. The directory need not exist.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the backing directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn cached(&self, id: &str) -> Option<Arc<str>> {
        self.cache.read().ok()?.get(id).cloned()
    }
}

impl KnowledgeSource for DirectoryKnowledge {
    fn exists(&self) -> bool {
        self.dir.is_dir()
    }

    fn list(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "md"))
            .filter_map(|path| path.file_name()?.to_str().map(str::to_string))
            .collect();
        names.sort();
        names
    }

    fn load(&self, id: &str) -> Option<Arc<str>> {
        if let Some(text) = self.cached(id) {
            return Some(text);
        }

        let path = self.dir.join(id);
        if !path.is_file() {
            return None;
        }

        let text: Arc<str> = match fs::read_to_string(&path) {
            Ok(text) => text.into(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read knowledge document");
                return None;
            }
        };

        if let Ok(mut cache) = self.cache.write() {
            cache.entry(id.to_string()).or_insert_with(|| text.clone());
        }
        Some(text)
    }
}

/// Extracts lowercase keywords from free text.
///
/// Keeps alphabetic words longer than two characters that are not stop words.
pub fn extract_keywords(text: &str) -> BTreeSet<String> {
    let lower = text.to_lowercase();
    WORD_PATTERN
        .find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|word| word.len() > 2 && !STOP_WORDS.contains(word))
        .map(str::to_string)
        .collect()
}

/// Picks the knowledge documents relevant to a question.
pub struct KnowledgeSelector {
    source: Option<Arc<dyn KnowledgeSource>>,
}

impl KnowledgeSelector {
    /// Creates a selector over `source`.
    pub fn new(source: Arc<dyn KnowledgeSource>) -> Self {
        Self {
            source: Some(source),
        }
    }

    /// Creates a selector that never selects anything.
    pub fn empty() -> Self {
        Self { source: None }
    }

    /// Returns the identifiers of the documents relevant to `question`.
    ///
    /// Table names count as keywords. `_joins.md` is always appended when
    /// the source has it.
    pub fn select(&self, question: &str, table_names: &[String]) -> Vec<String> {
        let Some(source) = self.source.as_ref().filter(|s| s.exists()) else {
            return Vec::new();
        };

        let mut keywords = extract_keywords(question);
        keywords.extend(table_names.iter().map(|t| t.to_lowercase()));

        let available = source.list();
        let mut selected = Vec::new();

        for id in &available {
            let stem = document_stem(id).to_lowercase();

            if keywords.contains(&stem) || keywords.iter().any(|kw| stem.contains(kw.as_str())) {
                selected.push(id.clone());
                continue;
            }

            if let Some(text) = source.load(id) {
                let lower = text.to_lowercase();
                let matches = keywords
                    .iter()
                    .filter(|kw| lower.contains(kw.as_str()))
                    .count();
                if matches >= MIN_CONTENT_MATCHES {
                    selected.push(id.clone());
                }
            }
        }

        if available.iter().any(|id| id == JOINS_DOCUMENT)
            && !selected.iter().any(|id| id == JOINS_DOCUMENT)
        {
            selected.push(JOINS_DOCUMENT.to_string());
        }

        debug!(?keywords, ?selected, "Selected knowledge documents");
        selected
    }

    /// Renders the selected documents as a `DOMAIN KNOWLEDGE:` prompt
    /// section, or returns an empty string when nothing is selected.
    pub fn context(&self, question: &str, table_names: &[String]) -> String {
        let Some(source) = self.source.as_ref() else {
            return String::new();
        };

        let mut sections = Vec::new();
        for id in self.select(question, table_names) {
            let Some(text) = source.load(&id) else {
                continue;
            };
            if text.is_empty() {
                continue;
            }
            sections.push(format!("### {id}"));
            sections.push(text.trim().to_string());
            sections.push(String::new());
        }

        if sections.is_empty() {
            return String::new();
        }

        let mut lines = vec!["DOMAIN KNOWLEDGE:".to_string(), String::new()];
        lines.extend(sections);
        lines.join("\n")
    }
}

fn document_stem(id: &str) -> &str {
    Path::new(id)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(id)
}
