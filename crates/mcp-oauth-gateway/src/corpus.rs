//! Document corpus collaborator behind the document tools.
//!
//! The upstream pipeline (office/PDF extraction, cloud ingestion, embeddings)
//! is external. This module only consumes its output: a directory of
//! processed `*.txt` files, one per source document.

use std::cmp::Reverse;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::{CollaboratorError, CollaboratorResult};

/// A ranked excerpt of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Passage {
    pub document: String,
    pub text: String,
    pub score: usize,
}

/// Search and retrieval over a document corpus.
#[async_trait::async_trait]
pub trait DocumentIndex: Send + Sync {
    /// Return up to `top_k` passages relevant to `query`, best first.
    async fn search(&self, query: &str, top_k: usize) -> CollaboratorResult<Vec<Passage>>;

    /// Names of all indexed documents.
    async fn list(&self) -> CollaboratorResult<Vec<String>>;

    /// Full text of one document.
    async fn read(&self, name: &str) -> CollaboratorResult<String>;

    /// Rebuild the index from the source. Returns the number of documents indexed.
    async fn reindex(&self) -> CollaboratorResult<usize>;
}

#[derive(Debug, Clone)]
struct Document {
    name: String,
    text: String,
}

/// Keyword index over the processed `.txt` files of a directory.
#[derive(Debug)]
pub struct ProcessedDocs {
    dir: PathBuf,
    docs: RwLock<Vec<Document>>,
}

impl ProcessedDocs {
    /// Index the documents currently in `dir`.
    pub async fn open(dir: impl Into<PathBuf>) -> CollaboratorResult<Self> {
        let dir = dir.into();
        let docs = load_dir(&dir).await?;
        tracing::info!(dir = %dir.display(), documents = docs.len(), "Loaded processed documents");
        Ok(Self { dir, docs: RwLock::new(docs) })
    }
}

async fn load_dir(dir: &Path) -> CollaboratorResult<Vec<Document>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut docs = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("txt") {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let text = tokio::fs::read_to_string(&path).await?;
        if text.trim().is_empty() {
            continue;
        }
        docs.push(Document { name: name.to_string(), text });
    }

    docs.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(docs)
}

/// Lowercased alphanumeric terms of at least two characters.
fn terms(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 2)
        .map(str::to_lowercase)
}

fn paragraphs(text: &str) -> impl Iterator<Item = &str> {
    text.split("\n\n").map(str::trim).filter(|p| !p.is_empty())
}

#[async_trait::async_trait]
impl DocumentIndex for ProcessedDocs {
    async fn search(&self, query: &str, top_k: usize) -> CollaboratorResult<Vec<Passage>> {
        let docs = self.docs.read().await;
        if docs.is_empty() {
            return Err(CollaboratorError::Unavailable(
                "no processed documents are indexed; run reindex_documents".to_string(),
            ));
        }

        let query_terms: HashSet<String> = terms(query).collect();
        let mut hits: Vec<Passage> = docs
            .iter()
            .flat_map(|doc| paragraphs(&doc.text).map(move |para| (doc.name.as_str(), para)))
            .filter_map(|(document, para)| {
                let score = terms(para).filter(|t| query_terms.contains(t)).count();
                (score > 0).then(|| Passage {
                    document: document.to_string(),
                    text: para.to_string(),
                    score,
                })
            })
            .collect();

        // Stable sort keeps document order among equal scores.
        hits.sort_by_key(|p| Reverse(p.score));
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn list(&self) -> CollaboratorResult<Vec<String>> {
        Ok(self.docs.read().await.iter().map(|d| d.name.clone()).collect())
    }

    async fn read(&self, name: &str) -> CollaboratorResult<String> {
        let name = name.strip_suffix(".txt").unwrap_or(name);
        self.docs
            .read()
            .await
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.text.clone())
            .ok_or_else(|| CollaboratorError::not_found(format!("document '{name}'")))
    }

    async fn reindex(&self) -> CollaboratorResult<usize> {
        let docs = load_dir(&self.dir).await?;
        let count = docs.len();
        *self.docs.write().await = docs;
        tracing::info!(documents = count, "Reindexed processed documents");
        Ok(count)
    }
}

/// Test helper: a scratch directory under the system temp dir, removed on drop.
#[cfg(test)]
pub(crate) struct ScratchDir(pub PathBuf);

#[cfg(test)]
impl ScratchDir {
    pub(crate) fn new() -> Self {
        let dir = std::env::temp_dir().join(format!("corpus-{}", uuid::Uuid::new_v4().simple()));
        std::fs::create_dir_all(&dir).unwrap();
        Self(dir)
    }

    pub(crate) fn write(&self, name: &str, text: &str) {
        std::fs::write(self.0.join(name), text).unwrap();
    }
}

#[cfg(test)]
impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}
