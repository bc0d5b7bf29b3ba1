use std::collections::HashMap;
use std::path::Path;

use uuid::Uuid;

use super::document::{ingest, DocumentMeta};
use super::passage::{Passage, PassageSource};
use super::CorpusError;
use crate::embedding::EmbeddingModel;

/// Read-only index of reference passages, grouped by named scope.
///
/// Built once at startup and shared behind an `Arc`; request handlers never
/// mutate it. The write path (re-indexing) is an external collaborator.
#[derive(Debug, Default)]
pub struct CorpusIndex {
    scopes: HashMap<String, Vec<Passage>>,
}

impl CorpusIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a scope name to its passages.
    pub fn scope(&self, name: &str) -> Result<&[Passage], CorpusError> {
        self.scopes
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| CorpusError::UnknownScope(name.to_string()))
    }

    pub fn scope_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.scopes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn passage_count(&self) -> usize {
        self.scopes.values().map(Vec::len).sum()
    }

    /// Insert a scope wholesale. Only used during startup construction
    /// and by tests; the built index is immutable by convention.
    pub fn insert_scope(&mut self, name: impl Into<String>, passages: Vec<Passage>) {
        self.scopes.insert(name.into(), passages);
    }

    /// Load reference corpora from a directory tree.
    ///
    /// Each subdirectory of `root` becomes a scope; each `.md`/`.txt` file in
    /// it becomes one document, segmented by headings and embedded once.
    pub async fn load_dir<E: EmbeddingModel + ?Sized>(
        root: &Path,
        embedder: &E,
    ) -> Result<Self, CorpusError> {
        let mut index = Self::new();

        let entries =
            std::fs::read_dir(root).map_err(|e| CorpusError::Load(format!("{}: {e}", root.display())))?;

        for entry in entries {
            let entry = entry.map_err(|e| CorpusError::Load(e.to_string()))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let scope = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => name.to_string(),
                None => continue,
            };

            let passages = load_scope(&path, &scope, embedder).await?;
            tracing::info!(scope = %scope, passages = passages.len(), "corpus scope loaded");
            index.insert_scope(scope, passages);
        }

        Ok(index)
    }
}

async fn load_scope<E: EmbeddingModel + ?Sized>(
    dir: &Path,
    scope: &str,
    embedder: &E,
) -> Result<Vec<Passage>, CorpusError> {
    let mut passages = Vec::new();

    let mut files: Vec<_> = std::fs::read_dir(dir)
        .map_err(|e| CorpusError::Load(format!("{}: {e}", dir.display())))?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| {
            matches!(
                p.extension().and_then(|e| e.to_str()),
                Some("md") | Some("txt")
            )
        })
        .collect();
    files.sort();

    for file in files {
        let stem = file
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document")
            .to_string();

        let raw = std::fs::read_to_string(&file)
            .map_err(|e| CorpusError::Load(format!("{}: {e}", file.display())))?;

        let doc = match ingest(&raw, DocumentMeta::default()) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(file = %file.display(), error = %e, "skipping unsegmentable corpus file");
                continue;
            }
        };

        // Reference passages get stable ids from scope + file, not the
        // transient document uuid, so the index is reproducible across runs.
        let doc_id = Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("{scope}/{stem}").as_bytes());
        for (idx, section) in doc.sections.iter().enumerate() {
            let embedding = embedder.embed(&section.text).await?;
            passages.push(Passage::new(
                format!("{scope}:{stem}:{idx:04}"),
                doc_id,
                section.text.clone(),
                PassageSource::Reference,
                Some(embedding),
            ));
        }
    }

    Ok(passages)
}
