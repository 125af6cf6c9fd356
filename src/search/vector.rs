use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A stored vector entry
#[derive(Debug, Clone, Serialize, Deserialize)]
struct VectorEntry {
    content: String,
    embedding: Vec<f32>,
}

/// On-disk form: entries are only reused for the model that produced them.
#[derive(Serialize, Deserialize)]
struct PersistedIndex {
    model: String,
    entries: Vec<VectorEntry>,
}

/// Flat in-memory index: exhaustive inner-product search over unit vectors,
/// optionally persisted as JSON so unchanged menus are not re-embedded.
///
/// Embedders hand over raw vectors. Stored entries are normalized once in
/// [`VectorStore::replace`] and the query once in [`VectorStore::search`], so
/// every score is a cosine similarity.
pub struct VectorStore {
    entries: RwLock<Vec<VectorEntry>>,
    model: String,
    persist_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VectorHit {
    /// Position of the document in the indexed list.
    pub doc_id: usize,
    pub content: String,
    pub score: f32,
}

impl VectorStore {
    pub fn open_or_create(vector_dir: &Path, model: &str) -> Result<Self> {
        std::fs::create_dir_all(vector_dir)
            .with_context(|| format!("Failed to create {}", vector_dir.display()))?;
        let persist_path = vector_dir.join("vectors.json");

        let entries = if persist_path.exists() {
            let data = std::fs::read_to_string(&persist_path)
                .context("Failed to read vector store")?;
            match serde_json::from_str::<PersistedIndex>(&data) {
                Ok(index) if index.model == model => index.entries,
                Ok(index) => {
                    tracing::info!(
                        "Discarding cached vectors from model {} (now {model})",
                        index.model
                    );
                    Vec::new()
                }
                Err(e) => {
                    tracing::warn!("Ignoring unreadable vector cache: {e}");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        Ok(Self {
            entries: RwLock::new(entries),
            model: model.to_string(),
            persist_path: Some(persist_path),
        })
    }

    pub fn in_memory(model: &str) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            model: model.to_string(),
            persist_path: None,
        }
    }

    /// True when the index already holds exactly `documents`, in order.
    pub fn is_current(&self, documents: &[String]) -> bool {
        let entries = self.entries.read();
        !entries.is_empty()
            && entries.len() == documents.len()
            && entries.iter().zip(documents).all(|(e, d)| &e.content == d)
    }

    /// Replace the whole index. `embeddings` must be parallel with `documents`.
    pub fn replace(&self, documents: &[String], embeddings: Vec<Vec<f32>>) -> Result<()> {
        if documents.len() != embeddings.len() {
            anyhow::bail!(
                "Got {} embeddings for {} documents",
                embeddings.len(),
                documents.len()
            );
        }

        let mut entries = self.entries.write();
        *entries = documents
            .iter()
            .zip(embeddings)
            .map(|(content, mut embedding)| {
                l2_normalize(&mut embedding);
                VectorEntry {
                    content: content.clone(),
                    embedding,
                }
            })
            .collect();

        if let Some(path) = &self.persist_path {
            let persisted = PersistedIndex {
                model: self.model.clone(),
                entries: entries.clone(),
            };
            let data = serde_json::to_string(&persisted)?;
            std::fs::write(path, data).context("Failed to persist vector store")?;
        }

        Ok(())
    }

    /// Top `limit` documents by inner product with `query_embedding`.
    pub fn search(&self, query_embedding: &[f32], limit: usize) -> Vec<VectorHit> {
        let entries = self.entries.read();

        let mut query = query_embedding.to_vec();
        l2_normalize(&mut query);

        let mut scored: Vec<(usize, f32)> = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (i, inner_product(&query, &e.embedding)))
            .collect();

        // Sort descending by score
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);

        scored
            .into_iter()
            .map(|(i, score)| VectorHit {
                doc_id: i,
                content: entries[i].content.clone(),
                score,
            })
            .collect()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.read().len()
    }

    pub fn dimension(&self) -> Option<usize> {
        self.entries.read().first().map(|e| e.embedding.len())
    }
}

/// Scale `v` to unit length. Zero vectors are left untouched.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

fn inner_product(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
