use std::fmt::Write;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::RetrievalConfig;
use crate::llm::{Embedder, Reranker};
use crate::models::RetrievedDoc;
use crate::search::vector::VectorStore;

/// Embedding retrieval followed by cross-encoder reranking over menu documents.
pub struct RagPipeline {
    embedder: Arc<dyn Embedder>,
    reranker: Option<Arc<dyn Reranker>>,
    store: VectorStore,
    config: RetrievalConfig,
}

impl RagPipeline {
    /// Index `documents`, reusing vectors already cached in `store`.
    pub async fn build(
        documents: &[String],
        embedder: Arc<dyn Embedder>,
        reranker: Option<Arc<dyn Reranker>>,
        store: VectorStore,
        config: RetrievalConfig,
    ) -> Result<Self> {
        if reranker.is_none() {
            tracing::warn!("No reranker configured, results keep embedding order");
        }

        if store.is_current(documents) {
            tracing::info!("Reusing {} cached document embeddings", documents.len());
        } else {
            tracing::info!(
                "Embedding {} documents with {}",
                documents.len(),
                embedder.model_name()
            );
            let embeddings = embedder
                .embed(documents)
                .await
                .context("Failed to embed menu documents")?;
            store.replace(documents, embeddings)?;
            tracing::info!("Index built with {} documents", store.entry_count());
        }

        Ok(Self {
            embedder,
            reranker,
            store,
            config,
        })
    }

    pub fn document_count(&self) -> usize {
        self.store.entry_count()
    }

    /// Nearest documents to `query` by embedding similarity.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedDoc>> {
        let limit = top_k.min(self.store.entry_count());
        if limit == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self
            .embedder
            .embed(&[query.to_string()])
            .await
            .context("Failed to embed query")?
            .into_iter()
            .next()
            .context("No embedding returned")?;

        Ok(self
            .store
            .search(&query_embedding, limit)
            .into_iter()
            .map(|hit| RetrievedDoc {
                content: hit.content,
                score: hit.score,
            })
            .collect())
    }

    /// Score each document against `query` with the cross-encoder and keep the best `top_k`.
    pub async fn rerank(
        &self,
        query: &str,
        documents: &[String],
        top_k: usize,
    ) -> Result<Vec<RetrievedDoc>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }
        let reranker = self.reranker.as_ref().context("Reranker not configured")?;

        let mut scored: Vec<RetrievedDoc> = reranker
            .rerank(query, documents)
            .await?
            .into_iter()
            .filter_map(|r| {
                documents.get(r.index).map(|content| RetrievedDoc {
                    content: content.clone(),
                    score: r.score,
                })
            })
            .collect();

        // Stable sort keeps retrieval order among equal scores
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }

    pub async fn retrieve_and_rerank(&self, query: &str) -> Result<Vec<RetrievedDoc>> {
        let mut retrieved = self.retrieve(query, self.config.top_k_retrieval).await?;
        if retrieved.is_empty() {
            return Ok(Vec::new());
        }

        if self.reranker.is_some() {
            let candidates: Vec<String> = retrieved.iter().map(|d| d.content.clone()).collect();
            match self
                .rerank(query, &candidates, self.config.top_k_rerank)
                .await
            {
                Ok(reranked) => return Ok(reranked),
                Err(e) => tracing::warn!("Re-ranking failed, keeping embedding order: {e:#}"),
            }
        }

        retrieved.truncate(self.config.top_k_rerank);
        Ok(retrieved)
    }

    /// Retrieved documents formatted as the context block of the prompt.
    /// Empty when nothing relevant was found.
    pub async fn get_context(&self, query: &str) -> Result<String> {
        let docs = self.retrieve_and_rerank(query).await?;
        Ok(format_context(&docs))
    }
}

pub fn format_context(docs: &[RetrievedDoc]) -> String {
    let mut ctx = String::new();
    for (i, doc) in docs.iter().enumerate() {
        if i > 0 {
            ctx.push_str("\n\n");
        }
        // Writing into a String cannot fail
        let _ = write!(
            ctx,
            "[Thông tin {}] (Độ liên quan: {:.3})\n{}",
            i + 1,
            doc.score,
            doc.content
        );
    }
    ctx
}
