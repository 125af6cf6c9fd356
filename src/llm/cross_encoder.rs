//! Cross-encoder reranker via OpenAI-compatible `/v1/rerank` endpoint.
//!
//! Sends a single batch request with every (query, document) pair, which is
//! how llama-server and text-embeddings-inference expose bge-reranker models.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::Reranker;
use crate::config::RerankerConfig;

/// Result of reranking a single document.
#[derive(Debug, Clone, PartialEq)]
pub struct RerankResult {
    /// Index into the original documents array.
    pub index: usize,
    /// Relevance score (0.0 - 1.0 after sigmoid normalization).
    pub score: f32,
}

pub struct HttpReranker {
    client: reqwest::Client,
    config: RerankerConfig,
}

impl HttpReranker {
    /// Returns None when no reranker endpoint is configured.
    pub fn from_config(client: reqwest::Client, config: &RerankerConfig) -> Option<Self> {
        config.base_url.as_ref()?;
        Some(Self {
            client,
            config: config.clone(),
        })
    }
}

#[async_trait]
impl Reranker for HttpReranker {
    async fn rerank(&self, query: &str, documents: &[String]) -> Result<Vec<RerankResult>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let base_url = self
            .config
            .base_url
            .as_deref()
            .context("Reranker base_url not configured")?;

        let model = self.config.model.as_deref().unwrap_or("default");

        let url = format!("{}/v1/rerank", base_url.trim_end_matches('/'));

        let req_body = RerankRequest {
            model: model.to_string(),
            query: query.to_string(),
            documents: documents.to_vec(),
            top_n: documents.len(),
        };

        let timeout = std::time::Duration::from_secs(self.config.timeout_secs.min(30));

        let resp = self
            .client
            .post(&url)
            .timeout(timeout)
            .json(&req_body)
            .send()
            .await
            .context("Failed to reach reranker endpoint")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Reranker returned {status}: {body}");
        }

        let body: RerankResponse = resp
            .json()
            .await
            .context("Failed to parse reranker response")?;

        Ok(into_results(body, documents.len(), self.config.normalize))
    }
}

/// Convert the raw response into sorted results, dropping indices the server
/// should never have produced.
fn into_results(body: RerankResponse, n_docs: usize, normalize: bool) -> Vec<RerankResult> {
    let mut results: Vec<RerankResult> = body
        .results
        .into_iter()
        .filter(|r| r.index < n_docs)
        .map(|r| RerankResult {
            index: r.index,
            score: if normalize {
                sigmoid(r.relevance_score)
            } else {
                r.relevance_score
            },
        })
        .collect();

    // Sort by score descending
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    results
}

/// Sigmoid normalization: maps raw logits to 0-1 range.
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

// ─── Request/Response types ────────────────────────────

#[derive(Serialize)]
struct RerankRequest {
    model: String,
    query: String,
    documents: Vec<String>,
    top_n: usize,
}

#[derive(Deserialize)]
struct RerankResponse {
    results: Vec<RerankResultRaw>,
}

#[derive(Deserialize)]
struct RerankResultRaw {
    index: usize,
    relevance_score: f32,
}
