//! Offline evaluation of chatbot answers.

pub mod metrics;

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::models::QueryResult;

pub const DEFAULT_METRICS_FILE: &str = "evaluation_metrics.json";

/// Bigram precision is what the report calls BLEU.
const BLEU_N: usize = 2;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationMetrics {
    pub total_queries: usize,
    /// Mean response length in characters
    pub avg_response_length: f64,
    /// Share of queries that got a non-empty context
    pub context_retrieval_rate: f64,
    /// Present only when reference answers line up with the results
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub quality: Option<QualityMetrics>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QualityMetrics {
    pub exact_match: f64,
    pub avg_f1_score: f64,
    pub avg_bleu_score: f64,
    pub avg_rouge_l: f64,
}

fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    values.sum::<f64>() / n as f64
}

/// Compute response statistics and, with matching ground truth, quality scores.
pub fn evaluate_responses(results: &[QueryResult], ground_truth: &[String]) -> EvaluationMetrics {
    let avg_response_length = mean(results.iter().map(|r| r.response.chars().count() as f64));
    let context_retrieval_rate = mean(
        results
            .iter()
            .map(|r| if r.context.is_empty() { 0.0 } else { 1.0 }),
    );

    let quality = if ground_truth.is_empty() {
        None
    } else if ground_truth.len() != results.len() {
        tracing::warn!(
            "Skipping quality metrics: {} reference answers for {} results",
            ground_truth.len(),
            results.len()
        );
        None
    } else {
        tracing::info!("Calculating quality metrics with ground truth");
        let pairs = || {
            results
                .iter()
                .zip(ground_truth)
                .map(|(r, g)| (r.response.as_str(), g.as_str()))
        };
        Some(QualityMetrics {
            exact_match: mean(pairs().map(|(p, g)| metrics::exact_match(p, g))),
            avg_f1_score: mean(pairs().map(|(p, g)| metrics::f1_score(p, g))),
            avg_bleu_score: mean(pairs().map(|(p, g)| metrics::bleu(p, g, BLEU_N))),
            avg_rouge_l: mean(pairs().map(|(p, g)| metrics::rouge_l(p, g))),
        })
    };

    EvaluationMetrics {
        total_queries: results.len(),
        avg_response_length,
        context_retrieval_rate,
        quality,
    }
}

impl EvaluationMetrics {
    /// Write the metrics as pretty JSON into `output_dir/filename`.
    pub fn save(&self, output_dir: &Path, filename: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create {}", output_dir.display()))?;
        let path = output_dir.join(filename);
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, data)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}

impl fmt::Display for EvaluationMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(60);
        writeln!(f, "{rule}")?;
        writeln!(f, "Evaluation Results")?;
        writeln!(f, "{rule}")?;
        writeln!(f)?;
        writeln!(f, "Total Queries: {}", self.total_queries)?;
        writeln!(
            f,
            "Average Response Length: {:.2} characters",
            self.avg_response_length
        )?;
        writeln!(
            f,
            "Context Retrieval Rate: {:.2}%",
            self.context_retrieval_rate * 100.0
        )?;

        if let Some(q) = &self.quality {
            writeln!(f)?;
            writeln!(f, "Quality Metrics:")?;
            writeln!(f, "  Exact Match: {:.2}%", q.exact_match * 100.0)?;
            writeln!(f, "  Average F1 Score: {:.4}", q.avg_f1_score)?;
            writeln!(f, "  Average BLEU Score: {:.4}", q.avg_bleu_score)?;
            writeln!(f, "  Average ROUGE-L: {:.4}", q.avg_rouge_l)?;
        }

        writeln!(f)?;
        write!(f, "{rule}")
    }
}
