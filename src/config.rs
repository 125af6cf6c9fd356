use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where the menu and its exported documents live
    pub data_dir: PathBuf,
    /// Where queries.txt and answers.txt are read from
    pub input_dir: PathBuf,
    /// Where results and evaluation metrics are written
    pub output_dir: PathBuf,
    /// Where the embedding index is persisted between runs
    pub cache_dir: PathBuf,
    /// LLM provider configuration (chat + embeddings)
    pub llm: LlmConfig,
    /// Cross-encoder reranker configuration
    pub reranker: RerankerConfig,
    pub retrieval: RetrievalConfig,
    pub generation: GenerationConfig,
}

/// Configuration for the cross-encoder reranker sidecar (e.g. llama-server or TEI
/// serving bge-reranker-v2-m3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankerConfig {
    /// Base URL for the reranker API (e.g. "http://127.0.0.1:8082").
    /// If None, the pipeline keeps the embedding ranking.
    pub base_url: Option<String>,
    /// Model name to send in the rerank request.
    pub model: Option<String>,
    /// Request timeout in seconds (capped at 30).
    pub timeout_secs: u64,
    /// Map raw logits to 0-1 with a sigmoid.
    pub normalize: bool,
}

impl Default for RerankerConfig {
    fn default() -> Self {
        Self {
            base_url: Some("http://127.0.0.1:8082".to_string()),
            model: Some("bge-reranker-v2-m3".to_string()),
            timeout_secs: 10,
            normalize: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "ollama" or "openai"
    pub provider: String,
    /// Base URL for the LLM API
    pub base_url: String,
    /// Model name for answer generation
    pub chat_model: String,
    /// Model name for embeddings
    pub embedding_model: String,
    /// API key (only needed for cloud providers)
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            base_url: "http://localhost:11434".to_string(),
            chat_model: "qwen2.5:3b-instruct".to_string(),
            embedding_model: "bge-m3".to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Candidates pulled from the vector index
    pub top_k_retrieval: usize,
    /// Documents kept after reranking
    pub top_k_rerank: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k_retrieval: 10,
            top_k_rerank: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    /// When false, decoding is greedy (temperature 0).
    pub do_sample: bool,
    /// Upper bound on the retrieved context injected into the prompt.
    pub max_prompt_chars: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_new_tokens: 256,
            temperature: 0.1,
            top_p: 0.9,
            do_sample: true,
            max_prompt_chars: 8_000,
        }
    }
}

impl GenerationConfig {
    pub fn effective_temperature(&self) -> f32 {
        if self.do_sample {
            self.temperature
        } else {
            0.0
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            input_dir: PathBuf::from("./input"),
            output_dir: PathBuf::from("./output"),
            cache_dir: PathBuf::from("./model_cache"),
            llm: LlmConfig::default(),
            reranker: RerankerConfig::default(),
            retrieval: RetrievalConfig::default(),
            generation: GenerationConfig::default(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("MENU_RAG_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("MENU_RAG_INPUT_DIR") {
            config.input_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("MENU_RAG_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("MENU_RAG_CACHE_DIR") {
            config.cache_dir = PathBuf::from(dir);
        }

        if let Ok(provider) = std::env::var("LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Ok(url) = std::env::var("LLM_BASE_URL") {
            config.llm.base_url = url;
        }
        if let Ok(model) = std::env::var("LLM_CHAT_MODEL") {
            config.llm.chat_model = model;
        }
        if let Ok(model) = std::env::var("LLM_EMBEDDING_MODEL") {
            config.llm.embedding_model = model;
        }
        if let Ok(key) = std::env::var("LLM_API_KEY") {
            config.llm.api_key = Some(key);
        }

        // Reranker config; an empty URL turns reranking off
        if let Ok(url) = std::env::var("RERANKER_BASE_URL") {
            config.reranker.base_url = if url.trim().is_empty() {
                None
            } else {
                Some(url)
            };
        }
        if let Ok(model) = std::env::var("RERANKER_MODEL") {
            config.reranker.model = Some(model);
        }
        if let Some(v) = env_parse::<u64>("RERANKER_TIMEOUT_SECS") {
            config.reranker.timeout_secs = v.min(30); // Cap at 30s
        }
        if let Some(v) = env_parse("RERANKER_NORMALIZE") {
            config.reranker.normalize = v;
        }

        if let Some(v) = env_parse("RAG_TOP_K_RETRIEVAL") {
            config.retrieval.top_k_retrieval = v;
        }
        if let Some(v) = env_parse("RAG_TOP_K_RERANK") {
            config.retrieval.top_k_rerank = v;
        }

        if let Some(v) = env_parse("GEN_MAX_NEW_TOKENS") {
            config.generation.max_new_tokens = v;
        }
        if let Some(v) = env_parse("GEN_TEMPERATURE") {
            config.generation.temperature = v;
        }
        if let Some(v) = env_parse("GEN_TOP_P") {
            config.generation.top_p = v;
        }
        if let Some(v) = env_parse("GEN_DO_SAMPLE") {
            config.generation.do_sample = v;
        }
        if let Some(v) = env_parse("GEN_MAX_PROMPT_CHARS") {
            config.generation.max_prompt_chars = v;
        }

        config
    }

    /// Create every directory the chatbot reads from or writes to.
    pub fn ensure_dirs(&self) -> anyhow::Result<()> {
        for dir in [
            &self.data_dir,
            &self.input_dir,
            &self.output_dir,
            &self.cache_dir,
        ] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        Ok(())
    }

    pub fn menu_path(&self) -> PathBuf {
        self.data_dir.join("menu.json")
    }

    pub fn vector_dir(&self) -> PathBuf {
        self.cache_dir.join("vectors")
    }
}
