use std::sync::{Arc, LazyLock};

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::prompt::{build_messages, sanitize_for_prompt};
use super::ChatModel;
use crate::config::{GenerationConfig, LlmConfig};
use crate::models::ChatMessage;

/// Everything after the first assistant turn header of a chat template.
static ASSISTANT_TURN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)assistant\n(.*)").expect("valid regex"));

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Turn raw model output into a single-paragraph answer.
///
/// Models served without their chat template (or echoing it) leak the
/// `assistant\n` turn header; only the text after it is kept.
pub fn clean_response(raw: &str) -> String {
    let text = sanitize_for_prompt(raw);

    let body = match ASSISTANT_TURN.captures(&text) {
        Some(caps) => caps.get(1).map_or("", |m| m.as_str()).trim(),
        None => text.trim(),
    };
    let body = body.strip_prefix("assistant").map_or(body, str::trim);

    WHITESPACE_RUN.replace_all(body, " ").trim().to_string()
}

/// Builds prompts, calls the chat model and cleans up its answer.
pub struct ResponseGenerator {
    model: Arc<dyn ChatModel>,
    config: GenerationConfig,
}

impl ResponseGenerator {
    pub fn new(model: Arc<dyn ChatModel>, config: GenerationConfig) -> Self {
        Self { model, config }
    }

    pub fn create_messages(&self, query: &str, context: &str) -> Vec<ChatMessage> {
        build_messages(query, context, self.config.max_prompt_chars)
    }

    pub async fn generate(&self, query: &str, context: &str) -> Result<String> {
        let messages = self.create_messages(query, context);
        let raw = self.model.complete(&messages).await?;
        Ok(clean_response(&raw))
    }

    /// Answer `queries[i]` with `contexts[i]`, one call at a time.
    pub async fn batch_generate(
        &self,
        queries: &[String],
        contexts: &[String],
    ) -> Result<Vec<String>> {
        let mut responses = Vec::with_capacity(queries.len().min(contexts.len()));
        for (query, context) in queries.iter().zip(contexts) {
            responses.push(self.generate(query, context).await?);
        }
        Ok(responses)
    }
}

/// Non-streaming chat completion against Ollama or an OpenAI-compatible API.
pub struct HttpChatModel {
    client: reqwest::Client,
    llm: LlmConfig,
    generation: GenerationConfig,
}

impl HttpChatModel {
    pub fn new(client: reqwest::Client, llm: LlmConfig, generation: GenerationConfig) -> Self {
        Self {
            client,
            llm,
            generation,
        }
    }
}

#[async_trait]
impl ChatModel for HttpChatModel {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        match self.llm.provider.as_str() {
            "ollama" => call_ollama(&self.client, &self.llm, &self.generation, messages).await,
            "openai" => call_openai(&self.client, &self.llm, &self.generation, messages).await,
            other => anyhow::bail!("Unknown LLM provider: {other}"),
        }
    }
}

// ─── Ollama ──────────────────────────────────────────────

#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    top_p: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: ChatMessage,
}

fn ollama_request<'a>(
    llm: &'a LlmConfig,
    generation: &GenerationConfig,
    messages: &'a [ChatMessage],
) -> OllamaChatRequest<'a> {
    OllamaChatRequest {
        model: &llm.chat_model,
        messages,
        stream: false,
        options: OllamaOptions {
            temperature: generation.effective_temperature(),
            top_p: generation.top_p,
            num_predict: generation.max_new_tokens,
        },
    }
}

async fn call_ollama(
    client: &reqwest::Client,
    llm: &LlmConfig,
    generation: &GenerationConfig,
    messages: &[ChatMessage],
) -> Result<String> {
    let url = format!("{}/api/chat", llm.base_url.trim_end_matches('/'));
    let req = ollama_request(llm, generation, messages);

    let resp = client
        .post(&url)
        .json(&req)
        .send()
        .await
        .context("Failed to call Ollama chat API")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("Ollama chat API returned {status}: {body}");
    }

    let body: OllamaChatResponse = resp
        .json()
        .await
        .context("Failed to parse Ollama chat response")?;
    Ok(body.message.content)
}

// ─── OpenAI-compatible ───────────────────────────────────

#[derive(Serialize)]
struct OpenAiChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Deserialize)]
struct OpenAiResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

fn openai_request<'a>(
    llm: &'a LlmConfig,
    generation: &GenerationConfig,
    messages: &'a [ChatMessage],
) -> OpenAiChatRequest<'a> {
    OpenAiChatRequest {
        model: &llm.chat_model,
        messages,
        temperature: generation.effective_temperature(),
        top_p: generation.top_p,
        max_tokens: generation.max_new_tokens,
    }
}

async fn call_openai(
    client: &reqwest::Client,
    llm: &LlmConfig,
    generation: &GenerationConfig,
    messages: &[ChatMessage],
) -> Result<String> {
    let url = format!("{}/v1/chat/completions", llm.base_url.trim_end_matches('/'));
    let api_key = llm.api_key.as_deref().unwrap_or_default();
    let req = openai_request(llm, generation, messages);

    let resp = client
        .post(&url)
        .header("Authorization", format!("Bearer {api_key}"))
        .json(&req)
        .send()
        .await
        .context("Failed to call OpenAI chat API")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("OpenAI chat API returned {status}: {body}");
    }

    let body: OpenAiChatResponse = resp
        .json()
        .await
        .context("Failed to parse OpenAI chat response")?;
    Ok(body
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default())
}
