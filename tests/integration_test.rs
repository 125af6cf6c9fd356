//! Integration tests for the menu chatbot pipeline.
//!
//! These tests run the full flow (menu seeding, indexing, retrieval,
//! reranking, generation, result files, evaluation) with in-process model
//! adapters, so no model server is required.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;

use menu_rag::chatbot::{Chatbot, SessionEnd};
use menu_rag::config::Config;
use menu_rag::evaluation::{evaluate_responses, DEFAULT_METRICS_FILE};
use menu_rag::input;
use menu_rag::llm::{ChatModel, Embedder, RerankResult, Reranker};
use menu_rag::menu::MenuStore;
use menu_rag::models::ChatMessage;
use menu_rag::search::vector::VectorStore;

const VOCAB: &[&str] = &["gỏi", "bưởi", "xèo", "khọt", "cuốn", "bánh", "tôm"];

/// One dimension per keyword; counts embedding calls so cache reuse is observable.
struct KeywordEmbedder {
    calls: Mutex<usize>,
}

impl KeywordEmbedder {
    fn new() -> Self {
        Self {
            calls: Mutex::new(0),
        }
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        *self.calls.lock() += texts.len();
        Ok(texts
            .iter()
            .map(|t| {
                let lower = t.to_lowercase();
                let mut v: Vec<f32> = VOCAB
                    .iter()
                    .map(|w| lower.matches(w).count() as f32)
                    .collect();
                v.push(0.05);
                v
            })
            .collect())
    }

    fn model_name(&self) -> &str {
        "keyword-test"
    }
}

/// Scores a document by how many query words appear in it.
struct OverlapReranker;

#[async_trait]
impl Reranker for OverlapReranker {
    async fn rerank(&self, query: &str, documents: &[String]) -> Result<Vec<RerankResult>> {
        let words: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();
        let mut results: Vec<RerankResult> = documents
            .iter()
            .enumerate()
            .map(|(index, doc)| {
                let doc = doc.to_lowercase();
                let hits = words.iter().filter(|w| doc.contains(w.as_str())).count();
                RerankResult {
                    index,
                    score: hits as f32 / words.len().max(1) as f32,
                }
            })
            .collect();
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
        Ok(results)
    }
}

/// Answers with the first dish name found in the prompt, wrapped the way an
/// untemplated model echoes its turn header.
struct EchoModel {
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl ChatModel for EchoModel {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let user = &messages.last().unwrap().content;
        self.prompts.lock().push(user.clone());
        let answer = user
            .lines()
            .find_map(|l| l.strip_prefix("Tên món ăn: "))
            .map(|name| format!("Dạ, quán có món {name}."))
            .unwrap_or_else(|| "Xin lỗi, tôi không tìm thấy món này.".to_string());
        Ok(format!("assistant\n{answer}\n"))
    }
}

/// Fails every question that mentions `poison`, answers the rest.
/// Only the question line is checked; retrieved context may name any dish.
struct PickyModel {
    poison: &'static str,
    calls: Mutex<usize>,
}

#[async_trait]
impl ChatModel for PickyModel {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        *self.calls.lock() += 1;
        let question = messages
            .last()
            .unwrap()
            .content
            .lines()
            .find_map(|l| l.strip_prefix("Câu hỏi của khách hàng: "))
            .unwrap_or_default()
            .to_lowercase();
        if question.contains(self.poison) {
            anyhow::bail!("model server returned 503");
        }
        Ok("Dạ, quán có món này.".to_string())
    }
}

/// Never answers, like a model server stuck until the request timeout.
struct StuckModel;

#[async_trait]
impl ChatModel for StuckModel {
    async fn complete(&self, _messages: &[ChatMessage]) -> Result<String> {
        std::future::pending().await
    }
}

fn test_config(root: &std::path::Path) -> Config {
    let mut config = Config {
        data_dir: root.join("data"),
        input_dir: root.join("input"),
        output_dir: root.join("output"),
        cache_dir: root.join("cache"),
        ..Config::default()
    };
    config.reranker.base_url = None;
    config
}

async fn build_chatbot(
    config: &Config,
    embedder: Arc<KeywordEmbedder>,
    model: Arc<dyn ChatModel>,
) -> Chatbot {
    config.ensure_dirs().unwrap();
    let menu = MenuStore::open(&config.data_dir).unwrap();
    let store = VectorStore::open_or_create(&config.vector_dir(), embedder.model_name()).unwrap();
    Chatbot::from_parts(
        menu,
        embedder,
        Some(Arc::new(OverlapReranker)),
        model,
        store,
        config,
    )
    .await
    .unwrap()
}

fn echo_model() -> Arc<EchoModel> {
    Arc::new(EchoModel {
        prompts: Mutex::new(Vec::new()),
    })
}

#[tokio::test]
async fn test_end_to_end_single_query() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let model = echo_model();
    let chatbot = build_chatbot(&config, Arc::new(KeywordEmbedder::new()), model.clone()).await;

    let result = chatbot.process_query("Bánh xèo giá bao nhiêu?").await.unwrap();

    assert_eq!(result.query, "Bánh xèo giá bao nhiêu?");
    assert!(result.context.starts_with("[Thông tin 1] (Độ liên quan: "));
    assert!(result.context.contains("[Thông tin 3]"));
    assert!(!result.context.contains("[Thông tin 4]"));
    // Reranker puts the dish whose text contains every query word first
    let first_block = result.context.split("\n\n").next().unwrap();
    assert!(first_block.contains("Tên món ăn: Bánh Xèo Miền Tây (Củ hũ dừa)"));
    assert!(first_block.contains("Đơn giá: 110,000VNĐ"));

    assert_eq!(result.response, "Dạ, quán có món Bánh Xèo Miền Tây (Củ hũ dừa).");

    let prompts = model.prompts.lock();
    assert!(prompts[0].starts_with("Dựa trên thông tin menu sau:"));
}

#[tokio::test]
async fn test_batch_run_writes_outputs_and_evaluates() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let chatbot = build_chatbot(&config, Arc::new(KeywordEmbedder::new()), echo_model()).await;

    std::fs::write(
        config.input_dir.join("queries.txt"),
        "Gỏi bưởi tôm khô có gì?\nBánh khọt Vũng Tàu giá bao nhiêu?\n",
    )
    .unwrap();
    std::fs::write(
        config.input_dir.join("answers.txt"),
        "Dạ, quán có món Gỏi Bưởi Tôm Khô.\nBánh khọt giá 95,000 VNĐ.\n",
    )
    .unwrap();

    let queries = input::load_queries(&config.input_dir).unwrap();
    let answers = input::load_answers(&config.input_dir).unwrap();
    let results = chatbot.process_queries(&queries).await;
    assert_eq!(results.len(), 2);

    let written = chatbot.save_results(&results).unwrap();
    assert_eq!(written.len(), 4);
    let answers_file = std::fs::read_to_string(config.output_dir.join("answers.txt")).unwrap();
    assert_eq!(answers_file.lines().count(), 2);

    let metrics = evaluate_responses(&results, &answers);
    assert_eq!(metrics.total_queries, 2);
    assert_eq!(metrics.context_retrieval_rate, 1.0);
    let quality = metrics.quality.clone().unwrap();
    // First answer matches its reference exactly, second only partially
    assert!((quality.exact_match - 0.5).abs() < 1e-9);
    assert!(quality.avg_f1_score > 0.5 && quality.avg_f1_score < 1.0);

    let path = metrics.save(&config.output_dir, DEFAULT_METRICS_FILE).unwrap();
    assert!(path.exists());
}

#[tokio::test]
async fn test_cached_embeddings_reused_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());

    let first = Arc::new(KeywordEmbedder::new());
    let _ = build_chatbot(&config, first.clone(), echo_model()).await;
    assert_eq!(*first.calls.lock(), 5);

    let second = Arc::new(KeywordEmbedder::new());
    let chatbot = build_chatbot(&config, second.clone(), echo_model()).await;
    assert_eq!(*second.calls.lock(), 0);

    // Only the query is embedded now
    chatbot.process_query("bánh cuốn").await.unwrap();
    assert_eq!(*second.calls.lock(), 1);
}

#[tokio::test]
async fn test_sample_queries_seeded_on_first_run() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let queries = input::load_queries(&config.input_dir).unwrap();
    assert_eq!(queries.len(), 10);
    assert!(config.input_dir.join("queries.txt").exists());
    assert!(input::load_answers(&config.input_dir).unwrap().is_empty());
}

#[tokio::test]
async fn test_batch_continues_past_failed_query() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let model = Arc::new(PickyModel {
        poison: "khọt",
        calls: Mutex::new(0),
    });
    let chatbot = build_chatbot(&config, Arc::new(KeywordEmbedder::new()), model.clone()).await;

    let queries = vec![
        "Gỏi bưởi tôm khô có gì?".to_string(),
        "Bánh khọt giá bao nhiêu?".to_string(),
        "Bánh cuốn còn không?".to_string(),
    ];
    let results = chatbot.process_queries(&queries).await;

    assert_eq!(*model.calls.lock(), 3);
    assert_eq!(results.len(), 3);
    assert_eq!(results[1].query, "Bánh khọt giá bao nhiêu?");
    assert_eq!(results[1].context, "");
    assert_eq!(results[1].response, "");
    for ok in [&results[0], &results[2]] {
        assert!(!ok.context.is_empty());
        assert_eq!(ok.response, "Dạ, quán có món này.");
    }

    chatbot.save_results(&results).unwrap();
    let answers = std::fs::read_to_string(config.output_dir.join("answers.txt")).unwrap();
    assert_eq!(answers, "Dạ, quán có món này.\n\nDạ, quán có món này.\n");
}

#[tokio::test]
async fn test_session_stops_on_exit_command() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let model = echo_model();
    let chatbot = build_chatbot(&config, Arc::new(KeywordEmbedder::new()), model.clone()).await;

    let input = "Bánh xèo giá bao nhiêu?\n\n  THOÁT \nBánh cuốn?\n".as_bytes();
    let end = chatbot
        .chat_session(input, std::future::pending())
        .await
        .unwrap();

    assert_eq!(end, SessionEnd::Exit);
    // Blank line skipped, nothing read after the exit command
    assert_eq!(model.prompts.lock().len(), 1);
}

#[tokio::test]
async fn test_session_survives_failed_query_until_end_of_input() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let model = Arc::new(PickyModel {
        poison: "xèo",
        calls: Mutex::new(0),
    });
    let chatbot = build_chatbot(&config, Arc::new(KeywordEmbedder::new()), model.clone()).await;

    let input = "Bánh xèo?\nGỏi bưởi?\n".as_bytes();
    let end = chatbot
        .chat_session(input, std::future::pending())
        .await
        .unwrap();

    assert_eq!(end, SessionEnd::EndOfInput);
    assert_eq!(*model.calls.lock(), 2);
}

#[tokio::test]
async fn test_interrupt_while_answering_ends_session() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let chatbot = build_chatbot(
        &config,
        Arc::new(KeywordEmbedder::new()),
        Arc::new(StuckModel),
    )
    .await;

    let input = "Bánh xèo giá bao nhiêu?\nexit\n".as_bytes();
    let interrupt = tokio::time::sleep(Duration::from_millis(50));
    let end = tokio::time::timeout(Duration::from_secs(5), chatbot.chat_session(input, interrupt))
        .await
        .expect("interrupt during a model call must end the session")
        .unwrap();

    assert_eq!(end, SessionEnd::Interrupted);
}
