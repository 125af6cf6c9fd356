use std::fmt::Write as _;
use std::future::Future;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::config::Config;
use crate::llm::{
    ChatModel, Embedder, HttpChatModel, HttpEmbedder, HttpReranker, Reranker, ResponseGenerator,
};
use crate::menu::MenuStore;
use crate::models::QueryResult;
use crate::rag::RagPipeline;
use crate::search::vector::VectorStore;

const EXIT_COMMANDS: &[&str] = &["exit", "quit", "thoát"];
const FAREWELL: &str = "Cảm ơn bạn đã sử dụng dịch vụ! Hẹn gặp lại!";

/// Why an interactive session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The user typed an exit command.
    Exit,
    EndOfInput,
    /// Ctrl-C, including while a question was being answered.
    Interrupted,
}

pub fn is_exit_command(input: &str) -> bool {
    let lower = input.trim().to_lowercase();
    EXIT_COMMANDS.contains(&lower.as_str())
}

/// Menu question answering: retrieval, prompt assembly and generation.
pub struct Chatbot {
    menu: MenuStore,
    rag: RagPipeline,
    generator: ResponseGenerator,
    output_dir: PathBuf,
}

impl Chatbot {
    /// Wire the HTTP model adapters from `config` and index the menu.
    pub async fn new(config: &Config) -> Result<Self> {
        config.ensure_dirs()?;

        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()?;

        let embedder: Arc<dyn Embedder> =
            Arc::new(HttpEmbedder::new(http_client.clone(), config.llm.clone()));
        let reranker = HttpReranker::from_config(http_client.clone(), &config.reranker)
            .map(|r| Arc::new(r) as Arc<dyn Reranker>);
        let chat_model: Arc<dyn ChatModel> = Arc::new(HttpChatModel::new(
            http_client,
            config.llm.clone(),
            config.generation.clone(),
        ));

        let menu = MenuStore::open(&config.data_dir)?;
        let store = VectorStore::open_or_create(&config.vector_dir(), embedder.model_name())?;

        Self::from_parts(menu, embedder, reranker, chat_model, store, config).await
    }

    /// Build the chatbot around already constructed model adapters.
    pub async fn from_parts(
        menu: MenuStore,
        embedder: Arc<dyn Embedder>,
        reranker: Option<Arc<dyn Reranker>>,
        chat_model: Arc<dyn ChatModel>,
        store: VectorStore,
        config: &Config,
    ) -> Result<Self> {
        let documents = menu.documents();
        tracing::info!("Loaded {} menu items", documents.len());

        let rag = RagPipeline::build(
            &documents,
            embedder,
            reranker,
            store,
            config.retrieval.clone(),
        )
        .await?;
        let generator = ResponseGenerator::new(chat_model, config.generation.clone());

        tracing::info!("Chatbot initialization complete");
        Ok(Self {
            menu,
            rag,
            generator,
            output_dir: config.output_dir.clone(),
        })
    }

    pub fn menu(&self) -> &MenuStore {
        &self.menu
    }

    pub async fn process_query(&self, query: &str) -> Result<QueryResult> {
        let context = self.rag.get_context(query).await?;
        let response = self.generator.generate(query, &context).await?;
        Ok(QueryResult {
            query: query.to_string(),
            context,
            response,
        })
    }

    /// Answer every query in order. A failed query is logged and kept with an
    /// empty answer so one bad request does not lose the whole batch.
    pub async fn process_queries(&self, queries: &[String]) -> Vec<QueryResult> {
        tracing::info!("Processing {} queries", queries.len());
        let mut results = Vec::with_capacity(queries.len());

        for (i, query) in queries.iter().enumerate() {
            tracing::info!("[{}/{}] Processing: {query}", i + 1, queries.len());
            match self.process_query(query).await {
                Ok(result) => {
                    tracing::info!("Response: {}", result.response);
                    results.push(result);
                }
                Err(e) => {
                    tracing::error!("Query failed: {e:#}");
                    results.push(QueryResult {
                        query: query.clone(),
                        context: String::new(),
                        response: String::new(),
                    });
                }
            }
        }

        results
    }

    /// Write the four result files and return their paths.
    pub fn save_results(&self, results: &[QueryResult]) -> Result<Vec<PathBuf>> {
        save_results(&self.output_dir, results)
    }

    /// Chat on stdin until the user types an exit command, closes input or hits Ctrl-C.
    pub async fn interactive_mode(&self) -> Result<()> {
        let rule = "=".repeat(60);
        println!("\n{rule}");
        println!("Interactive Mode - Vietnamese Food Ordering Chatbot");
        println!("Type 'exit' or 'quit' to stop");
        println!("{rule}\n");

        let input = BufReader::new(tokio::io::stdin());
        let interrupt = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Cannot listen for Ctrl-C: {e}");
                std::future::pending::<()>().await;
            }
        };
        let end = self.chat_session(input, interrupt).await?;
        tracing::info!("Interactive session ended: {end:?}");
        Ok(())
    }

    /// Read questions line by line from `input` and print the answers.
    ///
    /// `interrupt` is polled while waiting for input and while a question is
    /// being answered; once it resolves the session ends immediately.
    pub async fn chat_session<R, I>(&self, input: R, interrupt: I) -> Result<SessionEnd>
    where
        R: AsyncBufRead + Unpin,
        I: Future<Output = ()>,
    {
        let mut lines = input.lines();
        tokio::pin!(interrupt);

        loop {
            print!("Bạn: ");
            std::io::stdout().flush()?;

            let line = tokio::select! {
                line = lines.next_line() => line.context("Failed to read input")?,
                () = &mut interrupt => {
                    println!("\n\n{FAREWELL}");
                    return Ok(SessionEnd::Interrupted);
                }
            };

            let Some(line) = line else {
                println!("\n{FAREWELL}");
                return Ok(SessionEnd::EndOfInput);
            };

            let query = line.trim();
            if is_exit_command(query) {
                println!("\n{FAREWELL}");
                return Ok(SessionEnd::Exit);
            }
            if query.is_empty() {
                continue;
            }

            let outcome = tokio::select! {
                outcome = self.process_query(query) => outcome,
                () = &mut interrupt => {
                    println!("\n\n{FAREWELL}");
                    return Ok(SessionEnd::Interrupted);
                }
            };

            match outcome {
                Ok(result) => println!("\nChatbot: {}\n", result.response),
                Err(e) => {
                    tracing::error!("Query failed: {e:#}");
                    println!("\nLỗi: {e}\n");
                }
            }
        }
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Saved: {}", path.display());
    Ok(())
}

pub fn save_results(output_dir: &Path, results: &[QueryResult]) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    let mut written = Vec::with_capacity(4);

    // Full results with context
    let path = output_dir.join("results.json");
    write_file(&path, &serde_json::to_string_pretty(results)?)?;
    written.push(path);

    // Answers only, one per line, for evaluation
    let path = output_dir.join("answers.txt");
    let answers: String = results.iter().map(|r| format!("{}\n", r.response)).collect();
    write_file(&path, &answers)?;
    written.push(path);

    let path = output_dir.join("formatted_output.txt");
    write_file(&path, &formatted_output(results))?;
    written.push(path);

    let path = output_dir.join("query_response_pairs.txt");
    write_file(&path, &query_response_pairs(results))?;
    written.push(path);

    Ok(written)
}

fn formatted_output(results: &[QueryResult]) -> String {
    let rule = "=".repeat(80);
    let mut out = String::new();
    for (i, r) in results.iter().enumerate() {
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "Câu hỏi {}: {}", i + 1, r.query);
        let _ = writeln!(out, "{rule}\n");

        if !r.context.is_empty() {
            let _ = writeln!(out, "Ngữ cảnh được truy xuất:");
            let _ = writeln!(out, "{}\n", r.context);
        }

        let _ = writeln!(out, "Câu trả lời:");
        let _ = writeln!(out, "{}\n", r.response);
    }
    out
}

fn query_response_pairs(results: &[QueryResult]) -> String {
    let rule = "-".repeat(80);
    let mut out = String::new();
    for r in results {
        let _ = writeln!(out, "Q: {}", r.query);
        let _ = writeln!(out, "A: {}", r.response);
        let _ = writeln!(out, "{rule}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_results() -> Vec<QueryResult> {
        vec![
            QueryResult {
                query: "Phở bò giá bao nhiêu?".into(),
                context: "[Thông tin 1] (Độ liên quan: 0.912)\nTên món ăn: Phở Bò".into(),
                response: "Phở bò giá 65,000 VNĐ.".into(),
            },
            QueryResult {
                query: "Có pizza không?".into(),
                context: String::new(),
                response: "Xin lỗi, menu không có pizza.".into(),
            },
        ]
    }

    #[test]
    fn test_exit_commands() {
        assert!(is_exit_command("exit"));
        assert!(is_exit_command("  QUIT "));
        assert!(is_exit_command("Thoát"));
        assert!(!is_exit_command("thoát ra"));
        assert!(!is_exit_command(""));
    }

    #[test]
    fn test_save_results_writes_all_files() {
        let dir = tempfile::tempdir().unwrap();
        let written = save_results(dir.path(), &sample_results()).unwrap();
        assert_eq!(written.len(), 4);
        assert!(written.iter().all(|p| p.exists()));

        let answers = std::fs::read_to_string(dir.path().join("answers.txt")).unwrap();
        assert_eq!(answers, "Phở bò giá 65,000 VNĐ.\nXin lỗi, menu không có pizza.\n");

        let json = std::fs::read_to_string(dir.path().join("results.json")).unwrap();
        let back: Vec<QueryResult> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample_results());
    }

    #[test]
    fn test_formatted_output_skips_empty_context() {
        let out = formatted_output(&sample_results());
        assert_eq!(out.matches("Ngữ cảnh được truy xuất:").count(), 1);
        assert!(out.contains("Câu hỏi 2: Có pizza không?"));
        assert!(out.contains("Câu trả lời:\nXin lỗi, menu không có pizza.\n\n"));
        assert!(out.starts_with(&"=".repeat(80)));
    }

    #[test]
    fn test_query_response_pairs_layout() {
        let out = query_response_pairs(&sample_results()[..1]);
        let expected = format!(
            "Q: Phở bò giá bao nhiêu?\nA: Phở bò giá 65,000 VNĐ.\n{}\n",
            "-".repeat(80)
        );
        assert_eq!(out, expected);
    }
}
