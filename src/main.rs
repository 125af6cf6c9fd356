use clap::Parser;
use tracing_subscriber::EnvFilter;

use menu_rag::chatbot::Chatbot;
use menu_rag::cli::{Cli, Mode};
use menu_rag::config::Config;
use menu_rag::evaluation::{self, DEFAULT_METRICS_FILE};
use menu_rag::input;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    cli.apply(&mut config);

    tracing::info!("Data directory: {}", config.data_dir.display());
    tracing::info!(
        "LLM provider: {} ({}), chat model {}, embedding model {}",
        config.llm.provider,
        config.llm.base_url,
        config.llm.chat_model,
        config.llm.embedding_model
    );
    match &config.reranker.base_url {
        Some(url) => tracing::info!("Reranker: {url}"),
        None => tracing::info!("Reranker: disabled"),
    }

    let chatbot = Chatbot::new(&config).await?;

    if cli.export_documents {
        chatbot.menu().save_documents()?;
        tracing::info!("Wrote {}", config.data_dir.join("menu.txt").display());
    }

    match cli.mode {
        Mode::Interactive => chatbot.interactive_mode().await?,
        Mode::Batch => {
            let queries = input::load_queries(&config.input_dir)?;
            tracing::info!("Loaded {} queries", queries.len());
            let answers = input::load_answers(&config.input_dir)?;
            tracing::info!("Loaded {} reference answers", answers.len());

            let results = chatbot.process_queries(&queries).await;
            let written = chatbot.save_results(&results)?;

            if cli.evaluate {
                let metrics = evaluation::evaluate_responses(&results, &answers);
                println!("\n{metrics}");
                let path = metrics.save(&config.output_dir, DEFAULT_METRICS_FILE)?;
                tracing::info!("Metrics saved to: {}", path.display());
            }

            println!("\nResults saved to '{}':", config.output_dir.display());
            for path in &written {
                if let Some(name) = path.file_name() {
                    println!("  - {}", name.to_string_lossy());
                }
            }
            if cli.evaluate {
                println!("  - {DEFAULT_METRICS_FILE}");
            }
        }
    }

    Ok(())
}
