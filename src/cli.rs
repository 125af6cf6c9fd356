use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Answer every question in queries.txt and write result files
    Batch,
    /// Chat on the terminal
    Interactive,
}

#[derive(Parser, Debug)]
#[command(
    name = "menu-rag",
    version,
    about = "Vietnamese food ordering chatbot with LLM + RAG + reranker"
)]
pub struct Cli {
    #[arg(long, value_enum, default_value_t = Mode::Batch)]
    pub mode: Mode,

    /// Evaluate responses against input/answers.txt after batch processing
    #[arg(long)]
    pub evaluate: bool,

    /// Also write the indexed menu documents to menu.txt
    #[arg(long)]
    pub export_documents: bool,

    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    #[arg(long)]
    pub input_dir: Option<PathBuf>,

    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

impl Cli {
    /// Command-line directories take precedence over the environment.
    pub fn apply(&self, config: &mut Config) {
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(dir) = &self.input_dir {
            config.input_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
    }
}
