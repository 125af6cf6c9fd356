//! # menu-rag
//!
//! A retrieval-augmented chatbot that answers questions about a restaurant
//! menu. Menu entries are embedded into a flat vector index; each question
//! retrieves the closest entries, a cross-encoder reranks them, and the best
//! few are injected into a fixed prompt for the chat model.
//!
//! ## Pipeline
//!
//! ```text
//!   menu.json ──▶ documents ──▶ embed + L2 normalize ──▶ flat IP index
//!                                                            │
//!   question ──▶ embed ──▶ top 10 by inner product ◀─────────┘
//!                                 │
//!                                 ▼
//!                  ┌─────────────────────────────┐
//!                  │ Cross-encoder rerank        │
//!                  │ sort desc, keep top 3       │
//!                  │ (embedding order fallback)  │
//!                  └──────────────┬──────────────┘
//!                                 ▼
//!                  ┌─────────────────────────────┐
//!                  │ Context block + template    │
//!                  └──────────────┬──────────────┘
//!                                 ▼
//!                  ┌─────────────────────────────┐
//!                  │ Chat model ──▶ clean answer │
//!                  └─────────────────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for directories, models and sampling
//! - [`cli`] - Command-line flags (batch / interactive mode, evaluation)
//! - [`models`] - Shared data types: `MenuItem`, `ChatMessage`, `QueryResult`
//! - [`menu`] - Menu loading, seeding, lookup and document rendering
//! - [`input`] - Query and reference-answer files
//! - [`llm`] - Embedding, reranking and chat model adapters behind async traits
//! - [`search::vector`] - In-memory inner-product index with disk persistence
//! - [`rag`] - Retrieve, rerank and format context
//! - [`chatbot`] - Query processing, result files and the interactive loop
//! - [`evaluation`] - Exact match, F1, BLEU and ROUGE-L scoring

pub mod chatbot;
pub mod cli;
pub mod config;
pub mod evaluation;
pub mod input;
pub mod llm;
pub mod menu;
pub mod models;
pub mod rag;
pub mod search;
