use serde::{Deserialize, Serialize};

/// A single dish on the menu.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MenuItem {
    pub name: String,
    pub short_description: String,
    pub long_description: String,
    pub category: String,
    /// Unit price in VND
    pub price: u64,
    pub availability: bool,
}

/// A single chat turn (system, user or assistant)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A menu document with the relevance score it was ranked by.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedDoc {
    pub content: String,
    pub score: f32,
}

/// Outcome of answering one question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryResult {
    pub query: String,
    pub context: String,
    pub response: String,
}
