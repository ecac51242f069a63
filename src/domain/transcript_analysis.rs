use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptAnalysis {
    pub title: String,
    pub report: String,
    pub todo_items: Vec<TodoItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub text: String,
    pub done: bool,
}

impl TodoItem {
    pub fn open(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            done: false,
        }
    }
}
