//! Shared context entities

use crate::core::question::Question;
use crate::core::string::truncate_marked;
use serde::{Deserialize, Serialize};

/// Default maximum length of one document embedded in a prompt
pub const DEFAULT_DOCUMENT_CHAR_LIMIT: usize = 15_000;

/// A piece of ingested text (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextDocument {
    /// Source name shown to the agents, usually a file name
    pub name: String,
    pub content: String,
}

impl ContextDocument {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Question plus background documents (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedContext {
    pub question: Question,
    #[serde(default)]
    pub documents: Vec<ContextDocument>,
}

impl SharedContext {
    pub fn new(question: Question) -> Self {
        Self {
            question,
            documents: Vec::new(),
        }
    }

    pub fn with_documents(mut self, documents: Vec<ContextDocument>) -> Self {
        self.documents = documents;
        self
    }

    /// Render the background section, truncating each document to `char_limit`.
    ///
    /// Returns an empty string when there are no non-blank documents.
    pub fn render_background(&self, char_limit: usize) -> String {
        let documents: Vec<_> = self
            .documents
            .iter()
            .filter(|d| !d.content.trim().is_empty())
            .collect();
        if documents.is_empty() {
            return String::new();
        }

        let mut out = String::from("=== BACKGROUND CONTEXT ===\n");
        for doc in documents {
            out.push_str(&format!(
                "\n--- Source: {} ---\n{}\n",
                doc.name,
                truncate_marked(&doc.content, char_limit)
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_empty_without_documents() {
        let ctx = SharedContext::new(Question::try_new("Q?").unwrap())
            .with_documents(vec![ContextDocument::new("blank.txt", "  \n")]);
        assert!(ctx.render_background(100).is_empty());
    }

    #[test]
    fn test_background_truncates_long_documents() {
        let ctx = SharedContext::new(Question::try_new("Q?").unwrap()).with_documents(vec![
            ContextDocument::new("notes.md", "a".repeat(50)),
            ContextDocument::new("short.txt", "brief"),
        ]);
        let rendered = ctx.render_background(10);
        assert!(rendered.starts_with("=== BACKGROUND CONTEXT ==="));
        assert!(rendered.contains("--- Source: notes.md ---\naaaaaaaaaa... [truncated]"));
        assert!(rendered.contains("--- Source: short.txt ---\nbrief"));
    }
}
