//! Text-generation collaborator.
//!
//! Every agent utterance and every turn-selection decision goes through
//! [`TextGenerator`]. The engine awaits each call before doing anything
//! else, so implementations never see overlapping requests from one game.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;

/// Author of a chat message, in the OpenAI chat-completions vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Opaque, possibly non-deterministic text generator keyed by model id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate the next message for `messages` with the given model.
    async fn generate(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<String, GenerationError>;
}
