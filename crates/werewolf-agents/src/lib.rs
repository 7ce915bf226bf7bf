//! LLM-backed collaborators for werewolf games: configuration, the
//! OpenAI-compatible chat client and directory-based prompt templates.

pub mod config;
pub mod llm;
pub mod prompts;

pub use config::{LlmEndpoint, VillageConfig};
pub use llm::OpenAiChat;
pub use prompts::TemplateDir;
