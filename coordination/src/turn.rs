//! Turn selection during the debate.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::GenerationError;
use crate::generator::{ChatMessage, TextGenerator};
use crate::prompts::TURN_SELECTOR_PREAMBLE;
use crate::roles::capitalize;

/// Outcome of one turn selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnChoice {
    /// A player name, lowercase. It may not be alive; the engine checks.
    Speaker(String),
    /// End the debate and move to the vote.
    Vote,
}

impl TurnChoice {
    /// Interpret a selector reply.
    ///
    /// Only the first non-empty line is considered. A leading
    /// `Next speaker:` label and surrounding punctuation are ignored and
    /// the word `vote` (any case) is the sentinel.
    pub fn parse(reply: &str) -> Self {
        let line = reply
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or_default()
            .to_lowercase();
        let line = line
            .strip_prefix("next speaker:")
            .map(str::trim)
            .unwrap_or(&line);
        let name = line.trim_matches(|c: char| !c.is_alphanumeric());
        if name == "vote" {
            Self::Vote
        } else {
            Self::Speaker(name.to_string())
        }
    }

    /// Lowercase and trim a speaker name so it can be matched against the
    /// roster.
    pub fn normalized(self) -> Self {
        match self {
            Self::Speaker(name) => Self::Speaker(name.trim().to_lowercase()),
            Self::Vote => Self::Vote,
        }
    }
}

/// Decides who speaks next, or that the debate is over.
#[async_trait]
pub trait TurnSelector: Send + Sync {
    async fn select_next(
        &self,
        transcript_so_far: &[String],
        alive_names: &[String],
    ) -> Result<TurnChoice, GenerationError>;
}

/// Turn selector that asks a language model.
pub struct ModelTurnSelector {
    generator: Arc<dyn TextGenerator>,
    model: String,
}

impl ModelTurnSelector {
    pub fn new(generator: Arc<dyn TextGenerator>, model: impl Into<String>) -> Self {
        Self {
            generator,
            model: model.into(),
        }
    }

    pub fn messages(transcript_so_far: &[String], alive_names: &[String]) -> Vec<ChatMessage> {
        let players: Vec<String> = alive_names.iter().map(|n| capitalize(n)).collect();
        let conversation = if transcript_so_far.is_empty() {
            "(nobody has spoken yet)".to_string()
        } else {
            transcript_so_far.join("\n")
        };
        vec![
            ChatMessage::system(TURN_SELECTOR_PREAMBLE),
            ChatMessage::user(format!(
                "Players still in the game: {}.\n\nConversation so far:\n{}\n\nWho speaks next?",
                players.join(", "),
                conversation
            )),
        ]
    }
}

#[async_trait]
impl TurnSelector for ModelTurnSelector {
    async fn select_next(
        &self,
        transcript_so_far: &[String],
        alive_names: &[String],
    ) -> Result<TurnChoice, GenerationError> {
        let reply = self
            .generator
            .generate(
                &self.model,
                &Self::messages(transcript_so_far, alive_names),
            )
            .await?;
        let choice = TurnChoice::parse(&reply);
        tracing::debug!(model = %self.model, reply = %reply.trim(), choice = ?choice, "Turn selected");
        Ok(choice)
    }
}
