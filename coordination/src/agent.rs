//! A single player: private context plus in-character text generation.

use std::sync::Arc;

use crate::error::{GameError, GenerationError, VillageResult};
use crate::generator::{ChatMessage, TextGenerator};
use crate::prompts;
use crate::roles::{capitalize, Role};
use crate::transcript::{bracket, censor};

/// One line spoken by a player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    /// What the other players see: private annotations removed.
    pub censored: String,
    /// The raw generated line.
    pub uncensored: String,
}

impl Utterance {
    /// Build both views from a raw line.
    pub fn from_raw(raw: &str) -> Self {
        Self {
            censored: censor(raw),
            uncensored: raw.to_string(),
        }
    }
}

/// Per-player conversational state.
///
/// The context is this player's own view of the game: the public events
/// it has observed, its own lines, and bracketed secrets that only it can
/// read.
pub struct Agent {
    name: String,
    model: String,
    generator: Arc<dyn TextGenerator>,
    role: Option<Role>,
    context: String,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("model", &self.model)
            .field("role", &self.role)
            .field("context_len", &self.context.len())
            .finish()
    }
}

impl Agent {
    pub fn new(
        name: impl AsRef<str>,
        model: impl Into<String>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            name: name.as_ref().trim().to_lowercase(),
            model: model.into(),
            generator,
            role: None,
            context: String::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Role given at initialization, `None` before.
    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn is_initialized(&self) -> bool {
        self.role.is_some()
    }

    /// Seed the context with the table, the role and role-specific secrets.
    ///
    /// Secrets are wrapped in brackets. Fails if the agent was already
    /// initialized and not [`reset`](Self::reset) since.
    pub fn initialize(
        &mut self,
        full_roster: &[String],
        role: Role,
        secret_extras: &[String],
    ) -> VillageResult<()> {
        if self.is_initialized() {
            return Err(GameError::Agent {
                name: self.name.clone(),
                reason: "already initialized".into(),
            });
        }
        let players: Vec<String> = full_roster.iter().map(|n| capitalize(n)).collect();
        self.context = format!(
            "The players are: {}.\n{}\n",
            players.join(", "),
            bracket(&format!("You are {}. Your role is {role}.", capitalize(&self.name)))
        );
        for extra in secret_extras {
            self.context.push_str(&bracket(extra));
            self.context.push('\n');
        }
        self.role = Some(role);
        Ok(())
    }

    /// Forget everything so the agent can be initialized again.
    pub fn reset(&mut self) {
        self.role = None;
        self.context.clear();
    }

    /// Append a public event to this agent's context.
    pub fn observe(&mut self, public_event: &str) {
        self.context.push_str(public_event);
        self.context.push('\n');
    }

    /// Append a private annotation only this agent can read.
    pub fn note_private(&mut self, text: &str) {
        self.context.push_str(&bracket(text));
        self.context.push('\n');
    }

    /// Messages sent to the generator for this agent's next line.
    pub fn messages(&self) -> Vec<ChatMessage> {
        let role = self.role.unwrap_or(Role::Peasant);
        vec![
            ChatMessage::system(prompts::player_preamble(&self.name, role)),
            ChatMessage::user(format!(
                "{}\n{}",
                self.context,
                prompts::turn_instruction(&self.name)
            )),
        ]
    }

    /// Generate this player's next line.
    ///
    /// The line always starts with `Name: `. The uncensored line is also
    /// appended to the agent's own context.
    pub async fn produce_utterance(&mut self) -> VillageResult<Utterance> {
        if !self.is_initialized() {
            return Err(GameError::Agent {
                name: self.name.clone(),
                reason: "asked to speak before initialization".into(),
            });
        }
        let raw = self
            .generator
            .generate(&self.model, &self.messages())
            .await?;
        let line = self.normalize(&raw).ok_or_else(|| GenerationError::Empty {
            model: self.model.clone(),
        })?;
        self.observe(&line);
        Ok(Utterance::from_raw(&line))
    }

    fn normalize(&self, raw: &str) -> Option<String> {
        let text = raw.trim();
        if text.is_empty() {
            return None;
        }
        let display = capitalize(&self.name);
        let prefix = format!("{}:", self.name);
        if text.to_lowercase().starts_with(&prefix) {
            if let Some(body) = text.get(prefix.len()..).map(str::trim) {
                if body.is_empty() {
                    return None;
                }
                return Some(format!("{display}: {body}"));
            }
        }
        Some(format!("{display}: {text}"))
    }
}
