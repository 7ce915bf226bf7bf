//! Werewolf Village Coordination Library
//!
//! Deterministic core for simulating games of Werewolf between
//! language-model characters (and optionally one human):
//!
//! - Roles, role assignment and the alive-player roster
//! - Per-player private context with bracketed secrets, and the
//!   censored/uncensored game transcript
//! - The phase engine: debate, night actions, vote, elimination checks,
//!   guarded by an explicit phase machine
//! - Vote extraction and tallying
//! - Running batches of isolated games and persisting the results
//!
//! Everything non-deterministic sits behind a collaborator trait:
//! [`TextGenerator`] (model calls), [`TurnSelector`] (who speaks next),
//! [`ActionProvider`] (night choices), [`PromptSource`] (templates) and
//! [`GameSink`] (where finished games go).
//!
//! # Usage
//!
//! ```ignore
//! let selector = ModelTurnSelector::new(generator.clone(), "gpt-3.5-turbo");
//! let mut runner = GameRunner::new(
//!     RunSettings::default(),
//!     generator,
//!     Box::new(selector),
//!     Box::new(BuiltinPrompts),
//!     Box::new(JsonDirectorySink::new("games")),
//! );
//! let summary = runner.run(&NamePool::parse(&names)).await?;
//! ```

pub mod actions;
pub mod agent;
pub mod console;
pub mod engine;
pub mod error;
pub mod generator;
pub mod log;
pub mod persistence;
pub mod prompts;
pub mod roles;
pub mod roster;
pub mod runner;
pub mod state;
pub mod transcript;
pub mod turn;
pub mod voting;

// Re-export key game types
pub use actions::{ActionProvider, NightAction, RandomActions};
pub use agent::{Agent, Utterance};
pub use console::{ConsoleActions, ConsoleSpeaker, HumanConsole};
pub use engine::{false_role, GameSettings, PhaseEngine, DEBATE_TURN_CAP};
pub use error::{GameError, GenerationError, VillageResult};
pub use generator::{ChatMessage, MessageRole, TextGenerator};
pub use log::{GameResult, RoundLog};
pub use persistence::{GameSink, JsonDirectorySink, MemorySink};
pub use prompts::{BuiltinPrompts, PromptSource, PROMPT_VERSION, VOTE_PROMPT};
pub use roles::{capitalize, NamePool, PlayerRole, Role, RoleAssignment, RoleCounts, Side};
pub use roster::Roster;
pub use runner::{GameFailure, GameOutcome, GameRunner, RunSettings, RunSummary};
pub use state::{EliminationCause, GamePhase, IllegalTransition, PhaseMachine, TransitionRecord};
pub use transcript::Transcript;
pub use turn::{ModelTurnSelector, TurnChoice, TurnSelector};
pub use voting::{extract_vote, VoteTally};
