//! Prompt text for players, the turn selector and the narrator.
//!
//! Prompt versioning: bump `PROMPT_VERSION` whenever preamble content
//! changes so saved games can be traced back to the prompts that produced
//! them.

use crate::error::{GameError, VillageResult};
use crate::roles::{capitalize, Role};

/// Prompt version. Bump on any preamble content change.
pub const PROMPT_VERSION: &str = "1.2.0";

/// Template name of the narrator line that opens the voting phase.
pub const VOTE_PROMPT: &str = "vote_prompt";

/// Built-in vote prompt, used when no template directory overrides it.
pub const DEFAULT_VOTE_PROMPT: &str = "\
Narrator: The debate is over, it is time to vote. Each of you, in turn, must name \
the ONE player you want to eliminate and give a short reason. The player with the \
most votes will be eliminated.";

/// Preamble for the model that decides who speaks next.
pub const TURN_SELECTOR_PREAMBLE: &str = "\
You moderate a game of Werewolf played by several characters. Given the conversation \
so far and the list of players still in the game, decide who should speak next so \
that the debate stays lively and everybody who has been accused gets a chance to \
answer. When the debate has run its course, answer VOTE instead.

Answer with exactly one word: a name from the list, or VOTE.";

/// System preamble for one player.
pub fn player_preamble(name: &str, role: Role) -> String {
    let name = capitalize(name);
    format!(
        "You are {name}, a character in a game of Werewolf. Your secret role is {role}.

Rules:
- Peasants and the seer win once every werewolf has been eliminated.
- Werewolves and the possessed win once they are at least as many as everybody else.
- Each day the village debates, then votes to eliminate one player.
- Each night the werewolves eliminate one villager, the seer learns one player's \
true role and the possessed pretends to have done the same.

Text in square brackets is private: only you can read it. You may write your own \
private thoughts in square brackets; the other players will not see them.

Stay in character. Reply with a single short line of dialogue starting with \"{name}: \"."
    )
}

/// Instruction appended after the context when it is the player's turn.
pub fn turn_instruction(name: &str) -> String {
    format!(
        "It is your turn to speak. Reply as {}, in one or two sentences.",
        capitalize(name)
    )
}

/// Collaborator that loads named prompt templates.
pub trait PromptSource: Send + Sync {
    /// Return the literal content of the template called `name`.
    fn load(&self, name: &str) -> VillageResult<String>;
}

/// Templates compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinPrompts;

impl BuiltinPrompts {
    pub fn get(name: &str) -> Option<&'static str> {
        match name {
            VOTE_PROMPT => Some(DEFAULT_VOTE_PROMPT),
            _ => None,
        }
    }
}

impl PromptSource for BuiltinPrompts {
    fn load(&self, name: &str) -> VillageResult<String> {
        Self::get(name)
            .map(str::to_string)
            .ok_or_else(|| GameError::Template {
                name: name.to_string(),
                reason: "no built-in template with this name".into(),
            })
    }
}
