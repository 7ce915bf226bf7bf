//! Line-oriented console for a human player.
//!
//! One [`HumanConsole`] is shared by the human's speaker (debate and vote
//! lines) and by [`ConsoleActions`] (night choices), so both read from the
//! same buffered input.

use std::io::{self, BufRead, BufReader, Write};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::actions::{ActionProvider, NightAction, RandomActions};
use crate::error::{GameError, GenerationError, VillageResult};
use crate::generator::{ChatMessage, TextGenerator};
use crate::roles::capitalize;
use crate::state::GamePhase;

const SPEAK_PROMPT: &str = "Your turn to speak: ";
const VOTE_PROMPT: &str = "Your turn to vote: ";

pub struct HumanConsole {
    input: Mutex<Box<dyn BufRead + Send>>,
    output: Mutex<Box<dyn Write + Send>>,
    turn_prompt: Mutex<&'static str>,
}

impl HumanConsole {
    pub fn new(input: Box<dyn BufRead + Send>, output: Box<dyn Write + Send>) -> Self {
        Self {
            input: Mutex::new(input),
            output: Mutex::new(output),
            turn_prompt: Mutex::new(SPEAK_PROMPT),
        }
    }

    /// Console on the process's stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(
            Box::new(BufReader::new(io::stdin())),
            Box::new(io::stdout()),
        )
    }

    /// Prompt shown when the human has to produce a line.
    pub fn turn_prompt(&self) -> &'static str {
        *self.turn_prompt.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_turn_prompt(&self, prompt: &'static str) {
        *self.turn_prompt.lock().unwrap_or_else(|e| e.into_inner()) = prompt;
    }

    /// Print one line.
    pub fn say(&self, line: &str) -> io::Result<()> {
        let mut out = self.output.lock().unwrap_or_else(|e| e.into_inner());
        writeln!(out, "{line}")?;
        out.flush()
    }

    /// Print a prompt and read one trimmed line. `None` on end of input.
    pub fn ask(&self, prompt: &str) -> io::Result<Option<String>> {
        {
            let mut out = self.output.lock().unwrap_or_else(|e| e.into_inner());
            write!(out, "{prompt}")?;
            out.flush()?;
        }
        let mut line = String::new();
        let read = self
            .input
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .read_line(&mut line)?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

/// Text generator backed by the human at the console.
///
/// The model id and messages are ignored; blank lines are asked again.
/// End of input is reported as [`GenerationError::RequestFailed`], which
/// aborts the game in progress.
pub struct ConsoleSpeaker {
    console: Arc<HumanConsole>,
}

impl ConsoleSpeaker {
    pub fn new(console: Arc<HumanConsole>) -> Self {
        Self { console }
    }
}

#[async_trait]
impl TextGenerator for ConsoleSpeaker {
    async fn generate(
        &self,
        _model: &str,
        _messages: &[ChatMessage],
    ) -> Result<String, GenerationError> {
        loop {
            let line = self
                .console
                .ask(self.console.turn_prompt())
                .map_err(|e| GenerationError::RequestFailed(e.to_string()))?
                .ok_or_else(|| GenerationError::RequestFailed("console input closed".into()))?;
            if !line.is_empty() {
                return Ok(line);
            }
        }
    }
}

/// Night choices read from the console for the human's own actions.
///
/// Actions by other players (and pack kills when the human is not a
/// werewolf) fall back to random choices.
pub struct ConsoleActions {
    console: Arc<HumanConsole>,
    human: String,
    fallback: RandomActions,
}

impl ConsoleActions {
    pub fn new(console: Arc<HumanConsole>, human: impl AsRef<str>, fallback: RandomActions) -> Self {
        Self {
            console,
            human: human.as_ref().to_lowercase(),
            fallback,
        }
    }

    pub fn human(&self) -> &str {
        &self.human
    }

    fn show(&self, line: &str) {
        if let Err(e) = self.console.say(line) {
            tracing::warn!(error = %e, "Failed to write to console");
        }
    }
}

impl ActionProvider for ConsoleActions {
    fn choose_target(
        &mut self,
        action: NightAction,
        actors: &[String],
        candidates: &[String],
    ) -> VillageResult<Option<String>> {
        if candidates.is_empty() {
            return Ok(None);
        }
        if !actors.contains(&self.human) {
            return self.fallback.choose_target(action, actors, candidates);
        }

        let question = match action {
            NightAction::Seer => "Choose one player to see their role",
            NightAction::Possessed => "Choose one player to pretend you saw",
            NightAction::Werewolf => "Werewolves, choose a player to eliminate",
        };
        let names: Vec<String> = candidates.iter().map(|n| capitalize(n)).collect();
        self.show(&format!("{question} ({}):", names.join(", ")));

        loop {
            let line = self
                .console
                .ask("> ")
                .map_err(|e| GameError::Input(e.to_string()))?
                .ok_or_else(|| GameError::Input("console input closed".into()))?;
            let choice = line.to_lowercase();
            if candidates.contains(&choice) {
                return Ok(Some(choice));
            }
            self.show(&format!("'{line}' is not one of the players you can choose."));
        }
    }

    fn notify(&mut self, line: &str) {
        self.show(line);
    }

    fn whisper(&mut self, player: &str, text: &str) {
        if player.eq_ignore_ascii_case(&self.human) {
            self.show(text);
        }
    }

    fn enter_phase(&mut self, phase: GamePhase) {
        let prompt = match phase {
            GamePhase::Vote => VOTE_PROMPT,
            _ => SPEAK_PROMPT,
        };
        self.console.set_turn_prompt(prompt);
    }
}
