//! Runs a batch of independent games.
//!
//! The table (which names play) is drawn once per run; roles, agents and
//! all game state are fresh for every game. A game that fails on model or
//! console input is logged and skipped; any other error stops the run.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use uuid::Uuid;

use crate::actions::{ActionProvider, RandomActions};
use crate::agent::Agent;
use crate::console::{ConsoleActions, ConsoleSpeaker, HumanConsole};
use crate::engine::{GameSettings, PhaseEngine};
use crate::error::{GameError, VillageResult};
use crate::generator::TextGenerator;
use crate::log::GameResult;
use crate::persistence::GameSink;
use crate::prompts::{PromptSource, VOTE_PROMPT};
use crate::roles::{NamePool, RoleAssignment, RoleCounts, Side};
use crate::turn::TurnSelector;

/// Settings for a whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub n_games: usize,
    pub n_players: usize,
    pub roles: RoleCounts,
    pub game: GameSettings,
    /// Makes the run reproducible; game `i` uses `seed + i`.
    pub seed: Option<u64>,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            n_games: 10,
            n_players: 5,
            roles: RoleCounts::default(),
            game: GameSettings::default(),
            seed: None,
        }
    }
}

impl RunSettings {
    pub fn validate(&self) -> VillageResult<()> {
        if self.n_games == 0 {
            return Err(GameError::Config("n_games must be at least 1".into()));
        }
        if self.game.debate_turn_cap == 0 {
            return Err(GameError::Config("debate turn cap must be at least 1".into()));
        }
        self.roles.validate(self.n_players)
    }

    fn rng_for(&self, offset: u64) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(offset)),
            None => StdRng::from_os_rng(),
        }
    }
}

/// One finished game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameOutcome {
    pub game: usize,
    pub winner: Side,
    pub rounds: usize,
}

/// One aborted game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameFailure {
    pub game: usize,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub table: Vec<String>,
    pub completed: Vec<GameOutcome>,
    pub failed: Vec<GameFailure>,
}

impl RunSummary {
    pub fn wins(&self, side: Side) -> usize {
        self.completed.iter().filter(|o| o.winner == side).count()
    }
}

pub struct GameRunner {
    settings: RunSettings,
    generator: Arc<dyn TextGenerator>,
    selector: Box<dyn TurnSelector>,
    prompts: Box<dyn PromptSource>,
    sink: Box<dyn GameSink>,
    console: Option<Arc<HumanConsole>>,
    run_id: Uuid,
}

impl GameRunner {
    pub fn new(
        settings: RunSettings,
        generator: Arc<dyn TextGenerator>,
        selector: Box<dyn TurnSelector>,
        prompts: Box<dyn PromptSource>,
        sink: Box<dyn GameSink>,
    ) -> Self {
        Self {
            settings,
            generator,
            selector,
            prompts,
            sink,
            console: None,
            run_id: Uuid::new_v4(),
        }
    }

    /// Console for the human seat in interactive mode.
    pub fn with_console(mut self, console: Arc<HumanConsole>) -> Self {
        self.console = Some(console);
        self
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Validate, draw the table and play every game in order.
    pub async fn run(&mut self, pool: &NamePool) -> VillageResult<RunSummary> {
        self.settings.validate()?;
        if self.settings.game.interactive && self.console.is_none() {
            return Err(GameError::Config(
                "interactive mode needs a console for the human player".into(),
            ));
        }

        let mut table_rng = self.settings.rng_for(u64::MAX);
        let table = pool.draw(self.settings.n_players, &mut table_rng)?;
        let vote_prompt = self.prompts.load(VOTE_PROMPT)?;

        tracing::info!(
            run_id = %self.run_id,
            games = self.settings.n_games,
            players = ?table,
            model = %self.settings.game.model,
            interactive = self.settings.game.interactive,
            "Run started"
        );

        let mut summary = RunSummary {
            run_id: self.run_id,
            table: table.clone(),
            completed: Vec::new(),
            failed: Vec::new(),
        };

        for game in 0..self.settings.n_games {
            let mut rng = self.settings.rng_for(game as u64);
            match self.play(game, &table, &vote_prompt, &mut rng).await {
                Ok(result) => {
                    self.sink.persist(&result)?;
                    summary.completed.push(GameOutcome {
                        game,
                        winner: result.winner,
                        rounds: result.rounds(),
                    });
                }
                Err(e) if e.is_game_scoped() => {
                    tracing::error!(game, error = %e, "Game aborted");
                    summary.failed.push(GameFailure {
                        game,
                        error: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!(
            run_id = %self.run_id,
            completed = summary.completed.len(),
            failed = summary.failed.len(),
            villager_wins = summary.wins(Side::Villagers),
            werewolf_wins = summary.wins(Side::Werewolves),
            "Run finished"
        );
        Ok(summary)
    }

    async fn play(
        &self,
        game: usize,
        table: &[String],
        vote_prompt: &str,
        rng: &mut StdRng,
    ) -> VillageResult<GameResult> {
        let assignment = RoleAssignment::deal(table, &self.settings.roles, rng)?;
        let human = self
            .console
            .as_ref()
            .filter(|_| self.settings.game.interactive);

        let agents: Vec<Agent> = table
            .iter()
            .enumerate()
            .map(|(seat, name)| {
                let generator: Arc<dyn TextGenerator> = match human {
                    Some(console) if seat == 0 => Arc::new(ConsoleSpeaker::new(console.clone())),
                    _ => self.generator.clone(),
                };
                Agent::new(name, self.settings.game.model.as_str(), generator)
            })
            .collect();

        let fallback = RandomActions::new(StdRng::seed_from_u64(rng.random()));
        let mut actions: Box<dyn ActionProvider> = match (human, table.first()) {
            (Some(console), Some(name)) => {
                Box::new(ConsoleActions::new(console.clone(), name, fallback))
            }
            _ => Box::new(fallback),
        };

        PhaseEngine::new(
            game,
            self.settings.game.clone(),
            assignment,
            agents,
            self.selector.as_ref(),
            actions.as_mut(),
            vote_prompt,
        )?
        .with_run_id(self.run_id)
        .run()
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::MockTextGenerator;
    use crate::persistence::MemorySink;
    use crate::prompts::BuiltinPrompts;
    use crate::turn::ModelTurnSelector;

    fn runner(settings: RunSettings) -> GameRunner {
        let generator: Arc<dyn TextGenerator> = Arc::new(MockTextGenerator::new());
        GameRunner::new(
            settings,
            generator.clone(),
            Box::new(ModelTurnSelector::new(generator, "test")),
            Box::new(BuiltinPrompts),
            Box::new(MemorySink::default()),
        )
    }

    fn pool(n: usize) -> NamePool {
        NamePool::new((0..n).map(|i| format!("player{i}")))
    }

    #[tokio::test]
    async fn test_too_few_names_fails_before_any_game() {
        let mut runner = runner(RunSettings {
            seed: Some(1),
            ..RunSettings::default()
        });
        let err = runner.run(&pool(4)).await.unwrap_err();
        assert!(matches!(
            err,
            GameError::InsufficientInput {
                available: 4,
                required: 5
            }
        ));
    }

    #[tokio::test]
    async fn test_invalid_role_counts_fail() {
        let mut runner = runner(RunSettings {
            n_players: 2,
            ..RunSettings::default()
        });
        assert!(matches!(
            runner.run(&pool(10)).await,
            Err(GameError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_interactive_without_console_fails() {
        let mut settings = RunSettings::default();
        settings.game.interactive = true;
        let mut runner = runner(settings);
        assert!(matches!(
            runner.run(&pool(10)).await,
            Err(GameError::Config(_))
        ));
    }

    #[test]
    fn test_zero_games_rejected() {
        let settings = RunSettings {
            n_games: 0,
            ..RunSettings::default()
        };
        assert!(settings.validate().is_err());
    }
}
