//! Phase engine: plays one game from setup to a winner.
//!
//! The engine owns every piece of per-game state (roster, agents,
//! transcript, round logs, phase machine) and drives the rounds:
//!
//! ```text
//! Debate → SeerAction → PossessedAction → Vote → EliminationCheck(vote)
//!        → WerewolfAction → EliminationCheck(werewolves) → Debate ...
//! ```
//!
//! Either elimination check ends the game as soon as a side has won.
//! Collaborators are awaited one at a time; nothing runs concurrently.

use std::collections::HashMap;
use std::slice;

use chrono::Utc;
use uuid::Uuid;

use crate::actions::{ActionProvider, NightAction};
use crate::agent::{Agent, Utterance};
use crate::error::{GameError, VillageResult};
use crate::log::{GameResult, RoundLog};
use crate::prompts::PROMPT_VERSION;
use crate::roles::{capitalize, Role, RoleAssignment, Side};
use crate::roster::Roster;
use crate::state::{EliminationCause, GamePhase, PhaseMachine};
use crate::transcript::Transcript;
use crate::turn::{TurnChoice, TurnSelector};
use crate::voting::{extract_vote, VoteTally};

/// Maximum turn-selection attempts per debate.
pub const DEBATE_TURN_CAP: u32 = 15;

const SEER_SECRET: &str =
    "You are the seer. You can see the true identity of one player each night.";
const POSSESSED_SECRET: &str =
    "You are the possessed. You will pretend to be a seer and announce false discoveries.";

/// Per-game settings shared by every game of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSettings {
    /// Model identifier recorded with each game and used by the agents.
    pub model: String,
    pub debate_turn_cap: u32,
    /// A human occupies the first seat.
    pub interactive: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            debate_turn_cap: DEBATE_TURN_CAP,
            interactive: false,
        }
    }
}

/// The role a possessed player claims to have seen.
///
/// Always a lie: peasants are reported as werewolves and everyone else as
/// a peasant.
pub fn false_role(true_role: Role) -> Role {
    match true_role {
        Role::Peasant => Role::Werewolf,
        _ => Role::Peasant,
    }
}

fn name_list(names: &[String]) -> String {
    names
        .iter()
        .map(|n| capitalize(n))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Plays one game.
pub struct PhaseEngine<'a> {
    game: usize,
    run_id: Uuid,
    settings: GameSettings,
    assignment: RoleAssignment,
    roster: Roster,
    agents: HashMap<String, Agent>,
    transcript: Transcript,
    rounds: Vec<RoundLog>,
    machine: PhaseMachine,
    selector: &'a dyn TurnSelector,
    actions: &'a mut dyn ActionProvider,
    vote_prompt: String,
    started_at: chrono::DateTime<Utc>,
}

impl<'a> PhaseEngine<'a> {
    /// Seat the agents and give each one its role and secrets.
    ///
    /// Every agent must match exactly one seat of `assignment`.
    pub fn new(
        game: usize,
        settings: GameSettings,
        assignment: RoleAssignment,
        agents: Vec<Agent>,
        selector: &'a dyn TurnSelector,
        actions: &'a mut dyn ActionProvider,
        vote_prompt: impl Into<String>,
    ) -> VillageResult<Self> {
        let seats = assignment.names();
        let mut by_name: HashMap<String, Agent> = HashMap::with_capacity(agents.len());
        for agent in agents {
            let name = agent.name().to_string();
            if assignment.role_of(&name).is_none() {
                return Err(GameError::Agent {
                    name,
                    reason: "has no seat at this table".into(),
                });
            }
            if by_name.insert(name.clone(), agent).is_some() {
                return Err(GameError::Agent {
                    name,
                    reason: "seated twice".into(),
                });
            }
        }
        if let Some(missing) = seats.iter().find(|n| !by_name.contains_key(*n)) {
            return Err(GameError::Agent {
                name: missing.clone(),
                reason: "seat has no agent".into(),
            });
        }

        let pack_secret = format!("The werewolves are: {}.", name_list(assignment.werewolves()));
        for seat in assignment.players() {
            let extras: Vec<String> = match seat.role {
                Role::Werewolf => vec![pack_secret.clone()],
                Role::Seer => vec![SEER_SECRET.to_string()],
                Role::Possessed => vec![POSSESSED_SECRET.to_string()],
                Role::Peasant => Vec::new(),
            };
            if let Some(agent) = by_name.get_mut(&seat.name) {
                agent.initialize(&seats, seat.role, &extras)?;
            }
            actions.whisper(
                &seat.name,
                &format!(
                    "You are {}. Your role is {}.",
                    capitalize(&seat.name),
                    seat.role
                ),
            );
            for extra in &extras {
                actions.whisper(&seat.name, extra);
            }
        }

        tracing::info!(
            game,
            players = seats.len(),
            werewolves = assignment.werewolves().len(),
            seers = assignment.seers().len(),
            possessed = assignment.possessed().len(),
            "Game set up"
        );

        Ok(Self {
            game,
            run_id: Uuid::new_v4(),
            settings,
            roster: Roster::new(&seats),
            assignment,
            agents: by_name,
            transcript: Transcript::new(),
            rounds: Vec::new(),
            machine: PhaseMachine::new(),
            selector,
            actions,
            vote_prompt: vote_prompt.into(),
            started_at: Utc::now(),
        })
    }

    /// Tag the game with the id of the run it belongs to.
    pub fn with_run_id(mut self, run_id: Uuid) -> Self {
        self.run_id = run_id;
        self
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Play rounds until a side wins.
    pub async fn run(mut self) -> VillageResult<GameResult> {
        let mut round = 0;
        let winner = loop {
            round += 1;
            self.machine.set_round(round);
            let mut log = RoundLog::new(round);
            tracing::info!(game = self.game, round, alive = self.roster.len(), "Round started");

            self.enter(GamePhase::Debate, None)?;
            log.debate_turns = self.debate().await?;

            self.enter(GamePhase::SeerAction, None)?;
            self.seer_action(&mut log)?;

            self.enter(GamePhase::PossessedAction, None)?;
            self.possessed_action(&mut log)?;

            self.enter(GamePhase::Vote, None)?;
            self.vote(&mut log).await?;

            self.enter(GamePhase::EliminationCheck(EliminationCause::Vote), None)?;
            if let Some(side) = self.roster.winner(&self.assignment) {
                self.rounds.push(log);
                break side;
            }

            self.enter(GamePhase::WerewolfAction, None)?;
            let victim = self.werewolf_action(&mut log)?;

            self.enter(
                GamePhase::EliminationCheck(EliminationCause::Werewolves),
                None,
            )?;
            if let Some(side) = self.roster.winner(&self.assignment) {
                self.rounds.push(log);
                break side;
            }

            if let Some(victim) = victim {
                self.announce(&format!(
                    "The werewolves have eliminated {} during the night. You have some time for \
                     additional discussion before the next voting phase. Please do not cast any \
                     votes until you are told to do so. Use this time to discuss and try to \
                     identify who the werewolves could be.",
                    capitalize(&victim)
                ));
            }
            self.rounds.push(log);
        };

        self.enter(GamePhase::Terminal, Some(winner.to_string().as_str()))?;
        tracing::info!(
            game = self.game,
            %winner,
            rounds = round,
            survivors = ?self.roster.names(),
            "Game over: {}",
            self.machine.summary()
        );
        Ok(self.finish(winner))
    }

    fn enter(&mut self, phase: GamePhase, reason: Option<&str>) -> VillageResult<()> {
        self.machine.advance(phase, reason)?;
        self.actions.enter_phase(phase);
        Ok(())
    }

    /// Remove a player from the roster and drop their agent.
    fn eliminate(&mut self, name: &str) -> VillageResult<()> {
        self.roster.eliminate(name)?;
        self.agents.remove(name);
        Ok(())
    }

    fn finish(self, winner: Side) -> GameResult {
        GameResult {
            game: self.game,
            run_id: self.run_id,
            winner,
            model: self.settings.model,
            interactive: self.settings.interactive,
            prompt_version: PROMPT_VERSION.to_string(),
            transcript: self.transcript,
            werewolf_names: self.assignment.werewolves().to_vec(),
            seer_names: self.assignment.seers().to_vec(),
            possessed_names: self.assignment.possessed().to_vec(),
            roles: self.assignment.players().to_vec(),
            all_player_names: self.assignment.names(),
            remaining_player_names: self.roster.names().to_vec(),
            game_log: self.rounds,
            transitions: self.machine.into_transitions(),
            started_at: self.started_at,
            finished_at: Utc::now(),
        }
    }

    /// Public narrator event: every alive agent observes it, then it is
    /// appended to both transcripts.
    fn announce(&mut self, text: &str) {
        for name in self.roster.names() {
            if let Some(agent) = self.agents.get_mut(name) {
                agent.observe(text);
            }
        }
        self.transcript.push_event(text);
        self.actions.notify(text);
    }

    /// Private note for one player.
    fn tell(&mut self, player: &str, text: &str) {
        if let Some(agent) = self.agents.get_mut(player) {
            agent.note_private(text);
        }
        self.actions.whisper(player, text);
    }

    /// Let `speaker` talk; every other alive agent hears the censored line.
    async fn speak(&mut self, speaker: &str) -> VillageResult<Utterance> {
        let agent = self
            .agents
            .get_mut(speaker)
            .ok_or_else(|| GameError::Agent {
                name: speaker.to_string(),
                reason: "no agent for this player".into(),
            })?;
        let utterance = agent.produce_utterance().await?;
        for name in self.roster.names() {
            if name == speaker {
                continue;
            }
            if let Some(other) = self.agents.get_mut(name) {
                other.observe(&utterance.censored);
            }
        }
        self.transcript
            .push_utterance(&utterance.censored, &utterance.uncensored);
        self.actions.notify(&utterance.censored);
        Ok(utterance)
    }

    /// Ask the action provider for a target and check it is a candidate.
    fn choose(
        &mut self,
        action: NightAction,
        actors: &[String],
        candidates: &[String],
    ) -> VillageResult<Option<String>> {
        let Some(target) = self.actions.choose_target(action, actors, candidates)? else {
            return Ok(None);
        };
        let target = target.to_lowercase();
        if !candidates.contains(&target) {
            return Err(GameError::Agent {
                name: actors.join(", "),
                reason: format!("{action} target '{target}' is not a valid choice"),
            });
        }
        Ok(Some(target))
    }

    fn role_of(&self, name: &str) -> VillageResult<Role> {
        self.assignment
            .role_of(name)
            .ok_or_else(|| GameError::Agent {
                name: name.to_string(),
                reason: "has no role".into(),
            })
    }

    /// Returns the number of selection attempts used.
    async fn debate(&mut self) -> VillageResult<u32> {
        let mut attempts = 0;
        while attempts < self.settings.debate_turn_cap {
            attempts += 1;
            let alive = self.roster.names().to_vec();
            let choice = self
                .selector
                .select_next(self.transcript.censored(), &alive)
                .await?;
            match choice.normalized() {
                TurnChoice::Vote => {
                    tracing::debug!(game = self.game, attempts, "Selector called the vote");
                    break;
                }
                TurnChoice::Speaker(name) if self.roster.contains(&name) => {
                    self.speak(&name).await?;
                }
                TurnChoice::Speaker(name) => {
                    tracing::warn!(
                        game = self.game,
                        selected = %name,
                        "Selector picked a player who is not alive; selecting again"
                    );
                }
            }
        }
        Ok(attempts)
    }

    fn seer_action(&mut self, log: &mut RoundLog) -> VillageResult<()> {
        for seer in self.roster.alive_in(self.assignment.seers()) {
            let candidates = self.roster.others(&seer);
            let Some(target) = self.choose(NightAction::Seer, slice::from_ref(&seer), &candidates)?
            else {
                continue;
            };
            let role = self.role_of(&target)?;
            self.tell(
                &seer,
                &format!(
                    "You have chosen to see the role of {}. They are a {role}.",
                    capitalize(&target)
                ),
            );
            let announcement = format!(
                "{} has discovered that {} is a {role}.",
                capitalize(&seer),
                capitalize(&target)
            );
            self.announce(&announcement);
            log.add_seer_discovery(&announcement);
        }
        Ok(())
    }

    fn possessed_action(&mut self, log: &mut RoundLog) -> VillageResult<()> {
        for possessed in self.roster.alive_in(self.assignment.possessed()) {
            let candidates = self.roster.others(&possessed);
            let Some(target) = self.choose(
                NightAction::Possessed,
                slice::from_ref(&possessed),
                &candidates,
            )?
            else {
                continue;
            };
            let claimed = false_role(self.role_of(&target)?);
            let announcement = format!(
                "{} has discovered that {} is a {claimed}.",
                capitalize(&possessed),
                capitalize(&target)
            );
            self.announce(&announcement);
            log.add_possessed_discovery(&announcement);
        }
        Ok(())
    }

    async fn vote(&mut self, log: &mut RoundLog) -> VillageResult<()> {
        let prompt = self.vote_prompt.clone();
        self.announce(&prompt);

        let wolves = self.roster.alive_in(self.assignment.werewolves());
        let advice = format!(
            "You are a werewolf. The werewolves still in the game are: {}. Do not vote for a \
             fellow werewolf.",
            name_list(&wolves)
        );
        for wolf in &wolves {
            self.tell(wolf, &advice);
        }

        let voters = self.roster.names().to_vec();
        let mut tally = VoteTally::new(&voters);
        for voter in &voters {
            let utterance = self.speak(voter).await?;
            // The speaker prefix is not part of the vote.
            let body = utterance
                .censored
                .split_once(':')
                .map(|(_, body)| body)
                .unwrap_or(&utterance.censored);
            match extract_vote(body, &voters) {
                Some(choice) => {
                    tracing::debug!(game = self.game, voter = %voter, vote = %choice, "Vote cast");
                    tally.record(&choice);
                }
                None => {
                    tracing::warn!(
                        game = self.game,
                        voter = %voter,
                        line = %utterance.censored,
                        "Could not find a player name in vote; counting as abstention"
                    );
                    log.abstentions.push(voter.clone());
                }
            }
            log.voting.push((voter.clone(), utterance.censored));
        }

        let tied = tally.tied_leaders();
        if tied.len() > 1 {
            tracing::info!(
                game = self.game,
                tied = ?tied,
                "Vote tied; eliminating the first tied player in seat order"
            );
        }
        let voted_out = tally.leader().map(str::to_string);
        log.tally = tally.into_entries();

        if let Some(name) = voted_out {
            self.eliminate(&name)?;
            tracing::info!(game = self.game, eliminated = %name, "Voted out");
            self.announce(&format!(
                "The village has voted to eliminate {}.",
                capitalize(&name)
            ));
            log.voted_out = Some(name);
        }
        Ok(())
    }

    /// Returns the victim, if the pack had anyone to choose.
    fn werewolf_action(&mut self, log: &mut RoundLog) -> VillageResult<Option<String>> {
        let wolves = self.roster.alive_in(self.assignment.werewolves());
        let candidates = self.roster.alive_outside(self.assignment.werewolves());
        let Some(victim) = self.choose(NightAction::Werewolf, &wolves, &candidates)? else {
            return Ok(None);
        };
        let announcement = format!(
            "The werewolves have chosen to eliminate {}.",
            capitalize(&victim)
        );
        self.announce(&announcement);
        log.werewolf_elimination = Some(announcement);
        self.eliminate(&victim)?;
        tracing::info!(game = self.game, eliminated = %victim, "Killed by the werewolves");
        Ok(Some(victim))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::RandomActions;
    use crate::error::GenerationError;
    use crate::generator::MockTextGenerator;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct AlwaysVote;

    #[async_trait]
    impl TurnSelector for AlwaysVote {
        async fn select_next(
            &self,
            _transcript: &[String],
            _alive: &[String],
        ) -> Result<TurnChoice, GenerationError> {
            Ok(TurnChoice::Vote)
        }
    }

    fn agent(name: &str, reply: &'static str) -> Agent {
        let mut mock = MockTextGenerator::new();
        mock.expect_generate()
            .returning(move |_, _| Ok(reply.to_string()));
        Agent::new(name, "test-model", Arc::new(mock))
    }

    #[test]
    fn test_false_role_always_lies() {
        for role in [Role::Peasant, Role::Werewolf, Role::Seer, Role::Possessed] {
            assert_ne!(false_role(role), role);
        }
        assert_eq!(false_role(Role::Peasant), Role::Werewolf);
        assert_eq!(false_role(Role::Werewolf), Role::Peasant);
    }

    #[test]
    fn test_rejects_agent_without_seat() {
        let assignment = RoleAssignment::from_roles([("a", Role::Werewolf), ("b", Role::Peasant)]);
        let mut actions = RandomActions::seeded(0);
        let result = PhaseEngine::new(
            0,
            GameSettings::default(),
            assignment,
            vec![agent("a", "x"), agent("zed", "x")],
            &AlwaysVote,
            &mut actions,
            "Narrator: vote.",
        );
        assert!(matches!(result, Err(GameError::Agent { .. })));
    }

    #[tokio::test]
    async fn test_werewolf_voted_out_in_first_round() {
        // Everybody votes for Wolf, including Wolf.
        let assignment = RoleAssignment::from_roles([
            ("wolf", Role::Werewolf),
            ("anna", Role::Peasant),
            ("bert", Role::Peasant),
        ]);
        let agents = vec![
            agent("wolf", "I vote for wolf."),
            agent("anna", "I vote for wolf."),
            agent("bert", "I vote for wolf."),
        ];
        let mut actions = RandomActions::seeded(0);
        let engine = PhaseEngine::new(
            3,
            GameSettings::default(),
            assignment,
            agents,
            &AlwaysVote,
            &mut actions,
            "Narrator: vote.",
        )
        .unwrap();
        let result = engine.run().await.unwrap();

        assert_eq!(result.game, 3);
        assert_eq!(result.prompt_version, PROMPT_VERSION);
        assert_eq!(result.winner, Side::Villagers);
        assert_eq!(result.remaining_player_names, ["anna", "bert"]);
        assert_eq!(result.game_log.len(), 1);
        let round = &result.game_log[0];
        assert_eq!(round.debate_turns, 1);
        assert_eq!(round.voted_out.as_deref(), Some("wolf"));
        assert_eq!(round.tally[0], ("wolf".to_string(), 3));
        assert!(round.werewolf_elimination.is_none());
        assert_eq!(
            result.transcript.censored().len(),
            result.transcript.uncensored().len()
        );
        assert_eq!(
            result.transitions.last().map(|t| t.to),
            Some(GamePhase::Terminal)
        );
    }

    #[tokio::test]
    async fn test_vote_without_names_is_abstention() {
        let assignment = RoleAssignment::from_roles([
            ("wolf", Role::Werewolf),
            ("anna", Role::Peasant),
            ("bert", Role::Peasant),
            ("cleo", Role::Peasant),
        ]);
        let agents = vec![
            agent("wolf", "No idea."),
            agent("anna", "No idea."),
            agent("bert", "No idea."),
            agent("cleo", "No idea."),
        ];
        let mut actions = RandomActions::seeded(9);
        let engine = PhaseEngine::new(
            0,
            GameSettings::default(),
            assignment,
            agents,
            &AlwaysVote,
            &mut actions,
            "Narrator: vote.",
        )
        .unwrap();
        let result = engine.run().await.unwrap();

        let first = &result.game_log[0];
        assert_eq!(first.abstentions.len(), 4);
        // All tied at zero: first seat goes.
        assert_eq!(first.voted_out.as_deref(), Some("wolf"));
        assert_eq!(result.winner, Side::Villagers);
    }

    #[tokio::test]
    async fn test_eliminated_player_stops_observing() {
        let assignment = RoleAssignment::from_roles([
            ("wolf", Role::Werewolf),
            ("anna", Role::Peasant),
            ("bert", Role::Peasant),
            ("cleo", Role::Peasant),
        ]);
        let agents = vec![
            agent("wolf", "I vote for Anna."),
            agent("anna", "I vote for Bert."),
            agent("bert", "I vote for Anna."),
            agent("cleo", "I vote for Anna."),
        ];
        let mut actions = RandomActions::seeded(0);
        let mut engine = PhaseEngine::new(
            0,
            GameSettings::default(),
            assignment,
            agents,
            &AlwaysVote,
            &mut actions,
            "Narrator: vote.",
        )
        .unwrap();

        let mut log = RoundLog::new(1);
        engine.vote(&mut log).await.unwrap();
        assert_eq!(log.voted_out.as_deref(), Some("anna"));
        assert!(!engine.roster().contains("anna"));
        assert!(!engine.agents.contains_key("anna"));

        engine.announce("Narrator: the night falls.");
        for name in ["wolf", "bert", "cleo"] {
            assert!(engine.agents[name]
                .context()
                .ends_with("Narrator: the night falls.\n"));
        }
    }
}
