//! Game phase machine: explicit phases and legal transition guards.
//!
//! Every game starts at `Setup` and ends at `Terminal`. The engine calls
//! [`PhaseMachine::advance`] between phases; each call is checked against
//! the phase graph and recorded, so a finished game carries its full phase
//! history.

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// What triggered an elimination check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EliminationCause {
    /// The daytime village vote.
    Vote,
    /// The werewolves' night kill.
    Werewolves,
}

/// The phases of one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// Roles dealt, agents initialized.
    Setup,
    /// Players speak in the order the turn selector picks.
    Debate,
    /// Seers inspect a player.
    SeerAction,
    /// Possessed players announce a fake inspection.
    PossessedAction,
    /// Every alive player votes.
    Vote,
    /// Win conditions are evaluated after an elimination.
    EliminationCheck(EliminationCause),
    /// The werewolves pick a victim.
    WerewolfAction,
    /// A side has won.
    Terminal,
}

impl GamePhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Terminal)
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Setup => write!(f, "Setup"),
            Self::Debate => write!(f, "Debate"),
            Self::SeerAction => write!(f, "SeerAction"),
            Self::PossessedAction => write!(f, "PossessedAction"),
            Self::Vote => write!(f, "Vote"),
            Self::EliminationCheck(EliminationCause::Vote) => write!(f, "EliminationCheck(vote)"),
            Self::EliminationCheck(EliminationCause::Werewolves) => {
                write!(f, "EliminationCheck(werewolves)")
            }
            Self::WerewolfAction => write!(f, "WerewolfAction"),
            Self::Terminal => write!(f, "Terminal"),
        }
    }
}

/// Legal edges of the phase graph.
///
/// ```text
/// Setup → Debate
/// Debate → SeerAction → PossessedAction → Vote → EliminationCheck(vote)
/// EliminationCheck(vote) → WerewolfAction | Terminal
/// WerewolfAction → EliminationCheck(werewolves)
/// EliminationCheck(werewolves) → Debate | Terminal
/// ```
fn is_legal_transition(from: GamePhase, to: GamePhase) -> bool {
    use EliminationCause as Cause;
    use GamePhase::*;

    matches!(
        (from, to),
        (Setup, Debate)
            | (Debate, SeerAction)
            | (SeerAction, PossessedAction)
            | (PossessedAction, Vote)
            | (Vote, EliminationCheck(Cause::Vote))
            | (EliminationCheck(Cause::Vote), WerewolfAction)
            | (WerewolfAction, EliminationCheck(Cause::Werewolves))
            | (EliminationCheck(Cause::Werewolves), Debate)
            | (EliminationCheck(_), Terminal)
    )
}

/// A single recorded phase transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: GamePhase,
    pub to: GamePhase,
    /// Round number at the time of the transition (0 during setup).
    pub round: u32,
    /// Milliseconds since the machine was created.
    pub elapsed_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Error returned when an illegal transition is attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IllegalTransition {
    pub from: GamePhase,
    pub to: GamePhase,
}

impl fmt::Display for IllegalTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Illegal phase transition: {} → {}", self.from, self.to)
    }
}

impl std::error::Error for IllegalTransition {}

/// Tracks the current phase and the transition log of one game.
pub struct PhaseMachine {
    current: GamePhase,
    round: u32,
    created_at: Instant,
    transitions: Vec<TransitionRecord>,
}

impl PhaseMachine {
    /// Create a machine at `Setup`.
    pub fn new() -> Self {
        Self {
            current: GamePhase::Setup,
            round: 0,
            created_at: Instant::now(),
            transitions: Vec::new(),
        }
    }

    pub fn current(&self) -> GamePhase {
        self.current
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn set_round(&mut self, round: u32) {
        self.round = round;
    }

    /// Move to `to` if the phase graph allows it.
    pub fn advance(&mut self, to: GamePhase, reason: Option<&str>) -> Result<(), IllegalTransition> {
        if !is_legal_transition(self.current, to) {
            return Err(IllegalTransition {
                from: self.current,
                to,
            });
        }

        let record = TransitionRecord {
            from: self.current,
            to,
            round: self.round,
            elapsed_ms: self.created_at.elapsed().as_millis() as u64,
            reason: reason.map(String::from),
        };

        tracing::debug!(from = %self.current, to = %to, round = self.round, "Phase transition");

        self.transitions.push(record);
        self.current = to;
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.current.is_terminal()
    }

    pub fn transitions(&self) -> &[TransitionRecord] {
        &self.transitions
    }

    pub fn into_transitions(self) -> Vec<TransitionRecord> {
        self.transitions
    }

    /// One-line history, e.g. for the end-of-game log.
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "{} → {} ({} rounds, {} transitions)",
            GamePhase::Setup,
            self.current,
            self.round,
            self.transitions.len()
        );
        if !self.transitions.is_empty() {
            let phases: Vec<String> = self.transitions.iter().map(|t| t.to.to_string()).collect();
            summary.push_str(&format!(" [{}]", phases.join(" → ")));
        }
        summary
    }
}

impl Default for PhaseMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_round(machine: &mut PhaseMachine) {
        machine.advance(GamePhase::Debate, None).unwrap();
        machine.advance(GamePhase::SeerAction, None).unwrap();
        machine.advance(GamePhase::PossessedAction, None).unwrap();
        machine.advance(GamePhase::Vote, None).unwrap();
        machine
            .advance(GamePhase::EliminationCheck(EliminationCause::Vote), None)
            .unwrap();
        machine.advance(GamePhase::WerewolfAction, None).unwrap();
        machine
            .advance(GamePhase::EliminationCheck(EliminationCause::Werewolves), None)
            .unwrap();
    }

    #[test]
    fn test_initial_state() {
        let machine = PhaseMachine::new();
        assert_eq!(machine.current(), GamePhase::Setup);
        assert!(!machine.is_terminal());
        assert!(machine.transitions().is_empty());
    }

    #[test]
    fn test_two_rounds_then_villager_win() {
        let mut machine = PhaseMachine::new();
        machine.set_round(1);
        full_round(&mut machine);
        machine.set_round(2);
        full_round(&mut machine);
        machine.advance(GamePhase::Terminal, Some("villagers")).unwrap();
        assert!(machine.is_terminal());
        assert_eq!(machine.transitions().len(), 15);
        assert_eq!(machine.transitions()[14].round, 2);
        assert_eq!(machine.transitions()[14].reason.as_deref(), Some("villagers"));
    }

    #[test]
    fn test_terminal_after_vote_check() {
        let mut machine = PhaseMachine::new();
        machine.advance(GamePhase::Debate, None).unwrap();
        machine.advance(GamePhase::SeerAction, None).unwrap();
        machine.advance(GamePhase::PossessedAction, None).unwrap();
        machine.advance(GamePhase::Vote, None).unwrap();
        machine
            .advance(GamePhase::EliminationCheck(EliminationCause::Vote), None)
            .unwrap();
        machine.advance(GamePhase::Terminal, None).unwrap();
        assert!(machine.summary().contains("Setup → Terminal"));
    }

    #[test]
    fn test_illegal_transitions_rejected() {
        let mut machine = PhaseMachine::new();
        let err = machine.advance(GamePhase::Vote, None).unwrap_err();
        assert_eq!(err.from, GamePhase::Setup);
        assert_eq!(err.to, GamePhase::Vote);
        assert!(err.to_string().contains("Setup → Vote"));

        machine.advance(GamePhase::Debate, None).unwrap();
        // Debate cannot skip the night actions.
        assert!(machine.advance(GamePhase::Vote, None).is_err());
        // A check is only reached from its own trigger.
        assert!(machine
            .advance(GamePhase::EliminationCheck(EliminationCause::Werewolves), None)
            .is_err());
        assert_eq!(machine.current(), GamePhase::Debate);
    }

    #[test]
    fn test_terminal_is_final() {
        let mut machine = PhaseMachine::new();
        machine.set_round(1);
        full_round(&mut machine);
        machine.advance(GamePhase::Terminal, None).unwrap();
        assert!(machine.advance(GamePhase::Debate, None).is_err());
    }

    #[test]
    fn test_record_serializes_cause() {
        let json = serde_json::to_string(&GamePhase::EliminationCheck(EliminationCause::Werewolves))
            .unwrap();
        assert_eq!(json, r#"{"elimination_check":"werewolves"}"#);
    }
}
