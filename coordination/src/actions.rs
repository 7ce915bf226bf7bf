//! Night-action providers.
//!
//! The engine asks an [`ActionProvider`] for every night choice. The
//! provider is chosen once per game: [`RandomActions`] for simulated
//! games, or the console provider when a human sits at the table.

use std::fmt;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::VillageResult;
use crate::state::GamePhase;

/// The night actions that need a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NightAction {
    /// A seer inspects one player.
    Seer,
    /// A possessed player pretends to inspect one player.
    Possessed,
    /// The pack eliminates one villager.
    Werewolf,
}

impl fmt::Display for NightAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seer => write!(f, "seer"),
            Self::Possessed => write!(f, "possessed"),
            Self::Werewolf => write!(f, "werewolf"),
        }
    }
}

/// Capability set for night choices and for showing a human what happens.
pub trait ActionProvider: Send {
    /// Pick a target among `candidates` on behalf of `actors`.
    ///
    /// Returns `None` only when there is nobody to choose.
    fn choose_target(
        &mut self,
        action: NightAction,
        actors: &[String],
        candidates: &[String],
    ) -> VillageResult<Option<String>>;

    /// A public event every player can see.
    fn notify(&mut self, _line: &str) {}

    /// Private information for one player.
    fn whisper(&mut self, _player: &str, _text: &str) {}

    /// The game moved to `phase`.
    fn enter_phase(&mut self, _phase: GamePhase) {}
}

/// Uniformly random choices from a seeded generator.
#[derive(Debug, Clone)]
pub struct RandomActions {
    rng: StdRng,
}

impl RandomActions {
    pub fn new(rng: StdRng) -> Self {
        Self { rng }
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl ActionProvider for RandomActions {
    fn choose_target(
        &mut self,
        action: NightAction,
        actors: &[String],
        candidates: &[String],
    ) -> VillageResult<Option<String>> {
        let choice = candidates.choose(&mut self.rng).cloned();
        tracing::debug!(%action, actors = ?actors, target = ?choice, "Random night action");
        Ok(choice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_random_choice_stays_in_candidates() {
        let mut actions = RandomActions::seeded(3);
        let candidates = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let mut seen = HashSet::new();
        for _ in 0..200 {
            let target = actions
                .choose_target(NightAction::Seer, &["s".to_string()], &candidates)
                .unwrap()
                .unwrap();
            assert!(candidates.contains(&target));
            seen.insert(target);
        }
        // Uniform over three candidates: all of them show up.
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_no_candidates() {
        let mut actions = RandomActions::seeded(3);
        assert_eq!(
            actions
                .choose_target(NightAction::Werewolf, &[], &[])
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_same_seed_same_choices() {
        let candidates: Vec<String> = (0..10).map(|i| i.to_string()).collect();
        let mut a = RandomActions::seeded(11);
        let mut b = RandomActions::seeded(11);
        for _ in 0..20 {
            assert_eq!(
                a.choose_target(NightAction::Possessed, &[], &candidates)
                    .unwrap(),
                b.choose_target(NightAction::Possessed, &[], &candidates)
                    .unwrap()
            );
        }
    }
}
