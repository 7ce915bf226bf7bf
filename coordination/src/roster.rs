//! The set of players still alive in a game.
//!
//! The roster is owned by the phase engine and is the only place where a
//! player is removed. It shrinks one name at a time and never regrows.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, VillageResult};
use crate::roles::{Role, RoleAssignment, Side};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    alive: Vec<String>,
}

impl Roster {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            alive: names
                .into_iter()
                .map(|n| n.as_ref().trim().to_lowercase())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.alive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alive.is_empty()
    }

    /// Alive names in seat order.
    pub fn names(&self) -> &[String] {
        &self.alive
    }

    pub fn contains(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.alive.iter().any(|n| *n == name)
    }

    /// Alive players other than `name`.
    pub fn others(&self, name: &str) -> Vec<String> {
        let name = name.to_lowercase();
        self.alive.iter().filter(|n| **n != name).cloned().collect()
    }

    /// Members of `group` that are still alive, in seat order.
    pub fn alive_in(&self, group: &[String]) -> Vec<String> {
        self.alive
            .iter()
            .filter(|n| group.contains(n))
            .cloned()
            .collect()
    }

    /// Alive players that are not in `group`, in seat order.
    pub fn alive_outside(&self, group: &[String]) -> Vec<String> {
        self.alive
            .iter()
            .filter(|n| !group.contains(n))
            .cloned()
            .collect()
    }

    /// Remove a player. Fails if the player is not alive.
    pub fn eliminate(&mut self, name: &str) -> VillageResult<()> {
        let name = name.to_lowercase();
        let Some(pos) = self.alive.iter().position(|n| *n == name) else {
            return Err(GameError::Agent {
                name,
                reason: "cannot eliminate a player who is not alive".into(),
            });
        };
        self.alive.remove(pos);
        Ok(())
    }

    /// Evaluate the win condition against the current roster.
    ///
    /// Villagers win once no werewolf is alive. Otherwise the werewolves
    /// win when alive werewolves plus alive possessed are at least as many
    /// as everybody else still alive. The villager check runs first.
    pub fn winner(&self, assignment: &RoleAssignment) -> Option<Side> {
        let wolves = self.alive_in(assignment.werewolves()).len();
        if wolves == 0 {
            return Some(Side::Villagers);
        }
        let bloc = self
            .names()
            .iter()
            .filter(|n| assignment.role_of(n).is_some_and(Role::is_werewolf_bloc))
            .count();
        let opposition = self.len().saturating_sub(bloc);
        if bloc >= opposition {
            return Some(Side::Werewolves);
        }
        None
    }
}
