//! Roles, name pool, and per-game role assignment.
//!
//! Names are stored lowercase so that lookups are case-insensitive; use
//! [`capitalize`] when a name appears in text shown to the players.

use std::collections::HashSet;
use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{GameError, VillageResult};

/// A player's secret role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Plain villager with no night action.
    Peasant,
    /// Member of the pack; eliminates one villager per night.
    Werewolf,
    /// Learns the true role of one player per night.
    Seer,
    /// Sides with the werewolves and announces false discoveries.
    Possessed,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Peasant => "peasant",
            Self::Werewolf => "werewolf",
            Self::Seer => "seer",
            Self::Possessed => "possessed",
        }
    }

    /// Whether this role counts towards the werewolf bloc in the win check.
    pub fn is_werewolf_bloc(self) -> bool {
        matches!(self, Self::Werewolf | Self::Possessed)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two sides that can win a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Villagers,
    Werewolves,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Villagers => write!(f, "villagers"),
            Self::Werewolves => write!(f, "werewolves"),
        }
    }
}

/// Number of special roles at the table. Remaining seats are peasants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCounts {
    pub werewolves: usize,
    pub seers: usize,
    pub possessed: usize,
}

impl Default for RoleCounts {
    fn default() -> Self {
        Self {
            werewolves: 1,
            seers: 1,
            possessed: 1,
        }
    }
}

impl RoleCounts {
    /// Total number of non-peasant seats.
    pub fn special(&self) -> usize {
        self.werewolves + self.seers + self.possessed
    }

    /// Check that these counts fit a table of `n_players`.
    pub fn validate(&self, n_players: usize) -> VillageResult<()> {
        if n_players == 0 {
            return Err(GameError::Config("a game needs at least one player".into()));
        }
        if self.special() > n_players {
            return Err(GameError::Config(format!(
                "{} werewolves + {} seers + {} possessed exceed {} players",
                self.werewolves, self.seers, self.possessed, n_players
            )));
        }
        Ok(())
    }

    /// Unshuffled role deck for `n_players` seats.
    pub fn deck(&self, n_players: usize) -> Vec<Role> {
        let mut deck = Vec::with_capacity(n_players);
        deck.extend(std::iter::repeat_n(Role::Werewolf, self.werewolves));
        deck.extend(std::iter::repeat_n(Role::Seer, self.seers));
        deck.extend(std::iter::repeat_n(Role::Possessed, self.possessed));
        deck.resize(n_players.max(deck.len()), Role::Peasant);
        deck
    }
}

/// Candidate player names, normalized and deduplicated.
#[derive(Debug, Clone, Default)]
pub struct NamePool {
    names: Vec<String>,
}

impl NamePool {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut pool = Vec::new();
        for raw in names {
            let name = raw.as_ref().trim().to_lowercase();
            if name.is_empty() {
                continue;
            }
            if seen.insert(name.clone()) {
                pool.push(name);
            } else {
                tracing::warn!(name = %name, "Duplicate name in pool ignored");
            }
        }
        Self { names: pool }
    }

    /// Parse a names file: one name per line.
    pub fn parse(text: &str) -> Self {
        Self::new(text.lines())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Shuffle a copy of the pool and take the first `n` names.
    pub fn draw<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> VillageResult<Vec<String>> {
        if self.names.len() < n {
            return Err(GameError::InsufficientInput {
                available: self.names.len(),
                required: n,
            });
        }
        let mut names = self.names.clone();
        names.shuffle(rng);
        names.truncate(n);
        Ok(names)
    }
}

/// One seat at the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRole {
    pub name: String,
    pub role: Role,
}

/// Roles dealt for one game, with the derived role groups.
///
/// The groups are fixed for the whole game and are not pruned when a
/// player dies; intersect them with the [`Roster`](crate::roster::Roster).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleAssignment {
    players: Vec<PlayerRole>,
    werewolves: Vec<String>,
    seers: Vec<String>,
    possessed: Vec<String>,
}

impl RoleAssignment {
    /// Shuffle the role deck over `names` (seat order is preserved).
    pub fn deal<R: Rng + ?Sized>(
        names: &[String],
        counts: &RoleCounts,
        rng: &mut R,
    ) -> VillageResult<Self> {
        counts.validate(names.len())?;
        let mut deck = counts.deck(names.len());
        deck.shuffle(rng);
        Ok(Self::from_roles(names.iter().cloned().zip(deck)))
    }

    /// Build an assignment from explicit seats.
    pub fn from_roles<I, S>(seats: I) -> Self
    where
        I: IntoIterator<Item = (S, Role)>,
        S: AsRef<str>,
    {
        let players: Vec<PlayerRole> = seats
            .into_iter()
            .map(|(name, role)| PlayerRole {
                name: name.as_ref().trim().to_lowercase(),
                role,
            })
            .collect();
        let group = |role: Role| -> Vec<String> {
            players
                .iter()
                .filter(|p| p.role == role)
                .map(|p| p.name.clone())
                .collect()
        };
        Self {
            werewolves: group(Role::Werewolf),
            seers: group(Role::Seer),
            possessed: group(Role::Possessed),
            players,
        }
    }

    pub fn players(&self) -> &[PlayerRole] {
        &self.players
    }

    /// Seat order of every player dealt into the game.
    pub fn names(&self) -> Vec<String> {
        self.players.iter().map(|p| p.name.clone()).collect()
    }

    pub fn role_of(&self, name: &str) -> Option<Role> {
        let name = name.to_lowercase();
        self.players.iter().find(|p| p.name == name).map(|p| p.role)
    }

    pub fn werewolves(&self) -> &[String] {
        &self.werewolves
    }

    pub fn seers(&self) -> &[String] {
        &self.seers
    }

    pub fn possessed(&self) -> &[String] {
        &self.possessed
    }

    pub fn count(&self, role: Role) -> usize {
        self.players.iter().filter(|p| p.role == role).count()
    }
}

/// Uppercase the first character of a stored (lowercase) name.
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
