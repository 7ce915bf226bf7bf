//! Per-round logs and the finished-game record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::roles::{PlayerRole, Side};
use crate::state::TransitionRecord;
use crate::transcript::Transcript;

/// Serialize `Vec<(String, V)>` as a JSON object, keeping insertion order.
mod ordered_map {
    use std::fmt;
    use std::marker::PhantomData;

    use serde::de::{MapAccess, Visitor};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[allow(clippy::ptr_arg)]
    pub fn serialize<S, V>(entries: &Vec<(String, V)>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        V: Serialize,
    {
        serializer.collect_map(entries.iter().map(|(k, v)| (k, v)))
    }

    pub fn deserialize<'de, D, V>(deserializer: D) -> Result<Vec<(String, V)>, D::Error>
    where
        D: Deserializer<'de>,
        V: Deserialize<'de>,
    {
        struct OrderedVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedVisitor<V> {
            type Value = Vec<(String, V)>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry()? {
                    entries.push(entry);
                }
                Ok(entries)
            }
        }

        deserializer.deserialize_map(OrderedVisitor(PhantomData))
    }
}

/// What happened in one round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundLog {
    /// 1-based.
    pub round: u32,
    /// Selection attempts consumed by the debate.
    pub debate_turns: u32,
    #[serde(default)]
    pub seer_discovery: Option<String>,
    #[serde(default)]
    pub possessed_discovery: Option<String>,
    /// Voter → censored vote line, in voting order.
    #[serde(with = "ordered_map", default)]
    pub voting: Vec<(String, String)>,
    /// Candidate → votes received, in roster order.
    #[serde(with = "ordered_map", default)]
    pub tally: Vec<(String, u32)>,
    /// Voters whose line named no alive player.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub abstentions: Vec<String>,
    #[serde(default)]
    pub voted_out: Option<String>,
    #[serde(default)]
    pub werewolf_elimination: Option<String>,
}

impl RoundLog {
    pub fn new(round: u32) -> Self {
        Self {
            round,
            ..Self::default()
        }
    }

    pub fn add_seer_discovery(&mut self, announcement: &str) {
        append_line(&mut self.seer_discovery, announcement);
    }

    pub fn add_possessed_discovery(&mut self, announcement: &str) {
        append_line(&mut self.possessed_discovery, announcement);
    }
}

fn append_line(slot: &mut Option<String>, line: &str) {
    match slot {
        Some(existing) => {
            existing.push('\n');
            existing.push_str(line);
        }
        None => *slot = Some(line.to_string()),
    }
}

/// Everything persisted about a finished game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameResult {
    pub game: usize,
    pub run_id: Uuid,
    pub winner: Side,
    pub model: String,
    pub interactive: bool,
    /// Version of the built-in prompts the players were given.
    pub prompt_version: String,
    #[serde(flatten)]
    pub transcript: Transcript,
    pub werewolf_names: Vec<String>,
    pub seer_names: Vec<String>,
    pub possessed_names: Vec<String>,
    pub roles: Vec<PlayerRole>,
    pub all_player_names: Vec<String>,
    pub remaining_player_names: Vec<String>,
    pub game_log: Vec<RoundLog>,
    pub transitions: Vec<TransitionRecord>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl GameResult {
    pub fn rounds(&self) -> usize {
        self.game_log.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discoveries_join_with_newline() {
        let mut log = RoundLog::new(1);
        log.add_seer_discovery("Emily has discovered that Kyle is a werewolf.");
        log.add_seer_discovery("Sophia has discovered that Emily is a peasant.");
        assert_eq!(
            log.seer_discovery.as_deref(),
            Some(
                "Emily has discovered that Kyle is a werewolf.\n\
                 Sophia has discovered that Emily is a peasant."
            )
        );
        assert!(log.possessed_discovery.is_none());
    }

    #[test]
    fn test_voting_keeps_order_in_json() {
        let mut log = RoundLog::new(2);
        log.voting = vec![
            ("zoe".into(), "Zoe: I vote Adam.".into()),
            ("adam".into(), "Adam: I vote Zoe.".into()),
        ];
        log.tally = vec![("zoe".into(), 1), ("adam".into(), 1)];
        let json = serde_json::to_string(&log).unwrap();
        let zoe = json.find("\"zoe\":\"Zoe").unwrap();
        let adam = json.find("\"adam\":\"Adam").unwrap();
        assert!(zoe < adam);
        assert!(json.contains(r#""tally":{"zoe":1,"adam":1}"#));
        assert!(!json.contains("abstentions"));
        assert!(json.contains(r#""seer_discovery":null"#));
        assert!(json.contains(r#""werewolf_elimination":null"#));

        let back: RoundLog = serde_json::from_str(&json).unwrap();
        assert_eq!(back, log);
    }
}
