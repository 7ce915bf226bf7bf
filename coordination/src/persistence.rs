//! Where finished games go.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{GameError, VillageResult};
use crate::log::GameResult;

/// Receives every completed game.
pub trait GameSink: Send {
    fn persist(&mut self, result: &GameResult) -> VillageResult<()>;
}

/// Writes each game to `<dir>/<game>.json` as pretty-printed JSON.
#[derive(Debug, Clone)]
pub struct JsonDirectorySink {
    dir: PathBuf,
}

impl JsonDirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, game: usize) -> PathBuf {
        self.dir.join(format!("{game}.json"))
    }
}

impl GameSink for JsonDirectorySink {
    fn persist(&mut self, result: &GameResult) -> VillageResult<()> {
        let failed = |reason: String| GameError::Persistence {
            game: result.game,
            reason,
        };
        fs::create_dir_all(&self.dir)
            .map_err(|e| failed(format!("create {}: {e}", self.dir.display())))?;
        let json = serde_json::to_string_pretty(result).map_err(|e| failed(e.to_string()))?;
        let path = self.path_for(result.game);
        fs::write(&path, json).map_err(|e| failed(format!("write {}: {e}", path.display())))?;
        tracing::info!(game = result.game, path = %path.display(), "Game saved");
        Ok(())
    }
}

/// Keeps results in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub results: Vec<GameResult>,
}

impl GameSink for MemorySink {
    fn persist(&mut self, result: &GameResult) -> VillageResult<()> {
        self.results.push(result.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::RoundLog;
    use crate::roles::{PlayerRole, Role, Side};
    use crate::transcript::Transcript;
    use chrono::Utc;
    use uuid::Uuid;

    fn result(game: usize) -> GameResult {
        let mut transcript = Transcript::new();
        transcript.push_event("Narrator: vote.");
        transcript.push_utterance("Anna:  I vote Wolf.", "Anna: [sure] I vote Wolf.");
        GameResult {
            game,
            run_id: Uuid::new_v4(),
            winner: Side::Villagers,
            model: "gpt-3.5-turbo".into(),
            interactive: false,
            prompt_version: "1.2.0".into(),
            transcript,
            werewolf_names: vec!["wolf".into()],
            seer_names: vec![],
            possessed_names: vec![],
            roles: vec![
                PlayerRole {
                    name: "wolf".into(),
                    role: Role::Werewolf,
                },
                PlayerRole {
                    name: "anna".into(),
                    role: Role::Peasant,
                },
            ],
            all_player_names: vec!["wolf".into(), "anna".into()],
            remaining_player_names: vec!["anna".into()],
            game_log: vec![RoundLog::new(1)],
            transitions: vec![],
            started_at: Utc::now(),
            finished_at: Utc::now(),
        }
    }

    #[test]
    fn test_json_sink_writes_one_file_per_game() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = JsonDirectorySink::new(dir.path().join("games"));
        sink.persist(&result(0)).unwrap();
        sink.persist(&result(1)).unwrap();

        let text = fs::read_to_string(sink.path_for(1)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["winner"], "villagers");
        assert_eq!(value["conversation_history"][1], "Anna:  I vote Wolf.");
        assert_eq!(
            value["conversation_history_uncensored"][1],
            "Anna: [sure] I vote Wolf."
        );
        assert!(value["game_log"].is_array());
        assert!(value["game_log"][0]["possessed_discovery"].is_null());
        assert!(value["game_log"][0]
            .as_object()
            .unwrap()
            .contains_key("voted_out"));
        assert!(sink.path_for(0).exists());

        let back: GameResult = serde_json::from_str(&text).unwrap();
        assert_eq!(back, result_with_same_ids(&back));
    }

    fn result_with_same_ids(other: &GameResult) -> GameResult {
        GameResult {
            run_id: other.run_id,
            started_at: other.started_at,
            finished_at: other.finished_at,
            ..result(other.game)
        }
    }

    #[test]
    fn test_unwritable_dir_is_persistence_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        // A regular file cannot be used as the output directory.
        let mut sink = JsonDirectorySink::new(file.path());
        let err = sink.persist(&result(4)).unwrap_err();
        assert!(matches!(err, GameError::Persistence { game: 4, .. }));
    }
}
