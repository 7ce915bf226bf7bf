use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use werewolf_coordination::{GameSettings, RoleCounts, RunSettings, DEBATE_TURN_CAP};

/// OpenAI-compatible chat endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmEndpoint {
    /// Base URL, e.g. `https://api.openai.com/v1`.
    pub url: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl Default for LlmEndpoint {
    fn default() -> Self {
        Self {
            url: std::env::var("WEREWOLF_LLM_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".into()),
            api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
            timeout_secs: 120,
            temperature: None,
            max_tokens: None,
        }
    }
}

/// Top-level configuration.
///
/// Defaults come from the environment; a TOML file can override any field
/// and command-line flags override both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VillageConfig {
    pub n_games: usize,
    pub n_players: usize,
    pub n_werewolves: usize,
    pub n_seers: usize,
    pub n_possessed: usize,
    /// Seat a human at the console in the first seat.
    pub interactive: bool,
    /// Model used by every player.
    pub model: String,
    /// Model used to pick the next speaker (defaults to `model`).
    pub selector_model: Option<String>,
    pub debate_turn_cap: u32,
    pub names_file: PathBuf,
    pub prompts_dir: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub seed: Option<u64>,
    pub endpoint: LlmEndpoint,
}

impl Default for VillageConfig {
    fn default() -> Self {
        Self {
            n_games: 10,
            n_players: 5,
            n_werewolves: 1,
            n_seers: 1,
            n_possessed: 1,
            interactive: false,
            model: std::env::var("WEREWOLF_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".into()),
            selector_model: std::env::var("WEREWOLF_SELECTOR_MODEL").ok(),
            debate_turn_cap: DEBATE_TURN_CAP,
            names_file: std::env::var("WEREWOLF_NAMES_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/names.txt")),
            prompts_dir: std::env::var("WEREWOLF_PROMPTS_DIR").ok().map(PathBuf::from),
            output_dir: std::env::var("WEREWOLF_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("games")),
            seed: std::env::var("WEREWOLF_SEED")
                .ok()
                .and_then(|s| s.parse().ok()),
            endpoint: LlmEndpoint::default(),
        }
    }
}

impl VillageConfig {
    /// Load a TOML file on top of the environment defaults.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).context(format!("Failed to read {}", path.display()))?;
        let config: VillageConfig =
            toml::from_str(&content).context("Failed to parse village config TOML")?;
        Ok(config)
    }

    pub fn role_counts(&self) -> RoleCounts {
        RoleCounts {
            werewolves: self.n_werewolves,
            seers: self.n_seers,
            possessed: self.n_possessed,
        }
    }

    pub fn selector_model(&self) -> &str {
        self.selector_model.as_deref().unwrap_or(&self.model)
    }

    pub fn run_settings(&self) -> RunSettings {
        RunSettings {
            n_games: self.n_games,
            n_players: self.n_players,
            roles: self.role_counts(),
            game: GameSettings {
                model: self.model.clone(),
                debate_turn_cap: self.debate_turn_cap,
                interactive: self.interactive,
            },
            seed: self.seed,
        }
    }
}
