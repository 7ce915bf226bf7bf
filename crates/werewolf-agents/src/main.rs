use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use werewolf_agents::{OpenAiChat, TemplateDir, VillageConfig};
use werewolf_coordination::{
    BuiltinPrompts, GameRunner, HumanConsole, JsonDirectorySink, ModelTurnSelector, NamePool,
    PromptSource, Side, TextGenerator,
};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Simulate games of Werewolf between LLM characters", long_about = None)]
struct Args {
    /// TOML config file (fields override environment defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of games to play
    #[arg(long)]
    games: Option<usize>,

    /// Players per game
    #[arg(long)]
    players: Option<usize>,

    #[arg(long)]
    werewolves: Option<usize>,

    #[arg(long)]
    seers: Option<usize>,

    #[arg(long)]
    possessed: Option<usize>,

    /// Play the first seat yourself from the console
    #[arg(long, default_value_t = false)]
    interactive: bool,

    /// Model for every player (overrides WEREWOLF_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// Model that picks the next speaker
    #[arg(long)]
    selector_model: Option<String>,

    /// OpenAI-compatible base URL (overrides WEREWOLF_LLM_URL)
    #[arg(long)]
    llm_url: Option<String>,

    /// Maximum turn selections per debate
    #[arg(long)]
    debate_turns: Option<u32>,

    /// File with one candidate name per line
    #[arg(long)]
    names: Option<PathBuf>,

    /// Directory with prompt templates
    #[arg(long)]
    prompts_dir: Option<PathBuf>,

    /// Directory for the per-game JSON files
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
}

impl Args {
    fn load_config(&self) -> Result<VillageConfig> {
        let mut config = match &self.config {
            Some(path) => VillageConfig::from_toml_file(path)?,
            None => VillageConfig::default(),
        };
        self.apply(&mut config);
        Ok(config)
    }

    fn apply(&self, config: &mut VillageConfig) {
        if let Some(n) = self.games {
            config.n_games = n;
        }
        if let Some(n) = self.players {
            config.n_players = n;
        }
        if let Some(n) = self.werewolves {
            config.n_werewolves = n;
        }
        if let Some(n) = self.seers {
            config.n_seers = n;
        }
        if let Some(n) = self.possessed {
            config.n_possessed = n;
        }
        if self.interactive {
            config.interactive = true;
        }
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(model) = &self.selector_model {
            config.selector_model = Some(model.clone());
        }
        if let Some(url) = &self.llm_url {
            config.endpoint.url = url.clone();
        }
        if let Some(cap) = self.debate_turns {
            config.debate_turn_cap = cap;
        }
        if let Some(path) = &self.names {
            config.names_file = path.clone();
        }
        if let Some(dir) = &self.prompts_dir {
            config.prompts_dir = Some(dir.clone());
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let config = args.load_config()?;
    info!(
        url = %config.endpoint.url,
        model = %config.model,
        games = config.n_games,
        players = config.n_players,
        interactive = config.interactive,
        "Werewolf village starting"
    );

    let names = std::fs::read_to_string(&config.names_file).context(format!(
        "Failed to read names file {}",
        config.names_file.display()
    ))?;
    let pool = NamePool::parse(&names);

    if config.endpoint.api_key.is_none() {
        warn!("OPENAI_API_KEY is not set; requests are sent without authorization");
    }
    let generator: Arc<dyn TextGenerator> = Arc::new(
        OpenAiChat::new(config.endpoint.clone()).context("Failed to build HTTP client")?,
    );
    let selector = ModelTurnSelector::new(generator.clone(), config.selector_model());
    let prompts: Box<dyn PromptSource> = match &config.prompts_dir {
        Some(dir) => Box::new(TemplateDir::new(dir)),
        None => Box::new(BuiltinPrompts),
    };
    let sink = JsonDirectorySink::new(&config.output_dir);

    let mut runner = GameRunner::new(
        config.run_settings(),
        generator,
        Box::new(selector),
        prompts,
        Box::new(sink),
    );
    if config.interactive {
        runner = runner.with_console(Arc::new(HumanConsole::stdio()));
    }

    let summary = runner.run(&pool).await?;
    info!(
        completed = summary.completed.len(),
        failed = summary.failed.len(),
        villagers = summary.wins(Side::Villagers),
        werewolves = summary.wins(Side::Werewolves),
        output = %config.output_dir.display(),
        "All games finished"
    );

    Ok(())
}
