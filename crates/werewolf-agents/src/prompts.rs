//! Prompt templates loaded from a directory.

use std::path::{Path, PathBuf};

use werewolf_coordination::{BuiltinPrompts, GameError, PromptSource, VillageResult};

/// Reads `<dir>/<name>.txt`, or the `content` field of `<dir>/<name>.json`,
/// and falls back to the built-in template when neither file exists.
#[derive(Debug, Clone)]
pub struct TemplateDir {
    dir: PathBuf,
}

impl TemplateDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read(&self, name: &str, path: &Path) -> VillageResult<String> {
        std::fs::read_to_string(path).map_err(|e| GameError::Template {
            name: name.to_string(),
            reason: format!("{}: {e}", path.display()),
        })
    }
}

impl PromptSource for TemplateDir {
    fn load(&self, name: &str) -> VillageResult<String> {
        let txt = self.dir.join(format!("{name}.txt"));
        if txt.is_file() {
            tracing::debug!(template = name, path = %txt.display(), "Loaded prompt template");
            return Ok(self.read(name, &txt)?.trim_end().to_string());
        }

        let json = self.dir.join(format!("{name}.json"));
        if json.is_file() {
            let text = self.read(name, &json)?;
            let value: serde_json::Value =
                serde_json::from_str(&text).map_err(|e| GameError::Template {
                    name: name.to_string(),
                    reason: format!("{}: {e}", json.display()),
                })?;
            let content = value["content"].as_str().ok_or_else(|| GameError::Template {
                name: name.to_string(),
                reason: format!("{} has no string 'content' field", json.display()),
            })?;
            tracing::debug!(template = name, path = %json.display(), "Loaded prompt template");
            return Ok(content.to_string());
        }

        BuiltinPrompts.load(name)
    }
}
