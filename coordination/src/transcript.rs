//! Public and audit transcripts of a game.
//!
//! Private annotations are written in square brackets. The censored
//! transcript is what every player sees; the uncensored one keeps the
//! annotations for debugging. Both always have the same length and line
//! `i` of one corresponds to line `i` of the other.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static PRIVATE_ANNOTATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]").unwrap());

/// Remove every `[...]` annotation from a line.
pub fn censor(line: &str) -> String {
    PRIVATE_ANNOTATION.replace_all(line, "").into_owned()
}

/// Wrap text in the private-annotation brackets.
///
/// Closing brackets inside the text are dropped so the annotation cannot
/// end early and leak its tail into the censored view.
pub fn bracket(text: &str) -> String {
    format!("[{}]", text.replace(']', ""))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    #[serde(rename = "conversation_history")]
    censored: Vec<String>,
    #[serde(rename = "conversation_history_uncensored")]
    uncensored: Vec<String>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a narrator or system line, identical in both views.
    pub fn push_event(&mut self, text: &str) {
        self.censored.push(text.to_string());
        self.uncensored.push(text.to_string());
    }

    /// Record a player line.
    pub fn push_utterance(&mut self, censored: &str, uncensored: &str) {
        self.censored.push(censored.to_string());
        self.uncensored.push(uncensored.to_string());
    }

    pub fn censored(&self) -> &[String] {
        &self.censored
    }

    pub fn uncensored(&self) -> &[String] {
        &self.uncensored
    }

    pub fn len(&self) -> usize {
        self.censored.len()
    }

    pub fn is_empty(&self) -> bool {
        self.censored.is_empty()
    }
}
