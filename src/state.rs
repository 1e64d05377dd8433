//! Bot profile and per-session conversation state.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Immutable bot attributes (`<bot name="name"/>`, `<bot name="age"/>`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BotProfile {
    attributes: HashMap<String, String>,
}

impl BotProfile {
    pub fn new<K, V>(attributes: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        BotProfile { attributes: attributes.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// Mutable state of one conversation.
///
/// `variables` is written by `<set>` and read by `<get>`/`<condition>`.
/// `wildcard_captures` mirrors the winning top-level match of the last
/// `resolve`. `last_wildcard` is request-wide: every match that captured
/// something overwrites it, including matches reached through `<srai>`/`<sr>`.
/// `previous_answer` feeds `<that>` matching on the next turn.
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    variables: HashMap<String, String>,
    wildcard_captures: Vec<String>,
    last_wildcard: String,
    previous_answer: String,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_variables(variables: HashMap<String, String>) -> Self {
        ConversationState { variables, ..Self::default() }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.variables.remove(name)
    }

    pub fn variables(&self) -> &HashMap<String, String> {
        &self.variables
    }

    pub fn wildcard_captures(&self) -> &[String] {
        &self.wildcard_captures
    }

    /// Last capture of the most recent match in the current request that
    /// captured anything, or empty. This is what `<star/>` and `<sr/>` read.
    pub fn last_wildcard(&self) -> &str {
        &self.last_wildcard
    }

    pub(crate) fn set_wildcard_captures(&mut self, captures: Vec<String>) {
        self.note_wildcards(&captures);
        self.wildcard_captures = captures;
    }

    /// Record the captures of a nested match. A match without captures leaves
    /// the last wildcard untouched.
    pub(crate) fn note_wildcards(&mut self, captures: &[String]) {
        if let Some(last) = captures.last() {
            self.last_wildcard.clone_from(last);
        }
    }

    pub(crate) fn clear_wildcard_captures(&mut self) {
        self.wildcard_captures.clear();
        self.last_wildcard.clear();
    }

    pub fn previous_answer(&self) -> &str {
        &self.previous_answer
    }

    pub fn set_previous_answer(&mut self, answer: impl Into<String>) {
        self.previous_answer = answer.into();
    }
}

/// Minimum state needed to resume a conversation with identical matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub previous_answer: String,
    pub variables: BTreeMap<String, String>,
    pub saved_at: DateTime<Utc>,
}

impl SessionSnapshot {
    pub fn capture(state: &ConversationState) -> Self {
        SessionSnapshot {
            previous_answer: state.previous_answer.clone(),
            variables: state.variables.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            saved_at: Utc::now(),
        }
    }

    /// Rebuild a fresh state from this snapshot. Captures are not persisted.
    pub fn into_state(self) -> ConversationState {
        ConversationState {
            variables: self.variables.into_iter().collect(),
            wildcard_captures: Vec::new(),
            last_wildcard: String::new(),
            previous_answer: self.previous_answer,
        }
    }

    pub fn read_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Snapshot { path: path.to_path_buf(), reason: e.to_string() })?;
        serde_json::from_str(&text).map_err(|e| Error::Snapshot { path: path.to_path_buf(), reason: e.to_string() })
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Snapshot { path: path.to_path_buf(), reason: e.to_string() })?;
        std::fs::write(path, text).map_err(|e| Error::Snapshot { path: path.to_path_buf(), reason: e.to_string() })
    }
}
