//! Persisted step history for a conversation
//!
//! The caller owns the loop: after an action decision it runs the tool and
//! reports the observation, which turns the pending action into a
//! [`PriorStep`]. Histories are stored as pretty-printed JSON.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{HISTORY_DIR, PROJECT_DIR};
use crate::react::{Decision, PriorStep};
use crate::tools::ToolRef;

/// An action that was decided but whose observation has not come back yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAction {
    pub thought: String,
    pub tool: ToolRef,
    pub input: String,
}

/// Ordered prior steps plus at most one pending action
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    steps: Vec<PriorStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pending: Option<PendingAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default location for a conversation's history (.react-step/history/<id>.json)
    pub fn path_for(conversation: &str) -> PathBuf {
        Path::new(PROJECT_DIR)
            .join(HISTORY_DIR)
            .join(format!("{}.json", conversation))
    }

    pub fn steps(&self) -> &[PriorStep] {
        &self.steps
    }

    pub fn pending(&self) -> Option<&PendingAction> {
        self.pending.as_ref()
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn push(&mut self, step: PriorStep) {
        self.steps.push(step);
        self.touch();
    }

    /// Remember an action decision until its observation arrives.
    /// An answer ends the exchange and clears anything pending.
    pub fn record_decision(&mut self, decision: &Decision) {
        self.pending = match decision {
            Decision::Action {
                thought,
                tool,
                input,
            } => Some(PendingAction {
                thought: thought.clone(),
                tool: tool.clone(),
                input: input.clone(),
            }),
            Decision::Answer { .. } => None,
        };
        self.touch();
    }

    /// Complete the pending action with the tool's observation
    pub fn record_observation(&mut self, observation: impl Into<String>) -> Result<&PriorStep> {
        let pending = self
            .pending
            .take()
            .context("No pending action to attach an observation to")?;

        self.push(PriorStep::new(
            pending.thought,
            pending.tool,
            pending.input,
            observation,
        ));
        self.steps.last().context("History unexpectedly empty")
    }

    fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }

    /// Save history to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create history file: {}", path.display()))?;
        serde_json::to_writer_pretty(file, self)
            .with_context(|| format!("Failed to write history: {}", path.display()))
    }

    /// Load history from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open history file: {}", path.display()))?;
        serde_json::from_reader(file)
            .with_context(|| format!("Failed to parse history: {}", path.display()))
    }

    /// Load history, starting fresh if the file does not exist yet
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::new())
        }
    }
}
