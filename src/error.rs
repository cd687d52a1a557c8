//! Errors surfaced to the caller of a step

use thiserror::Error;

/// Failures that end a step without a decision.
///
/// Malformed completions are not in here: they degrade to an answer.
#[derive(Debug, Error)]
pub enum StepError {
    /// The model named a tool that is not in the active set
    #[error("Tool not found: {name}")]
    ToolNotFound { name: String },

    /// The model invocation failed; passed through untouched
    #[error(transparent)]
    Model(anyhow::Error),

    /// The tool registry could not produce the active tool set
    #[error(transparent)]
    Registry(anyhow::Error),
}

impl StepError {
    pub fn is_tool_not_found(&self) -> bool {
        matches!(self, Self::ToolNotFound { .. })
    }
}
