//! ReAct step core: scratchpad rendering and completion parsing

mod parser;
pub mod rules;
mod scratchpad;

use serde::{Deserialize, Serialize};

pub use parser::{
    parse, parse_with_outcome, AnswerMarker, Decision, Outcome, ParsePolicy, EARLY_ANSWER_THRESHOLD,
};
pub use scratchpad::{render, render_with, PriorStep, FENCE_LINE_THRESHOLD, THOUGHT_CUE};

/// Which of the two sibling pipelines a step runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Chat-style: answers follow `AI:`, unresolved tools always fail
    #[default]
    Conversational,
    /// Answers follow `Final Answer:`, with early-answer and fallback rules
    Plain,
}

impl Variant {
    pub fn policy(&self) -> ParsePolicy {
        match self {
            Self::Conversational => ParsePolicy::CONVERSATIONAL,
            Self::Plain => ParsePolicy::PLAIN,
        }
    }
}
