//! Completion parsing
//!
//! Both pipelines run the same state machine, parameterized by a
//! [`ParsePolicy`]:
//!
//! ```text
//! Start ─ positivity ≥ threshold & answer ──────────────▶ EarlyAnswer   (early-answer policies only)
//!   │
//!   ├─ thought & action ─┬─ tool resolves ──────────────▶ Action
//!   │                    ├─ unresolved, answer, lenient ─▶ FallbackAnswer
//!   │                    └─ unresolved otherwise ───────▶ Error(ToolNotFound)
//!   │
//!   └─ anything else ───────────────────────────────────▶ PlainAnswer
//! ```
//!
//! Malformed completions never fail: they fall through to `PlainAnswer`.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::rules::{self, Rule};
use crate::error::StepError;
use crate::tools::{resolve, ToolDescriptor, ToolRef};

/// Default positivity score at or above which a final answer preempts actions
pub const EARLY_ANSWER_THRESHOLD: f64 = 9.0;

/// The marker a variant's final answer follows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerMarker {
    /// `AI:`
    Ai,
    /// `Final Answer:`
    FinalAnswer,
}

impl AnswerMarker {
    fn rule(&self) -> &'static Rule {
        match self {
            Self::Ai => &rules::AI_ANSWER,
            Self::FinalAnswer => &rules::FINAL_ANSWER,
        }
    }
}

/// Knobs distinguishing the conversational and plain parsers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsePolicy {
    /// Fail on an unresolved tool even when a final answer is available
    pub strict_tool_resolution: bool,
    /// Let a confident final answer preempt any action
    pub supports_early_answer: bool,
    /// Treat actions containing `None` as no action
    pub rejects_none_action: bool,
    pub answer_marker: AnswerMarker,
    pub early_answer_threshold: f64,
}

impl ParsePolicy {
    pub const CONVERSATIONAL: Self = Self {
        strict_tool_resolution: true,
        supports_early_answer: false,
        rejects_none_action: false,
        answer_marker: AnswerMarker::Ai,
        early_answer_threshold: EARLY_ANSWER_THRESHOLD,
    };

    pub const PLAIN: Self = Self {
        strict_tool_resolution: false,
        supports_early_answer: true,
        rejects_none_action: true,
        answer_marker: AnswerMarker::FinalAnswer,
        early_answer_threshold: EARLY_ANSWER_THRESHOLD,
    };

    pub fn with_early_answer_threshold(mut self, threshold: f64) -> Self {
        self.early_answer_threshold = threshold;
        self
    }
}

/// The single next move produced by parsing one completion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Decision {
    /// Invoke `tool` with `input`
    Action {
        thought: String,
        tool: ToolRef,
        input: String,
    },
    /// Stop with a final answer (possibly empty)
    Answer { text: String },
}

impl Decision {
    pub fn answer(text: impl Into<String>) -> Self {
        Self::Answer { text: text.into() }
    }

    pub fn is_action(&self) -> bool {
        matches!(self, Self::Action { .. })
    }

    /// The answer text, if this is an answer
    pub fn answer_text(&self) -> Option<&str> {
        match self {
            Self::Answer { text } => Some(text),
            Self::Action { .. } => None,
        }
    }
}

/// Which terminal state produced a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    EarlyAnswer,
    Action,
    FallbackAnswer,
    PlainAnswer,
}

/// Parse a completion into a decision
pub fn parse(
    completion: &str,
    tools: &[ToolDescriptor],
    policy: &ParsePolicy,
) -> Result<Decision, StepError> {
    parse_with_outcome(completion, tools, policy).map(|(_, decision)| decision)
}

/// Parse a completion, also reporting which terminal state was reached
pub fn parse_with_outcome(
    completion: &str,
    tools: &[ToolDescriptor],
    policy: &ParsePolicy,
) -> Result<(Outcome, Decision), StepError> {
    // Always extracted up front: it feeds the early answer, the fallback and
    // the plain answer alike.
    let answer = rules::extract(policy.answer_marker.rule(), completion).unwrap_or_default();

    if policy.supports_early_answer && !answer.is_empty() {
        if let Some(score) = rules::positivity(completion) {
            if score >= policy.early_answer_threshold {
                debug!("Early answer with positivity {}", score);
                return Ok((Outcome::EarlyAnswer, Decision::answer(answer)));
            }
        }
    }

    let thought = rules::THOUGHT
        .capture(completion)
        .map(rules::normalize)
        .unwrap_or_default();
    let action = rules::ACTION
        .capture(completion)
        .map(rules::normalize)
        .filter(|action| !action.is_empty())
        .filter(|action| !(policy.rejects_none_action && action.contains("None")));

    if let Some(action) = action.filter(|_| !thought.is_empty()) {
        let input = rules::ACTION_INPUT
            .capture(completion)
            .map(rules::normalize)
            .unwrap_or_default();

        return match resolve(tools, action) {
            Some(tool) => {
                debug!("Resolved action '{}'", tool.name_for_model);
                Ok((
                    Outcome::Action,
                    Decision::Action {
                        thought: thought.to_string(),
                        tool: ToolRef::from(tool),
                        input: input.to_string(),
                    },
                ))
            },
            None if !policy.strict_tool_resolution && !answer.is_empty() => {
                warn!("Tool '{}' not found, falling back to final answer", action);
                Ok((Outcome::FallbackAnswer, Decision::answer(answer)))
            },
            None => Err(StepError::ToolNotFound {
                name: action.to_string(),
            }),
        };
    }

    Ok((Outcome::PlainAnswer, Decision::answer(answer)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tools() -> Vec<ToolDescriptor> {
        vec![
            ToolDescriptor::new("web_search", "Web Search", "Search the web")
                .with_endpoint("http://internal/search"),
            ToolDescriptor::new("calculator", "Calculator", "Do math"),
        ]
    }

    fn conversational(text: &str) -> Result<(Outcome, Decision), StepError> {
        parse_with_outcome(text, &tools(), &ParsePolicy::CONVERSATIONAL)
    }

    fn plain(text: &str) -> Result<(Outcome, Decision), StepError> {
        parse_with_outcome(text, &tools(), &ParsePolicy::PLAIN)
    }

    fn expect_action(decision: Decision) -> (String, ToolRef, String) {
        match decision {
            Decision::Action {
                thought,
                tool,
                input,
            } => (thought, tool, input),
            other => panic!("Expected action, got {:?}", other),
        }
    }

    #[test]
    fn test_well_formed_action() {
        let text = "I should search.\nAction: web_search\nAction Input: weather today\n";
        for policy in [ParsePolicy::CONVERSATIONAL, ParsePolicy::PLAIN] {
            let (outcome, decision) = parse_with_outcome(text, &tools(), &policy).unwrap();
            assert_eq!(outcome, Outcome::Action);
            let (thought, tool, input) = expect_action(decision);
            assert_eq!(thought, "I should search.");
            assert_eq!(tool, ToolRef::from(&tools()[0]));
            assert_eq!(input, "weather today");
        }
    }

    #[test]
    fn test_action_and_input_quotes_stripped_once() {
        let text = "Let me compute.\nAction: \"calculator\"\nAction Input: '\"2 + 2\"'";
        let (_, decision) = conversational(text).unwrap();
        let (_, tool, input) = expect_action(decision);
        assert_eq!(tool.name_for_model, "calculator");
        assert_eq!(input, "\"2 + 2\"");

        let text = "Quote it.\nAction: web_search\nAction Input: \"it's\"";
        let (_, _, input) = expect_action(conversational(text).unwrap().1);
        assert_eq!(input, "it's");
    }

    #[test]
    fn test_thought_quotes_stripped_once() {
        let (_, decision) = conversational("\"I should search.\"\nAction: web_search").unwrap();
        let (thought, tool, input) = expect_action(decision);
        assert_eq!(thought, "I should search.");
        assert_eq!(tool.name_for_model, "web_search");
        assert_eq!(input, "");

        let (_, decision) = plain("\"\"twice\"\"\nAction: web_search\nAction Input: q").unwrap();
        assert_eq!(expect_action(decision).0, "\"twice\"");
    }

    #[test]
    fn test_conversational_ai_answer() {
        let (outcome, decision) = conversational("AI: The capital of France is Paris.").unwrap();
        assert_eq!(outcome, Outcome::PlainAnswer);
        assert_eq!(decision, Decision::answer("The capital of France is Paris."));
    }

    #[test]
    fn test_conversational_without_markers_is_empty_answer() {
        let (outcome, decision) = conversational("I am not sure what to do").unwrap();
        assert_eq!(outcome, Outcome::PlainAnswer);
        assert_eq!(decision.answer_text(), Some(""));

        assert_eq!(conversational("").unwrap().1, Decision::answer(""));
    }

    #[test]
    fn test_action_without_thought_is_answer() {
        let text = "Action: web_search\nAction Input: rust\nAI: fine";
        let (outcome, decision) = conversational(text).unwrap();
        assert_eq!(outcome, Outcome::PlainAnswer);
        assert_eq!(decision, Decision::answer("fine"));
    }

    #[test]
    fn test_unknown_tool_is_fatal() {
        let text = "Thought: try tool\nAction: unknown_tool\nAction Input: x";
        for result in [conversational(text), plain(text)] {
            match result {
                Err(StepError::ToolNotFound { name }) => assert_eq!(name, "unknown_tool"),
                other => panic!("Expected ToolNotFound, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_conversational_strict_even_with_answer() {
        let text = "Thinking\nAction: unknown_tool\nAction Input: x\nAI: here you go";
        assert!(matches!(
            conversational(text),
            Err(StepError::ToolNotFound { .. })
        ));
    }

    #[test]
    fn test_plain_falls_back_to_final_answer() {
        let text = "Final Answer: It is sunny.\nThought: double check\nAction: unknown_tool\nAction Input: x";
        let (outcome, decision) = plain(text).unwrap();
        assert_eq!(outcome, Outcome::FallbackAnswer);
        assert_eq!(decision, Decision::answer("It is sunny."));
    }

    #[test]
    fn test_early_answer_preempts_action() {
        let (outcome, decision) = plain("Final Answer: Done.\nPositivity: 9.5").unwrap();
        assert_eq!(outcome, Outcome::EarlyAnswer);
        assert_eq!(decision, Decision::answer("Done."));

        let text = "Final Answer: Done.\nPositivity: 9\nThought: still search\nAction: web_search\nAction Input: more";
        let (outcome, decision) = plain(text).unwrap();
        assert_eq!(outcome, Outcome::EarlyAnswer);
        assert_eq!(decision, Decision::answer("Done."));
    }

    #[test]
    fn test_positivity_with_trailing_text_is_early_answer() {
        for score in ["9/10", "9.5 (sure)"] {
            let text = format!(
                "Final Answer: Done.\nPositivity: {}\nThought: still search\nAction: web_search\nAction Input: more",
                score
            );
            let (outcome, decision) = plain(&text).unwrap();
            assert_eq!(outcome, Outcome::EarlyAnswer, "score {}", score);
            assert_eq!(decision, Decision::answer("Done."));
        }
    }

    #[test]
    fn test_low_positivity_lets_action_through() {
        let text = "Final Answer: Maybe.\nPositivity: 8.9\nThought: verify\nAction: web_search\nAction Input: more";
        let (outcome, decision) = plain(text).unwrap();
        assert_eq!(outcome, Outcome::Action);
        let (_, tool, input) = expect_action(decision);
        assert_eq!(tool.name_for_model, "web_search");
        assert_eq!(input, "more");
    }

    #[test]
    fn test_positivity_without_answer_does_not_short_circuit() {
        let text = "Final Answer:\nPositivity: 10";
        let (outcome, decision) = plain(text).unwrap();
        assert_eq!(outcome, Outcome::PlainAnswer);
        assert_eq!(decision, Decision::answer(""));
    }

    #[test]
    fn test_conversational_ignores_positivity() {
        let text = "Checking\nAction: calculator\nAction Input: 1+1\nPositivity: 10\nAI: 2";
        let (outcome, _) = conversational(text).unwrap();
        assert_eq!(outcome, Outcome::Action);
    }

    #[test]
    fn test_none_action_rejected_in_plain_mode() {
        let text = "Nothing to do\nAction: None\nAction Input: none\nFinal Answer: All set.";
        let (outcome, decision) = plain(text).unwrap();
        assert_eq!(outcome, Outcome::PlainAnswer);
        assert_eq!(decision, Decision::answer("All set."));

        // Conversational has no such guard
        assert!(matches!(
            conversational(text),
            Err(StepError::ToolNotFound { name }) if name == "None"
        ));
    }

    #[test]
    fn test_none_check_is_case_sensitive() {
        let text = "Nothing to do\nAction: none\nAction Input: x";
        assert!(matches!(plain(text), Err(StepError::ToolNotFound { .. })));
    }

    #[test]
    fn test_custom_threshold() {
        let policy = ParsePolicy::PLAIN.with_early_answer_threshold(7.0);
        let text = "Final Answer: ok\nPositivity: 7.5\nThought: t\nAction: web_search\nAction Input: q";
        let (outcome, _) = parse_with_outcome(text, &tools(), &policy).unwrap();
        assert_eq!(outcome, Outcome::EarlyAnswer);
    }

    #[test]
    fn test_decision_serialization() {
        let (_, decision) =
            conversational("Search\nAction: web_search\nAction Input: rust").unwrap();
        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(json["type"], "action");
        assert_eq!(json["tool"]["name_for_model"], "web_search");
        assert!(json["tool"].get("endpoint").is_none());

        let json = serde_json::to_value(Decision::answer("done")).unwrap();
        assert_eq!(json, serde_json::json!({"type": "answer", "text": "done"}));
    }
}
