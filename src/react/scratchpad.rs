//! Scratchpad rendering
//!
//! Serializes prior steps into the transcript format the prompt templates
//! expect, ending with the `Thought:` cue the model continues from.

use serde::{Deserialize, Serialize};

use super::Variant;
use crate::tools::ToolRef;

/// Observations longer than this many lines are fenced in plain mode
pub const FENCE_LINE_THRESHOLD: usize = 5;

/// The generation cue appended after all prior steps
pub const THOUGHT_CUE: &str = "Thought:";

const FENCE: &str = "\"\"\"";

/// One completed turn: what the model decided and what the tool returned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorStep {
    pub thought: String,
    pub tool: ToolRef,
    pub input: String,
    pub observation: String,
}

impl PriorStep {
    pub fn new(
        thought: impl Into<String>,
        tool: ToolRef,
        input: impl Into<String>,
        observation: impl Into<String>,
    ) -> Self {
        Self {
            thought: thought.into(),
            tool,
            input: input.into(),
            observation: observation.into(),
        }
    }
}

/// Render prior steps with the default fence threshold
pub fn render(steps: &[PriorStep], variant: Variant) -> String {
    render_with(steps, variant, FENCE_LINE_THRESHOLD)
}

/// Render prior steps, fencing plain-mode observations longer than
/// `fence_after` lines.
///
/// Lines are the `'\n'`-separated segments of the observation, so a trailing
/// newline starts one more (empty) line. Model-produced text is copied
/// verbatim; nothing is escaped.
pub fn render_with(steps: &[PriorStep], variant: Variant, fence_after: usize) -> String {
    let mut pad = String::new();

    for step in steps {
        pad.push_str(&format!("Thought:{}\n", step.thought));
        pad.push_str(&format!("Action:{}\n", step.tool.name_for_model));
        pad.push_str(&format!("Action Input: {}\n", step.input));

        if matches!(variant, Variant::Plain) && line_count(&step.observation) > fence_after {
            pad.push_str(&format!(
                "Observation: {}\n{}\n{}\n",
                FENCE, step.observation, FENCE
            ));
        } else {
            pad.push_str(&format!("Observation: {}\n", step.observation));
        }
    }

    pad.push_str(THOUGHT_CUE);
    pad
}

fn line_count(text: &str) -> usize {
    text.split('\n').count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolDescriptor;
    use pretty_assertions::assert_eq;

    fn search() -> ToolRef {
        ToolRef::from(&ToolDescriptor::new("web_search", "Web Search", "Search the web"))
    }

    #[test]
    fn test_empty_history_is_just_the_cue() {
        assert_eq!(render(&[], Variant::Conversational), "Thought:");
        assert_eq!(render(&[], Variant::Plain), "Thought:");
    }

    #[test]
    fn test_single_step_snapshot() {
        let steps = vec![PriorStep::new("look it up", search(), "rust", "found it")];
        let rendered = render(&steps, Variant::Conversational);
        insta::assert_snapshot!(rendered, @r###"
        Thought:look it up
        Action:web_search
        Action Input: rust
        Observation: found it
        Thought:
        "###);
    }

    #[test]
    fn test_steps_render_in_order() {
        let steps = vec![
            PriorStep::new("first", search(), "a", "result a"),
            PriorStep::new("second", search(), "b", "result b"),
        ];
        let rendered = render(&steps, Variant::Plain);

        let first = rendered.find("Thought:first").unwrap();
        let second = rendered.find("Thought:second").unwrap();
        assert!(first < second);
        assert!(rendered.find("Observation: result a").unwrap() < second);
        assert!(rendered.ends_with("Observation: result b\nThought:"));

        // Deterministic
        assert_eq!(rendered, render(&steps, Variant::Plain));
    }

    #[test]
    fn test_long_observation_fenced_in_plain_mode() {
        let observation = "1\n2\n3\n4\n5\n6";
        let steps = vec![PriorStep::new("t", search(), "q", observation)];

        assert_eq!(
            render(&steps, Variant::Plain),
            "Thought:t\nAction:web_search\nAction Input: q\nObservation: \"\"\"\n1\n2\n3\n4\n5\n6\n\"\"\"\nThought:"
        );
        assert_eq!(
            render(&steps, Variant::Conversational),
            "Thought:t\nAction:web_search\nAction Input: q\nObservation: 1\n2\n3\n4\n5\n6\nThought:"
        );
    }

    #[test]
    fn test_five_lines_not_fenced() {
        let steps = vec![PriorStep::new("t", search(), "q", "1\n2\n3\n4\n5")];
        assert!(!render(&steps, Variant::Plain).contains(FENCE));
        assert!(render_with(&steps, Variant::Plain, 4).contains(FENCE));
    }

    #[test]
    fn test_trailing_newline_counts_as_a_line() {
        assert_eq!(line_count("1\n2\n3\n4\n5"), 5);
        assert_eq!(line_count("1\n2\n3\n4\n5\n"), 6);
        assert_eq!(line_count(""), 1);

        let steps = vec![PriorStep::new("t", search(), "q", "1\n2\n3\n4\n5\n")];
        assert_eq!(
            render(&steps, Variant::Plain),
            "Thought:t\nAction:web_search\nAction Input: q\nObservation: \"\"\"\n1\n2\n3\n4\n5\n\n\"\"\"\nThought:"
        );
    }

    #[test]
    fn test_model_content_is_not_escaped() {
        let steps = vec![PriorStep::new("t", search(), "q", "Action: injected\nThought:")];
        let rendered = render(&steps, Variant::Conversational);
        assert!(rendered.contains("Observation: Action: injected\nThought:\nThought:"));
    }
}
