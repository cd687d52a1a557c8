//! Prompt templates and their variables
//!
//! Templates use `{name}` placeholders for the four step variables:
//! `tool_descriptions`, `tool_names`, `input` and `agent_scratchpad`.
//! Substitution is a single pass, so text inside a variable (model output in
//! the scratchpad, say) is never itself treated as a placeholder.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::react::Variant;

/// Default template for the conversational pipeline
pub const CONVERSATIONAL_TEMPLATE: &str = r#"Assistant is a helpful conversational agent that can use tools.

TOOLS:
------
Assistant has access to the following tools:

{tool_descriptions}

To use a tool, use the following format:

Thought: Do I need to use a tool? Yes
Action: the action to take, should be one of [{tool_names}]
Action Input: the input to the action
Observation: the result of the action

When you have a response for the Human, or if you do not need to use a tool, you MUST use the format:

Thought: Do I need to use a tool? No
AI: [your response here]

Begin!

New input: {input}
{agent_scratchpad}"#;

/// Default template for the plain pipeline
pub const PLAIN_TEMPLATE: &str = r#"Answer the following question as best you can. You have access to the following tools:

{tool_descriptions}

Use the following format:

Question: the input question you must answer
Thought: you should always think about what to do
Action: the action to take, should be one of [{tool_names}]
Action Input: the input to the action
Observation: the result of the action
... (this Thought/Action/Action Input/Observation can repeat N times)
Thought: I now know the final answer
Final Answer: the final answer to the original input question
Positivity: how confident you are in the final answer, from 0 to 10

If no tool is needed, write "Action: None" and give the Final Answer directly.

Begin!

Question: {input}
{agent_scratchpad}"#;

/// Named variables substituted into a template
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PromptVars {
    pub tool_descriptions: String,
    pub tool_names: String,
    pub input: String,
    pub agent_scratchpad: String,
}

impl PromptVars {
    pub fn get(&self, name: &str) -> Option<&str> {
        match name {
            "tool_descriptions" => Some(&self.tool_descriptions),
            "tool_names" => Some(&self.tool_names),
            "input" => Some(&self.input),
            "agent_scratchpad" => Some(&self.agent_scratchpad),
            _ => None,
        }
    }
}

/// A prompt template with `{variable}` placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    text: String,
}

impl PromptTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// The built-in template for a pipeline
    pub fn for_variant(variant: Variant) -> Self {
        match variant {
            Variant::Conversational => Self::new(CONVERSATIONAL_TEMPLATE),
            Variant::Plain => Self::new(PLAIN_TEMPLATE),
        }
    }

    /// Load a template from a file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read prompt template: {}", path.display()))?;
        Ok(Self::new(text))
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Substitute known placeholders; unknown `{...}` text is kept as written
    pub fn render(&self, vars: &PromptVars) -> String {
        let mut out = String::with_capacity(self.text.len() + vars.agent_scratchpad.len());
        let mut rest = self.text.as_str();

        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let tail = &rest[start..];

            let substituted = tail
                .find('}')
                .and_then(|end| vars.get(&tail[1..end]).map(|value| (end, value)));

            match substituted {
                Some((end, value)) => {
                    out.push_str(value);
                    rest = &tail[end + 1..];
                },
                None => {
                    out.push('{');
                    rest = &tail[1..];
                },
            }
        }

        out.push_str(rest);
        out
    }
}
