//! Tool descriptors and the registry seam
//!
//! Tools are executed by the caller, never by this crate. What lives here is
//! how tools are described to the model and how the names it emits are
//! resolved back to descriptors.

mod catalog;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use catalog::ToolCatalog;

fn default_display() -> bool {
    true
}

/// An invocable capability as advertised by a registry.
///
/// `name_for_model` is the identity: it is what the model sees in prompts and
/// what parsed actions are matched against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Registry identifier, referenced by the enabled tool list
    #[serde(default)]
    pub id: String,
    pub name_for_model: String,
    pub name_for_human: String,
    #[serde(default)]
    pub description_for_human: String,
    pub description_for_model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default = "default_display")]
    pub display: bool,
    /// Where the caller dispatches invocations; never surfaced in decisions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl ToolDescriptor {
    pub fn new(
        name_for_model: impl Into<String>,
        name_for_human: impl Into<String>,
        description_for_model: impl Into<String>,
    ) -> Self {
        let name_for_model = name_for_model.into();
        Self {
            id: name_for_model.clone(),
            name_for_model,
            name_for_human: name_for_human.into(),
            description_for_human: String::new(),
            description_for_model: description_for_model.into(),
            logo_url: None,
            display: true,
            endpoint: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_description_for_human(mut self, description: impl Into<String>) -> Self {
        self.description_for_human = description.into();
        self
    }

    pub fn with_logo(mut self, logo_url: impl Into<String>) -> Self {
        self.logo_url = Some(logo_url.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.display = false;
        self
    }

    /// Line used for this tool in the `tool_descriptions` prompt variable
    pub fn prompt_line(&self) -> String {
        format!("{}: {}", self.name_for_model, self.description_for_model)
    }
}

/// The consumer-facing projection of a [`ToolDescriptor`].
///
/// Decisions and prior steps only ever carry this, so registry-internal
/// fields like the dispatch endpoint stay inside the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolRef {
    pub name_for_model: String,
    pub name_for_human: String,
    pub description_for_human: String,
    pub description_for_model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    pub display: bool,
}

impl From<&ToolDescriptor> for ToolRef {
    fn from(tool: &ToolDescriptor) -> Self {
        Self {
            name_for_model: tool.name_for_model.clone(),
            name_for_human: tool.name_for_human.clone(),
            description_for_human: tool.description_for_human.clone(),
            description_for_model: tool.description_for_model.clone(),
            logo_url: tool.logo_url.clone(),
            display: tool.display,
        }
    }
}

/// Per-step context handed to the registry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepContext {
    pub conversation: String,
    /// Zero-based index of the step within the conversation
    pub step: usize,
}

impl StepContext {
    pub fn new(conversation: impl Into<String>, step: usize) -> Self {
        Self {
            conversation: conversation.into(),
            step,
        }
    }
}

/// Source of the tools active for a step.
///
/// The returned order is authoritative: it is the order tools appear in the
/// prompt.
#[async_trait]
pub trait ToolRegistry: Send + Sync {
    async fn active_tools(
        &self,
        context: &StepContext,
        enabled: &[String],
    ) -> Result<Vec<ToolDescriptor>>;
}

/// Resolve a parsed action against the active tools by exact model-facing name
pub fn resolve<'a>(tools: &'a [ToolDescriptor], name: &str) -> Option<&'a ToolDescriptor> {
    tools.iter().find(|tool| tool.name_for_model == name)
}

/// Newline-joined tool descriptions for the prompt
pub fn tool_descriptions(tools: &[ToolDescriptor]) -> String {
    tools
        .iter()
        .map(ToolDescriptor::prompt_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Comma-joined model-facing names for the prompt
pub fn tool_names(tools: &[ToolDescriptor]) -> String {
    tools
        .iter()
        .map(|tool| tool.name_for_model.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
