//! In-memory tool registry loaded from a TOML manifest
//!
//! ```toml
//! [[tool]]
//! id = "search"
//! name_for_model = "web_search"
//! name_for_human = "Web Search"
//! description_for_model = "Search the web. Input is the query."
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use super::{StepContext, ToolDescriptor, ToolRegistry};

#[derive(Debug, Default, Deserialize)]
struct Manifest {
    #[serde(default, rename = "tool")]
    tools: Vec<ToolDescriptor>,
}

/// Ordered set of tool descriptors keyed by id and model-facing name
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    tools: Vec<ToolDescriptor>,
}

impl ToolCatalog {
    pub fn empty() -> Self {
        Self { tools: Vec::new() }
    }

    /// Build a catalog, rejecting duplicate ids or model-facing names
    pub fn new(tools: Vec<ToolDescriptor>) -> Result<Self> {
        let mut catalog = Self::empty();
        for tool in tools {
            catalog.register(tool)?;
        }
        Ok(catalog)
    }

    /// Add a tool. An empty id falls back to the model-facing name.
    pub fn register(&mut self, mut tool: ToolDescriptor) -> Result<()> {
        if tool.name_for_model.trim().is_empty() {
            anyhow::bail!("Tool '{}' has an empty name_for_model", tool.name_for_human);
        }
        if tool.id.is_empty() {
            tool.id = tool.name_for_model.clone();
        }
        if self.get(&tool.id).is_some() {
            anyhow::bail!("Duplicate tool id: {}", tool.id);
        }
        if self
            .tools
            .iter()
            .any(|t| t.name_for_model == tool.name_for_model)
        {
            anyhow::bail!("Duplicate tool name_for_model: {}", tool.name_for_model);
        }
        self.tools.push(tool);
        Ok(())
    }

    /// Parse a catalog from manifest text
    pub fn from_toml(content: &str) -> Result<Self> {
        let manifest: Manifest = toml::from_str(content).context("Failed to parse tool manifest")?;
        Self::new(manifest.tools)
    }

    /// Load a catalog from a manifest file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read tool manifest: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Invalid tool manifest: {}", path.display()))
    }

    pub fn get(&self, id: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.iter()
    }

    /// Tools for the given identifiers, in the order they were enabled.
    /// Unknown identifiers are skipped and repeats are collapsed.
    pub fn select(&self, enabled: &[String]) -> Vec<ToolDescriptor> {
        let mut selected: Vec<ToolDescriptor> = Vec::with_capacity(enabled.len());
        for id in enabled {
            match self.get(id) {
                Some(tool) if selected.iter().any(|t| t.id == tool.id) => {},
                Some(tool) => selected.push(tool.clone()),
                None => warn!("Enabled tool '{}' is not in the catalog", id),
            }
        }
        selected
    }
}

#[async_trait]
impl ToolRegistry for ToolCatalog {
    async fn active_tools(
        &self,
        _context: &StepContext,
        enabled: &[String],
    ) -> Result<Vec<ToolDescriptor>> {
        Ok(self.select(enabled))
    }
}
