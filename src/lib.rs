//! react-step - drive one step of a ReAct-style agent loop
//!
//! A step renders the prior (thought, action, input, observation) turns into a
//! scratchpad, asks a language model for one completion, and parses the free
//! text into a [`Decision`]: invoke a tool, or answer.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use react_step::{
//!     Decision, GenaiModel, StepContext, StepRunner, StepRuntimeConfig, ToolCatalog,
//!     ToolDescriptor, Variant,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = StepRuntimeConfig::default();
//!     let catalog = ToolCatalog::new(vec![ToolDescriptor::new(
//!         "web_search",
//!         "Web Search",
//!         "Search the web. Input is the query.",
//!     )])?;
//!
//!     let runner = StepRunner::new(
//!         Variant::Plain,
//!         config.clone(),
//!         Arc::new(GenaiModel::new(&config)),
//!         Arc::new(catalog),
//!     );
//!
//!     let decision = runner
//!         .run(
//!             &StepContext::new("demo", 0),
//!             &[],
//!             &["web_search".to_string()],
//!             "What's the weather in Paris?",
//!         )
//!         .await?;
//!
//!     match decision {
//!         Decision::Action { tool, input, .. } => println!("call {} with {}", tool.name_for_model, input),
//!         Decision::Answer { text } => println!("{}", text),
//!     }
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod history;
mod llm;
mod prompts;
mod react;
mod tools;

// Re-export the public API
pub use config::{StepRuntimeConfig, HISTORY_DIR, PROJECT_DIR};
pub use error::StepError;
pub use history::{History, PendingAction};
pub use llm::{
    CompletionModel, Credential, GenaiModel, PromptRequest, StepObserver, StepRunner,
    TracingObserver,
};
pub use prompts::{PromptTemplate, PromptVars, CONVERSATIONAL_TEMPLATE, PLAIN_TEMPLATE};
pub use react::{
    parse, parse_with_outcome, render, render_with, rules, AnswerMarker, Decision, Outcome,
    ParsePolicy, PriorStep, Variant, EARLY_ANSWER_THRESHOLD, FENCE_LINE_THRESHOLD, THOUGHT_CUE,
};
pub use tools::{
    resolve, tool_descriptions, tool_names, StepContext, ToolCatalog, ToolDescriptor, ToolRef,
    ToolRegistry,
};

#[cfg(feature = "cli")]
pub use config::{
    AuthMethod, Config, GeneralConfig, ModelConfig, ParserConfig, PromptsConfig, ToolsConfig,
};
