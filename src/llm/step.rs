//! One agent step, end to end
//!
//! registry → scratchpad → template → model → parser. The model call is the
//! only await point that matters; there is no retry and no shared state, so a
//! runner can serve any number of conversations concurrently. Steps of the
//! same conversation must still be run one after another by the caller.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use tracing::{debug, info};

use super::model::{CompletionModel, Credential, PromptRequest};
use super::observer::{StepObserver, TracingObserver};
use crate::config::StepRuntimeConfig;
use crate::error::StepError;
use crate::prompts::{PromptTemplate, PromptVars};
use crate::react::{self, Decision, Outcome, ParsePolicy, PriorStep, Variant};
use crate::tools::{tool_descriptions, tool_names, StepContext, ToolDescriptor, ToolRegistry};

/// Runs single ReAct steps for one pipeline variant
pub struct StepRunner {
    variant: Variant,
    config: StepRuntimeConfig,
    template: PromptTemplate,
    model: Arc<dyn CompletionModel>,
    registry: Arc<dyn ToolRegistry>,
    observer: Option<Arc<dyn StepObserver>>,
    credential: Option<Credential>,
}

impl StepRunner {
    pub fn new(
        variant: Variant,
        config: StepRuntimeConfig,
        model: Arc<dyn CompletionModel>,
        registry: Arc<dyn ToolRegistry>,
    ) -> Self {
        Self {
            variant,
            config,
            template: PromptTemplate::for_variant(variant),
            model,
            registry,
            observer: None,
            credential: None,
        }
    }

    /// Replace the built-in prompt template
    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn StepObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn with_credential(mut self, credential: Option<Credential>) -> Self {
        self.credential = credential;
        self
    }

    /// Install the tracing observer when `verbose` is set
    pub fn verbose(self, verbose: bool) -> Self {
        if verbose {
            self.with_observer(Arc::new(TracingObserver))
        } else {
            self
        }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    fn policy(&self) -> ParsePolicy {
        self.variant
            .policy()
            .with_early_answer_threshold(self.config.early_answer_threshold)
    }

    /// Build the prompt request for a step without invoking the model
    pub fn prepare(
        &self,
        tools: &[ToolDescriptor],
        history: &[PriorStep],
        input: &str,
    ) -> PromptRequest {
        let variables = PromptVars {
            tool_descriptions: tool_descriptions(tools),
            tool_names: tool_names(tools),
            input: input.to_string(),
            agent_scratchpad: react::render_with(
                history,
                self.variant,
                self.config.fence_line_threshold,
            ),
        };

        PromptRequest {
            prompt: self.template.render(&variables),
            variables,
            credential: self.credential.clone(),
        }
    }

    /// Run one step and return the decision
    pub async fn run(
        &self,
        context: &StepContext,
        history: &[PriorStep],
        enabled: &[String],
        input: &str,
    ) -> Result<Decision, StepError> {
        self.run_with_outcome(context, history, enabled, input)
            .await
            .map(|(_, decision)| decision)
    }

    /// Run one step, also reporting which terminal state the parser reached
    pub async fn run_with_outcome(
        &self,
        context: &StepContext,
        history: &[PriorStep],
        enabled: &[String],
        input: &str,
    ) -> Result<(Outcome, Decision), StepError> {
        let tools = self
            .registry
            .active_tools(context, enabled)
            .await
            .context("Failed to load active tools")
            .map_err(StepError::Registry)?;
        debug!(
            "Step {} of '{}': {} active tools, {} prior steps",
            context.step,
            context.conversation,
            tools.len(),
            history.len()
        );

        let request = self.prepare(&tools, history, input);

        if let Some(ref observer) = self.observer {
            observer.invocation_started(&request);
        }
        let started = Instant::now();

        let completion = match self.model.complete(&request).await {
            Ok(completion) => completion,
            Err(e) => {
                if let Some(ref observer) = self.observer {
                    observer.invocation_failed(&e, started.elapsed());
                }
                return Err(StepError::Model(e));
            },
        };

        if let Some(ref observer) = self.observer {
            observer.invocation_finished(&completion, started.elapsed());
        }

        let (outcome, decision) = react::parse_with_outcome(&completion, &tools, &self.policy())?;
        info!("Step {} of '{}' -> {:?}", context.step, context.conversation, outcome);

        Ok((outcome, decision))
    }
}
