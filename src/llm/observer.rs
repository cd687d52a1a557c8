//! Injectable hooks around model invocation
//!
//! Verbose diagnostics are an observer handed to the step runner, not global
//! state. [`TracingObserver`] is what the verbose flag installs.

use std::time::Duration;

use tracing::{info, warn};

use super::model::PromptRequest;

/// Callbacks fired around the single model invocation of a step
pub trait StepObserver: Send + Sync {
    fn invocation_started(&self, _request: &PromptRequest) {}

    fn invocation_finished(&self, _completion: &str, _elapsed: Duration) {}

    fn invocation_failed(&self, _error: &anyhow::Error, _elapsed: Duration) {}
}

/// Logs prompt/response pairs and latency
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl StepObserver for TracingObserver {
    fn invocation_started(&self, request: &PromptRequest) {
        info!("Prompt:\n{}", request.prompt);
    }

    fn invocation_finished(&self, completion: &str, elapsed: Duration) {
        info!("Completion ({} ms):\n{}", elapsed.as_millis(), completion);
    }

    fn invocation_failed(&self, error: &anyhow::Error, elapsed: Duration) {
        warn!("Model invocation failed after {} ms: {:#}", elapsed.as_millis(), error);
    }
}
