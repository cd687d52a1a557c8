//! Model invocation and the step runner

mod model;
mod observer;
mod step;

pub use model::{CompletionModel, Credential, GenaiModel, PromptRequest};
pub use observer::{StepObserver, TracingObserver};
pub use step::StepRunner;
