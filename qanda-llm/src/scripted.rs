//! Deterministic generation client.
//!
//! Replays a fixed script of fragments and failures instead of calling a
//! remote service. Every prompt it receives is recorded so callers can check
//! what was (or was not) sent.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use qanda_core::{
    generation_error, Fragment, FragmentStream, GenerationClient, ModelInfo, QandaError,
    QandaResult,
};

/// One step of a scripted generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStep {
    Emit(Fragment),
    /// Fail the sequence with this message
    Fail(String),
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedClient {
    steps: Vec<ScriptStep>,
    open_error: Option<String>,
    delay: Option<Duration>,
    models: Vec<ModelInfo>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Client that answers every prompt with the given fragments
    pub fn with_fragments<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        fragments
            .into_iter()
            .fold(Self::new(), |client, text| client.text(text))
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.steps.push(ScriptStep::Emit(Fragment::Text(text.into())));
        self
    }

    pub fn withheld(mut self, reason: Option<&str>) -> Self {
        self.steps.push(ScriptStep::Emit(Fragment::Withheld {
            reason: reason.map(str::to_string),
        }));
        self
    }

    pub fn fail(mut self, message: impl Into<String>) -> Self {
        self.steps.push(ScriptStep::Fail(message.into()));
        self
    }

    /// Make opening the generation fail before any fragment
    pub fn fail_on_open(mut self, message: impl Into<String>) -> Self {
        self.open_error = Some(message.into());
        self
    }

    /// Pause before each streamed step
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_models(mut self, models: Vec<ModelInfo>) -> Self {
        self.models = models;
        self
    }

    /// Prompts received so far, in order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|prompts| prompts.clone())
            .unwrap_or_default()
    }

    fn record(&self, prompt: &str) -> QandaResult<()> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        match &self.open_error {
            Some(message) => Err(generation_error!(message, "scripted_client")),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl GenerationClient for ScriptedClient {
    async fn generate(&self, prompt: &str) -> QandaResult<String> {
        self.record(prompt)?;

        let mut answer = String::new();
        for step in &self.steps {
            match step {
                ScriptStep::Emit(fragment) => {
                    if let Some(text) = fragment.as_text() {
                        answer.push_str(text);
                    }
                }
                ScriptStep::Fail(message) => {
                    return Err(generation_error!(message, "scripted_client"))
                }
            }
        }
        Ok(answer)
    }

    async fn generate_stream(&self, prompt: &str) -> QandaResult<FragmentStream> {
        self.record(prompt)?;

        let steps = self.steps.clone();
        let delay = self.delay;
        let stream = async_stream::stream! {
            for step in steps {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                match step {
                    ScriptStep::Emit(fragment) => yield Ok::<Fragment, QandaError>(fragment),
                    ScriptStep::Fail(message) => {
                        yield Err(generation_error!(message, "scripted_client"));
                        return;
                    }
                }
            }
        };
        Ok(stream.boxed())
    }

    async fn list_models(&self) -> QandaResult<Vec<ModelInfo>> {
        Ok(self.models.clone())
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}
