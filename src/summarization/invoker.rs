//! Ordered fallback across model candidates.

use std::sync::Arc;
use std::time::Duration;

use super::error::{CandidateError, CandidateErrorKind, InvokeError};
use super::response;
use super::transport::GenerativeTransport;

/// Models tried after the configured primary, in order.
pub const FALLBACK_MODELS: [&str; 3] = ["gemini-2.0-flash", "gemini-1.5-flash", "gemini-1.5-pro"];

/// Ordered, duplicate-free, non-empty list of model ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCandidates(Vec<String>);

impl ModelCandidates {
    /// `primary` (when set) followed by [`FALLBACK_MODELS`].
    pub fn with_primary(primary: Option<&str>) -> Self {
        let models = primary
            .map(str::to_string)
            .into_iter()
            .chain(FALLBACK_MODELS.iter().map(|model| model.to_string()));
        Self::dedup(models)
    }

    /// Explicit ordering. Returns `None` when `models` is empty.
    pub fn from_models<I, S>(models: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let candidates = Self::dedup(models.into_iter().map(Into::into));
        (!candidates.0.is_empty()).then_some(candidates)
    }

    fn dedup(models: impl Iterator<Item = String>) -> Self {
        let mut unique: Vec<String> = Vec::new();
        for model in models {
            let model = model.trim().to_string();
            if !model.is_empty() && !unique.contains(&model) {
                unique.push(model);
            }
        }
        Self(unique)
    }

    /// Model ids in attempt order.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Number of candidates.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no candidates.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Text produced by a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    /// Raw generated text.
    pub text: String,
    /// Model that produced it.
    pub model: String,
}

/// Sends a prompt to each candidate in turn until one answers.
#[derive(Clone)]
pub struct ModelInvoker {
    candidates: Arc<ModelCandidates>,
    transport: Arc<dyn GenerativeTransport>,
    attempt_timeout: Duration,
}

impl ModelInvoker {
    /// Create an invoker; `attempt_timeout` bounds each candidate separately.
    pub fn new(
        candidates: Arc<ModelCandidates>,
        transport: Arc<dyn GenerativeTransport>,
        attempt_timeout: Duration,
    ) -> Self {
        Self {
            candidates,
            transport,
            attempt_timeout,
        }
    }

    /// Candidates in attempt order.
    pub fn candidates(&self) -> &ModelCandidates {
        &self.candidates
    }

    /// Try every candidate sequentially and return the first answer.
    pub async fn invoke(&self, prompt: &str) -> Result<Generation, InvokeError> {
        let mode = self.transport.mode().as_str();
        let mut last_error = None;

        for (attempt, model) in self.candidates.as_slice().iter().enumerate() {
            let outcome =
                match tokio::time::timeout(self.attempt_timeout, self.transport.generate(model, prompt))
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(_) => Err(CandidateError::timeout(model, self.attempt_timeout)),
                };

            match outcome {
                Ok(body) => {
                    let text = response::extract_text(&body);
                    tracing::info!(
                        model = %model,
                        mode,
                        attempt = attempt + 1,
                        chars = text.chars().count(),
                        "Model produced summary text"
                    );
                    return Ok(Generation {
                        text,
                        model: model.clone(),
                    });
                }
                Err(error) if error.kind == CandidateErrorKind::NotFound => {
                    tracing::debug!(model = %model, mode, "Model not available; trying next candidate");
                    last_error = Some(error);
                }
                Err(error) => {
                    tracing::warn!(
                        model = %model,
                        mode,
                        kind = %error.kind,
                        status = ?error.status,
                        error = %error.message,
                        "Model attempt failed; trying next candidate"
                    );
                    last_error = Some(error);
                }
            }
        }

        let last = last_error.unwrap_or_else(|| {
            CandidateError::new("", CandidateErrorKind::Transport, "no model candidates configured")
        });
        Err(InvokeError::AllModelsExhausted {
            attempts: self.candidates.len(),
            last,
        })
    }
}

#[cfg(test)]
pub(crate) mod stub {
    use async_trait::async_trait;
    use serde_json::Value;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::super::error::{CandidateError, CandidateErrorKind};
    use super::super::transport::{GenerativeTransport, TransportMode};

    /// Scripted per-model behavior.
    #[derive(Clone)]
    pub(crate) enum Reply {
        Body(Value),
        Fail(CandidateErrorKind),
        Hang,
    }

    /// Transport answering from a script and recording every model it was asked for.
    #[derive(Default)]
    pub(crate) struct StubTransport {
        replies: HashMap<String, Reply>,
        calls: Mutex<Vec<String>>,
    }

    impl StubTransport {
        pub(crate) fn with(mut self, model: &str, reply: Reply) -> Self {
            self.replies.insert(model.to_string(), reply);
            self
        }

        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().expect("calls lock").clone()
        }
    }

    #[async_trait]
    impl GenerativeTransport for StubTransport {
        fn mode(&self) -> TransportMode {
            TransportMode::ManagedClient
        }

        async fn generate(&self, model: &str, _prompt: &str) -> Result<Value, CandidateError> {
            self.calls.lock().expect("calls lock").push(model.to_string());
            match self.replies.get(model).cloned() {
                Some(Reply::Body(body)) => Ok(body),
                Some(Reply::Fail(kind)) => Err(CandidateError::new(model, kind, "scripted failure")),
                Some(Reply::Hang) => std::future::pending().await,
                None => Err(CandidateError::new(
                    model,
                    CandidateErrorKind::NotFound,
                    "unscripted model",
                )),
            }
        }
    }

    /// Successful `generateContent` body carrying `text`.
    pub(crate) fn gemini_body(text: &str) -> Value {
        serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": text}]}}]
        })
    }
}
