//! In-memory generation backend for retry/fallback tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::ai::error::AiError;
use crate::ai::GenerativeBackend;

type Responder = Box<dyn Fn(&str) -> Result<String, AiError> + Send + Sync>;

/// Replays a fixed script of outcomes, then defers to a per-model responder.
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Result<String, AiError>>>,
    responder: Option<Responder>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new(script: Vec<Result<String, AiError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            responder: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn always(respond: impl Fn() -> Result<String, AiError> + Send + Sync + 'static) -> Self {
        Self::by_model(move |_| respond())
    }

    pub fn by_model(respond: impl Fn(&str) -> Result<String, AiError> + Send + Sync + 'static) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            responder: Some(Box::new(respond)),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn models_called(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativeBackend for ScriptedBackend {
    async fn generate(&self, model: &str, _prompt: &str) -> Result<String, AiError> {
        self.calls.lock().unwrap().push(model.to_string());
        if let Some(next) = self.script.lock().unwrap().pop_front() {
            return next;
        }
        match &self.responder {
            Some(respond) => respond(model),
            None => Err(AiError::upstream("script exhausted")),
        }
    }
}

pub fn rate_limit_error(model: &str) -> AiError {
    AiError::RateLimited {
        model: model.to_string(),
        status: 429,
        message: "Too Many Requests".to_string(),
    }
}

pub fn quota_error(model: &str) -> AiError {
    AiError::QuotaExhausted {
        model: model.to_string(),
        message: "You exceeded your current quota".to_string(),
    }
}
