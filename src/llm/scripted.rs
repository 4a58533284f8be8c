//! Replays a fixed sequence of model turns.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use super::{GenerateRequest, LlmClient, LlmError, ModelResponse};

/// Backend that answers each request with the next pre-built response and
/// records what it was sent.
pub struct ScriptedClient {
    responses: Mutex<VecDeque<ModelResponse>>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedClient {
    pub fn new(responses: impl IntoIterator<Item = ModelResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Responses not yet consumed.
    pub fn remaining(&self) -> usize {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn generate(
        &self,
        _model: &str,
        request: &GenerateRequest,
    ) -> Result<ModelResponse, LlmError> {
        let served = {
            let mut requests = self.requests.lock().unwrap_or_else(PoisonError::into_inner);
            requests.push(request.clone());
            requests.len() - 1
        };

        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .ok_or(LlmError::ScriptExhausted(served))
    }
}
