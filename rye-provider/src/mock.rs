//! A deterministic [`Provider`] test double. Exposed unconditionally
//! (not `#[cfg(test)]`) so downstream crates — `rye-runtime` chief among
//! them — can depend on `rye-provider` as a dev-dependency and drive
//! their own thread-loop tests against a queue of canned responses,
//! the same role `MockProvider` plays inside `neuron-op-react`'s tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::provider::{Provider, ProviderError};
use crate::types::{ProviderRequest, ProviderResponse};

/// Replays a fixed queue of responses, one per `complete()` call.
/// Panics if exhausted — tests should queue exactly as many responses
/// as they expect calls.
pub struct MockProvider {
    responses: Mutex<VecDeque<ProviderResponse>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl MockProvider {
    /// Queue `responses` to be returned in order.
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Number of `complete()` calls made so far.
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Snapshot of every request received, in order.
    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Provider for MockProvider {
    fn complete(&self, request: ProviderRequest) -> impl std::future::Future<Output = Result<ProviderResponse, ProviderError>> + Send {
        self.requests.lock().unwrap().push(request);
        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("MockProvider: no more responses queued");
        async move { Ok(response) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{StopReason, TokenUsage};
    use rye_core::ContentPart;

    fn text_response(text: &str) -> ProviderResponse {
        ProviderResponse {
            content: vec![ContentPart::Text { text: text.to_string() }],
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage { input_tokens: 1, output_tokens: 1 },
            model: "mock".to_string(),
            cost: None,
        }
    }

    #[tokio::test]
    async fn replays_responses_in_order_and_counts_calls() {
        let provider = MockProvider::new(vec![text_response("a"), text_response("b")]);
        let request = ProviderRequest {
            model: None,
            messages: vec![],
            tools: vec![],
            max_tokens: None,
            temperature: None,
            system: None,
            extra: serde_json::Value::Null,
        };
        let first = provider.complete(request.clone()).await.unwrap();
        let second = provider.complete(request).await.unwrap();
        assert_eq!(first.content, vec![ContentPart::Text { text: "a".to_string() }]);
        assert_eq!(second.content, vec![ContentPart::Text { text: "b".to_string() }]);
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    #[should_panic(expected = "no more responses queued")]
    async fn panics_when_exhausted() {
        let provider = MockProvider::new(vec![]);
        let request = ProviderRequest {
            model: None,
            messages: vec![],
            tools: vec![],
            max_tokens: None,
            temperature: None,
            system: None,
            extra: serde_json::Value::Null,
        };
        let _ = provider.complete(request).await;
    }
}
