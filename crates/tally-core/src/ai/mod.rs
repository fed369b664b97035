//! Pluggable model backend abstraction
//!
//! The language model is an external collaborator: given a prompt and an
//! optional image it returns a single JSON object or fails. This module
//! keeps that seam narrow:
//!
//! - `ModelBackend` trait: the two extraction operations
//! - `ModelClient` enum: concrete wrapper providing Clone + compile-time
//!   dispatch
//! - Backend implementations: `OpenAICompatibleBackend`, `MockBackend`

mod mock;
mod openai_compatible;
pub mod parsing;

pub use mock::MockBackend;
pub use openai_compatible::OpenAICompatibleBackend;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{ExtractedExpense, ExtractedGoal};

/// Trait defining the interface for all model backends
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Extract a structured expense from free text and/or a receipt photo.
    /// `today` is embedded in the prompt so relative dates resolve.
    async fn extract_expense(
        &self,
        text: Option<&str>,
        image: Option<&[u8]>,
        today: NaiveDate,
    ) -> Result<ExtractedExpense>;

    /// Extract a structured goal from free text
    async fn extract_goal(&self, text: &str, today: NaiveDate) -> Result<ExtractedGoal>;

    /// Get the model name (for logging)
    fn model(&self) -> &str;
}

/// Concrete model client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum ModelClient {
    /// Any server implementing the OpenAI chat completions API
    OpenAICompatible(OpenAICompatibleBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl ModelClient {
    /// Create an OpenAI-compatible backend
    pub fn openai_compatible(host: &str, model: &str, api_key: Option<&str>) -> Self {
        ModelClient::OpenAICompatible(OpenAICompatibleBackend::new(host, model, api_key))
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        ModelClient::Mock(MockBackend::new())
    }
}

#[async_trait]
impl ModelBackend for ModelClient {
    async fn extract_expense(
        &self,
        text: Option<&str>,
        image: Option<&[u8]>,
        today: NaiveDate,
    ) -> Result<ExtractedExpense> {
        match self {
            ModelClient::OpenAICompatible(b) => b.extract_expense(text, image, today).await,
            ModelClient::Mock(b) => b.extract_expense(text, image, today).await,
        }
    }

    async fn extract_goal(&self, text: &str, today: NaiveDate) -> Result<ExtractedGoal> {
        match self {
            ModelClient::OpenAICompatible(b) => b.extract_goal(text, today).await,
            ModelClient::Mock(b) => b.extract_goal(text, today).await,
        }
    }

    fn model(&self) -> &str {
        match self {
            ModelClient::OpenAICompatible(b) => b.model(),
            ModelClient::Mock(b) => b.model(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_client_extracts() {
        let client = ModelClient::mock();
        assert_eq!(client.model(), "mock");
        let today = NaiveDate::from_ymd_opt(2025, 1, 20).unwrap();
        let expense = client
            .extract_expense(Some("5 DM"), None, today)
            .await
            .unwrap();
        assert!(expense.amount > 0.0);
    }
}
