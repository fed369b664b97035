//! OpenAI-compatible backend implementation
//!
//! Works with any server that implements the OpenAI chat completions API
//! (Groq, vLLM, LocalAI, llama-server, ...). Vision requests embed the
//! receipt photo as a base64 data URL.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{ExtractedExpense, ExtractedGoal};
use crate::prompts;

use super::parsing::{parse_expense_response, parse_goal_response};
use super::ModelBackend;

/// Bounded timeout so a stalled upstream cannot exhaust the invocation
const MODEL_TIMEOUT: Duration = Duration::from_secs(20);

/// OpenAI-compatible backend
pub struct OpenAICompatibleBackend {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl Clone for OpenAICompatibleBackend {
    fn clone(&self) -> Self {
        Self {
            http_client: self.http_client.clone(),
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            api_key: self.api_key.clone(),
        }
    }
}

impl OpenAICompatibleBackend {
    pub fn new(base_url: &str, model: &str, api_key: Option<&str>) -> Self {
        let http_client = Client::builder()
            .timeout(MODEL_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.map(String::from),
        }
    }

    /// Make a chat completion request; `image` adds a multimodal part
    async fn chat_completion(&self, prompt: &str, image: Option<&[u8]>) -> Result<String> {
        let messages = match image {
            None => vec![ChatMessage {
                role: "user".to_string(),
                content: ChatContent::Text(prompt.to_string()),
            }],
            Some(bytes) => {
                let base64_image = base64::engine::general_purpose::STANDARD.encode(bytes);
                vec![ChatMessage {
                    role: "user".to_string(),
                    content: ChatContent::Parts(vec![
                        ContentPart::Text {
                            text: prompt.to_string(),
                        },
                        ContentPart::ImageUrl {
                            image_url: ImageUrl {
                                url: format!("data:image/jpeg;base64,{}", base64_image),
                            },
                        },
                    ]),
                }]
            }
        };

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: Some(0.0),
            max_tokens: image.map(|_| 4096),
            stream: false,
        };

        let mut req_builder = self
            .http_client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .json(&request);

        if let Some(ref api_key) = self.api_key {
            req_builder = req_builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = req_builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Model(format!("Model API error {}: {}", status, body)));
        }

        let chat_response: ChatCompletionResponse = response.json().await?;
        debug!(model = %self.model, "Chat completion succeeded");

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::Model("No choices in model response".into()))
    }
}

/// OpenAI chat completion request
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

/// Chat message
#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: ChatContent,
}

/// Chat message content (text or multimodal)
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ChatContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// Content part for multimodal messages
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

/// Image URL for vision requests
#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

/// OpenAI chat completion response
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[async_trait]
impl ModelBackend for OpenAICompatibleBackend {
    async fn extract_expense(
        &self,
        text: Option<&str>,
        image: Option<&[u8]>,
        today: NaiveDate,
    ) -> Result<ExtractedExpense> {
        let mut prompt = prompts::expense_prompt(today);
        match (text, image) {
            (Some(t), _) => {
                prompt.push_str("\n\nInput: ");
                prompt.push_str(t);
            }
            (None, Some(_)) => prompt.push_str(prompts::RECEIPT_SUFFIX),
            (None, None) => {
                return Err(Error::Model("Nothing to extract from".into()));
            }
        }

        let response = self.chat_completion(&prompt, image).await?;
        parse_expense_response(&response)
    }

    async fn extract_goal(&self, text: &str, today: NaiveDate) -> Result<ExtractedGoal> {
        let mut prompt = prompts::goal_prompt(today);
        prompt.push_str("\n\nInput: ");
        prompt.push_str(text);

        let response = self.chat_completion(&prompt, None).await?;
        parse_goal_response(&response)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
