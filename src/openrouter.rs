use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{ChatError, Result};
use crate::generator::TextGenerator;
use crate::types::MessageRole;

const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

#[derive(Debug, Serialize)]
struct OpenRouterRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    MultiPart(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text {
        text: String,
    },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<MessageContent>,
}

#[derive(Debug, Deserialize)]
struct OpenRouterResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

pub struct OpenRouterClient {
    api_key: String,
    client: reqwest::Client,
    model: String,
    system_prompt: String,
}

impl OpenRouterClient {
    pub fn new(api_key: String, model: String, system_prompt: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
            model,
            system_prompt,
        }
    }

    fn build_messages(&self, prompt: &str) -> Vec<Message> {
        vec![
            Message {
                role: MessageRole::System,
                content: Some(MessageContent::Text(self.system_prompt.clone())),
            },
            Message {
                role: MessageRole::User,
                content: Some(MessageContent::Text(prompt.to_string())),
            },
        ]
    }
}

#[async_trait]
impl TextGenerator for OpenRouterClient {
    async fn generate(&self, prompt: &str, max_tokens: u32, temperature: f32) -> Result<String> {
        debug!(
            "Sending request to OpenRouter API ({} prompt characters)",
            prompt.len()
        );

        let request = OpenRouterRequest {
            model: &self.model,
            messages: self.build_messages(prompt),
            max_tokens,
            temperature,
        };

        let response = self
            .client
            .post(OPENROUTER_API_URL)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .text()
                .await
                .unwrap_or_else(|e| format!("Failed to read error response: {e}"));
            return Err(ChatError::OpenRouterApi { status, message });
        }

        let api_response: OpenRouterResponse = response.json().await?;
        let message = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ChatError::OpenRouterResponse("No choices in response".to_string()))?
            .message;

        let reply = extract_text(message.content);
        if reply.is_empty() {
            return Err(ChatError::OpenRouterResponse(
                "Response contained no text".to_string(),
            ));
        }

        debug!("Received response from OpenRouter API");
        Ok(reply)
    }
}

fn extract_text(content: Option<MessageContent>) -> String {
    match content {
        Some(MessageContent::Text(text)) => text.trim().to_string(),
        Some(MessageContent::MultiPart(parts)) => parts
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text { text } => Some(text.trim()),
                ContentPart::Unsupported => None,
            })
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        None => String::new(),
    }
}
