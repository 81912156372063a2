// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Chat completions client
//!
//! [`ChatBackend`] is the seam the summary workflow talks to. [`OpenAiClient`]
//! implements it over HTTPS against the OpenAI chat completions endpoint, and
//! tests substitute their own backend.

use std::convert::Infallible;
use std::fmt;
use std::ops::AddAssign;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Default chat completions endpoint
pub const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Default model used for summaries
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

const TEMPERATURE: f32 = 0.7;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions and context
    System,
    /// The request itself
    User,
    /// A model reply
    Assistant,
}

/// A single chat-completions message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message author
    pub role: Role,
    /// Message text
    pub content: String,
}

impl ChatMessage {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// An API key that never shows up in debug output
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    /// Expose the underlying key
    #[must_use]
    pub fn revealed(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(****)")
    }
}

impl From<String> for ApiKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&str> for ApiKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl FromStr for ApiKey {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

/// Token counts reported by the API
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenUsage {
    /// Tokens in the request
    pub prompt_tokens: u64,
    /// Tokens in the reply
    pub completion_tokens: u64,
    /// Sum of both
    pub total_tokens: u64,
}

impl AddAssign for TokenUsage {
    fn add_assign(&mut self, other: Self) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens += other.total_tokens;
    }
}

/// One reply candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    /// The generated message
    pub message: ChatMessage,
}

/// Body of a successful chat completions response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Reply candidates, first one used
    pub choices: Vec<Choice>,
    /// Token accounting
    #[serde(default)]
    pub usage: TokenUsage,
}

impl ChatResponse {
    /// Text of the first reply
    ///
    /// # Errors
    ///
    /// Returns `ChatError::EmptyResponse` when the API sent no choices.
    pub fn content(&self) -> Result<&str, ChatError> {
        self.choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or(ChatError::EmptyResponse)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

/// Errors talking to the chat API
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// Transport, TLS or body decoding failure
    #[error("Chat request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("Chat API returned HTTP {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, as far as it could be read
        message: String,
    },

    /// The API answered without any choices
    #[error("Chat API returned no choices")]
    EmptyResponse,
}

/// Something that can answer a list of chat messages
pub trait ChatBackend {
    /// Send `messages` and return the model's response
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the reply is unusable.
    fn chat(&self, messages: &[ChatMessage]) -> Result<ChatResponse, ChatError>;
}

/// Blocking client for the OpenAI chat completions API
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: ApiKey,
}

impl OpenAiClient {
    /// Create a client for `model` authenticated with `api_key`
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_key: ApiKey, model: impl Into<String>) -> Result<Self, ChatError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            endpoint: OPENAI_CHAT_URL.to_string(),
            model: model.into(),
            api_key,
        })
    }

    /// Send requests to another endpoint speaking the same protocol
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Model requested in every call
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

impl ChatBackend for OpenAiClient {
    fn chat(&self, messages: &[ChatMessage]) -> Result<ChatResponse, ChatError> {
        debug!(
            endpoint = %self.endpoint,
            model = %self.model,
            messages = messages.len(),
            "Sending chat request"
        );
        for message in messages {
            trace!(role = ?message.role, content = %message.content, "Prompt");
        }

        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: TEMPERATURE,
        };
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(self.api_key.revealed())
            .json(&request)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .unwrap_or_else(|e| format!("Failed to read response body: {e}"));
            return Err(ChatError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response.json()?;
        debug!(
            prompt_tokens = body.usage.prompt_tokens,
            completion_tokens = body.usage.completion_tokens,
            "Received chat response"
        );
        Ok(body)
    }
}
