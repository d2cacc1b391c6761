//! The client for the upstream chat-completion API.

use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// The sampling temperature for every completion.
///
/// Kept low so the model sticks to the JSON shapes in the system prompt.
pub const TEMPERATURE: f64 = 0.1;

/// The errors that may occur while calling the upstream model.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// The upstream API answered with a non-success status.
    ///
    /// `body` is kept for the server logs and must not be sent to clients.
    #[error("the upstream API responded with status {status}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The raw response body.
        body: String,
    },

    /// The request could not be sent or the response could not be read,
    /// including when the request timed out.
    #[error("the upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The request was abandoned because its cancellation token fired.
    #[error("the upstream request was cancelled")]
    Cancelled,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    response_format: ResponseFormat,
    temperature: f64,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

/// Sends completion requests to an OpenAI-compatible chat-completion API.
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: Client,
    endpoint: String,
    model: String,
}

impl ChatClient {
    /// Create a client for the API at `api_base_url`.
    ///
    /// Every request made with this client is aborted after `timeout`.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built, e.g. when
    /// the TLS backend fails to initialize.
    pub fn new(api_base_url: &str, model: &str, timeout: Duration) -> Result<Self, UpstreamError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", api_base_url.trim_end_matches('/')),
            model: model.to_owned(),
        })
    }

    /// Ask the model to answer `text` under the instruction `system_prompt`.
    ///
    /// Returns the raw body of the completion response. The reply is requested
    /// as a JSON object, but nothing here checks that it is one.
    ///
    /// # Errors
    /// Returns [UpstreamError::Status] for a non-success response,
    /// [UpstreamError::Transport] if the request fails or times out, and
    /// [UpstreamError::Cancelled] if `cancel` fires before the response has
    /// been read.
    pub async fn complete(
        &self,
        api_key: &SecretString,
        system_prompt: &str,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<String, UpstreamError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
            temperature: TEMPERATURE,
        };

        let call = async {
            let response = self
                .client
                .post(&self.endpoint)
                .bearer_auth(api_key.expose_secret())
                .json(&request)
                .send()
                .await?;

            let status = response.status();
            let body = response.text().await?;

            if !status.is_success() {
                tracing::error!("The upstream API responded with {status}: {body}");

                return Err(UpstreamError::Status {
                    status: status.as_u16(),
                    body,
                });
            }

            Ok::<_, UpstreamError>(body)
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Abandoning upstream request to {}", self.endpoint);
                Err(UpstreamError::Cancelled)
            }
            result = call => result.inspect_err(|error| {
                if let UpstreamError::Transport(error) = error {
                    tracing::error!("Could not reach the upstream API: {error}");
                }
            }),
        }
    }
}
