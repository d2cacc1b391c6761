//! The request pipeline shared by the HTTP server and the function handler.
//!
//! A request goes through four steps: the body is validated, the system prompt
//! is built, the upstream model is called, and its reply is decoded. Each
//! surface only translates its own request and response types to and from
//! [Assistant::respond].

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use secrecy::SecretString;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::{
    AssistantConfig, Command, Error,
    decoder::decode_completion,
    prompt::build_system_prompt,
    request::AssistantQuery,
    timezone::{get_local_offset, local_today},
    upstream::ChatClient,
};

/// Turns free-form sentences into command objects with the upstream model.
#[derive(Debug, Clone)]
pub struct Assistant {
    client: ChatClient,
    api_key: Option<SecretString>,
    local_timezone: String,
}

impl Assistant {
    /// Create the pipeline from `config`.
    ///
    /// A missing API key is not an error here: it is reported on each request
    /// instead, so the server can still start and answer health checks.
    ///
    /// # Errors
    /// Returns [Error::InvalidTimezoneError] if the configured timezone is not a
    /// canonical timezone name, or [Error::Internal] if the HTTP client cannot
    /// be created.
    pub fn new(config: AssistantConfig) -> Result<Self, Error> {
        if get_local_offset(&config.local_timezone).is_none() {
            return Err(Error::InvalidTimezoneError(config.local_timezone));
        }

        let client = ChatClient::new(
            &config.api_base_url,
            &config.model,
            config.upstream_timeout,
        )
        .map_err(|error| Error::Internal(format!("could not create the HTTP client: {error}")))?;

        if config.api_key.is_none() {
            tracing::warn!(
                "No upstream API key has been configured, assistant requests will fail until one is set."
            );
        }

        Ok(Self {
            client,
            api_key: config.api_key,
            local_timezone: config.local_timezone,
        })
    }

    /// Handle the raw request `body` and produce the response for the client.
    ///
    /// Firing `cancel` abandons the upstream call, if one is in flight.
    pub async fn respond(&self, body: &[u8], cancel: &CancellationToken) -> AssistantResponse {
        match self.interpret(body, cancel).await {
            Ok(command) => AssistantResponse {
                status: StatusCode::OK,
                body: command,
            },
            Err(error) => error.into(),
        }
    }

    /// Handle the raw request `body` and return the model's reply.
    ///
    /// # Errors
    /// Returns an error for an invalid request, a missing API key, a failed
    /// upstream call, or a reply that is not valid JSON. Validation happens
    /// before the API key is checked and nothing is sent upstream unless both
    /// succeed.
    pub async fn interpret(&self, body: &[u8], cancel: &CancellationToken) -> Result<Value, Error> {
        let query = AssistantQuery::from_body(body)?;

        let api_key = self.api_key.as_ref().ok_or(Error::MissingApiKey)?;

        let today = local_today(&self.local_timezone)
            .ok_or_else(|| Error::InvalidTimezoneError(self.local_timezone.clone()))?;
        let system_prompt = build_system_prompt(today, &query.categories);

        let envelope = self
            .client
            .complete(api_key, &system_prompt, &query.text, cancel)
            .await?;

        let reply = decode_completion(&envelope)?;

        match Command::recognize(&reply) {
            Some(command) => tracing::debug!("The model replied with a {} command", command.action()),
            None => tracing::warn!("The model replied with an unrecognized command shape: {reply}"),
        }

        Ok(reply)
    }
}

/// A transport-agnostic response: a status code and the JSON body to send.
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The command object on success, or `{"error": "..."}` on failure.
    pub body: Value,
}

impl From<Error> for AssistantResponse {
    fn from(error: Error) -> Self {
        let status = error.status_code();

        if status.is_server_error() {
            tracing::error!("An error occurred while handling an assistant request: {error}");
        } else {
            tracing::warn!("Rejected assistant request: {error}");
        }

        Self {
            status,
            body: error.client_body(),
        }
    }
}

impl IntoResponse for AssistantResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
