//! Budget Assistant is a small relay between the budgeting app and a
//! chat-completion API.
//!
//! The client sends a free-form sentence such as "gastei 50 reais em mercado"
//! and receives back a JSON command object (`add_tx` or `add_rec`) produced by
//! the upstream model. The relay keeps the API key off the client and owns the
//! system prompt that constrains the model to those two shapes.
//!
//! The same pipeline is exposed twice: as an HTTP server (see
//! [build_router]) and as a serverless function handler (see
//! [handle_function_event]).

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;
use tokio_util::sync::CancellationToken;

mod app_state;
mod command;
mod config;
mod decoder;
mod endpoints;
mod function;
mod health;
mod logging;
mod pipeline;
mod prompt;
mod request;
mod routing;
mod timezone;
mod upstream;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use command::{AddRecurringCommand, AddTransactionCommand, Command, TransactionKind};
pub use config::{AssistantArgs, AssistantConfig};
pub use function::{FunctionEvent, FunctionResponse, handle_function_event};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use pipeline::{Assistant, AssistantResponse};
pub use prompt::{DEFAULT_CATEGORIES, build_system_prompt};
pub use request::AssistantQuery;
pub use routing::build_router;
pub use upstream::{ChatClient, UpstreamError};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`. `shutdown` is cancelled before the server starts
/// draining so that requests waiting on the upstream model are released straight away.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>, shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install terminate signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
        },
    }

    shutdown.cancel();
    handle.graceful_shutdown(Some(Duration::from_secs(1)));
}

/// The errors that may occur while handling an assistant request.
///
/// Every variant maps to a fixed status code and a fixed client-facing
/// message, see [Error::status_code] and [Error::client_message]. Diagnostic
/// details carried by a variant are for the server logs only.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request did not contain a non-empty `text` string.
    #[error("the request did not include any text")]
    MissingText,

    /// The request body could not be parsed as a JSON object.
    #[error("could not parse the request body: {0}")]
    InvalidRequestBody(String),

    /// The upstream API key has not been configured on the server.
    #[error("the upstream API key is not configured")]
    MissingApiKey,

    /// The call to the upstream model failed or returned a non-success status.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// The upstream model replied, but its reply was not valid JSON.
    ///
    /// The string describes what went wrong, it does not contain the reply.
    #[error("the upstream model returned an invalid reply: {0}")]
    InvalidAiResponse(String),

    /// The configured timezone is not a canonical timezone name.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Any other failure.
    #[error("an unexpected error occurred: {0}")]
    Internal(String),
}

impl Error {
    /// The HTTP status code reported to the client for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::MissingText | Error::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Error::Upstream(_) | Error::InvalidAiResponse(_) => StatusCode::BAD_GATEWAY,
            Error::MissingApiKey | Error::InvalidTimezoneError(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The message reported to the client for this error.
    pub fn client_message(&self) -> &'static str {
        match self {
            Error::MissingText => "Texto não enviado.",
            Error::InvalidRequestBody(_) => "Corpo da requisição inválido.",
            Error::MissingApiKey => "Configuração de servidor ausente",
            Error::Upstream(_) => "Erro na IA",
            Error::InvalidAiResponse(_) => "Resposta inválida da IA",
            Error::InvalidTimezoneError(_) | Error::Internal(_) => "Erro interno.",
        }
    }

    /// The JSON body reported to the client for this error.
    pub fn client_body(&self) -> serde_json::Value {
        json!({ "error": self.client_message() })
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        AssistantResponse::from(self).into_response()
    }
}
