//! The serverless function surface.
//!
//! The platform hands the function an event describing the HTTP request and
//! expects back a status code, headers and a string body. This module adapts
//! that shape to the shared [Assistant] pipeline.

use std::collections::BTreeMap;

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::{Assistant, AssistantResponse, Error};

/// The message sent for methods other than `POST` and `OPTIONS`.
const METHOD_NOT_ALLOWED: &str = "Método não permitido";

/// The HTTP request as described by the function platform.
///
/// Any other fields in the event, e.g. `path` or `headers`, are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionEvent {
    /// The request method, e.g. "POST".
    pub http_method: String,
    /// The request body, if there is one.
    #[serde(default)]
    pub body: Option<String>,
    /// Whether `body` is base64 encoded.
    #[serde(default)]
    pub is_base64_encoded: bool,
}

/// The HTTP response handed back to the function platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionResponse {
    /// The HTTP status code.
    pub status_code: u16,
    /// The response headers, always including the CORS headers.
    pub headers: BTreeMap<String, String>,
    /// The response body.
    pub body: String,
}

impl FunctionResponse {
    fn new(status_code: u16, content_type: Option<&str>, body: String) -> Self {
        let mut headers = cors_headers();
        if let Some(content_type) = content_type {
            headers.insert("Content-Type".to_owned(), content_type.to_owned());
        }

        Self {
            status_code,
            headers,
            body,
        }
    }
}

impl From<AssistantResponse> for FunctionResponse {
    fn from(response: AssistantResponse) -> Self {
        Self::new(
            response.status.as_u16(),
            Some("application/json"),
            response.body.to_string(),
        )
    }
}

fn cors_headers() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("Access-Control-Allow-Origin".to_owned(), "*".to_owned()),
        (
            "Access-Control-Allow-Headers".to_owned(),
            "Content-Type".to_owned(),
        ),
        (
            "Access-Control-Allow-Methods".to_owned(),
            "POST, OPTIONS".to_owned(),
        ),
    ])
}

/// Handle one function invocation.
///
/// `OPTIONS` is answered as a preflight request, `POST` runs the assistant
/// pipeline and every other method is rejected with 405. Firing `cancel`
/// abandons the upstream call, if one is in flight.
pub async fn handle_function_event(
    assistant: &Assistant,
    event: FunctionEvent,
    cancel: &CancellationToken,
) -> FunctionResponse {
    let method = event.http_method.to_ascii_uppercase();

    match method.as_str() {
        "OPTIONS" => FunctionResponse::new(200, None, String::new()),
        "POST" => {
            let body = match decode_body(event.body, event.is_base64_encoded) {
                Ok(body) => body,
                Err(error) => return AssistantResponse::from(error).into(),
            };

            assistant.respond(&body, cancel).await.into()
        }
        _ => {
            tracing::warn!("Rejected {method} request to the assistant function");
            FunctionResponse::new(
                405,
                Some("text/plain; charset=utf-8"),
                METHOD_NOT_ALLOWED.to_owned(),
            )
        }
    }
}

fn decode_body(body: Option<String>, is_base64_encoded: bool) -> Result<Vec<u8>, Error> {
    let body = body.unwrap_or_default();

    if is_base64_encoded {
        STANDARD
            .decode(body.trim())
            .map_err(|error| Error::InvalidRequestBody(format!("invalid base64 body: {error}")))
    } else {
        Ok(body.into_bytes())
    }
}

#[cfg(test)]
mod handle_function_event_tests {
    use base64::{Engine, engine::general_purpose::STANDARD};
    use serde_json::{Value, json};
    use tokio_util::sync::CancellationToken;
    use wiremock::MockServer;

    use crate::{
        Assistant, AssistantConfig,
        test_utils::{EXAMPLE_REPLY, mount_completion, test_assistant},
    };

    use super::{FunctionEvent, FunctionResponse, handle_function_event};

    const EXAMPLE_REQUEST: &str =
        r#"{"text":"gastei 50 reais em mercado","categories":["Mercado","Lazer"]}"#;

    fn post(body: &str) -> FunctionEvent {
        FunctionEvent {
            http_method: "POST".to_owned(),
            body: Some(body.to_owned()),
            is_base64_encoded: false,
        }
    }

    #[track_caller]
    fn assert_cors_headers(response: &FunctionResponse) {
        for (name, value) in [
            ("Access-Control-Allow-Origin", "*"),
            ("Access-Control-Allow-Headers", "Content-Type"),
            ("Access-Control-Allow-Methods", "POST, OPTIONS"),
        ] {
            assert_eq!(
                response.headers.get(name).map(String::as_str),
                Some(value),
                "want header {name}: {value}, got {:?}",
                response.headers
            );
        }
    }

    fn body_json(response: &FunctionResponse) -> Value {
        serde_json::from_str(&response.body).expect("Could not parse response body")
    }

    #[tokio::test]
    async fn options_is_answered_with_cors_headers() {
        let assistant = Assistant::new(AssistantConfig::new(None)).unwrap();
        let event = FunctionEvent {
            http_method: "OPTIONS".to_owned(),
            ..Default::default()
        };

        let response = handle_function_event(&assistant, event, &CancellationToken::new()).await;

        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, "");
        assert_cors_headers(&response);
    }

    #[tokio::test]
    async fn other_methods_are_not_allowed() {
        let assistant = Assistant::new(AssistantConfig::new(Some("sk-test"))).unwrap();

        for method in ["GET", "PUT", "DELETE"] {
            let event = FunctionEvent {
                http_method: method.to_owned(),
                ..Default::default()
            };

            let response =
                handle_function_event(&assistant, event, &CancellationToken::new()).await;

            assert_eq!(response.status_code, 405, "{method}");
            assert_eq!(response.body, "Método não permitido");
            assert_cors_headers(&response);
        }
    }

    #[tokio::test]
    async fn post_returns_command() {
        let server = MockServer::start().await;
        mount_completion(&server, EXAMPLE_REPLY, 1).await;
        let assistant = test_assistant(&server);

        let response =
            handle_function_event(&assistant, post(EXAMPLE_REQUEST), &CancellationToken::new())
                .await;

        assert_eq!(response.status_code, 200);
        assert_eq!(
            body_json(&response),
            serde_json::from_str::<Value>(EXAMPLE_REPLY).unwrap()
        );
        assert_cors_headers(&response);
    }

    #[tokio::test]
    async fn base64_body_is_decoded() {
        let server = MockServer::start().await;
        mount_completion(&server, EXAMPLE_REPLY, 1).await;
        let assistant = test_assistant(&server);
        let event = FunctionEvent {
            http_method: "POST".to_owned(),
            body: Some(STANDARD.encode(EXAMPLE_REQUEST)),
            is_base64_encoded: true,
        };

        let response = handle_function_event(&assistant, event, &CancellationToken::new()).await;

        assert_eq!(response.status_code, 200);
    }

    #[tokio::test]
    async fn invalid_base64_body_is_bad_request() {
        let server = MockServer::start().await;
        mount_completion(&server, EXAMPLE_REPLY, 0).await;
        let assistant = test_assistant(&server);
        let event = FunctionEvent {
            http_method: "POST".to_owned(),
            body: Some("not base64!".to_owned()),
            is_base64_encoded: true,
        };

        let response = handle_function_event(&assistant, event, &CancellationToken::new()).await;

        assert_eq!(response.status_code, 400);
        assert_cors_headers(&response);
    }

    #[tokio::test]
    async fn missing_body_is_missing_text() {
        let server = MockServer::start().await;
        mount_completion(&server, EXAMPLE_REPLY, 0).await;
        let assistant = test_assistant(&server);
        let event = FunctionEvent {
            http_method: "POST".to_owned(),
            ..Default::default()
        };

        let response = handle_function_event(&assistant, event, &CancellationToken::new()).await;

        assert_eq!(response.status_code, 400);
        assert_eq!(body_json(&response), json!({ "error": "Texto não enviado." }));
    }

    #[tokio::test]
    async fn missing_api_key_never_calls_upstream() {
        let server = MockServer::start().await;
        mount_completion(&server, EXAMPLE_REPLY, 0).await;
        let assistant =
            Assistant::new(AssistantConfig::new(None).with_api_base_url(&server.uri())).unwrap();

        let response =
            handle_function_event(&assistant, post(EXAMPLE_REQUEST), &CancellationToken::new())
                .await;

        assert_eq!(response.status_code, 500);
        assert_eq!(
            body_json(&response),
            json!({ "error": "Configuração de servidor ausente" })
        );
        assert_cors_headers(&response);
    }

    #[test]
    fn platform_event_deserializes() {
        let event: FunctionEvent = serde_json::from_value(json!({
            "path": "/.netlify/functions/ai-assistant",
            "httpMethod": "POST",
            "headers": { "content-type": "application/json" },
            "body": EXAMPLE_REQUEST,
            "isBase64Encoded": false
        }))
        .unwrap();

        assert_eq!(event.http_method, "POST");
        assert_eq!(event.body.as_deref(), Some(EXAMPLE_REQUEST));
        assert!(!event.is_base64_encoded);
    }

    #[test]
    fn response_serializes_in_platform_shape() {
        let response = FunctionResponse::new(200, None, String::new());

        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["statusCode"], 200);
        assert_eq!(value["body"], "");
        assert_eq!(value["headers"]["Access-Control-Allow-Origin"], "*");
    }
}
