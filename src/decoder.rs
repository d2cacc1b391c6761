//! Reading the command object out of a chat-completion response.

use serde::Deserialize;
use serde_json::Value;

use crate::Error;

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<AssistantMessage>,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

/// Parse the assistant's message in the completion response `envelope` as JSON.
///
/// The parsed value is returned as is, whatever its shape.
///
/// # Errors
/// Returns [Error::InvalidAiResponse] if the envelope is not a completion
/// response, has no message content, or the content is not valid JSON. The
/// offending text is logged, not included in the error.
pub fn decode_completion(envelope: &str) -> Result<Value, Error> {
    let completion: ChatCompletion = serde_json::from_str(envelope).map_err(|error| {
        tracing::error!("Could not parse the completion envelope: {error}\n{envelope}");
        Error::InvalidAiResponse(format!("malformed completion envelope: {error}"))
    })?;

    let content = completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .ok_or_else(|| {
            tracing::error!("The completion has no message content: {envelope}");
            Error::InvalidAiResponse("the completion has no message content".to_owned())
        })?;

    serde_json::from_str(&content).map_err(|error| {
        tracing::error!("Could not parse the model's reply as JSON: {error}\n{content}");
        Error::InvalidAiResponse(error.to_string())
    })
}

#[cfg(test)]
mod decode_completion_tests {
    use serde_json::{Value, json};

    use crate::Error;

    use super::decode_completion;

    fn envelope(content: &str) -> String {
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [
                {
                    "index": 0,
                    "message": { "role": "assistant", "content": content },
                    "finish_reason": "stop"
                }
            ]
        })
        .to_string()
    }

    #[test]
    fn returns_parsed_content_unchanged() {
        let content = r#"{"action":"add_tx","tipo":"expense","desc":"mercado","val":50.0,"cat":"Mercado","data":"2024-01-15"}"#;

        let got = decode_completion(&envelope(content)).unwrap();

        assert_eq!(got, serde_json::from_str::<Value>(content).unwrap());
    }

    #[test]
    fn passes_through_unexpected_shapes() {
        for want in [
            json!({ "action": "something_else", "extra": [1, 2, { "nested": null }] }),
            json!([1, "two", 3.5]),
            json!("just a string"),
            json!(42),
            json!({}),
        ] {
            let got = decode_completion(&envelope(&want.to_string())).unwrap();

            assert_eq!(got, want);
        }
    }

    #[test]
    fn amounts_keep_every_bit() {
        for want in [
            1.0715660391465826e-75,
            -1.603964615428183e143,
            0.1 + 0.2,
            f64::MAX,
            f64::MIN_POSITIVE,
            5e-324,
        ] {
            let content = json!({ "action": "add_rec", "desc": "aluguel", "val": want, "dia": 5 });

            let got = decode_completion(&envelope(&content.to_string())).unwrap();

            let got = got["val"].as_f64().unwrap();
            assert_eq!(got.to_bits(), want.to_bits(), "want {want:e}, got {got:e}");
        }
    }

    #[test]
    fn keeps_the_model_key_order() {
        let content = r#"{"data":"2024-01-15","action":"add_tx","val":50,"tipo":"expense","desc":"mercado","cat":"Mercado"}"#;

        let got = decode_completion(&envelope(content)).unwrap();

        let keys: Vec<&str> = got.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, ["data", "action", "val", "tipo", "desc", "cat"]);
        assert_eq!(got.to_string(), content);
    }

    #[test]
    fn content_that_is_not_json_is_invalid() {
        let result = decode_completion(&envelope("```json\n{\"action\":\"add_tx\"}\n```"));

        match result {
            Err(Error::InvalidAiResponse(message)) => {
                assert!(!message.contains("add_tx"), "reply leaked into error: {message}")
            }
            other => panic!("want InvalidAiResponse, got {other:?}"),
        }
    }

    #[test]
    fn missing_content_is_invalid() {
        for envelope in [
            json!({ "choices": [] }).to_string(),
            json!({}).to_string(),
            json!({ "choices": [{ "message": { "role": "assistant", "content": null } }] })
                .to_string(),
            json!({ "choices": [{ "finish_reason": "length" }] }).to_string(),
        ] {
            let result = decode_completion(&envelope);

            assert!(
                matches!(result, Err(Error::InvalidAiResponse(_))),
                "want InvalidAiResponse for {envelope}, got {result:?}"
            );
        }
    }

    #[test]
    fn malformed_envelope_is_invalid() {
        let result = decode_completion("<html>Bad Gateway</html>");

        assert!(matches!(result, Err(Error::InvalidAiResponse(_))));
    }
}
