//! Extracting the user's text and categories from an inbound request body.

use serde_json::Value;

use crate::Error;

/// A validated assistant request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantQuery {
    /// The user's free-form sentence, never empty.
    pub text: String,
    /// The category labels the client already knows about, possibly empty.
    pub categories: Vec<String>,
}

impl AssistantQuery {
    /// Read an assistant request from a raw JSON body.
    ///
    /// The body should look like `{"text": "...", "categories": ["..."]}`.
    /// `categories` is optional: anything other than an array is treated as
    /// absent and non-string entries are skipped.
    ///
    /// # Errors
    /// Returns [Error::MissingText] if `text` is absent, `null`, not a string or
    /// empty, including when the body itself is empty. Returns
    /// [Error::InvalidRequestBody] if the body is not a JSON object.
    pub fn from_body(body: &[u8]) -> Result<Self, Error> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(Error::MissingText);
        }

        let payload: Value = serde_json::from_slice(body)
            .map_err(|error| Error::InvalidRequestBody(error.to_string()))?;

        let Value::Object(mut fields) = payload else {
            return Err(Error::InvalidRequestBody(
                "expected a JSON object".to_owned(),
            ));
        };

        let text = match fields.remove("text") {
            Some(Value::String(text)) if !text.is_empty() => text,
            _ => return Err(Error::MissingText),
        };

        let categories = match fields.remove("categories") {
            Some(Value::Array(categories)) => categories
                .into_iter()
                .filter_map(|category| match category {
                    Value::String(category) => Some(category),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };

        Ok(Self { text, categories })
    }
}
