use serde::{Deserialize, Serialize};

use crate::validation::ValidationResult;

/// Body of the static greeting endpoint.
pub const STATIC_GREETING: &str = "Wow this first HTTP Function works!!!!";

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";

/// A transport-neutral HTTP response produced by a function.
///
/// The server crate turns this into an `axum` response; keeping it plain
/// lets the mapping be tested without a router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionResponse {
    /// HTTP status code.
    pub status: u16,
    /// Value of the `Content-Type` header.
    pub content_type: String,
    /// Response body.
    pub body: String,
}

impl FunctionResponse {
    fn json(status: u16, body: &serde_json::Value) -> Self {
        Self {
            status,
            content_type: CONTENT_TYPE_JSON.to_owned(),
            body: body.to_string(),
        }
    }

    fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: CONTENT_TYPE_TEXT.to_owned(),
            body: body.into(),
        }
    }
}

/// The fixed greeting returned for a validated name.
pub fn greeting(name: &str) -> String {
    format!("Hello, {name}, so glad this Function worked!!")
}

/// Map a validation outcome to the response sent to the caller.
pub fn respond(result: &ValidationResult, name: &str) -> FunctionResponse {
    match result {
        ValidationResult::Valid => {
            FunctionResponse::json(200, &serde_json::json!({ "message": greeting(name) }))
        }
        ValidationResult::Invalid(reason) => {
            FunctionResponse::json(400, &serde_json::json!({ "error": reason.message() }))
        }
    }
}

/// Response for the parameterless endpoint.
pub fn static_greeting() -> FunctionResponse {
    FunctionResponse::text(200, STATIC_GREETING)
}
