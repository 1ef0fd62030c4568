//! Remote completion providers.
//!
//! Every adapter turns a prompt into exactly one displayable string. The
//! three outcome classes of a call are folded in [`normalize`]:
//!
//! - a success status whose document holds the expected text field yields
//!   that text, or [`NO_RESPONSE`] when the field is absent, or
//!   [`UNEXPECTED_RESPONSE`] when the document has none of the enclosing
//!   structure;
//! - any other status yields `"<Label> API Error: <status> - <body>"`;
//! - transport and parse faults yield `"<Label> request failed: <detail>"`.

pub mod gemini;
pub mod openai;

use crate::config::Config;
use crate::error::{AppError, Result};
use futures::future::BoxFuture;
use reqwest::StatusCode;
use std::sync::Arc;

pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

/// Shown when a provider answers successfully but without text.
pub const NO_RESPONSE: &str = "No response generated";

/// Shown when a successful response lacks the structure around the text.
pub const UNEXPECTED_RESPONSE: &str = "No response generated - unexpected response format";

/// A response document, parsed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderOutcome {
    Success(String),
    /// The text field itself is absent or null.
    MissingField,
    /// The containers leading to the text field are absent or empty.
    UnexpectedShape,
    ParseError(String),
}

pub trait Provider: Send + Sync {
    /// Selection value that picks this provider, e.g. `gemini`.
    fn id(&self) -> &'static str;

    /// Name used in status and error strings, e.g. `Gemini`.
    fn label(&self) -> &'static str;

    /// Sends `prompt` and resolves to the displayable outcome. Never fails.
    fn complete(&self, prompt: String) -> BoxFuture<'static, String>;
}

/// Folds a finished HTTP exchange into the displayable string.
pub(crate) fn normalize(
    label: &str,
    status: StatusCode,
    body: &str,
    parse: impl FnOnce(&str) -> ProviderOutcome,
) -> String {
    if !status.is_success() {
        return format!("{} API Error: {} - {}", label, status, body);
    }
    match parse(body) {
        ProviderOutcome::Success(text) => text,
        ProviderOutcome::MissingField => {
            log::warn!("{} response had no text field", label);
            NO_RESPONSE.to_string()
        }
        ProviderOutcome::UnexpectedShape => {
            log::warn!("{} response had an unexpected shape: {}", label, body);
            UNEXPECTED_RESPONSE.to_string()
        }
        ProviderOutcome::ParseError(detail) => transport_failure(label, detail),
    }
}

pub(crate) fn transport_failure(label: &str, detail: impl std::fmt::Display) -> String {
    format!("{} request failed: {}", label, detail)
}

pub(crate) fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .build()
        .map_err(|e| AppError::provider(format!("Failed to build HTTP client: {}", e)))
}

/// The providers offered in the selection list, sharing one HTTP client.
pub fn from_config(config: &Config) -> Result<Vec<Arc<dyn Provider>>> {
    let client = http_client()?;
    Ok(vec![
        Arc::new(GeminiProvider::new(
            client.clone(),
            config.gemini_api_key.clone(),
            &config.gemini_model,
        )?),
        Arc::new(OpenAiProvider::new(
            client,
            config.openai_api_key.clone(),
            &config.openai_model,
        )),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn error_status_includes_status_and_body() {
        let out = normalize("Gemini", StatusCode::FORBIDDEN, "{\"error\":1}", |_| {
            unreachable!("error bodies are not parsed")
        });
        assert_eq!(out, "Gemini API Error: 403 Forbidden - {\"error\":1}");
    }

    #[test]
    fn missing_field_yields_placeholder() {
        let out = normalize("ChatGPT", StatusCode::OK, "{}", |_| ProviderOutcome::MissingField);
        assert_eq!(out, NO_RESPONSE);
    }

    #[test]
    fn unexpected_shape_has_its_own_placeholder() {
        let out = normalize("ChatGPT", StatusCode::OK, "{}", |_| ProviderOutcome::UnexpectedShape);
        assert_eq!(out, UNEXPECTED_RESPONSE);
    }

    #[test]
    fn parse_error_is_reported_as_failure() {
        let out = normalize("ChatGPT", StatusCode::OK, "<html>", |_| {
            ProviderOutcome::ParseError("expected value".into())
        });
        assert_eq!(out, "ChatGPT request failed: expected value");
    }

    #[test]
    fn providers_are_listed_in_selection_order() {
        let providers = from_config(&Config::default()).unwrap();
        let ids: Vec<_> = providers.iter().map(|p| p.id()).collect();
        assert_eq!(ids, crate::selection::PROVIDER_OPTIONS.to_vec());
    }
}
