use super::{normalize, transport_failure, Provider, ProviderOutcome};
use crate::error::{AppError, Result};
use futures::future::BoxFuture;
use serde::Deserialize;
use serde_json::json;
use url::Url;

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";
const LABEL: &str = "Gemini";

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Option<Candidate>>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    parts: Option<Vec<Option<Part>>>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

/// Extracts `candidates[0].content.parts[0].text`. Any absent or null link
/// in that path is a missing field.
pub(crate) fn parse_response(body: &str) -> ProviderOutcome {
    let response: GenerateContentResponse = match serde_json::from_str(body) {
        Ok(response) => response,
        Err(e) => return ProviderOutcome::ParseError(e.to_string()),
    };
    response
        .candidates
        .and_then(|candidates| candidates.into_iter().next().flatten())
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts)
        .and_then(|parts| parts.into_iter().next().flatten())
        .and_then(|part| part.text)
        .map_or(ProviderOutcome::MissingField, ProviderOutcome::Success)
}

/// `generateContent` endpoint; the API key travels as a query parameter.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    endpoint: Url,
}

impl GeminiProvider {
    pub fn new(client: reqwest::Client, api_key: Option<String>, model: &str) -> Result<Self> {
        let model = model.strip_prefix("models/").unwrap_or(model);
        let endpoint = Url::parse(BASE_URL)
            .and_then(|base| base.join(&format!("models/{}:generateContent", model)))
            .map_err(|e| AppError::config(format!("Invalid Gemini model {:?}: {}", model, e)))?;
        Ok(Self {
            client,
            api_key,
            endpoint,
        })
    }

    fn request_url(&self, key: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("key", key);
        url
    }
}

impl Provider for GeminiProvider {
    fn id(&self) -> &'static str {
        "gemini"
    }

    fn label(&self) -> &'static str {
        LABEL
    }

    fn complete(&self, prompt: String) -> BoxFuture<'static, String> {
        let client = self.client.clone();
        let url = self.api_key.as_deref().map(|key| self.request_url(key));
        Box::pin(async move {
            let Some(url) = url else {
                return transport_failure(LABEL, "GEMINI_API_KEY is not set");
            };
            let body = json!({ "contents": [{ "parts": [{ "text": prompt }] }] });

            let response = match client.post(url).json(&body).send().await {
                Ok(response) => response,
                Err(e) => return transport_failure(LABEL, e.without_url()),
            };
            let status = response.status();
            match response.text().await {
                Ok(text) => normalize(LABEL, status, &text, parse_response),
                Err(e) => transport_failure(LABEL, e.without_url()),
            }
        })
    }
}
