use super::{normalize, transport_failure, Provider, ProviderOutcome};
use futures::future::BoxFuture;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::json;

const RESPONSES_URL: &str = "https://api.openai.com/v1/responses";
const LABEL: &str = "ChatGPT";

#[derive(Deserialize)]
struct ResponsesResponse {
    output: Option<Vec<Option<OutputItem>>>,
}

#[derive(Deserialize)]
struct OutputItem {
    content: Option<Vec<Option<ContentItem>>>,
}

#[derive(Deserialize)]
struct ContentItem {
    text: Option<String>,
}

/// Extracts `output[0].content[0].text`.
///
/// A missing or empty `output` / `content` is an unexpected shape; a null
/// first content item or text is a missing field.
pub(crate) fn parse_response(body: &str) -> ProviderOutcome {
    let response: ResponsesResponse = match serde_json::from_str(body) {
        Ok(response) => response,
        Err(e) => return ProviderOutcome::ParseError(e.to_string()),
    };
    let Some(content) = response
        .output
        .and_then(|output| output.into_iter().next().flatten())
        .and_then(|item| item.content)
    else {
        return ProviderOutcome::UnexpectedShape;
    };
    let Some(first) = content.into_iter().next() else {
        return ProviderOutcome::UnexpectedShape;
    };
    first
        .and_then(|item| item.text)
        .map_or(ProviderOutcome::MissingField, ProviderOutcome::Success)
}

/// Headers for one request. Built fresh per call; the shared client
/// carries no per-request state.
fn request_headers(api_key: &str) -> Result<HeaderMap, String> {
    let mut headers = HeaderMap::new();
    let bearer = HeaderValue::from_str(&format!("Bearer {}", api_key))
        .map_err(|_| "OPENAI_API_KEY contains invalid header characters".to_string())?;
    headers.insert(AUTHORIZATION, bearer);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
}

/// OpenAI Responses API.
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
}

impl OpenAiProvider {
    pub fn new(client: reqwest::Client, api_key: Option<String>, model: &str) -> Self {
        Self {
            client,
            api_key,
            model: model.to_string(),
        }
    }
}

impl Provider for OpenAiProvider {
    fn id(&self) -> &'static str {
        "chatgpt"
    }

    fn label(&self) -> &'static str {
        LABEL
    }

    fn complete(&self, prompt: String) -> BoxFuture<'static, String> {
        let client = self.client.clone();
        let api_key = self.api_key.clone();
        let model = self.model.clone();
        Box::pin(async move {
            let Some(api_key) = api_key else {
                return transport_failure(LABEL, "OPENAI_API_KEY is not set");
            };
            let headers = match request_headers(&api_key) {
                Ok(headers) => headers,
                Err(e) => return transport_failure(LABEL, e),
            };
            let body = json!({ "model": model, "input": prompt });

            let response = match client
                .post(RESPONSES_URL)
                .headers(headers)
                .json(&body)
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => return transport_failure(LABEL, e),
            };
            let status = response.status();
            match response.text().await {
                Ok(text) => normalize(LABEL, status, &text, parse_response),
                Err(e) => transport_failure(LABEL, e),
            }
        })
    }
}
