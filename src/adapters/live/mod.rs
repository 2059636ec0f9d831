//! Live adapters that call the Gemini API over HTTPS.

pub mod describer;
pub mod gemini_image;
pub mod imagen;

use reqwest::Client;
use serde::Deserialize;

use crate::error::ServiceError;

pub(crate) const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// POST a JSON body to a Gemini endpoint and return the body text of a
/// successful response.
pub(crate) async fn post_json(
    client: &Client,
    url: &str,
    api_key: &str,
    body: &serde_json::Value,
) -> Result<String, ServiceError> {
    tracing::debug!(%url, "sending request");
    let response = client.post(url).header("x-goog-api-key", api_key).json(body).send().await?;

    let status = response.status();
    let response_text = response.text().await?;
    tracing::debug!(status = status.as_u16(), bytes = response_text.len(), "received response");

    if !status.is_success() {
        return Err(ServiceError::Api { status: status.as_u16(), message: response_text });
    }
    Ok(response_text)
}

/// Parse a response body, mapping failures to [`ServiceError::MalformedResponse`].
pub(crate) fn parse_body<T: serde::de::DeserializeOwned>(text: &str) -> Result<T, ServiceError> {
    serde_json::from_str(text)
        .map_err(|e| ServiceError::MalformedResponse(format!("Failed to parse response: {e}")))
}

/// Shorten a response body for inclusion in an error message.
pub(crate) fn truncate_body(text: &str) -> String {
    const LIMIT: usize = 500;
    if text.len() <= LIMIT {
        return text.to_string();
    }
    let mut end = LIMIT;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

// --- generateContent response types, shared by the describer and gemini_image ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

impl GenerateContentResponse {
    /// Turn a prompt block reported with HTTP 200 into an error.
    pub fn check_blocked(&self) -> Result<(), ServiceError> {
        match self.prompt_feedback.as_ref().and_then(|f| f.block_reason.as_ref()) {
            Some(reason) => Err(ServiceError::Api {
                status: 200,
                message: format!("Request blocked by the service: {reason}"),
            }),
            None => Ok(()),
        }
    }

    /// All parts of the first candidate, if any.
    pub fn into_parts(self) -> Vec<Part> {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts)
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Candidate {
    pub content: Option<Content>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Part {
    pub text: Option<String>,
    pub inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InlineData {
    pub mime_type: String,
    pub data: String,
}
