//! Live adapter that asks a Gemini vision model for a descriptive prompt.

use base64::Engine;
use reqwest::Client;

use super::{parse_body, post_json, truncate_body, GenerateContentResponse, GEMINI_API_BASE};
use crate::error::ServiceError;
use crate::ports::prompt_describer::{DescribeFuture, DescribeRequest, PromptDescriber};

/// Live describer backed by the Gemini `generateContent` endpoint.
pub struct GeminiDescriber {
    client: Client,
    api_key: String,
}

impl GeminiDescriber {
    /// Create a new describer with the given API key.
    #[must_use]
    pub fn new(api_key: String) -> Self {
        Self { client: Client::new(), api_key }
    }
}

/// Wrap the user's instruction in the request text sent alongside the image.
#[must_use]
pub fn meta_prompt(instruction: &str) -> String {
    format!(
        "You are helping edit an image. The user wants this change: \"{}\"\n\n\
         Write a single, detailed prompt for a text-to-image model that would produce \
         the edited image. Describe the subject, composition, setting, colors, lighting, \
         style and mood of the original image, with the requested change applied. \
         The prompt must stand on its own without referring to the original image. \
         Output only the prompt.",
        instruction.trim()
    )
}

impl PromptDescriber for GeminiDescriber {
    fn describe(&self, request: &DescribeRequest) -> DescribeFuture<'_> {
        let request = request.clone();
        Box::pin(async move {
            let url = format!("{GEMINI_API_BASE}/{}:generateContent", request.model);
            let image_b64 = base64::engine::general_purpose::STANDARD.encode(&request.image_data);

            let body = serde_json::json!({
                "contents": [{
                    "parts": [
                        {"inlineData": {"mimeType": request.mime_type, "data": image_b64}},
                        {"text": meta_prompt(&request.instruction)}
                    ]
                }]
            });

            let response_text = post_json(&self.client, &url, &self.api_key, &body).await?;
            let parsed: GenerateContentResponse = parse_body(&response_text)?;
            parsed.check_blocked()?;

            let text = parsed
                .into_parts()
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("");
            let text = text.trim();

            if text.is_empty() {
                return Err(ServiceError::MalformedResponse(format!(
                    "No description in response. Body: {}",
                    truncate_body(&response_text)
                )));
            }

            tracing::debug!(chars = text.len(), "received descriptive prompt");
            Ok(text.to_string())
        })
    }
}
