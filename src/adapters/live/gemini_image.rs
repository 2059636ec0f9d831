//! Live adapter for Gemini-native image generation models.

use base64::Engine;
use reqwest::Client;

use super::{parse_body, post_json, truncate_body, GenerateContentResponse, GEMINI_API_BASE};
use crate::error::ServiceError;
use crate::ports::image_generator::{GenerateFuture, GeneratedImage, ImageGenerator, ImageRequest};

/// Live generator for `gemini-*-image` models via `generateContent`.
pub struct GeminiImageGenerator {
    client: Client,
    api_key: String,
}

impl GeminiImageGenerator {
    /// Create a new Gemini generator with the given API key.
    #[must_use]
    pub fn new(api_key: String) -> Self {
        Self { client: Client::new(), api_key }
    }
}

impl ImageGenerator for GeminiImageGenerator {
    fn generate(&self, request: &ImageRequest) -> GenerateFuture<'_> {
        let request = request.clone();
        Box::pin(async move {
            let url = format!("{GEMINI_API_BASE}/{}:generateContent", request.model);

            let body = serde_json::json!({
                "contents": [{
                    "parts": [{"text": request.prompt}]
                }],
                "generationConfig": {
                    "responseModalities": ["IMAGE"],
                    "imageConfig": {
                        "aspectRatio": request.aspect_ratio,
                    }
                }
            });

            let response_text = post_json(&self.client, &url, &self.api_key, &body).await?;
            let parsed: GenerateContentResponse = parse_body(&response_text)?;
            parsed.check_blocked()?;

            let inline = parsed.into_parts().into_iter().find_map(|p| p.inline_data).ok_or_else(
                || {
                    ServiceError::MalformedResponse(format!(
                        "No image in response. Body: {}",
                        truncate_body(&response_text)
                    ))
                },
            )?;

            let data = base64::engine::general_purpose::STANDARD
                .decode(&inline.data)
                .map_err(|e| ServiceError::MalformedResponse(format!("Failed to decode base64: {e}")))?;

            Ok(GeneratedImage { data, mime_type: inline.mime_type })
        })
    }
}
