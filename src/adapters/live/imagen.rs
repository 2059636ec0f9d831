//! Live adapter for the Imagen `:predict` endpoint.

use base64::Engine;
use reqwest::Client;
use serde::Deserialize;

use super::{parse_body, post_json, truncate_body, GEMINI_API_BASE};
use crate::error::ServiceError;
use crate::ports::image_generator::{GenerateFuture, GeneratedImage, ImageGenerator, ImageRequest};

/// MIME type requested from Imagen; the data URI is built from it.
const OUTPUT_MIME_TYPE: &str = "image/jpeg";

/// Live Imagen generator.
pub struct ImagenGenerator {
    client: Client,
    api_key: String,
}

impl ImagenGenerator {
    /// Create a new Imagen generator with the given API key.
    #[must_use]
    pub fn new(api_key: String) -> Self {
        Self { client: Client::new(), api_key }
    }
}

/// Build the `:predict` request body for a single image.
fn request_body(request: &ImageRequest) -> serde_json::Value {
    serde_json::json!({
        "instances": [{"prompt": request.prompt}],
        "parameters": {
            "sampleCount": 1,
            "aspectRatio": request.aspect_ratio,
            "outputMimeType": OUTPUT_MIME_TYPE,
        }
    })
}

impl ImageGenerator for ImagenGenerator {
    fn generate(&self, request: &ImageRequest) -> GenerateFuture<'_> {
        let request = request.clone();
        Box::pin(async move {
            let url = format!("{GEMINI_API_BASE}/{}:predict", request.model);
            let body = request_body(&request);

            let response_text = post_json(&self.client, &url, &self.api_key, &body).await?;
            let parsed: PredictResponse = parse_body(&response_text)?;

            let prediction = parsed
                .predictions
                .into_iter()
                .find(|p| p.bytes_base64_encoded.is_some())
                .ok_or_else(|| {
                    // Imagen drops filtered images silently and may return an empty list.
                    ServiceError::MalformedResponse(format!(
                        "No image in response. Body: {}",
                        truncate_body(&response_text)
                    ))
                })?;

            let encoded = prediction.bytes_base64_encoded.unwrap_or_default();
            let data = base64::engine::general_purpose::STANDARD
                .decode(encoded.as_bytes())
                .map_err(|e| ServiceError::MalformedResponse(format!("Failed to decode base64: {e}")))?;
            let mime_type = prediction.mime_type.unwrap_or_else(|| OUTPUT_MIME_TYPE.to_string());

            Ok(GeneratedImage { data, mime_type })
        })
    }
}

// --- Imagen API response types ---

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_requests_one_jpeg() {
        let body = request_body(&ImageRequest {
            model: "imagen-4.0-generate-001".into(),
            prompt: "A red bicycle".into(),
            aspect_ratio: "16:9".into(),
        });
        assert_eq!(body["instances"][0]["prompt"], "A red bicycle");
        assert_eq!(body["parameters"]["sampleCount"], 1);
        assert_eq!(body["parameters"]["aspectRatio"], "16:9");
        assert_eq!(body["parameters"]["outputMimeType"], "image/jpeg");
    }

    #[test]
    fn empty_predictions_parse() {
        let parsed: PredictResponse = parse_body("{}").unwrap();
        assert!(parsed.predictions.is_empty());
    }
}
