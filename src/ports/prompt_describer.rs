//! Prompt describer port for vision-to-text APIs.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use super::image_generator::base64_bytes;
use crate::error::ServiceError;

/// A request to turn an image and an editing instruction into a descriptive prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescribeRequest {
    /// The resolved model identifier (e.g., `"gemini-2.5-flash"`).
    pub model: String,
    /// Raw bytes of the uploaded image; base64 on the wire and in cassettes.
    #[serde(with = "base64_bytes")]
    pub image_data: Vec<u8>,
    /// MIME type of the uploaded image.
    pub mime_type: String,
    /// The user's editing instruction.
    pub instruction: String,
}

/// Boxed future type returned by [`PromptDescriber::describe`].
pub type DescribeFuture<'a> =
    Pin<Box<dyn Future<Output = Result<String, ServiceError>> + Send + 'a>>;

/// Produces a detailed image-generation prompt from an image and an instruction.
pub trait PromptDescriber: Send + Sync {
    /// Describe the edited image for the given request.
    fn describe(&self, request: &DescribeRequest) -> DescribeFuture<'_>;
}
