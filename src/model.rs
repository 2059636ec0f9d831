//! Model name resolution and image backend detection.

/// Endpoint family used to generate an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageBackend {
    /// Imagen models served by `:predict`.
    Imagen,
    /// Gemini-native image models served by `:generateContent`.
    GeminiNative,
}

/// Short name aliases for the models reimagine talks to.
const ALIASES: &[(&str, &str)] = &[
    ("gemini-flash", "gemini-2.5-flash"),
    ("gemini-pro", "gemini-2.5-pro"),
    ("imagen-3", "imagen-3.0-generate-002"),
    ("imagen-4", "imagen-4.0-generate-001"),
    ("nano-banana", "gemini-2.5-flash-image"),
];

/// Resolve a model name (alias or exact) to the full model identifier.
#[must_use]
pub fn resolve_model(name: &str) -> String {
    ALIASES
        .iter()
        .find(|&&(alias, _)| alias == name)
        .map_or_else(|| name.to_string(), |&(_, full)| full.to_string())
}

/// Check that a resolved model can describe images.
///
/// # Errors
///
/// Returns an error for models outside the Gemini family.
pub fn check_describe_model(model: &str) -> Result<(), String> {
    if model.starts_with("gemini") {
        Ok(())
    } else {
        Err(format!("Unsupported describe model '{model}'. Expected 'gemini-*'."))
    }
}

/// Detect the image backend from a resolved model name.
///
/// # Errors
///
/// Returns an error if the model name doesn't match a known image model family.
pub fn detect_image_backend(model: &str) -> Result<ImageBackend, String> {
    if model.starts_with("imagen") {
        Ok(ImageBackend::Imagen)
    } else if model.starts_with("gemini") && model.contains("image") {
        Ok(ImageBackend::GeminiNative)
    } else {
        Err(format!(
            "Unknown image model '{model}'. Expected 'imagen-*' or a 'gemini-*-image' model."
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_describe_aliases() {
        assert_eq!(resolve_model("gemini-flash"), "gemini-2.5-flash");
        assert_eq!(resolve_model("gemini-pro"), "gemini-2.5-pro");
    }

    #[test]
    fn resolve_image_aliases() {
        assert_eq!(resolve_model("imagen-3"), "imagen-3.0-generate-002");
        assert_eq!(resolve_model("imagen-4"), "imagen-4.0-generate-001");
        assert_eq!(resolve_model("nano-banana"), "gemini-2.5-flash-image");
    }

    #[test]
    fn resolve_exact_name_passthrough() {
        assert_eq!(resolve_model("imagen-4.0-ultra-generate-001"), "imagen-4.0-ultra-generate-001");
    }

    #[test]
    fn describe_model_must_be_gemini() {
        assert!(check_describe_model("gemini-2.5-flash").is_ok());
        assert!(check_describe_model("gpt-4o").is_err());
    }

    #[test]
    fn detect_backends() {
        assert_eq!(detect_image_backend("imagen-3.0-generate-002").unwrap(), ImageBackend::Imagen);
        assert_eq!(
            detect_image_backend("gemini-2.5-flash-image").unwrap(),
            ImageBackend::GeminiNative
        );
    }

    #[test]
    fn text_only_gemini_cannot_generate_images() {
        assert!(detect_image_backend("gemini-2.5-flash").is_err());
        assert!(detect_image_backend("dall-e-3").is_err());
    }
}
