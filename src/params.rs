//! Validation of user-supplied generation parameters.

use crate::model::ImageBackend;

const IMAGEN_RATIOS: [&str; 5] = ["1:1", "3:4", "4:3", "9:16", "16:9"];
const GEMINI_RATIOS: [&str; 10] =
    ["1:1", "2:3", "3:2", "3:4", "4:3", "4:5", "5:4", "9:16", "16:9", "21:9"];

/// Validate that an aspect ratio is supported by the given backend.
///
/// # Errors
///
/// Returns an error if the ratio is not recognized.
pub fn validate_aspect_ratio(ratio: &str, backend: ImageBackend) -> Result<(), String> {
    let valid: &[&str] = match backend {
        ImageBackend::Imagen => &IMAGEN_RATIOS,
        ImageBackend::GeminiNative => &GEMINI_RATIOS,
    };

    if valid.contains(&ratio) {
        Ok(())
    } else {
        Err(format!("Unsupported aspect ratio '{ratio}' for {backend:?}. Valid: {valid:?}"))
    }
}

/// Validate the output format parameter.
///
/// # Errors
///
/// Returns an error if the format is not recognized.
pub fn validate_format(format: &str) -> Result<(), String> {
    match format {
        "jpeg" | "png" | "webp" => Ok(()),
        _ => Err(format!("Unsupported format '{format}'. Valid: jpeg, png, webp")),
    }
}

/// Validate the per-stage timeout.
///
/// # Errors
///
/// Returns an error for a zero timeout.
pub fn validate_timeout(secs: u64) -> Result<(), String> {
    if secs == 0 {
        Err("Timeout must be at least 1 second".to_string())
    } else {
        Ok(())
    }
}

/// Get the file extension for an output format.
#[must_use]
pub fn format_extension(format: &str) -> &'static str {
    match format {
        "png" => "png",
        "webp" => "webp",
        // jpeg and any unknown format default to jpg
        _ => "jpg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn imagen_ratios() {
        assert!(validate_aspect_ratio("1:1", ImageBackend::Imagen).is_ok());
        assert!(validate_aspect_ratio("16:9", ImageBackend::Imagen).is_ok());
        assert!(validate_aspect_ratio("21:9", ImageBackend::Imagen).is_err());
    }

    #[test]
    fn gemini_ratios() {
        assert!(validate_aspect_ratio("21:9", ImageBackend::GeminiNative).is_ok());
        assert!(validate_aspect_ratio("100:200", ImageBackend::GeminiNative).is_err());
    }

    #[test]
    fn formats() {
        assert!(validate_format("jpeg").is_ok());
        assert!(validate_format("png").is_ok());
        assert!(validate_format("webp").is_ok());
        assert!(validate_format("gif").is_err());
    }

    #[test]
    fn zero_timeout_rejected() {
        assert!(validate_timeout(0).is_err());
        assert!(validate_timeout(1).is_ok());
    }

    #[test]
    fn format_extension_mapping() {
        assert_eq!(format_extension("jpeg"), "jpg");
        assert_eq!(format_extension("png"), "png");
        assert_eq!(format_extension("webp"), "webp");
    }
}
