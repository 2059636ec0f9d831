//! Output naming and saving of the generated image.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use image::ImageFormat;

use crate::error::EditError;
use crate::params::format_extension;
use crate::ports::GeneratedImage;

/// Generate an output filename from the editing instruction and format.
///
/// The first 50 characters of the instruction become a kebab-case stem,
/// followed by a unix timestamp and the format's extension.
#[must_use]
pub fn auto_filename(instruction: &str, format: &str) -> String {
    let stem = kebab_stem(instruction, 50);
    let timestamp = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
    format!("{stem}-{timestamp}.{}", format_extension(format))
}

/// Lowercase ASCII alphanumerics joined by single hyphens, at most `max_len`
/// bytes, or `"edit"` when nothing usable remains.
#[must_use]
pub fn kebab_stem(input: &str, max_len: usize) -> String {
    let mut stem = String::with_capacity(max_len);
    for word in input.split(|c: char| !c.is_ascii_alphanumeric()).filter(|w| !w.is_empty()) {
        let sep = usize::from(!stem.is_empty());
        if stem.len() + sep >= max_len {
            break;
        }
        if sep == 1 {
            stem.push('-');
        }
        let room = max_len - stem.len();
        stem.extend(word.chars().take(room).map(|c| c.to_ascii_lowercase()));
    }

    if stem.is_empty() {
        "edit".to_string()
    } else {
        stem
    }
}

/// Resolve the output path: use explicit path or auto-generate.
#[must_use]
pub fn resolve_output_path(explicit: Option<&str>, instruction: &str, format: &str) -> PathBuf {
    explicit.map_or_else(|| PathBuf::from(auto_filename(instruction, format)), PathBuf::from)
}

/// Save the generated image, converting it when its MIME type differs from
/// the requested format.
///
/// # Errors
///
/// Returns an error if the file cannot be written or format conversion fails.
pub fn save_image(image: &GeneratedImage, format: &str, path: &Path) -> Result<(), EditError> {
    let target = target_format(format)?;
    if ImageFormat::from_mime_type(&image.mime_type) == Some(target) {
        return std::fs::write(path, &image.data).map_err(EditError::Io);
    }

    tracing::debug!(from = %image.mime_type, to = %format, "converting generated image");
    let decoded = image::load_from_memory(&image.data)
        .map_err(|e| EditError::ImageConversion(format!("Failed to decode image: {e}")))?;
    // JPEG has no alpha channel.
    let decoded = if target == ImageFormat::Jpeg {
        image::DynamicImage::ImageRgb8(decoded.to_rgb8())
    } else {
        decoded
    };
    decoded
        .save_with_format(path, target)
        .map_err(|e| EditError::ImageConversion(format!("Failed to save as {format}: {e}")))
}

fn target_format(format: &str) -> Result<ImageFormat, EditError> {
    match format {
        "jpeg" => Ok(ImageFormat::Jpeg),
        "png" => Ok(ImageFormat::Png),
        "webp" => Ok(ImageFormat::WebP),
        other => Err(EditError::ImageConversion(format!("Unsupported format: {other}"))),
    }
}
