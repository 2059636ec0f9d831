//! CLI argument parsing with clap.

use clap::Parser;

use crate::config::DefaultsConfig;
use crate::error::EditError;

/// Edit an image with a text instruction: a vision model describes the
/// edited image, then an image model generates it.
#[derive(Parser, Debug)]
#[command(name = "reimagine", version, about)]
pub struct Cli {
    /// Path to the image to edit.
    pub image: String,

    /// Editing instruction, e.g. "make the sky purple".
    #[arg(conflicts_with = "instruction_file")]
    pub instruction: Option<String>,

    /// Path to a file containing the instruction text.
    #[arg(short = 'i', long, conflicts_with = "instruction")]
    pub instruction_file: Option<String>,

    /// Vision model that writes the descriptive prompt (name or alias).
    #[arg(long)]
    pub describe_model: Option<String>,

    /// Image model that renders the descriptive prompt (name or alias).
    #[arg(short = 'm', long)]
    pub image_model: Option<String>,

    /// Aspect ratio of the generated image (e.g., 1:1, 16:9).
    #[arg(short, long)]
    pub aspect_ratio: Option<String>,

    /// Output format: jpeg, png, webp.
    #[arg(short, long)]
    pub format: Option<String>,

    /// Output file path (auto-generated if not specified).
    #[arg(short, long, conflicts_with = "no_save")]
    pub output: Option<String>,

    /// Do not write the generated image to disk.
    #[arg(long)]
    pub no_save: bool,

    /// Print the generated image as a data URI on stdout.
    #[arg(long)]
    pub data_uri: bool,

    /// Per-stage timeout in seconds.
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Config file path override.
    #[arg(long)]
    pub config: Option<String>,

    /// Verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Effective generation parameters after applying config defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Params {
    /// Describe model name or alias.
    pub describe_model: String,
    /// Image model name or alias.
    pub image_model: String,
    /// Aspect ratio.
    pub aspect_ratio: String,
    /// Output format.
    pub format: String,
    /// Per-stage timeout in seconds.
    pub timeout_secs: u64,
}

impl Cli {
    /// Resolve the instruction from either the positional argument or the file flag.
    ///
    /// # Errors
    ///
    /// Returns a validation error if neither is provided, or an I/O error if
    /// the file cannot be read.
    pub fn resolve_instruction(&self) -> Result<String, EditError> {
        if let Some(ref text) = self.instruction {
            Ok(text.clone())
        } else if let Some(ref path) = self.instruction_file {
            Ok(std::fs::read_to_string(path)?)
        } else {
            Err(EditError::Validation(
                "Provide an instruction or use -i/--instruction-file".to_string(),
            ))
        }
    }

    /// Fill unset flags from the config file defaults.
    #[must_use]
    pub fn params(&self, defaults: &DefaultsConfig) -> Params {
        let pick = |flag: Option<&String>, default: &str| {
            flag.map_or_else(|| default.to_string(), String::clone)
        };
        Params {
            describe_model: pick(self.describe_model.as_ref(), &defaults.describe_model),
            image_model: pick(self.image_model.as_ref(), &defaults.image_model),
            aspect_ratio: pick(self.aspect_ratio.as_ref(), &defaults.aspect_ratio),
            format: pick(self.format.as_ref(), &defaults.format),
            timeout_secs: self.timeout.unwrap_or(defaults.timeout_secs),
        }
    }
}
