//! Service context that bundles the port trait objects for one pipeline.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::adapters::live::describer::GeminiDescriber;
use crate::adapters::live::gemini_image::GeminiImageGenerator;
use crate::adapters::live::imagen::ImagenGenerator;
use crate::adapters::recording::Recording;
use crate::adapters::replaying::image_generator::ReplayingImageGenerator;
use crate::adapters::replaying::prompt_describer::ReplayingPromptDescriber;
use crate::cassette::config::load_cassette;
use crate::cassette::recorder::CassetteRecorder;
use crate::config::ApiKey;
use crate::error::EditError;
use crate::model::ImageBackend;
use crate::ports::{ImageGenerator, PromptDescriber};

/// Bundles both service ports.
pub struct ServiceContext {
    /// Descriptive-prompt port.
    pub describer: Box<dyn PromptDescriber>,
    /// Image generation port.
    pub generator: Box<dyn ImageGenerator>,
}

/// Handle to a recording session that must be finished after use.
pub struct RecordingSession {
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingSession {
    /// Finish the recording and write the cassette file to disk.
    ///
    /// Call this after the adapters holding the recorder have been dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the adapters are still alive or the cassette file
    /// cannot be written.
    pub fn finish(self) -> Result<PathBuf, String> {
        let recorder = Arc::try_unwrap(self.recorder)
            .map_err(|_| "Recording adapter still has references".to_string())?
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        recorder.finish().map_err(|e| format!("Failed to write cassette: {e}"))
    }
}

impl ServiceContext {
    /// Create live adapters for the chosen image backend.
    #[must_use]
    pub fn live(backend: ImageBackend, api_key: &ApiKey) -> Self {
        let key = api_key.expose().to_string();
        let generator: Box<dyn ImageGenerator> = match backend {
            ImageBackend::Imagen => Box::new(ImagenGenerator::new(key.clone())),
            ImageBackend::GeminiNative => Box::new(GeminiImageGenerator::new(key.clone())),
        };
        Self { describer: Box::new(GeminiDescriber::new(key)), generator }
    }

    /// Create a context that records live interactions into one cassette.
    ///
    /// `stage_timeout` must match the pipeline's, so a call it cuts off is
    /// recorded with the same timeout message.
    #[must_use]
    pub fn recording(
        backend: ImageBackend,
        api_key: &ApiKey,
        stage_timeout: Duration,
    ) -> (Self, RecordingSession) {
        let live = Self::live(backend, api_key);

        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H-%M-%S").to_string();
        let path = PathBuf::from(".reimagine/cassettes")
            .join(&timestamp)
            .join("pipeline.cassette.yaml");
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(
            path,
            format!("{timestamp}-pipeline"),
            get_commit_hash(),
        )));

        let ctx = Self {
            describer: Box::new(Recording::new(
                live.describer,
                Arc::clone(&recorder),
                stage_timeout,
            )),
            generator: Box::new(Recording::new(
                live.generator,
                Arc::clone(&recorder),
                stage_timeout,
            )),
        };
        (ctx, RecordingSession { recorder })
    }

    /// Create a replaying context from a cassette file.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be loaded.
    pub fn replaying(path: &Path) -> Result<Self, EditError> {
        let replayer = load_cassette(path)
            .map_err(|e| EditError::Config(format!("Failed to load cassette: {e}")))?;
        let replayer = Arc::new(Mutex::new(replayer));
        Ok(Self {
            describer: Box::new(ReplayingPromptDescriber::new(Arc::clone(&replayer))),
            generator: Box::new(ReplayingImageGenerator::new(replayer)),
        })
    }
}

/// Get the current git commit hash, or "unknown" if unavailable.
fn get_commit_hash() -> String {
    std::process::Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map_or_else(|| "unknown".to_string(), |s| s.trim().to_string())
}
