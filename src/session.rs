//! Editor session: the user's current upload and instruction.

use std::path::Path;

use crate::error::EditError;
use crate::pipeline::Pipeline;
use crate::ports::GeneratedImage;
use crate::upload::UploadedImage;

/// Holds the inputs a user has supplied and decides when a run may start.
pub struct EditorSession {
    image: Option<UploadedImage>,
    instruction: String,
    pipeline: Pipeline,
}

impl EditorSession {
    /// Start an empty session around a pipeline.
    #[must_use]
    pub fn new(pipeline: Pipeline) -> Self {
        Self { image: None, instruction: String::new(), pipeline }
    }

    /// Read a file and make it the current upload, replacing any previous one.
    ///
    /// The previous upload is kept if the new file cannot be read.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::Read`] if the file cannot be read.
    pub fn upload(&mut self, path: &Path) -> Result<&UploadedImage, EditError> {
        let image = UploadedImage::read(path)?;
        Ok(&*self.image.insert(image))
    }

    /// Replace the instruction text.
    pub fn set_instruction(&mut self, text: impl Into<String>) {
        self.instruction = text.into();
    }

    /// Whether the submit trigger should be enabled.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.image.is_some()
            && !self.instruction.trim().is_empty()
            && !self.pipeline.state().is_in_flight()
    }

    /// Current pipeline state.
    #[cfg(test)]
    #[must_use]
    pub fn state(&self) -> &crate::pipeline::PipelineState {
        self.pipeline.state()
    }

    /// Run the pipeline with the current inputs.
    ///
    /// # Errors
    ///
    /// Propagates the pipeline's validation and service errors.
    pub async fn submit(&mut self) -> Result<GeneratedImage, EditError> {
        self.pipeline.run(self.image.as_ref(), &self.instruction).await
    }
}
