//! The two-stage generation pipeline: describe the edit, then generate it.

use std::future::Future;
use std::time::Duration;

use crate::display::StatusDisplay;
use crate::error::{EditError, ServiceError, Stage};
use crate::ports::{DescribeRequest, GeneratedImage, ImageGenerator, ImageRequest, PromptDescriber};
use crate::upload::UploadedImage;

/// Where the current run stands.
///
/// `Succeeded` always carries an image and `Failed` always carries a message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PipelineState {
    /// No run has started, or a new run is about to start.
    #[default]
    Idle,
    /// Waiting for the describe stage.
    AwaitingDescription,
    /// Waiting for the generate stage.
    AwaitingImage {
        /// Descriptive prompt produced by the describe stage.
        prompt: String,
    },
    /// Both stages succeeded.
    Succeeded {
        /// Descriptive prompt the image was generated from.
        prompt: String,
        /// The generated image.
        image: GeneratedImage,
    },
    /// A stage failed; the run is over.
    Failed {
        /// User-visible error message.
        message: String,
        /// Descriptive prompt, when the describe stage had succeeded.
        prompt: Option<String>,
    },
}

impl PipelineState {
    /// Whether a run is between submission and its outcome.
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::AwaitingDescription | Self::AwaitingImage { .. })
    }
}

/// Models and limits used by each run.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Resolved describe model identifier.
    pub describe_model: String,
    /// Resolved image model identifier.
    pub image_model: String,
    /// Aspect ratio for the generated image.
    pub aspect_ratio: String,
    /// Upper bound on each remote call.
    pub timeout: Duration,
}

/// Runs the describe and generate stages in order and reports every
/// state transition to a display.
pub struct Pipeline {
    describer: Box<dyn PromptDescriber>,
    generator: Box<dyn ImageGenerator>,
    settings: PipelineSettings,
    display: Box<dyn StatusDisplay>,
    state: PipelineState,
}

impl Pipeline {
    /// Create an idle pipeline.
    pub fn new(
        describer: Box<dyn PromptDescriber>,
        generator: Box<dyn ImageGenerator>,
        settings: PipelineSettings,
        display: Box<dyn StatusDisplay>,
    ) -> Self {
        Self { describer, generator, settings, display, state: PipelineState::Idle }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Turn an image and an editing instruction into a new image.
    ///
    /// Inputs are validated before anything else; a validation failure
    /// leaves the state untouched. Otherwise the previous run's outcome is
    /// discarded and the state moves through `AwaitingDescription` and
    /// `AwaitingImage` to `Succeeded` or `Failed`. Nothing is retried.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::Validation`] for a missing image or blank
    /// instruction, and [`EditError::Service`] when either stage fails or
    /// exceeds the timeout.
    pub async fn run(
        &mut self,
        image: Option<&UploadedImage>,
        instruction: &str,
    ) -> Result<GeneratedImage, EditError> {
        let image = validate(image, instruction)?;

        if self.state != PipelineState::Idle {
            self.transition(PipelineState::Idle);
        }

        self.transition(PipelineState::AwaitingDescription);
        let describe = DescribeRequest {
            model: self.settings.describe_model.clone(),
            image_data: image.bytes().to_vec(),
            mime_type: image.mime_type().to_string(),
            instruction: instruction.trim().to_string(),
        };
        tracing::debug!(
            model = %describe.model,
            mime_type = %describe.mime_type,
            "describe stage started"
        );
        let described = within(self.settings.timeout, self.describer.describe(&describe))
            .await
            .and_then(|text| non_empty_prompt(&text));
        let prompt = match described {
            Ok(prompt) => prompt,
            Err(source) => return Err(self.fail(Stage::Describe, source, None)),
        };

        self.transition(PipelineState::AwaitingImage { prompt: prompt.clone() });
        let generate = ImageRequest {
            model: self.settings.image_model.clone(),
            prompt: prompt.clone(),
            aspect_ratio: self.settings.aspect_ratio.clone(),
        };
        tracing::debug!(model = %generate.model, "generate stage started");
        let generated = within(self.settings.timeout, self.generator.generate(&generate))
            .await
            .and_then(non_empty_image);
        let image = match generated {
            Ok(image) => image,
            Err(source) => return Err(self.fail(Stage::Generate, source, Some(prompt))),
        };

        tracing::debug!(bytes = image.data.len(), mime_type = %image.mime_type, "run succeeded");
        self.transition(PipelineState::Succeeded { prompt, image: image.clone() });
        Ok(image)
    }

    fn fail(&mut self, stage: Stage, source: ServiceError, prompt: Option<String>) -> EditError {
        let err = EditError::Service { stage, source };
        tracing::debug!(%stage, error = %err, "run failed");
        self.transition(PipelineState::Failed { message: err.user_message(), prompt });
        err
    }

    fn transition(&mut self, next: PipelineState) {
        self.state = next;
        self.display.render(&self.state);
    }
}

fn validate<'a>(
    image: Option<&'a UploadedImage>,
    instruction: &str,
) -> Result<&'a UploadedImage, EditError> {
    let image = image
        .filter(|i| !i.bytes().is_empty())
        .ok_or_else(|| EditError::Validation("an image is required".to_string()))?;
    if instruction.trim().is_empty() {
        return Err(EditError::Validation("the instruction must not be empty".to_string()));
    }
    Ok(image)
}

/// Bound a service call by `limit`.
async fn within<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, ServiceError>>,
) -> Result<T, ServiceError> {
    tokio::time::timeout(limit, call).await.map_err(|_| ServiceError::Timeout(limit))?
}

fn non_empty_prompt(text: &str) -> Result<String, ServiceError> {
    let text = text.trim();
    if text.is_empty() {
        Err(ServiceError::MalformedResponse("the service returned an empty description".into()))
    } else {
        Ok(text.to_string())
    }
}

fn non_empty_image(image: GeneratedImage) -> Result<GeneratedImage, ServiceError> {
    if image.data.is_empty() {
        Err(ServiceError::MalformedResponse("the service returned an empty image".into()))
    } else {
        Ok(image)
    }
}
