//! Recording decorator that logs every port call into a shared cassette.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;

use crate::cassette::recorder::CassetteRecorder;
use crate::error::ServiceError;
use crate::ports::image_generator::{GenerateFuture, ImageGenerator, ImageRequest};
use crate::ports::prompt_describer::{DescribeFuture, DescribeRequest, PromptDescriber};

/// Wraps a live port `P` and records each request and its result.
///
/// The describer and the generator of one run share a recorder, so the
/// cassette keeps them in call order. A call dropped before it finishes was
/// cut off by the pipeline's stage timeout and is recorded as that timeout.
pub struct Recording<P: ?Sized> {
    inner: Box<P>,
    recorder: Arc<Mutex<CassetteRecorder>>,
    stage_timeout: Duration,
}

impl<P: ?Sized> Recording<P> {
    /// Wrap `inner`, appending its calls to `recorder`.
    pub fn new(
        inner: Box<P>,
        recorder: Arc<Mutex<CassetteRecorder>>,
        stage_timeout: Duration,
    ) -> Self {
        Self { inner, recorder, stage_timeout }
    }

    /// Store one call using the `{"Ok": ...}` / `{"Err": "..."}` convention.
    ///
    /// Errors are stored as their user-facing message, so a replayed failure
    /// reads the same as the live one. A value that fails to serialize is
    /// logged and left out; recording never changes the result the pipeline
    /// sees.
    fn record<I, T>(&self, port: &str, method: &str, input: &I, result: &Result<T, ServiceError>)
    where
        I: Serialize,
        T: Serialize,
    {
        let output = match result {
            Ok(value) => serde_json::to_value(value).map(|v| serde_json::json!({ "Ok": v })),
            Err(e) => Ok(serde_json::json!({ "Err": e.user_message() })),
        };
        match (serde_json::to_value(input), output) {
            (Ok(input), Ok(output)) => {
                let mut recorder = self.recorder.lock().unwrap_or_else(PoisonError::into_inner);
                recorder.record(port, method, input, output);
            }
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(%port, %method, error = %e, "skipping unrecordable interaction");
            }
        }
    }

    fn pending<'a, I: Serialize>(
        &'a self,
        port: &'static str,
        method: &'static str,
        input: &'a I,
    ) -> Pending<'a, P, I> {
        Pending { recording: self, port, method, input: Some(input) }
    }
}

/// An in-flight call; records a timeout if dropped before `finish`.
struct Pending<'a, P: ?Sized, I: Serialize> {
    recording: &'a Recording<P>,
    port: &'static str,
    method: &'static str,
    input: Option<&'a I>,
}

impl<P: ?Sized, I: Serialize> Pending<'_, P, I> {
    fn finish<T: Serialize>(mut self, result: &Result<T, ServiceError>) {
        if let Some(input) = self.input.take() {
            self.recording.record(self.port, self.method, input, result);
        }
    }
}

impl<P: ?Sized, I: Serialize> Drop for Pending<'_, P, I> {
    fn drop(&mut self) {
        if let Some(input) = self.input.take() {
            let cut_off: Result<(), _> = Err(ServiceError::Timeout(self.recording.stage_timeout));
            self.recording.record(self.port, self.method, input, &cut_off);
        }
    }
}

impl PromptDescriber for Recording<dyn PromptDescriber> {
    fn describe(&self, request: &DescribeRequest) -> DescribeFuture<'_> {
        let request = request.clone();
        Box::pin(async move {
            let pending = self.pending("prompt_describer", "describe", &request);
            let result = self.inner.describe(&request).await;
            pending.finish(&result);
            result
        })
    }
}

impl ImageGenerator for Recording<dyn ImageGenerator> {
    fn generate(&self, request: &ImageRequest) -> GenerateFuture<'_> {
        let request = request.clone();
        Box::pin(async move {
            let pending = self.pending("image_generator", "generate", &request);
            let result = self.inner.generate(&request).await;
            pending.finish(&result);
            result
        })
    }
}
