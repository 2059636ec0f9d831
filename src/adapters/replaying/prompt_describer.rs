//! Replaying adapter for the `PromptDescriber` port.

use std::sync::{Arc, Mutex};

use super::{next_output, replay_result};
use crate::cassette::replayer::CassetteReplayer;
use crate::ports::prompt_describer::{DescribeFuture, DescribeRequest, PromptDescriber};

/// Serves recorded descriptive prompts from a cassette.
pub struct ReplayingPromptDescriber {
    replayer: Arc<Mutex<CassetteReplayer>>,
}

impl ReplayingPromptDescriber {
    /// Create a replaying describer backed by the given replayer.
    #[must_use]
    pub fn new(replayer: Arc<Mutex<CassetteReplayer>>) -> Self {
        Self { replayer }
    }
}

impl PromptDescriber for ReplayingPromptDescriber {
    fn describe(&self, _request: &DescribeRequest) -> DescribeFuture<'_> {
        let output = next_output(&self.replayer, "prompt_describer", "describe");
        Box::pin(async move { replay_result::<String>(output?) })
    }
}
