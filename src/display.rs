//! Rendering of pipeline progress for the user.

use std::io::Write;

use crate::pipeline::PipelineState;

/// Read-only observer of pipeline state transitions.
pub trait StatusDisplay {
    /// Show the state the pipeline just entered.
    fn render(&mut self, state: &PipelineState);
}

/// Writes one progress line per transition to a terminal stream.
pub struct TerminalDisplay<W: Write> {
    out: W,
    verbose: bool,
}

impl TerminalDisplay<std::io::Stderr> {
    /// Display on standard error.
    #[must_use]
    pub fn stderr(verbose: bool) -> Self {
        Self::new(std::io::stderr(), verbose)
    }
}

impl<W: Write> TerminalDisplay<W> {
    /// Display on an arbitrary writer. Verbose mode also prints the
    /// descriptive prompt.
    pub fn new(out: W, verbose: bool) -> Self {
        Self { out, verbose }
    }

    fn line(&self, state: &PipelineState) -> Option<String> {
        match state {
            PipelineState::Idle => None,
            PipelineState::AwaitingDescription => Some("Describing image...".to_string()),
            PipelineState::AwaitingImage { prompt } if self.verbose => {
                Some(format!("Generating image from prompt: {prompt}"))
            }
            PipelineState::AwaitingImage { .. } => Some("Generating image...".to_string()),
            PipelineState::Succeeded { .. } => Some("Done.".to_string()),
            PipelineState::Failed { message, prompt: Some(prompt) } if self.verbose => {
                Some(format!("Failed: {message}\nDescriptive prompt was: {prompt}"))
            }
            PipelineState::Failed { message, .. } => Some(format!("Failed: {message}")),
        }
    }
}

impl<W: Write> StatusDisplay for TerminalDisplay<W> {
    fn render(&mut self, state: &PipelineState) {
        if let Some(line) = self.line(state) {
            // A closed terminal must not abort the run.
            let _ = writeln!(self.out, "{line}");
        }
    }
}
