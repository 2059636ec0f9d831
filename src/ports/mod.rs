//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the pipeline and a remote
//! service. Implementations live in `src/adapters/`.

pub mod image_generator;
pub mod prompt_describer;

pub use image_generator::{GeneratedImage, ImageGenerator, ImageRequest};
pub use prompt_describer::{DescribeRequest, PromptDescriber};
