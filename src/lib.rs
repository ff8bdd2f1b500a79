// Project Identifier Library
// Derives a short identifier from a project name, renders it as a translucent
// PNG and installs it as the host's background watermark.

pub mod background;
pub mod config;
pub mod constants;
pub mod error;
pub mod identifier;
pub mod logging;
pub mod pipeline;
pub mod reload;
pub mod storage;
pub mod watermark;

pub use config::{ConfigStore, Configuration};
pub use error::PipelineError;
pub use pipeline::{RunOutcome, WatermarkPipeline};
