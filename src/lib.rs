pub mod audio;
pub mod augment;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod features;
pub mod inference;
pub mod segment;
pub mod types;

pub use error::{PipelineError, Result};
