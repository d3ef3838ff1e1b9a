//! vid2aud - A Rust CLI tool for converting online videos to local MP3 files
//!
//! This library drives yt-dlp (and, through it, ffmpeg) as black-box
//! subprocesses to fetch a video's audio track and store it as an MP3,
//! either for a single URL or for a whole batch read from a file.

pub mod batch;
pub mod cli;
pub mod config;
pub mod fetch;
pub mod output;
pub mod tool;
pub mod utils;

pub use batch::{read_batch, BatchReport, BatchRunner, DownloadResult};
pub use cli::Cli;
pub use config::Config;
pub use fetch::{DownloadPipeline, Fetcher};
pub use tool::YtDlp;

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Error categories surfaced by the converter
#[derive(thiserror::Error, Debug)]
pub enum ConverterError {
    #[error("required programs not found in PATH: {0}")]
    DependencyMissing(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("external tool failed ({status}): {stderr}")]
    ToolFailed { status: String, stderr: String },

    #[error("no output file was produced: {0}")]
    FileNotProduced(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}
