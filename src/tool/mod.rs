use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use anyhow::Context;
use tokio::process::Command;
use tokio::time::timeout;

use crate::config::Config;
use crate::{ConverterError, Result};

/// Captured output of a finished tool invocation
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// yt-dlp subprocess wrapper
///
/// Resolved once at startup so every later invocation uses the same
/// verified binary instead of re-probing PATH per item. yt-dlp shells
/// out to ffmpeg for the MP3 transcode, so both are probed here.
pub struct YtDlp {
    yt_dlp_path: String,
    audio_quality: String,
    timeout: Duration,
}

impl YtDlp {
    /// Probe the external tools and build the wrapper
    ///
    /// Fails with [`ConverterError::DependencyMissing`] naming every tool
    /// that did not answer a version probe.
    pub async fn resolve(config: &Config) -> Result<Self> {
        let yt_dlp_path = config.yt_dlp_path.clone().unwrap_or_else(|| "yt-dlp".to_string());
        let ffmpeg_path = config.ffmpeg_path.clone().unwrap_or_else(|| "ffmpeg".to_string());

        let mut missing = Vec::new();
        if !probe(&yt_dlp_path, "--version").await {
            missing.push("yt-dlp");
        }
        if !probe(&ffmpeg_path, "-version").await {
            missing.push("ffmpeg");
        }

        if !missing.is_empty() {
            return Err(ConverterError::DependencyMissing(missing.join(", ")).into());
        }

        Ok(Self {
            yt_dlp_path,
            audio_quality: config.audio_quality.clone(),
            timeout: Duration::from_secs(config.tool_timeout_secs),
        })
    }

    /// Build a wrapper without probing, for callers that manage the
    /// binary themselves (tests point this at stub scripts).
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            yt_dlp_path: path.into(),
            audio_quality: "0".to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Fetch the video title via a metadata-only invocation
    pub async fn get_title(&self, url: &str) -> Result<String> {
        tracing::debug!("Fetching title for: {}", url);

        let output = self.run(&["--get-title", url]).await?;
        let title = output.stdout.lines().next().unwrap_or("").trim().to_string();
        if title.is_empty() {
            anyhow::bail!("yt-dlp returned an empty title for {}", url);
        }

        Ok(title)
    }

    /// Download and convert a single URL to MP3
    ///
    /// `template` must end in `.%(ext)s` so yt-dlp controls the final
    /// extension itself; the caller locates whatever file was produced.
    pub async fn extract_audio(&self, url: &str, template: &Path) -> Result<ToolOutput> {
        tracing::debug!("Extracting audio for: {}", url);

        self.run(&[
            "-x",
            "--audio-format",
            "mp3",
            "--audio-quality",
            &self.audio_quality,
            "-o",
            &template.to_string_lossy(),
            url,
        ])
        .await
    }

    /// Run yt-dlp with the given arguments, capturing output
    ///
    /// Nonzero exit or timeout expiry surface as
    /// [`ConverterError::ToolFailed`] carrying the captured stderr.
    async fn run(&self, args: &[&str]) -> Result<ToolOutput> {
        let result = timeout(
            self.timeout,
            Command::new(&self.yt_dlp_path)
                .args(args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .output(),
        )
        .await;

        let output = match result {
            Ok(io) => io.with_context(|| format!("failed to spawn {}", self.yt_dlp_path))?,
            Err(_) => {
                return Err(ConverterError::ToolFailed {
                    status: "timeout".to_string(),
                    stderr: format!("no response within {}s", self.timeout.as_secs()),
                }
                .into());
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(ConverterError::ToolFailed {
                status: output.status.to_string(),
                stderr: stderr.trim().to_string(),
            }
            .into());
        }

        Ok(ToolOutput { stdout, stderr })
    }
}

/// Check whether a command answers a version probe
async fn probe(command: &str, version_flag: &str) -> bool {
    Command::new(command)
        .arg(version_flag)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}
