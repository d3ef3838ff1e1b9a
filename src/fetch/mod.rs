use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use tempfile::TempDir;

use crate::tool::{ToolOutput, YtDlp};
use crate::utils::FALLBACK_STEM;
use crate::{ConverterError, Result};

/// Seam between the batch machinery and the external tool
///
/// The production implementation drives yt-dlp; batch behavior is
/// exercised in tests through stub implementations.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Resolve a human-readable title for the URL
    ///
    /// Title lookup failure is non-fatal: implementations fall back to a
    /// default stem instead of erroring.
    async fn resolve_title(&self, url: &str) -> String;

    /// Fetch the URL's audio and place the MP3 at `dest`
    async fn fetch(&self, url: &str, dest: &Path) -> Result<()>;
}

/// Download-convert executor backed by yt-dlp
///
/// Owns a staging directory where yt-dlp writes its output before the
/// produced file is moved to its final destination.
pub struct DownloadPipeline {
    tool: YtDlp,
    staging: TempDir,
}

impl DownloadPipeline {
    pub fn new(tool: YtDlp) -> Result<Self> {
        let staging = TempDir::new().context("failed to create staging directory")?;
        Ok(Self { tool, staging })
    }

    /// Generate a staging filename stem unique to this fetch
    ///
    /// Embeds the process id plus a per-fetch fragment so no two
    /// in-flight fetches share a prefix, within this process or across
    /// other instances using the same temp root.
    fn unique_stem() -> String {
        let fragment = uuid::Uuid::new_v4().to_string()[..8].to_string();
        format!("dl_{}_{}", std::process::id(), fragment)
    }

    /// Locate the file yt-dlp actually produced for the given stem
    ///
    /// The tool picks the final extension itself, so matching is by
    /// filename prefix.
    fn locate_produced(&self, stem: &str) -> Option<PathBuf> {
        let entries = fs_err::read_dir(self.staging.path()).ok()?;
        entries
            .flatten()
            .find(|entry| entry.file_name().to_string_lossy().starts_with(stem))
            .map(|entry| entry.path())
    }
}

#[async_trait]
impl Fetcher for DownloadPipeline {
    async fn resolve_title(&self, url: &str) -> String {
        match self.tool.get_title(url).await {
            Ok(title) => title,
            Err(e) => {
                tracing::warn!("Title lookup failed for {}: {:#}", url, e);
                FALLBACK_STEM.to_string()
            }
        }
    }

    async fn fetch(&self, url: &str, dest: &Path) -> Result<()> {
        let stem = Self::unique_stem();
        let template = self.staging.path().join(format!("{}.%(ext)s", stem));

        let output = self.tool.extract_audio(url, &template).await?;

        let produced = self.locate_produced(&stem).ok_or_else(|| {
            ConverterError::FileNotProduced(diagnostics(
                &format!("no file matching {} in staging directory", stem),
                &output,
            ))
        })?;

        move_file(&produced, dest)
            .with_context(|| format!("failed to move {} to {}", produced.display(), dest.display()))?;

        if !dest.exists() {
            return Err(ConverterError::FileNotProduced(diagnostics(
                &format!("{} missing after move", dest.display()),
                &output,
            ))
            .into());
        }

        tracing::info!("Saved {}", dest.display());
        Ok(())
    }
}

/// Move a file, overwriting the destination if present
///
/// Rename first; staging and destination may sit on different
/// filesystems, in which case fall back to copy + remove.
fn move_file(from: &Path, to: &Path) -> Result<()> {
    if fs_err::rename(from, to).is_ok() {
        return Ok(());
    }

    fs_err::copy(from, to)?;
    fs_err::remove_file(from)?;
    Ok(())
}

fn diagnostics(detail: &str, output: &ToolOutput) -> String {
    format!(
        "{}; yt-dlp stdout: {}; stderr: {}",
        detail,
        output.stdout.trim(),
        output.stderr.trim()
    )
}
