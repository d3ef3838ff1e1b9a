use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory where finished MP3s are placed (current dir if unset)
    pub output_dir: Option<PathBuf>,

    /// yt-dlp audio quality argument, "0" is best
    pub audio_quality: String,

    /// Worker count for batch mode
    pub max_concurrent_jobs: usize,

    /// Per-invocation subprocess timeout in seconds
    pub tool_timeout_secs: u64,

    /// Override for the yt-dlp binary
    pub yt_dlp_path: Option<String>,

    /// Override for the ffmpeg binary
    pub ffmpeg_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: None,
            audio_quality: "0".to_string(),
            max_concurrent_jobs: 3,
            tool_timeout_secs: 1800,
            yt_dlp_path: None,
            ffmpeg_path: None,
        }
    }
}

impl Config {
    /// Load configuration from file or create default
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = fs_err::read_to_string(&config_path)
                .context("Failed to read config file")?;

            let config: Config = serde_yaml::from_str(&content)
                .context("Failed to parse config file")?;

            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save().await?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub async fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)
            .context("Failed to serialize config")?;

        fs_err::write(&config_path, content)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;

        Ok(config_dir.join("vid2aud").join("config.yaml"))
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.max_concurrent_jobs == 0 {
            anyhow::bail!("max_concurrent_jobs must be at least 1");
        }

        if self.tool_timeout_secs == 0 {
            anyhow::bail!("tool_timeout_secs must be at least 1");
        }

        Ok(())
    }

    /// Resolved output directory for finished MP3s
    pub fn output_dir(&self) -> Result<PathBuf> {
        match &self.output_dir {
            Some(dir) => Ok(dir.clone()),
            None => std::env::current_dir().context("Could not determine current directory"),
        }
    }
}
